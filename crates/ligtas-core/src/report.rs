//! Monthly dashboard summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::{case::Case, status::CaseStatus};

/// Counts for the cases filed in one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub year:             i32,
  pub month:            u32,
  pub total:            usize,
  pub by_status:        BTreeMap<String, usize>,
  pub by_incident_type: BTreeMap<String, usize>,
  /// Keyed by barangay.
  pub by_address:       BTreeMap<String, usize>,
}

/// Half-open range `[start, end)` covering `year`-`month` on the office's
/// wall clock, expressed in UTC. Returns `None` for an out-of-range month.
pub fn month_range(
  year: i32,
  month: u32,
  office: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let next = if month == 12 {
    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
  } else {
    NaiveDate::from_ymd_opt(year, month + 1, 1)?
  };
  let at_midnight = |d: NaiveDate| {
    let local = d.and_hms_opt(0, 0, 0)?;
    office.from_local_datetime(&local).single().map(|t| t.with_timezone(&Utc))
  };
  Some((at_midnight(first)?, at_midnight(next)?))
}

/// Summarise the cases created in `year`-`month`, judged by the office's
/// calendar. Removed cases are left out of every count.
pub fn summarize<'a>(
  year: i32,
  month: u32,
  office: FixedOffset,
  cases: impl IntoIterator<Item = &'a Case>,
) -> Summary {
  let mut summary = Summary { year, month, ..Default::default() };
  for case in cases {
    let filed = case.created_at.with_timezone(&office);
    if case.status == CaseStatus::Removed
      || filed.year() != year
      || filed.month() != month
    {
      continue;
    }
    summary.total += 1;
    *summary.by_status.entry(case.status.to_string()).or_default() += 1;
    let kind = case.form_data.incident_type.as_str();
    let kind = if kind.is_empty() { "Unspecified" } else { kind };
    *summary.by_incident_type.entry(kind.to_owned()).or_default() += 1;
    *summary
      .by_address
      .entry(case.form_data.address.trim().to_owned())
      .or_default() += 1;
  }
  summary
}
