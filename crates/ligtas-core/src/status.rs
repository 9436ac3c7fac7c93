//! The closed set of case statuses.
//!
//! Status strings are part of the stored data and of the JSON API, so the
//! spellings below (including the mixed casing inherited from the field
//! office's paper workflow) are load-bearing.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::workflow::CaptureKind;

/// Where a case currently sits in the intake and investigation pipeline.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum CaseStatus {
  /// Submitted and waiting for the barangay to confirm it.
  #[serde(rename = "review")]
  #[strum(to_string = "review")]
  Review,
  /// Validated, waiting for a supervisor to pick an officer.
  #[serde(rename = "unassigned")]
  #[strum(to_string = "unassigned")]
  Unassigned,
  #[serde(rename = "assigned")]
  #[strum(to_string = "assigned")]
  Assigned,
  #[serde(rename = "Under Investigation")]
  #[strum(to_string = "Under Investigation")]
  UnderInvestigation,
  #[serde(rename = "In Progress")]
  #[strum(to_string = "In Progress")]
  InProgress,
  #[serde(rename = "Completed")]
  #[strum(to_string = "Completed")]
  Completed,
  /// Soft-deleted. Older records spell it in lowercase.
  #[serde(rename = "Removed", alias = "removed")]
  #[strum(to_string = "Removed", serialize = "removed")]
  Removed,
}

impl CaseStatus {
  /// The capture form a case in this status must carry, if any.
  pub fn required_form(self) -> Option<CaptureKind> {
    match self {
      Self::Assigned => Some(CaptureKind::Assignee),
      Self::UnderInvestigation => Some(CaptureKind::Referral),
      Self::InProgress => Some(CaptureKind::Investigation),
      Self::Completed => Some(CaptureKind::Completion),
      _ => None,
    }
  }

  /// Percentage shown on the reporter's progress bar.
  pub fn progress(self) -> u8 {
    match self {
      Self::Assigned => 2,
      Self::UnderInvestigation => 33,
      Self::InProgress => 64,
      Self::Completed => 100,
      _ => 0,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn display_and_parse_agree() {
    for status in CaseStatus::iter() {
      let s = status.to_string();
      assert_eq!(CaseStatus::from_str(&s).unwrap(), status);
      let json = serde_json::to_string(&status).unwrap();
      assert_eq!(json, format!("\"{s}\""));
    }
  }

  #[test]
  fn legacy_lowercase_removed_is_accepted() {
    assert_eq!(CaseStatus::from_str("removed").unwrap(), CaseStatus::Removed);
    let parsed: CaseStatus = serde_json::from_str("\"removed\"").unwrap();
    assert_eq!(parsed, CaseStatus::Removed);
    assert_eq!(CaseStatus::Removed.to_string(), "Removed");
  }

  #[test]
  fn arbitrary_strings_are_refused() {
    assert!(CaseStatus::from_str("completed").is_err());
    assert!(serde_json::from_str::<CaseStatus>("\"closed\"").is_err());
  }
}
