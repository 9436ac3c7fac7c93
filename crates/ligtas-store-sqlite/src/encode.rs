//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with microsecond precision and a `Z`
//! suffix, so they sort lexically. Forms and lists are compact JSON. UUIDs
//! are hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use ligtas_core::{
  case::Case,
  chat::{ChatKind, ChatMessage},
  news::NewsItem,
  reference::ReferenceCode,
  staff::{Role, StaffAccount},
  status::CaseStatus,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

fn from_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

fn opt_to_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
  value.map(to_json).transpose()
}

fn opt_from_json<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>> {
  s.map(from_json).transpose()
}

// ─── Cases ───────────────────────────────────────────────────────────────────

/// Column list matching [`RawCase::from_row`].
pub const CASE_COLUMNS: &str = "case_id, reference_code, status, version, \
   incident_type, address, child_name, reportee, assigned, form_data, \
   family_data, household_data, first_form, second_form, complete_form, \
   file_uploads, created_at, updated_at";

/// A `cases` row as plain column values, in either direction.
pub struct RawCase {
  pub case_id:        String,
  pub reference_code: String,
  pub status:         String,
  pub version:        i64,
  pub incident_type:  String,
  pub address:        String,
  pub child_name:     String,
  pub reportee:       String,
  pub assigned:       Option<String>,
  pub form_data:      String,
  pub family_data:    String,
  pub household_data: String,
  pub first_form:     Option<String>,
  pub second_form:    Option<String>,
  pub complete_form:  Option<String>,
  pub file_uploads:   String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawCase {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:        row.get(0)?,
      reference_code: row.get(1)?,
      status:         row.get(2)?,
      version:        row.get(3)?,
      incident_type:  row.get(4)?,
      address:        row.get(5)?,
      child_name:     row.get(6)?,
      reportee:       row.get(7)?,
      assigned:       row.get(8)?,
      form_data:      row.get(9)?,
      family_data:    row.get(10)?,
      household_data: row.get(11)?,
      first_form:     row.get(12)?,
      second_form:    row.get(13)?,
      complete_form:  row.get(14)?,
      file_uploads:   row.get(15)?,
      created_at:     row.get(16)?,
      updated_at:     row.get(17)?,
    })
  }

  pub fn from_case(case: &Case) -> Result<Self> {
    Ok(Self {
      case_id:        encode_uuid(case.case_id),
      reference_code: case.reference_code.to_string(),
      status:         case.status.to_string(),
      version:        case.version,
      incident_type:  case.form_data.incident_type.to_string(),
      address:        case.form_data.address.trim().to_owned(),
      child_name:     case.form_data.name.clone(),
      reportee:       case.form_data.reportee.clone(),
      assigned:       case.assigned.clone(),
      form_data:      to_json(&case.form_data)?,
      family_data:    to_json(&case.family_data)?,
      household_data: to_json(&case.household_data)?,
      first_form:     opt_to_json(case.first_form.as_ref())?,
      second_form:    opt_to_json(case.second_form.as_ref())?,
      complete_form:  opt_to_json(case.complete_form.as_ref())?,
      file_uploads:   to_json(&case.file_uploads)?,
      created_at:     encode_dt(case.created_at),
      updated_at:     encode_dt(case.updated_at),
    })
  }

  pub fn into_case(self) -> Result<Case> {
    Ok(Case {
      case_id:        decode_uuid(&self.case_id)?,
      reference_code: ReferenceCode::parse(&self.reference_code)?,
      status:         decode_enum::<CaseStatus>("status", &self.status)?,
      version:        self.version,
      form_data:      from_json(&self.form_data)?,
      family_data:    from_json(&self.family_data)?,
      household_data: from_json(&self.household_data)?,
      first_form:     opt_from_json(self.first_form.as_deref())?,
      second_form:    opt_from_json(self.second_form.as_deref())?,
      complete_form:  opt_from_json(self.complete_form.as_deref())?,
      assigned:       self.assigned,
      file_uploads:   from_json(&self.file_uploads)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Chats ───────────────────────────────────────────────────────────────────

pub const CHAT_COLUMNS: &str = "message_id, case_id, kind, body, sender_id, created_at";

pub struct RawChat {
  pub message_id: String,
  pub case_id:    String,
  pub kind:       String,
  pub body:       String,
  pub sender_id:  String,
  pub created_at: String,
}

impl RawChat {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      case_id:    row.get(1)?,
      kind:       row.get(2)?,
      body:       row.get(3)?,
      sender_id:  row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_message(self) -> Result<ChatMessage> {
    Ok(ChatMessage {
      message_id: decode_uuid(&self.message_id)?,
      case_id:    decode_uuid(&self.case_id)?,
      kind:       decode_enum::<ChatKind>("kind", &self.kind)?,
      body:       self.body,
      sender_id:  self.sender_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── News ────────────────────────────────────────────────────────────────────

pub const NEWS_COLUMNS: &str = "news_id, title, caption, images, created_at";

pub struct RawNews {
  pub news_id:    String,
  pub title:      String,
  pub caption:    String,
  pub images:     String,
  pub created_at: String,
}

impl RawNews {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      news_id:    row.get(0)?,
      title:      row.get(1)?,
      caption:    row.get(2)?,
      images:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_news(self) -> Result<NewsItem> {
    Ok(NewsItem {
      news_id:    decode_uuid(&self.news_id)?,
      title:      self.title,
      caption:    self.caption,
      images:     from_json(&self.images)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub fn encode_images(images: &[String]) -> Result<String> { to_json(&images) }

// ─── Staff ───────────────────────────────────────────────────────────────────

pub const STAFF_COLUMNS: &str =
  "staff_id, email, full_name, name, role, address, password_hash, created_at";

pub struct RawStaff {
  pub staff_id:      String,
  pub email:         String,
  pub full_name:     String,
  pub name:          String,
  pub role:          String,
  pub address:       String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawStaff {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      staff_id:      row.get(0)?,
      email:         row.get(1)?,
      full_name:     row.get(2)?,
      name:          row.get(3)?,
      role:          row.get(4)?,
      address:       row.get(5)?,
      password_hash: row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_staff(self) -> Result<StaffAccount> {
    Ok(StaffAccount {
      staff_id:      decode_uuid(&self.staff_id)?,
      email:         self.email,
      full_name:     self.full_name,
      name:          self.name,
      role:          decode_enum::<Role>("role", &self.role)?,
      address:       self.address,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a), "2024-01-02T03:04:05.000000Z");
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn legacy_status_spelling_decodes() {
    let s: CaseStatus = decode_enum("status", "removed").unwrap();
    assert_eq!(s, CaseStatus::Removed);
    assert!(decode_enum::<CaseStatus>("status", "closed").is_err());
  }
}
