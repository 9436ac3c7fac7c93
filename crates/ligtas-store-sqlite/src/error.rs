//! Error type for `ligtas-store-sqlite`.

use ligtas_core::{
  store::{Failure, StoreError},
  workflow::Rejection,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ligtas_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value outside its closed set.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("staff account not found: {0}")]
  StaffNotFound(Uuid),

  /// The case moved on since the caller read it.
  #[error("case {case_id} is no longer at version {expected}")]
  VersionConflict { case_id: Uuid, expected: i64 },

  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error("could not draw an unused reference code")]
  ReferenceCodeExhausted,

  #[error("e-mail already in use: {0}")]
  EmailTaken(String),
}

impl StoreError for Error {
  fn failure(&self) -> Failure {
    match self {
      Self::CaseNotFound(_) | Self::StaffNotFound(_) => Failure::NotFound,
      Self::VersionConflict { .. } => Failure::Conflict,
      Self::Rejected(_) => Failure::Rejected,
      Self::EmailTaken(_) => Failure::Duplicate,
      _ => Failure::Internal,
    }
  }

  fn rejection(&self) -> Option<&Rejection> {
    match self {
      Self::Rejected(r) => Some(r),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
