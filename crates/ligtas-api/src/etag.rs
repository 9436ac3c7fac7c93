//! Entity tags for case records.
//!
//! A case's tag is a SHA-256 over its id, version and last update time, so
//! any accepted write changes it. Mutating endpoints require the tag the
//! caller last read in `If-Match` and turn it back into the version the
//! store's conditional write expects.

use axum::http::{HeaderMap, header};
use ligtas_core::case::Case;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Compute the quoted ETag for `case`.
pub fn compute_etag(case: &Case) -> String {
  let mut hasher = Sha256::new();
  hasher.update(case.case_id.as_bytes());
  hasher.update(case.version.to_le_bytes());
  hasher.update(case.updated_at.timestamp_micros().to_le_bytes());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Accept tags with or without the surrounding quotes.
fn strip_etag_quotes(s: &str) -> &str { s.trim().trim_matches('"') }

/// Check `If-Match` against `case` and return the version it vouches for.
///
/// A missing header is 428, a stale one 412.
pub fn require_if_match(headers: &HeaderMap, case: &Case) -> Result<i64, ApiError> {
  let given = headers
    .get(header::IF_MATCH)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::PreconditionRequired)?;
  let current = compute_etag(case);
  if strip_etag_quotes(given) != strip_etag_quotes(&current) {
    return Err(ApiError::PreconditionFailed);
  }
  Ok(case.version)
}
