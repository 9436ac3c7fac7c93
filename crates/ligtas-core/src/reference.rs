//! Six-character reference codes handed to reporters.
//!
//! A code is the first three and last three hex digits of the case id's
//! simple (dash-free) form. Codes are stored alongside the case so lookup is
//! an indexed equality match; the store re-draws the id if a new code would
//! collide with an existing one.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceCode(String);

impl ReferenceCode {
  /// Derive the code for a case id. Always lowercase hex.
  pub fn derive(id: Uuid) -> Self {
    let hex = id.simple().to_string();
    let (head, tail) = (&hex[..3], &hex[hex.len() - 3..]);
    Self(format!("{head}{tail}"))
  }

  /// Parse user input: surrounding whitespace is ignored and case folded.
  pub fn parse(input: &str) -> Result<Self> {
    let code = input.trim().to_ascii_lowercase();
    if code.len() != LEN || !code.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(Error::InvalidReferenceCode(input.to_owned()));
    }
    Ok(Self(code))
  }

  /// Whether `id` carries this code as its prefix and suffix.
  pub fn matches(&self, id: Uuid) -> bool { Self::derive(id) == *self }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for ReferenceCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for ReferenceCode {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<ReferenceCode> for String {
  fn from(c: ReferenceCode) -> Self { c.0 }
}

impl fmt::Display for ReferenceCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derive_takes_prefix_and_suffix() {
    let id = Uuid::parse_str("0a1b2c3d-4e5f-4a7b-8c9d-0e1f2a3b4c5d").unwrap();
    let code = ReferenceCode::derive(id);
    assert_eq!(code.as_str(), "0a1c5d");
    assert_eq!(code.as_str().len(), LEN);
  }

  #[test]
  fn derive_is_idempotent() {
    let id = Uuid::new_v4();
    assert_eq!(ReferenceCode::derive(id), ReferenceCode::derive(id));
    assert!(ReferenceCode::derive(id).matches(id));
  }

  #[test]
  fn parse_folds_case_and_trims() {
    let code = ReferenceCode::parse("  0A1C5D ").unwrap();
    assert_eq!(code.as_str(), "0a1c5d");
  }

  #[test]
  fn parse_rejects_wrong_shape() {
    for bad in ["", "0a1c5", "0a1c5d7", "zzzzzz", "0a-c5d"] {
      assert!(ReferenceCode::parse(bad).is_err(), "{bad:?} accepted");
    }
  }

  #[test]
  fn matches_rejects_other_ids() {
    let a = Uuid::parse_str("aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa").unwrap();
    let b = Uuid::parse_str("bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb").unwrap();
    assert!(!ReferenceCode::derive(a).matches(b));
  }
}
