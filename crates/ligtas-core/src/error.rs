//! Error types for `ligtas-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid reference code: {0:?}")]
  InvalidReferenceCode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
