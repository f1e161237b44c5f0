//! Error types for `fresh-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown subscription level: {0:?}")]
  UnknownLevel(String),

  #[error("timestamp out of range: {0}")]
  TimestampOutOfRange(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
