//! Error type for the bot's pipeline operations.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("forum error: {0}")]
  Forum(#[source] BoxError),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn forum(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Forum(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
