//! Error types for `moodly-core`.

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mood value must be between 1 and 5, got {0}")]
  MoodOutOfRange(i64),

  #[error("{0}")]
  Validation(#[from] ValidationErrors),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
