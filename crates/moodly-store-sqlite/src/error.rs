//! Error type for `moodly-store-sqlite`.

use moodly_core::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] moodly_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value no enum variant matches.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("team not found: {0}")]
  TeamNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("entry not found: {0}")]
  EntryNotFound(Uuid),

  #[error("{0} already exists")]
  Duplicate(String),

  #[error("user {user} is not a member of team {team}")]
  NotTeamMember { team: Uuid, user: Uuid },
}

impl StoreError for Error {
  fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::UserNotFound(_) | Self::TeamNotFound(_) | Self::CategoryNotFound(_)
    )
  }

  fn is_conflict(&self) -> bool {
    match self {
      Self::Duplicate(_) => true,
      Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        matches!(
          e.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
      }
      _ => false,
    }
  }

  fn is_forbidden(&self) -> bool { matches!(self, Self::NotTeamMember { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
