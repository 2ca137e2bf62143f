//! Error type for `campus-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] campus_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<tokio_rusqlite::Error> for Error {
  /// Domain rejections raised inside a connection call travel as
  /// `Other`; constraint failures are translated to core conflicts.
  fn from(e: tokio_rusqlite::Error) -> Self {
    use rusqlite::ffi;

    match e {
      tokio_rusqlite::Error::Other(boxed) => {
        match boxed.downcast::<campus_core::Error>() {
          Ok(core) => Self::Core(*core),
          Err(other) => Self::Database(tokio_rusqlite::Error::Other(other)),
        }
      }
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        failure,
        message,
      )) if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
      {
        Self::Core(campus_core::Error::Conflict(unique_message(message)))
      }
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        failure,
        _,
      )) if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
        Self::Core(campus_core::Error::Conflict(
          "a referenced record is missing or still in use".into(),
        ))
      }
      other => Self::Database(other),
    }
  }
}

/// `UNIQUE constraint failed: students.student_number` becomes
/// `students.student_number is already taken`.
fn unique_message(message: Option<String>) -> String {
  match message.as_deref().and_then(|m| m.split_once(": ")) {
    Some((_, columns)) => format!("{columns} is already taken"),
    None => "value is already taken".into(),
  }
}

/// Carry a domain rejection out of a connection call.
pub(crate) fn reject(e: campus_core::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
