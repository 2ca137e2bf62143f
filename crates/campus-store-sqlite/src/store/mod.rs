//! [`SqliteStore`], the SQLite implementation of the Campus store traits.
//!
//! One file per store trait; this module owns the connection and the
//! helpers they share.

mod attendance;
mod classes;
mod documents;
mod grades;
mod students;
mod teachers;
mod templates;
mod terms;
mod users;

use std::path::Path;

use campus_core::store::Backend;
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result, error::reject, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Campus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Turn "no row changed" into a not-found rejection.
fn ensure_changed(
  changed: usize,
  entity: &'static str,
  id: Uuid,
) -> tokio_rusqlite::Result<()> {
  if changed == 0 {
    Err(reject(campus_core::Error::not_found(entity, id)))
  } else {
    Ok(())
  }
}

/// Unwrap a lookup that must succeed for a write to proceed.
fn found<T>(value: Option<T>, entity: &'static str, id: Uuid) -> Result<T> {
  value.ok_or_else(|| Error::Core(campus_core::Error::not_found(entity, id)))
}
