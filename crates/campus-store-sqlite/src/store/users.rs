use campus_core::{
  store::{NewSession, Session, SessionStore, UserStore},
  user::{NewUser, User, UserPatch, normalize_email},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{RawUser, USER_COLUMNS, decode_uuid, encode_dt, encode_enum, encode_uuid},
};

impl SqliteStore {
  async fn user_where(
    &self,
    clause: &'static str,
    key: String,
  ) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}"),
              rusqlite::params![key],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }
}

/// Insert a user row; shared with teacher creation so both run inside the
/// caller's transaction.
pub(super) fn insert_user(
  conn: &rusqlite::Connection,
  user: &User,
  password_hash: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO users (user_id, name, role, email, password_hash, status, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(user.user_id),
      user.name,
      encode_enum(user.role),
      user.email,
      password_hash,
      encode_enum(user.status),
      encode_dt(user.created_at),
    ],
  )?;
  Ok(())
}

pub(super) fn new_user_row(input: &NewUser) -> User {
  User {
    user_id:    Uuid::new_v4(),
    name:       input.name.trim().to_owned(),
    role:       input.role,
    email:      normalize_email(&input.email),
    status:     input.status,
    created_at: Utc::now(),
  }
}

impl UserStore for SqliteStore {
  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = new_user_row(&input);
    let row = user.clone();
    self
      .conn
      .call(move |conn| {
        insert_user(conn, &row, &input.password_hash)?;
        Ok(())
      })
      .await?;
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id = ?1", encode_uuid(id)).await
  }

  async fn get_user_by_email(&self, email: String) -> Result<Option<User>> {
    self.user_where("email = ?1", normalize_email(&email)).await
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User> {
    let mut user = found(self.get_user(id).await?, "user", id)?;
    patch.apply(&mut user);

    let row = user.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET name = ?2, role = ?3, email = ?4, status = ?5
           WHERE user_id = ?1",
          rusqlite::params![
            encode_uuid(row.user_id),
            row.name,
            encode_enum(row.role),
            row.email,
            encode_enum(row.status),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(user)
  }

  async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
          rusqlite::params![encode_uuid(id), password_hash],
        )?;
        ensure_changed(changed, "user", id)
      })
      .await?;
    Ok(())
  }

  async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT password_hash FROM users WHERE user_id = ?1",
                rusqlite::params![id_str],
                |r| r.get(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn delete_user(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "user", id)
      })
      .await?;
    Ok(())
  }
}

impl SessionStore for SqliteStore {
  async fn create_session(&self, input: NewSession) -> Result<Session> {
    let session = Session {
      token_hash: input.token_hash,
      user_id:    input.user_id,
      created_at: Utc::now(),
      expires_at: input.expires_at,
    };
    let row = session.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            row.token_hash,
            encode_uuid(row.user_id),
            encode_dt(row.created_at),
            encode_dt(row.expires_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(session)
  }

  async fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> Result<Option<Uuid>> {
    let user_id: Option<String> = self
      .conn
      .call(move |conn| {
        let now = encode_dt(now);
        let pruned = conn.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![now],
        )?;
        if pruned > 0 {
          debug!(pruned, "expired sessions removed");
        }
        Ok(
          conn
            .query_row(
              "SELECT user_id FROM sessions WHERE token_hash = ?1",
              rusqlite::params![token_hash],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    user_id.as_deref().map(decode_uuid).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<usize> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            rusqlite::params![encode_uuid(user_id)],
          )?)
        })
        .await?,
    )
  }
}
