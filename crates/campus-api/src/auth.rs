//! Passwords, bearer tokens, and the request identity extractors.
//!
//! Login hands the client a random token once; the store only ever sees its
//! SHA-256 digest. Handlers that need a caller take [`CurrentUser`] (any
//! active account) or [`AdminUser`] (active admin) as an argument.

use argon2::{
  Argon2,
  PasswordHash,
  PasswordHasher,
  PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use campus_core::{
  store::SchoolStore,
  teacher::Teacher,
  user::User,
};
use chrono::Utc;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, error::ApiError};

const TOKEN_BYTES: usize = 32;

const PASSWORD_ALPHABET: &[u8] =
  b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// `false` for a wrong password and for an unparseable hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// [`hash_password`] on the blocking pool; argon2 is too slow for a runtime
/// worker.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
}

/// [`hash_password`] over a batch, on the blocking pool.
pub async fn hash_passwords(passwords: Vec<String>) -> Result<Vec<String>, ApiError> {
  tokio::task::spawn_blocking(move || {
    passwords.iter().map(|p| hash_password(p)).collect::<Result<Vec<_>, _>>()
  })
  .await
  .map_err(|e| ApiError::Store(Box::new(e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn check_password(password: String, hash: String) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || verify_password(&password, &hash))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))
}

/// A random password for a newly created teacher account.
pub fn generate_password(len: usize) -> String {
  // Largest multiple of the alphabet size that fits in a byte, so every
  // character is equally likely.
  let limit = 256 - 256 % PASSWORD_ALPHABET.len();
  let mut out = String::with_capacity(len);
  let mut buf = [0u8; 32];
  while out.len() < len {
    OsRng.fill_bytes(&mut buf);
    for &b in buf.iter().filter(|&&b| usize::from(b) < limit) {
      if out.len() == len {
        break;
      }
      out.push(char::from(PASSWORD_ALPHABET[usize::from(b) % PASSWORD_ALPHABET.len()]));
    }
  }
  out
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// A fresh bearer token, URL-safe base64 without padding.
pub fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The stored form of a token: lowercase hex SHA-256.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractors ───────────────────────────────────────────────────────────────

/// The signed-in caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user:       User,
  /// Digest of the presented token, so logout can revoke exactly it.
  pub token_hash: String,
}

impl CurrentUser {
  pub fn is_admin(&self) -> bool { self.user.is_admin() }

  /// The teacher profile behind this account. Admin accounts and accounts
  /// without a profile are refused.
  pub async fn teacher_profile<S: SchoolStore>(
    &self,
    store: &S,
  ) -> Result<Teacher, ApiError> {
    store
      .get_teacher_by_user(self.user.user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Forbidden("no teacher profile for this account".into()))
  }
}

impl<S: SchoolStore> FromRequestParts<AppState<S>> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token_hash = bearer_token(&parts.headers)
      .map(token_digest)
      .ok_or_else(ApiError::unauthorized)?;

    let user_id = state
      .store
      .resolve_session(token_hash.clone(), Utc::now())
      .await
      .map_err(ApiError::store)?
      .ok_or_else(ApiError::unauthorized)?;

    let user = state
      .store
      .get_user(user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(ApiError::unauthorized)?;

    if !user.status.is_active() {
      return Err(ApiError::Forbidden("account is not active".into()));
    }
    Ok(Self { user, token_hash })
  }
}

/// An active administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S: SchoolStore> FromRequestParts<AppState<S>> for AdminUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let current = CurrentUser::from_request_parts(parts, state).await?;
    if !current.is_admin() {
      return Err(ApiError::Forbidden("administrator access required".into()));
    }
    Ok(Self(current.user))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::Body, http::Request};
  use campus_core::{
    store::{NewSession, SessionStore as _, UserStore as _},
    user::{NewUser, RecordStatus, Role},
  };
  use campus_store_sqlite::SqliteStore;

  use super::*;
  use crate::ApiSettings;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Arc::new(store), ApiSettings::default())
  }

  async fn signed_in(
    state: &AppState<SqliteStore>,
    role: Role,
    status: RecordStatus,
  ) -> String {
    let user = state
      .store
      .add_user(NewUser {
        name: "Someone".into(),
        email: format!("{}@school.test", uuid::Uuid::new_v4()),
        role,
        status,
        password_hash: hash_password("pw").unwrap(),
      })
      .await
      .unwrap();
    let token = new_token();
    state
      .store
      .create_session(NewSession {
        token_hash: token_digest(&token),
        user_id:    user.user_id,
        expires_at: Utc::now() + chrono::Duration::hours(1),
      })
      .await
      .unwrap();
    token
  }

  fn parts_with(auth: Option<String>) -> Parts {
    let mut builder = Request::builder();
    if let Some(value) = auth {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap().into_parts().0
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("battery staple", &hash));
    assert!(!verify_password("anything", "not a phc string"));
  }

  #[tokio::test]
  async fn hashing_runs_on_the_blocking_pool() {
    let hashes = hash_passwords(vec!["one".into(), "two".into()]).await.unwrap();
    assert_eq!(hashes.len(), 2);
    assert_ne!(hashes[0], hashes[1]);
    assert!(check_password("one".into(), hashes[0].clone()).await.unwrap());
    assert!(!check_password("one".into(), hashes[1].clone()).await.unwrap());

    let single = hash_password_blocking("three".into()).await.unwrap();
    assert!(verify_password("three", &single));
  }

  #[test]
  fn generated_passwords_use_the_alphabet() {
    let pw = generate_password(12);
    assert_eq!(pw.len(), 12);
    assert!(pw.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    assert_ne!(generate_password(12), pw);
  }

  #[test]
  fn tokens_are_distinct_and_digests_stable() {
    let (a, b) = (new_token(), new_token());
    assert_ne!(a, b);
    assert_eq!(URL_SAFE_NO_PAD.decode(&a).unwrap().len(), TOKEN_BYTES);
    assert_eq!(token_digest(&a), token_digest(&a));
    assert_eq!(token_digest(&a).len(), 64);
  }

  #[tokio::test]
  async fn valid_token_resolves_user() {
    let state = make_state().await;
    let token = signed_in(&state, Role::Teacher, RecordStatus::Active).await;
    let mut parts = parts_with(Some(format!("Bearer {token}")));
    let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(current.user.role, Role::Teacher);
    assert_eq!(current.token_hash, token_digest(&token));
  }

  #[tokio::test]
  async fn missing_or_unknown_token_is_unauthorized() {
    let state = make_state().await;
    let mut parts = parts_with(None);
    assert!(matches!(
      CurrentUser::from_request_parts(&mut parts, &state).await,
      Err(ApiError::Unauthorized(_))
    ));
    let mut parts = parts_with(Some(format!("Bearer {}", new_token())));
    assert!(matches!(
      CurrentUser::from_request_parts(&mut parts, &state).await,
      Err(ApiError::Unauthorized(_))
    ));
  }

  #[tokio::test]
  async fn archived_account_is_forbidden() {
    let state = make_state().await;
    let token = signed_in(&state, Role::Admin, RecordStatus::Archived).await;
    let mut parts = parts_with(Some(format!("Bearer {token}")));
    assert!(matches!(
      CurrentUser::from_request_parts(&mut parts, &state).await,
      Err(ApiError::Forbidden(_))
    ));
  }

  #[tokio::test]
  async fn teacher_is_not_admin() {
    let state = make_state().await;
    let token = signed_in(&state, Role::Teacher, RecordStatus::Active).await;
    let mut parts = parts_with(Some(format!("Bearer {token}")));
    assert!(matches!(
      AdminUser::from_request_parts(&mut parts, &state).await,
      Err(ApiError::Forbidden(_))
    ));
  }
}
