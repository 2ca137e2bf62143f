//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Public. Body: `{"email":"..","password":".."}` |
//! | `POST` | `/auth/logout` | Revokes the presented token |
//! | `GET`  | `/auth/me` | Account, teacher profile, visible pages |
//! | `POST` | `/auth/password` | Body: `{"current_password":"..","new_password":".."}` |

use axum::{Json, extract::State, http::StatusCode};
use campus_core::{
  nav::{Page, pages_for},
  store::{NewSession, SchoolStore},
  teacher::Teacher,
  user::{User, normalize_email},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  AppState,
  auth::{CurrentUser, check_password, hash_password_blocking, new_token, token_digest},
  error::ApiError,
};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
  pub pages:      Vec<Page>,
}

/// `POST /auth/login`
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login<S: SchoolStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
  let rejected = || ApiError::Unauthorized("invalid email or password".into());
  let email = normalize_email(&body.email);

  let Some(user) = state
    .store
    .get_user_by_email(email.clone())
    .await
    .map_err(ApiError::store)?
  else {
    warn!(%email, "login rejected: unknown email");
    return Err(rejected());
  };

  let hash = state
    .store
    .password_hash(user.user_id)
    .await
    .map_err(ApiError::store)?
    .unwrap_or_default();
  if !check_password(body.password, hash).await? {
    warn!(%email, "login rejected: wrong password");
    return Err(rejected());
  }

  if !user.status.is_active() {
    warn!(%email, status = ?user.status, "login rejected: account not active");
    return Err(ApiError::Forbidden("account is not active".into()));
  }

  let token = new_token();
  let session = state
    .store
    .create_session(NewSession {
      token_hash: token_digest(&token),
      user_id:    user.user_id,
      expires_at: Utc::now() + state.settings.session_ttl,
    })
    .await
    .map_err(ApiError::store)?;

  info!(user_id = %user.user_id, role = ?user.role, "login");
  Ok(Json(LoginResponse {
    token,
    expires_at: session.expires_at,
    pages: pages_for(user.role),
    user,
  }))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /auth/logout`
pub async fn logout<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_session(current.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Me ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub user:    User,
  /// Present for teacher accounts.
  pub teacher: Option<Teacher>,
  pub pages:   Vec<Page>,
}

/// `GET /auth/me`
pub async fn me<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
  let teacher = state
    .store
    .get_teacher_by_user(current.user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(MeResponse {
    pages: pages_for(current.user.role),
    user: current.user,
    teacher,
  }))
}

// ─── Change password ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub current_password: String,
  pub new_password:     String,
}

/// `POST /auth/password`
pub async fn change_password<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError> {
  let user_id = current.user.user_id;
  let hash = state
    .store
    .password_hash(user_id)
    .await
    .map_err(ApiError::store)?
    .unwrap_or_default();
  if !check_password(body.current_password, hash).await? {
    return Err(ApiError::BadRequest("current password is incorrect".into()));
  }
  if body.new_password.trim().is_empty() {
    return Err(ApiError::BadRequest("new password must not be empty".into()));
  }

  let new_hash = hash_password_blocking(body.new_password).await?;
  state
    .store
    .set_password_hash(user_id, new_hash)
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, "password changed");
  Ok(StatusCode::NO_CONTENT)
}
