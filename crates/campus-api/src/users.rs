//! Handlers for `/users` endpoints. Admin only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/users` | Oldest first |
//! | `POST`   | `/users` | Body: `{"name","email","role","password"}` |
//! | `GET`    | `/users/{id}` | 404 if not found |
//! | `PATCH`  | `/users/{id}` | Any of `name`, `email`, `role`, `status` |
//! | `DELETE` | `/users/{id}` | Not allowed on the caller's own account |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  store::SchoolStore,
  user::{NewUser, RecordStatus, Role, User, UserPatch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, hash_password_blocking},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:     String,
  pub email:    String,
  pub role:     Role,
  #[serde(default)]
  pub status:   RecordStatus,
  pub password: String,
}

/// `POST /users`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }
  let password_hash = hash_password_blocking(body.password).await?;
  let user = state
    .store
    .add_user(NewUser {
      name:          body.name,
      email:         body.email,
      role:          body.role,
      status:        body.status,
      password_hash,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /users/{id}`
///
/// Moving an account out of `active` also ends its sessions.
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("nothing to update".into()));
  }
  let user = state
    .store
    .update_user(id, patch)
    .await
    .map_err(ApiError::store)?;
  if !user.status.is_active() {
    state
      .store
      .delete_sessions_for_user(id)
      .await
      .map_err(ApiError::store)?;
  }
  Ok(Json(user))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if admin.user_id == id {
    return Err(ApiError::BadRequest("cannot delete your own account".into()));
  }
  state.store.delete_user(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
