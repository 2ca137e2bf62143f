//! Handlers for `/teachers` endpoints. Admin only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/teachers` | |
//! | `POST`   | `/teachers` | Creates the login account too; see [`create`] |
//! | `GET`    | `/teachers/{id}` | 404 if not found |
//! | `PATCH`  | `/teachers/{id}` | `assigned_classes`, when given, replaces the set |
//! | `DELETE` | `/teachers/{id}` | Removes the account as well |
//! | `POST`   | `/teachers/{id}/archive` | Archives the account and ends its sessions |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  store::SchoolStore,
  teacher::{NewTeacher, Teacher, TeacherPatch},
  user::RecordStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, generate_password, hash_password_blocking},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /teachers`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<Teacher>>, ApiError> {
  let teachers = state.store.list_teachers().await.map_err(ApiError::store)?;
  Ok(Json(teachers))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:             String,
  pub email:            String,
  #[serde(default)]
  pub phone:            Option<String>,
  #[serde(default)]
  pub signature_image:  Option<String>,
  #[serde(default)]
  pub assigned_classes: Vec<Uuid>,
  /// When absent a password is generated and returned once.
  #[serde(default)]
  pub password:         Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub teacher:            Teacher,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub generated_password: Option<String>,
}

/// `POST /teachers`
///
/// Account, profile and class links are written together or not at all.
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }
  let (password, generated_password) = match body.password {
    Some(p) if !p.is_empty() => (p, None),
    _ => {
      let p = generate_password(state.settings.generated_password_length);
      (p.clone(), Some(p))
    }
  };

  let password_hash = hash_password_blocking(password).await?;
  let teacher = state
    .store
    .add_teacher(NewTeacher {
      name:             body.name.trim().to_owned(),
      email:            body.email,
      password_hash,
      status:           RecordStatus::Active,
      phone:            body.phone,
      signature_image:  body.signature_image,
      assigned_classes: body.assigned_classes,
    })
    .await
    .map_err(ApiError::store)?;

  info!(
    teacher_id = %teacher.teacher_id,
    classes = teacher.assigned_classes.len(),
    "teacher created"
  );
  Ok((StatusCode::CREATED, Json(Created { teacher, generated_password })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /teachers/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Teacher>, ApiError> {
  let teacher = state
    .store
    .get_teacher(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("teacher {id} not found")))?;
  Ok(Json(teacher))
}

// ─── Update / archive / delete ────────────────────────────────────────────────

/// `PATCH /teachers/{id}`
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<TeacherPatch>,
) -> Result<Json<Teacher>, ApiError> {
  let teacher = state
    .store
    .update_teacher(id, patch)
    .await
    .map_err(ApiError::store)?;
  if !teacher.status.is_active() {
    revoke(&*state.store, teacher.user_id).await?;
  }
  Ok(Json(teacher))
}

/// `POST /teachers/{id}/archive`
pub async fn archive<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Teacher>, ApiError> {
  let teacher = state
    .store
    .archive_teacher(id)
    .await
    .map_err(ApiError::store)?;
  revoke(&*state.store, teacher.user_id).await?;
  info!(teacher_id = %id, "teacher archived");
  Ok(Json(teacher))
}

/// `DELETE /teachers/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_teacher(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn revoke<S: SchoolStore>(store: &S, user_id: Uuid) -> Result<(), ApiError> {
  store
    .delete_sessions_for_user(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(())
}
