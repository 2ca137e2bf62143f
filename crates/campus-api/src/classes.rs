//! Handlers for `/classes` and `/subjects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/classes` | |
//! | `POST`   | `/classes` | Admin. Body: `{"name":"Grade 4A"}` |
//! | `GET`    | `/classes/{id}` | 404 if not found |
//! | `PATCH`  | `/classes/{id}` | Admin. Body: `{"name":".."}` |
//! | `DELETE` | `/classes/{id}` | Admin. Students become unassigned |
//! | `GET`    | `/classes/{id}/teachers` | Teachers assigned to the class |
//! | `GET`    | `/subjects` | Optional `?class_id=<uuid>` |
//! | `POST`   | `/subjects` | Admin. Teacher must be assigned to the class |
//! | `GET`    | `/subjects/{id}` | 404 if not found |
//! | `PATCH`  | `/subjects/{id}` | Admin |
//! | `DELETE` | `/subjects/{id}` | Admin |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  class::{NewClass, NewSubject, SchoolClass, Subject, SubjectPatch},
  store::SchoolStore,
  teacher::Teacher,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
};

// ─── Classes ──────────────────────────────────────────────────────────────────

/// `GET /classes`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
) -> Result<Json<Vec<SchoolClass>>, ApiError> {
  let classes = state.store.list_classes().await.map_err(ApiError::store)?;
  Ok(Json(classes))
}

/// `POST /classes`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<NewClass>,
) -> Result<impl IntoResponse, ApiError> {
  let class = state
    .store
    .add_class(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(class)))
}

/// `GET /classes/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<SchoolClass>, ApiError> {
  let class = state
    .store
    .get_class(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("class {id} not found")))?;
  Ok(Json(class))
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub name: String,
}

/// `PATCH /classes/{id}`
pub async fn rename<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(body): Json<RenameBody>,
) -> Result<Json<SchoolClass>, ApiError> {
  let class = state
    .store
    .rename_class(id, body.name)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(class))
}

/// `DELETE /classes/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_class(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /classes/{id}/teachers`
pub async fn teachers<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Teacher>>, ApiError> {
  let teachers = state
    .store
    .teachers_for_class(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(teachers))
}

// ─── Subjects ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubjectParams {
  pub class_id: Option<Uuid>,
}

/// `GET /subjects[?class_id=<uuid>]`
pub async fn list_subjects<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<SubjectParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = state
    .store
    .list_subjects(params.class_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

/// `POST /subjects`
pub async fn create_subject<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = state
    .store
    .add_subject(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

/// `GET /subjects/{id}`
pub async fn get_subject<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

/// `PATCH /subjects/{id}`
pub async fn update_subject<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<SubjectPatch>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state
    .store
    .update_subject(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subject))
}

/// `DELETE /subjects/{id}`
pub async fn delete_subject<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_subject(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
