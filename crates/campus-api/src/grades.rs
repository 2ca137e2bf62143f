//! Handlers for `/grades` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/grades` | Optional `?student_id&subject_id&term&academic_year` |
//! | `POST`   | `/grades` | Body: `{"student_id","subject_id","marks","term","academic_year"}` |
//! | `GET`    | `/grades/{id}` | 404 if not found |
//! | `PATCH`  | `/grades/{id}` | Any of `marks`, `comment` |
//! | `DELETE` | `/grades/{id}` | |
//!
//! Teachers may only write grades for subjects assigned to them.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  grade::{Grade, GradePatch, NewGrade},
  store::{GradeQuery, SchoolStore},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /grades[?student_id&subject_id&term&academic_year]`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(query): Query<GradeQuery>,
) -> Result<Json<Vec<Grade>>, ApiError> {
  let grades = state
    .store
    .list_grades(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(grades))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /grades`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<NewGrade>,
) -> Result<impl IntoResponse, ApiError> {
  ensure_teaches(&*state.store, &current, body.subject_id).await?;
  let grade = state
    .store
    .add_grade(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(grade)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /grades/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Grade>, ApiError> {
  Ok(Json(load(&*state.store, id).await?))
}

async fn load<S: SchoolStore>(store: &S, id: Uuid) -> Result<Grade, ApiError> {
  store
    .get_grade(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("grade {id} not found")))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /grades/{id}`
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<GradePatch>,
) -> Result<Json<Grade>, ApiError> {
  let existing = load(&*state.store, id).await?;
  ensure_teaches(&*state.store, &current, existing.subject_id).await?;
  let grade = state
    .store
    .update_grade(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(grade))
}

/// `DELETE /grades/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let existing = load(&*state.store, id).await?;
  ensure_teaches(&*state.store, &current, existing.subject_id).await?;
  state.store.delete_grade(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Access ───────────────────────────────────────────────────────────────────

/// Admins may grade anything; a teacher only subjects whose `teacher_id` is
/// their own profile.
async fn ensure_teaches<S: SchoolStore>(
  store: &S,
  current: &CurrentUser,
  subject_id: Uuid,
) -> Result<(), ApiError> {
  if current.is_admin() {
    return Ok(());
  }
  let teacher = current.teacher_profile(store).await?;
  let subject = store
    .get_subject(subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {subject_id} not found")))?;
  if subject.teacher_id != Some(teacher.teacher_id) {
    return Err(ApiError::Forbidden(format!(
      "you are not the teacher of subject {:?}",
      subject.name
    )));
  }
  Ok(())
}
