//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/students` | Optional `?class_id=<uuid>&status=active\|inactive\|archived` |
//! | `POST`   | `/students` | Admin. Body: a full student record without id |
//! | `GET`    | `/students/{id}` | 404 if not found |
//! | `PATCH`  | `/students/{id}` | Admin. `null` clears optional fields |
//! | `DELETE` | `/students/{id}` | Admin |
//! | `POST`   | `/students/{id}/archive` | Admin. Soft delete |
//! | `GET`    | `/students/{id}/summary` | Grades by term, averages, attendance |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  class::SchoolClass,
  metrics::{self, AttendanceSummary, TermSummary},
  store::{AttendanceQuery, GradeQuery, SchoolStore, StudentQuery},
  student::{NewStudent, Student, StudentPatch},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /students[?class_id=<uuid>&status=<status>]`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<Student>>, ApiError> {
  let students = state
    .store
    .list_students(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  let student = state
    .store
    .add_student(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(load(&*state.store, id).await?))
}

pub(crate) async fn load<S: SchoolStore>(store: &S, id: Uuid) -> Result<Student, ApiError> {
  store
    .get_student(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))
}

// ─── Update / archive / delete ────────────────────────────────────────────────

/// `PATCH /students/{id}`
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
  let student = state
    .store
    .update_student(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(student))
}

/// `POST /students/{id}/archive`
pub async fn archive<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  let student = state
    .store
    .archive_student(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(student))
}

/// `DELETE /students/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_student(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StudentSummary {
  pub student:         Student,
  pub class:           Option<SchoolClass>,
  pub terms:           Vec<TermSummary>,
  /// Mean over every grade on record, one decimal.
  pub overall_average: Option<f64>,
  pub attendance:      AttendanceSummary,
  pub attendance_rate: Option<u32>,
}

/// `GET /students/{id}/summary`
pub async fn summary<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StudentSummary>, ApiError> {
  let store = &*state.store;
  let student = load(store, id).await?;

  let class = match student.class_id {
    Some(class_id) => store.get_class(class_id).await.map_err(ApiError::store)?,
    None => None,
  };
  let grades = store
    .list_grades(GradeQuery { student_id: Some(id), ..Default::default() })
    .await
    .map_err(ApiError::store)?;
  let records = store
    .list_attendance(AttendanceQuery { student_id: Some(id), ..Default::default() })
    .await
    .map_err(ApiError::store)?;

  let attendance = AttendanceSummary::from_records(&records);
  Ok(Json(StudentSummary {
    student,
    class,
    terms: metrics::term_summaries(&grades),
    overall_average: metrics::average_marks(&grades),
    attendance_rate: attendance.rate(),
    attendance,
  }))
}
