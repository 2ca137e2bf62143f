//! Bulk onboarding. Admin only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/import/{entity}/template` | `students` or `teachers`: the column list |
//! | `POST` | `/import/students` | Body: JSON array of student rows |
//! | `POST` | `/import/teachers` | Body: JSON array of teacher rows |
//!
//! A batch is all or nothing. Any bad row rejects the request with a `rows`
//! array of `{row, reason}` and nothing is stored.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  import::{self, STUDENT_COLUMNS, TEACHER_COLUMNS},
  store::SchoolStore,
  student::Student,
  teacher::NewTeacher,
  user::RecordStatus,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
  AppState,
  auth::{AdminUser, generate_password, hash_passwords},
  error::ApiError,
  teachers::Created,
};

// ─── Column templates ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ColumnTemplate {
  pub entity:  String,
  pub columns: &'static [&'static str],
}

/// `GET /import/{entity}/template`
pub async fn column_template<S: SchoolStore>(
  _admin: AdminUser,
  Path(entity): Path<String>,
) -> Result<Json<ColumnTemplate>, ApiError> {
  let columns = match entity.as_str() {
    "students" => STUDENT_COLUMNS,
    "teachers" => TEACHER_COLUMNS,
    other => {
      return Err(ApiError::NotFound(format!("no import template for {other:?}")));
    }
  };
  Ok(Json(ColumnTemplate { entity, columns }))
}

// ─── Students ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StudentImport {
  pub imported: usize,
  pub students: Vec<Student>,
}

/// `POST /import/students`
pub async fn students<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(rows): Json<Vec<Value>>,
) -> Result<impl IntoResponse, ApiError> {
  let classes = state.store.list_classes().await.map_err(ApiError::store)?;
  let batch =
    import::validate_students(rows, &classes).map_err(ApiError::InvalidRows)?;

  let students = state
    .store
    .add_students(batch)
    .await
    .map_err(ApiError::store)?;
  info!(count = students.len(), "students imported");
  Ok((
    StatusCode::CREATED,
    Json(StudentImport { imported: students.len(), students }),
  ))
}

// ─── Teachers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TeacherImport {
  pub imported: usize,
  /// Each new teacher with the password generated for their account.
  pub teachers: Vec<Created>,
}

/// `POST /import/teachers`
pub async fn teachers<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(rows): Json<Vec<Value>>,
) -> Result<impl IntoResponse, ApiError> {
  let classes = state.store.list_classes().await.map_err(ApiError::store)?;
  let batch =
    import::validate_teachers(rows, &classes).map_err(ApiError::InvalidRows)?;

  let passwords: Vec<String> = (0..batch.len())
    .map(|_| generate_password(state.settings.generated_password_length))
    .collect();
  let hashes = hash_passwords(passwords.clone()).await?;
  let inputs: Vec<NewTeacher> = batch
    .into_iter()
    .zip(hashes)
    .map(|(row, password_hash)| NewTeacher {
      name: row.name,
      email: row.email,
      password_hash,
      status: RecordStatus::Active,
      phone: row.phone,
      signature_image: None,
      assigned_classes: row.assigned_classes,
    })
    .collect();

  let created = state
    .store
    .add_teachers(inputs)
    .await
    .map_err(ApiError::store)?;
  info!(count = created.len(), "teachers imported");

  let teachers: Vec<Created> = created
    .into_iter()
    .zip(passwords)
    .map(|(teacher, password)| Created {
      teacher,
      generated_password: Some(password),
    })
    .collect();
  Ok((
    StatusCode::CREATED,
    Json(TeacherImport { imported: teachers.len(), teachers }),
  ))
}
