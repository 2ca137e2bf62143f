//! Handlers for the attendance register.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/attendance` | Optional `?class_id&student_id&date=YYYY-MM-DD` |
//! | `PUT`   | `/attendance/{class_id}/{date}` | Body: `[{"student_id","status","comment"}]` |
//! | `PATCH` | `/attendance/records/{id}` | Admin. Any of `status`, `comment` |
//!
//! A `PUT` replaces the whole register for that class and day. Teachers may
//! submit only for classes they are assigned to, and only once per day; a
//! saved register is locked for them afterwards.

use std::collections::HashSet;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use campus_core::{
  attendance::{Attendance, AttendanceEntry, AttendancePatch, RegisterWrite},
  store::{AttendanceQuery, SchoolStore, StudentQuery},
};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /attendance[?class_id&student_id&date]`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
  let records = state
    .store
    .list_attendance(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Replace register ─────────────────────────────────────────────────────────

/// `PUT /attendance/{class_id}/{date}`
pub async fn replace<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path((class_id, date)): Path<(Uuid, NaiveDate)>,
  Json(entries): Json<Vec<AttendanceEntry>>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
  let store = &*state.store;

  let mode = if current.is_admin() {
    RegisterWrite::Replace
  } else {
    let teacher = current.teacher_profile(store).await?;
    if !teacher.teaches(class_id) {
      return Err(ApiError::Forbidden(format!(
        "you are not assigned to class {class_id}"
      )));
    }
    RegisterWrite::FirstOnly
  };

  let enrolled: HashSet<Uuid> = store
    .list_students(StudentQuery { class_id: Some(class_id), ..Default::default() })
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|s| s.student_id)
    .collect();
  if let Some(stranger) = entries.iter().find(|e| !enrolled.contains(&e.student_id)) {
    return Err(ApiError::BadRequest(format!(
      "student {} is not in class {class_id}",
      stranger.student_id
    )));
  }

  let register = store
    .replace_register(class_id, date, entries, mode)
    .await
    .map_err(ApiError::store)?;
  info!(
    %class_id,
    %date,
    records = register.len(),
    by = %current.user.user_id,
    "attendance register saved"
  );
  Ok(Json(register))
}

// ─── Correct one record ───────────────────────────────────────────────────────

/// `PATCH /attendance/records/{id}`
pub async fn update_record<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<AttendancePatch>,
) -> Result<Json<Attendance>, ApiError> {
  let record = state
    .store
    .update_attendance(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}
