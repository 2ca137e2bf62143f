//! Handlers for `/terms` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/terms` | Optional `?year=2025`; year desc, term asc |
//! | `POST`  | `/terms` | Admin. Body: `{"year","term","name","start_date","end_date"}` |
//! | `GET`   | `/terms/active` | `null` when no term is active |
//! | `PATCH` | `/terms/{id}` | Admin |
//! | `POST`  | `/terms/{id}/activate` | Admin. Deactivates every other term |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  store::SchoolStore,
  term::{AcademicTerm, AcademicTermPatch, NewAcademicTerm},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub year: Option<i32>,
}

/// `GET /terms[?year=<year>]`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AcademicTerm>>, ApiError> {
  let terms = state
    .store
    .list_terms(params.year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(terms))
}

/// `POST /terms`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Json(body): Json<NewAcademicTerm>,
) -> Result<impl IntoResponse, ApiError> {
  let term = state.store.add_term(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(term)))
}

/// `GET /terms/active`
pub async fn active<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
) -> Result<Json<Option<AcademicTerm>>, ApiError> {
  let term = state.store.active_term().await.map_err(ApiError::store)?;
  Ok(Json(term))
}

/// `PATCH /terms/{id}`
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<AcademicTermPatch>,
) -> Result<Json<AcademicTerm>, ApiError> {
  let term = state
    .store
    .update_term(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(term))
}

/// `POST /terms/{id}/activate`
pub async fn activate<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<AcademicTerm>, ApiError> {
  let term = state
    .store
    .set_active_term(id)
    .await
    .map_err(ApiError::store)?;
  info!(term_id = %id, name = %term.name, "active term changed");
  Ok(Json(term))
}
