//! Handlers for `/templates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/templates` | Optional `?kind=report\|certificate\|indemnity` |
//! | `POST`   | `/templates` | Admin. Body: `{"kind","name","content"}` |
//! | `GET`    | `/templates/{id}` | 404 if not found |
//! | `PATCH`  | `/templates/{id}` | Admin |
//! | `DELETE` | `/templates/{id}` | Admin |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  store::SchoolStore,
  template::{NewTemplate, Template, TemplateKind, TemplatePatch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub kind: Option<TemplateKind>,
}

/// `GET /templates[?kind=<kind>]`
pub async fn list<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Template>>, ApiError> {
  let templates = state
    .store
    .list_templates(params.kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(templates))
}

/// `POST /templates`
pub async fn create<S: SchoolStore>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Json(mut body): Json<NewTemplate>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("template name must not be empty".into()));
  }
  body.created_by = Some(admin.user_id);
  let template = state
    .store
    .add_template(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(template)))
}

/// `GET /templates/{id}`
pub async fn get_one<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Template>, ApiError> {
  let template = state
    .store
    .get_template(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("template {id} not found")))?;
  Ok(Json(template))
}

/// `PATCH /templates/{id}`
pub async fn update<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<TemplatePatch>,
) -> Result<Json<Template>, ApiError> {
  let template = state
    .store
    .update_template(id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(template))
}

/// `DELETE /templates/{id}`
pub async fn delete<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_template(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
