//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use campus_core::import::RowError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("{} invalid row(s)", .0.len())]
  InvalidRows(Vec<RowError>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error, surfacing any domain rejection it carries.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = cause {
      if let Some(core) = e.downcast_ref::<campus_core::Error>() {
        if let Some(mapped) = Self::from_domain(core) {
          return mapped;
        }
        break;
      }
      cause = e.source();
    }
    Self::Store(Box::new(err))
  }

  pub fn unauthorized() -> Self {
    Self::Unauthorized("missing or expired session".into())
  }

  fn from_domain(core: &campus_core::Error) -> Option<Self> {
    use campus_core::Error as E;

    let message = core.to_string();
    let mapped = match core {
      E::NotFound { .. } => Self::NotFound(message),
      E::DuplicateGrade { .. } | E::Conflict(_) => Self::Conflict(message),
      E::StudentNotInSubjectClass { .. }
      | E::TeacherNotAssignedToClass { .. }
      | E::MarksOutOfRange(_)
      | E::Invalid(_) => Self::BadRequest(message),
      E::InvalidRows(rows) => Self::InvalidRows(rows.clone()),
      E::UnknownDiscriminant { .. } | E::Serialization(_) => return None,
    };
    Some(mapped)
  }
}

impl From<campus_core::Error> for ApiError {
  fn from(e: campus_core::Error) -> Self { Self::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return res;
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::InvalidRows(rows) => {
        let body = json!({ "error": self.to_string(), "rows": rows });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, Error)]
  #[error("backend: {0}")]
  struct Wrapped(#[from] campus_core::Error);

  #[test]
  fn wrapped_not_found_maps_to_404() {
    let err = ApiError::store(Wrapped(campus_core::Error::not_found(
      "student",
      Uuid::new_v4(),
    )));
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn domain_rejections_pick_their_status() {
    let conflict = ApiError::from(campus_core::Error::DuplicateGrade {
      term:          "Term 1".into(),
      academic_year: 2025,
    });
    assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

    let bad = ApiError::from(campus_core::Error::MarksOutOfRange(120));
    assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unrelated_errors_are_internal_and_opaque() {
    let err = ApiError::store(std::io::Error::other("no such table: students"));
    let res = err.into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "internal error" }));
  }

  #[test]
  fn unauthorized_advertises_bearer() {
    let res = ApiError::unauthorized().into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
