//! HTTP server wiring for Campus.
//!
//! Mounts [`campus_api::api_router`] under `/api`, adds a health check,
//! and wraps everything in a request-tracing layer.

use std::path::PathBuf;

use axum::{Json, Router, routing::get};
use campus_api::{ApiSettings, AppState};
use campus_core::store::SchoolStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAMPUS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                      String,
  #[serde(default = "default_port")]
  pub port:                      u16,
  /// A leading `~/` is expanded by the binary.
  #[serde(default = "default_store_path")]
  pub store_path:                PathBuf,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:         i64,
  /// chrono format string for `{{Date}}` and `{{GeneratedDate}}`.
  #[serde(default = "default_date_format")]
  pub date_format:               String,
  #[serde(default = "default_generated_password_length")]
  pub generated_password_length: usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/campus/campus.db") }
fn default_session_ttl_hours() -> i64 { 12 }
fn default_date_format() -> String { "%Y-%m-%d".into() }
fn default_generated_password_length() -> usize { 12 }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("session_ttl_hours must be positive, got {0}")]
  SessionTtl(i64),
  #[error("date_format {0:?} is not a valid chrono format")]
  DateFormat(String),
  #[error("generated_password_length must be at least 8, got {0}")]
  PasswordLength(usize),
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Validate the request-time tunables and hand them to the API layer.
  pub fn api_settings(&self) -> Result<ApiSettings, ConfigError> {
    if self.session_ttl_hours <= 0 {
      return Err(ConfigError::SessionTtl(self.session_ttl_hours));
    }
    if self.generated_password_length < 8 {
      return Err(ConfigError::PasswordLength(self.generated_password_length));
    }
    campus_api::documents::format_date(chrono::NaiveDate::default(), &self.date_format)
      .map_err(|_| ConfigError::DateFormat(self.date_format.clone()))?;

    Ok(ApiSettings {
      session_ttl:               chrono::Duration::hours(self.session_ttl_hours),
      date_format:               self.date_format.clone(),
      generated_password_length: self.generated_password_length,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/api/...` plus `GET /health`.
pub fn router<S: SchoolStore>(state: AppState<S>) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api", campus_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use campus_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(AppState::new(Arc::new(store), ApiSettings::default()))
  }

  async fn get_status(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
      .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  fn load(overrides: &[(&str, &str)]) -> ServerConfig {
    let mut builder = config::Config::builder();
    for (key, value) in overrides {
      builder = builder.set_override(*key, *value).unwrap();
    }
    builder.build().unwrap().try_deserialize().unwrap()
  }

  #[tokio::test]
  async fn health_is_public() {
    let (status, body) = get_status(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn api_is_nested_and_authenticated() {
    let (status, body) = get_status(app().await, "/api/students").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = get_status(app().await, "/students").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = load(&[]);
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.session_ttl_hours, 12);

    let settings = cfg.api_settings().unwrap();
    assert_eq!(settings.session_ttl, chrono::Duration::hours(12));
    assert_eq!(settings.date_format, "%Y-%m-%d");
    assert_eq!(settings.generated_password_length, 12);
  }

  #[test]
  fn overrides_are_validated() {
    let cfg = load(&[("port", "9000"), ("date_format", "%d %B %Y")]);
    assert_eq!(cfg.port, 9000);
    assert!(cfg.api_settings().is_ok());

    let cfg = load(&[("date_format", "%Q")]);
    assert!(matches!(cfg.api_settings(), Err(ConfigError::DateFormat(_))));

    let cfg = load(&[("session_ttl_hours", "0")]);
    assert!(matches!(cfg.api_settings(), Err(ConfigError::SessionTtl(0))));

    let cfg = load(&[("generated_password_length", "4")]);
    assert!(matches!(cfg.api_settings(), Err(ConfigError::PasswordLength(4))));
  }
}
