//! JSON REST API for Campus.
//!
//! Exposes an axum [`Router`] backed by any
//! [`campus_core::store::SchoolStore`]. Every route except login expects an
//! `Authorization: Bearer <token>` header; see [`auth`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(state))
//! ```

pub mod account;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod documents;
pub mod error;
pub mod grades;
pub mod import;
pub mod students;
pub mod teachers;
pub mod templates;
pub mod terms;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use campus_core::store::SchoolStore;

pub use error::ApiError;

// ─── State ────────────────────────────────────────────────────────────────────

/// Tunables the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Lifetime of a login session.
  pub session_ttl:               chrono::Duration,
  /// chrono format string for `{{Date}}` / `{{GeneratedDate}}`.
  pub date_format:               String,
  pub generated_password_length: usize,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      session_ttl:               chrono::Duration::hours(12),
      date_format:               "%Y-%m-%d".into(),
      generated_password_length: 12,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self { store, settings: Arc::new(settings) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      settings: Arc::clone(&self.settings),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: SchoolStore>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Account
    .route("/auth/login", post(account::login::<S>))
    .route("/auth/logout", post(account::logout::<S>))
    .route("/auth/me", get(account::me::<S>))
    .route("/auth/password", post(account::change_password::<S>))
    .route("/dashboard", get(dashboard::handler::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .patch(users::update::<S>)
        .delete(users::delete::<S>),
    )
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .patch(students::update::<S>)
        .delete(students::delete::<S>),
    )
    .route("/students/{id}/archive", post(students::archive::<S>))
    .route("/students/{id}/summary", get(students::summary::<S>))
    // Teachers
    .route("/teachers", get(teachers::list::<S>).post(teachers::create::<S>))
    .route(
      "/teachers/{id}",
      get(teachers::get_one::<S>)
        .patch(teachers::update::<S>)
        .delete(teachers::delete::<S>),
    )
    .route("/teachers/{id}/archive", post(teachers::archive::<S>))
    // Classes & subjects
    .route("/classes", get(classes::list::<S>).post(classes::create::<S>))
    .route(
      "/classes/{id}",
      get(classes::get_one::<S>)
        .patch(classes::rename::<S>)
        .delete(classes::delete::<S>),
    )
    .route("/classes/{id}/teachers", get(classes::teachers::<S>))
    .route(
      "/subjects",
      get(classes::list_subjects::<S>).post(classes::create_subject::<S>),
    )
    .route(
      "/subjects/{id}",
      get(classes::get_subject::<S>)
        .patch(classes::update_subject::<S>)
        .delete(classes::delete_subject::<S>),
    )
    // Grades
    .route("/grades", get(grades::list::<S>).post(grades::create::<S>))
    .route(
      "/grades/{id}",
      get(grades::get_one::<S>)
        .patch(grades::update::<S>)
        .delete(grades::delete::<S>),
    )
    // Attendance
    .route("/attendance", get(attendance::list::<S>))
    .route("/attendance/{class_id}/{date}", put(attendance::replace::<S>))
    .route("/attendance/records/{id}", patch(attendance::update_record::<S>))
    // Templates
    .route("/templates", get(templates::list::<S>).post(templates::create::<S>))
    .route(
      "/templates/{id}",
      get(templates::get_one::<S>)
        .patch(templates::update::<S>)
        .delete(templates::delete::<S>),
    )
    // Documents
    .route("/documents/report", post(documents::generate_report::<S>))
    .route("/documents/certificate", post(documents::generate_certificate::<S>))
    .route("/documents/indemnity", post(documents::generate_indemnity::<S>))
    .route("/reports", get(documents::list_reports::<S>))
    .route("/reports/{id}", get(documents::get_report::<S>))
    .route("/reports/{id}/print", get(documents::print_report::<S>))
    .route("/indemnity-forms", get(documents::list_indemnity_forms::<S>))
    .route("/indemnity-forms/{id}", get(documents::get_indemnity_form::<S>))
    .route(
      "/indemnity-forms/{id}/print",
      get(documents::print_indemnity_form::<S>),
    )
    .route("/certificates", get(documents::list_certificates::<S>))
    // Academic terms
    .route("/terms", get(terms::list::<S>).post(terms::create::<S>))
    .route("/terms/active", get(terms::active::<S>))
    .route("/terms/{id}", patch(terms::update::<S>))
    .route("/terms/{id}/activate", post(terms::activate::<S>))
    // Import
    .route("/import/{entity}/template", get(import::column_template::<S>))
    .route("/import/students", post(import::students::<S>))
    .route("/import/teachers", post(import::teachers::<S>))
    .with_state(state)
}
