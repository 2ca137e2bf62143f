//! Document generation, history, and printable export.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents/report` | Body: `{"student_id","term","academic_year"?,"template_id"?,"teacher_comment"?}` |
//! | `POST` | `/documents/certificate` | Body: `{"student_id","title"?,"term"?,"template_id"?}` |
//! | `POST` | `/documents/indemnity` | Body: `{"student_id","template_id"?,"signed_by"?}` |
//! | `GET`  | `/reports` | Optional `?student_id&term`, newest first |
//! | `GET`  | `/reports/{id}` | 404 if not found |
//! | `GET`  | `/reports/{id}/print` | `text/html` |
//! | `GET`  | `/indemnity-forms` | Optional `?student_id`, newest first |
//! | `GET`  | `/indemnity-forms/{id}` | 404 if not found |
//! | `GET`  | `/indemnity-forms/{id}/print` | `text/html` |
//! | `GET`  | `/certificates` | Optional `?student_id`, newest first |
//!
//! Generation renders the requested template (or the first of its kind) and
//! stores the result. Without a usable template the response carries the
//! "no template found" text, `template_id: null`, and nothing is stored.

use std::fmt::Write as _;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use campus_core::{
  class::SchoolClass,
  compose::{self, DocumentContext, ReportInputs},
  document::{
    Certificate,
    IndemnityForm,
    NewCertificate,
    NewIndemnityForm,
    NewTermReport,
    TermReport,
  },
  render::{self, Placeholder, Rendered},
  store::{AttendanceQuery, GradeQuery, ReportQuery, SchoolStore},
  student::Student,
  template::TemplateKind,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError, students};

// ─── Shared ───────────────────────────────────────────────────────────────────

/// The outcome of a generation request.
#[derive(Debug, Serialize)]
pub struct Generated<T> {
  pub title:       String,
  pub content:     String,
  pub template_id: Option<Uuid>,
  /// The stored record; `None` when no template was available.
  pub record:      Option<T>,
}

impl<T: Serialize> IntoResponse for Generated<T> {
  fn into_response(self) -> Response {
    let status =
      if self.record.is_some() { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(self)).into_response()
  }
}

/// Everything a document needs besides its kind-specific inputs.
struct Recipient {
  student: Student,
  class:   Option<SchoolClass>,
  date:    String,
}

impl Recipient {
  async fn load<S: SchoolStore>(
    state: &AppState<S>,
    student_id: Uuid,
  ) -> Result<Self, ApiError> {
    let store = &*state.store;
    let student = students::load(store, student_id).await?;
    let class = match student.class_id {
      Some(id) => store.get_class(id).await.map_err(ApiError::store)?,
      None => None,
    };
    let date = format_date(Utc::now().date_naive(), &state.settings.date_format)?;
    Ok(Self { student, class, date })
  }

  fn context<'a>(&'a self, current: &'a CurrentUser) -> DocumentContext<'a> {
    DocumentContext {
      student:      &self.student,
      class:        self.class.as_ref(),
      teacher_name: Some(current.user.name.as_str()),
      date:         &self.date,
    }
  }
}

/// Format with a chrono pattern, reporting a bad pattern instead of
/// panicking.
pub fn format_date(date: NaiveDate, pattern: &str) -> Result<String, ApiError> {
  let mut out = String::new();
  write!(out, "{}", date.format(pattern)).map_err(|_| {
    ApiError::Store(format!("invalid date format {pattern:?}").into())
  })?;
  Ok(out)
}

async fn render_kind<S: SchoolStore>(
  store: &S,
  kind: TemplateKind,
  requested: Option<Uuid>,
  values: &render::RenderValues,
) -> Result<Rendered, ApiError> {
  let templates = store
    .list_templates(Some(kind))
    .await
    .map_err(ApiError::store)?;
  let template = render::select_template(kind, &templates, requested);
  Ok(render::render_document(kind, template, values))
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportBody {
  pub student_id:      Uuid,
  pub term:            String,
  #[serde(default)]
  pub academic_year:   Option<i32>,
  #[serde(default)]
  pub template_id:     Option<Uuid>,
  #[serde(default)]
  pub teacher_comment: Option<String>,
}

/// `POST /documents/report`
///
/// Grades are the student's grades for `term` (and `academic_year` when
/// given). Attendance is limited to the academic term of the same name when
/// one exists, otherwise all of the student's records count.
pub async fn generate_report<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<ReportBody>,
) -> Result<Generated<TermReport>, ApiError> {
  let store = &*state.store;
  let term = body.term.trim().to_owned();
  if term.is_empty() {
    return Err(ApiError::BadRequest("term must not be empty".into()));
  }
  let recipient = Recipient::load(&state, body.student_id).await?;

  let grades = store
    .list_grades(GradeQuery {
      student_id: Some(body.student_id),
      term: Some(term.clone()),
      academic_year: body.academic_year,
      ..Default::default()
    })
    .await
    .map_err(ApiError::store)?;
  let subjects = store.list_subjects(None).await.map_err(ApiError::store)?;

  let mut attendance = store
    .list_attendance(AttendanceQuery {
      student_id: Some(body.student_id),
      ..Default::default()
    })
    .await
    .map_err(ApiError::store)?;
  let academic_term = store
    .list_terms(body.academic_year)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .find(|t| t.name.eq_ignore_ascii_case(&term));
  if let Some(t) = academic_term {
    attendance.retain(|a| t.contains(a.date));
  }

  let values = compose::report_values(&recipient.context(&current), &ReportInputs {
    term:            &term,
    grades:          &grades,
    subjects:        &subjects,
    attendance:      &attendance,
    teacher_comment: body.teacher_comment.as_deref(),
  });
  let rendered =
    render_kind(store, TemplateKind::Report, body.template_id, &values).await?;

  let record = match rendered.template_id {
    Some(template_id) => Some(
      store
        .add_report(NewTermReport {
          student_id: body.student_id,
          class_id: recipient.student.class_id,
          term: term.clone(),
          template_id,
          generated_by: current.user.user_id,
          content: rendered.content.clone(),
          comments: body.teacher_comment.unwrap_or_default(),
        })
        .await
        .map_err(ApiError::store)?,
    ),
    None => None,
  };

  info!(
    student_id = %body.student_id,
    %term,
    stored = record.is_some(),
    "report generated"
  );
  Ok(Generated {
    title: format!("{}: {term} Report", recipient.student.full_name()),
    content: rendered.content,
    template_id: rendered.template_id,
    record,
  })
}

// ─── Certificate ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CertificateBody {
  pub student_id:  Uuid,
  /// Feeds `{{Subject}}`; defaults to "General Excellence".
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub term:        Option<String>,
  #[serde(default)]
  pub template_id: Option<Uuid>,
}

/// `POST /documents/certificate`
pub async fn generate_certificate<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CertificateBody>,
) -> Result<Generated<Certificate>, ApiError> {
  let store = &*state.store;
  let recipient = Recipient::load(&state, body.student_id).await?;

  let values = compose::certificate_values(
    &recipient.context(&current),
    body.term.as_deref(),
    body.title.as_deref(),
  );
  let rendered =
    render_kind(store, TemplateKind::Certificate, body.template_id, &values)
      .await?;

  let record = match rendered.template_id {
    Some(template_id) => Some(
      store
        .add_certificate(NewCertificate {
          student_id: body.student_id,
          title: values.get(Placeholder::Subject).to_owned(),
          template_id,
          content: rendered.content.clone(),
        })
        .await
        .map_err(ApiError::store)?,
    ),
    None => None,
  };

  info!(
    student_id = %body.student_id,
    stored = record.is_some(),
    "certificate generated"
  );
  Ok(Generated {
    title: format!("{}: Certificate", recipient.student.full_name()),
    content: rendered.content,
    template_id: rendered.template_id,
    record,
  })
}

// ─── Indemnity form ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IndemnityBody {
  pub student_id:  Uuid,
  #[serde(default)]
  pub template_id: Option<Uuid>,
  #[serde(default)]
  pub signed_by:   Option<String>,
}

/// `POST /documents/indemnity`
pub async fn generate_indemnity<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<IndemnityBody>,
) -> Result<Generated<IndemnityForm>, ApiError> {
  let store = &*state.store;
  let recipient = Recipient::load(&state, body.student_id).await?;

  let values = compose::indemnity_values(&recipient.context(&current));
  let rendered =
    render_kind(store, TemplateKind::Indemnity, body.template_id, &values)
      .await?;

  let record = match rendered.template_id {
    Some(template_id) => Some(
      store
        .add_indemnity_form(NewIndemnityForm {
          student_id: body.student_id,
          template_id,
          content: rendered.content.clone(),
          signed_by: body.signed_by.filter(|s| !s.trim().is_empty()),
        })
        .await
        .map_err(ApiError::store)?,
    ),
    None => None,
  };

  info!(
    student_id = %body.student_id,
    stored = record.is_some(),
    "indemnity form generated"
  );
  Ok(Generated {
    title: format!("{}: Indemnity Form", recipient.student.full_name()),
    content: rendered.content,
    template_id: rendered.template_id,
    record,
  })
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StudentParams {
  pub student_id: Option<Uuid>,
}

/// `GET /reports[?student_id&term]`
pub async fn list_reports<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<TermReport>>, ApiError> {
  let reports = state
    .store
    .list_reports(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reports))
}

/// `GET /reports/{id}`
pub async fn get_report<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<TermReport>, ApiError> {
  Ok(Json(load_report(&*state.store, id).await?))
}

/// `GET /reports/{id}/print`
pub async fn print_report<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
  let report = load_report(&*state.store, id).await?;
  Ok(Html(printable(&format!("{} Report", report.term), &report.content)))
}

async fn load_report<S: SchoolStore>(store: &S, id: Uuid) -> Result<TermReport, ApiError> {
  store
    .get_report(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("report {id} not found")))
}

/// `GET /indemnity-forms[?student_id]`
pub async fn list_indemnity_forms<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<StudentParams>,
) -> Result<Json<Vec<IndemnityForm>>, ApiError> {
  let forms = state
    .store
    .list_indemnity_forms(params.student_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(forms))
}

/// `GET /indemnity-forms/{id}`
pub async fn get_indemnity_form<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<IndemnityForm>, ApiError> {
  Ok(Json(load_indemnity_form(&*state.store, id).await?))
}

/// `GET /indemnity-forms/{id}/print`
pub async fn print_indemnity_form<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
  let form = load_indemnity_form(&*state.store, id).await?;
  Ok(Html(printable("Indemnity Form", &form.content)))
}

async fn load_indemnity_form<S: SchoolStore>(
  store: &S,
  id: Uuid,
) -> Result<IndemnityForm, ApiError> {
  store
    .get_indemnity_form(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("indemnity form {id} not found")))
}

/// `GET /certificates[?student_id]`
pub async fn list_certificates<S: SchoolStore>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<StudentParams>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
  let certificates = state
    .store
    .list_certificates(params.student_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(certificates))
}

// ─── Print ────────────────────────────────────────────────────────────────────

/// A standalone page that prints `content` as preformatted text.
pub fn printable(title: &str, content: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
     <title>{}</title>\n<style>body {{ font-family: monospace; white-space: \
     pre-wrap; padding: 2rem; line-height: 1.6; }}</style>\n</head>\n\
     <body>{}</body>\n</html>\n",
    escape_html(title),
    escape_html(content),
  )
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn printable_escapes_markup() {
    let page = printable("R&D", "<script>alert('x')</script>\nline two");
    assert!(page.contains("<title>R&amp;D</title>"));
    assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;\nline two"));
    assert!(!page.contains("<script>"));
    assert!(page.contains("white-space: pre-wrap"));
  }

  #[test]
  fn date_format_is_applied_and_validated() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(format_date(d, "%Y-%m-%d").unwrap(), "2025-03-07");
    assert_eq!(format_date(d, "%d/%m/%Y").unwrap(), "07/03/2025");
    assert!(format_date(d, "%Q").is_err());
  }
}
