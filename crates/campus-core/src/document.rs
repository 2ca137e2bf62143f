//! Generated documents. Once written, a rendering is never edited; a new
//! generation adds a new record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rendered term report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermReport {
  pub report_id:    Uuid,
  pub student_id:   Uuid,
  pub class_id:     Option<Uuid>,
  pub term:         String,
  pub template_id:  Uuid,
  /// Server-assigned.
  pub generated_at: DateTime<Utc>,
  /// The user who generated it.
  pub generated_by: Uuid,
  pub content:      String,
  /// The teacher comment that went into `{{TeacherComment}}`.
  pub comments:     String,
}

/// Input to [`DocumentStore::add_report`](crate::store::DocumentStore::add_report).
/// `generated_at` is set by the store.
#[derive(Debug, Clone)]
pub struct NewTermReport {
  pub student_id:   Uuid,
  pub class_id:     Option<Uuid>,
  pub term:         String,
  pub template_id:  Uuid,
  pub generated_by: Uuid,
  pub content:      String,
  pub comments:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndemnityForm {
  pub form_id:      Uuid,
  pub student_id:   Uuid,
  pub template_id:  Uuid,
  pub generated_at: DateTime<Utc>,
  pub content:      String,
  pub signed_by:    Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIndemnityForm {
  pub student_id:  Uuid,
  pub template_id: Uuid,
  pub content:     String,
  pub signed_by:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
  pub certificate_id: Uuid,
  pub student_id:     Uuid,
  /// What the certificate is awarded for, e.g. "General Excellence".
  pub title:          String,
  pub template_id:    Uuid,
  pub generated_at:   DateTime<Utc>,
  pub content:        String,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
  pub student_id:  Uuid,
  pub title:       String,
  pub template_id: Uuid,
  pub content:     String,
}
