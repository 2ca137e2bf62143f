//! Error types for `campus-core`.
//!
//! These are the domain rejections shared by every store backend. Backends
//! wrap them in their own error type; the API layer looks for them in the
//! error chain to pick a status code.

use thiserror::Error;
use uuid::Uuid;

use crate::import::RowError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error(
    "a grade for this student, subject, and term already exists ({term} \
     {academic_year})"
  )]
  DuplicateGrade { term: String, academic_year: i32 },

  #[error("student {student_id} is not enrolled in the class for this subject")]
  StudentNotInSubjectClass { student_id: Uuid, subject_id: Uuid },

  #[error(
    "teacher {teacher_id} is not assigned to teach class {class_id}; assign \
     them to the class first"
  )]
  TeacherNotAssignedToClass { teacher_id: Uuid, class_id: Uuid },

  #[error("marks must be between 0 and 100, got {0}")]
  MarksOutOfRange(i64),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("import rejected: {}", join_rows(.0))]
  InvalidRows(Vec<RowError>),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn not_found(entity: &'static str, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }
}

fn join_rows(rows: &[RowError]) -> String {
  rows.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
