//! Classes and the subjects taught in them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patch::double_option;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
  pub class_id: Uuid,
  pub name:     String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
  pub name: String,
}

/// A subject belongs to one class and is optionally taught by one teacher,
/// who must be assigned to that class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub name:       String,
  pub class_id:   Uuid,
  /// A [`Teacher::teacher_id`](crate::teacher::Teacher::teacher_id).
  pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:       String,
  pub class_id:   Uuid,
  #[serde(default)]
  pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPatch {
  pub name:       Option<String>,
  pub class_id:   Option<Uuid>,
  #[serde(default, deserialize_with = "double_option")]
  pub teacher_id: Option<Option<Uuid>>,
}

impl SubjectPatch {
  pub fn apply(self, s: &mut Subject) {
    if let Some(v) = self.name {
      s.name = v;
    }
    if let Some(v) = self.class_id {
      s.class_id = v;
    }
    if let Some(v) = self.teacher_id {
      s.teacher_id = v;
    }
  }
}
