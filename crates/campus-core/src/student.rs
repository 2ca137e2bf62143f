//! Student records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{patch::double_option, user::RecordStatus};

/// A parent or guardian contact, embedded in the student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub full_name:    String,
  /// e.g. "Mother", "Uncle".
  pub relationship: String,
  pub phone:        String,
  #[serde(default)]
  pub email:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id:       Uuid,
  /// School-issued number, unique across all students.
  pub student_number:   String,
  pub first_name:       String,
  pub last_name:        String,
  /// `None` while the student is not placed in a class.
  pub class_id:         Option<Uuid>,
  pub dob:              Option<NaiveDate>,
  pub gender:           String,
  pub address:          String,
  pub allergies:        Option<String>,
  pub medical_notes:    Option<String>,
  pub parent_contact:   Contact,
  pub guardian_contact: Option<Contact>,
  pub status:           RecordStatus,
}

impl Student {
  /// First and last name joined by a space, skipping empty parts.
  pub fn full_name(&self) -> String {
    [self.first_name.as_str(), self.last_name.as_str()]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Input to [`StudentStore::add_student`](crate::store::StudentStore::add_student).
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub student_number:   String,
  pub first_name:       String,
  pub last_name:        String,
  #[serde(default)]
  pub class_id:         Option<Uuid>,
  #[serde(default)]
  pub dob:              Option<NaiveDate>,
  #[serde(default)]
  pub gender:           String,
  #[serde(default)]
  pub address:          String,
  #[serde(default)]
  pub allergies:        Option<String>,
  #[serde(default)]
  pub medical_notes:    Option<String>,
  pub parent_contact:   Contact,
  #[serde(default)]
  pub guardian_contact: Option<Contact>,
  #[serde(default)]
  pub status:           RecordStatus,
}

impl NewStudent {
  pub fn into_student(self, student_id: Uuid) -> Student {
    Student {
      student_id,
      student_number: self.student_number.trim().to_owned(),
      first_name: self.first_name,
      last_name: self.last_name,
      class_id: self.class_id,
      dob: self.dob,
      gender: self.gender,
      address: self.address,
      allergies: blank_to_none(self.allergies),
      medical_notes: blank_to_none(self.medical_notes),
      parent_contact: self.parent_contact,
      guardian_contact: self.guardian_contact,
      status: self.status,
    }
  }
}

/// Partial update for a student. Double options clear nullable fields when
/// sent as an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
  pub student_number:   Option<String>,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub class_id:         Option<Option<Uuid>>,
  #[serde(default, deserialize_with = "double_option")]
  pub dob:              Option<Option<NaiveDate>>,
  pub gender:           Option<String>,
  pub address:          Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub allergies:        Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub medical_notes:    Option<Option<String>>,
  pub parent_contact:   Option<Contact>,
  #[serde(default, deserialize_with = "double_option")]
  pub guardian_contact: Option<Option<Contact>>,
  pub status:           Option<RecordStatus>,
}

impl StudentPatch {
  pub fn apply(self, s: &mut Student) {
    if let Some(v) = self.student_number {
      s.student_number = v.trim().to_owned();
    }
    if let Some(v) = self.first_name {
      s.first_name = v;
    }
    if let Some(v) = self.last_name {
      s.last_name = v;
    }
    if let Some(v) = self.class_id {
      s.class_id = v;
    }
    if let Some(v) = self.dob {
      s.dob = v;
    }
    if let Some(v) = self.gender {
      s.gender = v;
    }
    if let Some(v) = self.address {
      s.address = v;
    }
    if let Some(v) = self.allergies {
      s.allergies = blank_to_none(v);
    }
    if let Some(v) = self.medical_notes {
      s.medical_notes = blank_to_none(v);
    }
    if let Some(v) = self.parent_contact {
      s.parent_contact = v;
    }
    if let Some(v) = self.guardian_contact {
      s.guardian_contact = v;
    }
    if let Some(v) = self.status {
      s.status = v;
    }
  }
}

/// Empty free-text is stored as absent so document fallbacks apply.
pub(crate) fn blank_to_none(v: Option<String>) -> Option<String> {
  v.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parent() -> Contact {
    Contact {
      full_name:    "Grace Hopper".into(),
      relationship: "Mother".into(),
      phone:        "555-0100".into(),
      email:        None,
    }
  }

  fn student() -> Student {
    NewStudent {
      student_number:   " S-001 ".into(),
      first_name:       "Alan".into(),
      last_name:        "Hopper".into(),
      class_id:         None,
      dob:              None,
      gender:           "M".into(),
      address:          "1 Loop Rd".into(),
      allergies:        Some("  ".into()),
      medical_notes:    Some("Asthma".into()),
      parent_contact:   parent(),
      guardian_contact: None,
      status:           RecordStatus::Active,
    }
    .into_student(Uuid::new_v4())
  }

  #[test]
  fn new_student_trims_number_and_drops_blank_notes() {
    let s = student();
    assert_eq!(s.student_number, "S-001");
    assert_eq!(s.allergies, None);
    assert_eq!(s.medical_notes.as_deref(), Some("Asthma"));
  }

  #[test]
  fn full_name_skips_empty_parts() {
    let mut s = student();
    assert_eq!(s.full_name(), "Alan Hopper");
    s.last_name.clear();
    assert_eq!(s.full_name(), "Alan");
  }

  #[test]
  fn explicit_null_clears_but_absent_keeps() {
    let mut s = student();
    let class = Uuid::new_v4();
    s.class_id = Some(class);

    let keep: StudentPatch = serde_json::from_str(r#"{"gender":"F"}"#).unwrap();
    keep.apply(&mut s);
    assert_eq!(s.class_id, Some(class));
    assert_eq!(s.gender, "F");

    let clear: StudentPatch =
      serde_json::from_str(r#"{"class_id":null,"medical_notes":null}"#).unwrap();
    clear.apply(&mut s);
    assert_eq!(s.class_id, None);
    assert_eq!(s.medical_notes, None);
  }
}
