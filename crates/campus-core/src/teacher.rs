//! Teachers: a user account, a teacher profile, and class assignments.
//!
//! The three parts live in separate tables (`users`, `teachers`,
//! `teacher_classes`); [`Teacher`] is the joined read model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{patch::double_option, user::RecordStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
  pub teacher_id:       Uuid,
  /// The backing account in `users`.
  pub user_id:          Uuid,
  /// From the user account.
  pub name:             String,
  /// From the user account.
  pub email:            String,
  pub phone:            Option<String>,
  pub signature_image:  Option<String>,
  /// Classes this teacher may teach, in assignment order.
  pub assigned_classes: Vec<Uuid>,
  /// From the user account; archiving a teacher archives the account.
  pub status:           RecordStatus,
}

impl Teacher {
  pub fn teaches(&self, class_id: Uuid) -> bool {
    self.assigned_classes.contains(&class_id)
  }
}

/// Input to [`TeacherStore::add_teacher`](crate::store::TeacherStore::add_teacher).
///
/// The account, profile and class links are written together; a backend
/// must not leave a partial teacher behind on failure.
#[derive(Debug, Clone)]
pub struct NewTeacher {
  pub name:             String,
  pub email:            String,
  pub password_hash:    String,
  pub status:           RecordStatus,
  pub phone:            Option<String>,
  pub signature_image:  Option<String>,
  pub assigned_classes: Vec<Uuid>,
}

/// Partial update spanning the profile, the account, and the class links.
///
/// `assigned_classes`, when present, replaces the full assignment set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherPatch {
  pub name:             Option<String>,
  pub email:            Option<String>,
  pub status:           Option<RecordStatus>,
  #[serde(default, deserialize_with = "double_option")]
  pub phone:            Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub signature_image:  Option<Option<String>>,
  pub assigned_classes: Option<Vec<Uuid>>,
}

impl TeacherPatch {
  pub fn apply(self, t: &mut Teacher) {
    if let Some(v) = self.name {
      t.name = v;
    }
    if let Some(v) = self.email {
      t.email = crate::user::normalize_email(&v);
    }
    if let Some(v) = self.status {
      t.status = v;
    }
    if let Some(v) = self.phone {
      t.phone = v;
    }
    if let Some(v) = self.signature_image {
      t.signature_image = v;
    }
    if let Some(mut v) = self.assigned_classes {
      dedup_in_order(&mut v);
      t.assigned_classes = v;
    }
  }
}

/// Drop repeated class ids, keeping the first occurrence.
pub fn dedup_in_order(ids: &mut Vec<Uuid>) {
  let mut seen = std::collections::HashSet::new();
  ids.retain(|id| seen.insert(*id));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assigned_classes_are_replaced_and_deduplicated() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut t = Teacher {
      teacher_id:       Uuid::new_v4(),
      user_id:          Uuid::new_v4(),
      name:             "Ms Frizzle".into(),
      email:            "frizzle@school.test".into(),
      phone:            Some("555".into()),
      signature_image:  None,
      assigned_classes: vec![a],
      status:           RecordStatus::Active,
    };
    TeacherPatch {
      assigned_classes: Some(vec![b, a, b]),
      phone: Some(None),
      ..Default::default()
    }
    .apply(&mut t);
    assert_eq!(t.assigned_classes, vec![b, a]);
    assert!(t.teaches(a));
    assert_eq!(t.phone, None);
  }
}
