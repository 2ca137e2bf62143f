//! Attendance register records.
//!
//! A register is the set of records for one class on one date. It is always
//! saved whole: the previous register for that key is deleted and the new one
//! inserted, never merged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, patch::double_option};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  #[default]
  Present,
  Absent,
  Late,
  Excused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
  pub attendance_id: Uuid,
  pub student_id:    Uuid,
  pub class_id:      Uuid,
  pub date:          NaiveDate,
  pub status:        AttendanceStatus,
  pub comment:       Option<String>,
}

/// One line of a register submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceEntry {
  pub student_id: Uuid,
  #[serde(default)]
  pub status:     AttendanceStatus,
  #[serde(default)]
  pub comment:    Option<String>,
}

/// How a register save treats an existing register for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
  /// Delete whatever is there and insert the new register.
  Replace,
  /// Fail with [`Error::Conflict`] if any record already exists.
  FirstOnly,
}

/// Turn a register submission into stored records, rejecting a student that
/// appears twice.
pub fn build_register(
  class_id: Uuid,
  date: NaiveDate,
  entries: Vec<AttendanceEntry>,
) -> Result<Vec<Attendance>> {
  let mut seen = std::collections::HashSet::new();
  entries
    .into_iter()
    .map(|e| {
      if !seen.insert(e.student_id) {
        return Err(Error::Invalid(format!(
          "student {} appears more than once in the register",
          e.student_id
        )));
      }
      Ok(Attendance {
        attendance_id: Uuid::new_v4(),
        student_id: e.student_id,
        class_id,
        date,
        status: e.status,
        comment: crate::student::blank_to_none(e.comment),
      })
    })
    .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendancePatch {
  pub status:  Option<AttendanceStatus>,
  #[serde(default, deserialize_with = "double_option")]
  pub comment: Option<Option<String>>,
}

impl AttendancePatch {
  pub fn apply(self, a: &mut Attendance) {
    if let Some(s) = self.status {
      a.status = s;
    }
    if let Some(c) = self.comment {
      a.comment = crate::student::blank_to_none(c);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 10).unwrap() }

  #[test]
  fn status_defaults_to_present() {
    let e: AttendanceEntry =
      serde_json::from_str(&format!(r#"{{"student_id":"{}"}}"#, Uuid::new_v4()))
        .unwrap();
    assert_eq!(e.status, AttendanceStatus::Present);
  }

  #[test]
  fn register_rejects_repeated_student() {
    let s = Uuid::new_v4();
    let entry = |status| AttendanceEntry { student_id: s, status, comment: None };
    let err = build_register(
      Uuid::new_v4(),
      date(),
      vec![entry(AttendanceStatus::Present), entry(AttendanceStatus::Absent)],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Invalid(_)));
  }

  #[test]
  fn register_stamps_class_and_date() {
    let class = Uuid::new_v4();
    let rows = build_register(
      class,
      date(),
      vec![AttendanceEntry {
        student_id: Uuid::new_v4(),
        status:     AttendanceStatus::Late,
        comment:    Some("".into()),
      }],
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].class_id, class);
    assert_eq!(rows[0].date, date());
    assert_eq!(rows[0].comment, None);
  }
}
