//! Grades: one mark per student, subject, term and academic year.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, patch::double_option};

/// Highest mark a grade may carry.
pub const MAX_MARKS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
  pub grade_id:      Uuid,
  pub student_id:    Uuid,
  pub subject_id:    Uuid,
  /// 0–100 inclusive.
  pub marks:         u8,
  /// Term label, e.g. "Term 1".
  pub term:          String,
  pub academic_year: i32,
  pub comment:       Option<String>,
}

/// Input to [`GradeStore::add_grade`](crate::store::GradeStore::add_grade).
///
/// `marks` arrives as a wide integer so out-of-range input can be reported
/// rather than rejected by the decoder.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGrade {
  pub student_id:    Uuid,
  pub subject_id:    Uuid,
  pub marks:         i64,
  pub term:          String,
  pub academic_year: i32,
  #[serde(default)]
  pub comment:       Option<String>,
}

impl NewGrade {
  /// Check the marks range and build the stored record.
  pub fn into_grade(self, grade_id: Uuid) -> Result<Grade> {
    Ok(Grade {
      grade_id,
      student_id: self.student_id,
      subject_id: self.subject_id,
      marks: check_marks(self.marks)?,
      term: self.term.trim().to_owned(),
      academic_year: self.academic_year,
      comment: crate::student::blank_to_none(self.comment),
    })
  }
}

/// Grades are keyed by student, subject, term and year; only the mark and
/// comment can change afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradePatch {
  pub marks:   Option<i64>,
  #[serde(default, deserialize_with = "double_option")]
  pub comment: Option<Option<String>>,
}

impl GradePatch {
  pub fn apply(self, g: &mut Grade) -> Result<()> {
    if let Some(m) = self.marks {
      g.marks = check_marks(m)?;
    }
    if let Some(c) = self.comment {
      g.comment = crate::student::blank_to_none(c);
    }
    Ok(())
  }
}

pub fn check_marks(marks: i64) -> Result<u8> {
  if (0..=MAX_MARKS).contains(&marks) {
    Ok(marks as u8)
  } else {
    Err(Error::MarksOutOfRange(marks))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_grade(marks: i64) -> NewGrade {
    NewGrade {
      student_id: Uuid::new_v4(),
      subject_id: Uuid::new_v4(),
      marks,
      term: " Term 1 ".into(),
      academic_year: 2025,
      comment: None,
    }
  }

  #[test]
  fn marks_bounds_are_inclusive() {
    assert_eq!(new_grade(0).into_grade(Uuid::new_v4()).unwrap().marks, 0);
    assert_eq!(new_grade(100).into_grade(Uuid::new_v4()).unwrap().marks, 100);
  }

  #[test]
  fn out_of_range_marks_are_rejected() {
    assert!(matches!(
      new_grade(101).into_grade(Uuid::new_v4()),
      Err(Error::MarksOutOfRange(101))
    ));
    assert!(matches!(
      new_grade(-1).into_grade(Uuid::new_v4()),
      Err(Error::MarksOutOfRange(-1))
    ));
  }

  #[test]
  fn term_label_is_trimmed() {
    let g = new_grade(50).into_grade(Uuid::new_v4()).unwrap();
    assert_eq!(g.term, "Term 1");
  }

  #[test]
  fn patch_rejects_bad_marks_without_touching_comment() {
    let mut g = new_grade(50).into_grade(Uuid::new_v4()).unwrap();
    let patch = GradePatch { marks: Some(250), comment: Some(Some("x".into())) };
    assert!(patch.apply(&mut g).is_err());
    assert_eq!(g.marks, 50);
    assert_eq!(g.comment, None);
  }
}
