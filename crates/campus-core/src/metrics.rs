//! Derived metrics over records already loaded into memory.
//!
//! Everything here is a pure function of its input slice and does not depend
//! on element order. Empty input yields `None` where a mean or rate would be
//! undefined; callers display that as [`NOT_AVAILABLE`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
  attendance::{Attendance, AttendanceStatus},
  grade::Grade,
};

/// Display value for an undefined metric.
pub const NOT_AVAILABLE: &str = "N/A";

// ─── Grades ──────────────────────────────────────────────────────────────────

/// Sum of marks.
pub fn total_marks(grades: &[Grade]) -> u32 {
  grades.iter().map(|g| u32::from(g.marks)).sum()
}

/// Arithmetic mean of marks rounded to one decimal place.
pub fn average_marks(grades: &[Grade]) -> Option<f64> {
  if grades.is_empty() {
    return None;
  }
  let mean = f64::from(total_marks(grades)) / grades.len() as f64;
  Some(round_one_decimal(mean))
}

fn round_one_decimal(x: f64) -> f64 { (x * 10.0).round() / 10.0 }

/// `78.0` renders as `"78.0"`; `None` as `"N/A"`.
pub fn format_average(avg: Option<f64>) -> String {
  avg.map_or_else(|| NOT_AVAILABLE.to_owned(), |a| format!("{a:.1}"))
}

/// Letter band for a mark: 80+ A, 60+ B, 40+ C, otherwise D.
pub fn letter_grade(marks: u8) -> char {
  match marks {
    80.. => 'A',
    60..=79 => 'B',
    40..=59 => 'C',
    _ => 'D',
  }
}

/// Grades grouped by term label, terms in lexical order.
pub fn grades_by_term(grades: &[Grade]) -> BTreeMap<String, Vec<Grade>> {
  let mut out: BTreeMap<String, Vec<Grade>> = BTreeMap::new();
  for g in grades {
    out.entry(g.term.clone()).or_default().push(g.clone());
  }
  out
}

/// Per-term figures for a student's detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
  pub term:    String,
  pub grades:  Vec<Grade>,
  pub total:   u32,
  pub average: Option<f64>,
}

pub fn term_summaries(grades: &[Grade]) -> Vec<TermSummary> {
  grades_by_term(grades)
    .into_iter()
    .map(|(term, grades)| TermSummary {
      total: total_marks(&grades),
      average: average_marks(&grades),
      term,
      grades,
    })
    .collect()
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
  pub total:   u32,
  pub present: u32,
  pub absent:  u32,
  pub late:    u32,
  pub excused: u32,
}

impl AttendanceSummary {
  pub fn from_records(records: &[Attendance]) -> Self {
    records.iter().fold(Self::default(), |mut acc, a| {
      acc.total += 1;
      match a.status {
        AttendanceStatus::Present => acc.present += 1,
        AttendanceStatus::Absent => acc.absent += 1,
        AttendanceStatus::Late => acc.late += 1,
        AttendanceStatus::Excused => acc.excused += 1,
      }
      acc
    })
  }

  /// (present + late) / total as a whole percentage. Late arrivals count as
  /// attended; excused absences do not.
  pub fn rate(&self) -> Option<u32> {
    if self.total == 0 {
      return None;
    }
    let attended = f64::from(self.present + self.late);
    Some((attended / f64::from(self.total) * 100.0).round() as u32)
  }

  /// `"85%"`, or `"N/A"` with no records.
  pub fn format_rate(&self) -> String {
    self
      .rate()
      .map_or_else(|| NOT_AVAILABLE.to_owned(), |r| format!("{r}%"))
  }
}
