//! Academic terms: the calendar records behind term labels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTerm {
  pub term_id:    Uuid,
  pub year:       i32,
  /// Ordinal within the year, starting at 1.
  pub term:       u8,
  /// Display label used on grades and reports, e.g. "Term 1".
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
  /// At most one term is active at a time.
  pub is_active:  bool,
}

impl AcademicTerm {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start_date <= date && date <= self.end_date
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAcademicTerm {
  pub year:       i32,
  pub term:       u8,
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
}

impl NewAcademicTerm {
  /// New terms start inactive; use
  /// [`TermStore::set_active_term`](crate::store::TermStore::set_active_term).
  pub fn into_term(self, term_id: Uuid) -> Result<AcademicTerm> {
    let term = AcademicTerm {
      term_id,
      year: self.year,
      term: self.term,
      name: self.name,
      start_date: self.start_date,
      end_date: self.end_date,
      is_active: false,
    };
    check_dates(&term)?;
    Ok(term)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademicTermPatch {
  pub year:       Option<i32>,
  pub term:       Option<u8>,
  pub name:       Option<String>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

impl AcademicTermPatch {
  pub fn apply(self, t: &mut AcademicTerm) -> Result<()> {
    let mut next = t.clone();
    if let Some(v) = self.year {
      next.year = v;
    }
    if let Some(v) = self.term {
      next.term = v;
    }
    if let Some(v) = self.name {
      next.name = v;
    }
    if let Some(v) = self.start_date {
      next.start_date = v;
    }
    if let Some(v) = self.end_date {
      next.end_date = v;
    }
    check_dates(&next)?;
    *t = next;
    Ok(())
  }
}

fn check_dates(t: &AcademicTerm) -> Result<()> {
  if t.end_date < t.start_date {
    return Err(Error::Invalid(format!(
      "term {:?} ends ({}) before it starts ({})",
      t.name, t.end_date, t.start_date
    )));
  }
  if t.term == 0 {
    return Err(Error::Invalid("term numbers start at 1".into()));
  }
  Ok(())
}
