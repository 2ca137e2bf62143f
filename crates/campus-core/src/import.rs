//! Bulk onboarding rows, validated at the boundary.
//!
//! Rows arrive as loose JSON objects (one per spreadsheet line). Each is
//! decoded into a typed row with unknown columns rejected, then checked
//! against the rest of the batch and the known classes. A batch is accepted
//! only if every row is valid; otherwise all row errors are returned together
//! and nothing should be persisted.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
  Error,
  class::SchoolClass,
  student::{Contact, NewStudent},
  user::{RecordStatus, normalize_email},
};

/// Column template for student onboarding, in sheet order.
pub const STUDENT_COLUMNS: &[&str] = &[
  "student_number",
  "first_name",
  "last_name",
  "class_name",
  "dob",
  "gender",
  "address",
  "parent_name",
  "parent_relationship",
  "parent_phone",
  "parent_email",
];

/// Column template for teacher onboarding, in sheet order.
pub const TEACHER_COLUMNS: &[&str] = &["name", "email", "phone", "class_names"];

/// One rejected row. `row` is 1-based, counting data rows only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
  pub row:    usize,
  pub reason: String,
}

impl std::fmt::Display for RowError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "row {}: {}", self.row, self.reason)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentImportRow {
  pub student_number:      String,
  pub first_name:          String,
  pub last_name:           String,
  #[serde(default)]
  pub class_name:          Option<String>,
  #[serde(default)]
  pub dob:                 Option<NaiveDate>,
  #[serde(default)]
  pub gender:              String,
  #[serde(default)]
  pub address:             String,
  pub parent_name:         String,
  #[serde(default)]
  pub parent_relationship: String,
  pub parent_phone:        String,
  #[serde(default)]
  pub parent_email:        Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeacherImportRow {
  pub name:        String,
  pub email:       String,
  #[serde(default)]
  pub phone:       Option<String>,
  /// `;`-separated class names.
  #[serde(default)]
  pub class_names: Option<String>,
}

/// A validated teacher row; the caller supplies the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherImport {
  pub name:             String,
  pub email:            String,
  pub phone:            Option<String>,
  pub assigned_classes: Vec<Uuid>,
}

type Batch<T> = std::result::Result<Vec<T>, Vec<RowError>>;

/// Decode and validate student rows against the known classes.
pub fn validate_students(
  rows: Vec<serde_json::Value>,
  classes: &[SchoolClass],
) -> Batch<NewStudent> {
  let mut numbers = HashSet::new();
  validate_batch(rows, |row: StudentImportRow| {
    require("student_number", &row.student_number)?;
    require("first_name", &row.first_name)?;
    require("last_name", &row.last_name)?;
    require("parent_name", &row.parent_name)?;
    require("parent_phone", &row.parent_phone)?;
    let number = row.student_number.trim().to_owned();
    if !numbers.insert(number.clone()) {
      return Err(format!("student_number {number:?} repeats an earlier row"));
    }
    let class_id = match non_blank(row.class_name) {
      Some(name) => Some(find_class(classes, &name)?),
      None => None,
    };
    Ok(NewStudent {
      student_number: number,
      first_name: row.first_name.trim().to_owned(),
      last_name: row.last_name.trim().to_owned(),
      class_id,
      dob: row.dob,
      gender: row.gender,
      address: row.address,
      allergies: None,
      medical_notes: None,
      parent_contact: Contact {
        full_name:    row.parent_name.trim().to_owned(),
        relationship: row.parent_relationship,
        phone:        row.parent_phone.trim().to_owned(),
        email:        non_blank(row.parent_email),
      },
      guardian_contact: None,
      status: RecordStatus::Active,
    })
  })
}

/// Decode and validate teacher rows against the known classes.
pub fn validate_teachers(
  rows: Vec<serde_json::Value>,
  classes: &[SchoolClass],
) -> Batch<TeacherImport> {
  let mut emails = HashSet::new();
  validate_batch(rows, |row: TeacherImportRow| {
    require("name", &row.name)?;
    let email = normalize_email(&row.email);
    if !looks_like_email(&email) {
      return Err(format!("{:?} is not an email address", row.email));
    }
    if !emails.insert(email.clone()) {
      return Err(format!("email {email:?} repeats an earlier row"));
    }
    let mut assigned_classes = Vec::new();
    for name in row.class_names.as_deref().unwrap_or("").split(';') {
      let name = name.trim();
      if !name.is_empty() {
        assigned_classes.push(find_class(classes, name)?);
      }
    }
    crate::teacher::dedup_in_order(&mut assigned_classes);
    Ok(TeacherImport {
      name: row.name.trim().to_owned(),
      email,
      phone: non_blank(row.phone),
      assigned_classes,
    })
  })
}

/// Wrap a batch failure as a core error.
pub fn into_error(errors: Vec<RowError>) -> Error { Error::InvalidRows(errors) }

fn validate_batch<R, T, F>(rows: Vec<serde_json::Value>, mut check: F) -> Batch<T>
where
  R: DeserializeOwned,
  F: FnMut(R) -> std::result::Result<T, String>,
{
  if rows.is_empty() {
    return Err(vec![RowError { row: 0, reason: "no rows to import".into() }]);
  }
  let mut ok = Vec::with_capacity(rows.len());
  let mut errors = Vec::new();
  for (i, raw) in rows.into_iter().enumerate() {
    let row = i + 1;
    let result = serde_json::from_value::<R>(raw)
      .map_err(|e| e.to_string())
      .and_then(&mut check);
    match result {
      Ok(v) => ok.push(v),
      Err(reason) => errors.push(RowError { row, reason }),
    }
  }
  if errors.is_empty() { Ok(ok) } else { Err(errors) }
}

fn require(column: &str, value: &str) -> std::result::Result<(), String> {
  if value.trim().is_empty() {
    Err(format!("{column} is required"))
  } else {
    Ok(())
  }
}

fn non_blank(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn find_class(classes: &[SchoolClass], name: &str) -> std::result::Result<Uuid, String> {
  classes
    .iter()
    .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    .map(|c| c.class_id)
    .ok_or_else(|| format!("unknown class {name:?}"))
}

fn looks_like_email(s: &str) -> bool {
  matches!(s.split_once('@'), Some((local, domain)) if !local.is_empty() && domain.contains('.'))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn classes() -> Vec<SchoolClass> {
    vec![
      SchoolClass { class_id: Uuid::new_v4(), name: "Grade 5A".into() },
      SchoolClass { class_id: Uuid::new_v4(), name: "Grade 6B".into() },
    ]
  }

  fn student_row(number: &str) -> serde_json::Value {
    json!({
      "student_number": number,
      "first_name": "Kofi",
      "last_name": "Annan",
      "class_name": "grade 5a",
      "dob": "2014-02-01",
      "parent_name": "Efua Annan",
      "parent_phone": "555-0001"
    })
  }

  #[test]
  fn valid_students_resolve_class_by_name() {
    let cs = classes();
    let out = validate_students(vec![student_row("S1"), student_row("S2")], &cs).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].class_id, Some(cs[0].class_id));
    assert_eq!(out[0].dob, NaiveDate::from_ymd_opt(2014, 2, 1));
  }

  #[test]
  fn one_bad_row_rejects_the_batch_with_every_reason() {
    let mut unknown_column = student_row("S3");
    unknown_column["favourite_colour"] = json!("blue");
    let mut bad_class = student_row("S4");
    bad_class["class_name"] = json!("Grade 9Z");

    let errors = validate_students(
      vec![student_row("S1"), student_row("S1"), unknown_column, bad_class],
      &classes(),
    )
    .unwrap_err();

    let rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![2, 3, 4]);
    assert!(errors[0].reason.contains("repeats"));
    assert!(errors[1].reason.contains("favourite_colour"));
    assert!(errors[2].reason.contains("Grade 9Z"));
  }

  #[test]
  fn missing_required_column_is_reported() {
    let errors = validate_students(
      vec![json!({"student_number": "S1", "first_name": "A", "last_name": "B"})],
      &classes(),
    )
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].reason.contains("parent_name"), "{}", errors[0]);
  }

  #[test]
  fn teachers_split_class_names_and_normalize_email() {
    let cs = classes();
    let out = validate_teachers(
      vec![json!({
        "name": "Ms Honey",
        "email": " Honey@School.test ",
        "class_names": "Grade 5A; Grade 6B;;grade 5a"
      })],
      &cs,
    )
    .unwrap();
    assert_eq!(out[0].email, "honey@school.test");
    assert_eq!(out[0].assigned_classes, vec![cs[0].class_id, cs[1].class_id]);
    assert_eq!(out[0].phone, None);
  }

  #[test]
  fn teacher_rows_need_real_email() {
    let errors =
      validate_teachers(vec![json!({"name": "X", "email": "nobody"})], &classes())
        .unwrap_err();
    assert!(errors[0].reason.contains("not an email"));
  }

  #[test]
  fn empty_batch_is_rejected() {
    assert!(validate_teachers(vec![], &classes()).is_err());
  }
}
