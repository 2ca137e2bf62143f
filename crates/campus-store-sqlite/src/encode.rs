//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings and enums use their lowercase names.
//! Contacts are stored as compact JSON.

use std::str::FromStr;

use campus_core::{
  attendance::Attendance,
  class::{SchoolClass, Subject},
  document::{Certificate, IndemnityForm, TermReport},
  grade::Grade,
  student::{Contact, Student},
  teacher::Teacher,
  template::Template,
  term::AcademicTerm,
  user::User,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

/// Fixed-width RFC 3339 in UTC, so stored timestamps compare as text.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Lowercase enum name, as written by `IntoStaticStr`.
pub fn encode_enum<T: Into<&'static str>>(v: T) -> &'static str { v.into() }

pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    Error::Core(campus_core::Error::UnknownDiscriminant {
      kind,
      value: s.to_owned(),
    })
  })
}

pub fn encode_contact(c: &Contact) -> Result<String> {
  Ok(serde_json::to_string(c)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` holds the column strings of one row exactly as read. The
// `*_COLUMNS` constants list the columns in the order `from_row` expects.

pub const USER_COLUMNS: &str =
  "user_id, name, role, email, status, created_at";

pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub role:       String,
  pub email:      String,
  pub status:     String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      name:       row.get(1)?,
      role:       row.get(2)?,
      email:      row.get(3)?,
      status:     row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      role:       decode_enum("role", &self.role)?,
      email:      self.email,
      status:     decode_enum("status", &self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const STUDENT_COLUMNS: &str = "student_id, student_number, first_name, \
  last_name, class_id, dob, gender, address, allergies, medical_notes, \
  parent_contact, guardian_contact, status";

pub struct RawStudent {
  pub student_id:       String,
  pub student_number:   String,
  pub first_name:       String,
  pub last_name:        String,
  pub class_id:         Option<String>,
  pub dob:              Option<String>,
  pub gender:           String,
  pub address:          String,
  pub allergies:        Option<String>,
  pub medical_notes:    Option<String>,
  pub parent_contact:   String,
  pub guardian_contact: Option<String>,
  pub status:           String,
}

impl RawStudent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:       row.get(0)?,
      student_number:   row.get(1)?,
      first_name:       row.get(2)?,
      last_name:        row.get(3)?,
      class_id:         row.get(4)?,
      dob:              row.get(5)?,
      gender:           row.get(6)?,
      address:          row.get(7)?,
      allergies:        row.get(8)?,
      medical_notes:    row.get(9)?,
      parent_contact:   row.get(10)?,
      guardian_contact: row.get(11)?,
      status:           row.get(12)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:       decode_uuid(&self.student_id)?,
      student_number:   self.student_number,
      first_name:       self.first_name,
      last_name:        self.last_name,
      class_id:         decode_opt_uuid(self.class_id)?,
      dob:              self.dob.as_deref().map(decode_date).transpose()?,
      gender:           self.gender,
      address:          self.address,
      allergies:        self.allergies,
      medical_notes:    self.medical_notes,
      parent_contact:   serde_json::from_str(&self.parent_contact)?,
      guardian_contact: self
        .guardian_contact
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      status:           decode_enum("status", &self.status)?,
    })
  }
}

/// Teacher profile joined with its user row. Class links are read
/// separately.
pub const TEACHER_SELECT: &str = "SELECT t.teacher_id, t.user_id, u.name, \
  u.email, t.phone, t.signature_image, u.status
  FROM teachers t JOIN users u ON u.user_id = t.user_id";

pub struct RawTeacher {
  pub teacher_id:       String,
  pub user_id:          String,
  pub name:             String,
  pub email:            String,
  pub phone:            Option<String>,
  pub signature_image:  Option<String>,
  pub status:           String,
  pub assigned_classes: Vec<String>,
}

impl RawTeacher {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      teacher_id:       row.get(0)?,
      user_id:          row.get(1)?,
      name:             row.get(2)?,
      email:            row.get(3)?,
      phone:            row.get(4)?,
      signature_image:  row.get(5)?,
      status:           row.get(6)?,
      assigned_classes: Vec::new(),
    })
  }

  pub fn into_teacher(self) -> Result<Teacher> {
    Ok(Teacher {
      teacher_id:       decode_uuid(&self.teacher_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      name:             self.name,
      email:            self.email,
      phone:            self.phone,
      signature_image:  self.signature_image,
      assigned_classes: self
        .assigned_classes
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      status:           decode_enum("status", &self.status)?,
    })
  }
}

pub struct RawClass {
  pub class_id: String,
  pub name:     String,
}

impl RawClass {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { class_id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_class(self) -> Result<SchoolClass> {
    Ok(SchoolClass { class_id: decode_uuid(&self.class_id)?, name: self.name })
  }
}

pub const SUBJECT_COLUMNS: &str = "subject_id, name, class_id, teacher_id";

pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub class_id:   String,
  pub teacher_id: Option<String>,
}

impl RawSubject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      class_id:   row.get(2)?,
      teacher_id: row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      class_id:   decode_uuid(&self.class_id)?,
      teacher_id: decode_opt_uuid(self.teacher_id)?,
    })
  }
}

pub const GRADE_COLUMNS: &str =
  "grade_id, student_id, subject_id, marks, term, academic_year, comment";

pub struct RawGrade {
  pub grade_id:      String,
  pub student_id:    String,
  pub subject_id:    String,
  pub marks:         i64,
  pub term:          String,
  pub academic_year: i32,
  pub comment:       Option<String>,
}

impl RawGrade {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      grade_id:      row.get(0)?,
      student_id:    row.get(1)?,
      subject_id:    row.get(2)?,
      marks:         row.get(3)?,
      term:          row.get(4)?,
      academic_year: row.get(5)?,
      comment:       row.get(6)?,
    })
  }

  pub fn into_grade(self) -> Result<Grade> {
    Ok(Grade {
      grade_id:      decode_uuid(&self.grade_id)?,
      student_id:    decode_uuid(&self.student_id)?,
      subject_id:    decode_uuid(&self.subject_id)?,
      marks:         campus_core::grade::check_marks(self.marks)?,
      term:          self.term,
      academic_year: self.academic_year,
      comment:       self.comment,
    })
  }
}

pub const ATTENDANCE_COLUMNS: &str =
  "attendance_id, student_id, class_id, date, status, comment";

pub struct RawAttendance {
  pub attendance_id: String,
  pub student_id:    String,
  pub class_id:      String,
  pub date:          String,
  pub status:        String,
  pub comment:       Option<String>,
}

impl RawAttendance {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: row.get(0)?,
      student_id:    row.get(1)?,
      class_id:      row.get(2)?,
      date:          row.get(3)?,
      status:        row.get(4)?,
      comment:       row.get(5)?,
    })
  }

  pub fn into_attendance(self) -> Result<Attendance> {
    Ok(Attendance {
      attendance_id: decode_uuid(&self.attendance_id)?,
      student_id:    decode_uuid(&self.student_id)?,
      class_id:      decode_uuid(&self.class_id)?,
      date:          decode_date(&self.date)?,
      status:        decode_enum("attendance status", &self.status)?,
      comment:       self.comment,
    })
  }
}

pub const TEMPLATE_COLUMNS: &str =
  "template_id, kind, name, content, created_by";

pub struct RawTemplate {
  pub template_id: String,
  pub kind:        String,
  pub name:        String,
  pub content:     String,
  pub created_by:  Option<String>,
}

impl RawTemplate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      template_id: row.get(0)?,
      kind:        row.get(1)?,
      name:        row.get(2)?,
      content:     row.get(3)?,
      created_by:  row.get(4)?,
    })
  }

  pub fn into_template(self) -> Result<Template> {
    Ok(Template {
      template_id: decode_uuid(&self.template_id)?,
      kind:        decode_enum("template kind", &self.kind)?,
      name:        self.name,
      content:     self.content,
      created_by:  decode_opt_uuid(self.created_by)?,
    })
  }
}

pub const REPORT_COLUMNS: &str = "report_id, student_id, class_id, term, \
  template_id, generated_at, generated_by, content, comments";

pub struct RawReport {
  pub report_id:    String,
  pub student_id:   String,
  pub class_id:     Option<String>,
  pub term:         String,
  pub template_id:  String,
  pub generated_at: String,
  pub generated_by: String,
  pub content:      String,
  pub comments:     String,
}

impl RawReport {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:    row.get(0)?,
      student_id:   row.get(1)?,
      class_id:     row.get(2)?,
      term:         row.get(3)?,
      template_id:  row.get(4)?,
      generated_at: row.get(5)?,
      generated_by: row.get(6)?,
      content:      row.get(7)?,
      comments:     row.get(8)?,
    })
  }

  pub fn into_report(self) -> Result<TermReport> {
    Ok(TermReport {
      report_id:    decode_uuid(&self.report_id)?,
      student_id:   decode_uuid(&self.student_id)?,
      class_id:     decode_opt_uuid(self.class_id)?,
      term:         self.term,
      template_id:  decode_uuid(&self.template_id)?,
      generated_at: decode_dt(&self.generated_at)?,
      generated_by: decode_uuid(&self.generated_by)?,
      content:      self.content,
      comments:     self.comments,
    })
  }
}

pub const INDEMNITY_COLUMNS: &str =
  "form_id, student_id, template_id, generated_at, content, signed_by";

pub struct RawIndemnityForm {
  pub form_id:      String,
  pub student_id:   String,
  pub template_id:  String,
  pub generated_at: String,
  pub content:      String,
  pub signed_by:    Option<String>,
}

impl RawIndemnityForm {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      form_id:      row.get(0)?,
      student_id:   row.get(1)?,
      template_id:  row.get(2)?,
      generated_at: row.get(3)?,
      content:      row.get(4)?,
      signed_by:    row.get(5)?,
    })
  }

  pub fn into_form(self) -> Result<IndemnityForm> {
    Ok(IndemnityForm {
      form_id:      decode_uuid(&self.form_id)?,
      student_id:   decode_uuid(&self.student_id)?,
      template_id:  decode_uuid(&self.template_id)?,
      generated_at: decode_dt(&self.generated_at)?,
      content:      self.content,
      signed_by:    self.signed_by,
    })
  }
}

pub const CERTIFICATE_COLUMNS: &str =
  "certificate_id, student_id, title, template_id, generated_at, content";

pub struct RawCertificate {
  pub certificate_id: String,
  pub student_id:     String,
  pub title:          String,
  pub template_id:    String,
  pub generated_at:   String,
  pub content:        String,
}

impl RawCertificate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      certificate_id: row.get(0)?,
      student_id:     row.get(1)?,
      title:          row.get(2)?,
      template_id:    row.get(3)?,
      generated_at:   row.get(4)?,
      content:        row.get(5)?,
    })
  }

  pub fn into_certificate(self) -> Result<Certificate> {
    Ok(Certificate {
      certificate_id: decode_uuid(&self.certificate_id)?,
      student_id:     decode_uuid(&self.student_id)?,
      title:          self.title,
      template_id:    decode_uuid(&self.template_id)?,
      generated_at:   decode_dt(&self.generated_at)?,
      content:        self.content,
    })
  }
}

pub const TERM_COLUMNS: &str =
  "term_id, year, term, name, start_date, end_date, is_active";

pub struct RawTerm {
  pub term_id:    String,
  pub year:       i32,
  pub term:       i64,
  pub name:       String,
  pub start_date: String,
  pub end_date:   String,
  pub is_active:  bool,
}

impl RawTerm {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      term_id:    row.get(0)?,
      year:       row.get(1)?,
      term:       row.get(2)?,
      name:       row.get(3)?,
      start_date: row.get(4)?,
      end_date:   row.get(5)?,
      is_active:  row.get(6)?,
    })
  }

  pub fn into_term(self) -> Result<AcademicTerm> {
    let term = u8::try_from(self.term).map_err(|_| {
      Error::Core(campus_core::Error::Invalid(format!(
        "stored term number {} is out of range",
        self.term
      )))
    })?;
    Ok(AcademicTerm {
      term_id: decode_uuid(&self.term_id)?,
      year: self.year,
      term,
      name: self.name,
      start_date: decode_date(&self.start_date)?,
      end_date: decode_date(&self.end_date)?,
      is_active: self.is_active,
    })
  }
}
