//! Store traits and supporting query types.
//!
//! Storage backends (e.g. `campus-store-sqlite`) implement every trait here.
//! Higher layers (`campus-api`, `campus-server`) depend on [`SchoolStore`],
//! never on a concrete backend.
//!
//! Contract shared by all stores: writes fail loudly (unknown id, uniqueness
//! violation, referential mismatch) with a backend error wrapping a
//! [`crate::Error`]; reads return `None` or an empty `Vec` when nothing
//! matches.
//!
//! All methods return `Send` futures so the traits can be used from a
//! multi-threaded runtime (tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  attendance::{Attendance, AttendanceEntry, AttendancePatch, RegisterWrite},
  class::{NewClass, NewSubject, SchoolClass, Subject, SubjectPatch},
  document::{
    Certificate,
    IndemnityForm,
    NewCertificate,
    NewIndemnityForm,
    NewTermReport,
    TermReport,
  },
  grade::{Grade, GradePatch, NewGrade},
  student::{NewStudent, Student, StudentPatch},
  teacher::{NewTeacher, Teacher, TeacherPatch},
  template::{NewTemplate, Template, TemplateKind, TemplatePatch},
  term::{AcademicTerm, AcademicTermPatch, NewAcademicTerm},
  user::{NewUser, RecordStatus, User, UserPatch},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`StudentStore::list_students`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
  pub class_id: Option<Uuid>,
  pub status:   Option<RecordStatus>,
}

/// Parameters for [`GradeStore::list_grades`]. All filters are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeQuery {
  pub student_id:    Option<Uuid>,
  pub subject_id:    Option<Uuid>,
  pub term:          Option<String>,
  pub academic_year: Option<i32>,
}

/// Parameters for [`AttendanceStore::list_attendance`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
  pub class_id:   Option<Uuid>,
  pub student_id: Option<Uuid>,
  pub date:       Option<NaiveDate>,
}

/// Parameters for [`DocumentStore::list_reports`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
  pub student_id: Option<Uuid>,
  pub term:       Option<String>,
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// A login session. Only a digest of the bearer token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub expires_at: DateTime<Utc>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// The error type shared by every store trait of one backend.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

pub trait UserStore: Backend {
  /// Persist a new account. The email is normalised; a taken email is a
  /// conflict.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up by (normalised) email.
  fn get_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All accounts, oldest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The stored PHC hash string, `None` for an unknown user.
  fn password_hash(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub trait SessionStore: Backend {
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// The user behind an unexpired session, or `None`.
  fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  /// Revoke one session. Revoking an unknown token is not an error.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Revoke every session of a user; returns how many were removed.
  fn delete_sessions_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

pub trait StudentStore: Backend {
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Insert a batch in one transaction; nothing is written if any row fails.
  fn add_students(
    &self,
    inputs: Vec<NewStudent>,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Ordered by last name, then first name.
  fn list_students(
    &self,
    query: StudentQuery,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn update_student(
    &self,
    id: Uuid,
    patch: StudentPatch,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Set the status to archived, keeping grades and history.
  fn archive_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn delete_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub trait TeacherStore: Backend {
  /// Create the login account, the profile and the class links atomically.
  fn add_teacher(
    &self,
    input: NewTeacher,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  /// [`add_teacher`](Self::add_teacher) for a batch, in one transaction.
  fn add_teachers(
    &self,
    inputs: Vec<NewTeacher>,
  ) -> impl Future<Output = Result<Vec<Teacher>, Self::Error>> + Send + '_;

  fn get_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + '_;

  fn get_teacher_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + '_;

  /// Ordered by name.
  fn list_teachers(
    &self,
  ) -> impl Future<Output = Result<Vec<Teacher>, Self::Error>> + Send + '_;

  /// Account fields go to the user row; `assigned_classes`, when given,
  /// replaces the class links wholesale. Dropping a class the teacher still
  /// teaches a subject in fails with
  /// [`Error::TeacherNotAssignedToClass`](crate::Error::TeacherNotAssignedToClass).
  fn update_teacher(
    &self,
    id: Uuid,
    patch: TeacherPatch,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  /// Archive the teacher's login account.
  fn archive_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  /// Remove the profile, its class links and the login account.
  fn delete_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub trait ClassStore: Backend {
  fn add_class(
    &self,
    input: NewClass,
  ) -> impl Future<Output = Result<SchoolClass, Self::Error>> + Send + '_;

  fn get_class(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SchoolClass>, Self::Error>> + Send + '_;

  /// Ordered by name.
  fn list_classes(
    &self,
  ) -> impl Future<Output = Result<Vec<SchoolClass>, Self::Error>> + Send + '_;

  fn rename_class(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<SchoolClass, Self::Error>> + Send + '_;

  fn delete_class(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Teachers assigned to a class.
  fn teachers_for_class(
    &self,
    class_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Teacher>, Self::Error>> + Send + '_;
}

pub trait SubjectStore: Backend {
  /// Rejects a teacher who is not assigned to the subject's class.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn list_subjects(
    &self,
    class_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Validated against the effective class and teacher after the patch.
  fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub trait GradeStore: Backend {
  /// Rejects out-of-range marks, a second grade for the same student,
  /// subject, term and year, and a student outside the subject's class.
  fn add_grade(
    &self,
    input: NewGrade,
  ) -> impl Future<Output = Result<Grade, Self::Error>> + Send + '_;

  fn get_grade(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Grade>, Self::Error>> + Send + '_;

  fn list_grades(
    &self,
    query: GradeQuery,
  ) -> impl Future<Output = Result<Vec<Grade>, Self::Error>> + Send + '_;

  fn update_grade(
    &self,
    id: Uuid,
    patch: GradePatch,
  ) -> impl Future<Output = Result<Grade, Self::Error>> + Send + '_;

  fn delete_grade(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub trait AttendanceStore: Backend {
  /// Newest date first.
  fn list_attendance(
    &self,
    query: AttendanceQuery,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + '_;

  /// Replace the whole register for `(class_id, date)`: existing records
  /// are deleted and `entries` inserted, in one transaction. With
  /// [`RegisterWrite::FirstOnly`] the existence check runs in that same
  /// transaction.
  fn replace_register(
    &self,
    class_id: Uuid,
    date: NaiveDate,
    entries: Vec<AttendanceEntry>,
    mode: RegisterWrite,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + '_;

  fn update_attendance(
    &self,
    id: Uuid,
    patch: AttendancePatch,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;
}

pub trait TemplateStore: Backend {
  fn add_template(
    &self,
    input: NewTemplate,
  ) -> impl Future<Output = Result<Template, Self::Error>> + Send + '_;

  fn get_template(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Template>, Self::Error>> + Send + '_;

  /// In insertion order, so the "first template of a kind" is stable.
  fn list_templates(
    &self,
    kind: Option<TemplateKind>,
  ) -> impl Future<Output = Result<Vec<Template>, Self::Error>> + Send + '_;

  fn update_template(
    &self,
    id: Uuid,
    patch: TemplatePatch,
  ) -> impl Future<Output = Result<Template, Self::Error>> + Send + '_;

  fn delete_template(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Generated documents. Append-only; listings are newest first.
pub trait DocumentStore: Backend {
  fn add_report(
    &self,
    input: NewTermReport,
  ) -> impl Future<Output = Result<TermReport, Self::Error>> + Send + '_;

  fn get_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TermReport>, Self::Error>> + Send + '_;

  fn list_reports(
    &self,
    query: ReportQuery,
  ) -> impl Future<Output = Result<Vec<TermReport>, Self::Error>> + Send + '_;

  fn add_indemnity_form(
    &self,
    input: NewIndemnityForm,
  ) -> impl Future<Output = Result<IndemnityForm, Self::Error>> + Send + '_;

  fn get_indemnity_form(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<IndemnityForm>, Self::Error>> + Send + '_;

  fn list_indemnity_forms(
    &self,
    student_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<IndemnityForm>, Self::Error>> + Send + '_;

  fn add_certificate(
    &self,
    input: NewCertificate,
  ) -> impl Future<Output = Result<Certificate, Self::Error>> + Send + '_;

  fn list_certificates(
    &self,
    student_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Certificate>, Self::Error>> + Send + '_;
}

pub trait TermStore: Backend {
  fn add_term(
    &self,
    input: NewAcademicTerm,
  ) -> impl Future<Output = Result<AcademicTerm, Self::Error>> + Send + '_;

  /// Year descending, then term number ascending.
  fn list_terms(
    &self,
    year: Option<i32>,
  ) -> impl Future<Output = Result<Vec<AcademicTerm>, Self::Error>> + Send + '_;

  fn active_term(
    &self,
  ) -> impl Future<Output = Result<Option<AcademicTerm>, Self::Error>> + Send + '_;

  fn update_term(
    &self,
    id: Uuid,
    patch: AcademicTermPatch,
  ) -> impl Future<Output = Result<AcademicTerm, Self::Error>> + Send + '_;

  /// Make `id` the only active term.
  fn set_active_term(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<AcademicTerm, Self::Error>> + Send + '_;
}

/// Everything the API needs from a backend.
pub trait SchoolStore:
  UserStore
  + SessionStore
  + StudentStore
  + TeacherStore
  + ClassStore
  + SubjectStore
  + GradeStore
  + AttendanceStore
  + TemplateStore
  + DocumentStore
  + TermStore
  + 'static
{
}

impl<T> SchoolStore for T where
  T: UserStore
    + SessionStore
    + StudentStore
    + TeacherStore
    + ClassStore
    + SubjectStore
    + GradeStore
    + AttendanceStore
    + TemplateStore
    + DocumentStore
    + TermStore
    + 'static
{
}
