//! `GET /dashboard`: the landing summary, shaped by role.
//!
//! Admins get school-wide counts, the most recent students with their
//! averages, and a per-class overview. Teachers get their own classes and
//! the students in them.

use std::collections::HashMap;

use axum::{Json, extract::State};
use campus_core::{
  class::SchoolClass,
  grade::Grade,
  metrics,
  store::{GradeQuery, SchoolStore, StudentQuery},
  student::Student,
  term::AcademicTerm,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

const RECENT_STUDENTS: usize = 8;

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
  Admin(AdminDashboard),
  Teacher(TeacherDashboard),
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
  pub active_term:     Option<AcademicTerm>,
  pub student_count:   usize,
  pub teacher_count:   usize,
  pub class_count:     usize,
  pub grade_count:     usize,
  pub recent_students: Vec<StudentRow>,
  pub classes:         Vec<ClassRow>,
}

#[derive(Debug, Serialize)]
pub struct TeacherDashboard {
  pub active_term: Option<AcademicTerm>,
  pub classes:     Vec<ClassRow>,
  pub students:    Vec<StudentRow>,
}

#[derive(Debug, Serialize)]
pub struct StudentRow {
  pub student: Student,
  pub average: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ClassRow {
  pub class:         SchoolClass,
  pub student_count: usize,
  /// Names of assigned teachers, in no particular order.
  pub teachers:      Vec<String>,
}

/// `GET /dashboard`
pub async fn handler<S: SchoolStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Dashboard>, ApiError> {
  let store = &*state.store;
  let active_term = store.active_term().await.map_err(ApiError::store)?;
  let classes = store.list_classes().await.map_err(ApiError::store)?;
  let students = store
    .list_students(StudentQuery::default())
    .await
    .map_err(ApiError::store)?;
  let grades = store
    .list_grades(GradeQuery::default())
    .await
    .map_err(ApiError::store)?;
  let teachers = store.list_teachers().await.map_err(ApiError::store)?;
  let profile = if current.is_admin() {
    None
  } else {
    Some(current.teacher_profile(store).await?)
  };

  let class_rows = |visible: &dyn Fn(&SchoolClass) -> bool| -> Vec<ClassRow> {
    classes
      .iter()
      .filter(|c| visible(c))
      .map(|c| ClassRow {
        class:         c.clone(),
        student_count: students
          .iter()
          .filter(|s| s.class_id == Some(c.class_id))
          .count(),
        teachers:      teachers
          .iter()
          .filter(|t| t.teaches(c.class_id))
          .map(|t| t.name.clone())
          .collect(),
      })
      .collect()
  };

  let by_student = group_by_student(&grades);
  let student_row = |s: &Student| StudentRow {
    student: s.clone(),
    average: by_student
      .get(&s.student_id)
      .and_then(|g| metrics::average_marks(g)),
  };

  let Some(teacher) = profile else {
    return Ok(Json(Dashboard::Admin(AdminDashboard {
      active_term,
      student_count: students.len(),
      teacher_count: teachers.len(),
      class_count: classes.len(),
      grade_count: grades.len(),
      recent_students: students.iter().take(RECENT_STUDENTS).map(&student_row).collect(),
      classes: class_rows(&|_| true),
    })));
  };

  let mine = |c: &SchoolClass| teacher.teaches(c.class_id);
  Ok(Json(Dashboard::Teacher(TeacherDashboard {
    active_term,
    classes: class_rows(&mine),
    students: students
      .iter()
      .filter(|s| s.class_id.is_some_and(|c| teacher.teaches(c)))
      .map(&student_row)
      .collect(),
  })))
}

fn group_by_student(grades: &[Grade]) -> HashMap<Uuid, Vec<Grade>> {
  let mut out: HashMap<Uuid, Vec<Grade>> = HashMap::new();
  for g in grades {
    out.entry(g.student_id).or_default().push(g.clone());
  }
  out
}
