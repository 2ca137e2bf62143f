use campus_core::{
  grade::{Grade, GradePatch, NewGrade},
  store::{GradeQuery, GradeStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{GRADE_COLUMNS, RawGrade, encode_uuid},
  error::reject,
};

/// Reject a grade whose student is not in the subject's class, or that
/// repeats an existing (student, subject, term, year).
fn check_new_grade(
  conn: &rusqlite::Connection,
  grade: &Grade,
) -> tokio_rusqlite::Result<()> {
  let student_id = encode_uuid(grade.student_id);
  let subject_id = encode_uuid(grade.subject_id);

  let student_class: Option<Option<String>> = conn
    .query_row(
      "SELECT class_id FROM students WHERE student_id = ?1",
      [&student_id],
      |r| r.get(0),
    )
    .optional()?;
  let Some(student_class) = student_class else {
    return Err(reject(campus_core::Error::not_found("student", grade.student_id)));
  };

  let subject_class: Option<String> = conn
    .query_row(
      "SELECT class_id FROM subjects WHERE subject_id = ?1",
      [&subject_id],
      |r| r.get(0),
    )
    .optional()?;
  let Some(subject_class) = subject_class else {
    return Err(reject(campus_core::Error::not_found("subject", grade.subject_id)));
  };

  if student_class.as_deref() != Some(subject_class.as_str()) {
    return Err(reject(campus_core::Error::StudentNotInSubjectClass {
      student_id: grade.student_id,
      subject_id: grade.subject_id,
    }));
  }

  let duplicate = conn
    .query_row(
      "SELECT 1 FROM grades
       WHERE student_id = ?1 AND subject_id = ?2 AND term = ?3 AND academic_year = ?4",
      rusqlite::params![student_id, subject_id, grade.term, grade.academic_year],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if duplicate {
    return Err(reject(campus_core::Error::DuplicateGrade {
      term:          grade.term.clone(),
      academic_year: grade.academic_year,
    }));
  }
  Ok(())
}

impl GradeStore for SqliteStore {
  async fn add_grade(&self, input: NewGrade) -> Result<Grade> {
    let grade = input.into_grade(Uuid::new_v4())?;
    let row = grade.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        check_new_grade(&tx, &row)?;
        tx.execute(
          &format!(
            "INSERT INTO grades ({GRADE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            encode_uuid(row.grade_id),
            encode_uuid(row.student_id),
            encode_uuid(row.subject_id),
            i64::from(row.marks),
            row.term,
            row.academic_year,
            row.comment,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(grade)
  }

  async fn get_grade(&self, id: Uuid) -> Result<Option<Grade>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawGrade> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GRADE_COLUMNS} FROM grades WHERE grade_id = ?1"),
              rusqlite::params![id_str],
              RawGrade::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawGrade::into_grade).transpose()
  }

  async fn list_grades(&self, query: GradeQuery) -> Result<Vec<Grade>> {
    let student = query.student_id.map(encode_uuid);
    let subject = query.subject_id.map(encode_uuid);
    let term = query.term.map(|t| t.trim().to_owned());
    let year = query.academic_year;

    let raws: Vec<RawGrade> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GRADE_COLUMNS} FROM grades
           WHERE (?1 IS NULL OR student_id = ?1)
             AND (?2 IS NULL OR subject_id = ?2)
             AND (?3 IS NULL OR term = ?3)
             AND (?4 IS NULL OR academic_year = ?4)
           ORDER BY academic_year DESC, term, rowid"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![student, subject, term, year],
            RawGrade::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawGrade::into_grade).collect()
  }

  async fn update_grade(&self, id: Uuid, patch: GradePatch) -> Result<Grade> {
    let mut grade = found(self.get_grade(id).await?, "grade", id)?;
    patch.apply(&mut grade)?;

    let row = grade.clone();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE grades SET marks = ?2, comment = ?3 WHERE grade_id = ?1",
          rusqlite::params![encode_uuid(row.grade_id), i64::from(row.marks), row.comment],
        )?;
        ensure_changed(changed, "grade", row.grade_id)
      })
      .await?;
    Ok(grade)
  }

  async fn delete_grade(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM grades WHERE grade_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "grade", id)
      })
      .await?;
    Ok(())
  }
}
