use campus_core::{
  class::{NewClass, NewSubject, SchoolClass, Subject, SubjectPatch},
  store::{ClassStore, SubjectStore},
  teacher::Teacher,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found, teachers::load_teachers};
use crate::{
  Error,
  Result,
  encode::{RawClass, RawSubject, RawTeacher, SUBJECT_COLUMNS, encode_uuid},
  error::reject,
};

fn exists(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

/// A subject's class must exist, and its teacher (if any) must be assigned
/// to that class.
fn check_subject(
  conn: &rusqlite::Connection,
  subject: &Subject,
) -> tokio_rusqlite::Result<()> {
  let class_id = encode_uuid(subject.class_id);
  if !exists(conn, "SELECT 1 FROM classes WHERE class_id = ?1", [&class_id])? {
    return Err(reject(campus_core::Error::not_found("class", subject.class_id)));
  }
  let Some(teacher_id) = subject.teacher_id else {
    return Ok(());
  };
  let teacher_str = encode_uuid(teacher_id);
  if !exists(conn, "SELECT 1 FROM teachers WHERE teacher_id = ?1", [&teacher_str])? {
    return Err(reject(campus_core::Error::not_found("teacher", teacher_id)));
  }
  if !exists(
    conn,
    "SELECT 1 FROM teacher_classes WHERE teacher_id = ?1 AND class_id = ?2",
    [&teacher_str, &class_id],
  )? {
    return Err(reject(campus_core::Error::TeacherNotAssignedToClass {
      teacher_id,
      class_id: subject.class_id,
    }));
  }
  Ok(())
}

// ─── Classes ─────────────────────────────────────────────────────────────────

impl ClassStore for SqliteStore {
  async fn add_class(&self, input: NewClass) -> Result<SchoolClass> {
    let name = input.name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::Core(campus_core::Error::Invalid(
        "class name must not be empty".into(),
      )));
    }
    let class = SchoolClass { class_id: Uuid::new_v4(), name };
    let row = class.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO classes (class_id, name) VALUES (?1, ?2)",
          rusqlite::params![encode_uuid(row.class_id), row.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(class)
  }

  async fn get_class(&self, id: Uuid) -> Result<Option<SchoolClass>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawClass> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT class_id, name FROM classes WHERE class_id = ?1",
              rusqlite::params![id_str],
              RawClass::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawClass::into_class).transpose()
  }

  async fn list_classes(&self) -> Result<Vec<SchoolClass>> {
    let raws: Vec<RawClass> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT class_id, name FROM classes ORDER BY name")?;
        let rows = stmt
          .query_map([], RawClass::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawClass::into_class).collect()
  }

  async fn rename_class(&self, id: Uuid, name: String) -> Result<SchoolClass> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::Core(campus_core::Error::Invalid(
        "class name must not be empty".into(),
      )));
    }
    let new_name = name.clone();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE classes SET name = ?2 WHERE class_id = ?1",
          rusqlite::params![encode_uuid(id), new_name],
        )?;
        ensure_changed(changed, "class", id)
      })
      .await?;
    Ok(SchoolClass { class_id: id, name })
  }

  async fn delete_class(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM classes WHERE class_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "class", id)
      })
      .await?;
    Ok(())
  }

  async fn teachers_for_class(&self, class_id: Uuid) -> Result<Vec<Teacher>> {
    let class_str = encode_uuid(class_id);
    let raws = self
      .conn
      .call(move |conn| {
        Ok(load_teachers(
          conn,
          "WHERE t.teacher_id IN
             (SELECT teacher_id FROM teacher_classes WHERE class_id = ?1)
           ORDER BY u.name",
          rusqlite::params![class_str],
        )?)
      })
      .await?;
    raws.into_iter().map(RawTeacher::into_teacher).collect()
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

impl SubjectStore for SqliteStore {
  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id: Uuid::new_v4(),
      name:       input.name.trim().to_owned(),
      class_id:   input.class_id,
      teacher_id: input.teacher_id,
    };
    let row = subject.clone();
    self
      .conn
      .call(move |conn| {
        check_subject(conn, &row)?;
        conn.execute(
          &format!("INSERT INTO subjects ({SUBJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"),
          rusqlite::params![
            encode_uuid(row.subject_id),
            row.name,
            encode_uuid(row.class_id),
            row.teacher_id.map(encode_uuid),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
              rusqlite::params![id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self, class_id: Option<Uuid>) -> Result<Vec<Subject>> {
    let class_str = class_id.map(encode_uuid);
    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE (?1 IS NULL OR class_id = ?1)
           ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![class_str], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(&self, id: Uuid, patch: SubjectPatch) -> Result<Subject> {
    let mut subject = found(self.get_subject(id).await?, "subject", id)?;
    patch.apply(&mut subject);
    subject.name = subject.name.trim().to_owned();

    let row = subject.clone();
    self
      .conn
      .call(move |conn| {
        check_subject(conn, &row)?;
        let changed = conn.execute(
          "UPDATE subjects SET name = ?2, class_id = ?3, teacher_id = ?4
           WHERE subject_id = ?1",
          rusqlite::params![
            encode_uuid(row.subject_id),
            row.name,
            encode_uuid(row.class_id),
            row.teacher_id.map(encode_uuid),
          ],
        )?;
        ensure_changed(changed, "subject", row.subject_id)
      })
      .await?;
    Ok(subject)
  }

  async fn delete_subject(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "subject", id)
      })
      .await?;
    Ok(())
  }
}
