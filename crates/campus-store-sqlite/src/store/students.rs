use campus_core::{
  store::{StudentQuery, StudentStore},
  student::{NewStudent, Student, StudentPatch},
  user::RecordStatus,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{
    RawStudent,
    STUDENT_COLUMNS,
    encode_contact,
    encode_date,
    encode_enum,
    encode_uuid,
  },
};

/// Column values of one student row, encoded ahead of the connection call.
struct StudentRow {
  params: [Option<String>; 13],
}

impl StudentRow {
  fn encode(s: &Student) -> Result<Self> {
    let guardian = s.guardian_contact.as_ref().map(encode_contact).transpose()?;
    Ok(Self {
      params: [
        Some(encode_uuid(s.student_id)),
        Some(s.student_number.clone()),
        Some(s.first_name.clone()),
        Some(s.last_name.clone()),
        s.class_id.map(encode_uuid),
        s.dob.map(encode_date),
        Some(s.gender.clone()),
        Some(s.address.clone()),
        s.allergies.clone(),
        s.medical_notes.clone(),
        Some(encode_contact(&s.parent_contact)?),
        guardian,
        Some(encode_enum(s.status).to_owned()),
      ],
    })
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
    conn.execute(
      &format!(
        "INSERT INTO students ({STUDENT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
      ),
      rusqlite::params_from_iter(self.params.iter()),
    )
  }

  fn update(&self, conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
    conn.execute(
      "UPDATE students SET
         student_number = ?2, first_name = ?3, last_name = ?4, class_id = ?5,
         dob = ?6, gender = ?7, address = ?8, allergies = ?9,
         medical_notes = ?10, parent_contact = ?11, guardian_contact = ?12,
         status = ?13
       WHERE student_id = ?1",
      rusqlite::params_from_iter(self.params.iter()),
    )
  }
}

impl StudentStore for SqliteStore {
  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let mut added = self.add_students(vec![input]).await?;
    Ok(added.remove(0))
  }

  async fn add_students(&self, inputs: Vec<NewStudent>) -> Result<Vec<Student>> {
    let students: Vec<Student> = inputs
      .into_iter()
      .map(|s| s.into_student(Uuid::new_v4()))
      .collect();
    let rows = students
      .iter()
      .map(StudentRow::encode)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for row in &rows {
          row.insert(&tx)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(students)
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
              rusqlite::params![id_str],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStudent::into_student).transpose()
  }

  async fn list_students(&self, query: StudentQuery) -> Result<Vec<Student>> {
    let class_str = query.class_id.map(encode_uuid);
    let status_str = query.status.map(|s| encode_enum(s).to_owned());

    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLUMNS} FROM students
           WHERE (?1 IS NULL OR class_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY last_name, first_name, student_number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![class_str, status_str], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawStudent::into_student).collect()
  }

  async fn update_student(&self, id: Uuid, patch: StudentPatch) -> Result<Student> {
    let mut student = found(self.get_student(id).await?, "student", id)?;
    patch.apply(&mut student);

    let row = StudentRow::encode(&student)?;
    self
      .conn
      .call(move |conn| {
        let changed = row.update(conn)?;
        ensure_changed(changed, "student", id)
      })
      .await?;
    Ok(student)
  }

  async fn archive_student(&self, id: Uuid) -> Result<Student> {
    self
      .update_student(id, StudentPatch {
        status: Some(RecordStatus::Archived),
        ..Default::default()
      })
      .await
  }

  async fn delete_student(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM students WHERE student_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "student", id)
      })
      .await?;
    Ok(())
  }
}
