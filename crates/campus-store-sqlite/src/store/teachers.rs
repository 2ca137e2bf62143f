use campus_core::{
  store::TeacherStore,
  teacher::{NewTeacher, Teacher, TeacherPatch, dedup_in_order},
  user::{NewUser, RecordStatus, Role},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{
  SqliteStore,
  ensure_changed,
  found,
  users::{insert_user, new_user_row},
};
use crate::{
  Result,
  encode::{RawTeacher, TEACHER_SELECT, encode_enum, encode_uuid},
  error::reject,
};

/// Read teachers matching `filter` (a `WHERE`/`ORDER BY` tail over `t` and
/// `u`), with their class links in assignment order.
pub(super) fn load_teachers(
  conn: &rusqlite::Connection,
  filter: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawTeacher>> {
  let mut stmt = conn.prepare(&format!("{TEACHER_SELECT} {filter}"))?;
  let mut teachers = stmt
    .query_map(params, RawTeacher::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut links = conn.prepare(
    "SELECT class_id FROM teacher_classes WHERE teacher_id = ?1 ORDER BY position",
  )?;
  for t in &mut teachers {
    t.assigned_classes = links
      .query_map(rusqlite::params![t.teacher_id], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
  }
  Ok(teachers)
}

fn replace_links(
  conn: &rusqlite::Connection,
  teacher_id: &str,
  classes: &[Uuid],
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM teacher_classes WHERE teacher_id = ?1",
    rusqlite::params![teacher_id],
  )?;
  let mut insert = conn.prepare(
    "INSERT INTO teacher_classes (teacher_id, class_id, position) VALUES (?1, ?2, ?3)",
  )?;
  for (position, class_id) in classes.iter().enumerate() {
    insert.execute(rusqlite::params![
      teacher_id,
      encode_uuid(*class_id),
      position as i64
    ])?;
  }
  Ok(())
}

/// Every subject naming the teacher must sit in one of their classes; a
/// relink that strands one is rejected.
fn check_subjects_still_assigned(
  conn: &rusqlite::Connection,
  teacher_id: Uuid,
  teacher_str: &str,
) -> tokio_rusqlite::Result<()> {
  let stranded: Option<String> = conn
    .query_row(
      "SELECT class_id FROM subjects
       WHERE teacher_id = ?1
         AND class_id NOT IN (SELECT class_id FROM teacher_classes WHERE teacher_id = ?1)
       LIMIT 1",
      rusqlite::params![teacher_str],
      |r| r.get(0),
    )
    .optional()?;
  let Some(class_id) = stranded else {
    return Ok(());
  };
  let class_id = Uuid::parse_str(&class_id)
    .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
  Err(reject(campus_core::Error::TeacherNotAssignedToClass { teacher_id, class_id }))
}

impl SqliteStore {
  async fn teacher_where(
    &self,
    filter: &'static str,
    key: String,
  ) -> Result<Option<Teacher>> {
    let mut raws = self
      .conn
      .call(move |conn| Ok(load_teachers(conn, filter, rusqlite::params![key])?))
      .await?;
    raws.pop().map(RawTeacher::into_teacher).transpose()
  }
}

impl TeacherStore for SqliteStore {
  async fn add_teacher(&self, input: NewTeacher) -> Result<Teacher> {
    let mut added = self.add_teachers(vec![input]).await?;
    Ok(added.remove(0))
  }

  async fn add_teachers(&self, inputs: Vec<NewTeacher>) -> Result<Vec<Teacher>> {
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
      let user = new_user_row(&NewUser {
        name:          input.name,
        email:         input.email,
        role:          Role::Teacher,
        status:        input.status,
        password_hash: String::new(),
      });
      let mut assigned_classes = input.assigned_classes;
      dedup_in_order(&mut assigned_classes);
      let teacher = Teacher {
        teacher_id: Uuid::new_v4(),
        user_id: user.user_id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: input.phone,
        signature_image: input.signature_image,
        assigned_classes,
        status: user.status,
      };
      rows.push((user, input.password_hash, teacher));
    }

    let teachers: Vec<Teacher> = rows.iter().map(|(_, _, t)| t.clone()).collect();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (user, password_hash, teacher) in &rows {
          insert_user(&tx, user, password_hash)?;
          let teacher_id = encode_uuid(teacher.teacher_id);
          tx.execute(
            "INSERT INTO teachers (teacher_id, user_id, phone, signature_image)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              teacher_id,
              encode_uuid(user.user_id),
              teacher.phone,
              teacher.signature_image,
            ],
          )?;
          replace_links(&tx, &teacher_id, &teacher.assigned_classes)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(teachers)
  }

  async fn get_teacher(&self, id: Uuid) -> Result<Option<Teacher>> {
    self.teacher_where("WHERE t.teacher_id = ?1", encode_uuid(id)).await
  }

  async fn get_teacher_by_user(&self, user_id: Uuid) -> Result<Option<Teacher>> {
    self.teacher_where("WHERE t.user_id = ?1", encode_uuid(user_id)).await
  }

  async fn list_teachers(&self) -> Result<Vec<Teacher>> {
    let raws = self
      .conn
      .call(|conn| Ok(load_teachers(conn, "ORDER BY u.name, u.email", [])?))
      .await?;
    raws.into_iter().map(RawTeacher::into_teacher).collect()
  }

  async fn update_teacher(&self, id: Uuid, patch: TeacherPatch) -> Result<Teacher> {
    let mut teacher = found(self.get_teacher(id).await?, "teacher", id)?;
    let relink = patch.assigned_classes.is_some();
    patch.apply(&mut teacher);

    let row = teacher.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let teacher_id = encode_uuid(row.teacher_id);
        tx.execute(
          "UPDATE users SET name = ?2, email = ?3, status = ?4 WHERE user_id = ?1",
          rusqlite::params![
            encode_uuid(row.user_id),
            row.name,
            row.email,
            encode_enum(row.status),
          ],
        )?;
        let changed = tx.execute(
          "UPDATE teachers SET phone = ?2, signature_image = ?3 WHERE teacher_id = ?1",
          rusqlite::params![teacher_id, row.phone, row.signature_image],
        )?;
        ensure_changed(changed, "teacher", row.teacher_id)?;
        if relink {
          replace_links(&tx, &teacher_id, &row.assigned_classes)?;
          check_subjects_still_assigned(&tx, row.teacher_id, &teacher_id)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(teacher)
  }

  async fn archive_teacher(&self, id: Uuid) -> Result<Teacher> {
    self
      .update_teacher(id, TeacherPatch {
        status: Some(RecordStatus::Archived),
        ..Default::default()
      })
      .await
  }

  async fn delete_teacher(&self, id: Uuid) -> Result<()> {
    let teacher = found(self.get_teacher(id).await?, "teacher", id)?;
    self
      .conn
      .call(move |conn| {
        // Cascades to the profile, class links and sessions.
        let changed = conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![encode_uuid(teacher.user_id)],
        )?;
        ensure_changed(changed, "teacher", id)
      })
      .await?;
    Ok(())
  }
}
