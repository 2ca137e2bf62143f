use campus_core::{
  attendance::{
    Attendance,
    AttendanceEntry,
    AttendancePatch,
    RegisterWrite,
    build_register,
  },
  store::{AttendanceQuery, AttendanceStore},
};
use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{
    ATTENDANCE_COLUMNS,
    RawAttendance,
    encode_date,
    encode_enum,
    encode_uuid,
  },
  error::reject,
};

impl SqliteStore {
  async fn get_attendance(&self, id: Uuid) -> Result<Option<Attendance>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE attendance_id = ?1"
              ),
              rusqlite::params![id_str],
              RawAttendance::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAttendance::into_attendance).transpose()
  }
}

impl AttendanceStore for SqliteStore {
  async fn list_attendance(&self, query: AttendanceQuery) -> Result<Vec<Attendance>> {
    let class = query.class_id.map(encode_uuid);
    let student = query.student_id.map(encode_uuid);
    let date = query.date.map(encode_date);

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance
           WHERE (?1 IS NULL OR class_id = ?1)
             AND (?2 IS NULL OR student_id = ?2)
             AND (?3 IS NULL OR date = ?3)
           ORDER BY date DESC, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![class, student, date], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAttendance::into_attendance).collect()
  }

  async fn replace_register(
    &self,
    class_id: Uuid,
    date: NaiveDate,
    entries: Vec<AttendanceEntry>,
    mode: RegisterWrite,
  ) -> Result<Vec<Attendance>> {
    let register = build_register(class_id, date, entries)?;
    let rows = register.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let class_str = encode_uuid(class_id);
        let date_str = encode_date(date);

        let class_exists = tx
          .query_row("SELECT 1 FROM classes WHERE class_id = ?1", [&class_str], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if !class_exists {
          return Err(reject(campus_core::Error::not_found("class", class_id)));
        }

        if mode == RegisterWrite::FirstOnly {
          let taken = tx
            .query_row(
              "SELECT 1 FROM attendance WHERE class_id = ?1 AND date = ?2 LIMIT 1",
              rusqlite::params![class_str, date_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Err(reject(campus_core::Error::Conflict(format!(
              "attendance for {date} is already recorded; ask an administrator \
               to change it"
            ))));
          }
        }

        tx.execute(
          "DELETE FROM attendance WHERE class_id = ?1 AND date = ?2",
          rusqlite::params![class_str, date_str],
        )?;
        {
          let mut insert = tx.prepare(&format!(
            "INSERT INTO attendance ({ATTENDANCE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ))?;
          for a in &rows {
            insert.execute(rusqlite::params![
              encode_uuid(a.attendance_id),
              encode_uuid(a.student_id),
              class_str,
              date_str,
              encode_enum(a.status),
              a.comment,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(register)
  }

  async fn update_attendance(
    &self,
    id: Uuid,
    patch: AttendancePatch,
  ) -> Result<Attendance> {
    let mut record = found(self.get_attendance(id).await?, "attendance record", id)?;
    patch.apply(&mut record);

    let row = record.clone();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE attendance SET status = ?2, comment = ?3 WHERE attendance_id = ?1",
          rusqlite::params![encode_uuid(row.attendance_id), encode_enum(row.status), row.comment],
        )?;
        ensure_changed(changed, "attendance record", row.attendance_id)
      })
      .await?;
    Ok(record)
  }
}
