use campus_core::{
  store::TermStore,
  term::{AcademicTerm, AcademicTermPatch, NewAcademicTerm},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{RawTerm, TERM_COLUMNS, encode_date, encode_uuid},
};

impl SqliteStore {
  async fn term_where(
    &self,
    clause: &'static str,
    key: Option<String>,
  ) -> Result<Option<AcademicTerm>> {
    let raw: Option<RawTerm> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {TERM_COLUMNS} FROM academic_terms WHERE {clause}");
        let row = match key {
          Some(k) => conn.query_row(&sql, rusqlite::params![k], RawTerm::from_row),
          None => conn.query_row(&sql, [], RawTerm::from_row),
        };
        Ok(row.optional()?)
      })
      .await?;
    raw.map(RawTerm::into_term).transpose()
  }

  async fn get_term(&self, id: Uuid) -> Result<Option<AcademicTerm>> {
    self.term_where("term_id = ?1", Some(encode_uuid(id))).await
  }
}

impl TermStore for SqliteStore {
  async fn add_term(&self, input: NewAcademicTerm) -> Result<AcademicTerm> {
    let term = input.into_term(Uuid::new_v4())?;
    let row = term.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO academic_terms ({TERM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            encode_uuid(row.term_id),
            row.year,
            i64::from(row.term),
            row.name,
            encode_date(row.start_date),
            encode_date(row.end_date),
            row.is_active,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(term)
  }

  async fn list_terms(&self, year: Option<i32>) -> Result<Vec<AcademicTerm>> {
    let raws: Vec<RawTerm> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TERM_COLUMNS} FROM academic_terms
           WHERE (?1 IS NULL OR year = ?1)
           ORDER BY year DESC, term ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![year], RawTerm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTerm::into_term).collect()
  }

  async fn active_term(&self) -> Result<Option<AcademicTerm>> {
    self.term_where("is_active = 1", None).await
  }

  async fn update_term(
    &self,
    id: Uuid,
    patch: AcademicTermPatch,
  ) -> Result<AcademicTerm> {
    let mut term = found(self.get_term(id).await?, "term", id)?;
    patch.apply(&mut term)?;

    let row = term.clone();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE academic_terms
           SET year = ?2, term = ?3, name = ?4, start_date = ?5, end_date = ?6
           WHERE term_id = ?1",
          rusqlite::params![
            encode_uuid(row.term_id),
            row.year,
            i64::from(row.term),
            row.name,
            encode_date(row.start_date),
            encode_date(row.end_date),
          ],
        )?;
        ensure_changed(changed, "term", row.term_id)
      })
      .await?;
    Ok(term)
  }

  async fn set_active_term(&self, id: Uuid) -> Result<AcademicTerm> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("UPDATE academic_terms SET is_active = 0 WHERE is_active = 1", [])?;
        let changed = tx.execute(
          "UPDATE academic_terms SET is_active = 1 WHERE term_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "term", id)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    found(self.get_term(id).await?, "term", id)
  }
}
