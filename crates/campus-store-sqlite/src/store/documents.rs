use campus_core::{
  document::{
    Certificate,
    IndemnityForm,
    NewCertificate,
    NewIndemnityForm,
    NewTermReport,
    TermReport,
  },
  store::{DocumentStore, ReportQuery},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::SqliteStore;
use crate::{
  Result,
  encode::{
    CERTIFICATE_COLUMNS,
    INDEMNITY_COLUMNS,
    REPORT_COLUMNS,
    RawCertificate,
    RawIndemnityForm,
    RawReport,
    encode_dt,
    encode_uuid,
  },
};

// Listings are newest first. Documents are append-only and stamped at
// insert, so rowid order is generation order.

impl DocumentStore for SqliteStore {
  async fn add_report(&self, input: NewTermReport) -> Result<TermReport> {
    let report = TermReport {
      report_id:    Uuid::new_v4(),
      student_id:   input.student_id,
      class_id:     input.class_id,
      term:         input.term,
      template_id:  input.template_id,
      generated_at: Utc::now(),
      generated_by: input.generated_by,
      content:      input.content,
      comments:     input.comments,
    };
    let row = report.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO term_reports ({REPORT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
          ),
          rusqlite::params![
            encode_uuid(row.report_id),
            encode_uuid(row.student_id),
            row.class_id.map(encode_uuid),
            row.term,
            encode_uuid(row.template_id),
            encode_dt(row.generated_at),
            encode_uuid(row.generated_by),
            row.content,
            row.comments,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(report)
  }

  async fn get_report(&self, id: Uuid) -> Result<Option<TermReport>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REPORT_COLUMNS} FROM term_reports WHERE report_id = ?1"),
              rusqlite::params![id_str],
              RawReport::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, query: ReportQuery) -> Result<Vec<TermReport>> {
    let student = query.student_id.map(encode_uuid);
    let term = query.term;
    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS} FROM term_reports
           WHERE (?1 IS NULL OR student_id = ?1)
             AND (?2 IS NULL OR term = ?2)
           ORDER BY rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student, term], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn add_indemnity_form(&self, input: NewIndemnityForm) -> Result<IndemnityForm> {
    let form = IndemnityForm {
      form_id:      Uuid::new_v4(),
      student_id:   input.student_id,
      template_id:  input.template_id,
      generated_at: Utc::now(),
      content:      input.content,
      signed_by:    input.signed_by,
    };
    let row = form.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO indemnity_forms ({INDEMNITY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ),
          rusqlite::params![
            encode_uuid(row.form_id),
            encode_uuid(row.student_id),
            encode_uuid(row.template_id),
            encode_dt(row.generated_at),
            row.content,
            row.signed_by,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(form)
  }

  async fn get_indemnity_form(&self, id: Uuid) -> Result<Option<IndemnityForm>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawIndemnityForm> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {INDEMNITY_COLUMNS} FROM indemnity_forms WHERE form_id = ?1"),
              rusqlite::params![id_str],
              RawIndemnityForm::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawIndemnityForm::into_form).transpose()
  }

  async fn list_indemnity_forms(
    &self,
    student_id: Option<Uuid>,
  ) -> Result<Vec<IndemnityForm>> {
    let student = student_id.map(encode_uuid);
    let raws: Vec<RawIndemnityForm> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INDEMNITY_COLUMNS} FROM indemnity_forms
           WHERE (?1 IS NULL OR student_id = ?1)
           ORDER BY rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student], RawIndemnityForm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawIndemnityForm::into_form).collect()
  }

  async fn add_certificate(&self, input: NewCertificate) -> Result<Certificate> {
    let certificate = Certificate {
      certificate_id: Uuid::new_v4(),
      student_id:     input.student_id,
      title:          input.title,
      template_id:    input.template_id,
      generated_at:   Utc::now(),
      content:        input.content,
    };
    let row = certificate.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO certificates ({CERTIFICATE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ),
          rusqlite::params![
            encode_uuid(row.certificate_id),
            encode_uuid(row.student_id),
            row.title,
            encode_uuid(row.template_id),
            encode_dt(row.generated_at),
            row.content,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(certificate)
  }

  async fn list_certificates(&self, student_id: Option<Uuid>) -> Result<Vec<Certificate>> {
    let student = student_id.map(encode_uuid);
    let raws: Vec<RawCertificate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CERTIFICATE_COLUMNS} FROM certificates
           WHERE (?1 IS NULL OR student_id = ?1)
           ORDER BY rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student], RawCertificate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCertificate::into_certificate).collect()
  }
}
