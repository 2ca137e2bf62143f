use campus_core::{
  store::TemplateStore,
  template::{NewTemplate, Template, TemplateKind, TemplatePatch},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, ensure_changed, found};
use crate::{
  Result,
  encode::{RawTemplate, TEMPLATE_COLUMNS, encode_enum, encode_uuid},
};

impl TemplateStore for SqliteStore {
  async fn add_template(&self, input: NewTemplate) -> Result<Template> {
    let template = Template {
      template_id: Uuid::new_v4(),
      kind:        input.kind,
      name:        input.name.trim().to_owned(),
      content:     input.content,
      created_by:  input.created_by,
    };
    let row = template.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO templates ({TEMPLATE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![
            encode_uuid(row.template_id),
            encode_enum(row.kind),
            row.name,
            row.content,
            row.created_by.map(encode_uuid),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(template)
  }

  async fn get_template(&self, id: Uuid) -> Result<Option<Template>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawTemplate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE template_id = ?1"),
              rusqlite::params![id_str],
              RawTemplate::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTemplate::into_template).transpose()
  }

  async fn list_templates(&self, kind: Option<TemplateKind>) -> Result<Vec<Template>> {
    let kind_str = kind.map(encode_enum);
    let raws: Vec<RawTemplate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TEMPLATE_COLUMNS} FROM templates
           WHERE (?1 IS NULL OR kind = ?1)
           ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], RawTemplate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTemplate::into_template).collect()
  }

  async fn update_template(&self, id: Uuid, patch: TemplatePatch) -> Result<Template> {
    let mut template = found(self.get_template(id).await?, "template", id)?;
    patch.apply(&mut template);

    let row = template.clone();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE templates SET kind = ?2, name = ?3, content = ?4 WHERE template_id = ?1",
          rusqlite::params![
            encode_uuid(row.template_id),
            encode_enum(row.kind),
            row.name,
            row.content,
          ],
        )?;
        ensure_changed(changed, "template", row.template_id)
      })
      .await?;
    Ok(template)
  }

  async fn delete_template(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM templates WHERE template_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        ensure_changed(changed, "template", id)
      })
      .await?;
    Ok(())
  }
}
