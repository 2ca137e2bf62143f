//! Document templates: raw text with `{{Placeholder}}` tokens.

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

/// Which generator a template feeds.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TemplateKind {
  Report,
  Certificate,
  Indemnity,
}

impl TemplateKind {
  /// The text rendered in place of a document when no template of this kind
  /// exists.
  pub fn missing_template_message(&self) -> &'static str {
    match self {
      Self::Report => {
        "No report template found. Please create one in Templates."
      }
      Self::Certificate => "No certificate template found.",
      Self::Indemnity => "No indemnity template found.",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
  pub template_id: Uuid,
  pub kind:        TemplateKind,
  pub name:        String,
  pub content:     String,
  /// The user who created it, if known.
  pub created_by:  Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
  pub kind:       TemplateKind,
  pub name:       String,
  pub content:    String,
  /// Set by the API from the signed-in user; ignored in request bodies.
  #[serde(skip)]
  pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
  pub kind:    Option<TemplateKind>,
  pub name:    Option<String>,
  pub content: Option<String>,
}

impl TemplatePatch {
  pub fn apply(self, t: &mut Template) {
    if let Some(v) = self.kind {
      t.kind = v;
    }
    if let Some(v) = self.name {
      t.name = v;
    }
    if let Some(v) = self.content {
      t.content = v;
    }
  }
}
