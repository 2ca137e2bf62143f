//! The template substitution engine.
//!
//! Templates are plain text containing `{{Name}}` tokens. Rendering replaces
//! each recognised token with its value, or with the token's fixed fallback
//! when no value was supplied. Unrecognised tokens are copied through
//! unchanged. There is no escaping, nesting, or conditional logic.
//!
//! The scan is a single left-to-right pass, so text inserted for one token is
//! never itself scanned for tokens.

use std::collections::HashMap;

use strum::{EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::template::{Template, TemplateKind};

/// Every token the engine recognises. The variant name is the token name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum Placeholder {
  StudentName,
  StudentNumber,
  Class,
  Term,
  DateOfBirth,
  Gender,
  Grades,
  GradesTable,
  Total,
  Average,
  AverageMarks,
  AttendanceRate,
  TotalPresent,
  TotalAbsent,
  TeacherComment,
  ParentName,
  ParentPhone,
  GuardianName,
  GuardianPhone,
  Allergies,
  MedicalNotes,
  TeacherName,
  TeacherSignature,
  Subject,
  Date,
  GeneratedDate,
}

/// Length of the longest [`Placeholder`] name; the scan never looks further
/// than this for a closing `}}`.
const LONGEST_NAME: usize = 16;

/// Blank line for a handwritten signature.
pub const SIGNATURE_LINE: &str = "______________________";

impl Placeholder {
  pub fn name(&self) -> &'static str { self.into() }

  /// The literal token, e.g. `{{StudentName}}`.
  pub fn token(&self) -> String { format!("{{{{{}}}}}", self.name()) }

  /// Rendered when no value was supplied.
  pub fn fallback(&self) -> &'static str {
    match self {
      Self::Class => "Unassigned",
      Self::Grades | Self::GradesTable => "No grades recorded",
      Self::Total | Self::TotalPresent | Self::TotalAbsent => "0",
      Self::TeacherComment => "No comment",
      Self::Allergies => "None reported",
      Self::TeacherName => "Class Teacher",
      Self::TeacherSignature => SIGNATURE_LINE,
      Self::Subject => "General Excellence",
      _ => crate::metrics::NOT_AVAILABLE,
    }
  }
}

/// Values for one rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderValues {
  values: HashMap<Placeholder, String>,
}

impl RenderValues {
  pub fn new() -> Self { Self::default() }

  pub fn set(&mut self, p: Placeholder, value: impl Into<String>) -> &mut Self {
    self.values.insert(p, value.into());
    self
  }

  /// Set only when `value` is present and not blank, so the fallback applies
  /// otherwise.
  pub fn set_opt<V: Into<String>>(
    &mut self,
    p: Placeholder,
    value: Option<V>,
  ) -> &mut Self {
    match value.map(Into::into) {
      Some(v) if !v.trim().is_empty() => {
        self.values.insert(p, v);
      }
      _ => {
        self.values.remove(&p);
      }
    }
    self
  }

  /// The supplied value, or the token's fallback.
  pub fn get(&self, p: Placeholder) -> &str {
    self.values.get(&p).map_or(p.fallback(), String::as_str)
  }
}

/// Substitute every recognised token in `template`.
pub fn render(template: &str, values: &RenderValues) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(start) = rest.find("{{") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    let recognised = after
      .as_bytes()
      .windows(2)
      .take(LONGEST_NAME + 1)
      .position(|w| w == b"}}")
      .and_then(|end| after[..end].parse::<Placeholder>().ok().map(|p| (p, end)));
    match recognised {
      Some((p, end)) => {
        out.push_str(values.get(p));
        rest = &after[end + 2..];
      }
      None => {
        // Emit one brace and rescan, so `{{{Name}}` still finds `{{Name}}`.
        out.push('{');
        rest = &rest[start + 1..];
      }
    }
  }
  out.push_str(rest);
  out
}

/// The outcome of rendering one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
  pub content:     String,
  /// `None` when no template was available and the static message was used.
  pub template_id: Option<Uuid>,
}

/// Pick the template to render: the requested one if it exists and has the
/// right kind, otherwise the first template of that kind.
pub fn select_template(
  kind: TemplateKind,
  templates: &[Template],
  requested: Option<Uuid>,
) -> Option<&Template> {
  match requested {
    Some(id) => templates.iter().find(|t| t.template_id == id && t.kind == kind),
    None => templates.iter().find(|t| t.kind == kind),
  }
}

/// Render `template`, or the kind's "no template found" message if there is
/// none.
pub fn render_document(
  kind: TemplateKind,
  template: Option<&Template>,
  values: &RenderValues,
) -> Rendered {
  match template {
    Some(t) => Rendered {
      content:     render(&t.content, values),
      template_id: Some(t.template_id),
    },
    None => Rendered {
      content:     kind.missing_template_message().to_owned(),
      template_id: None,
    },
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn tpl(kind: TemplateKind, content: &str) -> Template {
    Template {
      template_id: Uuid::new_v4(),
      kind,
      name: "t".into(),
      content: content.into(),
      created_by: None,
    }
  }

  fn all_tokens() -> String {
    Placeholder::iter().map(|p| p.token()).collect::<Vec<_>>().join(" | ")
  }

  #[test]
  fn every_token_is_replaced_with_no_values() {
    let out = render(&all_tokens(), &RenderValues::new());
    for p in Placeholder::iter() {
      assert!(!out.contains(&p.token()), "{} survived: {out}", p.token());
    }
    assert!(!out.contains("{{"), "{out}");
  }

  #[test]
  fn every_token_is_replaced_with_values() {
    let mut v = RenderValues::new();
    for p in Placeholder::iter() {
      v.set(p, format!("<{}>", p.name()));
    }
    let out = render(&all_tokens(), &v);
    for p in Placeholder::iter() {
      assert!(out.contains(&format!("<{}>", p.name())));
      assert!(!out.contains(&p.token()));
    }
  }

  #[test]
  fn repeated_tokens_are_all_replaced() {
    let mut v = RenderValues::new();
    v.set(Placeholder::StudentName, "Ada Lovelace");
    assert_eq!(
      render("{{StudentName}} / {{StudentName}}", &v),
      "Ada Lovelace / Ada Lovelace"
    );
  }

  #[test]
  fn unknown_and_malformed_tokens_are_untouched() {
    let v = RenderValues::new();
    assert_eq!(render("Hi {{Nickname}}!", &v), "Hi {{Nickname}}!");
    assert_eq!(render("{{studentname}}", &v), "{{studentname}}");
    assert_eq!(render("open {{StudentName", &v), "open {{StudentName");
    assert_eq!(render("{ {StudentName}}", &v), "{ {StudentName}}");
  }

  #[test]
  fn closing_brace_search_is_bounded() {
    assert!(Placeholder::iter().all(|p| p.name().len() <= LONGEST_NAME));

    let mut v = RenderValues::new();
    v.set(Placeholder::Class, "7B");
    let braces = "{".repeat(200_000);
    assert_eq!(render(&braces, &v), braces);

    let spaced = format!("{{{{{}Class}}}} {{{{Class}}}}", " ".repeat(40));
    assert_eq!(render(&spaced, &v), format!("{{{{{}Class}}}} 7B", " ".repeat(40)));
  }

  #[test]
  fn extra_leading_brace_is_kept() {
    let mut v = RenderValues::new();
    v.set(Placeholder::Class, "7B");
    assert_eq!(render("{{{Class}}", &v), "{7B");
  }

  #[test]
  fn fallbacks_apply_to_missing_values() {
    let v = RenderValues::new();
    assert_eq!(render("{{Allergies}}", &v), "None reported");
    assert_eq!(render("{{GuardianName}}", &v), "N/A");
    assert_eq!(render("{{TeacherName}}", &v), "Class Teacher");
    assert_eq!(render("{{TeacherSignature}}", &v), SIGNATURE_LINE);
  }

  #[test]
  fn blank_optional_values_use_fallback() {
    let mut v = RenderValues::new();
    v.set_opt(Placeholder::MedicalNotes, Some("   "));
    v.set_opt(Placeholder::Allergies, None::<String>);
    assert_eq!(render("{{MedicalNotes}};{{Allergies}}", &v), "N/A;None reported");
  }

  #[test]
  fn substituted_text_is_not_rescanned() {
    let mut v = RenderValues::new();
    v.set(Placeholder::TeacherComment, "see {{Class}}");
    v.set(Placeholder::Class, "7B");
    assert_eq!(render("{{TeacherComment}}", &v), "see {{Class}}");
  }

  #[test]
  fn missing_template_renders_static_message() {
    let r = render_document(TemplateKind::Indemnity, None, &RenderValues::new());
    assert_eq!(r.content, "No indemnity template found.");
    assert_eq!(r.template_id, None);
  }

  #[test]
  fn selection_respects_kind() {
    let report = tpl(TemplateKind::Report, "r");
    let cert = tpl(TemplateKind::Certificate, "c");
    let all = vec![report.clone(), cert.clone()];

    assert_eq!(
      select_template(TemplateKind::Certificate, &all, None),
      Some(&cert)
    );
    assert_eq!(
      select_template(TemplateKind::Report, &all, Some(cert.template_id)),
      None
    );
    assert_eq!(
      select_template(TemplateKind::Report, &all, Some(report.template_id)),
      Some(&report)
    );
    assert_eq!(select_template(TemplateKind::Indemnity, &all, None), None);
  }
}
