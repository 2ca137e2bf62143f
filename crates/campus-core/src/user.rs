//! User accounts: the identity behind every login, admin or teacher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

/// What a signed-in user is allowed to do.
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
pub enum Role {
  Admin,
  Teacher,
}

/// Lifecycle flag shared by users and students. `Archived` is the soft
/// delete.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
  #[default]
  Active,
  Inactive,
  Archived,
}

impl RecordStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

/// A user account. The password hash is never part of this record; stores
/// hand it out separately through
/// [`UserStore::password_hash`](crate::store::UserStore::password_hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub name:       String,
  pub role:       Role,
  pub email:      String,
  pub status:     RecordStatus,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`UserStore::add_user`](crate::store::UserStore::add_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub role:          Role,
  pub status:        RecordStatus,
  /// argon2 PHC string; hashing happens before the store sees the password.
  pub password_hash: String,
}

/// Partial update for a user account. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub name:   Option<String>,
  pub email:  Option<String>,
  pub role:   Option<Role>,
  pub status: Option<RecordStatus>,
}

impl UserPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.email.is_none()
      && self.role.is_none()
      && self.status.is_none()
  }

  pub fn apply(self, user: &mut User) {
    if let Some(name) = self.name {
      user.name = name;
    }
    if let Some(email) = self.email {
      user.email = normalize_email(&email);
    }
    if let Some(role) = self.role {
      user.role = role;
    }
    if let Some(status) = self.status {
      user.status = status;
    }
  }
}

/// Emails are matched case-insensitively; stores keep the lowercase form.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> User {
    User {
      user_id:    Uuid::new_v4(),
      name:       "Ada".into(),
      role:       Role::Teacher,
      email:      "ada@school.test".into(),
      status:     RecordStatus::Active,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn patch_only_touches_given_fields() {
    let mut u = user();
    UserPatch { status: Some(RecordStatus::Archived), ..Default::default() }
      .apply(&mut u);
    assert_eq!(u.status, RecordStatus::Archived);
    assert_eq!(u.name, "Ada");
    assert_eq!(u.role, Role::Teacher);
  }

  #[test]
  fn patched_email_is_normalized() {
    let mut u = user();
    UserPatch { email: Some("  Ada@School.TEST ".into()), ..Default::default() }
      .apply(&mut u);
    assert_eq!(u.email, "ada@school.test");
  }

  #[test]
  fn role_strings_match_serde() {
    let s: &'static str = Role::Admin.into();
    assert_eq!(s, "admin");
    assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
    assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
  }
}
