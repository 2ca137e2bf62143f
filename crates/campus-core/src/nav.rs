//! Workflow pages and which roles may reach them.
//!
//! Admins see everything; teachers see the classroom workflows. The API
//! enforces the same split on the routes behind each page.

use serde::Serialize;
use strum::{EnumIter, IntoEnumIterator as _};

use crate::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Page {
  Dashboard,
  Students,
  Teachers,
  Classes,
  Templates,
  Attendance,
  Grades,
  Reports,
  Profile,
}

impl Page {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Dashboard => "Dashboard",
      Self::Students => "Students",
      Self::Teachers => "Teachers",
      Self::Classes => "Classes & Subjects",
      Self::Templates => "Templates",
      Self::Attendance => "Attendance",
      Self::Grades => "Grades",
      Self::Reports => "Reports & Certs",
      Self::Profile => "Profile",
    }
  }

  pub fn admin_only(&self) -> bool {
    matches!(
      self,
      Self::Students | Self::Teachers | Self::Classes | Self::Templates
    )
  }

  pub fn visible_to(&self, role: Role) -> bool {
    match role {
      Role::Admin => true,
      Role::Teacher => !self.admin_only(),
    }
  }
}

/// Navigation entries for `role`, in menu order.
pub fn pages_for(role: Role) -> Vec<Page> {
  Page::iter().filter(|p| p.visible_to(role)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admin_sees_every_page() {
    assert_eq!(pages_for(Role::Admin).len(), Page::iter().count());
  }

  #[test]
  fn teacher_menu_hides_management_pages() {
    assert_eq!(pages_for(Role::Teacher), vec![
      Page::Dashboard,
      Page::Attendance,
      Page::Grades,
      Page::Reports,
      Page::Profile,
    ]);
  }
}
