//! Placeholder values for each document kind, built from records that have
//! already been loaded.

use crate::{
  attendance::Attendance,
  class::{SchoolClass, Subject},
  grade::Grade,
  metrics::{self, AttendanceSummary},
  render::{Placeholder as P, RenderValues, SIGNATURE_LINE},
  student::Student,
};

/// What every document knows about its subject and author.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
  pub student:      &'a Student,
  pub class:        Option<&'a SchoolClass>,
  /// The generating user's display name.
  pub teacher_name: Option<&'a str>,
  /// Generation date, already formatted for display.
  pub date:         &'a str,
}

/// Inputs specific to a term report.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
  pub term:            &'a str,
  /// The student's grades for `term`.
  pub grades:          &'a [Grade],
  /// Used to name the subjects in the grades table.
  pub subjects:        &'a [Subject],
  pub attendance:      &'a [Attendance],
  pub teacher_comment: Option<&'a str>,
}

/// Values shared by all document kinds.
pub fn student_values(ctx: &DocumentContext<'_>) -> RenderValues {
  let s = ctx.student;
  let guardian = s.guardian_contact.as_ref();
  let mut v = RenderValues::new();
  v.set(P::StudentName, s.full_name())
    .set(P::StudentNumber, s.student_number.as_str())
    .set_opt(P::Class, ctx.class.map(|c| c.name.as_str()))
    .set_opt(P::DateOfBirth, s.dob.map(|d| d.to_string()))
    .set_opt(P::Gender, Some(s.gender.as_str()))
    .set_opt(P::ParentName, Some(s.parent_contact.full_name.as_str()))
    .set_opt(P::ParentPhone, Some(s.parent_contact.phone.as_str()))
    .set_opt(P::GuardianName, guardian.map(|g| g.full_name.as_str()))
    .set_opt(P::GuardianPhone, guardian.map(|g| g.phone.as_str()))
    .set_opt(P::Allergies, s.allergies.as_deref())
    .set_opt(P::MedicalNotes, s.medical_notes.as_deref())
    .set_opt(P::TeacherName, ctx.teacher_name)
    .set(P::TeacherSignature, SIGNATURE_LINE)
    .set(P::Date, ctx.date)
    .set(P::GeneratedDate, ctx.date);
  v
}

/// Values for a term report: student values plus grades and attendance.
pub fn report_values(
  ctx: &DocumentContext<'_>,
  inputs: &ReportInputs<'_>,
) -> RenderValues {
  let mut v = student_values(ctx);
  let attendance = AttendanceSummary::from_records(inputs.attendance);
  let average = metrics::format_average(metrics::average_marks(inputs.grades));
  let table = grades_table(inputs.grades, inputs.subjects);

  v.set(P::Term, inputs.term)
    .set_opt(P::Grades, table.clone())
    .set_opt(P::GradesTable, table)
    .set(P::Total, metrics::total_marks(inputs.grades).to_string())
    .set(P::Average, average.clone())
    .set(P::AverageMarks, average)
    .set(P::AttendanceRate, attendance.format_rate())
    .set(P::TotalPresent, attendance.present.to_string())
    .set(P::TotalAbsent, attendance.absent.to_string())
    .set_opt(P::TeacherComment, inputs.teacher_comment);
  v
}

/// Values for a certificate. `title` feeds `{{Subject}}`.
pub fn certificate_values(
  ctx: &DocumentContext<'_>,
  term: Option<&str>,
  title: Option<&str>,
) -> RenderValues {
  let mut v = student_values(ctx);
  v.set_opt(P::Term, term).set_opt(P::Subject, title);
  v
}

/// Values for an indemnity form.
pub fn indemnity_values(ctx: &DocumentContext<'_>) -> RenderValues {
  student_values(ctx)
}

/// One line per grade, `Subject: marks (letter)`, ordered by subject name.
/// `None` when there are no grades.
pub fn grades_table(grades: &[Grade], subjects: &[Subject]) -> Option<String> {
  if grades.is_empty() {
    return None;
  }
  let mut lines: Vec<(String, u8)> = grades
    .iter()
    .map(|g| {
      let name = subjects
        .iter()
        .find(|s| s.subject_id == g.subject_id)
        .map_or("Unknown", |s| s.name.as_str());
      (name.to_owned(), g.marks)
    })
    .collect();
  lines.sort();

  let mut out = String::new();
  for (name, marks) in lines {
    out.push_str(&format!(
      "{name}: {marks} ({})\n",
      metrics::letter_grade(marks)
    ));
  }
  Some(out)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;
  use crate::{
    attendance::AttendanceStatus,
    render::render,
    student::Contact,
    user::RecordStatus,
  };

  fn student(class_id: Option<Uuid>) -> Student {
    Student {
      student_id: Uuid::new_v4(),
      student_number: "S-042".into(),
      first_name: "Maya".into(),
      last_name: "Angelou".into(),
      class_id,
      dob: NaiveDate::from_ymd_opt(2014, 4, 4),
      gender: "F".into(),
      address: "12 Cage Bird Ln".into(),
      allergies: None,
      medical_notes: Some("Inhaler in bag".into()),
      parent_contact: Contact {
        full_name:    "Vivian Baxter".into(),
        relationship: "Mother".into(),
        phone:        "555-0199".into(),
        email:        None,
      },
      guardian_contact: None,
      status: RecordStatus::Active,
    }
  }

  fn subject(class_id: Uuid, name: &str) -> Subject {
    Subject { subject_id: Uuid::new_v4(), name: name.into(), class_id, teacher_id: None }
  }

  fn grade(student: &Student, subject: &Subject, marks: u8) -> Grade {
    Grade {
      grade_id: Uuid::new_v4(),
      student_id: student.student_id,
      subject_id: subject.subject_id,
      marks,
      term: "Term 1".into(),
      academic_year: 2025,
      comment: None,
    }
  }

  fn present(student: &Student, status: AttendanceStatus) -> Attendance {
    Attendance {
      attendance_id: Uuid::new_v4(),
      student_id: student.student_id,
      class_id: Uuid::nil(),
      date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
      status,
      comment: None,
    }
  }

  #[test]
  fn report_fills_grades_and_attendance() {
    let class = SchoolClass { class_id: Uuid::new_v4(), name: "Grade 5A".into() };
    let s = student(Some(class.class_id));
    let maths = subject(class.class_id, "Maths");
    let art = subject(class.class_id, "Art");
    let grades = [grade(&s, &maths, 82), grade(&s, &art, 55)];
    let attendance = [
      present(&s, AttendanceStatus::Present),
      present(&s, AttendanceStatus::Absent),
    ];
    let ctx = DocumentContext {
      student:      &s,
      class:        Some(&class),
      teacher_name: Some("Mr Keating"),
      date:         "2025-03-28",
    };
    let values = report_values(&ctx, &ReportInputs {
      term:            "Term 1",
      grades:          &grades,
      subjects:        &[maths.clone(), art.clone()],
      attendance:      &attendance,
      teacher_comment: None,
    });

    let out = render(
      "{{StudentName}} ({{Class}}) {{Term}}\n{{GradesTable}}Total {{Total}} \
       Avg {{Average}} Att {{AttendanceRate}} P{{TotalPresent}} \
       A{{TotalAbsent}}\n{{TeacherComment}} / {{TeacherName}} / \
       {{Allergies}} / {{MedicalNotes}} / {{GuardianName}}",
      &values,
    );
    assert_eq!(
      out,
      "Maya Angelou (Grade 5A) Term 1\nArt: 55 (C)\nMaths: 82 (A)\nTotal 137 \
       Avg 68.5 Att 50% P1 A1\nNo comment / Mr Keating / None reported / \
       Inhaler in bag / N/A"
    );
  }

  #[test]
  fn report_without_grades_uses_fallbacks() {
    let s = student(None);
    let ctx = DocumentContext { student: &s, class: None, teacher_name: None, date: "d" };
    let values = report_values(&ctx, &ReportInputs {
      term:            "Term 2",
      grades:          &[],
      subjects:        &[],
      attendance:      &[],
      teacher_comment: Some("Great effort"),
    });
    let out = render(
      "{{Class}}|{{Grades}}|{{Average}}|{{AttendanceRate}}|{{Total}}|{{TeacherName}}|{{TeacherComment}}",
      &values,
    );
    assert_eq!(
      out,
      "Unassigned|No grades recorded|N/A|N/A|0|Class Teacher|Great effort"
    );
  }

  #[test]
  fn certificate_title_feeds_subject() {
    let s = student(None);
    let ctx = DocumentContext { student: &s, class: None, teacher_name: None, date: "d" };
    let out = render("{{Subject}}", &certificate_values(&ctx, None, None));
    assert_eq!(out, "General Excellence");
    let out = render("{{Subject}}", &certificate_values(&ctx, None, Some("Mathematics")));
    assert_eq!(out, "Mathematics");
  }

  #[test]
  fn unknown_subject_is_labelled() {
    let s = student(None);
    let orphan = subject(Uuid::new_v4(), "Gone");
    let g = grade(&s, &orphan, 30);
    assert_eq!(grades_table(&[g], &[]).unwrap(), "Unknown: 30 (D)\n");
  }
}
