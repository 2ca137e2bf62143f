//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use campus_core::{
  store::UserStore as _,
  user::{NewUser, RecordStatus, Role},
};
use campus_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiSettings, AppState, api_router, auth::hash_password};

const ADMIN_EMAIL: &str = "admin@school.test";
const ADMIN_PASSWORD: &str = "admin-pass";

struct Harness {
  app:   Router,
  state: AppState<SqliteStore>,
}

impl Harness {
  async fn new() -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(Arc::new(store), ApiSettings::default());
    seed_user(&state, "Head Admin", ADMIN_EMAIL, Role::Admin, RecordStatus::Active, ADMIN_PASSWORD)
      .await;
    Self { app: api_router(state.clone()), state }
  }

  async fn send(
    &self,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn call(
    &self,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let resp = self.send(method, uri, token, body).await;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn login(&self, email: &str, password: &str) -> String {
    let (status, body) = self
      .call(
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
      )
      .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_owned()
  }

  async fn admin(&self) -> String { self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await }

  async fn create(&self, token: &str, uri: &str, body: Value) -> Value {
    let (status, json) = self.call("POST", uri, Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {json}");
    json
  }

  /// A class with one enrolled student.
  async fn class_with_student(&self, admin: &str, class: &str, number: &str) -> (String, String) {
    let class = self.create(admin, "/classes", json!({ "name": class })).await;
    let class_id = class["class_id"].as_str().unwrap().to_owned();
    let student = self
      .create(admin, "/students", student_body(number, Some(&class_id)))
      .await;
    (class_id, student["student_id"].as_str().unwrap().to_owned())
  }

  /// A teacher assigned to `classes`; returns (teacher json, session token).
  async fn teacher(&self, admin: &str, email: &str, classes: &[&str]) -> (Value, String) {
    let created = self
      .create(
        admin,
        "/teachers",
        json!({ "name": "Ms Frizzle", "email": email, "assigned_classes": classes }),
      )
      .await;
    let password = created["generated_password"].as_str().unwrap();
    let token = self.login(email, password).await;
    (created["teacher"].clone(), token)
  }
}

async fn seed_user(
  state: &AppState<SqliteStore>,
  name: &str,
  email: &str,
  role: Role,
  status: RecordStatus,
  password: &str,
) {
  state
    .store
    .add_user(NewUser {
      name: name.into(),
      email: email.into(),
      role,
      status,
      password_hash: hash_password(password).unwrap(),
    })
    .await
    .unwrap();
}

fn student_body(number: &str, class_id: Option<&str>) -> Value {
  json!({
    "student_number": number,
    "first_name": "Alan",
    "last_name": "Turing",
    "class_id": class_id,
    "gender": "M",
    "address": "1 Loop Rd",
    "parent_contact": {
      "full_name": "Ethel Turing",
      "relationship": "Mother",
      "phone": "555-0100"
    }
  })
}

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_rejects_bad_credentials_and_inactive_accounts() {
  let h = Harness::new().await;
  seed_user(
    &h.state,
    "Gone",
    "gone@school.test",
    Role::Teacher,
    RecordStatus::Inactive,
    "pw",
  )
  .await;

  let cases = [
    (ADMIN_EMAIL, "wrong", StatusCode::UNAUTHORIZED, "invalid email or password"),
    ("nobody@school.test", ADMIN_PASSWORD, StatusCode::UNAUTHORIZED, "invalid email or password"),
    ("gone@school.test", "pw", StatusCode::FORBIDDEN, "account is not active"),
  ];
  for (email, password, expected, message) in cases {
    let (status, body) = h
      .call(
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
      )
      .await;
    assert_eq!(status, expected, "{email}");
    assert_eq!(body["error"], message);
  }
}

#[tokio::test]
async fn login_is_case_insensitive_on_email_and_logout_revokes() {
  let h = Harness::new().await;
  let token = h.login("  ADMIN@School.test ", ADMIN_PASSWORD).await;

  let (status, me) = h.call("GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["user"]["role"], "admin");
  assert_eq!(me["pages"].as_array().unwrap().len(), 9);

  let (status, _) = h.call("POST", "/auth/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = h.call("GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_requires_current_password() {
  let h = Harness::new().await;
  let token = h.admin().await;

  let (status, _) = h
    .call(
      "POST",
      "/auth/password",
      Some(&token),
      Some(json!({ "current_password": "nope", "new_password": "next" })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = h
    .call(
      "POST",
      "/auth/password",
      Some(&token),
      Some(json!({ "current_password": ADMIN_PASSWORD, "new_password": "next" })),
    )
    .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  h.login(ADMIN_EMAIL, "next").await;
}

#[tokio::test]
async fn teachers_are_kept_out_of_admin_routes() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (_, teacher) = h.teacher(&admin, "t@school.test", &[]).await;

  let (status, _) = h.call("GET", "/users", Some(&teacher), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h
    .call("POST", "/students", Some(&teacher), Some(student_body("S1", None)))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = h.call("GET", "/students", Some(&teacher), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, me) = h.call("GET", "/auth/me", Some(&teacher), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(!me["pages"].as_array().unwrap().contains(&json!("teachers")));

  let resp = h.send("GET", "/students", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
}

// ─── Teachers ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archiving_a_teacher_ends_their_session() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (teacher, token) = h.teacher(&admin, "t@school.test", &[]).await;
  let id = teacher["teacher_id"].as_str().unwrap();

  let (status, body) = h
    .call("POST", &format!("/teachers/{id}/archive"), Some(&admin), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "archived");

  let (status, _) = h.call("GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_teacher_creation_leaves_no_account() {
  let h = Harness::new().await;
  let admin = h.admin().await;

  let (status, _) = h
    .call(
      "POST",
      "/teachers",
      Some(&admin),
      Some(json!({
        "name": "Ghost",
        "email": "ghost@school.test",
        "assigned_classes": [uuid::Uuid::new_v4()]
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, users) = h.call("GET", "/users", Some(&admin), None).await;
  assert_eq!(users.as_array().unwrap().len(), 1);
  let (_, teachers) = h.call("GET", "/teachers", Some(&admin), None).await;
  assert!(teachers.as_array().unwrap().is_empty());
}

// ─── Grades ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn teachers_grade_only_their_own_subjects() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  let (teacher, token) = h.teacher(&admin, "t@school.test", &[class_id.as_str()]).await;

  let mine = h
    .create(
      &admin,
      "/subjects",
      json!({ "name": "Maths", "class_id": class_id, "teacher_id": teacher["teacher_id"] }),
    )
    .await;
  let other = h
    .create(&admin, "/subjects", json!({ "name": "Art", "class_id": class_id }))
    .await;

  let grade = |subject: &Value, marks: i64| {
    json!({
      "student_id": student_id,
      "subject_id": subject["subject_id"],
      "marks": marks,
      "term": "Term 1",
      "academic_year": 2025
    })
  };

  let (status, _) = h.call("POST", "/grades", Some(&token), Some(grade(&other, 70))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = h.call("POST", "/grades", Some(&token), Some(grade(&mine, 150))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  h.create(&token, "/grades", grade(&mine, 72)).await;
  let (status, body) = h.call("POST", "/grades", Some(&token), Some(grade(&mine, 90))).await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn subject_teacher_must_be_assigned_to_class() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let class = h.create(&admin, "/classes", json!({ "name": "4A" })).await;
  let (teacher, _) = h.teacher(&admin, "t@school.test", &[]).await;

  let (status, body) = h
    .call(
      "POST",
      "/subjects",
      Some(&admin),
      Some(json!({
        "name": "Maths",
        "class_id": class["class_id"],
        "teacher_id": teacher["teacher_id"]
      })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("not assigned"));
}

#[tokio::test]
async fn relinking_a_teacher_away_from_a_taught_class_is_refused() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let class = h.create(&admin, "/classes", json!({ "name": "4A" })).await;
  let class_id = class["class_id"].as_str().unwrap().to_owned();
  let (teacher, _) = h.teacher(&admin, "t@school.test", &[class_id.as_str()]).await;
  let teacher_uri = format!("/teachers/{}", teacher["teacher_id"].as_str().unwrap());
  h.create(
    &admin,
    "/subjects",
    json!({ "name": "Maths", "class_id": class_id, "teacher_id": teacher["teacher_id"] }),
  )
  .await;

  let (status, body) = h
    .call("PATCH", &teacher_uri, Some(&admin), Some(json!({ "assigned_classes": [] })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

  let (_, current) = h.call("GET", &teacher_uri, Some(&admin), None).await;
  assert_eq!(current["assigned_classes"], json!([class_id]));
}

// ─── Attendance ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_register_is_locked_for_teachers_but_not_admins() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  let (other_class, _) = h.class_with_student(&admin, "4B", "S2").await;
  let (_, token) = h.teacher(&admin, "t@school.test", &[class_id.as_str()]).await;

  let uri = format!("/attendance/{class_id}/2025-01-10");
  let absent = json!([{ "student_id": student_id, "status": "absent" }]);
  let present = json!([{ "student_id": student_id, "status": "present" }]);

  let (status, _) = h.call("PUT", &uri, Some(&token), Some(absent.clone())).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = h.call("PUT", &uri, Some(&token), Some(present.clone())).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = h.call("PUT", &uri, Some(&admin), Some(present)).await;
  assert_eq!(status, StatusCode::OK);
  let (_, records) = h
    .call("GET", &format!("/attendance?class_id={class_id}"), Some(&admin), None)
    .await;
  let records = records.as_array().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0]["status"], "present");

  let (status, _) = h
    .call(
      "PUT",
      &format!("/attendance/{other_class}/2025-01-10"),
      Some(&token),
      Some(json!([])),
    )
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn simultaneous_teacher_registers_save_only_once() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  let (_, token) = h.teacher(&admin, "t@school.test", &[class_id.as_str()]).await;

  let uri = format!("/attendance/{class_id}/2025-01-10");
  let absent = json!([{ "student_id": student_id, "status": "absent" }]);
  let present = json!([{ "student_id": student_id, "status": "present" }]);

  let ((first, _), (second, _)) = tokio::join!(
    h.call("PUT", &uri, Some(&token), Some(absent)),
    h.call("PUT", &uri, Some(&token), Some(present)),
  );
  let mut statuses = [first, second];
  statuses.sort();
  assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

  let (_, records) = h
    .call("GET", &format!("/attendance?class_id={class_id}"), Some(&admin), None)
    .await;
  assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn register_rejects_students_from_other_classes() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, _) = h.class_with_student(&admin, "4A", "S1").await;
  let (_, outsider) = h.class_with_student(&admin, "4B", "S2").await;

  let (status, _) = h
    .call(
      "PUT",
      &format!("/attendance/{class_id}/2025-01-10"),
      Some(&admin),
      Some(json!([{ "student_id": outsider }])),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Documents ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_generation_renders_and_persists() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  let maths = h
    .create(&admin, "/subjects", json!({ "name": "Maths", "class_id": class_id }))
    .await;
  h.create(
    &admin,
    "/grades",
    json!({
      "student_id": student_id,
      "subject_id": maths["subject_id"],
      "marks": 85,
      "term": "Term 1",
      "academic_year": 2025
    }),
  )
  .await;
  h.create(
    &admin,
    "/templates",
    json!({
      "kind": "report",
      "name": "Standard",
      "content": "{{StudentName}} <{{Class}}> {{GradesTable}}Avg {{Average}} {{Mystery}} {{TeacherComment}}"
    }),
  )
  .await;

  let (status, doc) = h
    .call(
      "POST",
      "/documents/report",
      Some(&admin),
      Some(json!({ "student_id": student_id, "term": "Term 1" })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(
    doc["content"],
    "Alan Turing <4A> Maths: 85 (A)\nAvg 85.0 {{Mystery}} No comment"
  );
  let report_id = doc["record"]["report_id"].as_str().unwrap();

  let (_, history) = h
    .call("GET", &format!("/reports?student_id={student_id}"), Some(&admin), None)
    .await;
  assert_eq!(history.as_array().unwrap().len(), 1);

  let resp = h
    .send("GET", &format!("/reports/{report_id}/print"), Some(&admin), None)
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let html = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let html = String::from_utf8(html.to_vec()).unwrap();
  assert!(html.contains("Alan Turing &lt;4A&gt;"));
}

#[tokio::test]
async fn missing_template_yields_message_and_stores_nothing() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (_, student_id) = h.class_with_student(&admin, "4A", "S1").await;

  let (status, doc) = h
    .call(
      "POST",
      "/documents/indemnity",
      Some(&admin),
      Some(json!({ "student_id": student_id })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(doc["content"], "No indemnity template found.");
  assert!(doc["template_id"].is_null());
  assert!(doc["record"].is_null());

  let (_, forms) = h.call("GET", "/indemnity-forms", Some(&admin), None).await;
  assert!(forms.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn certificate_title_defaults_to_general_excellence() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (_, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  h.create(
    &admin,
    "/templates",
    json!({ "kind": "certificate", "name": "Award", "content": "{{Subject}}: {{StudentName}}" }),
  )
  .await;

  let (status, doc) = h
    .call(
      "POST",
      "/documents/certificate",
      Some(&admin),
      Some(json!({ "student_id": student_id })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(doc["content"], "General Excellence: Alan Turing");
  assert_eq!(doc["record"]["title"], "General Excellence");
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_with_a_bad_row_persists_nothing() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  h.create(&admin, "/classes", json!({ "name": "4A" })).await;

  let good = json!({
    "student_number": "S1",
    "first_name": "Ada",
    "last_name": "Lovelace",
    "class_name": "4a",
    "parent_name": "Anne",
    "parent_phone": "555"
  });
  let bad = json!({
    "student_number": "S2",
    "first_name": "Bob",
    "last_name": "Tables",
    "class_name": "Nowhere",
    "parent_name": "Rob",
    "parent_phone": "555"
  });

  let (status, body) = h
    .call("POST", "/import/students", Some(&admin), Some(json!([good, bad])))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["rows"][0]["row"], 2);
  let (_, students) = h.call("GET", "/students", Some(&admin), None).await;
  assert!(students.as_array().unwrap().is_empty());

  let (status, body) = h
    .call("POST", "/import/students", Some(&admin), Some(json!([good])))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["imported"], 1);
}

#[tokio::test]
async fn import_templates_list_columns() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (status, body) = h
    .call("GET", "/import/teachers/template", Some(&admin), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["columns"], json!(["name", "email", "phone", "class_names"]));

  let (status, _) = h.call("GET", "/import/parents/template", Some(&admin), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Terms & dashboard ────────────────────────────────────────────────────────

#[tokio::test]
async fn activating_a_term_deactivates_the_rest() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let mut ids = Vec::new();
  for (n, start, end) in [(1, "2025-01-15", "2025-03-28"), (2, "2025-04-15", "2025-06-27")] {
    let term = h
      .create(
        &admin,
        "/terms",
        json!({
          "year": 2025,
          "term": n,
          "name": format!("Term {n}"),
          "start_date": start,
          "end_date": end
        }),
      )
      .await;
    ids.push(term["term_id"].as_str().unwrap().to_owned());
  }

  for id in &ids {
    let (status, _) = h
      .call("POST", &format!("/terms/{id}/activate"), Some(&admin), None)
      .await;
    assert_eq!(status, StatusCode::OK);
  }

  let (_, terms) = h.call("GET", "/terms?year=2025", Some(&admin), None).await;
  let active: Vec<_> = terms
    .as_array()
    .unwrap()
    .iter()
    .filter(|t| t["is_active"] == true)
    .collect();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0]["term_id"], ids[1].as_str());

  let (_, current) = h.call("GET", "/terms/active", Some(&admin), None).await;
  assert_eq!(current["name"], "Term 2");
}

#[tokio::test]
async fn dashboard_is_shaped_by_role() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, _) = h.class_with_student(&admin, "4A", "S1").await;
  h.class_with_student(&admin, "4B", "S2").await;
  let (_, token) = h.teacher(&admin, "t@school.test", &[class_id.as_str()]).await;

  let (status, board) = h.call("GET", "/dashboard", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["role"], "admin");
  assert_eq!(board["student_count"], 2);
  assert_eq!(board["teacher_count"], 1);

  let (status, board) = h.call("GET", "/dashboard", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["role"], "teacher");
  assert_eq!(board["classes"].as_array().unwrap().len(), 1);
  assert_eq!(board["students"].as_array().unwrap().len(), 1);
  assert_eq!(board["classes"][0]["teachers"], json!(["Ms Frizzle"]));
}

#[tokio::test]
async fn student_summary_groups_by_term() {
  let h = Harness::new().await;
  let admin = h.admin().await;
  let (class_id, student_id) = h.class_with_student(&admin, "4A", "S1").await;
  let maths = h
    .create(&admin, "/subjects", json!({ "name": "Maths", "class_id": class_id }))
    .await;
  for (term, marks) in [("Term 1", 70), ("Term 2", 81)] {
    h.create(
      &admin,
      "/grades",
      json!({
        "student_id": student_id,
        "subject_id": maths["subject_id"],
        "marks": marks,
        "term": term,
        "academic_year": 2025
      }),
    )
    .await;
  }

  let (status, summary) = h
    .call("GET", &format!("/students/{student_id}/summary"), Some(&admin), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(summary["terms"].as_array().unwrap().len(), 2);
  assert_eq!(summary["terms"][0]["term"], "Term 1");
  assert_eq!(summary["overall_average"], 75.5);
  assert!(summary["attendance_rate"].is_null());
  assert_eq!(summary["class"]["name"], "4A");
}
