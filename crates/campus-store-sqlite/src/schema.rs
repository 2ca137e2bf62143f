//! SQL schema for the Campus SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,              -- 'admin' | 'teacher'
    email         TEXT NOT NULL UNIQUE,       -- normalised lowercase
    password_hash TEXT NOT NULL,              -- argon2 PHC string
    status        TEXT NOT NULL DEFAULT 'active',
    created_at    TEXT NOT NULL
);

-- Only a digest of the bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classes (
    class_id TEXT PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

-- Teacher profile; name, email and status live on the user row.
CREATE TABLE IF NOT EXISTS teachers (
    teacher_id      TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    phone           TEXT,
    signature_image TEXT
);

CREATE TABLE IF NOT EXISTS teacher_classes (
    teacher_id TEXT    NOT NULL REFERENCES teachers(teacher_id) ON DELETE CASCADE,
    class_id   TEXT    NOT NULL REFERENCES classes(class_id)   ON DELETE CASCADE,
    position   INTEGER NOT NULL,
    PRIMARY KEY (teacher_id, class_id)
);

CREATE TABLE IF NOT EXISTS students (
    student_id       TEXT PRIMARY KEY,
    student_number   TEXT NOT NULL UNIQUE,
    first_name       TEXT NOT NULL,
    last_name        TEXT NOT NULL,
    class_id         TEXT REFERENCES classes(class_id) ON DELETE SET NULL,
    dob              TEXT,                    -- YYYY-MM-DD
    gender           TEXT NOT NULL DEFAULT '',
    address          TEXT NOT NULL DEFAULT '',
    allergies        TEXT,
    medical_notes    TEXT,
    parent_contact   TEXT NOT NULL,           -- JSON contact
    guardian_contact TEXT,                    -- JSON contact or NULL
    status           TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    class_id   TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    teacher_id TEXT REFERENCES teachers(teacher_id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS grades (
    grade_id      TEXT    PRIMARY KEY,
    student_id    TEXT    NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    subject_id    TEXT    NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    marks         INTEGER NOT NULL CHECK (marks BETWEEN 0 AND 100),
    term          TEXT    NOT NULL,
    academic_year INTEGER NOT NULL,
    comment       TEXT,
    UNIQUE (student_id, subject_id, term, academic_year)
);

CREATE TABLE IF NOT EXISTS attendance (
    attendance_id TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    class_id      TEXT NOT NULL REFERENCES classes(class_id)   ON DELETE CASCADE,
    date          TEXT NOT NULL,              -- YYYY-MM-DD
    status        TEXT NOT NULL,              -- present | absent | late | excused
    comment       TEXT,
    UNIQUE (student_id, class_id, date)
);

-- Listed in rowid order: the first template of a kind is the default.
CREATE TABLE IF NOT EXISTS templates (
    template_id TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,                -- report | certificate | indemnity
    name        TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_by  TEXT REFERENCES users(user_id) ON DELETE SET NULL
);

-- Generated documents are snapshots. template_id and generated_by are kept
-- without foreign keys so deleting a template or user preserves history.
CREATE TABLE IF NOT EXISTS term_reports (
    report_id    TEXT PRIMARY KEY,
    student_id   TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    class_id     TEXT,
    term         TEXT NOT NULL,
    template_id  TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    generated_by TEXT NOT NULL,
    content      TEXT NOT NULL,
    comments     TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS indemnity_forms (
    form_id      TEXT PRIMARY KEY,
    student_id   TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    template_id  TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    content      TEXT NOT NULL,
    signed_by    TEXT
);

CREATE TABLE IF NOT EXISTS certificates (
    certificate_id TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    title          TEXT NOT NULL,
    template_id    TEXT NOT NULL,
    generated_at   TEXT NOT NULL,
    content        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS academic_terms (
    term_id    TEXT    PRIMARY KEY,
    year       INTEGER NOT NULL,
    term       INTEGER NOT NULL CHECK (term >= 1),
    name       TEXT    NOT NULL,
    start_date TEXT    NOT NULL,
    end_date   TEXT    NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 0,
    UNIQUE (year, term)
);

-- At most one active term.
CREATE UNIQUE INDEX IF NOT EXISTS academic_terms_active_idx
    ON academic_terms(is_active) WHERE is_active = 1;

CREATE INDEX IF NOT EXISTS students_class_idx     ON students(class_id);
CREATE INDEX IF NOT EXISTS subjects_class_idx     ON subjects(class_id);
CREATE INDEX IF NOT EXISTS grades_student_idx     ON grades(student_id);
CREATE INDEX IF NOT EXISTS attendance_class_idx   ON attendance(class_id, date);
CREATE INDEX IF NOT EXISTS attendance_student_idx ON attendance(student_id);
CREATE INDEX IF NOT EXISTS reports_student_idx    ON term_reports(student_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);
CREATE INDEX IF NOT EXISTS sessions_expiry_idx    ON sessions(expires_at);

PRAGMA user_version = 1;
";
