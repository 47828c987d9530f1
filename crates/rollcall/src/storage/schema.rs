//! `SQLite` schema definitions for rollcall.
//!
//! This module contains the SQL statements for creating the register tables.
//! Every statement is idempotent so the schema can be applied on each open.

/// SQL statement to create the students table.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    rollNumber TEXT UNIQUE NOT NULL,
    class TEXT NOT NULL,
    createdAt TEXT DEFAULT CURRENT_TIMESTAMP
)
";

/// SQL statement to create the subjects table.
pub const CREATE_SUBJECTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    code TEXT UNIQUE NOT NULL
)
";

/// SQL statement to create the attendance table.
///
/// Student name, roll number, subject, and class are stored on each row
/// rather than joined, so history keeps the values used when it was taken.
pub const CREATE_ATTENDANCE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    studentId INTEGER NOT NULL,
    studentName TEXT NOT NULL,
    rollNumber TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('present', 'absent')),
    date TEXT NOT NULL,
    subject TEXT NOT NULL,
    class TEXT NOT NULL,
    timestamp TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (studentId) REFERENCES students(id)
)
";

/// SQL statement to create an index on the session date.
pub const CREATE_ATTENDANCE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)
";

/// SQL statement to create an index on the student id.
pub const CREATE_ATTENDANCE_STUDENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(studentId)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STUDENTS_TABLE,
    CREATE_SUBJECTS_TABLE,
    CREATE_ATTENDANCE_TABLE,
    CREATE_ATTENDANCE_DATE_INDEX,
    CREATE_ATTENDANCE_STUDENT_INDEX,
    CREATE_METADATA_TABLE,
];
