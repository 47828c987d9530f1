//! Storage layer for rollcall.
//!
//! This module provides `SQLite`-based persistent storage for the attendance
//! register: students, subjects, and the per-session attendance marks.
//! A [`Storage`] value is the only handle to the database; callers open it
//! explicitly and pass it to whatever needs it.

mod attendance;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{parse_sqlite_timestamp, Student, Subject};

/// Storage engine for the attendance register.
///
/// Every method is a single synchronous round trip to the database, except
/// [`Storage::save_attendance_batch`], which writes a whole session inside
/// one transaction.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the database, reporting any error raised while flushing.
    ///
    /// Dropping a `Storage` also closes it, but silently.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close the connection.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, source)| Error::DatabaseQuery(source))?;
        debug!("Closed database at {}", path.display());
        Ok(())
    }

    // === Students ===

    /// List every student ordered by roll number.
    ///
    /// Roll numbers compare as text, so `"10"` sorts before `"9"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_students(&self) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, rollNumber, class, createdAt
            FROM students ORDER BY rollNumber
            ",
        )?;

        let students = stmt
            .query_map([], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(students)
    }

    /// List the students of one class ordered by roll number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_students_by_class(&self, class: &str) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, rollNumber, class, createdAt
            FROM students WHERE class = ?1 ORDER BY rollNumber
            ",
        )?;

        let students = stmt
            .query_map([class], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(students)
    }

    /// Get a student by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_student(&self, id: i64) -> Result<Option<Student>> {
        let student = self
            .conn
            .query_row(
                r"
                SELECT id, name, rollNumber, class, createdAt
                FROM students WHERE id = ?1
                ",
                [id],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// Register a student and return the assigned id.
    ///
    /// The core stores whatever strings it is given; validating them is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the roll number is already registered
    /// (see [`Error::is_constraint_violation`]) or the database operation fails.
    pub fn add_student(&self, name: &str, roll_number: &str, class: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO students (name, rollNumber, class) VALUES (?1, ?2, ?3)",
            params![name, roll_number, class],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Added student {} (roll {}) with id {}", name, roll_number, id);
        Ok(id)
    }

    /// Delete a student by id.
    ///
    /// Returns `true` if a student was deleted, `false` if none had that id.
    /// Attendance rows recorded for the student are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_student(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1", [id])?;
        debug!("Deleted {} student row(s) for id {}", affected, id);
        Ok(affected > 0)
    }

    /// Count registered students.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_students(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Subjects ===

    /// List every subject ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, code FROM subjects ORDER BY name")?;

        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subjects)
    }

    /// Register a subject and return the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is already registered
    /// (see [`Error::is_constraint_violation`]) or the database operation fails.
    pub fn add_subject(&self, name: &str, code: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO subjects (name, code) VALUES (?1, ?2)",
            params![name, code],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Added subject {} ({}) with id {}", name, code, id);
        Ok(id)
    }

    /// Count registered subjects.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_subjects(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to a Student struct.
    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get(0)?,
            name: row.get(1)?,
            roll_number: row.get(2)?,
            class: row.get(3)?,
            created_at: timestamp_column(row, 4)?,
        })
    }
}

/// Read a `CURRENT_TIMESTAMP` column.
fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_sqlite_timestamp(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {text}").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("attendance.db");

        let storage = Storage::open(&path).unwrap();
        storage.add_student("Kasun Perera", "101", "CS-A").unwrap();
        storage.close().unwrap();

        assert!(path.exists());
        let reopened = Storage::open(&path).unwrap();
        let students = reopened.list_students().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].roll_number, "101");
    }

    #[test]
    fn test_delete_student_with_marks_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::open(dir.path().join("attendance.db")).unwrap();
        let id = storage.add_student("Kasun Perera", "101", "CS-A").unwrap();
        let student = storage.get_student(id).unwrap().unwrap();
        storage
            .save_attendance_batch(&[crate::model::NewAttendance::for_student(
                &student,
                "2024-03-01",
                "Mathematics",
                crate::model::AttendanceStatus::Present,
            )])
            .unwrap();

        assert!(storage.delete_student(id).unwrap());
        assert!(storage.get_student(id).unwrap().is_none());

        let rows = storage.list_attendance_by_date("2024-03-01").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, id);
    }

    #[test]
    fn test_batch_accepts_unregistered_student_id() {
        let mut storage = create_test_storage();
        let mark = crate::model::NewAttendance {
            student_id: 999,
            student_name: "Walk-in".to_string(),
            roll_number: "999".to_string(),
            status: crate::model::AttendanceStatus::Absent,
            date: "2024-03-01".to_string(),
            subject: "Mathematics".to_string(),
            class: "CS-A".to_string(),
        };

        assert_eq!(storage.save_attendance_batch(&[mark]).unwrap(), 1);
        assert_eq!(storage.count_attendance().unwrap(), 1);
    }

    #[test]
    fn test_add_and_list_student() {
        let storage = create_test_storage();
        let id = storage.add_student("Kasun Perera", "101", "CS-A").unwrap();

        let students = storage.list_students().unwrap();
        let matching: Vec<_> = students.iter().filter(|s| s.roll_number == "101").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, id);
        assert_eq!(matching[0].name, "Kasun Perera");
        assert_eq!(matching[0].class, "CS-A");
    }

    #[test]
    fn test_duplicate_roll_number_rejected() {
        let storage = create_test_storage();
        storage.add_student("Kasun Perera", "101", "CS-A").unwrap();

        let err = storage
            .add_student("Someone Else", "101", "CS-B")
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(storage.count_students().unwrap(), 1);
    }

    #[test]
    fn test_students_ordered_by_roll_number_as_text() {
        let storage = create_test_storage();
        storage.add_student("C", "9", "CS-A").unwrap();
        storage.add_student("A", "101", "CS-A").unwrap();
        storage.add_student("B", "10", "CS-A").unwrap();

        let rolls: Vec<String> = storage
            .list_students()
            .unwrap()
            .into_iter()
            .map(|s| s.roll_number)
            .collect();
        assert_eq!(rolls, vec!["10", "101", "9"]);
    }

    #[test]
    fn test_list_students_by_class() {
        let storage = create_test_storage();
        storage.add_student("B", "104", "CS-A").unwrap();
        storage.add_student("C", "106", "CS-B").unwrap();
        storage.add_student("A", "102", "CS-A").unwrap();

        let cs_a = storage.list_students_by_class("CS-A").unwrap();
        assert_eq!(cs_a.len(), 2);
        assert!(cs_a.iter().all(|s| s.class == "CS-A"));
        assert_eq!(cs_a[0].roll_number, "102");
        assert_eq!(cs_a[1].roll_number, "104");

        assert!(storage.list_students_by_class("cs-a").unwrap().is_empty());
    }

    #[test]
    fn test_get_student() {
        let storage = create_test_storage();
        let id = storage.add_student("Kasun Perera", "101", "CS-A").unwrap();

        let student = storage.get_student(id).unwrap().unwrap();
        assert_eq!(student.name, "Kasun Perera");
        assert!(storage.get_student(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_delete_student() {
        let storage = create_test_storage();
        let id = storage.add_student("Kasun Perera", "101", "CS-A").unwrap();

        assert!(storage.delete_student(id).unwrap());
        assert!(storage.list_students().unwrap().is_empty());
    }

    #[test]
    fn test_delete_nonexistent_student() {
        let storage = create_test_storage();
        assert!(!storage.delete_student(99999).unwrap());
    }

    #[test]
    fn test_add_and_list_subjects_ordered_by_name() {
        let storage = create_test_storage();
        storage.add_subject("Physics", "PHY101").unwrap();
        storage.add_subject("Chemistry", "CHEM101").unwrap();
        storage.add_subject("Mathematics", "MATH101").unwrap();

        let names: Vec<String> = storage
            .list_subjects()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Chemistry", "Mathematics", "Physics"]);
        assert_eq!(storage.count_subjects().unwrap(), 3);
    }

    #[test]
    fn test_duplicate_subject_code_rejected() {
        let storage = create_test_storage();
        storage.add_subject("Mathematics", "MATH101").unwrap();

        let err = storage.add_subject("Maths Again", "MATH101").unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(storage.count_subjects().unwrap(), 1);
    }

    #[test]
    fn test_created_at_is_assigned() {
        let storage = create_test_storage();
        let before = Utc::now() - chrono::Duration::seconds(2);
        let id = storage.add_student("Kasun Perera", "101", "CS-A").unwrap();

        let student = storage.get_student(id).unwrap().unwrap();
        assert!(student.created_at >= before);
    }

    #[test]
    fn test_close_in_memory() {
        let storage = create_test_storage();
        assert!(storage.close().is_ok());
    }
}
