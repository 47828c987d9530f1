//! Core record types for rollcall.
//!
//! This module defines the students, subjects, and attendance rows that the
//! storage layer persists and the report/export layers consume.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Text layout `SQLite` uses for `CURRENT_TIMESTAMP`.
pub(crate) const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `CURRENT_TIMESTAMP` value as a UTC instant.
pub(crate) fn parse_sqlite_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, SQLITE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Row id assigned by storage.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique human-facing identifier.
    pub roll_number: String,
    /// Cohort label, e.g. `CS-A`.
    pub class: String,
    /// When the student was registered.
    pub created_at: DateTime<Utc>,
}

/// A subject attendance can be taken for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Row id assigned by storage.
    pub id: i64,
    /// Display name. Attendance rows refer to subjects by this name.
    pub name: String,
    /// Unique subject code, e.g. `MATH101`.
    pub code: String,
}

/// Whether a student attended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// The student attended.
    #[default]
    Present,
    /// The student did not attend.
    Absent,
}

impl AttendanceStatus {
    /// The stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// An attendance mark that has not been stored yet.
///
/// Student name, roll number, and class are copied onto the mark so the
/// record keeps the values in force when attendance was taken, even if the
/// student is later renamed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendance {
    /// Id of the student this mark belongs to.
    pub student_id: i64,
    /// Student name at recording time.
    pub student_name: String,
    /// Roll number at recording time.
    pub roll_number: String,
    /// Present or absent.
    pub status: AttendanceStatus,
    /// Session date (`YYYY-MM-DD`), not the insert date.
    pub date: String,
    /// Subject name.
    pub subject: String,
    /// Class label.
    pub class: String,
}

impl NewAttendance {
    /// Build a mark for `student` in the session on `date` for `subject`.
    #[must_use]
    pub fn for_student(
        student: &Student,
        date: impl Into<String>,
        subject: impl Into<String>,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            student_id: student.id,
            student_name: student.name.clone(),
            roll_number: student.roll_number.clone(),
            status,
            date: date.into(),
            subject: subject.into(),
            class: student.class.clone(),
        }
    }
}

/// A stored attendance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Row id assigned by storage.
    pub id: i64,
    /// Id of the student this mark belongs to.
    pub student_id: i64,
    /// Student name at recording time.
    pub student_name: String,
    /// Roll number at recording time.
    pub roll_number: String,
    /// Present or absent.
    pub status: AttendanceStatus,
    /// Session date.
    pub date: String,
    /// Subject name.
    pub subject: String,
    /// Class label.
    pub class: String,
    /// When the row was inserted.
    pub timestamp: DateTime<Utc>,
}

/// Present/absent totals over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Number of `present` marks.
    pub total_present: i64,
    /// Number of `absent` marks.
    pub total_absent: i64,
}

impl AttendanceStats {
    /// Total marks counted.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.total_present + self.total_absent
    }

    /// Share of present marks, rounded to a whole percent.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        crate::report::attendance_percentage(self.total_present, self.total())
    }
}
