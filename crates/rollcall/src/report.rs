//! Derived attendance figures.
//!
//! Nothing here touches the database: these functions work on counts and
//! on records already fetched through [`crate::Storage`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus};

/// Percentage of `present` out of `total`, rounded to the nearest whole number.
///
/// A `total` of zero yields 0. The result is not capped: more present
/// marks than `total` gives a value above 100.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn attendance_percentage(present: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let ratio = present as f64 / total as f64;
    (ratio * 100.0).round() as u32
}

/// Present/absent counts for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session date.
    pub date: String,
    /// Subject name.
    pub subject: String,
    /// Class label.
    pub class: String,
    /// Number of `present` marks.
    pub present: i64,
    /// Number of `absent` marks.
    pub absent: i64,
}

impl SessionSummary {
    /// Total marks in the session.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.present + self.absent
    }

    /// Share of present marks, rounded to a whole percent.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        attendance_percentage(self.present, self.total())
    }
}

/// Group attendance records into sessions.
///
/// Sessions are returned newest date first, then by subject and class.
#[must_use]
pub fn summarize_sessions(records: &[AttendanceRecord]) -> Vec<SessionSummary> {
    let mut sessions: BTreeMap<(&str, &str, &str), (i64, i64)> = BTreeMap::new();

    for record in records {
        let counts = sessions
            .entry((record.date.as_str(), record.subject.as_str(), record.class.as_str()))
            .or_default();
        match record.status {
            AttendanceStatus::Present => counts.0 += 1,
            AttendanceStatus::Absent => counts.1 += 1,
        }
    }

    let mut summaries: Vec<SessionSummary> = sessions
        .into_iter()
        .map(|((date, subject, class), (present, absent))| SessionSummary {
            date: date.to_string(),
            subject: subject.to_string(),
            class: class.to_string(),
            present,
            absent,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.subject.cmp(&b.subject))
            .then_with(|| a.class.cmp(&b.class))
    });
    summaries
}
