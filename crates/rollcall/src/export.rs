//! CSV export of a single attendance session.
//!
//! The export is returned as a string; writing it to a file, the clipboard,
//! or a share sheet is up to the caller.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::model::AttendanceRecord;
use crate::storage::Storage;

/// Header row of every export.
pub const CSV_HEADER: &str = "Roll Number,Student Name,Status,Date,Time,Subject";

/// Check that `format` is a usable strftime pattern.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] if the pattern is empty or malformed.
pub fn validate_time_format(format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(Error::ConfigValidation {
            message: "export time_format must not be empty".to_string(),
        });
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::ConfigValidation {
            message: format!("invalid export time_format: {format}"),
        });
    }
    Ok(())
}

/// Export the marks for `date` and `subject` as CSV.
///
/// Produces the header line followed by one line per record in roll number
/// order, each terminated by `\n`. A session with no marks yields only the
/// header line.
///
/// # Errors
///
/// Returns an error if the time format is invalid or the query fails.
pub fn export_session_csv(
    storage: &Storage,
    date: &str,
    subject: &str,
    options: &ExportConfig,
) -> Result<String> {
    validate_time_format(&options.time_format)?;

    let records = storage.list_attendance_by_date_and_subject(date, subject)?;
    debug!(
        "Exporting {} record(s) for {} on {}",
        records.len(),
        subject,
        date
    );
    Ok(render_csv(&records, options))
}

/// Suggested file name for an export, e.g. `Attendance_2024-03-01_Mathematics.csv`.
#[must_use]
pub fn export_filename(date: &str, subject: &str) -> String {
    let subject: String = subject
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("Attendance_{date}_{subject}.csv")
}

/// Render records with the export header. `options.time_format` must be valid.
fn render_csv(records: &[AttendanceRecord], options: &ExportConfig) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 64);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for record in records {
        let time = format_time(record.timestamp, options);
        let fields = [
            record.roll_number.as_str(),
            record.student_name.as_str(),
            record.status.as_str(),
            record.date.as_str(),
            time.as_str(),
            record.subject.as_str(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_quote(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }

    csv
}

/// Render a stored timestamp as a time of day.
fn format_time(timestamp: DateTime<Utc>, options: &ExportConfig) -> String {
    let mut out = String::new();
    // Writing to a String only fails on a bad pattern, which callers validate.
    let _ = if options.local_time {
        write!(
            out,
            "{}",
            timestamp.with_timezone(&Local).format(&options.time_format)
        )
    } else {
        write!(out, "{}", timestamp.format(&options.time_format))
    };
    out
}

/// Quote a CSV field when it holds a delimiter, quote, or line break.
fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
