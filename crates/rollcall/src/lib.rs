//! `rollcall` - a local attendance register
//!
//! This library stores students, subjects, and per-session attendance marks
//! in a single `SQLite` file, and derives totals, session summaries, and CSV
//! exports from them.
//!
//! ```no_run
//! use rollcall::{AttendanceStatus, NewAttendance, Storage};
//!
//! # fn main() -> rollcall::Result<()> {
//! let mut storage = Storage::open("attendance.db")?;
//! storage.add_subject("Mathematics", "MATH101")?;
//! storage.add_student("Kasun Perera", "101", "CS-A")?;
//!
//! let marks: Vec<NewAttendance> = storage
//!     .list_students_by_class("CS-A")?
//!     .iter()
//!     .map(|s| NewAttendance::for_student(s, "2024-03-01", "Mathematics", AttendanceStatus::Present))
//!     .collect();
//! storage.save_attendance_batch(&marks)?;
//! storage.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod report;
pub mod seed;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use export::export_session_csv;
pub use logging::init_logging;
pub use model::{AttendanceRecord, AttendanceStats, AttendanceStatus, NewAttendance, Student, Subject};
pub use report::{attendance_percentage, summarize_sessions, SessionSummary};
pub use seed::seed_demo_data;
pub use storage::Storage;
