//! Demo data for a fresh register.
//!
//! The demo students and subjects are loaded only into empty tables, so
//! running the loader on every start never duplicates or overwrites
//! anything a user has entered.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::Storage;

/// Demo students as `(name, roll number, class)`.
pub const DEMO_STUDENTS: &[(&str, &str, &str)] = &[
    ("Kasun Perera", "101", "CS-A"),
    ("Tharushi Silva", "102", "CS-A"),
    ("Nuwan Bandara", "103", "CS-A"),
    ("Sanduni Fernando", "104", "CS-A"),
    ("Lahiru Gamage", "105", "CS-A"),
    ("Chamari Jayasinghe", "106", "CS-B"),
    ("Ruwan Karunaratne", "107", "CS-B"),
    ("Nethmi Rajapaksa", "108", "CS-B"),
    ("Dinesh Weerasinghe", "109", "CS-B"),
    ("Hasini Ekanayake", "110", "CS-B"),
];

/// Demo subjects as `(name, code)`.
pub const DEMO_SUBJECTS: &[(&str, &str)] = &[
    ("Mathematics", "MATH101"),
    ("Computer Science", "CS101"),
    ("Physics", "PHY101"),
    ("Chemistry", "CHEM101"),
    ("English", "ENG101"),
];

/// What a seeding pass inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeedReport {
    /// Students inserted.
    pub students: usize,
    /// Subjects inserted.
    pub subjects: usize,
}

impl SeedReport {
    /// Whether nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.students == 0 && self.subjects == 0
    }
}

/// Load the demo students and subjects into empty tables.
///
/// Each table is seeded only if it holds no rows. A demo row that is
/// rejected (for example a duplicate key) is logged and skipped.
///
/// # Errors
///
/// Returns an error if the tables cannot be counted.
pub fn seed_demo_data(storage: &Storage) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if storage.count_students()? == 0 {
        for (name, roll_number, class) in DEMO_STUDENTS {
            match storage.add_student(name, roll_number, class) {
                Ok(_) => report.students += 1,
                Err(err) => warn!("Skipping demo student {}: {}", roll_number, err),
            }
        }
        info!("Seeded {} demo students", report.students);
    }

    if storage.count_subjects()? == 0 {
        for (name, code) in DEMO_SUBJECTS {
            match storage.add_subject(name, code) {
                Ok(_) => report.subjects += 1,
                Err(err) => warn!("Skipping demo subject {}: {}", code, err),
            }
        }
        info!("Seeded {} demo subjects", report.subjects);
    }

    Ok(report)
}
