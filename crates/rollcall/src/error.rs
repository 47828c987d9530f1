//! Error types for rollcall.
//!
//! Every storage, export, and configuration failure surfaces as the single
//! [`Error`] type below. Callers that need to word a user-facing message
//! (for example "roll number already taken") can ask the error what kind of
//! failure it was instead of matching on a separate error code.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database statement failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// An attendance status other than `present` or `absent`.
    #[error("invalid attendance status '{0}': expected 'present' or 'absent'")]
    InvalidStatus(String),

    /// A session date that is not an ISO `YYYY-MM-DD` calendar date.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Check if this error is a violated table constraint.
    ///
    /// This is how a duplicate roll number or subject code shows up.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::DatabaseQuery(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
