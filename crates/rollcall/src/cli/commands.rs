//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::error::{Error, Result};

/// Parse a session date given as `YYYY-MM-DD`.
///
/// The date is returned zero-padded so stored dates always sort as text.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if `s` is not a calendar date.
pub fn parse_iso_date(s: &str) -> Result<String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Student management commands.
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Register a student
    Add {
        /// Student name
        name: String,
        /// Unique roll number
        roll_number: String,
        /// Class label, e.g. CS-A
        class: String,
    },

    /// List students by roll number
    List {
        /// Only students of this class
        #[arg(long)]
        class: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Remove a student (recorded attendance is kept)
    Delete {
        /// Student id as shown by `student list`
        id: i64,
    },
}

/// Subject management commands.
#[derive(Debug, Subcommand)]
pub enum SubjectCommand {
    /// Register a subject
    Add {
        /// Subject name
        name: String,
        /// Unique subject code, e.g. MATH101
        code: String,
    },

    /// List subjects by name
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Mark command arguments.
///
/// Every student of the class is marked present except the roll numbers
/// passed to `--absent`.
#[derive(Debug, Args)]
pub struct MarkCommand {
    /// Session date (defaults to today's local date)
    #[arg(short, long, value_parser = parse_iso_date)]
    pub date: Option<String>,

    /// Subject name
    #[arg(short, long)]
    pub subject: String,

    /// Class label
    #[arg(long)]
    pub class: String,

    /// Roll numbers to mark absent
    #[arg(short, long, value_delimiter = ',')]
    pub absent: Vec<String>,

    /// Record the session even if it was already marked
    #[arg(short, long)]
    pub force: bool,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Only sessions whose date contains this text (e.g. 2024-03)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Only sessions for this subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// List individual marks instead of per-session totals
    #[arg(short, long)]
    pub records: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// First session date to include
    #[arg(short, long, value_parser = parse_iso_date)]
    pub from: String,

    /// Last session date to include
    #[arg(short, long, value_parser = parse_iso_date)]
    pub to: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Session date
    #[arg(short, long, value_parser = parse_iso_date)]
    pub date: String,

    /// Subject name
    #[arg(short, long)]
    pub subject: String,

    /// Write to this file, or into this directory under the default name
    /// (prints to stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
