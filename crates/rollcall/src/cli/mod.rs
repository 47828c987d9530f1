//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_iso_date, ConfigCommand, ExportCommand, HistoryCommand, MarkCommand, StatsCommand,
    StatusCommand, StudentCommand, SubjectCommand,
};

/// rollcall - Keep a class attendance register
///
/// Register students and subjects, mark who attended each class session,
/// and review or export the record.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),

    /// Manage subjects
    #[command(subcommand)]
    Subject(SubjectCommand),

    /// Mark attendance for one class session
    Mark(MarkCommand),

    /// Show recorded sessions
    History(HistoryCommand),

    /// Count present and absent marks over a date range
    Stats(StatsCommand),

    /// Export one session as CSV
    Export(ExportCommand),

    /// Show register totals
    Status(StatusCommand),

    /// Load demo students and subjects into empty tables
    Seed,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
