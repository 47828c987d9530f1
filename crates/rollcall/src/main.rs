//! `rollcall` - CLI for the attendance register
//!
//! This binary opens the register named by the configuration and runs one
//! command against it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use chrono::Local;
use clap::Parser;
use tracing::warn;

use rollcall::cli::{
    Cli, Command, ConfigCommand, ExportCommand, HistoryCommand, MarkCommand, StatsCommand,
    StudentCommand, SubjectCommand,
};
use rollcall::export::export_filename;
use rollcall::{
    attendance_percentage, export_session_csv, init_logging, seed_demo_data, summarize_sessions,
    AttendanceRecord, AttendanceStatus, Config, NewAttendance, Storage,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Student(cmd) => with_storage(&config, |storage| handle_student(storage, cmd)),
        Command::Subject(cmd) => with_storage(&config, |storage| handle_subject(storage, cmd)),
        Command::Mark(cmd) => with_storage(&config, |storage| handle_mark(storage, &cmd)),
        Command::History(cmd) => with_storage(&config, |storage| handle_history(storage, &cmd)),
        Command::Stats(cmd) => with_storage(&config, |storage| handle_stats(storage, &cmd)),
        Command::Export(cmd) => {
            with_storage(&config, |storage| handle_export(storage, &config, cmd))
        }
        Command::Status(cmd) => with_storage(&config, |storage| handle_status(storage, cmd.json)),
        Command::Seed => with_storage(&config, |storage| handle_seed(storage)),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open the register, seed it if configured, run `f`, then close it.
///
/// An error from `f` takes precedence over a failure to close.
fn with_storage<F>(config: &Config, f: F) -> CliResult
where
    F: FnOnce(&mut Storage) -> CliResult,
{
    let mut storage = Storage::open(config.database_path())?;
    if config.seed.on_startup {
        seed_demo_data(&storage)?;
    }

    let result = f(&mut storage);
    match storage.close() {
        Ok(()) => result,
        Err(err) if result.is_err() => {
            warn!("Failed to close database: {err}");
            result
        }
        Err(err) => Err(err.into()),
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn handle_student(storage: &Storage, cmd: StudentCommand) -> CliResult {
    match cmd {
        StudentCommand::Add {
            name,
            roll_number,
            class,
        } => match storage.add_student(&name, &roll_number, &class) {
            Ok(id) => println!("Added {name} (roll {roll_number}, {class}) with id {id}"),
            Err(err) if err.is_constraint_violation() => {
                return Err(format!(
                    "roll number {roll_number} is already registered; try a different value"
                )
                .into());
            }
            Err(err) => return Err(err.into()),
        },
        StudentCommand::List { class, json } => {
            let students = match class.as_deref() {
                Some(class) => storage.list_students_by_class(class)?,
                None => storage.list_students()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&students)?);
            } else if students.is_empty() {
                println!("No students found.");
            } else {
                println!("{:<6} {:<10} {:<8} NAME", "ID", "ROLL", "CLASS");
                for student in &students {
                    println!(
                        "{:<6} {:<10} {:<8} {}",
                        student.id, student.roll_number, student.class, student.name
                    );
                }
            }
        }
        StudentCommand::Delete { id } => {
            if storage.delete_student(id)? {
                println!("Deleted student {id}. Their attendance records are kept.");
            } else {
                println!("No student with id {id}.");
            }
        }
    }
    Ok(())
}

fn handle_subject(storage: &Storage, cmd: SubjectCommand) -> CliResult {
    match cmd {
        SubjectCommand::Add { name, code } => match storage.add_subject(&name, &code) {
            Ok(id) => println!("Added subject {name} ({code}) with id {id}"),
            Err(err) if err.is_constraint_violation() => {
                return Err(
                    format!("subject code {code} is already registered; try a different value")
                        .into(),
                );
            }
            Err(err) => return Err(err.into()),
        },
        SubjectCommand::List { json } => {
            let subjects = storage.list_subjects()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&subjects)?);
            } else if subjects.is_empty() {
                println!("No subjects found.");
            } else {
                println!("{:<6} {:<10} NAME", "ID", "CODE");
                for subject in &subjects {
                    println!("{:<6} {:<10} {}", subject.id, subject.code, subject.name);
                }
            }
        }
    }
    Ok(())
}

fn handle_mark(storage: &mut Storage, cmd: &MarkCommand) -> CliResult {
    let date = cmd
        .date
        .clone()
        .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

    if !storage
        .list_subjects()?
        .iter()
        .any(|subject| subject.name == cmd.subject)
    {
        return Err(format!(
            "unknown subject '{}'; add it with `rollcall subject add`",
            cmd.subject
        )
        .into());
    }

    let students = storage.list_students_by_class(&cmd.class)?;
    if students.is_empty() {
        return Err(format!("no students registered in class '{}'", cmd.class).into());
    }

    let unknown: Vec<&str> = cmd
        .absent
        .iter()
        .filter(|roll| !students.iter().any(|s| &s.roll_number == *roll))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(format!(
            "roll number(s) not in class {}: {}",
            cmd.class,
            unknown.join(", ")
        )
        .into());
    }

    if !cmd.force && storage.session_exists(&date, &cmd.subject, &cmd.class)? {
        return Err(format!(
            "attendance for {} in {} on {date} is already recorded; use --force to record it again",
            cmd.subject, cmd.class
        )
        .into());
    }

    let marks: Vec<NewAttendance> = students
        .iter()
        .map(|student| {
            let status = if cmd.absent.contains(&student.roll_number) {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            NewAttendance::for_student(student, date.as_str(), cmd.subject.as_str(), status)
        })
        .collect();

    let saved = storage.save_attendance_batch(&marks)?;
    let absent = marks
        .iter()
        .filter(|m| m.status == AttendanceStatus::Absent)
        .count();
    let present = saved - absent;
    println!(
        "Saved {saved} marks for {} {} on {date}: {present} present, {absent} absent ({}%)",
        cmd.class,
        cmd.subject,
        attendance_percentage(to_i64(present), to_i64(saved))
    );
    Ok(())
}

fn handle_history(storage: &Storage, cmd: &HistoryCommand) -> CliResult {
    let records: Vec<AttendanceRecord> = storage
        .list_all_attendance()?
        .into_iter()
        .filter(|r| cmd.date.as_deref().map_or(true, |d| r.date.contains(d)))
        .filter(|r| cmd.subject.as_deref().map_or(true, |s| r.subject == s))
        .collect();

    if cmd.records {
        if cmd.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else if records.is_empty() {
            println!("No attendance records found.");
        } else {
            println!(
                "{:<10} {:<18} {:<8} {:<8} {:<8} NAME",
                "DATE", "SUBJECT", "CLASS", "ROLL", "STATUS"
            );
            for r in &records {
                println!(
                    "{:<10} {:<18} {:<8} {:<8} {:<8} {}",
                    r.date, r.subject, r.class, r.roll_number, r.status, r.student_name
                );
            }
        }
        return Ok(());
    }

    let sessions = summarize_sessions(&records);
    if cmd.json {
        let rows: Vec<serde_json::Value> = sessions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "date": s.date,
                    "subject": s.subject,
                    "class": s.class,
                    "present": s.present,
                    "absent": s.absent,
                    "percentage": s.percentage(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if sessions.is_empty() {
        println!("No attendance records found.");
    } else {
        println!(
            "{:<10} {:<18} {:<8} {:>7} {:>6} {:>5}",
            "DATE", "SUBJECT", "CLASS", "PRESENT", "ABSENT", "RATE"
        );
        for s in &sessions {
            println!(
                "{:<10} {:<18} {:<8} {:>7} {:>6} {:>4}%",
                s.date,
                s.subject,
                s.class,
                s.present,
                s.absent,
                s.percentage()
            );
        }
    }
    Ok(())
}

fn handle_stats(storage: &Storage, cmd: &StatsCommand) -> CliResult {
    let stats = storage.attendance_stats(&cmd.from, &cmd.to)?;
    if cmd.json {
        let value = serde_json::json!({
            "from": cmd.from,
            "to": cmd.to,
            "total_present": stats.total_present,
            "total_absent": stats.total_absent,
            "total": stats.total(),
            "percentage": stats.percentage(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Attendance {} to {}", cmd.from, cmd.to);
        println!("  Present:    {}", stats.total_present);
        println!("  Absent:     {}", stats.total_absent);
        println!("  Attendance: {}%", stats.percentage());
    }
    Ok(())
}

fn handle_export(storage: &Storage, config: &Config, cmd: ExportCommand) -> CliResult {
    let csv = export_session_csv(storage, &cmd.date, &cmd.subject, &config.export)?;

    match cmd.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(export_filename(&cmd.date, &cmd.subject))
            } else {
                path
            };
            std::fs::write(&path, &csv)?;
            println!(
                "Exported {} record(s) to {}",
                csv.lines().count().saturating_sub(1),
                path.display()
            );
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn handle_status(storage: &Storage, json: bool) -> CliResult {
    let students = storage.count_students()?;
    let subjects = storage.count_subjects()?;
    let records = storage.count_attendance()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "students": students,
            "subjects": subjects,
            "attendance_records": records,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("rollcall status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Students:      {students}");
        println!("Subjects:      {subjects}");
        println!("Marks:         {records}");
    }
    Ok(())
}

fn handle_seed(storage: &Storage) -> CliResult {
    let report = seed_demo_data(storage)?;
    if report.is_empty() {
        println!("Students and subjects already present; nothing seeded.");
    } else {
        println!(
            "Seeded {} students and {} subjects.",
            report.students, report.subjects
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Seed]");
                println!("  On startup:         {}", config.seed.on_startup);
                println!();
                println!("[Export]");
                println!("  Time format:        {}", config.export.time_format);
                println!("  Local time:         {}", config.export.local_time);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
