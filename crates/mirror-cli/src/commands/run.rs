//! Run command implementation: one unit of work around a child process

use std::process::Command;

use colored::Colorize;
use mirror_core::{CycleReport, MirrorSettings, SyncCoordinator};

use crate::error::{CliError, Result};

/// Environment variable through which the child sees the local root
pub const LOCAL_ROOT_ENV: &str = "PKG_MIRROR_LOCAL_ROOT";

/// Bracket `command` with the before/after hooks and return its exit code.
///
/// Status lines go to stderr so the child's stdout stays untouched.
pub fn run_unit_of_work(settings: &MirrorSettings, command: &[String]) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        return Err(CliError::user("No command given"));
    };

    let mut coordinator = SyncCoordinator::from_driver(settings.build_driver()?);
    // Absolute, so the child may change directory; a missing root fails
    // the before phase below anyway
    let local_root = settings
        .local_root
        .canonicalize()
        .unwrap_or_else(|_| settings.local_root.clone())
        .to_native();

    let (status, report) = coordinator.run_unit_of_work(|| {
        eprintln!("{} Running {} ...", "=>".blue().bold(), program.cyan());
        Command::new(program)
            .args(args)
            .env(LOCAL_ROOT_ENV, &local_root)
            .status()
    })?;

    print_report(&report);

    let status =
        status.map_err(|e| CliError::user(format!("Failed to run '{}': {}", program, e)))?;
    // Killed by a signal: no code to forward
    Ok(status.code().unwrap_or(1))
}

fn print_report(report: &CycleReport) {
    if let Some(error) = &report.error {
        eprintln!("{} Local changes were not synchronized: {}", "!!".yellow().bold(), error);
        return;
    }

    for event in &report.events {
        if event.names.is_empty() {
            continue;
        }
        let marker = if event.success && event.failed.is_empty() {
            "OK".green().bold()
        } else {
            "!!".red().bold()
        };
        eprintln!("{} {}: {}", marker, event.kind, event.names.join(", "));
    }

    let failed: Vec<&str> = report.failed_names().collect();
    if !failed.is_empty() {
        eprintln!("{} Not replayed remotely: {}", "!!".red().bold(), failed.join(", "));
    }

    if report.fully_synchronized() {
        eprintln!("{} Remote is up to date.", "OK".green().bold());
    }
}
