//! Package Mirror CLI
//!
//! Keeps a local package directory and a remote store in sync around a
//! unit of work.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.settings, cmd),
        None => {
            println!("{} Package Mirror CLI", "pkg-mirror".green().bold());
            println!();
            println!("Run {} for available commands.", "pkg-mirror --help".cyan());
            Ok(0)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` refines the default level.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();

    tracing::debug!("Verbose mode enabled");
}

fn execute_command(args: &cli::SettingsArgs, cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Describe { json } => {
            let settings = commands::load_settings(args)?;
            commands::run_describe(&settings, json)?;
            Ok(0)
        }
        Commands::Pull => {
            let settings = commands::load_settings(args)?;
            tracing::info!("{}", settings.describe());
            commands::run_pull(&settings)?;
            Ok(0)
        }
        Commands::Run { command } => {
            let settings = commands::load_settings(args)?;
            tracing::info!("{}", settings.describe());
            commands::run_unit_of_work(&settings, &command)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "pkg-mirror",
                &mut std::io::stdout(),
            );
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_core_error_passes_through() {
        let error = crate::error::CliError::from(mirror_core::Error::SnapshotNotCaptured);
        assert_eq!(
            error.to_string(),
            mirror_core::Error::SnapshotNotCaptured.to_string()
        );
    }
}
