//! autokit CLI
//!
//! Runs transfer, cipher and monitor batches against named profiles.

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use autokit_secrets::Protocol;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, ProfileAction};
use commands::{Context, Status};
use error::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }

    match run(cli) {
        Ok(Status::Clean) => ExitCode::SUCCESS,
        Ok(Status::PartialFailure) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<Status> {
    let ctx = Context::new(cli.config, cli.progress_every);
    tracing::debug!(command = ?cli.command, "Running command");
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<Status> {
    match cmd {
        Commands::Sftp { action } => commands::run_transfer(ctx, Protocol::Sftp, action),
        Commands::Ftp { action } => commands::run_transfer(ctx, Protocol::Ftp, action),
        Commands::Pgp { action } => commands::run_cipher(ctx, action),
        Commands::Monitor { path, since, log } => {
            commands::run_monitor(ctx, &path, since.as_deref(), log)
        }
        Commands::Profile {
            action: ProfileAction::Show { kind, name },
        } => commands::run_profile_show(ctx, &kind, &name),
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
    fn missing_config_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = Context::new(Some(temp.path().join("absent.toml")), 10);
        let result = execute_command(
            &ctx,
            Commands::Profile {
                action: ProfileAction::Show {
                    kind: "sftp".into(),
                    name: "Vendor".into(),
                },
            },
        );
        assert!(result.is_err());
    }
}
