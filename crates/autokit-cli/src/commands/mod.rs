//! Command implementations

mod cipher;
mod monitor;
mod profile;
mod transfer;

pub use cipher::run_cipher;
pub use monitor::run_monitor;
pub use profile::run_profile_show;
pub use transfer::run_transfer;

use std::path::PathBuf;

use autokit_core::{BatchReport, Outcome, Settings};
use autokit_secrets::{CredentialResolver, TomlSecretStore};
use colored::Colorize;

use crate::error::{CliError, Result};

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    /// The batch completed but some files failed.
    PartialFailure,
}

/// Settings location and options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    config: Option<PathBuf>,
    progress_every: usize,
}

impl Context {
    pub fn new(config: Option<PathBuf>, progress_every: usize) -> Self {
        Self {
            config,
            progress_every,
        }
    }

    pub fn progress_every(&self) -> usize {
        self.progress_every
    }

    /// `--config` / `AUTOKIT_CONFIG`, else the per-user config directory.
    fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("autokit").join("config.toml"))
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                CliError::user("No settings file found. Pass --config or set AUTOKIT_CONFIG")
            })
    }

    pub fn settings(&self) -> Result<Settings> {
        let path = self.config_path()?;
        tracing::debug!(path = %path.display(), "Loading settings");
        Ok(Settings::load(&path)?)
    }

    pub fn resolver(&self, settings: &Settings) -> Result<CredentialResolver<TomlSecretStore>> {
        let store = TomlSecretStore::open(&settings.profile_store)?;
        Ok(CredentialResolver::new(
            store,
            settings.suppress_delimiter.as_str(),
        ))
    }
}

/// Print every outcome and the summary line.
pub fn print_report(action: &str, report: &BatchReport) -> Status {
    for record in &report.records {
        match &record.outcome {
            Outcome::Succeeded { artifact } => println!("   {} {}", "+".green(), artifact),
            Outcome::Skipped(reason) => {
                println!("   {} {} ({})", "-".dimmed(), record.file, reason)
            }
            Outcome::Suppressed => println!("   {} {} (suppressed)", "-".dimmed(), record.file),
            Outcome::Failed { error } => println!("   {} {}: {}", "!".red(), record.file, error),
        }
    }
    for pattern in &report.misses {
        println!(
            "   {} nothing matched {}",
            "?".yellow(),
            pattern.cyan()
        );
    }

    if report.has_failures() {
        println!("{} {}: {}", "ERROR".red().bold(), action, report);
        Status::PartialFailure
    } else {
        println!("{} {}: {}", "OK".green().bold(), action, report);
        Status::Clean
    }
}
