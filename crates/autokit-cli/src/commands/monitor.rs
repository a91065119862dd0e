//! monitor command

use std::path::Path;

use autokit_core::DirectoryMonitor;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use colored::Colorize;

use super::{Context, Status};
use crate::error::{CliError, Result};

const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run_monitor(ctx: &Context, path: &Path, since: Option<&str>, log: bool) -> Result<Status> {
    let settings = ctx.settings()?;
    let mut monitor = DirectoryMonitor::open(&settings, path)?;
    if let Some(since) = since {
        monitor.set_review_time(parse_since(since)?);
    }

    let reviewed = monitor.review_time();
    let modified = monitor.modified_files(log)?;
    if modified.is_empty() {
        println!(
            "{} No changes in {} since {}",
            "OK".green().bold(),
            path.display(),
            reviewed.with_timezone(&Local).format(SINCE_FORMAT)
        );
    } else {
        for name in &modified {
            println!("{name}");
        }
    }
    Ok(Status::Clean)
}

/// Parse a local `YYYY-mm-dd HH:MM:SS` timestamp.
fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), SINCE_FORMAT).map_err(|e| {
        CliError::user(format!(
            "Invalid --since '{value}': {e} (expected YYYY-mm-dd HH:MM:SS)"
        ))
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CliError::user(format!("--since '{value}' does not exist in local time")))
}
