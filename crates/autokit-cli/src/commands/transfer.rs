//! sftp / ftp commands

use std::time::Duration;

#[cfg(any(feature = "sftp", feature = "ftp"))]
use autokit_core::RetryPolicy;
use autokit_core::{LocalBackend, Progress, TransferBackend, TransferRequest, TransferSession};
use autokit_secrets::{Protocol, TransferProfile};
use colored::Colorize;

use super::{Context, Status, print_report};
use crate::cli::{Selectors, Target, TransferAction};
use crate::error::{CliError, Result};

#[cfg_attr(not(feature = "sftp"), allow(dead_code))]
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run_transfer(ctx: &Context, protocol: Protocol, action: TransferAction) -> Result<Status> {
    let settings = ctx.settings()?;
    let target = match &action {
        TransferAction::List { target, .. }
        | TransferAction::Download { target, .. }
        | TransferAction::Upload { target, .. } => target.clone(),
    };
    let profile = ctx
        .resolver(&settings)?
        .resolve_transfer(protocol, &target.profile)?;

    let backend = open_backend(&profile, &target)?;
    let mut session =
        TransferSession::new(profile, settings, backend).with_progress_every(ctx.progress_every());

    match action {
        TransferAction::List { remote_dir, .. } => {
            let mut entries = session.list(remote_dir.as_deref())?;
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            for entry in entries {
                if entry.is_dir {
                    println!("{}", format!("{}/", entry.name).cyan());
                } else {
                    println!("{}", entry.name);
                }
            }
            Ok(Status::Clean)
        }
        TransferAction::Download {
            selectors,
            remote_dir,
            local_dir,
            keep_remote,
            ..
        } => {
            let request = request(selectors, remote_dir, local_dir).cleanup(!keep_remote);
            let report = session.download_with_progress(request, print_progress)?;
            Ok(print_report(&format!("{protocol} download"), &report))
        }
        TransferAction::Upload {
            selectors,
            remote_dir,
            local_dir,
            no_archive,
            ..
        } => {
            let request = request(selectors, remote_dir, local_dir).cleanup(!no_archive);
            let report = session.upload_with_progress(request, print_progress)?;
            Ok(print_report(&format!("{protocol} upload"), &report))
        }
    }
}

fn request(
    selectors: Selectors,
    remote_dir: Option<String>,
    local_dir: Option<std::path::PathBuf>,
) -> TransferRequest {
    let suppress = selectors.suppress_override();
    let mut request = TransferRequest::new()
        .files(selectors.files)
        .write_log(selectors.log);
    if let Some(suppress) = suppress {
        request = request.suppress(suppress);
    }
    if let Some(dir) = remote_dir {
        request = request.remote_dir(dir);
    }
    if let Some(dir) = local_dir {
        request = request.local_dir(dir);
    }
    request
}

fn print_progress(progress: Progress) {
    tracing::debug!(processed = progress.processed, total = progress.total, "Progress");
}

fn open_backend(profile: &TransferProfile, target: &Target) -> Result<Box<dyn TransferBackend>> {
    if let Some(root) = &target.mount {
        if !root.is_dir() {
            return Err(CliError::user(format!(
                "Mount point {} is not a directory",
                root.display()
            )));
        }
        tracing::info!(mount = %root.display(), "Using mounted share");
        return Ok(Box::new(LocalBackend::new(root)));
    }
    connect(profile)
}

fn connect(profile: &TransferProfile) -> Result<Box<dyn TransferBackend>> {
    tracing::info!(host = %profile.host, port = profile.port, protocol = %profile.protocol, "Connecting");

    match profile.protocol {
        #[cfg(feature = "sftp")]
        Protocol::Sftp => {
            let backend = autokit_core::connect_with_retry(&RetryPolicy::default(), || {
                autokit_core::Ssh2Backend::connect(profile, CONNECT_TIMEOUT)
            })?;
            Ok(Box::new(backend))
        }
        #[cfg(feature = "ftp")]
        Protocol::Ftp => {
            let backend = autokit_core::connect_with_retry(&RetryPolicy::default(), || {
                autokit_core::FtpBackend::connect(profile)
            })?;
            Ok(Box::new(backend))
        }
        #[allow(unreachable_patterns)]
        other => {
            Err(CliError::user(format!(
                "{} support is not built in; rebuild with the `{}` feature or pass {}",
                other,
                other,
                "--mount".cyan()
            )))
        }
    }
}
