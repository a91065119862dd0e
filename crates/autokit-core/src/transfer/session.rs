//! Transfer sessions: download or upload every selected file

use std::fs;
use std::path::{Path, PathBuf};

use autokit_fs::{RemotePath, list_files, move_into_archive};
use autokit_secrets::TransferProfile;

use super::{RemoteEntry, TransferBackend, partial_name};
use crate::audit::{AuditEntry, AuditLog, AuditTag};
use crate::executor::{BatchExecutor, BatchReport, DEFAULT_PROGRESS_EVERY, FileOperation, Progress};
use crate::guard::{Readiness, TransferGuard};
use crate::selection::{FileSelector, FileSetResolver};
use crate::settings::Settings;
use crate::{Error, Result};

/// Per-call selection for [`TransferSession::download`] and
/// [`TransferSession::upload`].
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub remote_dir: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub files: FileSelector,
    /// `None` uses the profile's suppression list; an empty list disables
    /// suppression.
    pub suppress: Option<Vec<String>>,
    /// Download: delete the remote file. Upload: archive the local file.
    pub cleanup: bool,
    pub write_log: bool,
}

impl Default for TransferRequest {
    fn default() -> Self {
        Self {
            remote_dir: None,
            local_dir: None,
            files: FileSelector::all(),
            suppress: None,
            cleanup: true,
            write_log: false,
        }
    }
}

impl TransferRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_dir(mut self, dir: impl Into<String>) -> Self {
        self.remote_dir = Some(dir.into());
        self
    }

    pub fn local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    pub fn files(mut self, files: impl Into<FileSelector>) -> Self {
        self.files = files.into();
        self
    }

    pub fn suppress(mut self, patterns: Vec<String>) -> Self {
        self.suppress = Some(patterns);
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn write_log(mut self, write_log: bool) -> Self {
        self.write_log = write_log;
        self
    }
}

/// Owns a transfer profile and an open backend for the lifetime of a batch.
///
/// The backend is closed when the session is dropped.
pub struct TransferSession<B: TransferBackend> {
    profile: TransferProfile,
    settings: Settings,
    backend: B,
    progress_every: usize,
}

impl<B: TransferBackend> TransferSession<B> {
    pub fn new(profile: TransferProfile, settings: Settings, backend: B) -> Self {
        Self {
            profile,
            settings,
            backend,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }

    pub fn profile(&self) -> &TransferProfile {
        &self.profile
    }

    /// List a remote directory, defaulting to the profile's inbound one.
    pub fn list(&mut self, remote_dir: Option<&str>) -> Result<Vec<RemoteEntry>> {
        let dir = RemotePath::new(remote_dir.unwrap_or(&self.profile.remote_in));
        self.backend.list(&dir)
    }

    pub fn download(&mut self, request: TransferRequest) -> Result<BatchReport> {
        self.download_with_progress(request, |_| {})
    }

    pub fn download_with_progress<F: FnMut(Progress)>(
        &mut self,
        request: TransferRequest,
        on_progress: F,
    ) -> Result<BatchReport> {
        let remote_dir = RemotePath::new(
            request
                .remote_dir
                .as_deref()
                .unwrap_or(&self.profile.remote_in),
        );
        let local_dir = self.local_dir(request.local_dir, true)?;

        let candidates: Vec<String> = self
            .backend
            .list(&remote_dir)?
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name)
            .collect();
        let suppress = request
            .suppress
            .unwrap_or_else(|| self.profile.suppress_in.clone());
        let selection = FileSetResolver::glob().resolve(&candidates, &request.files, &suppress);
        tracing::info!(
            profile = %self.profile.name,
            remote = %remote_dir,
            local = %local_dir.display(),
            selected = selection.files.len(),
            "Starting download"
        );

        let guard = TransferGuard::local(&local_dir, &self.settings.archive_dir_name)?;
        let audit = self.audit(request.write_log);
        let mut op = Download {
            backend: &mut self.backend,
            guard,
            remote_dir: &remote_dir,
            local_dir: &local_dir,
            delete_remote: request.cleanup,
        };

        Ok(BatchExecutor::new()
            .with_progress_every(self.progress_every)
            .with_audit(audit.as_ref())
            .execute_with_progress(&selection, &mut op, on_progress))
    }

    pub fn upload(&mut self, request: TransferRequest) -> Result<BatchReport> {
        self.upload_with_progress(request, |_| {})
    }

    pub fn upload_with_progress<F: FnMut(Progress)>(
        &mut self,
        request: TransferRequest,
        on_progress: F,
    ) -> Result<BatchReport> {
        let remote_dir = RemotePath::new(
            request
                .remote_dir
                .as_deref()
                .unwrap_or(&self.profile.remote_out),
        );
        let local_dir = self.local_dir(request.local_dir, false)?;

        let candidates = list_files(&local_dir)?;
        let suppress = request
            .suppress
            .unwrap_or_else(|| self.profile.suppress_out.clone());
        let selection = FileSetResolver::glob().resolve(&candidates, &request.files, &suppress);
        tracing::info!(
            profile = %self.profile.name,
            local = %local_dir.display(),
            remote = %remote_dir,
            selected = selection.files.len(),
            "Starting upload"
        );

        let guard = self.remote_guard(&remote_dir);
        let audit = self.audit(request.write_log);
        let mut op = Upload {
            backend: &mut self.backend,
            guard,
            remote_dir: &remote_dir,
            local_dir: &local_dir,
            archive_dir_name: &self.settings.archive_dir_name,
            archive_local: request.cleanup,
        };

        Ok(BatchExecutor::new()
            .with_progress_every(self.progress_every)
            .with_audit(audit.as_ref())
            .execute_with_progress(&selection, &mut op, on_progress))
    }

    fn local_dir(&self, requested: Option<PathBuf>, inbound: bool) -> Result<PathBuf> {
        let default = if inbound {
            &self.profile.local_in
        } else {
            &self.profile.local_out
        };
        let dir = requested
            .or_else(|| default.clone())
            .ok_or_else(|| Error::NoDirectory {
                profile: self.profile.name.clone(),
                what: "local directory".to_string(),
            })?;
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound { path: dir });
        }
        Ok(dir)
    }

    /// Snapshot the remote destination and its archive subdirectory. A
    /// listing failure counts as an empty directory.
    fn remote_guard(&mut self, remote_dir: &RemotePath) -> TransferGuard {
        let mut names = |dir: &RemotePath| -> Vec<String> {
            match self.backend.list(dir) {
                Ok(entries) => entries
                    .into_iter()
                    .filter(|e| !e.is_dir)
                    .map(|e| e.name)
                    .collect(),
                Err(e) => {
                    tracing::debug!(dir = %dir, error = %e, "Remote listing unavailable for guard");
                    Vec::new()
                }
            }
        };
        let present = names(remote_dir);
        let archived = names(&remote_dir.join(&self.settings.archive_dir_name));
        TransferGuard::new(present, archived)
    }

    fn audit(&self, write_log: bool) -> Option<AuditLog> {
        write_log.then(|| {
            AuditLog::new(
                &self.settings.log_root,
                &self.profile.protocol.to_string(),
                &self.profile.name,
                &self.settings.log_delimiter,
            )
        })
    }
}

impl<B: TransferBackend> Drop for TransferSession<B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.close() {
            tracing::warn!(profile = %self.profile.name, error = %e, "Failed to close transfer backend");
        }
    }
}

struct Download<'a, B> {
    backend: &'a mut B,
    guard: TransferGuard,
    remote_dir: &'a RemotePath,
    local_dir: &'a Path,
    delete_remote: bool,
}

impl<B: TransferBackend> FileOperation for Download<'_, B> {
    fn tag(&self) -> AuditTag {
        AuditTag::Get
    }

    fn inspect(&mut self, name: &str) -> Result<Readiness> {
        Ok(self.guard.check(name))
    }

    /// Fetch into a hidden partial file and rename it into place, so an
    /// interrupted transfer never leaves a file under the final name.
    fn apply(&mut self, name: &str) -> Result<String> {
        let partial = self.local_dir.join(partial_name(name));
        if let Err(e) = self.backend.get(&self.remote_dir.join(name), &partial) {
            if let Err(cleanup) = fs::remove_file(&partial)
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(file = %partial.display(), error = %cleanup, "Failed to remove partial download");
            }
            return Err(e);
        }
        fs::rename(&partial, self.local_dir.join(name))?;
        self.guard.mark_present(name);
        Ok(name.to_string())
    }

    fn finish(&mut self, name: &str) -> Result<bool> {
        if !self.delete_remote {
            return Ok(false);
        }
        self.backend.delete(&self.remote_dir.join(name))?;
        Ok(true)
    }

    fn audit_entry(&self, name: &str, _artifact: &str) -> AuditEntry {
        AuditEntry::new(
            AuditTag::Get,
            self.remote_dir.to_string(),
            self.local_dir.display().to_string(),
            name,
        )
    }
}

struct Upload<'a, B> {
    backend: &'a mut B,
    guard: TransferGuard,
    remote_dir: &'a RemotePath,
    local_dir: &'a Path,
    archive_dir_name: &'a str,
    archive_local: bool,
}

impl<B: TransferBackend> FileOperation for Upload<'_, B> {
    fn tag(&self) -> AuditTag {
        AuditTag::Put
    }

    fn inspect(&mut self, name: &str) -> Result<Readiness> {
        Ok(self.guard.check(name))
    }

    fn apply(&mut self, name: &str) -> Result<String> {
        self.backend
            .put(&self.local_dir.join(name), &self.remote_dir.join(name))?;
        self.guard.mark_present(name);
        Ok(name.to_string())
    }

    fn finish(&mut self, name: &str) -> Result<bool> {
        if !self.archive_local {
            return Ok(false);
        }
        Ok(move_into_archive(self.local_dir, self.archive_dir_name, name)?)
    }

    fn audit_entry(&self, name: &str, _artifact: &str) -> AuditEntry {
        AuditEntry::new(
            AuditTag::Put,
            self.local_dir.display().to_string(),
            self.remote_dir.to_string(),
            name,
        )
    }
}
