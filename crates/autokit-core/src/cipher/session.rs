//! Cipher sessions: encrypt or decrypt every selected file in a directory

use std::path::{Path, PathBuf};

use autokit_fs::{io, list_files, move_into_archive};
use autokit_secrets::{CipherProfile, SecretString};

use super::{CipherBackend, CipherDirection, decrypted_name, encrypted_name};
use crate::audit::{AuditEntry, AuditLog, AuditTag};
use crate::executor::{BatchExecutor, BatchReport, DEFAULT_PROGRESS_EVERY, FileOperation, Progress};
use crate::guard::{Readiness, cipher_readiness};
use crate::selection::{FileSelector, FileSetResolver};
use crate::settings::Settings;
use crate::{Error, Result};

const MODULE: &str = "pgp";

/// Per-call selection for [`CipherSession::encrypt`] and
/// [`CipherSession::decrypt`].
#[derive(Debug, Clone)]
pub struct CipherRequest {
    /// Overrides the profile's default directory.
    pub dir: Option<PathBuf>,
    pub files: FileSelector,
    /// `None` uses the profile's suppression list; an empty list disables
    /// suppression.
    pub suppress: Option<Vec<String>>,
    /// Move each source into the archive subdirectory after success.
    pub cleanup: bool,
    pub write_log: bool,
}

impl Default for CipherRequest {
    fn default() -> Self {
        Self {
            dir: None,
            files: FileSelector::all(),
            suppress: None,
            cleanup: true,
            write_log: false,
        }
    }
}

impl CipherRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
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

/// Owns a cipher profile and backend for the lifetime of a batch.
pub struct CipherSession<C: CipherBackend> {
    profile: CipherProfile,
    settings: Settings,
    backend: C,
    progress_every: usize,
}

impl<C: CipherBackend> CipherSession<C> {
    pub fn new(profile: CipherProfile, settings: Settings, backend: C) -> Self {
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

    pub fn profile(&self) -> &CipherProfile {
        &self.profile
    }

    pub fn encrypt(&mut self, request: CipherRequest) -> Result<BatchReport> {
        self.run(CipherDirection::Encrypt, request, |_| {})
    }

    pub fn encrypt_with_progress<F: FnMut(Progress)>(
        &mut self,
        request: CipherRequest,
        on_progress: F,
    ) -> Result<BatchReport> {
        self.run(CipherDirection::Encrypt, request, on_progress)
    }

    pub fn decrypt(&mut self, request: CipherRequest) -> Result<BatchReport> {
        self.run(CipherDirection::Decrypt, request, |_| {})
    }

    pub fn decrypt_with_progress<F: FnMut(Progress)>(
        &mut self,
        request: CipherRequest,
        on_progress: F,
    ) -> Result<BatchReport> {
        self.run(CipherDirection::Decrypt, request, on_progress)
    }

    fn run<F: FnMut(Progress)>(
        &mut self,
        direction: CipherDirection,
        request: CipherRequest,
        on_progress: F,
    ) -> Result<BatchReport> {
        let (default_dir, default_suppress, what) = match direction {
            CipherDirection::Encrypt => (
                &self.profile.encrypt_dir,
                &self.profile.suppress_encrypt,
                "encrypt directory",
            ),
            CipherDirection::Decrypt => (
                &self.profile.decrypt_dir,
                &self.profile.suppress_decrypt,
                "decrypt directory",
            ),
        };

        let dir = request
            .dir
            .or_else(|| default_dir.clone())
            .ok_or_else(|| Error::NoDirectory {
                profile: self.profile.name.clone(),
                what: what.to_string(),
            })?;
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound { path: dir });
        }

        let keys = self.keys(direction)?;
        let suppress = request.suppress.unwrap_or_else(|| default_suppress.clone());

        let candidates = list_files(&dir)?;
        let selection = FileSetResolver::glob().resolve(&candidates, &request.files, &suppress);
        tracing::info!(
            profile = %self.profile.name,
            %direction,
            dir = %dir.display(),
            selected = selection.files.len(),
            "Starting cipher batch"
        );

        let audit = request.write_log.then(|| {
            AuditLog::new(
                &self.settings.log_root,
                MODULE,
                &self.profile.name,
                &self.settings.log_delimiter,
            )
        });

        let mut op = CipherOperation {
            backend: &mut self.backend,
            direction,
            keys,
            dir: &dir,
            extension: &self.profile.extension,
            archive_dir_name: &self.settings.archive_dir_name,
            cleanup: request.cleanup,
            staged: None,
        };

        let report = BatchExecutor::new()
            .with_progress_every(self.progress_every)
            .with_audit(audit.as_ref())
            .execute_with_progress(&selection, &mut op, on_progress);
        Ok(report)
    }

    fn keys(&self, direction: CipherDirection) -> Result<Keys> {
        let missing = |field: &str| {
            Error::from(autokit_secrets::Error::MissingField {
                profile: self.profile.name.clone(),
                field: field.to_string(),
            })
        };
        match direction {
            CipherDirection::Encrypt => {
                let key = self.profile.public_key.clone().ok_or_else(|| missing("public key"))?;
                Ok(Keys::Public(key))
            }
            CipherDirection::Decrypt => {
                let key = self.profile.private_key.clone().ok_or_else(|| missing("private key"))?;
                let passphrase = self.profile.passphrase.clone().ok_or_else(|| missing("passphrase"))?;
                Ok(Keys::Private { key, passphrase })
            }
        }
    }
}

enum Keys {
    Public(SecretString),
    Private {
        key: SecretString,
        passphrase: SecretString,
    },
}

struct CipherOperation<'a, C> {
    backend: &'a mut C,
    direction: CipherDirection,
    keys: Keys,
    dir: &'a Path,
    extension: &'a str,
    archive_dir_name: &'a str,
    cleanup: bool,
    /// Content read during inspection, reused by `apply`.
    staged: Option<(String, Vec<u8>)>,
}

impl<C: CipherBackend> CipherOperation<'_, C> {
    fn artifact_name(&self, name: &str) -> String {
        match self.direction {
            CipherDirection::Encrypt => encrypted_name(name, self.extension),
            CipherDirection::Decrypt => decrypted_name(name, self.extension),
        }
    }
}

impl<C: CipherBackend> FileOperation for CipherOperation<'_, C> {
    fn tag(&self) -> AuditTag {
        match self.direction {
            CipherDirection::Encrypt => AuditTag::Encrypt,
            CipherDirection::Decrypt => AuditTag::Decrypt,
        }
    }

    fn inspect(&mut self, name: &str) -> Result<Readiness> {
        self.staged = None;
        let artifact = self.artifact_name(name);
        if self.dir.join(&artifact).exists() {
            tracing::debug!(file = %name, artifact = %artifact, "Artifact already exists");
            return Ok(cipher_readiness(
                self.direction,
                super::Envelope::Plaintext,
                true,
            ));
        }

        let data = io::read_bytes(&self.dir.join(name))?;
        let envelope = self.backend.inspect(&data);
        let readiness = cipher_readiness(self.direction, envelope, false);
        if readiness == Readiness::Ready {
            self.staged = Some((name.to_string(), data));
        }
        Ok(readiness)
    }

    fn apply(&mut self, name: &str) -> Result<String> {
        let data = match self.staged.take() {
            Some((staged, data)) if staged == name => data,
            _ => io::read_bytes(&self.dir.join(name))?,
        };

        let output = match &self.keys {
            Keys::Public(key) => self.backend.encrypt(&data, key)?,
            Keys::Private { key, passphrase } => self.backend.decrypt(&data, key, passphrase)?,
        };

        let artifact = self.artifact_name(name);
        io::write_atomic(&self.dir.join(&artifact), &output)?;
        Ok(artifact)
    }

    fn finish(&mut self, name: &str) -> Result<bool> {
        if !self.cleanup {
            return Ok(false);
        }
        Ok(move_into_archive(self.dir, self.archive_dir_name, name)?)
    }

    fn audit_entry(&self, name: &str, artifact: &str) -> AuditEntry {
        AuditEntry::new(
            self.tag(),
            self.dir.join(name).display().to_string(),
            self.dir.join(artifact).display().to_string(),
            artifact,
        )
    }
}
