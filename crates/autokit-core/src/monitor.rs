//! Directory change monitoring
//!
//! Reports files modified since the last review of a directory. Review
//! times are persisted per directory in a TOML state file so scheduled
//! runs pick up where the previous one stopped.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use autokit_fs::{io, list_files};

use crate::audit::{AuditEntry, AuditLog, AuditTag};
use crate::settings::Settings;
use crate::{Error, Result};

const MODULE: &str = "monitor";

/// Persisted review times, keyed by monitored directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MonitorState {
    #[serde(default)]
    reviewed: BTreeMap<String, DateTime<Utc>>,
}

impl MonitorState {
    /// Load the state file. Writers replace it atomically, so a plain read
    /// sees either the old or the new content. A missing file is empty.
    fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let state: MonitorState = toml::from_str(&content)?;
        Ok(state)
    }

    /// Read-modify-write one entry under an exclusive lock on a sidecar
    /// lock file.
    fn update(path: &Path, key: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;

        let mut state = Self::load(path)?;
        state.reviewed.insert(key.to_string(), at);
        let content = toml::to_string_pretty(&state)?;
        io::write_atomic(path, content.as_bytes())?;

        Ok(())
    }
}

#[derive(Debug)]
pub struct DirectoryMonitor {
    dir: PathBuf,
    state_file: PathBuf,
    review_time: DateTime<Utc>,
    manual: bool,
    settings: Settings,
}

impl DirectoryMonitor {
    /// Open a monitor for `dir`, loading its last review time.
    ///
    /// A directory that was never reviewed starts from the Unix epoch, so
    /// every file counts as modified on the first run.
    pub fn open(settings: &Settings, dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
        let state_file = settings.monitor_state_file()?.to_path_buf();
        let state = MonitorState::load(&state_file)?;
        let review_time = state
            .reviewed
            .get(&state_key(dir))
            .copied()
            .unwrap_or(DateTime::UNIX_EPOCH);

        tracing::debug!(dir = %dir.display(), since = %review_time, "Opened directory monitor");
        Ok(Self {
            dir: dir.to_path_buf(),
            state_file,
            review_time,
            manual: false,
            settings: settings.clone(),
        })
    }

    pub fn review_time(&self) -> DateTime<Utc> {
        self.review_time
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// Use a fixed reference time. A manual review never updates the
    /// state file.
    pub fn set_review_time(&mut self, at: DateTime<Utc>) {
        self.review_time = at;
        self.manual = true;
    }

    /// Regular files modified after the review time, in listing order.
    ///
    /// Outside manual mode the current time is recorded as the new review
    /// time. With `write_log` each reported file gets a `MODIFIED` audit
    /// line.
    pub fn modified_files(&mut self, write_log: bool) -> Result<Vec<String>> {
        let started = Utc::now();
        let mut modified = Vec::new();

        for name in list_files(&self.dir)? {
            let path = self.dir.join(&name);
            let mtime = match path.metadata().and_then(|m| m.modified()) {
                Ok(mtime) => DateTime::<Utc>::from(mtime),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Cannot read modification time");
                    continue;
                }
            };
            if mtime > self.review_time {
                modified.push(name);
            }
        }
        tracing::info!(dir = %self.dir.display(), modified = modified.len(), "Directory reviewed");

        if write_log && !modified.is_empty() {
            let owner = self
                .dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let audit = AuditLog::new(
                &self.settings.log_root,
                MODULE,
                &owner,
                &self.settings.log_delimiter,
            );
            let dir = self.dir.display().to_string();
            for name in &modified {
                let entry = AuditEntry::new(AuditTag::Modified, dir.as_str(), dir.as_str(), name.as_str());
                if let Err(e) = audit.record(&entry) {
                    tracing::warn!(file = %name, error = %e, "Failed to write audit line");
                }
            }
        }

        if !self.manual {
            MonitorState::update(&self.state_file, &state_key(&self.dir), started)?;
            self.review_time = started;
        }

        Ok(modified)
    }
}

fn state_key(dir: &Path) -> String {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    canonical.display().to_string()
}
