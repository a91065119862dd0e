//! Engine settings
//!
//! Settings are an explicitly constructed value handed to every session;
//! nothing is read from process-wide state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use autokit_fs::ConfigStore;

use crate::{Error, Result};

pub const PROFILE_STORE: &str = "profile_store";
pub const SUPPRESS_DELIMITER: &str = "suppress_delimiter";
pub const ARCHIVE_DIR_NAME: &str = "archive_dir_name";
pub const LOG_ROOT: &str = "log_root";
pub const LOG_DELIMITER: &str = "log_delimiter";
pub const MONITOR_STATE_FILE: &str = "monitor_state_file";

const REQUIRED_KEYS: &[&str] = &[
    PROFILE_STORE,
    SUPPRESS_DELIMITER,
    ARCHIVE_DIR_NAME,
    LOG_ROOT,
    LOG_DELIMITER,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Location of the secret store file.
    pub profile_store: PathBuf,
    /// Delimiter splitting stored suppression lists.
    pub suppress_delimiter: String,
    /// Name of the archive subdirectory next to processed files.
    pub archive_dir_name: String,
    /// Audit logs go to `<log_root>/<module>/`.
    pub log_root: PathBuf,
    pub log_delimiter: String,
    pub monitor_state_file: Option<PathBuf>,
}

impl Settings {
    /// Build settings from a key/value mapping.
    ///
    /// Every required key must be present and non-empty. Unrecognized keys
    /// are ignored with a warning.
    pub fn from_map<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut take = |key: &str| -> Result<String> {
            match map.remove(key) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(Error::Config {
                    key: key.to_string(),
                }),
            }
        };

        let profile_store = PathBuf::from(take(PROFILE_STORE)?);
        let suppress_delimiter = take(SUPPRESS_DELIMITER)?;
        let archive_dir_name = take(ARCHIVE_DIR_NAME)?;
        let log_root = PathBuf::from(take(LOG_ROOT)?);
        let log_delimiter = take(LOG_DELIMITER)?;
        let monitor_state_file = take(MONITOR_STATE_FILE).ok().map(PathBuf::from);

        if archive_dir_name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig {
                key: ARCHIVE_DIR_NAME.to_string(),
                message: "must be a single directory name".to_string(),
            });
        }

        for key in map.keys() {
            tracing::warn!(key = %key, "Ignoring unrecognized configuration key");
        }

        Ok(Self {
            profile_store,
            suppress_delimiter,
            archive_dir_name,
            log_root,
            log_delimiter,
            monitor_state_file,
        })
    }

    /// Load settings from a `.toml`, `.json` or `.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let map: BTreeMap<String, String> = ConfigStore::new().load(path)?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Self::from_map(map)
    }

    /// Names of the keys that must always be present.
    pub fn required_keys() -> &'static [&'static str] {
        REQUIRED_KEYS
    }

    /// The monitor state file, required only by the directory monitor.
    pub fn monitor_state_file(&self) -> Result<&Path> {
        self.monitor_state_file
            .as_deref()
            .ok_or_else(|| Error::Config {
                key: MONITOR_STATE_FILE.to_string(),
            })
    }

    /// Directory holding the audit logs of one module.
    pub fn log_dir(&self, module: &str) -> PathBuf {
        self.log_root.join(module)
    }
}
