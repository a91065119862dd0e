//! [`TestWorkspace`] builder for batch scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use autokit_core::Settings;
use autokit_secrets::SecretEntry;
use tempfile::TempDir;

use crate::secrets::render_store;

pub const ARCHIVE: &str = "Archive";

/// A temporary directory laid out like a deployment:
///
/// ```text
/// <root>/secrets.toml
/// <root>/logs/<module>/...
/// <root>/state/monitor.toml
/// ```
///
/// plus any working directories a test creates.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn store_path(&self) -> PathBuf {
        self.path("secrets.toml")
    }

    pub fn log_root(&self) -> PathBuf {
        self.path("logs")
    }

    /// Create a directory (and parents) below the root.
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Create `rel` and its archive subdirectory.
    pub fn dir_with_archive(&self, rel: &str) -> PathBuf {
        let path = self.dir(rel);
        fs::create_dir_all(path.join(ARCHIVE)).unwrap();
        path
    }

    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn write_store(&self, entries: &[SecretEntry]) -> PathBuf {
        let path = self.store_path();
        fs::write(&path, render_store(entries)).unwrap();
        path
    }

    /// Settings pointing at this workspace, with `|` delimiters.
    pub fn settings(&self) -> Settings {
        Settings::from_map(self.settings_map()).unwrap()
    }

    pub fn settings_map(&self) -> Vec<(String, String)> {
        vec![
            ("profile_store".into(), self.store_path().display().to_string()),
            ("suppress_delimiter".into(), "|".into()),
            ("archive_dir_name".into(), ARCHIVE.into()),
            ("log_root".into(), self.log_root().display().to_string()),
            ("log_delimiter".into(), "|".into()),
            (
                "monitor_state_file".into(),
                self.path("state/monitor.toml").display().to_string(),
            ),
        ]
    }

    /// Write the settings as a TOML config file and return its path.
    pub fn write_config(&self) -> PathBuf {
        let mut table = toml::Table::new();
        for (key, value) in self.settings_map() {
            table.insert(key, toml::Value::String(value));
        }
        self.write("config.toml", toml::to_string(&table).unwrap())
    }

    /// Names of regular files in `rel`, sorted.
    pub fn files_in(&self, rel: &str) -> Vec<String> {
        let mut names = autokit_fs::list_files(&self.path(rel)).unwrap_or_default();
        names.sort();
        names
    }

    /// Every audit line written for `module`, across all its log files.
    pub fn log_lines(&self, module: &str) -> Vec<String> {
        let dir = self.log_root().join(module);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
        paths.sort();
        paths
            .iter()
            .flat_map(|p| {
                fs::read_to_string(p)
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn assert_file_exists(&self, rel: &str) {
        assert!(self.path(rel).exists(), "expected {rel} to exist");
    }

    pub fn assert_file_absent(&self, rel: &str) {
        assert!(!self.path(rel).exists(), "expected {rel} to be absent");
    }
}
