//! Secret store backends

use std::path::{Path, PathBuf};

use autokit_fs::ConfigStore;
use serde::Deserialize;

use crate::{Result, SecretEntry};

/// Read access to a secret store.
///
/// Lookups return every entry matching `group` and `title`; deciding what
/// zero or several matches mean is left to the caller.
pub trait SecretStore {
    fn find_entries(&self, group: &str, title: &str) -> Result<Vec<SecretEntry>>;
}

impl<S: SecretStore + ?Sized> SecretStore for &S {
    fn find_entries(&self, group: &str, title: &str) -> Result<Vec<SecretEntry>> {
        (**self).find_entries(group, title)
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    #[serde(default, rename = "entry")]
    entries: Vec<SecretEntry>,
}

/// Secret store backed by a file of `[[entry]]` tables.
///
/// ```toml
/// [[entry]]
/// group = "sftp"
/// title = "Vendor"
/// url = "sftp.vendor.example"
/// username = "svc"
/// password = "..."
///
/// [entry.properties]
/// Port = 2222
///
/// [entry.attachments]
/// "OPENSSH_PRIVATE.asc" = "..."
/// ```
///
/// The file is read once when opened. JSON and YAML files with the same
/// shape are accepted as well.
#[derive(Debug)]
pub struct TomlSecretStore {
    path: PathBuf,
    entries: Vec<SecretEntry>,
}

impl TomlSecretStore {
    pub fn open(path: &Path) -> Result<Self> {
        let file: StoreFile = ConfigStore::new().load(path)?;
        tracing::debug!(path = %path.display(), entries = file.entries.len(), "Loaded secret store");
        Ok(Self {
            path: path.to_path_buf(),
            entries: file.entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SecretStore for TomlSecretStore {
    fn find_entries(&self, group: &str, title: &str) -> Result<Vec<SecretEntry>> {
        Ok(matching(&self.entries, group, title))
    }
}

/// In-process secret store.
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    entries: Vec<SecretEntry>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: SecretEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn insert(&mut self, entry: SecretEntry) {
        self.entries.push(entry);
    }
}

impl SecretStore for MemorySecretStore {
    fn find_entries(&self, group: &str, title: &str) -> Result<Vec<SecretEntry>> {
        Ok(matching(&self.entries, group, title))
    }
}

fn matching(entries: &[SecretEntry], group: &str, title: &str) -> Vec<SecretEntry> {
    entries
        .iter()
        .filter(|e| e.group == group && e.title == title)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_matches_group_and_title() {
        let store = MemorySecretStore::new()
            .with_entry(SecretEntry::new("sftp", "Vendor"))
            .with_entry(SecretEntry::new("ftp", "Vendor"))
            .with_entry(SecretEntry::new("sftp", "Other"));

        let found = store.find_entries("sftp", "Vendor").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].group, "sftp");
    }

    #[test]
    fn duplicates_are_all_returned() {
        let store = MemorySecretStore::new()
            .with_entry(SecretEntry::new("pgp", "Keys"))
            .with_entry(SecretEntry::new("pgp", "Keys"));

        assert_eq!(store.find_entries("pgp", "Keys").unwrap().len(), 2);
    }

    #[test]
    fn title_match_is_exact() {
        let store = MemorySecretStore::new().with_entry(SecretEntry::new("sftp", "Vendor"));
        assert!(store.find_entries("sftp", "vendor").unwrap().is_empty());
    }
}
