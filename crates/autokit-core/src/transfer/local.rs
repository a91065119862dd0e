//! Filesystem-backed transfer backend
//!
//! Treats a local directory (a mounted share, a staging area) as the remote
//! side. Remote paths are resolved below the configured root.

use std::fs;
use std::path::{Path, PathBuf};

use autokit_fs::RemotePath;

use super::{RemoteEntry, TransferBackend};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, remote: &RemotePath) -> PathBuf {
        let relative = remote.as_str().trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl TransferBackend for LocalBackend {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let path = self.resolve(dir);
        let entries = fs::read_dir(&path).map_err(|e| Error::transfer("list", format!("{dir}: {e}")))?;

        let mut listing = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::transfer("list", format!("{dir}: {e}")))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            listing.push(RemoteEntry {
                name,
                is_dir: entry.path().is_dir(),
            });
        }
        Ok(listing)
    }

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()> {
        fs::copy(self.resolve(remote), local)
            .map_err(|e| Error::transfer("get", format!("{remote}: {e}")))?;
        Ok(())
    }

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()> {
        fs::copy(local, self.resolve(remote))
            .map_err(|e| Error::transfer("put", format!("{remote}: {e}")))?;
        Ok(())
    }

    fn delete(&mut self, remote: &RemotePath) -> Result<()> {
        fs::remove_file(self.resolve(remote))
            .map_err(|e| Error::transfer("delete", format!("{remote}: {e}")))
    }
}
