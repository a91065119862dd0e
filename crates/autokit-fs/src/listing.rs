//! Directory listing and archive moves

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// List the names of regular files in `dir`, in the order the OS returns them.
///
/// Subdirectories (including the archive directory) are excluded. Names that
/// are not valid UTF-8 are skipped with a warning.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
        let is_file = if file_type.is_symlink() {
            entry.path().is_file()
        } else {
            file_type.is_file()
        };
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                tracing::warn!(name = ?raw, dir = %dir.display(), "Skipping non UTF-8 file name");
            }
        }
    }
    Ok(names)
}

/// Move `dir/file` into `dir/archive_name/file`.
///
/// The archive directory is never created: when it does not exist the file
/// stays where it is and `Ok(false)` is returned.
pub fn move_into_archive(dir: &Path, archive_name: &str, file: &str) -> Result<bool> {
    let archive_dir = dir.join(archive_name);
    if !archive_dir.is_dir() {
        tracing::debug!(archive = %archive_dir.display(), "Archive directory absent, leaving file in place");
        return Ok(false);
    }

    let source = dir.join(file);
    let target = archive_dir.join(file);
    fs::rename(&source, &target).map_err(|e| Error::io(&source, e))?;
    Ok(true)
}
