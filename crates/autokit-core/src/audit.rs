//! Audit Logger
//!
//! One delimited line per successful operation, appended to a file under
//! `<log_root>/<module>/`. The file and its directory are created on the
//! first write. There is no rotation and no locking; each session owns its
//! own log file.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTag {
    Get,
    Put,
    Encrypt,
    Decrypt,
    Modified,
}

impl fmt::Display for AuditTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Encrypt => "ENCRYPT",
            Self::Decrypt => "DECRYPT",
            Self::Modified => "MODIFIED",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub tag: AuditTag,
    pub source: String,
    pub destination: String,
    pub file: String,
}

impl AuditEntry {
    pub fn new(
        tag: AuditTag,
        source: impl Into<String>,
        destination: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            tag,
            source: source.into(),
            destination: destination.into(),
            file: file.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    owner: String,
    delimiter: String,
}

impl AuditLog {
    /// Prepare a log for `owner` (usually the profile name) under
    /// `<log_root>/<module>/`.
    ///
    /// The file name is `<module>_<YYYYmmddHHMMSS>_<owner>.log`, with
    /// non-alphanumeric characters dropped from the owner. Nothing is
    /// written until the first [`record`](Self::record).
    pub fn new(log_root: &Path, module: &str, owner: &str, delimiter: &str) -> Self {
        Self::at(log_root, module, owner, delimiter, Local::now())
    }

    fn at(
        log_root: &Path,
        module: &str,
        owner: &str,
        delimiter: &str,
        opened: DateTime<Local>,
    ) -> Self {
        let sanitized: String = owner.chars().filter(|c| c.is_alphanumeric()).collect();
        let file_name = format!(
            "{module}_{}_{sanitized}.log",
            opened.format("%Y%m%d%H%M%S")
        );
        Self {
            path: log_root.join(module).join(file_name),
            owner: owner.to_string(),
            delimiter: delimiter.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, entry: &AuditEntry) -> Result<()> {
        let line = self.format_line(entry, Local::now());
        autokit_fs::io::append_line(&self.path, &line)?;
        Ok(())
    }

    fn format_line(&self, entry: &AuditEntry, at: DateTime<Local>) -> String {
        let date = at.format("%Y-%m-%d").to_string();
        let time = at.format("%H:%M:%S").to_string();
        let tag = entry.tag.to_string();
        [
            self.owner.as_str(),
            date.as_str(),
            time.as_str(),
            tag.as_str(),
            entry.source.as_str(),
            entry.destination.as_str(),
            entry.file.as_str(),
        ]
        .join(self.delimiter.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn file_name_uses_module_timestamp_and_sanitized_owner() {
        let log = AuditLog::at(Path::new("/logs"), "sftp", "Vendor Drop-1", "|", fixed_time());
        assert_eq!(
            log.path(),
            Path::new("/logs/sftp/sftp_20260309070501_VendorDrop1.log")
        );
    }

    #[test]
    fn line_layout() {
        let log = AuditLog::at(Path::new("/logs"), "sftp", "Vendor", "|", fixed_time());
        let entry = AuditEntry::new(AuditTag::Get, "/out", "/data/in", "a.csv");
        assert_eq!(
            log.format_line(&entry, fixed_time()),
            "Vendor|2026-03-09|07:05:01|GET|/out|/data/in|a.csv"
        );
    }

    #[test]
    fn record_creates_directory_and_appends() {
        let temp = TempDir::new().unwrap();
        let log = AuditLog::new(temp.path(), "pgp", "Keys", ",");
        assert!(!log.path().exists());

        log.record(&AuditEntry::new(AuditTag::Encrypt, "d/a", "d/a.pgp", "a.pgp"))
            .unwrap();
        log.record(&AuditEntry::new(AuditTag::Encrypt, "d/b", "d/b.pgp", "b.pgp"))
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Keys,"));
        assert!(lines[1].ends_with(",ENCRYPT,d/b,d/b.pgp,b.pgp"));
        assert!(content.ends_with('\n'));
    }
}
