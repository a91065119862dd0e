//! Idempotency Guard
//!
//! Decides whether a file is already in its terminal state before an
//! operation runs. Checks are read-then-act without locking: two batches
//! racing on one directory may both process a file.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use autokit_fs::list_files;

use crate::cipher::{CipherDirection, Envelope};
use crate::transfer::is_partial;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Same name exists in the destination directory.
    AlreadyPresent,
    /// Same name exists in the destination's archive subdirectory.
    AlreadyArchived,
    AlreadyEncrypted,
    AlreadyDecrypted,
    /// Content looks like a malformed cipher envelope.
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadyPresent => "already present",
            Self::AlreadyArchived => "already archived",
            Self::AlreadyEncrypted => "already encrypted",
            Self::AlreadyDecrypted => "already decrypted",
            Self::Unreadable => "unreadable envelope",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Done(SkipReason),
}

/// Presence check for transfers.
///
/// Holds a snapshot of the destination directory and its archive
/// subdirectory taken once per batch.
#[derive(Debug, Clone, Default)]
pub struct TransferGuard {
    present: HashSet<String>,
    archived: HashSet<String>,
}

impl TransferGuard {
    pub fn new<P, A>(present: P, archived: A) -> Self
    where
        P: IntoIterator<Item = String>,
        A: IntoIterator<Item = String>,
    {
        Self {
            present: present.into_iter().collect(),
            archived: archived.into_iter().collect(),
        }
    }

    /// Snapshot a local destination. A missing archive directory counts as
    /// empty. Leftover partial downloads do not count as present.
    pub fn local(dir: &Path, archive_name: &str) -> Result<Self> {
        let present = list_files(dir)?.into_iter().filter(|n| !is_partial(n));
        let archive_dir = dir.join(archive_name);
        let archived = if archive_dir.is_dir() {
            list_files(&archive_dir)?
        } else {
            Vec::new()
        };
        Ok(Self::new(present, archived))
    }

    pub fn check(&self, name: &str) -> Readiness {
        if self.present.contains(name) {
            Readiness::Done(SkipReason::AlreadyPresent)
        } else if self.archived.contains(name) {
            Readiness::Done(SkipReason::AlreadyArchived)
        } else {
            Readiness::Ready
        }
    }

    /// Record a file produced during the batch.
    pub fn mark_present(&mut self, name: &str) {
        self.present.insert(name.to_string());
    }
}

/// Readiness of a cipher source file.
///
/// `artifact_exists` reports whether the output this file would produce is
/// already on disk; that alone marks the file done.
pub fn cipher_readiness(
    direction: CipherDirection,
    envelope: Envelope,
    artifact_exists: bool,
) -> Readiness {
    let done = match direction {
        CipherDirection::Encrypt => SkipReason::AlreadyEncrypted,
        CipherDirection::Decrypt => SkipReason::AlreadyDecrypted,
    };
    if artifact_exists {
        return Readiness::Done(done);
    }
    match (direction, envelope) {
        (_, Envelope::Unreadable) => Readiness::Done(SkipReason::Unreadable),
        (CipherDirection::Encrypt, Envelope::Encrypted) => Readiness::Done(done),
        (CipherDirection::Decrypt, Envelope::Plaintext) => Readiness::Done(done),
        _ => Readiness::Ready,
    }
}
