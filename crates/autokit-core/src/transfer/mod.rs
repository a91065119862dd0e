//! Remote file transfer sessions
//!
//! Protocol handling lives behind [`TransferBackend`]. The session resolves
//! which files to move, guards against re-transfers, and handles cleanup
//! and audit logging.

mod local;
mod retry;
mod session;

#[cfg(feature = "ftp")]
mod ftp;
#[cfg(feature = "sftp")]
mod sftp;

pub use local::LocalBackend;
pub use retry::{RetryPolicy, connect_with_retry};
pub use session::{TransferRequest, TransferSession};

#[cfg(feature = "ftp")]
pub use ftp::FtpBackend;
#[cfg(feature = "sftp")]
pub use sftp::Ssh2Backend;

use std::path::Path;

use autokit_fs::RemotePath;

use crate::Result;

const PARTIAL_SUFFIX: &str = ".part";

/// Hidden sibling a download is written to before it is renamed into place.
pub(crate) fn partial_name(name: &str) -> String {
    format!(".{name}{PARTIAL_SUFFIX}")
}

pub(crate) fn is_partial(name: &str) -> bool {
    name.len() > 1 + PARTIAL_SUFFIX.len() && name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Blocking remote file operations used by [`TransferSession`].
pub trait TransferBackend {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>>;

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()>;

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()>;

    fn delete(&mut self, remote: &RemotePath) -> Result<()>;

    /// Release the connection. Called once when the session ends.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<B: TransferBackend + ?Sized> TransferBackend for Box<B> {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>> {
        (**self).list(dir)
    }

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()> {
        (**self).get(remote, local)
    }

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()> {
        (**self).put(local, remote)
    }

    fn delete(&mut self, remote: &RemotePath) -> Result<()> {
        (**self).delete(remote)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
