//! Error types for autokit-core

use std::path::PathBuf;

/// Result type for autokit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole batch.
///
/// Per-file failures are caught by the executor and recorded as
/// [`crate::Outcome::Failed`]; only errors raised before any file is
/// touched (configuration, selection, connection) leave a session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration key is missing or empty
    #[error("Missing configuration key: {key}")]
    Config { key: String },

    /// A configuration value is present but unusable
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    /// Neither the request nor the profile names a directory
    #[error("No {what} given and profile '{profile}' has no default")]
    NoDirectory { profile: String, what: String },

    /// The target directory of a batch does not exist
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Transfer backend failure
    #[error("Transfer {operation} failed: {message}")]
    Transfer {
        operation: String,
        message: String,
        transient: bool,
    },

    /// Cipher backend failure
    #[error("Cipher error: {message}")]
    Cipher { message: String },

    // Transparent wrappers for underlying crate errors
    /// Profile lookup and validation errors from autokit-secrets
    #[error(transparent)]
    Secrets(#[from] autokit_secrets::Error),

    /// Filesystem error from autokit-fs
    #[error(transparent)]
    Fs(#[from] autokit_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn transfer(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Transfer {
            operation: operation.into(),
            message: message.to_string(),
            transient: false,
        }
    }

    /// A transfer failure worth retrying (timeouts, refused connections).
    pub fn transient(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Transfer {
            operation: operation.into(),
            message: message.to_string(),
            transient: true,
        }
    }

    pub fn cipher(message: impl ToString) -> Self {
        Self::Cipher {
            message: message.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transfer { transient, .. } => *transient,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::transient("connect", "timed out").is_transient());
        assert!(!Error::transfer("get", "no such file").is_transient());
        assert!(Error::from(std::io::Error::from(std::io::ErrorKind::TimedOut)).is_transient());
        assert!(!Error::cipher("bad key").is_transient());
    }
}
