//! Error types for autokit-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that stop a command before or instead of a batch
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from autokit-core
    #[error(transparent)]
    Core(#[from] autokit_core::Error),

    /// Profile lookup or validation error
    #[error(transparent)]
    Secrets(#[from] autokit_secrets::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
