//! Error types for autokit-secrets

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] autokit_fs::Error),

    /// Zero or several entries matched; ambiguity is never resolved silently.
    #[error("expecting 1 {kind} profile named '{name}', found {found}")]
    ProfileNotFound {
        kind: String,
        name: String,
        found: usize,
    },

    #[error("missing {field} for profile '{profile}'")]
    MissingField { profile: String, field: String },

    #[error("invalid profile '{profile}': {message}")]
    InvalidProfile { profile: String, message: String },

    #[error("field '{field}' is not a valid general field, expecting one of {allowed:?}")]
    UnsupportedField {
        field: String,
        allowed: &'static [&'static str],
    },

    #[error("unexpected custom property '{property}' for {kind} profiles")]
    UnsupportedProperty { kind: String, property: String },

    #[error("attachment {name} does not exist")]
    AttachmentNotFound { name: String },

    #[error("unknown profile kind: {kind}")]
    UnknownKind { kind: String },
}

impl Error {
    /// True for lookups that failed because the store holds no unique match.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProfileNotFound { .. })
    }

    /// True for allow-list violations, which indicate a caller bug rather
    /// than missing data.
    pub fn is_not_implemented(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedField { .. } | Self::UnsupportedProperty { .. }
        )
    }
}
