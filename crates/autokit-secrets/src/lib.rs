//! Secret store access and typed profiles for autokit.
//!
//! A profile is a named bundle of connection or cipher credentials plus
//! per-profile defaults (directories, suppression lists). Profiles live in
//! an external secret store; this crate looks them up, validates the
//! requested fields against a per-kind allow-list, and maps them onto
//! typed structs.

pub mod entry;
pub mod error;
pub mod kind;
pub mod profile;
pub mod resolver;
pub mod store;

pub use entry::SecretEntry;
pub use error::{Error, Result};
pub use kind::ProfileKind;
pub use profile::{
    CipherProfile, LoginMethod, Profile, Protocol, SecretString, TransferProfile,
};
pub use resolver::{CredentialResolver, split_suppressions};
pub use store::{MemorySecretStore, SecretStore, TomlSecretStore};
