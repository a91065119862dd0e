//! Selector-driven, idempotent batch file processing
//!
//! This crate implements the engine shared by every autokit module:
//!
//! - **File Set Resolver**: include/exclude glob rules over a directory listing
//! - **Idempotency Guard**: skip files already in their terminal state
//! - **Batch Operation Executor**: per-file execution with failure isolation
//! - **Audit Logger**: one delimited line per successful operation
//!
//! on top of which sit transfer sessions (SFTP, FTP, or a local directory),
//! cipher sessions (PGP via `gpg`) and a directory change monitor.
//!
//! # Architecture
//!
//! ```text
//!                    autokit-cli
//!                        |
//!                   autokit-core
//!                        |
//!            +-----------+-----------+
//!            |                       |
//!       autokit-fs            autokit-secrets
//! ```

pub mod audit;
pub mod cipher;
pub mod error;
pub mod executor;
pub mod guard;
pub mod monitor;
pub mod selection;
pub mod settings;
pub mod transfer;

pub use audit::{AuditEntry, AuditLog, AuditTag};
pub use cipher::{
    CipherBackend, CipherDirection, CipherRequest, CipherSession, Envelope, GpgBackend,
};
pub use error::{Error, Result};
pub use executor::{
    BatchExecutor, BatchReport, FileOperation, Outcome, OutcomeKind, OutcomeRecord, Progress,
};
pub use guard::{Readiness, SkipReason, TransferGuard};
pub use monitor::DirectoryMonitor;
pub use selection::{FileSelector, FileSetResolver, GlobMatcher, LiteralMatcher, NameMatcher, Selection};
pub use settings::Settings;
pub use transfer::{
    LocalBackend, RemoteEntry, RetryPolicy, TransferBackend, TransferRequest, TransferSession,
    connect_with_retry,
};

#[cfg(feature = "ftp")]
pub use transfer::FtpBackend;
#[cfg(feature = "sftp")]
pub use transfer::Ssh2Backend;
