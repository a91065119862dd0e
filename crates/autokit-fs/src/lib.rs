//! Filesystem primitives for autokit
//!
//! Provides remote-style path handling, ordered directory listing,
//! archive moves, append-only and atomic writes, and format-agnostic
//! configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod listing;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use listing::{list_files, move_into_archive};
pub use path::RemotePath;
