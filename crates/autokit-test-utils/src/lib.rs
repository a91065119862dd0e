//! Shared test utilities for the autokit workspace.
//!
//! Used as a dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`workspace`]: [`TestWorkspace`] scratch directory with settings and logs
//! - [`secrets`]: secret entry fixtures and secret store file rendering
//! - [`fakes`]: scripted transfer and cipher backends with failure injection

pub mod fakes;
pub mod secrets;
pub mod workspace;

pub use fakes::{FakeCipher, FakeRemote};
pub use workspace::TestWorkspace;
