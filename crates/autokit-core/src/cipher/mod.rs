//! File encryption sessions
//!
//! The cryptography itself is delegated to a [`CipherBackend`]; this module
//! decides which files to touch, what to call the results, and when a file
//! is already done.

mod envelope;
mod gpg;
mod session;

pub use envelope::{Envelope, sniff};
pub use gpg::GpgBackend;
pub use session::{CipherRequest, CipherSession};

use std::fmt;

use autokit_secrets::SecretString;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherDirection {
    Encrypt,
    Decrypt,
}

impl fmt::Display for CipherDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypt => f.write_str("encrypt"),
            Self::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Cryptographic capability consumed by [`CipherSession`].
pub trait CipherBackend {
    /// Classify content without decrypting it.
    fn inspect(&self, data: &[u8]) -> Envelope {
        sniff(data)
    }

    fn encrypt(&mut self, data: &[u8], public_key: &SecretString) -> Result<Vec<u8>>;

    fn decrypt(
        &mut self,
        data: &[u8],
        private_key: &SecretString,
        passphrase: &SecretString,
    ) -> Result<Vec<u8>>;
}

impl<C: CipherBackend + ?Sized> CipherBackend for Box<C> {
    fn inspect(&self, data: &[u8]) -> Envelope {
        (**self).inspect(data)
    }

    fn encrypt(&mut self, data: &[u8], public_key: &SecretString) -> Result<Vec<u8>> {
        (**self).encrypt(data, public_key)
    }

    fn decrypt(
        &mut self,
        data: &[u8],
        private_key: &SecretString,
        passphrase: &SecretString,
    ) -> Result<Vec<u8>> {
        (**self).decrypt(data, private_key, passphrase)
    }
}

/// Name of the encrypted artifact: `<name>.<extension>`.
pub fn encrypted_name(name: &str, extension: &str) -> String {
    format!("{name}.{extension}")
}

/// Name of the decrypted artifact.
///
/// Strips a trailing `.pgp` or `.gpg`, then a trailing `.<extension>`.
/// When nothing was stripped (or nothing would remain) `.out` is appended
/// so the artifact never overwrites its source.
pub fn decrypted_name(name: &str, extension: &str) -> String {
    let mut stripped = name;
    for suffix in [".pgp", ".gpg"] {
        if let Some(rest) = strip_suffix_ignore_case(stripped, suffix) {
            stripped = rest;
            break;
        }
    }
    let custom = format!(".{extension}");
    if let Some(rest) = strip_suffix_ignore_case(stripped, &custom) {
        stripped = rest;
    }

    if stripped == name || stripped.is_empty() {
        format!("{name}.out")
    } else {
        stripped.to_string()
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
