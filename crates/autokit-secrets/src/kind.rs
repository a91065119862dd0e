//! Profile kinds and their property allow-lists

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// General fields every secret entry exposes.
pub const GENERAL_FIELDS: &[&str] = &["username", "password", "url"];

const SFTP_PROPERTIES: &[&str] = &[
    "LocalInDefault",
    "LocalOutDefault",
    "LoginType",
    "Passphrase",
    "Port",
    "RemoteInDefault",
    "RemoteOutDefault",
    "SuppressInDefault",
    "SuppressOutDefault",
];

const FTP_PROPERTIES: &[&str] = &[
    "LocalInDefault",
    "LocalOutDefault",
    "Port",
    "RemoteInDefault",
    "RemoteOutDefault",
    "SuppressInDefault",
    "SuppressOutDefault",
    "UseTls",
];

const PGP_PROPERTIES: &[&str] = &[
    "DecryptPathDefault",
    "EncryptedExtension",
    "EncryptPathDefault",
    "SuppressDecryptDefault",
    "SuppressEncryptDefault",
];

/// The capability a profile belongs to.
///
/// Each kind maps to one group in the secret store and has its own set of
/// recognized custom properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Sftp,
    Ftp,
    Pgp,
}

impl ProfileKind {
    /// Name of the secret store group holding profiles of this kind.
    pub fn group(&self) -> &'static str {
        match self {
            Self::Sftp => "sftp",
            Self::Ftp => "ftp",
            Self::Pgp => "pgp",
        }
    }

    /// Custom properties this kind is allowed to read.
    pub fn allowed_properties(&self) -> &'static [&'static str] {
        match self {
            Self::Sftp => SFTP_PROPERTIES,
            Self::Ftp => FTP_PROPERTIES,
            Self::Pgp => PGP_PROPERTIES,
        }
    }

    pub fn allows(&self, property: &str) -> bool {
        self.allowed_properties().contains(&property)
    }

    /// Whether profiles of this kind describe a transfer endpoint.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Sftp | Self::Ftp)
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

impl FromStr for ProfileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sftp" => Ok(Self::Sftp),
            "ftp" => Ok(Self::Ftp),
            "pgp" => Ok(Self::Pgp),
            _ => Err(Error::UnknownKind {
                kind: s.to_string(),
            }),
        }
    }
}
