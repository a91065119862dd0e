//! Profile resolution from a secret store

use std::path::PathBuf;

use crate::profile::{CipherProfile, LoginMethod, Profile, Protocol, SecretString, TransferProfile};
use crate::{Error, ProfileKind, Result, SecretEntry, SecretStore};

pub const SSH_KEY_ATTACHMENT: &str = "OPENSSH_PRIVATE.asc";
pub const PUBLIC_KEY_ATTACHMENT: &str = "PUBLIC.asc";
pub const PRIVATE_KEY_ATTACHMENT: &str = "PRIVATE.asc";

/// Resolves named profiles into typed, validated structs.
///
/// Resolution is a pure lookup: nothing is cached and the store is never
/// written to.
#[derive(Debug)]
pub struct CredentialResolver<S> {
    store: S,
    suppress_delimiter: String,
}

impl<S: SecretStore> CredentialResolver<S> {
    pub fn new(store: S, suppress_delimiter: impl Into<String>) -> Self {
        Self {
            store,
            suppress_delimiter: suppress_delimiter.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolve(&self, kind: ProfileKind, name: &str) -> Result<Profile> {
        match kind {
            ProfileKind::Sftp => self.resolve_transfer(Protocol::Sftp, name).map(Profile::Transfer),
            ProfileKind::Ftp => self.resolve_transfer(Protocol::Ftp, name).map(Profile::Transfer),
            ProfileKind::Pgp => self.resolve_cipher(name).map(Profile::Cipher),
        }
    }

    /// Look up the single entry for `name`, failing on zero or several matches.
    pub fn entry(&self, kind: ProfileKind, name: &str) -> Result<SecretEntry> {
        let mut found = self.store.find_entries(kind.group(), name)?;
        if found.len() != 1 {
            return Err(Error::ProfileNotFound {
                kind: kind.to_string(),
                name: name.to_string(),
                found: found.len(),
            });
        }
        Ok(found.remove(0))
    }

    pub fn resolve_transfer(&self, protocol: Protocol, name: &str) -> Result<TransferProfile> {
        let kind = protocol.kind();
        let entry = self.entry(kind, name)?;
        let missing = |field: &str| Error::MissingField {
            profile: name.to_string(),
            field: field.to_string(),
        };

        let host = entry
            .general("url")?
            .map(host_from_url)
            .ok_or_else(|| missing("host"))?;
        let username = entry
            .general("username")?
            .map(str::to_string)
            .ok_or_else(|| missing("username"))?;
        let password = entry.general("password")?.map(SecretString::new);

        let port = parse_port(entry.custom(kind, "Port")?, protocol);
        let login = self.login_method(&entry, kind, name, password.is_some())?;

        let use_tls = match protocol {
            Protocol::Ftp => parse_flag(entry.custom(kind, "UseTls")?).unwrap_or(true),
            Protocol::Sftp => false,
        };

        let profile = TransferProfile {
            name: name.to_string(),
            protocol,
            host,
            port,
            username,
            password,
            login,
            remote_in: entry
                .custom(kind, "RemoteInDefault")?
                .unwrap_or("/")
                .to_string(),
            remote_out: entry
                .custom(kind, "RemoteOutDefault")?
                .unwrap_or("/")
                .to_string(),
            local_in: entry.custom(kind, "LocalInDefault")?.map(PathBuf::from),
            local_out: entry.custom(kind, "LocalOutDefault")?.map(PathBuf::from),
            suppress_in: self.suppressions(entry.custom(kind, "SuppressInDefault")?),
            suppress_out: self.suppressions(entry.custom(kind, "SuppressOutDefault")?),
            use_tls,
        };
        tracing::debug!(profile = %name, %protocol, host = %profile.host, port = profile.port, "Resolved transfer profile");
        Ok(profile)
    }

    pub fn resolve_cipher(&self, name: &str) -> Result<CipherProfile> {
        let kind = ProfileKind::Pgp;
        let entry = self.entry(kind, name)?;

        let public_key = entry
            .optional_attachment(PUBLIC_KEY_ATTACHMENT)
            .map(SecretString::new);
        let private_key = entry
            .optional_attachment(PRIVATE_KEY_ATTACHMENT)
            .map(SecretString::new);
        let passphrase = entry.general("password")?.map(SecretString::new);

        if public_key.is_none() && private_key.is_none() {
            return Err(Error::MissingField {
                profile: name.to_string(),
                field: format!("{PUBLIC_KEY_ATTACHMENT} or {PRIVATE_KEY_ATTACHMENT}"),
            });
        }
        if private_key.is_some() && passphrase.is_none() {
            return Err(Error::MissingField {
                profile: name.to_string(),
                field: "passphrase".to_string(),
            });
        }

        let extension = entry
            .custom(kind, "EncryptedExtension")?
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "pgp".to_string());

        let profile = CipherProfile {
            name: name.to_string(),
            extension,
            encrypt_dir: entry.custom(kind, "EncryptPathDefault")?.map(PathBuf::from),
            decrypt_dir: entry.custom(kind, "DecryptPathDefault")?.map(PathBuf::from),
            suppress_encrypt: self.suppressions(entry.custom(kind, "SuppressEncryptDefault")?),
            suppress_decrypt: self.suppressions(entry.custom(kind, "SuppressDecryptDefault")?),
            public_key,
            private_key,
            passphrase,
        };
        tracing::debug!(profile = %name, extension = %profile.extension, "Resolved cipher profile");
        Ok(profile)
    }

    fn login_method(
        &self,
        entry: &SecretEntry,
        kind: ProfileKind,
        name: &str,
        has_password: bool,
    ) -> Result<LoginMethod> {
        let key = entry.optional_attachment(SSH_KEY_ATTACHMENT);
        let wants_key = match kind {
            ProfileKind::Sftp => entry
                .custom(kind, "LoginType")?
                .map(|t| t.to_ascii_uppercase().contains("KEY"))
                .unwrap_or(!has_password && key.is_some()),
            _ => false,
        };

        if wants_key {
            let private_key = key.ok_or_else(|| Error::MissingField {
                profile: name.to_string(),
                field: SSH_KEY_ATTACHMENT.to_string(),
            })?;
            return Ok(LoginMethod::Key {
                private_key: SecretString::new(private_key),
                passphrase: entry.custom(kind, "Passphrase")?.map(SecretString::new),
            });
        }

        if !has_password {
            return Err(Error::MissingField {
                profile: name.to_string(),
                field: "password".to_string(),
            });
        }
        Ok(LoginMethod::Password)
    }

    fn suppressions(&self, raw: Option<&str>) -> Vec<String> {
        raw.map(|r| split_suppressions(r, &self.suppress_delimiter))
            .unwrap_or_default()
    }
}

/// Split a stored suppression list into patterns.
///
/// Quotes, spaces and stray delimiters are trimmed from both ends of the
/// raw value and empty items are dropped, so `"'*.tmp|*.bak|'"` with
/// delimiter `|` yields `["*.tmp", "*.bak"]`.
pub fn split_suppressions(raw: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        let trimmed = raw.trim_matches(|c: char| c == '\'' || c == ' ');
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut trimmed = raw;
    loop {
        let before = trimmed.len();
        trimmed = trimmed
            .trim_matches(|c: char| c == '\'' || c == ' ')
            .trim_start_matches(delimiter)
            .trim_end_matches(delimiter);
        if trimmed.len() == before {
            break;
        }
    }

    trimmed
        .split(delimiter)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn host_from_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme.trim_end_matches('/').to_string()
}

fn parse_port(raw: Option<&str>, protocol: Protocol) -> u16 {
    match raw.map(str::trim) {
        None => protocol.default_port(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %value, default = protocol.default_port(), "Unparseable port, using protocol default");
            protocol.default_port()
        }),
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    raw.map(|v| {
        !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "false" | "no" | "0" | "off"
        )
    })
}
