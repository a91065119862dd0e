//! profile command

use std::path::PathBuf;

use autokit_secrets::{CipherProfile, LoginMethod, Profile, ProfileKind, TransferProfile};
use colored::Colorize;

use super::{Context, Status};
use crate::error::Result;

const REDACTED: &str = "***";

pub fn run_profile_show(ctx: &Context, kind: &str, name: &str) -> Result<Status> {
    let kind: ProfileKind = kind.parse()?;
    let settings = ctx.settings()?;
    let profile = ctx.resolver(&settings)?.resolve(kind, name)?;

    println!("{} {}", kind.to_string().cyan().bold(), profile.name().bold());
    for (field, value) in fields(&profile) {
        println!("  {:<18} {}", field, value);
    }
    Ok(Status::Clean)
}

/// Displayable fields, with secrets replaced.
fn fields(profile: &Profile) -> Vec<(&'static str, String)> {
    match profile {
        Profile::Transfer(p) => transfer_fields(p),
        Profile::Cipher(p) => cipher_fields(p),
    }
}

fn transfer_fields(p: &TransferProfile) -> Vec<(&'static str, String)> {
    let login = match &p.login {
        LoginMethod::Password => "password".to_string(),
        LoginMethod::Key { passphrase, .. } => {
            if passphrase.is_some() {
                "key (with passphrase)".to_string()
            } else {
                "key".to_string()
            }
        }
    };
    let mut fields = vec![
        ("host", p.host.clone()),
        ("port", p.port.to_string()),
        ("username", p.username.clone()),
        ("password", presence(p.password.is_some())),
        ("login", login),
        ("remote in", p.remote_in.clone()),
        ("remote out", p.remote_out.clone()),
        ("local in", path(&p.local_in)),
        ("local out", path(&p.local_out)),
        ("suppress in", list(&p.suppress_in)),
        ("suppress out", list(&p.suppress_out)),
    ];
    if p.protocol.kind() == ProfileKind::Ftp {
        fields.push(("tls", p.use_tls.to_string()));
    }
    fields
}

fn cipher_fields(p: &CipherProfile) -> Vec<(&'static str, String)> {
    vec![
        ("extension", p.extension.clone()),
        ("encrypt dir", path(&p.encrypt_dir)),
        ("decrypt dir", path(&p.decrypt_dir)),
        ("suppress encrypt", list(&p.suppress_encrypt)),
        ("suppress decrypt", list(&p.suppress_decrypt)),
        ("public key", presence(p.public_key.is_some())),
        ("private key", presence(p.private_key.is_some())),
        ("passphrase", presence(p.passphrase.is_some())),
    ]
}

fn presence(set: bool) -> String {
    if set { REDACTED.to_string() } else { "-".to_string() }
}

fn path(value: &Option<PathBuf>) -> String {
    value
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autokit_secrets::{CredentialResolver, MemorySecretStore, SecretEntry};

    #[test]
    fn secrets_never_appear_in_fields() {
        let entry = SecretEntry::new("sftp", "Vendor")
            .with_url("sftp://files.example.test/")
            .with_username("svc")
            .with_password("hunter2")
            .with_property("SuppressInDefault", "*.tmp|*.part");
        let profile = CredentialResolver::new(MemorySecretStore::new().with_entry(entry), "|")
            .resolve(ProfileKind::Sftp, "Vendor")
            .unwrap();

        let fields = fields(&profile);
        assert!(fields.iter().all(|(_, v)| !v.contains("hunter2")));
        assert!(fields.contains(&("password", REDACTED.to_string())));
        assert!(fields.contains(&("host", "files.example.test".to_string())));
        assert!(fields.contains(&("suppress in", "*.tmp, *.part".to_string())));
    }
}
