//! GnuPG subprocess backend
//!
//! `gpg` runs against a private home directory created on first use, so the
//! user's keyring is never read or modified. Key material is written and
//! imported once per backend and reused for every later file; the directory
//! is removed when the backend is dropped.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::ffi::OsStr;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Command;

use autokit_secrets::SecretString;
use tempfile::TempDir;

use super::CipherBackend;
use crate::{Error, Result};

/// Scratch home shared by every call of one backend.
#[derive(Debug)]
struct Keyring {
    dir: TempDir,
    imported: HashSet<u64>,
}

impl Keyring {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("autokit-gpg").tempdir()?;
        fs::create_dir(dir.path().join("home"))?;
        Ok(Self {
            dir,
            imported: HashSet::new(),
        })
    }

    fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Path of a file holding `secret`, written the first time it is seen.
    fn material(&self, kind: &str, secret: &SecretString) -> Result<PathBuf> {
        let path = self
            .dir
            .path()
            .join(format!("{kind}-{:016x}", fingerprint(secret)));
        if !path.exists() {
            fs::write(&path, secret.expose().as_bytes())?;
        }
        Ok(path)
    }

    fn input(&self, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join("input");
        fs::write(&path, data)?;
        Ok(path)
    }
}

fn fingerprint(secret: &SecretString) -> u64 {
    let mut hasher = DefaultHasher::new();
    secret.expose().hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug)]
pub struct GpgBackend {
    program: PathBuf,
    armor: bool,
    keyring: Option<Keyring>,
}

impl Default for GpgBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gpg"),
            armor: false,
            keyring: None,
        }
    }
}

impl GpgBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Produce ASCII-armored output when encrypting.
    pub fn with_armor(mut self, armor: bool) -> Self {
        self.armor = armor;
        self
    }

    fn keyring(&mut self) -> Result<&mut Keyring> {
        if self.keyring.is_none() {
            let keyring = Keyring::create()?;
            tracing::debug!(home = %keyring.home().display(), "Created gpg home");
            self.keyring = Some(keyring);
        }
        self.keyring
            .as_mut()
            .ok_or_else(|| Error::cipher("gpg home unavailable"))
    }

    fn run<I, S>(program: &Path, home: &Path, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.arg("--batch")
            .arg("--yes")
            .arg("--quiet")
            .arg("--no-tty")
            .arg("--homedir")
            .arg(home)
            .args(args);

        let output = cmd
            .output()
            .map_err(|e| Error::cipher(format!("failed to run {}: {e}", program.display())))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            Err(Error::cipher(format!(
                "{} exited with {code}: {}",
                program.display(),
                stderr.trim()
            )))
        }
    }
}

impl CipherBackend for GpgBackend {
    fn encrypt(&mut self, data: &[u8], public_key: &SecretString) -> Result<Vec<u8>> {
        let program = self.program.clone();
        let armor = self.armor;
        let keyring = self.keyring()?;
        let key = keyring.material("recipient", public_key)?;
        let input = keyring.input(data)?;

        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--trust-model"),
            OsStr::new("always"),
            OsStr::new("--recipient-file"),
            key.as_os_str(),
            OsStr::new("--output"),
            OsStr::new("-"),
        ];
        if armor {
            args.push(OsStr::new("--armor"));
        }
        args.push(OsStr::new("--encrypt"));
        args.push(input.as_os_str());

        tracing::debug!(bytes = data.len(), "Encrypting with gpg");
        Self::run(&program, &keyring.home(), args)
    }

    fn decrypt(
        &mut self,
        data: &[u8],
        private_key: &SecretString,
        passphrase: &SecretString,
    ) -> Result<Vec<u8>> {
        let program = self.program.clone();
        let keyring = self.keyring()?;
        let home = keyring.home();
        let pass = keyring.material("pass", passphrase)?;
        let loopback = [
            OsStr::new("--pinentry-mode"),
            OsStr::new("loopback"),
            OsStr::new("--passphrase-file"),
            pass.as_os_str(),
        ];

        let key_id = fingerprint(private_key);
        if !keyring.imported.contains(&key_id) {
            let key = keyring.material("secret", private_key)?;
            Self::run(
                &program,
                &home,
                loopback
                    .iter()
                    .copied()
                    .chain([OsStr::new("--import"), key.as_os_str()]),
            )?;
            keyring.imported.insert(key_id);
            tracing::debug!("Imported private key into gpg home");
        }

        let input = keyring.input(data)?;
        tracing::debug!(bytes = data.len(), "Decrypting with gpg");
        Self::run(
            &program,
            &home,
            loopback.iter().copied().chain([
                OsStr::new("--output"),
                OsStr::new("-"),
                OsStr::new("--decrypt"),
                input.as_os_str(),
            ]),
        )
    }
}
