//! SFTP backend over libssh2

use std::fs::File;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use autokit_fs::RemotePath;
use autokit_secrets::{LoginMethod, TransferProfile};
use ssh2::{Session, Sftp};

use super::{RemoteEntry, TransferBackend};
use crate::{Error, Result};

pub struct Ssh2Backend {
    session: Session,
    sftp: Sftp,
}

impl Ssh2Backend {
    /// Open a TCP connection, run the SSH handshake and authenticate with
    /// the profile's login method.
    pub fn connect(profile: &TransferProfile, timeout: Duration) -> Result<Self> {
        let addr = (profile.host.as_str(), profile.port)
            .to_socket_addrs()
            .map_err(|e| Error::transient("connect", format!("{}: {e}", profile.host)))?
            .next()
            .ok_or_else(|| Error::transfer("connect", format!("{}: no address", profile.host)))?;

        tracing::debug!(host = %profile.host, port = profile.port, "Connecting over SFTP");
        let tcp = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| Error::transient("connect", format!("{addr}: {e}")))?;

        let mut session = Session::new().map_err(|e| Error::transfer("connect", e))?;
        session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| Error::transient("handshake", e))?;

        match &profile.login {
            LoginMethod::Password => {
                let password = profile
                    .password
                    .as_ref()
                    .ok_or_else(|| Error::transfer("login", "no password in profile"))?;
                session
                    .userauth_password(&profile.username, password.expose())
                    .map_err(|e| Error::transfer("login", e))?;
            }
            LoginMethod::Key {
                private_key,
                passphrase,
            } => {
                // libssh2 only reads keys from disk.
                let mut key_file = tempfile::NamedTempFile::new()?;
                key_file.write_all(private_key.expose().as_bytes())?;
                key_file.flush()?;
                session
                    .userauth_pubkey_file(
                        &profile.username,
                        None,
                        key_file.path(),
                        passphrase.as_ref().map(|p| p.expose()),
                    )
                    .map_err(|e| Error::transfer("login", e))?;
            }
        }
        if !session.authenticated() {
            return Err(Error::transfer("login", "authentication rejected"));
        }

        let sftp = session.sftp().map_err(|e| Error::transfer("connect", e))?;
        tracing::info!(host = %profile.host, profile = %profile.name, "SFTP session established");
        Ok(Self { session, sftp })
    }
}

impl TransferBackend for Ssh2Backend {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let entries = self
            .sftp
            .readdir(Path::new(dir.as_str()))
            .map_err(|e| Error::transfer("list", format!("{dir}: {e}")))?;

        Ok(entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_str()?.to_string();
                if name == "." || name == ".." {
                    return None;
                }
                Some(RemoteEntry {
                    name,
                    is_dir: stat.is_dir(),
                })
            })
            .collect())
    }

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()> {
        let mut source = self
            .sftp
            .open(Path::new(remote.as_str()))
            .map_err(|e| Error::transfer("get", format!("{remote}: {e}")))?;
        let mut target = File::create(local)?;
        std::io::copy(&mut source, &mut target)
            .map_err(|e| Error::transfer("get", format!("{remote}: {e}")))?;
        Ok(())
    }

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()> {
        let mut source = File::open(local)?;
        let mut target = self
            .sftp
            .create(Path::new(remote.as_str()))
            .map_err(|e| Error::transfer("put", format!("{remote}: {e}")))?;
        std::io::copy(&mut source, &mut target)
            .map_err(|e| Error::transfer("put", format!("{remote}: {e}")))?;
        Ok(())
    }

    fn delete(&mut self, remote: &RemotePath) -> Result<()> {
        self.sftp
            .unlink(Path::new(remote.as_str()))
            .map_err(|e| Error::transfer("delete", format!("{remote}: {e}")))
    }

    fn close(&mut self) -> Result<()> {
        self.session
            .disconnect(None, "closing", None)
            .map_err(|e| Error::transfer("close", e))
    }
}
