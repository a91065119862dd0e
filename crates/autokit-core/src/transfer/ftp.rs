//! FTP backend, optionally upgraded to explicit TLS

use std::fs::{self, File};
use std::path::Path;
use std::str::FromStr;

use autokit_fs::RemotePath;
use autokit_secrets::TransferProfile;
use suppaftp::list::File as ListEntry;
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream as NativeTlsFtpStream, TlsConnector as NativeTlsConnector};

use super::{RemoteEntry, TransferBackend};
use crate::{Error, Result};

pub struct FtpBackend {
    stream: NativeTlsFtpStream,
}

fn ftp_error(operation: &str, e: FtpError) -> Error {
    match e {
        FtpError::ConnectionError(_) => Error::transient(operation, e),
        _ => Error::transfer(operation, e),
    }
}

impl FtpBackend {
    pub fn connect(profile: &TransferProfile) -> Result<Self> {
        let password = profile
            .password
            .as_ref()
            .ok_or_else(|| Error::transfer("login", "no password in profile"))?;

        tracing::debug!(host = %profile.host, port = profile.port, tls = profile.use_tls, "Connecting over FTP");
        let mut stream = NativeTlsFtpStream::connect((profile.host.as_str(), profile.port))
            .map_err(|e| ftp_error("connect", e))?;

        if profile.use_tls {
            let connector = TlsConnector::new().map_err(|e| Error::transfer("tls", e))?;
            stream = stream
                .into_secure(NativeTlsConnector::from(connector), &profile.host)
                .map_err(|e| ftp_error("tls", e))?;
        }

        stream
            .login(profile.username.as_str(), password.expose())
            .map_err(|e| ftp_error("login", e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| ftp_error("connect", e))?;

        tracing::info!(host = %profile.host, profile = %profile.name, "FTP session established");
        Ok(Self { stream })
    }
}

impl TransferBackend for FtpBackend {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let lines = self
            .stream
            .list(Some(dir.as_str()))
            .map_err(|e| ftp_error("list", e))?;

        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            match ListEntry::from_str(&line) {
                Ok(entry) => entries.push(RemoteEntry {
                    name: entry.name().to_string(),
                    is_dir: entry.is_directory(),
                }),
                Err(_) => tracing::debug!(line = %line, "Skipping unparseable listing line"),
            }
        }
        Ok(entries)
    }

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()> {
        let buffer = self
            .stream
            .retr_as_buffer(remote.as_str())
            .map_err(|e| ftp_error("get", e))?;
        fs::write(local, buffer.into_inner())?;
        Ok(())
    }

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()> {
        let mut source = File::open(local)?;
        self.stream
            .put_file(remote.as_str(), &mut source)
            .map_err(|e| ftp_error("put", e))?;
        Ok(())
    }

    fn delete(&mut self, remote: &RemotePath) -> Result<()> {
        self.stream
            .rm(remote.as_str())
            .map_err(|e| ftp_error("delete", e))
    }

    fn close(&mut self) -> Result<()> {
        self.stream.quit().map_err(|e| ftp_error("close", e))
    }
}
