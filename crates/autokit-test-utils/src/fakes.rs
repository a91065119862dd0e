//! Scripted backends.
//!
//! Both fakes share their state through an `Rc`, so a test can keep a
//! handle after moving a clone into a session and inspect what happened.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use autokit_core::{CipherBackend, Error, RemoteEntry, Result, TransferBackend};
use autokit_fs::RemotePath;
use autokit_secrets::SecretString;

const BEGIN: &str = "-----BEGIN PGP MESSAGE-----\n";
const END: &str = "\n-----END PGP MESSAGE-----\n";

#[derive(Debug, Default)]
struct RemoteState {
    /// dir -> files in insertion order
    dirs: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    fail_get: HashSet<String>,
    interrupt_get: HashSet<String>,
    fail_put: HashSet<String>,
    fail_list: HashSet<String>,
    gets: usize,
    puts: usize,
    deletes: usize,
    closed: bool,
}

/// In-memory remote server.
#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    state: Rc<RefCell<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an (empty) remote directory.
    pub fn mkdir(&self, dir: &str) -> &Self {
        self.state
            .borrow_mut()
            .dirs
            .entry(RemotePath::new(dir).to_string())
            .or_default();
        self
    }

    pub fn add_file(&self, dir: &str, name: &str, content: &[u8]) -> &Self {
        let mut state = self.state.borrow_mut();
        let files = state
            .dirs
            .entry(RemotePath::new(dir).to_string())
            .or_default();
        files.retain(|(n, _)| n != name);
        files.push((name.to_string(), content.to_vec()));
        self
    }

    /// Make `get` of `name` fail in any directory.
    pub fn fail_get(&self, name: &str) -> &Self {
        self.state.borrow_mut().fail_get.insert(name.to_string());
        self
    }

    /// Write the first half of `name` locally, then fail the download.
    pub fn interrupt_get(&self, name: &str) -> &Self {
        self.state.borrow_mut().interrupt_get.insert(name.to_string());
        self
    }

    /// Drop every scripted failure.
    pub fn heal(&self) -> &Self {
        let mut state = self.state.borrow_mut();
        state.fail_get.clear();
        state.interrupt_get.clear();
        state.fail_put.clear();
        state.fail_list.clear();
        self
    }

    pub fn fail_put(&self, name: &str) -> &Self {
        self.state.borrow_mut().fail_put.insert(name.to_string());
        self
    }

    pub fn fail_list(&self, dir: &str) -> &Self {
        self.state
            .borrow_mut()
            .fail_list
            .insert(RemotePath::new(dir).to_string());
        self
    }

    /// File names in `dir`, in insertion order.
    pub fn files(&self, dir: &str) -> Vec<String> {
        self.state
            .borrow()
            .dirs
            .get(RemotePath::new(dir).as_str())
            .map(|files| files.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    pub fn content(&self, dir: &str, name: &str) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .dirs
            .get(RemotePath::new(dir).as_str())?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    pub fn gets(&self) -> usize {
        self.state.borrow().gets
    }

    pub fn puts(&self) -> usize {
        self.state.borrow().puts
    }

    pub fn deletes(&self) -> usize {
        self.state.borrow().deletes
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn split(path: &RemotePath) -> (String, String) {
        let dir = path.parent().unwrap_or_else(RemotePath::root).to_string();
        let name = path.file_name().unwrap_or_default().to_string();
        (dir, name)
    }
}

impl TransferBackend for FakeRemote {
    fn list(&mut self, dir: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let state = self.state.borrow();
        if state.fail_list.contains(dir.as_str()) {
            return Err(Error::transfer("list", format!("{dir}: permission denied")));
        }
        let files = state
            .dirs
            .get(dir.as_str())
            .ok_or_else(|| Error::transfer("list", format!("{dir}: no such directory")))?;

        let mut entries: Vec<RemoteEntry> =
            files.iter().map(|(n, _)| RemoteEntry::file(n.clone())).collect();
        let prefix = dir.join("");
        for sub in state.dirs.keys() {
            if let Some(rest) = sub.strip_prefix(prefix.as_str())
                && !rest.is_empty()
                && !rest.contains('/')
            {
                entries.push(RemoteEntry::dir(rest));
            }
        }
        Ok(entries)
    }

    fn get(&mut self, remote: &RemotePath, local: &Path) -> Result<()> {
        let (dir, name) = Self::split(remote);
        let mut state = self.state.borrow_mut();
        if state.fail_get.contains(&name) {
            return Err(Error::transfer("get", format!("{remote}: connection reset")));
        }
        let content = state
            .dirs
            .get(&dir)
            .and_then(|files| files.iter().find(|(n, _)| *n == name))
            .map(|(_, c)| c.clone())
            .ok_or_else(|| Error::transfer("get", format!("{remote}: no such file")))?;
        if state.interrupt_get.contains(&name) {
            fs::write(local, &content[..content.len() / 2])?;
            return Err(Error::transfer("get", format!("{remote}: connection reset mid-copy")));
        }
        fs::write(local, content)?;
        state.gets += 1;
        Ok(())
    }

    fn put(&mut self, local: &Path, remote: &RemotePath) -> Result<()> {
        let (dir, name) = Self::split(remote);
        if self.state.borrow().fail_put.contains(&name) {
            return Err(Error::transfer("put", format!("{remote}: quota exceeded")));
        }
        let content = fs::read(local)?;
        self.add_file(&dir, &name, &content);
        self.state.borrow_mut().puts += 1;
        Ok(())
    }

    fn delete(&mut self, remote: &RemotePath) -> Result<()> {
        let (dir, name) = Self::split(remote);
        let mut state = self.state.borrow_mut();
        let files = state
            .dirs
            .get_mut(&dir)
            .ok_or_else(|| Error::transfer("delete", format!("{remote}: no such file")))?;
        files.retain(|(n, _)| *n != name);
        state.deletes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CipherState {
    fail_markers: Vec<Vec<u8>>,
    encrypts: usize,
    decrypts: usize,
}

/// Reversible stand-in for a real cipher.
///
/// Encryption wraps the hex-encoded input in ASCII armor, so the output is
/// recognized as an encrypted envelope; decryption reverses it.
#[derive(Debug, Clone, Default)]
pub struct FakeCipher {
    state: Rc<RefCell<CipherState>>,
}

impl FakeCipher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any operation whose input contains `marker`.
    pub fn fail_on(&self, marker: &str) -> &Self {
        self.state
            .borrow_mut()
            .fail_markers
            .push(marker.as_bytes().to_vec());
        self
    }

    pub fn encrypts(&self) -> usize {
        self.state.borrow().encrypts
    }

    pub fn decrypts(&self) -> usize {
        self.state.borrow().decrypts
    }

    /// What `encrypt` would produce for `data`.
    pub fn armor(data: &[u8]) -> Vec<u8> {
        let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
        format!("{BEGIN}{hex}{END}").into_bytes()
    }

    fn check(&self, data: &[u8]) -> Result<()> {
        let state = self.state.borrow();
        for marker in &state.fail_markers {
            if data.windows(marker.len()).any(|w| w == marker.as_slice()) {
                return Err(Error::cipher("injected failure"));
            }
        }
        Ok(())
    }
}

impl CipherBackend for FakeCipher {
    fn encrypt(&mut self, data: &[u8], _public_key: &SecretString) -> Result<Vec<u8>> {
        self.check(data)?;
        self.state.borrow_mut().encrypts += 1;
        Ok(Self::armor(data))
    }

    fn decrypt(
        &mut self,
        data: &[u8],
        _private_key: &SecretString,
        _passphrase: &SecretString,
    ) -> Result<Vec<u8>> {
        self.check(data)?;
        let text = std::str::from_utf8(data).map_err(Error::cipher)?;
        let hex = text
            .trim()
            .strip_prefix(BEGIN.trim_end())
            .and_then(|rest| rest.strip_suffix(END.trim()))
            .ok_or_else(|| Error::cipher("not an armored message"))?
            .trim();
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| Error::cipher("corrupt payload"))
            })
            .collect::<Result<Vec<u8>>>()?;
        self.state.borrow_mut().decrypts += 1;
        Ok(bytes)
    }
}
