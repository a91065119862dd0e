//! End-to-end batch scenarios across settings, secret store and sessions.
//!
//! Each test wires a file-backed configuration and secret store, a mounted
//! share standing in for the remote server, and the reversible fake cipher.

use autokit_core::{
    CipherRequest, CipherSession, DirectoryMonitor, LocalBackend, OutcomeKind, Settings,
    TransferRequest, TransferSession,
};
use autokit_secrets::{CredentialResolver, Protocol, TomlSecretStore};
use autokit_test_utils::secrets::{pgp_entry, sftp_entry};
use autokit_test_utils::{FakeCipher, FakeRemote, TestWorkspace};
use pretty_assertions::assert_eq;

struct Deployment {
    ws: TestWorkspace,
    settings: Settings,
    resolver: CredentialResolver<TomlSecretStore>,
}

impl Deployment {
    fn new() -> Self {
        let ws = TestWorkspace::new();
        ws.write_store(&[
            sftp_entry("Vendor").with_property("SuppressInDefault", "'*.part|*.tmp'"),
            pgp_entry("Partner"),
        ]);
        let settings = Settings::load(&ws.write_config()).unwrap();
        let store = TomlSecretStore::open(&settings.profile_store).unwrap();
        let resolver = CredentialResolver::new(store, settings.suppress_delimiter.as_str());
        Self {
            ws,
            settings,
            resolver,
        }
    }

    fn transfer(&self) -> TransferSession<LocalBackend> {
        let profile = self
            .resolver
            .resolve_transfer(Protocol::Sftp, "Vendor")
            .unwrap();
        TransferSession::new(
            profile,
            self.settings.clone(),
            LocalBackend::new(self.ws.path("share")),
        )
    }

    fn cipher(&self, backend: FakeCipher) -> CipherSession<FakeCipher> {
        let profile = self.resolver.resolve_cipher("Partner").unwrap();
        CipherSession::new(profile, self.settings.clone(), backend)
    }
}

#[test]
fn inbound_download_then_decrypt_is_idempotent() {
    let d = Deployment::new();
    d.ws.write("share/outbound/a.csv.pgp", FakeCipher::armor(b"alpha"));
    d.ws.write("share/outbound/b.csv.pgp", FakeCipher::armor(b"beta"));
    d.ws.write("share/outbound/c.csv.part", "partial");
    let inbox = d.ws.dir_with_archive("inbox");

    let run = |d: &Deployment| {
        let downloaded = d
            .transfer()
            .download(TransferRequest::new().local_dir(&inbox).write_log(true))
            .unwrap();
        let decrypted = d
            .cipher(FakeCipher::new())
            .decrypt(CipherRequest::new().dir(&inbox).write_log(true))
            .unwrap();
        (downloaded, decrypted)
    };

    let (downloaded, decrypted) = run(&d);
    let mut fetched = downloaded.artifacts();
    fetched.sort();
    assert_eq!(fetched, vec!["a.csv.pgp", "b.csv.pgp"]);
    assert_eq!(downloaded.count(OutcomeKind::Suppressed), 1);
    let mut plain = decrypted.artifacts();
    plain.sort();
    assert_eq!(plain, vec!["a.csv", "b.csv"]);

    assert_eq!(d.ws.files_in("inbox"), vec!["a.csv", "b.csv"]);
    assert_eq!(d.ws.files_in("inbox/Archive"), vec!["a.csv.pgp", "b.csv.pgp"]);
    assert_eq!(d.ws.files_in("share/outbound"), vec!["c.csv.part"]);
    assert_eq!(d.ws.read("inbox/b.csv"), "beta");

    // Unchanged directories: nothing new, nothing failed.
    let (downloaded, decrypted) = run(&d);
    for report in [&downloaded, &decrypted] {
        assert!(report.artifacts().is_empty());
        assert!(!report.has_failures());
    }

    assert_eq!(d.ws.log_lines("sftp").len(), 2);
    assert_eq!(d.ws.log_lines("pgp").len(), 2);
    assert!(d.ws.log_lines("pgp").iter().all(|l| l.contains("|DECRYPT|")));
}

#[test]
fn outbound_encrypt_then_upload_only_ciphertext() {
    let d = Deployment::new();
    d.ws.dir("share/inbound");
    let outbox = d.ws.dir_with_archive("outbox");
    d.ws.write("outbox/report.csv", "numbers");
    d.ws.write("outbox/summary.txt", "words");

    let encrypted = d
        .cipher(FakeCipher::new())
        .encrypt(CipherRequest::new().dir(&outbox))
        .unwrap();
    assert_eq!(encrypted.count(OutcomeKind::Succeeded), 2);

    let uploaded = d
        .transfer()
        .upload(TransferRequest::new().local_dir(&outbox).files("*.pgp"))
        .unwrap();
    let mut sent = uploaded.artifacts();
    sent.sort();
    assert_eq!(sent, vec!["report.csv.pgp", "summary.txt.pgp"]);

    assert_eq!(
        d.ws.files_in("share/inbound"),
        vec!["report.csv.pgp", "summary.txt.pgp"]
    );
    assert!(d.ws.files_in("outbox").is_empty());
    assert_eq!(
        d.ws.files_in("outbox/Archive"),
        vec![
            "report.csv",
            "report.csv.pgp",
            "summary.txt",
            "summary.txt.pgp"
        ]
    );
}

#[test]
fn suppression_and_miss_behaviour_through_a_session() {
    let d = Deployment::new();
    for name in ["a.txt", "b.txt", "c.txt"] {
        d.ws.write(&format!("share/outbound/{name}"), name);
    }
    let inbox = d.ws.dir("inbox");

    let report = d
        .transfer()
        .download(
            TransferRequest::new()
                .local_dir(&inbox)
                .suppress(vec!["b.*".to_string()])
                .cleanup(false),
        )
        .unwrap();
    let mut names = report.artifacts();
    names.sort();
    assert_eq!(names, vec!["a.txt", "c.txt"]);

    let report = d
        .transfer()
        .download(
            TransferRequest::new()
                .local_dir(&inbox)
                .files("x.csv")
                .cleanup(false),
        )
        .unwrap();
    assert!(report.artifacts().is_empty());
    assert_eq!(report.misses, vec!["x.csv"]);
    assert!(!report.has_failures());
}

#[test]
fn one_failure_among_many_does_not_stop_the_chain() {
    let d = Deployment::new();
    let remote = FakeRemote::new();
    remote.mkdir("/outbound");
    for (name, body) in [("a.csv", "fine"), ("b.csv", "poison"), ("c.csv", "fine too")] {
        remote.add_file("/outbound", name, &FakeCipher::armor(body.as_bytes()));
    }
    remote.fail_get("c.csv");
    let inbox = d.ws.dir("inbox");

    let profile = d.resolver.resolve_transfer(Protocol::Sftp, "Vendor").unwrap();
    let downloaded = TransferSession::new(profile, d.settings.clone(), remote.clone())
        .download(TransferRequest::new().local_dir(&inbox))
        .unwrap();
    assert_eq!(downloaded.artifacts(), vec!["a.csv", "b.csv"]);
    assert_eq!(downloaded.count(OutcomeKind::Failed), 1);
    assert_eq!(remote.files("/outbound"), vec!["c.csv"]);

    // Ciphertext saved without a .pgp suffix decrypts to a `.out` artifact.
    let cipher = FakeCipher::new();
    cipher.fail_on("706f69736f6e");
    let decrypted = d
        .cipher(cipher)
        .decrypt(CipherRequest::new().dir(&inbox))
        .unwrap();
    assert_eq!(decrypted.artifacts(), vec!["a.csv.out"]);
    assert_eq!(decrypted.count(OutcomeKind::Failed), 1);
    assert_eq!(d.ws.read("inbox/a.csv.out"), "fine");
}

#[test]
fn monitor_sees_files_landed_by_a_download() {
    let d = Deployment::new();
    let inbox = d.ws.dir("inbox");
    let mut monitor = DirectoryMonitor::open(&d.settings, &inbox).unwrap();
    assert!(monitor.modified_files(false).unwrap().is_empty());
    // Filesystem timestamps can trail the wall clock slightly.
    std::thread::sleep(std::time::Duration::from_millis(100));

    d.ws.write("share/outbound/new.csv", "n");
    d.transfer()
        .download(TransferRequest::new().local_dir(&inbox))
        .unwrap();

    let mut monitor = DirectoryMonitor::open(&d.settings, &inbox).unwrap();
    assert_eq!(monitor.modified_files(true).unwrap(), vec!["new.csv"]);
    assert_eq!(d.ws.log_lines("monitor").len(), 1);
}
