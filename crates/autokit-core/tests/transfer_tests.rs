//! Download and upload batches against scripted and local backends

use autokit_core::{
    Error, LocalBackend, Outcome, OutcomeKind, SkipReason, TransferRequest, TransferSession,
};
use autokit_secrets::{CredentialResolver, MemorySecretStore, Protocol, TransferProfile};
use autokit_test_utils::secrets::sftp_entry;
use autokit_test_utils::{FakeRemote, TestWorkspace};
use pretty_assertions::assert_eq;

fn profile(entry: autokit_secrets::SecretEntry) -> TransferProfile {
    let title = entry.title.clone();
    CredentialResolver::new(MemorySecretStore::new().with_entry(entry), "|")
        .resolve_transfer(Protocol::Sftp, &title)
        .unwrap()
}

fn remote_with(files: &[&str]) -> FakeRemote {
    let remote = FakeRemote::new();
    remote.mkdir("/outbound");
    for name in files {
        remote.add_file("/outbound", name, name.as_bytes());
    }
    remote
}

#[test]
fn download_deletes_remote_and_skips_on_rerun() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    let remote = remote_with(&["a.csv", "b.csv"]);

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let report = session
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv", "b.csv"]);
    assert_eq!(ws.read("in/a.csv"), "a.csv");
    assert!(remote.files("/outbound").is_empty());

    // Files reappear remotely, but are already present locally.
    remote.add_file("/outbound", "a.csv", b"again");
    let second = session
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();
    assert!(second.artifacts().is_empty());
    assert_eq!(
        second.outcome("a.csv"),
        Some(&Outcome::Skipped(SkipReason::AlreadyPresent))
    );
    assert_eq!(remote.files("/outbound"), vec!["a.csv"]);
}

#[test]
fn download_skips_files_already_archived_locally() {
    let ws = TestWorkspace::new();
    let local = ws.dir_with_archive("in");
    ws.write("in/Archive/a.csv", "old");
    let remote = remote_with(&["a.csv", "b.csv"]);

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let report = session
        .download(TransferRequest::new().local_dir(&local).cleanup(false))
        .unwrap();

    assert_eq!(report.artifacts(), vec!["b.csv"]);
    assert_eq!(
        report.outcome("a.csv"),
        Some(&Outcome::Skipped(SkipReason::AlreadyArchived))
    );
    assert_eq!(remote.deletes(), 0);
}

#[test]
fn one_failed_download_does_not_stop_the_batch() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    let remote = remote_with(&["a.csv", "b.csv", "c.csv"]);
    remote.fail_get("b.csv");

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let report = session
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv", "c.csv"]);
    assert_eq!(report.count(OutcomeKind::Failed), 1);
    assert_eq!(remote.files("/outbound"), vec!["b.csv"]);
}

#[test]
fn interrupted_download_is_retried_on_next_run() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    let remote = FakeRemote::new();
    remote.mkdir("/outbound");
    remote.add_file("/outbound", "big.csv", b"complete contents");
    remote.interrupt_get("big.csv");

    let first = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone())
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();
    assert_eq!(first.count(OutcomeKind::Failed), 1);
    assert!(ws.files_in("in").is_empty());
    assert_eq!(remote.files("/outbound"), vec!["big.csv"]);

    remote.heal();
    let second = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone())
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();
    assert_eq!(
        second.outcome("big.csv"),
        Some(&Outcome::Succeeded {
            artifact: "big.csv".to_string()
        })
    );
    assert_eq!(ws.read("in/big.csv"), "complete contents");
    assert!(remote.files("/outbound").is_empty());
}

#[test]
fn stale_partial_file_is_replaced() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    ws.write("in/.a.csv.part", "stale");
    let remote = remote_with(&["a.csv"]);

    let report = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote)
        .download(TransferRequest::new().local_dir(&local))
        .unwrap();
    assert_eq!(report.artifacts(), vec!["a.csv"]);
    assert_eq!(ws.files_in("in"), vec!["a.csv"]);
    assert_eq!(ws.read("in/a.csv"), "a.csv");
}

#[test]
fn profile_suppression_and_explicit_selection() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    let remote = remote_with(&["a.csv", "a.tmp", "b.txt"]);
    let entry = sftp_entry("Vendor").with_property("SuppressInDefault", "'*.tmp'");

    let mut session = TransferSession::new(profile(entry), ws.settings(), remote.clone());
    let report = session
        .download(
            TransferRequest::new()
                .local_dir(&local)
                .files(["a.*", "missing.csv"])
                .cleanup(false),
        )
        .unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv"]);
    assert_eq!(report.outcome("a.tmp"), Some(&Outcome::Suppressed));
    assert_eq!(report.misses, vec!["missing.csv"]);
    assert_eq!(report.outcome("b.txt"), None);
}

#[test]
fn empty_suppress_override_disables_profile_suppression() {
    let ws = TestWorkspace::new();
    let local = ws.dir("in");
    let remote = remote_with(&["a.tmp"]);
    let entry = sftp_entry("Vendor").with_property("SuppressInDefault", "*.tmp");

    let mut session = TransferSession::new(profile(entry), ws.settings(), remote);
    let report = session
        .download(TransferRequest::new().local_dir(&local).suppress(Vec::new()))
        .unwrap();

    assert_eq!(report.artifacts(), vec!["a.tmp"]);
}

#[test]
fn missing_local_directory_is_fatal() {
    let ws = TestWorkspace::new();
    let remote = remote_with(&["a.csv"]);

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let err = session
        .download(TransferRequest::new().local_dir(ws.path("nope")))
        .unwrap_err();

    assert!(matches!(err, Error::DirectoryNotFound { .. }));
    assert_eq!(remote.gets(), 0);
}

#[test]
fn no_local_directory_anywhere_is_fatal() {
    let ws = TestWorkspace::new();
    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), FakeRemote::new());
    let err = session.download(TransferRequest::new()).unwrap_err();
    assert!(matches!(err, Error::NoDirectory { .. }));
}

#[test]
fn upload_archives_local_files_and_skips_remote_duplicates() {
    let ws = TestWorkspace::new();
    let local = ws.dir_with_archive("out");
    ws.write("out/new.csv", "new");
    ws.write("out/dup.csv", "dup");
    let remote = FakeRemote::new();
    remote.mkdir("/inbound").add_file("/inbound", "dup.csv", b"dup");

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let report = session
        .upload(TransferRequest::new().local_dir(&local).write_log(true))
        .unwrap();

    assert_eq!(report.artifacts(), vec!["new.csv"]);
    assert_eq!(
        report.outcome("dup.csv"),
        Some(&Outcome::Skipped(SkipReason::AlreadyPresent))
    );
    ws.assert_file_exists("out/Archive/new.csv");
    ws.assert_file_exists("out/dup.csv");
    assert_eq!(remote.content("/inbound", "new.csv"), Some(b"new".to_vec()));

    let lines = ws.log_lines("sftp");
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('|').collect();
    assert_eq!(fields[0], "Vendor");
    assert_eq!(fields[3], "PUT");
    assert_eq!(fields[5], "/inbound");
    assert_eq!(fields[6], "new.csv");
}

#[test]
fn upload_without_archive_directory_leaves_files() {
    let ws = TestWorkspace::new();
    let local = ws.dir("out");
    ws.write("out/a.csv", "a");
    let remote = FakeRemote::new();
    remote.mkdir("/inbound");

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
    let report = session.upload(TransferRequest::new().local_dir(&local)).unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv"]);
    ws.assert_file_exists("out/a.csv");
    ws.assert_file_absent("out/Archive");
}

#[test]
fn session_closes_backend_on_drop() {
    let ws = TestWorkspace::new();
    let remote = FakeRemote::new();
    {
        let _session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote.clone());
        assert!(!remote.is_closed());
    }
    assert!(remote.is_closed());
}

#[test]
fn list_defaults_to_inbound_remote_directory() {
    let ws = TestWorkspace::new();
    let remote = remote_with(&["a.csv"]);
    remote.mkdir("/outbound/Archive");

    let mut session = TransferSession::new(profile(sftp_entry("Vendor")), ws.settings(), remote);
    let entries = session.list(None).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.name == "Archive" && e.is_dir));
}

#[test]
fn local_backend_round_trip() {
    let ws = TestWorkspace::new();
    let share = ws.dir("share/outbound");
    ws.write("share/outbound/report.csv", "r");
    let local = ws.dir("in");

    let mut session = TransferSession::new(
        profile(sftp_entry("Vendor")),
        ws.settings(),
        LocalBackend::new(ws.path("share")),
    );
    let report = session.download(TransferRequest::new().local_dir(&local)).unwrap();

    assert_eq!(report.artifacts(), vec!["report.csv"]);
    assert!(!share.join("report.csv").exists());
    ws.assert_file_exists("in/report.csv");
}
