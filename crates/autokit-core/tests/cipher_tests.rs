//! Encrypt and decrypt batches with a reversible stand-in cipher

use autokit_core::{CipherRequest, CipherSession, Error, Outcome, OutcomeKind, SkipReason};
use autokit_secrets::{CipherProfile, CredentialResolver, MemorySecretStore, SecretEntry};
use autokit_test_utils::secrets::{TEST_PUBLIC_KEY, pgp_entry};
use autokit_test_utils::{FakeCipher, TestWorkspace};
use pretty_assertions::assert_eq;

fn profile(entry: SecretEntry) -> CipherProfile {
    let title = entry.title.clone();
    CredentialResolver::new(MemorySecretStore::new().with_entry(entry), "|")
        .resolve_cipher(&title)
        .unwrap()
}

#[test]
fn encrypt_archives_sources_and_is_idempotent() {
    let ws = TestWorkspace::new();
    let dir = ws.dir_with_archive("work");
    ws.write("work/a.csv", "alpha");
    ws.write("work/b.csv", "beta");
    let cipher = FakeCipher::new();

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), cipher.clone());
    let report = session.encrypt(CipherRequest::new().dir(&dir)).unwrap();

    let mut artifacts = report.artifacts();
    artifacts.sort();
    assert_eq!(artifacts, vec!["a.csv.pgp", "b.csv.pgp"]);
    assert_eq!(ws.files_in("work"), vec!["a.csv.pgp", "b.csv.pgp"]);
    assert_eq!(ws.files_in("work/Archive"), vec!["a.csv", "b.csv"]);
    assert_eq!(
        std::fs::read(dir.join("a.csv.pgp")).unwrap(),
        FakeCipher::armor(b"alpha")
    );

    let again = session.encrypt(CipherRequest::new().dir(&dir)).unwrap();
    assert!(again.artifacts().is_empty());
    assert_eq!(again.count(OutcomeKind::Skipped), 2);
    assert_eq!(
        again.outcome("a.csv.pgp"),
        Some(&Outcome::Skipped(SkipReason::AlreadyEncrypted))
    );
    assert_eq!(cipher.encrypts(), 2);
}

#[test]
fn encrypt_skips_when_artifact_already_exists() {
    let ws = TestWorkspace::new();
    let dir = ws.dir("work");
    ws.write("work/a.csv", "alpha");
    ws.write("work/a.csv.pgp", FakeCipher::armor(b"alpha"));
    let cipher = FakeCipher::new();

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), cipher.clone());
    let report = session
        .encrypt(CipherRequest::new().dir(&dir).files("a.csv"))
        .unwrap();

    assert_eq!(
        report.outcome("a.csv"),
        Some(&Outcome::Skipped(SkipReason::AlreadyEncrypted))
    );
    assert_eq!(cipher.encrypts(), 0);
}

#[test]
fn decrypt_restores_original_names() {
    let ws = TestWorkspace::new();
    let dir = ws.dir_with_archive("work");
    ws.write("work/a.csv.pgp", FakeCipher::armor(b"alpha"));
    ws.write("work/notes.txt", "plain");

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), FakeCipher::new());
    let report = session.decrypt(CipherRequest::new().dir(&dir)).unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv"]);
    assert_eq!(
        report.outcome("notes.txt"),
        Some(&Outcome::Skipped(SkipReason::AlreadyDecrypted))
    );
    assert_eq!(ws.read("work/a.csv"), "alpha");
    ws.assert_file_exists("work/Archive/a.csv.pgp");

    let again = session.decrypt(CipherRequest::new().dir(&dir)).unwrap();
    assert!(again.artifacts().is_empty());
}

#[test]
fn truncated_armor_is_skipped_as_unreadable() {
    let ws = TestWorkspace::new();
    let dir = ws.dir("work");
    ws.write("work/broken.pgp", "-----BEGIN PGP MESSAGE-----\n0a0b\n");
    let cipher = FakeCipher::new();

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), cipher.clone());
    let decrypt = session.decrypt(CipherRequest::new().dir(&dir)).unwrap();
    let encrypt = session.encrypt(CipherRequest::new().dir(&dir)).unwrap();

    for report in [decrypt, encrypt] {
        assert_eq!(
            report.outcome("broken.pgp"),
            Some(&Outcome::Skipped(SkipReason::Unreadable))
        );
    }
    assert_eq!(cipher.encrypts() + cipher.decrypts(), 0);
}

#[test]
fn failed_file_keeps_its_source_and_others_continue() {
    let ws = TestWorkspace::new();
    let dir = ws.dir_with_archive("work");
    ws.write("work/good.csv", "fine");
    ws.write("work/bad.csv", "poison");
    let cipher = FakeCipher::new();
    cipher.fail_on("poison");

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), cipher);
    let report = session.encrypt(CipherRequest::new().dir(&dir)).unwrap();

    assert_eq!(report.artifacts(), vec!["good.csv.pgp"]);
    assert!(report.has_failures());
    assert_eq!(report.failures().next().unwrap().file, "bad.csv");
    ws.assert_file_exists("work/bad.csv");
    ws.assert_file_absent("work/bad.csv.pgp");
}

#[test]
fn encrypt_writes_audit_lines() {
    let ws = TestWorkspace::new();
    let dir = ws.dir("work");
    ws.write("work/a.csv", "alpha");

    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), FakeCipher::new());
    session
        .encrypt(CipherRequest::new().dir(&dir).cleanup(false).write_log(true))
        .unwrap();

    let lines = ws.log_lines("pgp");
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('|').collect();
    assert_eq!(fields[0], "Partner");
    assert_eq!(fields[3], "ENCRYPT");
    assert_eq!(fields[6], "a.csv.pgp");
    ws.assert_file_exists("work/a.csv");
}

#[test]
fn decrypt_without_private_key_is_fatal() {
    let ws = TestWorkspace::new();
    let dir = ws.dir("work");
    ws.write("work/a.csv.pgp", FakeCipher::armor(b"alpha"));
    let entry = SecretEntry::new("pgp", "EncryptOnly").with_attachment("PUBLIC.asc", TEST_PUBLIC_KEY);

    let mut session = CipherSession::new(profile(entry), ws.settings(), FakeCipher::new());
    let err = session.decrypt(CipherRequest::new().dir(&dir)).unwrap_err();

    assert!(matches!(
        err,
        Error::Secrets(autokit_secrets::Error::MissingField { .. })
    ));
}

#[test]
fn profile_directory_is_used_by_default() {
    let ws = TestWorkspace::new();
    let dir = ws.dir("outgoing");
    ws.write("outgoing/a.csv", "alpha");
    let entry = pgp_entry("Partner").with_property("EncryptPathDefault", dir.display().to_string());

    let mut session = CipherSession::new(profile(entry), ws.settings(), FakeCipher::new());
    let report = session.encrypt(CipherRequest::new()).unwrap();

    assert_eq!(report.artifacts(), vec!["a.csv.pgp"]);
}

#[test]
fn missing_directory_is_fatal() {
    let ws = TestWorkspace::new();
    let mut session = CipherSession::new(profile(pgp_entry("Partner")), ws.settings(), FakeCipher::new());

    let err = session
        .encrypt(CipherRequest::new().dir(ws.path("gone")))
        .unwrap_err();
    assert!(matches!(err, Error::DirectoryNotFound { .. }));

    let err = session.decrypt(CipherRequest::new()).unwrap_err();
    assert!(matches!(err, Error::NoDirectory { .. }));
}
