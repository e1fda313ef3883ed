//! Integration tests against the literal scenarios in the keyring
//! specification (file format version check, rotation survival,
//! auto_update create/rotate behavior).

use sso_keyring::{AutoUpdateOutcome, FixedClock, Key, KeyType, Keyring};

#[test]
fn scenario_key_rotation_survives_decrypt() {
    // A token sealed at t=1001 under a key created at t=1000 must still
    // decode after a second key is added at t=2000, when decoded at
    // t=2500 (spec.md §8 scenario 2).
    let clock_seal = FixedClock(1001);
    let mut ring = Keyring::new(1);
    ring.add(1000, 1000, Key::generate(KeyType::Aes, 16).unwrap(), &clock_seal);

    let ciphertext = sso_keyring::seal(&ring, b"payload", &clock_seal).unwrap();

    ring.add(2000, 2000, Key::generate(KeyType::Aes, 16).unwrap(), &FixedClock(2000));

    let clock_decode = FixedClock(2500);
    let plaintext = sso_keyring::open(&ring, &ciphertext, &clock_decode).unwrap();
    assert_eq!(plaintext, b"payload");
}

#[test]
fn scenario_file_format_version_mismatch() {
    // Write a keyring, flip the `v` attribute to 2, and confirm that
    // reading it back fails with FileVersion (spec.md §8 scenario 3).
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring");
    let clock = FixedClock(1000);

    let mut ring = Keyring::new(1);
    ring.add(0, 0, Key::generate(KeyType::Aes, 16).unwrap(), &clock);
    ring.write(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let as_text = String::from_utf8(bytes.clone()).unwrap();
    assert!(as_text.starts_with("v=1;"));
    bytes[2] = b'2';
    std::fs::write(&path, &bytes).unwrap();

    let err = Keyring::read(&path).unwrap_err();
    assert_eq!(err.kind(), sso_keyring::ErrorKind::FileVersion);
}

#[test]
fn scenario_auto_update_creates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring");
    let clock = FixedClock(1_700_000_000);

    let (ring, outcome, status) = Keyring::auto_update(&path, true, 86400, &clock).unwrap();
    assert_eq!(outcome, AutoUpdateOutcome::Create);
    assert!(status.is_ok());
    assert!(path.exists());
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.entries()[0].key.length(), 16);
}

#[test]
fn scenario_auto_update_rotates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring");

    let base_time = 1_700_000_000u64;
    let old_valid_after = base_time - 100_000;
    let clock_old = FixedClock(old_valid_after);
    let mut ring = Keyring::new(1);
    ring.add(old_valid_after, old_valid_after, Key::generate(KeyType::Aes, 16).unwrap(), &clock_old);
    ring.write(&path).unwrap();

    let clock_now = FixedClock(base_time);
    let (ring, outcome, status) = Keyring::auto_update(&path, true, 86400, &clock_now).unwrap();
    assert_eq!(outcome, AutoUpdateOutcome::Update);
    assert!(status.is_ok());
    assert_eq!(ring.len(), 2);
    let newest = ring.entries().iter().map(|e| e.valid_after).max().unwrap();
    assert_eq!(newest, base_time);
}

#[test]
fn auto_update_twice_in_a_row_mutates_file_at_most_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring");
    let clock = FixedClock(1_700_000_000);

    let (_, first_outcome, _) = Keyring::auto_update(&path, true, 86400, &clock).unwrap();
    assert_eq!(first_outcome, AutoUpdateOutcome::Create);
    let modified_after_first = std::fs::metadata(&path).unwrap().modified().unwrap();

    let (ring, second_outcome, _) = Keyring::auto_update(&path, true, 86400, &clock).unwrap();
    assert_eq!(second_outcome, AutoUpdateOutcome::None);
    assert_eq!(ring.len(), 1);
    let modified_after_second = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(modified_after_first, modified_after_second);
}

#[test]
fn empty_keyring_only_future_keys_yields_not_found_on_encrypt() {
    let clock = FixedClock(1000);
    let mut ring = Keyring::new(1);
    ring.add(0, 5000, Key::generate(KeyType::Aes, 16).unwrap(), &clock);
    let err = sso_keyring::seal(&ring, b"x", &clock).unwrap_err();
    assert_eq!(err.kind(), sso_keyring::ErrorKind::NotFound);
}
