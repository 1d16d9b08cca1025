//! Integration tests for loading and writing key stores on disk

mod common;

use pgp_keyring::key_store::key_file_name;
use pgp_keyring::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_directory_load_skips_corrupt_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let keys_dir = dir.path().join("private-keys-v1.d");

    let mut store = KeyStore::new(KeyStoreFormat::G10, &keys_dir).expect("Failed to create store");
    let mut grips = Vec::new();
    for seed in 1..=3 {
        let key = common::primary(seed, &format!("user{}@example.org", seed), true);
        grips.push(*store.add_key(key).expect("Failed to add key").grip());
    }
    store.write_to_path(&NativeCodec).expect("Failed to write store");
    assert_eq!(fs::read_dir(&keys_dir).expect("Failed to list dir").count(), 3);

    // Truncate one of the key files
    let victim = keys_dir.join(key_file_name(&grips[1]));
    let bytes = fs::read(&victim).expect("Failed to read key file");
    fs::write(&victim, &bytes[..bytes.len() / 2]).expect("Failed to corrupt key file");

    let mut loaded = KeyStore::new(KeyStoreFormat::G10, &keys_dir).expect("Failed to create store");
    let count = loaded.load_from_path(&NativeCodec).expect("Directory load must not abort");
    assert_eq!(count, 2);
    assert!(loaded.get_key_by_grip(&grips[0]).is_some());
    assert!(loaded.get_key_by_grip(&grips[1]).is_none());
    assert!(loaded.get_key_by_grip(&grips[2]).is_some());
}

#[test]
fn test_single_file_load_aborts_on_corruption() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pubring.gpg");

    let mut store = KeyStore::new(KeyStoreFormat::Gpg, &path).expect("Failed to create store");
    for seed in 1..=3 {
        store
            .add_key(common::primary(seed, "shared@example.org", false))
            .expect("Failed to add key");
    }
    store.write_to_path(&NativeCodec).expect("Failed to write store");

    let mut bytes = fs::read(&path).expect("Failed to read keyring");
    bytes.truncate(bytes.len() - 10);
    fs::write(&path, &bytes).expect("Failed to corrupt keyring");

    let mut loaded = KeyStore::new(KeyStoreFormat::Gpg, &path).expect("Failed to create store");
    let err = loaded.load_from_path(&NativeCodec).unwrap_err();
    assert!(matches!(err, KeyringError::ParseError { .. }));
    assert!(loaded.is_empty());
}

#[test]
fn test_keyring_round_trip_preserves_structure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pubring.kbx");

    let primary = common::primary(10, "owner@example.org", false);
    let sub_a = common::subkey(11, &primary);
    let sub_b = common::subkey(12, &primary);

    let mut store = KeyStore::new(KeyStoreFormat::Kbx, &path).expect("Failed to create store");
    store.add_key(sub_a.clone()).expect("Failed to add subkey");
    store.add_key(primary.clone()).expect("Failed to add primary");
    store.add_key(sub_b.clone()).expect("Failed to add subkey");
    store.write_to_path(&NativeCodec).expect("Failed to write store");

    let mut loaded = KeyStore::new(KeyStoreFormat::Kbx, &path).expect("Failed to create store");
    assert_eq!(loaded.load_from_path(&NativeCodec).expect("Failed to load"), 3);

    let stored_primary = loaded
        .get_key_by_fingerprint(primary.fingerprint())
        .expect("Primary missing");
    assert_eq!(stored_primary.subkey_grips().len(), 2);
    for sub in [&sub_a, &sub_b] {
        let stored = loaded.get_key_by_grip(sub.grip()).expect("Subkey missing");
        assert_eq!(stored.primary_grip(), Some(primary.grip()));
        assert!(stored.is_valid());
    }
}

#[test]
fn test_store_from_config_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config_path = dir.path().join("keyring.json");

    let config = KeyStoreConfig {
        format: KeyStoreFormat::G10,
        path: dir.path().join("keys"),
        disable_validation: true,
        protection: common::fast_params(),
    };
    config.to_file(&config_path).expect("Failed to save config");

    let loaded = KeyStoreConfig::from_file(&config_path).expect("Failed to load config");
    let mut store = KeyStore::from_config(&loaded).expect("Failed to open store");
    assert_eq!(store.format(), KeyStoreFormat::G10);
    assert_eq!(store.protection_params(), &common::fast_params());

    let key = store
        .add_key(common::primary(20, "cfg@example.org", false))
        .expect("Failed to add key");
    assert!(!key.is_validated());
}
