use super::*;
use crate::error::{error_codes, KeyringError};
use crate::key::fixtures::*;
use crate::key::{KeyState, SecretPacket};
use crate::secure_memory::SecureBytes;
use std::cell::RefCell;

fn protected_key(seed: u8, passphrase: &str) -> crate::key::Key {
    let mut key = secret_primary_key(seed, "protected@example.org");
    key.protect(&FixedPassphrase::new(passphrase), &fast_params())
        .unwrap();
    key
}

#[test]
fn test_protect_keeps_lock_state() {
    let key = protected_key(1, "password");
    assert_eq!(key.state(), KeyState::Unlocked);
    assert!(key.is_protected());

    let info = key.protection().unwrap();
    assert_eq!(info.cipher, SymmetricCipher::Aes256Gcm);
    assert_eq!(info.kdf, fast_params().kdf);
    assert_eq!(info.nonce.len(), 12);
}

#[test]
fn test_full_passphrase_lifecycle() {
    let mut key = protected_key(2, "password");
    key.lock().unwrap();
    assert_eq!(key.state(), KeyState::ProtectedLocked);

    let err = key.unlock(&FixedPassphrase::new("badpass")).unwrap_err();
    assert!(matches!(err, KeyringError::WrongPassphrase { .. }));
    assert_eq!(err.error_code(), error_codes::WRONG_PASSPHRASE);
    assert_eq!(key.state(), KeyState::ProtectedLocked);

    key.unlock(&FixedPassphrase::new("password")).unwrap();
    assert_eq!(key.state(), KeyState::Unlocked);
    assert_eq!(key.material().secret(), Some(&rsa_secret(2)));

    key.lock().unwrap();
    key.unprotect(&FixedPassphrase::new("password")).unwrap();
    assert_eq!(key.state(), KeyState::UnprotectedLocked);
    assert!(!key.is_protected());

    key.protect(&FixedPassphrase::new("newpass"), &fast_params())
        .unwrap();
    assert_eq!(key.state(), KeyState::ProtectedLocked);

    assert!(key.unlock(&FixedPassphrase::new("password")).is_err());
    key.unlock(&FixedPassphrase::new("newpass")).unwrap();
    assert_eq!(key.material().secret(), Some(&rsa_secret(2)));
}

#[test]
fn test_unlock_unprotected_key_skips_provider() {
    let mut key = secret_primary_key(3, "plain@example.org");
    key.lock().unwrap();
    assert_eq!(key.state(), KeyState::UnprotectedLocked);

    key.unlock(&NoPassphrase).unwrap();
    assert_eq!(key.state(), KeyState::Unlocked);
}

#[test]
fn test_lock_and_unlock_are_idempotent() {
    let mut key = protected_key(4, "password");
    key.unlock(&NoPassphrase).unwrap();
    assert_eq!(key.state(), KeyState::Unlocked);

    key.lock().unwrap();
    key.lock().unwrap();
    assert_eq!(key.state(), KeyState::ProtectedLocked);
}

#[test]
fn test_cancelled_provider() {
    let mut key = protected_key(5, "password");
    key.lock().unwrap();

    let err = key.unlock(&NoPassphrase).unwrap_err();
    assert!(matches!(err, KeyringError::ProviderCancelled { .. }));
    assert_eq!(key.state(), KeyState::ProtectedLocked);

    let err = key.unprotect(&NoPassphrase).unwrap_err();
    assert_eq!(err.error_code(), error_codes::PROVIDER_CANCELLED);
    assert!(key.is_protected());
}

#[test]
fn test_empty_passphrase_is_refused() {
    let mut key = secret_primary_key(6, "empty@example.org");
    let err = key
        .protect(&FixedPassphrase::new(""), &fast_params())
        .unwrap_err();
    assert!(matches!(err, KeyringError::ProviderCancelled { .. }));
    assert!(!key.is_protected());
    assert!(matches!(key.packet().secret, Some(SecretPacket::Plain(_))));
}

#[test]
fn test_protect_requires_accessible_material() {
    let mut key = protected_key(7, "password");
    key.lock().unwrap();
    let err = key
        .protect(&FixedPassphrase::new("other"), &fast_params())
        .unwrap_err();
    assert!(matches!(err, KeyringError::LockedMaterialUnavailable { .. }));

    // the original passphrase still works
    key.unlock(&FixedPassphrase::new("password")).unwrap();
}

#[test]
fn test_unprotect_requires_protected_locked() {
    let mut unlocked = protected_key(8, "password");
    let err = unlocked
        .unprotect(&FixedPassphrase::new("password"))
        .unwrap_err();
    assert!(matches!(err, KeyringError::InvalidState { .. }));

    let mut plain = secret_primary_key(8, "plain@example.org");
    plain.lock().unwrap();
    assert!(plain.unprotect(&FixedPassphrase::new("x")).is_err());
}

#[test]
fn test_public_key_rejects_secret_operations() {
    let mut key = primary_key(9, "public@example.org");
    let provider = FixedPassphrase::new("password");

    for err in [
        key.unlock(&provider).unwrap_err(),
        key.lock().unwrap_err(),
        key.unprotect(&provider).unwrap_err(),
        key.protect(&provider, &fast_params()).unwrap_err(),
    ] {
        assert_eq!(err.error_code(), error_codes::INVALID_KEY_STATE);
    }
}

#[test]
fn test_provider_sees_operation_and_key() {
    let mut key = protected_key(10, "password");
    key.lock().unwrap();
    let expected_keyid = *key.keyid();
    let expected_grip = *key.grip();

    let seen = RefCell::new(Vec::new());
    let provider = |ctx: &PassphraseContext, buf: &mut SecureBytes| -> bool {
        seen.borrow_mut().push(*ctx);
        buf.set(b"password");
        true
    };

    key.unlock(&provider).unwrap();
    key.lock().unwrap();
    key.unprotect(&provider).unwrap();

    let seen = seen.into_inner();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].operation, PassphraseOperation::Unlock);
    assert_eq!(seen[1].operation, PassphraseOperation::Unprotect);
    assert!(seen
        .iter()
        .all(|ctx| ctx.keyid == expected_keyid && ctx.grip == expected_grip));
}

#[test]
fn test_chacha_protection() {
    let mut key = secret_primary_key(11, "chacha@example.org");
    let params = ProtectionParams {
        cipher: SymmetricCipher::ChaCha20Poly1305,
        ..fast_params()
    };
    key.protect(&FixedPassphrase::new("password"), &params)
        .unwrap();
    assert_eq!(
        key.protection().map(|p| p.cipher),
        Some(SymmetricCipher::ChaCha20Poly1305)
    );

    key.lock().unwrap();
    key.unlock(&FixedPassphrase::new("password")).unwrap();
    assert_eq!(key.material().secret(), Some(&rsa_secret(11)));
}

#[test]
fn test_ciphertext_is_bound_to_its_key() {
    let donor = protected_key(12, "password");
    let mut target = protected_key(13, "password");
    target.lock().unwrap();
    target.packet.secret = donor.packet.secret.clone();

    let err = target
        .unlock(&FixedPassphrase::new("password"))
        .unwrap_err();
    assert!(matches!(err, KeyringError::WrongPassphrase { .. }));
}

#[test]
fn test_each_protection_uses_fresh_salt_and_nonce() {
    let a = protected_key(14, "password");
    let b = protected_key(14, "password");
    let (a, b) = (a.protection().unwrap(), b.protection().unwrap());
    assert_ne!(a.salt, b.salt);
    assert_ne!(a.nonce, b.nonce);
}

#[test]
fn test_invalid_kdf_parameters() {
    let mut key = secret_primary_key(15, "kdf@example.org");
    let params = ProtectionParams {
        cipher: SymmetricCipher::Aes256Gcm,
        kdf: KdfParams {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 1,
        },
    };
    let err = key
        .protect(&FixedPassphrase::new("password"), &params)
        .unwrap_err();
    assert_eq!(err.error_code(), error_codes::KEY_DERIVATION_FAILED);
    assert!(!key.is_protected());
}

#[test]
fn test_malformed_nonce_is_rejected() {
    let plaintext = SecureBytes::new(b"secret body");
    let passphrase = SecureBytes::new(b"password");
    let (mut info, ciphertext) =
        s2k::encrypt_secret(&plaintext, &passphrase, &fast_params(), b"aad").unwrap();

    let decrypted = s2k::decrypt_secret(&info, &ciphertext, &passphrase, b"aad", "test").unwrap();
    assert_eq!(decrypted, plaintext);

    info.nonce.truncate(5);
    let err = s2k::decrypt_secret(&info, &ciphertext, &passphrase, b"aad", "test").unwrap_err();
    assert_eq!(err.error_code(), error_codes::ENCRYPTION_FAILED);
}

#[test]
fn test_parameter_presets() {
    let low = ProtectionParams::low_resource_params();
    let high = ProtectionParams::high_security_params();
    assert!(low.kdf.memory_cost < ProtectionParams::default().kdf.memory_cost);
    assert!(high.kdf.memory_cost > ProtectionParams::default().kdf.memory_cost);
    assert_eq!(high.cipher, SymmetricCipher::ChaCha20Poly1305);
}
