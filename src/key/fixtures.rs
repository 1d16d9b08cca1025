//! Deterministic keys for unit tests. Material is synthetic: it has the
//! right shape but is not a working RSA key.

use super::*;
use crate::key_store::KeyStoreFormat;
use crate::protection::{KdfParams, ProtectionParams, SymmetricCipher};
use crate::secure_memory::SecureBytes;

pub(crate) const CREATED: u32 = 1_600_000_000;

fn filled(seed: u8, len: usize, top: u8) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..len).map(|i| seed.wrapping_mul(31).wrapping_add(i as u8)).collect();
    bytes[0] = top;
    bytes
}

pub(crate) fn rsa_material(seed: u8) -> KeyMaterial {
    KeyMaterial::new(
        PublicKeyAlgorithm::Rsa,
        PublicMaterial::Rsa {
            n: filled(seed, 256, 0xC0 | (seed & 0x3F)),
            e: vec![0x01, 0x00, 0x01],
        },
    )
}

pub(crate) fn rsa_secret(seed: u8) -> SecretMaterial {
    SecretMaterial::Rsa {
        d: SecureBytes::from(filled(seed.wrapping_add(1), 256, 0x5A)),
        p: SecureBytes::from(filled(seed.wrapping_add(2), 128, 0xE1)),
        q: SecureBytes::from(filled(seed.wrapping_add(3), 128, 0xD3)),
        u: SecureBytes::from(filled(seed.wrapping_add(4), 128, 0x42)),
    }
}

pub(crate) fn signature(issuer: &Key, sig_type: SignatureType, created: u32) -> Signature {
    Signature {
        sig_type,
        version: 4,
        alg: issuer.alg(),
        hash_alg: 8,
        creation_time: created,
        issuer_keyid: Some(*issuer.keyid()),
        issuer_fingerprint: Some(*issuer.fingerprint()),
        material: created.to_be_bytes().to_vec(),
    }
}

/// Public primary key with one self-certified user id
pub(crate) fn primary_key(seed: u8, uid: &str) -> Key {
    let packet = KeyPacket::new_public(PacketTag::PublicKey, CREATED, rsa_material(seed));
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).unwrap();
    let idx = key.add_userid(UserId::new(uid)).unwrap();
    let cert = signature(&key, SignatureType::CertPositive, CREATED);
    key.add_signature(cert, Some(idx)).unwrap();
    key
}

/// Unlocked, unprotected secret primary key with one self-certified user id
pub(crate) fn secret_primary_key(seed: u8, uid: &str) -> Key {
    let mut material = rsa_material(seed);
    material.set_secret(rsa_secret(seed)).unwrap();
    let packet = KeyPacket {
        tag: PacketTag::SecretKey,
        version: 4,
        creation_time: CREATED,
        material,
        secret: None,
    };
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).unwrap();
    let idx = key.add_userid(UserId::new(uid)).unwrap();
    let cert = signature(&key, SignatureType::CertPositive, CREATED);
    key.add_signature(cert, Some(idx)).unwrap();
    key
}

/// Public subkey bound to `primary`
pub(crate) fn subkey(seed: u8, primary: &Key) -> Key {
    let packet = KeyPacket::new_public(PacketTag::PublicSubkey, CREATED, rsa_material(seed));
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).unwrap();
    key.add_signature(signature(primary, SignatureType::SubkeyBinding, CREATED), None)
        .unwrap();
    key
}

/// Argon2 parameters cheap enough for tests
pub(crate) fn fast_params() -> ProtectionParams {
    ProtectionParams {
        cipher: SymmetricCipher::Aes256Gcm,
        kdf: KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        },
    }
}
