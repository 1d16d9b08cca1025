//! Key builders shared by the integration tests

#![allow(dead_code)]

use pgp_keyring::prelude::*;

pub const CREATED: u32 = 1_650_000_000;

fn filled(seed: u8, len: usize, top: u8) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..len)
        .map(|i| seed.wrapping_mul(37).wrapping_add(i as u8))
        .collect();
    bytes[0] = top;
    bytes
}

pub fn material(seed: u8) -> KeyMaterial {
    KeyMaterial::new(
        PublicKeyAlgorithm::Rsa,
        PublicMaterial::Rsa {
            n: filled(seed, 256, 0x80 | (seed & 0x7F)),
            e: vec![0x01, 0x00, 0x01],
        },
    )
}

pub fn secret(seed: u8) -> SecretMaterial {
    SecretMaterial::Rsa {
        d: SecureBytes::from(filled(seed ^ 0x11, 256, 0x71)),
        p: SecureBytes::from(filled(seed ^ 0x22, 128, 0xF3)),
        q: SecureBytes::from(filled(seed ^ 0x33, 128, 0xE9)),
        u: SecureBytes::from(filled(seed ^ 0x44, 128, 0x1D)),
    }
}

pub fn sig_by(issuer: &Key, sig_type: SignatureType) -> Signature {
    Signature {
        sig_type,
        version: 4,
        alg: issuer.alg(),
        hash_alg: 8,
        creation_time: CREATED,
        issuer_keyid: Some(*issuer.keyid()),
        issuer_fingerprint: Some(*issuer.fingerprint()),
        material: vec![sig_type.code()],
    }
}

/// Primary key with one self-certified user id, unlocked when `with_secret`
pub fn primary(seed: u8, uid: &str, with_secret: bool) -> Key {
    let mut material = material(seed);
    let tag = if with_secret {
        material
            .set_secret(secret(seed))
            .expect("Failed to install secret material");
        PacketTag::SecretKey
    } else {
        PacketTag::PublicKey
    };
    let packet = KeyPacket {
        tag,
        version: 4,
        creation_time: CREATED,
        material,
        secret: None,
    };
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).expect("Failed to build key");
    let idx = key.add_userid(UserId::new(uid)).expect("Failed to add user id");
    let cert = sig_by(&key, SignatureType::CertPositive);
    key.add_signature(cert, Some(idx))
        .expect("Failed to add certification");
    key
}

/// Public subkey bound to `primary`
pub fn subkey(seed: u8, primary: &Key) -> Key {
    let packet = KeyPacket::new_public(PacketTag::PublicSubkey, CREATED, material(seed));
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).expect("Failed to build subkey");
    key.add_signature(sig_by(primary, SignatureType::SubkeyBinding), None)
        .expect("Failed to add binding");
    key
}

/// Cheap Argon2 settings so tests stay fast
pub fn fast_params() -> ProtectionParams {
    ProtectionParams {
        cipher: SymmetricCipher::Aes256Gcm,
        kdf: KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        },
    }
}
