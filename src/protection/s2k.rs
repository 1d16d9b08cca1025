use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm,
};
use argon2::{Argon2, ParamsBuilder};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{error_codes, KeyringError, KeyringResult};
use crate::secure_memory::{with_secure_scope, SecureBytes};

/// Length of the random KDF salt stored with each protected packet
pub const SALT_SIZE: usize = 16;

/// Length of the symmetric key derived from a passphrase
const KEY_SIZE: usize = 32;

/// AEAD cipher protecting a secret key packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetricCipher {
    Aes256Gcm,
    ChaCha20Poly1305,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost (in KB)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Low-resource mode for constrained environments
    pub fn low_resource_params() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
        }
    }

    /// High-security mode for long-lived primary keys
    pub fn high_security_params() -> Self {
        Self {
            memory_cost: 262144, // 256 MB
            time_cost: 4,
            parallelism: 8,
        }
    }
}

/// Parameters chosen when protecting a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionParams {
    pub cipher: SymmetricCipher,
    pub kdf: KdfParams,
}

impl Default for ProtectionParams {
    fn default() -> Self {
        Self {
            cipher: SymmetricCipher::Aes256Gcm,
            kdf: KdfParams::default(),
        }
    }
}

impl ProtectionParams {
    pub fn low_resource_params() -> Self {
        Self {
            cipher: SymmetricCipher::Aes256Gcm,
            kdf: KdfParams::low_resource_params(),
        }
    }

    pub fn high_security_params() -> Self {
        Self {
            cipher: SymmetricCipher::ChaCha20Poly1305,
            kdf: KdfParams::high_security_params(),
        }
    }
}

/// Everything needed to decrypt a protected secret packet, apart from
/// the passphrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionInfo {
    pub cipher: SymmetricCipher,
    pub kdf: KdfParams,
    pub salt: [u8; SALT_SIZE],
    pub nonce: Vec<u8>,
}

/// Derive the symmetric key from a passphrase with Argon2id
fn derive_key(passphrase: &SecureBytes, salt: &[u8], kdf: &KdfParams) -> KeyringResult<SecureBytes> {
    let mut builder = ParamsBuilder::new();
    builder
        .m_cost(kdf.memory_cost)
        .t_cost(kdf.time_cost)
        .p_cost(kdf.parallelism)
        .output_len(KEY_SIZE);

    let argon2_params = builder.build().map_err(|e| {
        KeyringError::protection_error(
            "key derivation",
            &format!("Failed to build Argon2 parameters: {}", e),
            error_codes::KEY_DERIVATION_FAILED,
        )
    })?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut key = vec![0u8; KEY_SIZE];
    if let Err(e) = argon2.hash_password_into(passphrase.as_bytes(), salt, &mut key) {
        key.zeroize();
        return Err(KeyringError::protection_error(
            "key derivation",
            &format!("Failed to derive key: {}", e),
            error_codes::KEY_DERIVATION_FAILED,
        ));
    }
    Ok(SecureBytes::from(key))
}

fn nonce_for(cipher: SymmetricCipher) -> Vec<u8> {
    match cipher {
        SymmetricCipher::Aes256Gcm => Aes256Gcm::generate_nonce(&mut OsRng).to_vec(),
        SymmetricCipher::ChaCha20Poly1305 => ChaCha20Poly1305::generate_nonce(&mut OsRng).to_vec(),
    }
}

/// Both ciphers use 96-bit nonces
const NONCE_SIZE: usize = 12;

fn check_nonce(nonce: &[u8]) -> Result<(), String> {
    if nonce.len() != NONCE_SIZE {
        return Err(format!("nonce is {} bytes, expected {}", nonce.len(), NONCE_SIZE));
    }
    Ok(())
}

fn aead_encrypt(
    cipher: SymmetricCipher,
    key: &[u8],
    nonce: &[u8],
    payload: Payload<'_, '_>,
) -> Result<Vec<u8>, String> {
    check_nonce(nonce)?;
    match cipher {
        SymmetricCipher::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .encrypt(aes_gcm::Nonce::from_slice(nonce), payload)
            .map_err(|e| e.to_string()),
        SymmetricCipher::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .encrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            .map_err(|e| e.to_string()),
    }
}

/// `Ok(None)` when the authentication tag does not verify
fn aead_decrypt(
    cipher: SymmetricCipher,
    key: &[u8],
    nonce: &[u8],
    payload: Payload<'_, '_>,
) -> Result<Option<Vec<u8>>, String> {
    check_nonce(nonce)?;
    match cipher {
        SymmetricCipher::Aes256Gcm => Ok(Aes256Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .decrypt(aes_gcm::Nonce::from_slice(nonce), payload)
            .ok()),
        SymmetricCipher::ChaCha20Poly1305 => Ok(ChaCha20Poly1305::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .decrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            .ok()),
    }
}

/// Encrypt a plaintext secret packet body
///
/// # Arguments
///
/// * `plaintext` - Serialized secret material
/// * `passphrase` - Passphrase to derive the key from
/// * `params` - Cipher and KDF cost
/// * `aad` - Data bound to the ciphertext (the key's fingerprint)
///
/// # Returns
///
/// The protection record and the ciphertext with its authentication tag
pub(crate) fn encrypt_secret(
    plaintext: &SecureBytes,
    passphrase: &SecureBytes,
    params: &ProtectionParams,
    aad: &[u8],
) -> KeyringResult<(ProtectionInfo, Vec<u8>)> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let nonce = nonce_for(params.cipher);

    let mut key = derive_key(passphrase, &salt, &params.kdf)?;
    let ciphertext = with_secure_scope(&mut key, |key| {
        aead_encrypt(
            params.cipher,
            key.as_bytes(),
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad,
            },
        )
    })
    .map_err(|e| {
        KeyringError::protection_error("encrypt", &e, error_codes::ENCRYPTION_FAILED)
    })?;

    Ok((
        ProtectionInfo {
            cipher: params.cipher,
            kdf: params.kdf,
            salt,
            nonce,
        },
        ciphertext,
    ))
}

/// Decrypt a protected secret packet body
///
/// A failed authentication tag means the passphrase was wrong (or the
/// packet was altered) and is reported as `WrongPassphrase`.
pub(crate) fn decrypt_secret(
    info: &ProtectionInfo,
    ciphertext: &[u8],
    passphrase: &SecureBytes,
    aad: &[u8],
    keyid: &str,
) -> KeyringResult<SecureBytes> {
    let mut key = derive_key(passphrase, &info.salt, &info.kdf)?;
    let plaintext = with_secure_scope(&mut key, |key| {
        aead_decrypt(
            info.cipher,
            key.as_bytes(),
            &info.nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
    })
    .map_err(|e| KeyringError::protection_error("decrypt", &e, error_codes::ENCRYPTION_FAILED))?;

    plaintext
        .map(SecureBytes::from)
        .ok_or_else(|| KeyringError::wrong_passphrase(keyid))
}
