use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::material::{KeyMaterial, PublicMaterial};
use crate::error::{error_codes, KeyringError, KeyringResult};

pub const FINGERPRINT_SIZE: usize = 20;
pub const KEYID_SIZE: usize = 8;

/// Version 4 OpenPGP fingerprint
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

/// Key ID: the low 64 bits of the fingerprint
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId([u8; KEYID_SIZE]);

fn decode_fixed<const N: usize>(s: &str, what: &str) -> KeyringResult<[u8; N]> {
    let bytes = hex::decode(s).map_err(|e| KeyringError::InvalidParameter {
        parameter: what.to_string(),
        expected: format!("{} hex characters", N * 2),
        actual: e.to_string(),
        error_code: error_codes::KEY_INVALID_HEX,
    })?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyringError::InvalidParameter {
            parameter: what.to_string(),
            expected: format!("{} bytes", N),
            actual: format!("{} bytes", bytes.len()),
            error_code: error_codes::KEY_INVALID_HEX,
        })
}

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }

    pub fn keyid(&self) -> KeyId {
        let mut id = [0u8; KEYID_SIZE];
        id.copy_from_slice(&self.0[FINGERPRINT_SIZE - KEYID_SIZE..]);
        KeyId(id)
    }
}

impl KeyId {
    pub fn from_bytes(bytes: [u8; KEYID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEYID_SIZE] {
        &self.0
    }

    /// Search id for a 32-bit short key id. The short id occupies the
    /// first half; the second half is zero.
    pub fn from_short(short: [u8; 4]) -> Self {
        let mut id = [0u8; KEYID_SIZE];
        id[..4].copy_from_slice(&short);
        KeyId(id)
    }

    /// Whether a key with this id is found by searching for `search`.
    ///
    /// Either the full ids are equal, or the key's low 32 bits equal the
    /// first half of the search id (short-id lookup).
    pub fn matches(&self, search: &KeyId) -> bool {
        self == search || self.0[4..] == search.0[..4]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self)
    }
}

impl FromStr for Fingerprint {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<FINGERPRINT_SIZE>(s, "fingerprint").map(Fingerprint)
    }
}

impl FromStr for KeyId {
    type Err = KeyringError;

    /// Accepts a full 16-digit id or an 8-digit short id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 8 {
            return decode_fixed::<4>(s, "keyid").map(KeyId::from_short);
        }
        decode_fixed::<KEYID_SIZE>(s, "keyid").map(KeyId)
    }
}

/// Append an OpenPGP MPI: 16-bit bit count, then the significant bytes
fn write_mpi(out: &mut Vec<u8>, value: &[u8]) -> KeyringResult<()> {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let significant = &value[start..];
    let bits = match significant.first() {
        Some(top) => (significant.len() - 1) * 8 + (8 - top.leading_zeros() as usize),
        None => 0,
    };
    let bits = u16::try_from(bits).map_err(|_| KeyringError::InvalidParameter {
        parameter: "mpi".to_string(),
        expected: "at most 65535 bits".to_string(),
        actual: format!("{} bits", bits),
        error_code: error_codes::KEY_PACKET_MALFORMED,
    })?;
    out.extend_from_slice(&bits.to_be_bytes());
    out.extend_from_slice(significant);
    Ok(())
}

/// Serialize the public-key packet body hashed by the v4 fingerprint
pub(crate) fn public_key_body(creation_time: u32, material: &KeyMaterial) -> KeyringResult<Vec<u8>> {
    let mut body = vec![4u8];
    body.extend_from_slice(&creation_time.to_be_bytes());
    body.push(material.alg.id());
    match &material.public {
        PublicMaterial::Rsa { n, e } => {
            write_mpi(&mut body, n)?;
            write_mpi(&mut body, e)?;
        }
        PublicMaterial::Dsa { p, q, g, y } => {
            for value in [p, q, g, y] {
                write_mpi(&mut body, value)?;
            }
        }
        PublicMaterial::Elgamal { p, g, y } => {
            for value in [p, g, y] {
                write_mpi(&mut body, value)?;
            }
        }
        PublicMaterial::Ec { curve, point, kdf } => {
            let oid = curve.params().oid;
            body.push(oid.len() as u8);
            body.extend_from_slice(oid);
            write_mpi(&mut body, point)?;
            if let Some(kdf) = kdf {
                body.extend_from_slice(&[0x03, 0x01, kdf.hash_alg, kdf.cipher_alg]);
            }
        }
    }
    Ok(body)
}

/// Compute the v4 fingerprint: SHA-1 over `0x99 || u16 length || body`
pub fn compute_fingerprint(creation_time: u32, material: &KeyMaterial) -> KeyringResult<Fingerprint> {
    let body = public_key_body(creation_time, material)?;
    let len = u16::try_from(body.len()).map_err(|_| {
        KeyringError::invalid_parameter("public key", "at most 65535 bytes", &body.len().to_string())
    })?;

    let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    ctx.update(&[0x99]);
    ctx.update(&len.to_be_bytes());
    ctx.update(&body);
    let digest = ctx.finish();

    let bytes: [u8; FINGERPRINT_SIZE] = digest
        .as_ref()
        .try_into()
        .map_err(|_| KeyringError::invalid_parameter("fingerprint", "20 bytes", "other"))?;
    Ok(Fingerprint(bytes))
}
