use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::curves::{decode_param, Curve};
use crate::error::{error_codes, KeyringError, KeyringResult};
use crate::key::{KeyMaterial, MaterialFamily, PublicMaterial};

/// Size of a keygrip in bytes (SHA-1 digest length)
pub const GRIP_SIZE: usize = 20;

/// Keygrip: the libgcrypt-compatible identity of a key's public material
///
/// Two keys with equal grips are the same cryptographic key, whatever
/// packets or signatures each copy carries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grip([u8; GRIP_SIZE]);

impl Grip {
    pub fn from_bytes(bytes: [u8; GRIP_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; GRIP_SIZE] {
        &self.0
    }

    /// Upper-case hex, as used for directory-format file names
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for Grip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Grip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grip({})", self.to_hex())
    }
}

impl FromStr for Grip {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| KeyringError::InvalidParameter {
            parameter: "grip".to_string(),
            expected: "40 hex characters".to_string(),
            actual: e.to_string(),
            error_code: error_codes::KEY_INVALID_HEX,
        })?;
        let array: [u8; GRIP_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| KeyringError::InvalidParameter {
                    parameter: "grip".to_string(),
                    expected: format!("{} bytes", GRIP_SIZE),
                    actual: format!("{} bytes", bytes.len()),
                    error_code: error_codes::KEY_INVALID_HEX,
                })?;
        Ok(Self(array))
    }
}

/// Streams MPIs into SHA-1 using libgcrypt's S-expression conventions
struct GripHasher {
    ctx: Context,
}

impl GripHasher {
    fn new() -> Self {
        Self {
            ctx: Context::new(&SHA1_FOR_LEGACY_USE_ONLY),
        }
    }

    /// Hash one big-endian integer.
    ///
    /// Leading zero bytes are skipped. With a name the value is wrapped as
    /// `(1:<name><len>:<bytes>)`. With `lzero` a zero byte is prepended when
    /// the top bit of the first significant byte is set.
    fn hash_mpi(&mut self, value: &[u8], name: Option<char>, lzero: bool) {
        let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
        let significant = &value[start..];
        let pad = lzero && significant.first().map_or(false, |b| b & 0x80 != 0);

        if let Some(name) = name {
            let len = significant.len() + usize::from(pad);
            self.ctx.update(format!("(1:{}{}:", name, len).as_bytes());
        }
        if pad {
            self.ctx.update(&[0x00]);
        }
        self.ctx.update(significant);
        if name.is_some() {
            self.ctx.update(b")");
        }
    }

    fn hash_curve_param(&mut self, curve: Curve, name: char, hex_value: &str) -> KeyringResult<()> {
        let value = decode_param(curve.params().name, &name.to_string(), hex_value)?;
        self.hash_mpi(&value, Some(name), false);
        Ok(())
    }

    fn hash_ec(&mut self, curve: Curve, point: &[u8]) -> KeyringResult<()> {
        let params = curve.params();
        self.hash_curve_param(curve, 'p', params.p)?;
        self.hash_curve_param(curve, 'a', params.a)?;
        self.hash_curve_param(curve, 'b', params.b)?;
        self.hash_mpi(&curve.base_point()?, Some('g'), false);
        self.hash_curve_param(curve, 'n', params.n)?;

        if curve.has_prefixed_point() {
            if point.is_empty() {
                return Err(KeyringError::InvalidParameter {
                    parameter: "q".to_string(),
                    expected: "prefixed 25519 point".to_string(),
                    actual: "empty point".to_string(),
                    error_code: error_codes::GRIP_INVALID_MATERIAL,
                });
            }
            self.hash_mpi(&point[1..], Some('q'), false);
        } else {
            self.hash_mpi(point, Some('q'), false);
        }
        Ok(())
    }

    fn finish(self) -> KeyringResult<Grip> {
        let digest = self.ctx.finish();
        let bytes: [u8; GRIP_SIZE] = digest.as_ref().try_into().map_err(|_| {
            KeyringError::grip_error(
                &format!("digest is {} bytes", digest.as_ref().len()),
                error_codes::GRIP_SIZE_MISMATCH,
            )
        })?;
        Ok(Grip(bytes))
    }
}

/// Compute the keygrip of a key's public material
///
/// # Arguments
///
/// * `material` - Key material; only the public part is hashed
///
/// # Returns
///
/// The 20-byte grip, or `UnsupportedAlgorithm` when the algorithm has no
/// grip scheme. No partial digest is ever returned.
pub fn compute_grip(material: &KeyMaterial) -> KeyringResult<Grip> {
    let family = material
        .alg
        .family()
        .ok_or_else(|| KeyringError::unsupported_algorithm(&material.alg.to_string()))?;

    let mut hasher = GripHasher::new();
    match (family, &material.public) {
        (MaterialFamily::Rsa, PublicMaterial::Rsa { n, .. }) => {
            hasher.hash_mpi(n, None, true);
        }
        (MaterialFamily::Dsa, PublicMaterial::Dsa { p, q, g, y }) => {
            hasher.hash_mpi(p, Some('p'), true);
            hasher.hash_mpi(q, Some('q'), true);
            hasher.hash_mpi(g, Some('g'), true);
            hasher.hash_mpi(y, Some('y'), true);
        }
        (MaterialFamily::Elgamal, PublicMaterial::Elgamal { p, g, y }) => {
            hasher.hash_mpi(p, Some('p'), true);
            hasher.hash_mpi(g, Some('g'), true);
            hasher.hash_mpi(y, Some('y'), true);
        }
        (MaterialFamily::Ec, PublicMaterial::Ec { curve, point, .. }) => {
            hasher.hash_ec(*curve, point)?;
        }
        (family, public) => {
            return Err(KeyringError::InvalidParameter {
                parameter: "material".to_string(),
                expected: format!("{:?} public material", family),
                actual: format!("{:?} public material", public.family()),
                error_code: error_codes::GRIP_INVALID_MATERIAL,
            });
        }
    }
    hasher.finish()
}
