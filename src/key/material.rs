use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{error_codes, KeyringError, KeyringResult};
use crate::grip::Curve;
use crate::secure_memory::SecureBytes;

/// OpenPGP public-key algorithm identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKeyAlgorithm {
    Rsa,
    RsaEncryptOnly,
    RsaSignOnly,
    Elgamal,
    Dsa,
    Ecdh,
    Ecdsa,
    Eddsa,
    Sm2,
    Unknown(u8),
}

/// Shape of the parameters an algorithm uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialFamily {
    Rsa,
    Dsa,
    Elgamal,
    Ec,
}

impl PublicKeyAlgorithm {
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => PublicKeyAlgorithm::Rsa,
            2 => PublicKeyAlgorithm::RsaEncryptOnly,
            3 => PublicKeyAlgorithm::RsaSignOnly,
            16 => PublicKeyAlgorithm::Elgamal,
            17 => PublicKeyAlgorithm::Dsa,
            18 => PublicKeyAlgorithm::Ecdh,
            19 => PublicKeyAlgorithm::Ecdsa,
            22 => PublicKeyAlgorithm::Eddsa,
            99 => PublicKeyAlgorithm::Sm2,
            other => PublicKeyAlgorithm::Unknown(other),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            PublicKeyAlgorithm::Rsa => 1,
            PublicKeyAlgorithm::RsaEncryptOnly => 2,
            PublicKeyAlgorithm::RsaSignOnly => 3,
            PublicKeyAlgorithm::Elgamal => 16,
            PublicKeyAlgorithm::Dsa => 17,
            PublicKeyAlgorithm::Ecdh => 18,
            PublicKeyAlgorithm::Ecdsa => 19,
            PublicKeyAlgorithm::Eddsa => 22,
            PublicKeyAlgorithm::Sm2 => 99,
            PublicKeyAlgorithm::Unknown(id) => *id,
        }
    }

    /// Parameter family, `None` for algorithms this keyring cannot handle
    pub fn family(&self) -> Option<MaterialFamily> {
        match self {
            PublicKeyAlgorithm::Rsa
            | PublicKeyAlgorithm::RsaEncryptOnly
            | PublicKeyAlgorithm::RsaSignOnly => Some(MaterialFamily::Rsa),
            PublicKeyAlgorithm::Elgamal => Some(MaterialFamily::Elgamal),
            PublicKeyAlgorithm::Dsa => Some(MaterialFamily::Dsa),
            PublicKeyAlgorithm::Ecdh
            | PublicKeyAlgorithm::Ecdsa
            | PublicKeyAlgorithm::Eddsa
            | PublicKeyAlgorithm::Sm2 => Some(MaterialFamily::Ec),
            PublicKeyAlgorithm::Unknown(_) => None,
        }
    }
}

impl fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKeyAlgorithm::Rsa => f.write_str("RSA"),
            PublicKeyAlgorithm::RsaEncryptOnly => f.write_str("RSA (encrypt only)"),
            PublicKeyAlgorithm::RsaSignOnly => f.write_str("RSA (sign only)"),
            PublicKeyAlgorithm::Elgamal => f.write_str("ElGamal"),
            PublicKeyAlgorithm::Dsa => f.write_str("DSA"),
            PublicKeyAlgorithm::Ecdh => f.write_str("ECDH"),
            PublicKeyAlgorithm::Ecdsa => f.write_str("ECDSA"),
            PublicKeyAlgorithm::Eddsa => f.write_str("EdDSA"),
            PublicKeyAlgorithm::Sm2 => f.write_str("SM2"),
            PublicKeyAlgorithm::Unknown(id) => write!(f, "unknown algorithm {}", id),
        }
    }
}

/// ECDH key-derivation parameters carried in the public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcdhKdfParams {
    pub hash_alg: u8,
    pub cipher_alg: u8,
}

/// Public parameters, always present
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicMaterial {
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
    },
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
    Elgamal {
        p: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
    Ec {
        curve: Curve,
        point: Vec<u8>,
        kdf: Option<EcdhKdfParams>,
    },
}

impl PublicMaterial {
    pub fn family(&self) -> MaterialFamily {
        match self {
            PublicMaterial::Rsa { .. } => MaterialFamily::Rsa,
            PublicMaterial::Dsa { .. } => MaterialFamily::Dsa,
            PublicMaterial::Elgamal { .. } => MaterialFamily::Elgamal,
            PublicMaterial::Ec { .. } => MaterialFamily::Ec,
        }
    }
}

/// Secret parameters. Each variant is complete, so a key never holds a
/// partially populated secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretMaterial {
    Rsa {
        d: SecureBytes,
        p: SecureBytes,
        q: SecureBytes,
        u: SecureBytes,
    },
    Dsa {
        x: SecureBytes,
    },
    Elgamal {
        x: SecureBytes,
    },
    Ec {
        x: SecureBytes,
    },
}

impl SecretMaterial {
    pub fn family(&self) -> MaterialFamily {
        match self {
            SecretMaterial::Rsa { .. } => MaterialFamily::Rsa,
            SecretMaterial::Dsa { .. } => MaterialFamily::Dsa,
            SecretMaterial::Elgamal { .. } => MaterialFamily::Elgamal,
            SecretMaterial::Ec { .. } => MaterialFamily::Ec,
        }
    }

    /// Encode into the plaintext body of a secret key packet
    pub(crate) fn to_plaintext(&self) -> KeyringResult<SecureBytes> {
        Ok(SecureBytes::from(bincode::serialize(self)?))
    }

    /// Parse the plaintext body of a secret key packet
    pub(crate) fn from_plaintext(plaintext: &SecureBytes) -> KeyringResult<Self> {
        bincode::deserialize(plaintext.as_bytes()).map_err(|e| {
            KeyringError::parse_error("secret key packet", &e.to_string())
        })
    }
}

/// Algorithm-tagged key material
///
/// Secret parameters are present only while the owning key is unlocked and
/// are never serialized with the public part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMaterial {
    pub alg: PublicKeyAlgorithm,
    pub public: PublicMaterial,
    #[serde(skip)]
    secret: Option<SecretMaterial>,
}

impl KeyMaterial {
    pub fn new(alg: PublicKeyAlgorithm, public: PublicMaterial) -> Self {
        Self {
            alg,
            public,
            secret: None,
        }
    }

    pub fn secret(&self) -> Option<&SecretMaterial> {
        self.secret.as_ref()
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Install secret parameters; they must belong to the same family as
    /// the public parameters.
    pub fn set_secret(&mut self, secret: SecretMaterial) -> KeyringResult<()> {
        if secret.family() != self.public.family() {
            return Err(KeyringError::InvalidParameter {
                parameter: "secret material".to_string(),
                expected: format!("{:?}", self.public.family()),
                actual: format!("{:?}", secret.family()),
                error_code: error_codes::KEY_MATERIAL_MISMATCH,
            });
        }
        self.secret = Some(secret);
        Ok(())
    }

    /// Drop the secret parameters; their buffers zero themselves
    pub fn clear_secret(&mut self) {
        self.secret = None;
    }

    pub(crate) fn take_secret(&mut self) -> Option<SecretMaterial> {
        self.secret.take()
    }

    /// The same material without its secret part
    pub fn public_only(&self) -> Self {
        Self::new(self.alg, self.public.clone())
    }
}
