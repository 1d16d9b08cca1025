use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{Fingerprint, KeyId};
use super::material::{KeyMaterial, PublicKeyAlgorithm};
use crate::protection::ProtectionInfo;
use crate::secure_memory::SecureBytes;

/// OpenPGP packet tags used by keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketTag {
    Signature,
    SecretKey,
    PublicKey,
    SecretSubkey,
    UserId,
    PublicSubkey,
    UserAttribute,
}

impl PacketTag {
    pub fn id(&self) -> u8 {
        match self {
            PacketTag::Signature => 2,
            PacketTag::SecretKey => 5,
            PacketTag::PublicKey => 6,
            PacketTag::SecretSubkey => 7,
            PacketTag::UserId => 13,
            PacketTag::PublicSubkey => 14,
            PacketTag::UserAttribute => 17,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self, PacketTag::PublicKey | PacketTag::SecretKey)
    }

    pub fn is_subkey(&self) -> bool {
        matches!(self, PacketTag::PublicSubkey | PacketTag::SecretSubkey)
    }

    pub fn is_secret_key(&self) -> bool {
        matches!(self, PacketTag::SecretKey | PacketTag::SecretSubkey)
    }

    /// Secret counterpart of a key tag
    pub fn to_secret(self) -> Self {
        match self {
            PacketTag::PublicKey => PacketTag::SecretKey,
            PacketTag::PublicSubkey => PacketTag::SecretSubkey,
            other => other,
        }
    }

    /// Public counterpart of a key tag
    pub fn to_public(self) -> Self {
        match self {
            PacketTag::SecretKey => PacketTag::PublicKey,
            PacketTag::SecretSubkey => PacketTag::PublicSubkey,
            other => other,
        }
    }
}

/// Persistent form of a key's secret part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretPacket {
    /// Unencrypted secret material, not yet parsed
    Plain(SecureBytes),
    /// Secret material encrypted under a passphrase-derived key
    Encrypted {
        protection: ProtectionInfo,
        ciphertext: Vec<u8>,
    },
}

/// A public or secret key packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPacket {
    pub tag: PacketTag,
    pub version: u8,
    pub creation_time: u32,
    pub material: KeyMaterial,
    pub secret: Option<SecretPacket>,
}

impl KeyPacket {
    /// A public key or subkey packet
    pub fn new_public(tag: PacketTag, creation_time: u32, material: KeyMaterial) -> Self {
        Self {
            tag: tag.to_public(),
            version: 4,
            creation_time,
            material: material.public_only(),
            secret: None,
        }
    }

    /// Copy of this packet with the secret part removed
    pub fn to_public(&self) -> Self {
        Self::new_public(self.tag, self.creation_time, self.material.clone())
    }
}

/// Signature types relevant to key structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureType {
    CertGeneric,
    CertPersona,
    CertCasual,
    CertPositive,
    SubkeyBinding,
    PrimaryKeyBinding,
    DirectKey,
    KeyRevocation,
    SubkeyRevocation,
    CertRevocation,
    Other(u8),
}

impl SignatureType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x10 => SignatureType::CertGeneric,
            0x11 => SignatureType::CertPersona,
            0x12 => SignatureType::CertCasual,
            0x13 => SignatureType::CertPositive,
            0x18 => SignatureType::SubkeyBinding,
            0x19 => SignatureType::PrimaryKeyBinding,
            0x1F => SignatureType::DirectKey,
            0x20 => SignatureType::KeyRevocation,
            0x28 => SignatureType::SubkeyRevocation,
            0x30 => SignatureType::CertRevocation,
            other => SignatureType::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SignatureType::CertGeneric => 0x10,
            SignatureType::CertPersona => 0x11,
            SignatureType::CertCasual => 0x12,
            SignatureType::CertPositive => 0x13,
            SignatureType::SubkeyBinding => 0x18,
            SignatureType::PrimaryKeyBinding => 0x19,
            SignatureType::DirectKey => 0x1F,
            SignatureType::KeyRevocation => 0x20,
            SignatureType::SubkeyRevocation => 0x28,
            SignatureType::CertRevocation => 0x30,
            SignatureType::Other(code) => *code,
        }
    }

    pub fn is_certification(&self) -> bool {
        matches!(
            self,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }
}

/// A parsed signature packet
///
/// Cryptographic verification is out of scope here; `material` carries the
/// opaque signature values so duplicates compare by exact content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub sig_type: SignatureType,
    pub version: u8,
    pub alg: PublicKeyAlgorithm,
    pub hash_alg: u8,
    pub creation_time: u32,
    pub issuer_keyid: Option<KeyId>,
    pub issuer_fingerprint: Option<Fingerprint>,
    pub material: Vec<u8>,
}

impl Signature {
    /// Whether this signature names the key with the given identifiers as
    /// its issuer. The fingerprint wins when present; the key id is only
    /// consulted for signatures that carry no fingerprint.
    pub fn is_issued_by(&self, fingerprint: &Fingerprint, keyid: &KeyId) -> bool {
        match (&self.issuer_fingerprint, &self.issuer_keyid) {
            (Some(fp), _) => fp == fingerprint,
            (None, Some(id)) => id == keyid,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserIdKind {
    UserId,
    UserAttribute,
}

/// User id or user attribute packet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId {
    pub kind: UserIdKind,
    pub data: Vec<u8>,
}

impl UserId {
    pub fn new(text: &str) -> Self {
        Self {
            kind: UserIdKind::UserId,
            data: text.as_bytes().to_vec(),
        }
    }

    pub fn tag(&self) -> PacketTag {
        match self.kind {
            UserIdKind::UserId => PacketTag::UserId,
            UserIdKind::UserAttribute => PacketTag::UserAttribute,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UserIdKind::UserId => f.write_str(&String::from_utf8_lossy(&self.data)),
            UserIdKind::UserAttribute => write!(f, "[user attribute, {} bytes]", self.data.len()),
        }
    }
}

/// Encoded packet as stored by a key store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPacket {
    pub tag: PacketTag,
    pub data: Vec<u8>,
}

/// A user id with the certifications made over it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableUserId {
    pub uid: UserId,
    pub signatures: Vec<Signature>,
}

/// A subkey with its binding and revocation signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableSubkey {
    pub subkey: KeyPacket,
    pub signatures: Vec<Signature>,
}

/// A primary key in canonical packet order: key, direct signatures, user
/// ids with their certifications, then subkeys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableKey {
    pub key: KeyPacket,
    pub signatures: Vec<Signature>,
    pub userids: Vec<TransferableUserId>,
    pub subkeys: Vec<TransferableSubkey>,
}

/// Append the signatures of `src` that `dst` does not already hold
pub(crate) fn merge_signatures(dst: &mut Vec<Signature>, src: &[Signature]) -> usize {
    let mut added = 0;
    for sig in src {
        if !dst.contains(sig) {
            dst.push(sig.clone());
            added += 1;
        }
    }
    added
}

impl TransferableUserId {
    pub(crate) fn merge(&mut self, src: &TransferableUserId) -> usize {
        merge_signatures(&mut self.signatures, &src.signatures)
    }
}

impl TransferableSubkey {
    pub(crate) fn merge(&mut self, src: &TransferableSubkey) -> usize {
        merge_signatures(&mut self.signatures, &src.signatures)
    }
}

impl TransferableKey {
    /// Union the direct signatures, user ids and per-uid certifications of
    /// `src` into this key. Returns the number of packets added.
    pub(crate) fn merge(&mut self, src: &TransferableKey) -> usize {
        let mut added = merge_signatures(&mut self.signatures, &src.signatures);
        for src_uid in &src.userids {
            match self.userids.iter_mut().find(|u| u.uid == src_uid.uid) {
                Some(dst_uid) => added += dst_uid.merge(src_uid),
                None => {
                    added += 1 + src_uid.signatures.len();
                    self.userids.push(src_uid.clone());
                }
            }
        }
        for src_sub in &src.subkeys {
            match self
                .subkeys
                .iter_mut()
                .find(|s| s.subkey.material.public == src_sub.subkey.material.public)
            {
                Some(dst_sub) => added += dst_sub.merge(src_sub),
                None => {
                    added += 1 + src_sub.signatures.len();
                    self.subkeys.push(src_sub.clone());
                }
            }
        }
        added
    }
}
