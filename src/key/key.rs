use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{compute_fingerprint, Fingerprint, KeyId};
use super::material::{KeyMaterial, PublicKeyAlgorithm};
use super::packet::{
    KeyPacket, PacketTag, RawPacket, SecretPacket, Signature, SignatureType, TransferableKey,
    TransferableSubkey, TransferableUserId, UserId,
};
use crate::error::{error_codes, KeyringError, KeyringResult};
use crate::grip::{compute_grip, Grip};
use crate::key_store::KeyStoreFormat;
use crate::protection::ProtectionInfo;

/// Whether an entity is a primary key or a subkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    Primary,
    Subkey,
}

/// Where a key's secret material currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// No secret packet at all
    Public,
    /// Secret packet is encrypted; no material in memory
    ProtectedLocked,
    /// Secret packet is plaintext but not parsed into material
    UnprotectedLocked,
    /// Secret material is present in memory
    Unlocked,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyState::Public => "public",
            KeyState::ProtectedLocked => "protected and locked",
            KeyState::UnprotectedLocked => "unprotected and locked",
            KeyState::Unlocked => "unlocked",
        };
        f.write_str(name)
    }
}

/// A signature as attached to a key; `uid` indexes the certified user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    pub uid: Option<usize>,
    pub sig: Signature,
}

/// One primary key or subkey held by a key store
///
/// Relations to other keys are grips, resolved through the owning store:
/// a subkey records `primary_grip`, a primary records `subkey_grips`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub(crate) packet: KeyPacket,
    grip: Grip,
    fingerprint: Fingerprint,
    keyid: KeyId,
    pub(crate) userids: Vec<UserId>,
    pub(crate) signatures: Vec<KeySignature>,
    pub(crate) format: KeyStoreFormat,
    pub(crate) primary_grip: Option<Grip>,
    pub(crate) subkey_grips: Vec<Grip>,
    pub(crate) valid: bool,
    pub(crate) validated: bool,
}

impl Key {
    /// Build a key from a single key packet.
    ///
    /// The packet tag is normalized to match the presence of a secret
    /// packet. Material handed in with secret parameters yields an unlocked
    /// key whose plaintext secret packet is derived from them.
    pub fn from_packet(mut packet: KeyPacket, format: KeyStoreFormat) -> KeyringResult<Self> {
        if packet.secret.is_none() {
            if let Some(secret) = packet.material.secret() {
                packet.secret = Some(SecretPacket::Plain(secret.to_plaintext()?));
            }
        }
        packet.tag = if packet.secret.is_some() {
            packet.tag.to_secret()
        } else {
            packet.tag.to_public()
        };
        if !packet.tag.is_primary_key() && !packet.tag.is_subkey() {
            return Err(KeyringError::parse_error(
                "key packet",
                &format!("tag {} is not a key packet", packet.tag.id()),
            ));
        }

        let grip = compute_grip(&packet.material)?;
        let fingerprint = compute_fingerprint(packet.creation_time, &packet.material)?;
        Ok(Self {
            packet,
            grip,
            keyid: fingerprint.keyid(),
            fingerprint,
            userids: Vec::new(),
            signatures: Vec::new(),
            format,
            primary_grip: None,
            subkey_grips: Vec::new(),
            valid: false,
            validated: false,
        })
    }

    /// Build a primary key from its transferable form. Subkeys are ignored;
    /// they become separate entities.
    pub fn from_transferable(tkey: &TransferableKey, format: KeyStoreFormat) -> KeyringResult<Self> {
        if !tkey.key.tag.is_primary_key() {
            return Err(KeyringError::parse_error(
                "transferable key",
                "leading packet is not a primary key",
            ));
        }
        let mut key = Self::from_packet(tkey.key.clone(), format)?;
        for sig in &tkey.signatures {
            key.signatures.push(KeySignature {
                uid: None,
                sig: sig.clone(),
            });
        }
        for tuid in &tkey.userids {
            let idx = key.userids.len();
            key.userids.push(tuid.uid.clone());
            for sig in &tuid.signatures {
                key.signatures.push(KeySignature {
                    uid: Some(idx),
                    sig: sig.clone(),
                });
            }
        }
        Ok(key)
    }

    /// Build a subkey from its transferable form
    pub fn from_transferable_subkey(
        tsub: &TransferableSubkey,
        format: KeyStoreFormat,
    ) -> KeyringResult<Self> {
        if !tsub.subkey.tag.is_subkey() {
            return Err(KeyringError::parse_error(
                "transferable subkey",
                "leading packet is not a subkey",
            ));
        }
        let mut key = Self::from_packet(tsub.subkey.clone(), format)?;
        key.signatures = tsub
            .signatures
            .iter()
            .map(|sig| KeySignature {
                uid: None,
                sig: sig.clone(),
            })
            .collect();
        Ok(key)
    }

    /// Key packet with the in-memory secret material stripped
    fn persistent_packet(&self) -> KeyPacket {
        let mut packet = self.packet.clone();
        packet.material = packet.material.public_only();
        packet
    }

    /// Canonical packet sequence of a primary key, without subkeys
    pub fn to_transferable(&self) -> KeyringResult<TransferableKey> {
        if !self.is_primary() {
            return Err(KeyringError::parse_error(
                &self.keyid.to_string(),
                "subkey cannot be converted to a transferable primary key",
            ));
        }
        let mut tkey = TransferableKey {
            key: self.persistent_packet(),
            signatures: Vec::new(),
            userids: self
                .userids
                .iter()
                .map(|uid| TransferableUserId {
                    uid: uid.clone(),
                    signatures: Vec::new(),
                })
                .collect(),
            subkeys: Vec::new(),
        };
        for ksig in &self.signatures {
            match ksig.uid {
                None => tkey.signatures.push(ksig.sig.clone()),
                Some(idx) => match tkey.userids.get_mut(idx) {
                    Some(tuid) => tuid.signatures.push(ksig.sig.clone()),
                    None => {
                        return Err(KeyringError::parse_error(
                            &self.keyid.to_string(),
                            &format!("signature refers to missing user id {}", idx),
                        ))
                    }
                },
            }
        }
        Ok(tkey)
    }

    /// Canonical packet sequence of a subkey
    pub fn to_transferable_subkey(&self) -> KeyringResult<TransferableSubkey> {
        if !self.is_subkey() {
            return Err(KeyringError::parse_error(
                &self.keyid.to_string(),
                "primary key cannot be converted to a transferable subkey",
            ));
        }
        if !self.userids.is_empty() || self.signatures.iter().any(|s| s.uid.is_some()) {
            return Err(KeyringError::parse_error(
                &self.keyid.to_string(),
                "subkey carries user id packets",
            ));
        }
        Ok(TransferableSubkey {
            subkey: self.persistent_packet(),
            signatures: self.signatures.iter().map(|s| s.sig.clone()).collect(),
        })
    }

    /// Encoded packets: key, then user ids, then signatures
    pub fn raw_packets(&self) -> KeyringResult<Vec<RawPacket>> {
        let mut packets = Vec::with_capacity(self.rawpacket_count());
        packets.push(RawPacket {
            tag: self.packet.tag,
            data: bincode::serialize(&self.persistent_packet())?,
        });
        for uid in &self.userids {
            packets.push(RawPacket {
                tag: uid.tag(),
                data: bincode::serialize(uid)?,
            });
        }
        for ksig in &self.signatures {
            packets.push(RawPacket {
                tag: PacketTag::Signature,
                data: bincode::serialize(&ksig.sig)?,
            });
        }
        Ok(packets)
    }

    pub fn rawpacket_count(&self) -> usize {
        1 + self.userids.len() + self.signatures.len()
    }

    /// Attach a user id and return its index
    pub fn add_userid(&mut self, uid: UserId) -> KeyringResult<usize> {
        if !self.is_primary() {
            return Err(KeyringError::invalid_parameter(
                "uid",
                "primary key",
                "subkey",
            ));
        }
        self.userids.push(uid);
        Ok(self.userids.len() - 1)
    }

    /// Attach a signature, optionally over the user id at `uid`
    pub fn add_signature(&mut self, sig: Signature, uid: Option<usize>) -> KeyringResult<()> {
        if let Some(idx) = uid {
            if idx >= self.userids.len() {
                return Err(KeyringError::invalid_parameter(
                    "uid",
                    &format!("index below {}", self.userids.len()),
                    &idx.to_string(),
                ));
            }
        }
        self.signatures.push(KeySignature { uid, sig });
        Ok(())
    }

    /// Public-only copy: no secret packet, no secret material
    pub fn to_public(&self) -> Self {
        let mut key = self.clone();
        key.packet = self.packet.to_public();
        key
    }

    pub fn grip(&self) -> &Grip {
        &self.grip
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn keyid(&self) -> &KeyId {
        &self.keyid
    }

    pub fn kind(&self) -> KeyKind {
        if self.packet.tag.is_primary_key() {
            KeyKind::Primary
        } else {
            KeyKind::Subkey
        }
    }

    pub fn is_primary(&self) -> bool {
        self.kind() == KeyKind::Primary
    }

    pub fn is_subkey(&self) -> bool {
        self.kind() == KeyKind::Subkey
    }

    pub fn alg(&self) -> PublicKeyAlgorithm {
        self.packet.material.alg
    }

    pub fn creation_time(&self) -> u32 {
        self.packet.creation_time
    }

    pub fn packet(&self) -> &KeyPacket {
        &self.packet
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.packet.material
    }

    pub fn userids(&self) -> &[UserId] {
        &self.userids
    }

    pub fn key_signatures(&self) -> &[KeySignature] {
        &self.signatures
    }

    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter().map(|s| &s.sig)
    }

    pub fn signatures_of_type(&self, sig_type: SignatureType) -> impl Iterator<Item = &Signature> {
        self.signatures().filter(move |s| s.sig_type == sig_type)
    }

    pub fn format(&self) -> KeyStoreFormat {
        self.format
    }

    pub fn primary_grip(&self) -> Option<&Grip> {
        self.primary_grip.as_ref()
    }

    pub fn subkey_grips(&self) -> &[Grip] {
        &self.subkey_grips
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn protection(&self) -> Option<&ProtectionInfo> {
        match &self.packet.secret {
            Some(SecretPacket::Encrypted { protection, .. }) => Some(protection),
            _ => None,
        }
    }

    pub fn state(&self) -> KeyState {
        match (&self.packet.secret, self.packet.material.has_secret()) {
            (_, true) => KeyState::Unlocked,
            (Some(SecretPacket::Encrypted { .. }), false) => KeyState::ProtectedLocked,
            (Some(SecretPacket::Plain(_)), false) => KeyState::UnprotectedLocked,
            (None, false) => KeyState::Public,
        }
    }

    pub fn is_secret(&self) -> bool {
        self.packet.secret.is_some()
    }

    pub fn is_protected(&self) -> bool {
        matches!(self.packet.secret, Some(SecretPacket::Encrypted { .. }))
    }

    pub fn is_locked(&self) -> bool {
        !self.packet.material.has_secret()
    }

    pub(crate) fn set_validity(&mut self, valid: bool, validated: bool) {
        self.valid = valid;
        self.validated = validated;
    }

    pub(crate) fn add_subkey_grip(&mut self, grip: Grip) {
        if !self.subkey_grips.contains(&grip) {
            self.subkey_grips.push(grip);
        }
    }

    pub(crate) fn check_same_identity(&self, other: &Key) -> KeyringResult<()> {
        if self.grip != other.grip {
            return Err(KeyringError::merge_mismatch(
                &format!("grip {} differs from {}", other.grip, self.grip),
                error_codes::MERGE_GRIP_MISMATCH,
            ));
        }
        if self.kind() != other.kind() {
            return Err(KeyringError::merge_mismatch(
                &format!("{:?} cannot merge into {:?}", other.kind(), self.kind()),
                error_codes::MERGE_KIND_MISMATCH,
            ));
        }
        Ok(())
    }
}
