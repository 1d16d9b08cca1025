/*!
 * Key entities
 *
 * This module models one primary key or subkey as a keyring holds it:
 * the key packet with its public material, an optional secret packet,
 * user ids, signatures, identity digests and the relations to other keys.
 */

mod ids;
mod key;
mod material;
mod packet;

pub use ids::{compute_fingerprint, Fingerprint, KeyId, FINGERPRINT_SIZE, KEYID_SIZE};
pub use key::{Key, KeyKind, KeySignature, KeyState};
pub use material::{
    EcdhKdfParams, KeyMaterial, MaterialFamily, PublicKeyAlgorithm, PublicMaterial,
    SecretMaterial,
};
pub use packet::{
    KeyPacket, PacketTag, RawPacket, SecretPacket, Signature, SignatureType, TransferableKey,
    TransferableSubkey, TransferableUserId, UserId, UserIdKind,
};

#[cfg(test)]
pub(crate) mod fixtures;
