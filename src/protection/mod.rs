/*!
 * Secret key protection
 *
 * A secret key moves between three states:
 *
 * - `ProtectedLocked`: the secret packet is encrypted, nothing is in memory
 * - `UnprotectedLocked`: the secret packet is plaintext but not parsed
 * - `Unlocked`: secret material is parsed and held in memory
 *
 * Passphrases come from an injected [`PassphraseProvider`]. Protection uses
 * Argon2id for key derivation and an AEAD cipher whose tag doubles as the
 * passphrase check. A failed transition leaves the key untouched.
 */

mod protector;
mod provider;
mod s2k;

pub use provider::{
    FixedPassphrase, NoPassphrase, PassphraseContext, PassphraseOperation, PassphraseProvider,
};
pub use s2k::{KdfParams, ProtectionInfo, ProtectionParams, SymmetricCipher, SALT_SIZE};

#[cfg(test)]
mod tests;
