/*!
 * OpenPGP Keyring Engine
 *
 * This crate manages an in-memory collection of OpenPGP public and secret
 * keys. It covers:
 *
 * - Keygrip computation, the algorithm-specific identity of key material
 * - Import and merge of partial copies of the same key from several sources
 * - Linking of subkeys to their primary keys
 * - Search by key id, fingerprint, grip or user id
 * - Passphrase protection, unlocking and locking of secret key material
 *
 * Parsing of concrete keyring file formats is delegated to a [`KeyCodec`];
 * the built-in [`NativeCodec`] stores keys with `bincode`.
 *
 * [`KeyCodec`]: key_store::KeyCodec
 * [`NativeCodec`]: key_store::NativeCodec
 */

/// Key store configuration and default locations
pub mod config;

/// Common error types for the keyring
pub mod error;

/// Keygrip computation
pub mod grip;

/// Key entities, packets, signatures and identifiers
pub mod key;

/// Key store: add, merge, link, search, load and write
pub mod key_store;

/// Secret key protection and passphrase providers
pub mod protection;

/// Secure memory handling utilities
pub mod secure_memory;

// Re-export main types for convenience
pub use config::KeyStoreConfig;
pub use error::{KeyringError, KeyringResult};
pub use grip::{compute_grip, Grip};
pub use key::{Fingerprint, Key, KeyId, KeyKind, KeyState};
pub use key_store::{KeySearch, KeyStore, KeyStoreFormat};

/// Initialize the keyring module.
///
/// No global state is required today; the function exists so callers have
/// a stable entry point and can log the library version at startup.
///
/// # Example
///
/// ```
/// use pgp_keyring::prelude::*;
///
/// fn main() -> Result<(), KeyringError> {
///     init()?;
///     let store = KeyStore::new(KeyStoreFormat::Gpg, "pubring.gpg")?;
///     assert!(store.is_empty());
///     Ok(())
/// }
/// ```
pub fn init() -> KeyringResult<()> {
    log::debug!("pgp-keyring {} initialized", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// The most commonly used types in one import
pub mod prelude {
    pub use crate::config::KeyStoreConfig;
    pub use crate::error::{KeyringError, KeyringResult};
    pub use crate::grip::{compute_grip, Curve, Grip};
    pub use crate::init;
    pub use crate::key::{
        Fingerprint, Key, KeyId, KeyKind, KeyMaterial, KeyPacket, KeyState, PacketTag,
        PublicKeyAlgorithm, PublicMaterial, SecretMaterial, Signature, SignatureType, UserId,
    };
    pub use crate::key_store::{
        merge, ImportStatus, KeyCodec, KeyProvider, KeySearch, KeyStore, KeyStoreFormat,
        KeyValidator, NativeCodec, SignatureImportStatus, StructuralValidator, Validity,
    };
    pub use crate::protection::{
        FixedPassphrase, KdfParams, NoPassphrase, PassphraseContext, PassphraseOperation,
        PassphraseProvider, ProtectionParams, SymmetricCipher,
    };
    pub use crate::secure_memory::{with_secure_scope, SecureBytes};
}
