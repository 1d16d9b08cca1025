use std::borrow::Cow;

use super::search::KeySearch;
use super::store::KeyStore;
use crate::key::{Key, SignatureType};

/// Result of validating a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Validity {
    pub valid: bool,
    /// False when validation could not be completed, so a later add
    /// retries it
    pub validated: bool,
}

/// Decides whether a key is valid
pub trait KeyValidator {
    fn validate(&self, key: &Key, store: &KeyStore) -> Validity;
}

/// Fetches keys that are not in the store, e.g. from a keyserver
pub trait KeyProvider {
    fn request_key(&self, search: &KeySearch) -> Option<Key>;
}

impl<F> KeyProvider for F
where
    F: Fn(&KeySearch) -> Option<Key>,
{
    fn request_key(&self, search: &KeySearch) -> Option<Key> {
        self(search)
    }
}

/// Validates keys from their structure alone; signatures are trusted as
/// parsed.
///
/// A primary key is valid when it carries a self-issued certification or
/// direct-key signature and no self-issued key revocation. A subkey is
/// valid when its primary issued a binding signature for it and no subkey
/// revocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    fn validate_primary(key: &Key) -> Validity {
        let self_issued = |sig_type: SignatureType| {
            key.signatures_of_type(sig_type)
                .any(|sig| sig.is_issued_by(key.fingerprint(), key.keyid()))
        };
        let certified = key.signatures().any(|sig| {
            (sig.sig_type.is_certification() || sig.sig_type == SignatureType::DirectKey)
                && sig.is_issued_by(key.fingerprint(), key.keyid())
        });
        Validity {
            valid: certified && !self_issued(SignatureType::KeyRevocation),
            validated: true,
        }
    }

    fn validate_subkey(key: &Key, store: &KeyStore) -> Validity {
        let primary = match store.get_primary_key(key) {
            Some(primary) => Cow::Borrowed(primary),
            None => match key
                .signatures_of_type(SignatureType::SubkeyBinding)
                .find_map(|sig| store.fetch_signer_key(sig))
            {
                Some(primary) => primary,
                None => {
                    log::debug!("Primary of subkey {} is unavailable, validation deferred", key.grip());
                    return Validity {
                        valid: false,
                        validated: false,
                    };
                }
            },
        };
        let issued_by_primary = |sig_type: SignatureType| {
            key.signatures_of_type(sig_type)
                .any(|sig| sig.is_issued_by(primary.fingerprint(), primary.keyid()))
        };
        Validity {
            valid: issued_by_primary(SignatureType::SubkeyBinding)
                && !issued_by_primary(SignatureType::SubkeyRevocation),
            validated: true,
        }
    }
}

impl KeyValidator for StructuralValidator {
    fn validate(&self, key: &Key, store: &KeyStore) -> Validity {
        if key.is_primary() {
            Self::validate_primary(key)
        } else {
            Self::validate_subkey(key, store)
        }
    }
}
