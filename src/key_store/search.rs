use std::fmt;

use super::store::KeyStore;
use crate::error::{KeyringError, KeyringResult};
use crate::grip::Grip;
use crate::key::{Fingerprint, Key, KeyId};

/// Search predicate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySearch {
    /// Full key id, or a short id built with [`KeyId::from_short`]
    KeyId(KeyId),
    Fingerprint(Fingerprint),
    Grip(Grip),
    /// Exact user id text
    UserId(String),
}

impl KeySearch {
    pub fn matches(&self, key: &Key) -> bool {
        match self {
            KeySearch::KeyId(keyid) => key.keyid().matches(keyid),
            KeySearch::Fingerprint(fp) => key.fingerprint() == fp,
            KeySearch::Grip(grip) => key.grip() == grip,
            KeySearch::UserId(text) => key.userids().iter().any(|uid| uid.data == text.as_bytes()),
        }
    }
}

impl fmt::Display for KeySearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySearch::KeyId(keyid) => write!(f, "keyid {}", keyid),
            KeySearch::Fingerprint(fp) => write!(f, "fingerprint {}", fp),
            KeySearch::Grip(grip) => write!(f, "grip {}", grip),
            KeySearch::UserId(text) => write!(f, "user id \"{}\"", text),
        }
    }
}

impl KeyStore {
    /// Position of `key` in the store, if it is one of the store's own
    /// entries (not merely a key with the same grip)
    pub(crate) fn position_of(&self, key: &Key) -> Option<usize> {
        self.index
            .get(key.grip())
            .copied()
            .filter(|idx| std::ptr::eq(&self.keys[*idx], key))
    }

    /// Find the next key matching `search`.
    ///
    /// Without a cursor the search starts at the first key; with one it
    /// resumes right after the cursor. Feeding each result back as the
    /// cursor enumerates every match once, in store order, ending with
    /// `None`.
    ///
    /// # Errors
    ///
    /// `InvalidCursor` when `after` is not an entry of this store.
    pub fn search(&self, search: &KeySearch, after: Option<&Key>) -> KeyringResult<Option<&Key>> {
        let start = match after {
            None => 0,
            Some(cursor) => self
                .position_of(cursor)
                .ok_or_else(KeyringError::invalid_cursor)?
                + 1,
        };
        Ok(self.keys[start..].iter().find(|key| search.matches(key)))
    }

    /// Every key matching `search`, in store order
    pub fn search_all<'a>(&'a self, search: &'a KeySearch) -> impl Iterator<Item = &'a Key> + 'a {
        self.keys.iter().filter(move |key| search.matches(key))
    }

    pub fn get_key_by_grip(&self, grip: &Grip) -> Option<&Key> {
        self.index.get(grip).map(|idx| &self.keys[*idx])
    }

    /// Mutable access, e.g. to unlock or protect a stored key
    pub fn get_key_by_grip_mut(&mut self, grip: &Grip) -> Option<&mut Key> {
        match self.index.get(grip) {
            Some(idx) => self.keys.get_mut(*idx),
            None => None,
        }
    }

    pub fn get_key_by_fingerprint(&self, fp: &Fingerprint) -> Option<&Key> {
        self.keys.iter().find(|key| key.fingerprint() == fp)
    }

    /// Next key with a matching key id after `after`
    pub fn get_key_by_id(&self, keyid: &KeyId, after: Option<&Key>) -> KeyringResult<Option<&Key>> {
        self.search(&KeySearch::KeyId(*keyid), after)
    }
}
