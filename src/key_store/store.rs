use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use super::format::{
    ensure_directory, key_file_name, read_key_directory, write_file_atomic, KeyBlock, KeyCodec,
    KeyStoreFormat,
};
use super::merge::merge;
use super::search::KeySearch;
use super::validate::{KeyProvider, KeyValidator, StructuralValidator};
use crate::config::KeyStoreConfig;
use crate::error::{KeyringError, KeyringResult};
use crate::grip::Grip;
use crate::key::{Key, Signature, SignatureType, TransferableKey};
use crate::protection::{PassphraseProvider, ProtectionParams};

/// Outcome of importing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    New,
    Updated,
    Unchanged,
}

/// Outcome of importing a standalone signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureImportStatus {
    /// The signer is not in the store
    UnknownKey,
    New,
    Unchanged,
    /// Only direct-key and key revocation signatures can be imported
    Unsupported,
}

/// An ordered collection of keys, unique by grip
///
/// Keys are kept in insertion order, which is also search order. Merging a
/// key into an existing entry replaces that entry in place, so positions
/// stay stable.
pub struct KeyStore {
    path: PathBuf,
    format: KeyStoreFormat,
    disable_validation: bool,
    protection: ProtectionParams,
    pub(crate) keys: Vec<Key>,
    pub(crate) index: HashMap<Grip, usize>,
    validator: Box<dyn KeyValidator>,
    key_provider: Option<Box<dyn KeyProvider>>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("keys", &self.keys.len())
            .field("disable_validation", &self.disable_validation)
            .finish()
    }
}

impl KeyStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `format` - Storage format; `Unknown` is rejected
    /// * `path` - Keyring file, or directory for the `G10` format
    pub fn new(format: KeyStoreFormat, path: impl AsRef<Path>) -> KeyringResult<Self> {
        if format == KeyStoreFormat::Unknown {
            return Err(KeyringError::unsupported_format(&format.to_string()));
        }
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            format,
            disable_validation: false,
            protection: ProtectionParams::default(),
            keys: Vec::new(),
            index: HashMap::new(),
            validator: Box::new(StructuralValidator),
            key_provider: None,
        })
    }

    pub fn from_config(config: &KeyStoreConfig) -> KeyringResult<Self> {
        let mut store = Self::new(config.format, &config.path)?;
        store.disable_validation = config.disable_validation;
        store.protection = config.protection;
        Ok(store)
    }

    pub fn format(&self) -> KeyStoreFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn protection_params(&self) -> &ProtectionParams {
        &self.protection
    }

    pub fn set_disable_validation(&mut self, disable: bool) {
        self.disable_validation = disable;
    }

    pub fn set_validator(&mut self, validator: Box<dyn KeyValidator>) {
        self.validator = validator;
    }

    pub fn set_key_provider(&mut self, provider: Box<dyn KeyProvider>) {
        self.key_provider = Some(provider);
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Drop every key; secret material is zeroed as the keys drop
    pub fn clear(&mut self) {
        self.keys.clear();
        self.index.clear();
    }

    /// Add a key, merging it into an existing entry with the same grip.
    ///
    /// In a directory-format store an existing entry is returned unchanged
    /// and `key` is discarded. A new primary picks up waiting subkeys; a new
    /// subkey is attached to its primary when present. Unless validation is
    /// disabled, a key that is not yet validated is validated, and a primary
    /// also has its subkeys revalidated.
    ///
    /// # Errors
    ///
    /// `MergeTypeMismatch` or `MergeConversionFailed` when merging fails,
    /// `AllocationFailure` when the store cannot grow. The store is left as
    /// it was.
    pub fn add_key(&mut self, key: Key) -> KeyringResult<&Key> {
        let idx = match self.index.get(key.grip()).copied() {
            Some(idx) if self.format.is_directory() => {
                log::debug!(
                    "Key {} already in directory store, keeping stored copy",
                    key.grip()
                );
                return Ok(&self.keys[idx]);
            }
            Some(idx) => {
                self.merge_into(idx, &key)?;
                idx
            }
            None => self.insert_new(key)?,
        };

        if !self.disable_validation && !self.keys[idx].is_validated() {
            self.validate_at(idx);
        }
        Ok(&self.keys[idx])
    }

    fn merge_into(&mut self, idx: usize, src: &Key) -> KeyringResult<()> {
        let primary_idx = if src.is_subkey() {
            self.get_primary_key(&self.keys[idx])
                .or_else(|| self.get_primary_key(src))
                .and_then(|primary| self.position_of(primary))
                .filter(|pidx| *pidx != idx)
        } else {
            None
        };

        let result = match primary_idx {
            Some(pidx) if pidx < idx => {
                let (head, tail) = self.keys.split_at_mut(idx);
                merge(&mut tail[0], src, Some(&head[pidx]))
            }
            Some(pidx) => {
                let (head, tail) = self.keys.split_at_mut(pidx);
                merge(&mut head[idx], src, Some(&tail[0]))
            }
            None => merge(&mut self.keys[idx], src, None),
        };
        let added = result.map_err(|e| {
            log::warn!("Failed to merge key {}: {}", src.grip(), e);
            e
        })?;

        let dst = &mut self.keys[idx];
        let valid = dst.is_valid() && src.is_valid();
        let validated = dst.is_validated() && src.is_validated() && valid && added == 0;
        dst.set_validity(valid, validated);

        if dst.is_subkey() {
            if let Some(pidx) = primary_idx {
                let grip = *self.keys[idx].grip();
                self.keys[pidx].add_subkey_grip(grip);
            }
        }
        Ok(())
    }

    fn insert_new(&mut self, key: Key) -> KeyringResult<usize> {
        self.keys
            .try_reserve(1)
            .map_err(|e| KeyringError::allocation_failure("add key", &e.to_string()))?;
        self.index
            .try_reserve(1)
            .map_err(|e| KeyringError::allocation_failure("add key", &e.to_string()))?;

        let idx = self.keys.len();
        let grip = *key.grip();
        let is_primary = key.is_primary();
        self.keys.push(key);
        self.index.insert(grip, idx);
        log::debug!("Added key {} to {} store", grip, self.format);

        if is_primary {
            let linked = self.link_orphans(&grip);
            if linked > 0 {
                log::debug!("Primary {} adopted {} subkeys", grip, linked);
            }
        } else {
            self.link_subkey(idx);
        }
        Ok(idx)
    }

    fn validate_at(&mut self, idx: usize) {
        let validity = self.validator.validate(&self.keys[idx], self);
        self.keys[idx].set_validity(validity.valid, validity.validated);
        log::debug!(
            "Validated key {}: valid={} validated={}",
            self.keys[idx].grip(),
            validity.valid,
            validity.validated
        );

        if self.keys[idx].is_primary() {
            let subkeys = self.keys[idx].subkey_grips().to_vec();
            for grip in subkeys {
                if let Some(sidx) = self.index.get(&grip).copied() {
                    let validity = self.validator.validate(&self.keys[sidx], self);
                    self.keys[sidx].set_validity(validity.valid, validity.validated);
                }
            }
        }
    }

    /// Add a primary key and its subkeys from transferable form
    pub fn add_transferable_key(&mut self, tkey: &TransferableKey) -> KeyringResult<Grip> {
        let primary = Key::from_transferable(tkey, self.format)?;
        let primary_grip = *primary.grip();
        self.add_key(primary)?;
        for tsub in &tkey.subkeys {
            let mut subkey = Key::from_transferable_subkey(tsub, self.format)?;
            subkey.primary_grip = Some(primary_grip);
            self.add_key(subkey)?;
        }
        Ok(primary_grip)
    }

    fn add_block(&mut self, block: &KeyBlock) -> KeyringResult<()> {
        match block {
            KeyBlock::Primary(tkey) => {
                self.add_transferable_key(tkey)?;
            }
            KeyBlock::Subkey(tsub) => {
                let subkey = Key::from_transferable_subkey(tsub, self.format)?;
                self.add_key(subkey)?;
            }
        }
        Ok(())
    }

    /// Import a key, reporting whether it was new, updated or unchanged.
    ///
    /// With `public_only` any secret part is stripped first.
    pub fn import_key(&mut self, key: Key, public_only: bool) -> KeyringResult<(ImportStatus, &Key)> {
        let key = if public_only { key.to_public() } else { key };
        let grip = *key.grip();
        let before = self
            .get_key_by_grip(&grip)
            .map(|k| (k.rawpacket_count(), k.is_secret()));

        self.add_key(key)?;
        let stored = self
            .get_key_by_grip(&grip)
            .ok_or_else(|| KeyringError::key_not_found(&format!("grip {}", grip)))?;

        let status = match before {
            None => ImportStatus::New,
            Some((count, secret))
                if stored.rawpacket_count() > count || stored.is_secret() != secret =>
            {
                ImportStatus::Updated
            }
            Some(_) => ImportStatus::Unchanged,
        };
        log::info!("Imported key {}: {:?}", grip, status);
        Ok((status, stored))
    }

    /// Import a standalone direct-key or key revocation signature into the
    /// key that issued it
    pub fn import_signature(&mut self, sig: &Signature) -> KeyringResult<SignatureImportStatus> {
        if !matches!(
            sig.sig_type,
            SignatureType::DirectKey | SignatureType::KeyRevocation
        ) {
            log::warn!("Cannot import standalone signature of type {:#04x}", sig.sig_type.code());
            return Ok(SignatureImportStatus::Unsupported);
        }

        let mut carrier = match self.get_signer_key(sig) {
            Some(signer) => signer.to_public(),
            None => return Ok(SignatureImportStatus::UnknownKey),
        };
        let grip = *carrier.grip();
        let before = self
            .get_key_by_grip(&grip)
            .map_or(0, |k| k.rawpacket_count());

        carrier.add_signature(sig.clone(), None)?;
        let after = self.add_key(carrier)?.rawpacket_count();

        Ok(if after > before {
            SignatureImportStatus::New
        } else {
            SignatureImportStatus::Unchanged
        })
    }

    /// Remove a key by grip and return it.
    ///
    /// A removed subkey is dropped from its primary's subkey list; the
    /// subkeys of a removed primary become orphans.
    pub fn remove_key(&mut self, grip: &Grip) -> KeyringResult<Key> {
        let idx = self
            .index
            .get(grip)
            .copied()
            .ok_or_else(|| KeyringError::key_not_found(&format!("grip {}", grip)))?;

        let removed = self.keys.remove(idx);
        self.index = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| (*key.grip(), i))
            .collect();

        if let Some(primary) = removed.primary_grip() {
            if let Some(pidx) = self.index.get(primary).copied() {
                self.keys[pidx].subkey_grips.retain(|g| g != grip);
            }
        }
        for sub in removed.subkey_grips() {
            if let Some(sidx) = self.index.get(sub).copied() {
                self.keys[sidx].primary_grip = None;
            }
        }
        log::info!("Removed key {} from {} store", grip, self.format);
        Ok(removed)
    }

    /// The stored key that issued `sig`: by issuer fingerprint first, then
    /// by issuer key id
    pub fn get_signer_key(&self, sig: &Signature) -> Option<&Key> {
        if let Some(fp) = &sig.issuer_fingerprint {
            if let Some(key) = self.get_key_by_fingerprint(fp) {
                return Some(key);
            }
        }
        let keyid = sig.issuer_keyid?;
        self.keys.iter().find(|key| *key.keyid() == keyid)
    }

    /// Like [`KeyStore::get_signer_key`], falling back to the key provider
    pub fn fetch_signer_key(&self, sig: &Signature) -> Option<Cow<'_, Key>> {
        if let Some(key) = self.get_signer_key(sig) {
            return Some(Cow::Borrowed(key));
        }
        let provider = self.key_provider.as_ref()?;
        let mut searches = Vec::new();
        if let Some(fp) = sig.issuer_fingerprint {
            searches.push(KeySearch::Fingerprint(fp));
        }
        if let Some(keyid) = sig.issuer_keyid {
            searches.push(KeySearch::KeyId(keyid));
        }
        searches.iter().find_map(|search| {
            let key = provider.request_key(search)?;
            log::debug!("Key provider supplied {} for {}", key.grip(), search);
            search.matches(&key).then(|| Cow::Owned(key))
        })
    }

    /// Protect a stored key with this store's protection parameters
    pub fn protect_key<P>(&mut self, grip: &Grip, provider: &P) -> KeyringResult<()>
    where
        P: PassphraseProvider + ?Sized,
    {
        let params = self.protection;
        self.get_key_by_grip_mut(grip)
            .ok_or_else(|| KeyringError::key_not_found(&format!("grip {}", grip)))?
            .protect(provider, &params)
    }

    /// Load keys from a byte buffer. Any parse error aborts the load.
    ///
    /// # Returns
    ///
    /// The number of keys in the store afterwards
    pub fn load_from_bytes<C>(&mut self, codec: &C, bytes: &[u8]) -> KeyringResult<usize>
    where
        C: KeyCodec + ?Sized,
    {
        let blocks = codec.decode(bytes)?;
        for block in &blocks {
            self.add_block(block)?;
        }
        Ok(self.keys.len())
    }

    /// Load keys from the store's path.
    ///
    /// For the directory format every file is decoded separately and files
    /// that fail to parse are logged and skipped. Single-file formats parse
    /// the whole file before adding anything and fail on the first error.
    pub fn load_from_path<C>(&mut self, codec: &C) -> KeyringResult<usize>
    where
        C: KeyCodec + ?Sized,
    {
        if self.format.is_directory() {
            let path = self.path.clone();
            let loaded: Vec<(PathBuf, Vec<KeyBlock>)> = read_key_directory(&path, codec)?
                .filter_map(|(file, result)| match result {
                    Ok(blocks) => Some((file, blocks)),
                    Err(e) => {
                        log::warn!("Skipping unreadable key file {}: {}", file.display(), e);
                        None
                    }
                })
                .collect();
            for (file, blocks) in &loaded {
                for block in blocks {
                    if let Err(e) = self.add_block(block) {
                        log::warn!("Skipping key from {}: {}", file.display(), e);
                    }
                }
            }
            log::info!("Loaded {} keys from {}", self.keys.len(), path.display());
            return Ok(self.keys.len());
        }

        let bytes = std::fs::read(&self.path)?;
        let count = self.load_from_bytes(codec, &bytes)?;
        log::info!("Loaded {} keys from {}", count, self.path.display());
        Ok(count)
    }

    /// One block per key, as laid out in a directory-format store
    fn single_key_blocks(&self) -> KeyringResult<Vec<(Grip, KeyBlock)>> {
        self.keys
            .iter()
            .map(|key| -> KeyringResult<(Grip, KeyBlock)> {
                let block = if key.is_primary() {
                    KeyBlock::Primary(key.to_transferable()?)
                } else {
                    KeyBlock::Subkey(key.to_transferable_subkey()?)
                };
                Ok((*key.grip(), block))
            })
            .collect()
    }

    /// Primaries with their subkeys, followed by subkeys no primary lists
    fn grouped_blocks(&self) -> KeyringResult<Vec<KeyBlock>> {
        let mut blocks = Vec::new();
        let mut written = HashSet::new();
        for key in self.keys.iter().filter(|k| k.is_primary()) {
            let mut tkey = key.to_transferable()?;
            for grip in key.subkey_grips() {
                if let Some(subkey) = self.get_key_by_grip(grip) {
                    tkey.subkeys.push(subkey.to_transferable_subkey()?);
                    written.insert(*grip);
                }
            }
            blocks.push(KeyBlock::Primary(tkey));
        }
        for key in self.keys.iter().filter(|k| k.is_subkey()) {
            if !written.contains(key.grip()) {
                blocks.push(KeyBlock::Subkey(key.to_transferable_subkey()?));
            }
        }
        Ok(blocks)
    }

    /// Encode the whole store into one buffer
    pub fn write_to_bytes<C>(&self, codec: &C) -> KeyringResult<Vec<u8>>
    where
        C: KeyCodec + ?Sized,
    {
        let blocks = if self.format.is_directory() {
            self.single_key_blocks()?
                .into_iter()
                .map(|(_, block)| block)
                .collect()
        } else {
            self.grouped_blocks()?
        };
        codec.encode(&blocks)
    }

    /// Write the store to its path.
    ///
    /// The directory format writes one `<GRIP>.key` file per key, creating
    /// the directory when missing. Single-file formats are written to a
    /// temporary file that then replaces the keyring.
    pub fn write_to_path<C>(&self, codec: &C) -> KeyringResult<()>
    where
        C: KeyCodec + ?Sized,
    {
        if self.format.is_directory() {
            ensure_directory(&self.path)?;
            for (grip, block) in self.single_key_blocks()? {
                let bytes = codec.encode(std::slice::from_ref(&block))?;
                write_file_atomic(&self.path.join(key_file_name(&grip)), &bytes)?;
            }
        } else {
            let bytes = self.write_to_bytes(codec)?;
            write_file_atomic(&self.path, &bytes)?;
        }
        log::info!("Wrote {} keys to {}", self.keys.len(), self.path.display());
        Ok(())
    }
}
