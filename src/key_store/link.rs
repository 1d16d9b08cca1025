use super::store::KeyStore;
use crate::grip::Grip;
use crate::key::{Key, SignatureType};

/// Whether one of `subkey`'s binding signatures was issued by `primary`
fn bound_to(subkey: &Key, primary: &Key) -> bool {
    subkey
        .signatures_of_type(SignatureType::SubkeyBinding)
        .any(|sig| sig.is_issued_by(primary.fingerprint(), primary.keyid()))
}

impl KeyStore {
    /// Attach subkeys that are waiting for `primary` to it.
    ///
    /// A subkey qualifies when it has no resolved primary yet and one of its
    /// binding signatures names `primary` as issuer, by fingerprint or, for
    /// signatures without one, by key id. Subkeys whose recorded primary is
    /// `primary` are also listed on it. Calling this again is harmless.
    ///
    /// # Returns
    ///
    /// The number of subkeys newly attached
    pub fn link_orphans(&mut self, primary: &Grip) -> usize {
        let pidx = match self.index.get(primary) {
            Some(idx) if self.keys[*idx].is_primary() => *idx,
            _ => return 0,
        };

        let found: Vec<usize> = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.is_subkey())
            .filter(|(_, key)| match key.primary_grip() {
                Some(grip) => grip == primary,
                None => bound_to(key, &self.keys[pidx]),
            })
            .map(|(idx, _)| idx)
            .collect();

        let mut linked = 0;
        for sidx in found {
            let sub_grip = *self.keys[sidx].grip();
            if self.keys[sidx].primary_grip.is_none() {
                self.keys[sidx].primary_grip = Some(*primary);
                log::debug!("Linked subkey {} to primary {}", sub_grip, primary);
            }
            if !self.keys[pidx].subkey_grips().contains(&sub_grip) {
                self.keys[pidx].add_subkey_grip(sub_grip);
                linked += 1;
            }
        }
        linked
    }

    /// Resolve and record the primary of the subkey at `sidx`
    pub(crate) fn link_subkey(&mut self, sidx: usize) {
        let sub_grip = *self.keys[sidx].grip();
        let pidx = match self
            .get_primary_key(&self.keys[sidx])
            .and_then(|primary| self.index.get(primary.grip()).copied())
        {
            Some(idx) => idx,
            None => {
                log::debug!("Subkey {} has no primary in the store yet", sub_grip);
                return;
            }
        };
        let primary_grip = *self.keys[pidx].grip();
        self.keys[sidx].primary_grip = Some(primary_grip);
        self.keys[pidx].add_subkey_grip(sub_grip);
    }

    /// The primary key of `subkey`.
    ///
    /// The recorded `primary_grip` is used when set. Otherwise the binding
    /// signatures are scanned in order. A signature with an issuer
    /// fingerprint is resolved by that fingerprint alone; the issuer key id
    /// is consulted only for signatures without one.
    pub fn get_primary_key(&self, subkey: &Key) -> Option<&Key> {
        if !subkey.is_subkey() {
            return None;
        }
        if let Some(grip) = subkey.primary_grip() {
            if let Some(primary) = self.get_key_by_grip(grip) {
                return Some(primary);
            }
        }
        subkey
            .signatures_of_type(SignatureType::SubkeyBinding)
            .find_map(|sig| match (&sig.issuer_fingerprint, &sig.issuer_keyid) {
                (Some(fp), _) => self.get_key_by_fingerprint(fp).filter(|k| k.is_primary()),
                (None, Some(keyid)) => self
                    .keys
                    .iter()
                    .find(|k| k.is_primary() && k.keyid() == keyid),
                (None, None) => None,
            })
    }
}
