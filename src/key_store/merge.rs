use crate::error::{KeyringError, KeyringResult};
use crate::key::Key;

fn conversion_error(side: &str, key: &Key, err: KeyringError) -> KeyringError {
    log::warn!("Failed to convert {} key {} for merging: {}", side, key.grip(), err);
    KeyringError::merge_conversion(side, &err.to_string())
}

/// Carry unlocked secret material over to a rebuilt key.
///
/// When both sides are unlocked the destination's material wins.
fn resurrect_secret(merged: &mut Key, dst: &Key, src: &Key) -> KeyringResult<()> {
    let unlocked = dst
        .material()
        .secret()
        .or_else(|| src.material().secret());
    if let Some(secret) = unlocked {
        merged.packet.material.set_secret(secret.clone())?;
    }
    Ok(())
}

/// Merge `src` into `dst`, two copies of the same key from different sources.
///
/// Signatures and user ids are unioned with exact duplicates dropped. If
/// `src` is secret and `dst` is not, `src`'s key packet becomes the base so
/// the result keeps the secret packet. Unlocked secret material on either
/// side survives. A primary keeps its subkey grips and gains those of
/// `src`. A subkey keeps its primary, taking it from `src` or
/// `primary_hint` when `dst` has none.
///
/// On error `dst` is left unmodified.
///
/// # Returns
///
/// The number of packets `src` contributed
pub fn merge(dst: &mut Key, src: &Key, primary_hint: Option<&Key>) -> KeyringResult<usize> {
    dst.check_same_identity(src)?;

    let (mut merged, added) = if dst.is_primary() {
        let mut base = dst
            .to_transferable()
            .map_err(|e| conversion_error("destination", dst, e))?;
        let mut other = src
            .to_transferable()
            .map_err(|e| conversion_error("source", src, e))?;
        if src.is_secret() && !dst.is_secret() {
            std::mem::swap(&mut base.key, &mut other.key);
        }
        let added = base.merge(&other);
        let merged = Key::from_transferable(&base, dst.format())
            .map_err(|e| conversion_error("merged", dst, e))?;
        (merged, added)
    } else {
        let mut base = dst
            .to_transferable_subkey()
            .map_err(|e| conversion_error("destination", dst, e))?;
        let mut other = src
            .to_transferable_subkey()
            .map_err(|e| conversion_error("source", src, e))?;
        if src.is_secret() && !dst.is_secret() {
            std::mem::swap(&mut base.subkey, &mut other.subkey);
        }
        let added = base.merge(&other);
        let merged = Key::from_transferable_subkey(&base, dst.format())
            .map_err(|e| conversion_error("merged", dst, e))?;
        (merged, added)
    };

    resurrect_secret(&mut merged, dst, src)?;

    if merged.is_primary() {
        merged.subkey_grips = dst.subkey_grips.clone();
        for grip in src.subkey_grips() {
            merged.add_subkey_grip(*grip);
        }
    } else {
        merged.primary_grip = dst
            .primary_grip
            .or(src.primary_grip)
            .or_else(|| primary_hint.map(|primary| *primary.grip()));
        if merged.primary_grip.is_none() {
            log::warn!("Merged subkey {} without a primary key", merged.grip());
        }
    }
    merged.set_validity(dst.is_valid(), dst.is_validated());

    log::debug!(
        "Merged key {}: {} new packets, secret: {}",
        merged.grip(),
        added,
        merged.is_secret()
    );
    // the superseded value is dropped here, zeroing any secret it held
    *dst = merged;
    Ok(added)
}
