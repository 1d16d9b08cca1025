use crate::grip::Grip;
use crate::key::KeyId;
use crate::secure_memory::SecureBytes;

/// Operation for which a passphrase is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseOperation {
    Unlock,
    Unprotect,
    Protect,
}

/// What a passphrase provider is told about the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassphraseContext {
    pub operation: PassphraseOperation,
    pub keyid: KeyId,
    pub grip: Grip,
}

/// Supplies passphrases on demand
///
/// `request` writes the passphrase into `buf` and returns `true`, or
/// returns `false` to cancel. It may block, for example on a prompt.
/// The keyring never logs or stores what it receives.
pub trait PassphraseProvider {
    fn request(&self, ctx: &PassphraseContext, buf: &mut SecureBytes) -> bool;
}

impl<F> PassphraseProvider for F
where
    F: Fn(&PassphraseContext, &mut SecureBytes) -> bool,
{
    fn request(&self, ctx: &PassphraseContext, buf: &mut SecureBytes) -> bool {
        self(ctx, buf)
    }
}

/// Always answers with the same passphrase
#[derive(Clone)]
pub struct FixedPassphrase {
    passphrase: SecureBytes,
}

impl FixedPassphrase {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: SecureBytes::new(passphrase.as_bytes()),
        }
    }
}

impl PassphraseProvider for FixedPassphrase {
    fn request(&self, _ctx: &PassphraseContext, buf: &mut SecureBytes) -> bool {
        buf.set(self.passphrase.as_bytes());
        true
    }
}

/// Always cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassphrase;

impl PassphraseProvider for NoPassphrase {
    fn request(&self, _ctx: &PassphraseContext, _buf: &mut SecureBytes) -> bool {
        false
    }
}
