use super::provider::{PassphraseContext, PassphraseOperation, PassphraseProvider};
use super::s2k::{decrypt_secret, encrypt_secret, ProtectionParams};
use crate::error::{KeyringError, KeyringResult};
use crate::key::{Key, KeyState, SecretMaterial, SecretPacket};
use crate::secure_memory::SecureBytes;

/// Initial capacity of the passphrase buffer handed to providers
const PASSPHRASE_CAPACITY: usize = 128;

impl PassphraseOperation {
    fn as_str(&self) -> &'static str {
        match self {
            PassphraseOperation::Unlock => "unlock",
            PassphraseOperation::Unprotect => "unprotect",
            PassphraseOperation::Protect => "protect",
        }
    }
}

impl Key {
    fn request_passphrase<P>(&self, provider: &P, operation: PassphraseOperation) -> KeyringResult<SecureBytes>
    where
        P: PassphraseProvider + ?Sized,
    {
        let ctx = PassphraseContext {
            operation,
            keyid: *self.keyid(),
            grip: *self.grip(),
        };
        let mut passphrase = SecureBytes::with_capacity(PASSPHRASE_CAPACITY);
        if !provider.request(&ctx, &mut passphrase) {
            log::debug!("Passphrase provider cancelled {} of key {}", operation.as_str(), self.keyid());
            return Err(KeyringError::provider_cancelled(operation.as_str(), &self.keyid().to_string()));
        }
        Ok(passphrase)
    }

    /// Plaintext of the secret packet, decrypting it when protected
    fn secret_plaintext<P>(&self, provider: &P, operation: PassphraseOperation) -> KeyringResult<SecureBytes>
    where
        P: PassphraseProvider + ?Sized,
    {
        match &self.packet.secret {
            Some(SecretPacket::Plain(plaintext)) => Ok(plaintext.clone()),
            Some(SecretPacket::Encrypted {
                protection,
                ciphertext,
            }) => {
                let passphrase = self.request_passphrase(provider, operation)?;
                decrypt_secret(
                    protection,
                    ciphertext,
                    &passphrase,
                    self.fingerprint().as_bytes(),
                    &self.keyid().to_string(),
                )
            }
            None => Err(KeyringError::invalid_state(operation.as_str(), &self.state().to_string())),
        }
    }

    /// Parse secret material into memory.
    ///
    /// From `UnprotectedLocked` the provider is not consulted. From
    /// `ProtectedLocked` a passphrase is requested and the packet stays
    /// encrypted. Unlocking an unlocked key succeeds without doing anything.
    pub fn unlock<P>(&mut self, provider: &P) -> KeyringResult<()>
    where
        P: PassphraseProvider + ?Sized,
    {
        match self.state() {
            KeyState::Unlocked => return Ok(()),
            KeyState::Public => {
                return Err(KeyringError::invalid_state("unlock", &KeyState::Public.to_string()))
            }
            KeyState::ProtectedLocked | KeyState::UnprotectedLocked => {}
        }

        let plaintext = self.secret_plaintext(provider, PassphraseOperation::Unlock)?;
        let secret = SecretMaterial::from_plaintext(&plaintext)?;
        self.packet.material.set_secret(secret)?;
        log::debug!("Unlocked key {}", self.keyid());
        Ok(())
    }

    /// Erase in-memory secret material. Locking a locked key succeeds
    /// without doing anything.
    pub fn lock(&mut self) -> KeyringResult<()> {
        match self.state() {
            KeyState::Public => Err(KeyringError::invalid_state("lock", &KeyState::Public.to_string())),
            KeyState::Unlocked => {
                self.packet.material.clear_secret();
                log::debug!("Locked key {}", self.keyid());
                Ok(())
            }
            KeyState::ProtectedLocked | KeyState::UnprotectedLocked => Ok(()),
        }
    }

    /// Decrypt the secret packet and keep it in plaintext.
    ///
    /// Only valid from `ProtectedLocked`; the key remains locked.
    pub fn unprotect<P>(&mut self, provider: &P) -> KeyringResult<()>
    where
        P: PassphraseProvider + ?Sized,
    {
        let state = self.state();
        if state != KeyState::ProtectedLocked {
            return Err(KeyringError::invalid_state("unprotect", &state.to_string()));
        }

        let plaintext = self.secret_plaintext(provider, PassphraseOperation::Unprotect)?;
        // reject undecodable plaintext before replacing the encrypted packet
        SecretMaterial::from_plaintext(&plaintext)?;
        self.packet.secret = Some(SecretPacket::Plain(plaintext));
        log::info!("Removed passphrase protection from key {}", self.keyid());
        Ok(())
    }

    /// Encrypt the secret packet under a fresh passphrase and parameters.
    ///
    /// Requires accessible material (`Unlocked` or `UnprotectedLocked`).
    /// The lock state does not change.
    pub fn protect<P>(&mut self, provider: &P, params: &ProtectionParams) -> KeyringResult<()>
    where
        P: PassphraseProvider + ?Sized,
    {
        let plaintext = match self.state() {
            KeyState::ProtectedLocked => {
                return Err(KeyringError::locked_material(&self.keyid().to_string()))
            }
            KeyState::Public => {
                return Err(KeyringError::invalid_state("protect", &KeyState::Public.to_string()))
            }
            KeyState::Unlocked => match self.packet.material.secret() {
                Some(secret) => secret.to_plaintext()?,
                None => return Err(KeyringError::locked_material(&self.keyid().to_string())),
            },
            KeyState::UnprotectedLocked => {
                self.secret_plaintext(provider, PassphraseOperation::Protect)?
            }
        };

        let passphrase = self.request_passphrase(provider, PassphraseOperation::Protect)?;
        if passphrase.is_empty() {
            return Err(KeyringError::provider_cancelled(
                PassphraseOperation::Protect.as_str(),
                &self.keyid().to_string(),
            ));
        }

        let (protection, ciphertext) =
            encrypt_secret(&plaintext, &passphrase, params, self.fingerprint().as_bytes())?;
        self.packet.secret = Some(SecretPacket::Encrypted {
            protection,
            ciphertext,
        });
        log::info!(
            "Protected key {} with {:?}",
            self.keyid(),
            params.cipher
        );
        Ok(())
    }
}
