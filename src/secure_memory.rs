//! Secure Memory Handling Utilities
//!
//! Secret key material, decrypted secret packets and passphrases all live in
//! [`SecureBytes`], which erases its heap buffer when dropped, cleared or
//! replaced. Dropping a key, locking it or superseding it during a merge
//! therefore never leaves secret bytes behind in reclaimed memory.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A byte container for sensitive data that is zeroed when dropped.
///
/// # Security Properties
///
/// 1. Automatically zeroes memory when dropped
/// 2. Redacts its contents from `Debug` output
/// 3. Compares in constant time
/// 4. Each clone independently zeroes its own copy
///
/// # Example
///
/// ```
/// use pgp_keyring::secure_memory::SecureBytes;
///
/// let passphrase = SecureBytes::new(b"password");
/// assert_eq!(passphrase.len(), 8);
/// // When `passphrase` goes out of scope, memory is securely zeroed
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Create an empty SecureBytes with pre-allocated capacity
    ///
    /// Passphrase providers write into a buffer created this way, so the
    /// passphrase never reallocates through an unzeroed intermediate.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Get a reference to the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get a mutable reference to the underlying bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Append data to the end of the buffer
    ///
    /// If the append would reallocate, the old allocation is zeroed first.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        let needed = self.bytes.len() + data.len();
        if needed > self.bytes.capacity() {
            let mut grown = Vec::with_capacity(needed.max(self.bytes.capacity() * 2));
            grown.extend_from_slice(&self.bytes);
            self.bytes.zeroize();
            self.bytes = grown;
        }
        self.bytes.extend_from_slice(data);
    }

    /// Replace the contents with `data`, zeroing the previous contents
    pub fn set(&mut self, data: &[u8]) {
        self.clear();
        self.extend_from_slice(data);
    }

    /// Clear the buffer, securely zeroing all data
    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.bytes.clear();
    }

    /// Get the current length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len() && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl Eq for SecureBytes {}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes([REDACTED; {}])", self.bytes.len())
    }
}

impl Serialize for SecureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for SecureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::de::Deserialize::deserialize(deserializer)?;
        Ok(Self { bytes })
    }
}

/// Securely zero memory after a function has completed
///
/// The data is zeroized after the closure completes, on early return and
/// on panic.
///
/// # Arguments
///
/// * `data` - The sensitive data to be zeroized after use
/// * `f` - A closure that will be executed with access to the sensitive data
///
/// # Returns
///
/// The result of executing the closure `f`
///
/// # Example
///
/// ```
/// use pgp_keyring::secure_memory::with_secure_scope;
///
/// let mut key = vec![0x42u8; 32];
/// let sum: u32 = with_secure_scope(&mut key, |k| k.iter().map(|b| *b as u32).sum());
/// assert_eq!(sum, 0x42 * 32);
/// assert!(key.is_empty());
/// ```
pub fn with_secure_scope<T, F, R>(data: &mut T, f: F) -> R
where
    T: Zeroize,
    F: FnOnce(&mut T) -> R,
{
    struct ScopeGuard<'a, T: Zeroize> {
        data: &'a mut T,
    }

    impl<'a, T: Zeroize> Drop for ScopeGuard<'a, T> {
        fn drop(&mut self) {
            self.data.zeroize();
        }
    }

    let mut guard = ScopeGuard { data };
    let result = f(&mut *guard.data);
    drop(guard);
    result
}
