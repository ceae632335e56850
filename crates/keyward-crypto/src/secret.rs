//! The secret byte buffer.
//!
//! [`SecretBytes`] is the only type in the workspace that holds secret
//! material in RAM: reconstructed private keys and the masks supplied by
//! the paired mobile device. It guarantees:
//!
//! - Zeroization on drop, on every exit path including panics
//! - No `Clone`, so secret material cannot be silently duplicated
//! - Redacted debug output
//! - Constant-time comparison

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The length of every key-sized buffer in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte secret buffer with automatic zeroization.
///
/// Ownership is the scope of the secret: moving a `SecretBytes` moves the
/// material, and dropping it overwrites the bytes with zero before the
/// memory is released. The type intentionally does not implement `Clone`.
///
/// # Example
///
/// ```
/// use keyward_crypto::SecretBytes;
///
/// let secret = SecretBytes::generate();
/// assert_eq!(secret.as_bytes().len(), 32);
/// // Zeroized here when `secret` goes out of scope.
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes {
    bytes: [u8; KEY_LEN],
}

impl SecretBytes {
    /// Wrap raw bytes.
    ///
    /// The input is copied; callers holding the original array should
    /// zeroize it themselves once it is no longer needed.
    #[must_use]
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random secret from the operating system's CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap a slice, refusing anything that is not exactly 32 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; KEY_LEN] = slice.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Expose the raw bytes for an immediate cryptographic operation.
    ///
    /// The returned reference must not be stored or copied beyond that
    /// operation.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Whether every byte is zero, in constant time.
    ///
    /// An all-zero mask would make the masked key equal to the plaintext
    /// key, so the custodian refuses it.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.bytes.ct_eq(&[0u8; KEY_LEN]).into()
    }

    /// XOR this secret with another, producing the combined bytes.
    ///
    /// Used both directions of the custody scheme: `mask ⊕ private` masks a
    /// key for storage and `mask ⊕ masked` reconstructs it.
    #[must_use]
    pub fn xor_with(&self, other: &[u8; KEY_LEN]) -> Self {
        let mut out = [0u8; KEY_LEN];
        for (o, (a, b)) in out.iter_mut().zip(self.bytes.iter().zip(other.iter())) {
            *o = a ^ b;
        }
        Self { bytes: out }
    }
}

// Prevent accidental debug printing of secrets.
impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBytes([REDACTED])")
    }
}

// Constant-time equality to prevent timing leaks on mask comparison.
impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SecretBytes {}

impl From<[u8; KEY_LEN]> for SecretBytes {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self::new(bytes)
    }
}
