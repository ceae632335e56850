//! Non-secret cryptographic byte wrappers.
//!
//! Public keys, signatures, and digests are not secret, but giving them
//! dedicated types keeps the fixed widths bit-exact at every API boundary
//! and makes it impossible to hand a digest where a key is expected.

/// The length of a digital signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// The length of a SHA-512 digest in bytes.
pub const DIGEST_LEN: usize = 64;

use crate::secret::KEY_LEN;

// ============================================================================
// PublicKey
// ============================================================================

/// A 32-byte Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; KEY_LEN],
}

impl PublicKey {
    /// Wrap raw public-key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Wrap a slice, refusing anything that is not exactly 32 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; KEY_LEN] = slice.try_into().ok()?;
        Some(Self { bytes })
    }

    /// The raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.bytes))
    }
}

// ============================================================================
// Signature
// ============================================================================

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LEN],
}

impl Signature {
    /// Wrap raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self { bytes }
    }

    /// Wrap a slice, refusing anything that is not exactly 64 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; SIGNATURE_LEN] = slice.try_into().ok()?;
        Some(Self { bytes })
    }

    /// The raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.bytes))
    }
}

// ============================================================================
// Digest
// ============================================================================

/// A 64-byte SHA-512 digest.
#[derive(Clone, PartialEq, Eq)]
pub struct Digest {
    bytes: [u8; DIGEST_LEN],
}

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self { bytes }
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", hex::encode(self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_round_trip() {
        let key = PublicKey::from_bytes([0x42u8; KEY_LEN]);
        assert_eq!(key.as_bytes(), &[0x42u8; KEY_LEN]);
        assert_eq!(key.as_ref().len(), KEY_LEN);
    }

    #[test]
    fn test_public_key_from_slice_enforces_length() {
        assert!(PublicKey::from_slice(&[0u8; 32]).is_some());
        assert!(PublicKey::from_slice(&[0u8; 64]).is_none());
    }

    #[test]
    fn test_signature_from_slice_enforces_length() {
        assert!(Signature::from_slice(&[0u8; 64]).is_some());
        assert!(Signature::from_slice(&[0u8; 32]).is_none());
    }

    #[test]
    fn test_debug_shows_hex() {
        let key = PublicKey::from_bytes([0xAAu8; KEY_LEN]);
        assert!(format!("{key:?}").starts_with("PublicKey(aaaa"));

        let sig = Signature::from_bytes([0xBBu8; SIGNATURE_LEN]);
        assert!(format!("{sig:?}").starts_with("Signature(bbbb"));

        let digest = Digest::from_bytes([0xCCu8; DIGEST_LEN]);
        assert!(format!("{digest:?}").starts_with("Digest(cccc"));
    }

    #[test]
    fn test_equality() {
        let a = PublicKey::from_bytes([1u8; KEY_LEN]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, PublicKey::from_bytes([2u8; KEY_LEN]));
    }
}
