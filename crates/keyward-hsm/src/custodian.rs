//! The key custodian.
//!
//! Owns the RAM copies of the current and (during a pending rotation) the
//! previous key pair, and performs every manipulation that touches private
//! key material: XOR mask/unmask, the sign-then-verify pair self-test, key
//! generation, rotation, signing, and erasure.
//!
//! # Custody model
//!
//! A pair is `(publicKey, maskedKey)` where `maskedKey = mask ⊕ privateKey`
//! and the 32-byte mask lives only on the paired mobile device. The
//! custodian reconstructs the plaintext private key inside a
//! [`SecretBytes`] scoped to one operation, proves it against the stored
//! public key by signing the private-key bytes themselves and verifying
//! the result, and lets the buffer zeroize on every exit path.
//!
//! # Staging
//!
//! Mutating operations do not update the ring directly. They return a
//! [`Staged`] value carrying the post-operation ring; the controller
//! persists the staged blob first and commits the ring only after the
//! write succeeds, so a storage fault leaves both RAM and flash exactly as
//! they were.

use zeroize::{Zeroize, ZeroizeOnDrop};

use keyward_core::error::{HsmError, HsmResult};
use keyward_crypto::{primitive, PublicKey, SecretBytes, Signature, KEY_LEN};

use crate::store::{StateBlob, StoredPair};

// ============================================================================
// MaskedKey / KeyPair / KeyRing
// ============================================================================

/// A masked private key (`mask ⊕ privateKey`).
///
/// Ciphertext under the one-time-pad scheme, so it may be persisted and
/// copied, but it is still zeroized on drop as part of the erasure
/// discipline.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MaskedKey {
    bytes: [u8; KEY_LEN],
}

impl MaskedKey {
    /// Wrap raw masked bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// The raw masked bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for MaskedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MaskedKey([REDACTED])")
    }
}

/// One custodied key pair: the public key and the masked private key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// The public half, returned to callers as fresh copies.
    pub public: PublicKey,
    /// The masked private half.
    pub masked: MaskedKey,
}

impl KeyPair {
    fn to_stored(&self) -> StoredPair {
        StoredPair {
            public: *self.public.as_bytes(),
            masked: *self.masked.as_bytes(),
        }
    }

    fn from_stored(stored: &StoredPair) -> Self {
        Self {
            public: PublicKey::from_bytes(stored.public),
            masked: MaskedKey::from_bytes(stored.masked),
        }
    }
}

/// The custodian's key slots as a tagged variant.
///
/// The variant *is* the state: the previous pair can exist only while a
/// rotation is pending, and the compiler enforces it.
#[derive(Debug, Clone, Default)]
pub enum KeyRing {
    /// No keys custodied.
    #[default]
    Empty,
    /// The normal operating state: one pair.
    Single(KeyPair),
    /// A rotation is pending: the previous pair is retained so the new
    /// public certificate can be signed by the old private key.
    Rotating {
        /// The freshly generated pair.
        current: KeyPair,
        /// The pair being rotated out, consumed by the next sign.
        previous: KeyPair,
    },
}

impl KeyRing {
    /// Rehydrate from a persisted blob.
    ///
    /// A blob with a previous pair but no current pair cannot be produced
    /// by [`StateBlob::decode`], so the mapping is total.
    #[must_use]
    pub fn from_blob(blob: &StateBlob) -> Self {
        match (&blob.current, &blob.previous) {
            (None, _) => Self::Empty,
            (Some(current), None) => Self::Single(KeyPair::from_stored(current)),
            (Some(current), Some(previous)) => Self::Rotating {
                current: KeyPair::from_stored(current),
                previous: KeyPair::from_stored(previous),
            },
        }
    }

    /// Project to the persistent form.
    #[must_use]
    pub fn to_blob(&self) -> StateBlob {
        match self {
            Self::Empty => StateBlob::default(),
            Self::Single(pair) => StateBlob {
                current: Some(pair.to_stored()),
                previous: None,
            },
            Self::Rotating { current, previous } => StateBlob {
                current: Some(current.to_stored()),
                previous: Some(previous.to_stored()),
            },
        }
    }

    /// The number of custodied pairs.
    #[must_use]
    pub const fn key_count(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Rotating { .. } => 2,
        }
    }
}

// ============================================================================
// Staged
// ============================================================================

/// The result of a mutating custodian operation, not yet committed.
///
/// Carries the post-operation ring alongside the operation's output. The
/// controller persists [`Self::blob`] and then calls
/// [`KeyCustodian::commit`]; dropping a `Staged` instead abandons the
/// operation with no effect (its buffers zeroize on drop).
#[derive(Debug)]
pub struct Staged<T> {
    ring: KeyRing,
    output: T,
}

impl<T> Staged<T> {
    /// The persistent form of the staged ring.
    #[must_use]
    pub fn blob(&self) -> StateBlob {
        self.ring.to_blob()
    }

    /// The key count the ring will have once committed.
    #[must_use]
    pub const fn key_count(&self) -> u8 {
        self.ring.key_count()
    }
}

// ============================================================================
// KeyCustodian
// ============================================================================

/// Owner of the custodied key pairs.
pub struct KeyCustodian {
    ring: KeyRing,
}

impl KeyCustodian {
    /// Rehydrate the custodian from a persisted blob.
    #[must_use]
    pub fn from_blob(blob: &StateBlob) -> Self {
        Self {
            ring: KeyRing::from_blob(blob),
        }
    }

    /// The current ring.
    #[must_use]
    pub const fn ring(&self) -> &KeyRing {
        &self.ring
    }

    /// The number of custodied pairs.
    #[must_use]
    pub const fn key_count(&self) -> u8 {
        self.ring.key_count()
    }

    /// The public half of the current pair, if one exists.
    #[must_use]
    pub const fn current_public(&self) -> Option<&PublicKey> {
        match &self.ring {
            KeyRing::Empty => None,
            KeyRing::Single(pair) | KeyRing::Rotating { current: pair, .. } => Some(&pair.public),
        }
    }

    /// Generate the first key pair, masked with `mask`.
    ///
    /// Returns the staged single-pair ring and a fresh copy of the new
    /// public key.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] if a pair already exists or the mask is
    /// all-zero (an all-zero mask would store the private key unmasked).
    pub fn generate(&self, mask: &SecretBytes) -> HsmResult<Staged<PublicKey>> {
        if !matches!(self.ring, KeyRing::Empty) || mask.is_zero() {
            return Err(HsmError::Rejected);
        }

        let pair = new_masked_pair(mask);
        let public = pair.public.clone();
        Ok(Staged {
            ring: KeyRing::Single(pair),
            output: public,
        })
    }

    /// Rotate the key pair: prove possession of the existing mask, retain
    /// the existing pair as previous, and install a fresh pair masked with
    /// `fresh_mask`.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] if there is not exactly one pair, the fresh
    /// mask is all-zero or equal to the existing mask, or the existing
    /// mask fails the pair self-test.
    pub fn rotate(
        &self,
        existing_mask: &SecretBytes,
        fresh_mask: &SecretBytes,
    ) -> HsmResult<Staged<PublicKey>> {
        let KeyRing::Single(current) = &self.ring else {
            return Err(HsmError::Rejected);
        };
        // Reusing a mask across generations degrades the one-time pad to
        // trivial key recovery, so consecutive masks must differ.
        if fresh_mask.is_zero() || fresh_mask == existing_mask {
            return Err(HsmError::Rejected);
        }

        let candidate = unmask(existing_mask, &current.masked);
        if !pair_matches(&current.public, &candidate) {
            return Err(HsmError::Rejected);
        }
        drop(candidate);

        let fresh = new_masked_pair(fresh_mask);
        let public = fresh.public.clone();
        Ok(Staged {
            ring: KeyRing::Rotating {
                current: fresh,
                previous: current.clone(),
            },
            output: public,
        })
    }

    /// Sign `message`, selecting the previous pair while a rotation is
    /// pending and the current pair otherwise.
    ///
    /// The staged ring is always `Single(current)`: signing from the
    /// rotating state consumes the previous pair.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] if no pair exists or the mask fails the
    /// self-test against the selected pair.
    pub fn sign(&self, mask: &SecretBytes, message: &[u8]) -> HsmResult<Staged<Signature>> {
        let (selected, current) = match &self.ring {
            KeyRing::Empty => return Err(HsmError::Rejected),
            KeyRing::Single(current) => (current, current),
            KeyRing::Rotating { current, previous } => (previous, current),
        };

        let private = unmask(mask, &selected.masked);
        if !pair_matches(&selected.public, &private) {
            return Err(HsmError::Rejected);
        }

        let signature = primitive::sign(&private, message);
        drop(private);

        Ok(Staged {
            ring: KeyRing::Single(current.clone()),
            output: signature,
        })
    }

    /// Install a staged ring and return the operation's output.
    ///
    /// The replaced ring's buffers zeroize as they drop.
    pub fn commit<T>(&mut self, staged: Staged<T>) -> T {
        self.ring = staged.ring;
        staged.output
    }

    /// Destroy all custodied pairs. Replaced buffers zeroize as they drop.
    pub fn erase(&mut self) {
        self.ring = KeyRing::Empty;
    }
}

impl std::fmt::Debug for KeyCustodian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCustodian")
            .field("key_count", &self.key_count())
            .finish()
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// Generate a private key, derive its public key, and mask the private
/// half. The plaintext private key exists only inside this function.
fn new_masked_pair(mask: &SecretBytes) -> KeyPair {
    let private = primitive::generate_private();
    let public = primitive::derive_public(&private);
    let masked = mask.xor_with(private.as_bytes());
    KeyPair {
        public,
        masked: MaskedKey::from_bytes(*masked.as_bytes()),
    }
}

/// Reconstruct a plaintext private key from a mask and a masked key.
fn unmask(mask: &SecretBytes, masked: &MaskedKey) -> SecretBytes {
    mask.xor_with(masked.as_bytes())
}

/// The pair self-test: prove a reconstructed private key matches a stored
/// public key without trusting the caller, by signing the private-key
/// bytes themselves and verifying the signature.
fn pair_matches(public: &PublicKey, private: &SecretBytes) -> bool {
    let signature = primitive::sign(private, private.as_bytes());
    primitive::verify(public, &signature, private.as_bytes())
}

// ============================================================================
// Tests
// ============================================================================
