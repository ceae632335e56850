//! Fixed-width wrappers over the Ed25519 and SHA-512 primitives.
//!
//! The rest of the workspace never touches `ed25519_dalek` or `sha2`
//! directly; it calls these free functions, which pin the byte widths
//! (32-byte keys, 64-byte signatures, 64-byte digests) and keep secret
//! material inside [`SecretBytes`].
//!
//! Contract: signing is deterministic per key, and
//! `verify(&derive_public(sk), &sign(sk, m), m)` holds for any generated
//! key.

use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use sha2::{Digest as _, Sha512};

use crate::material::{Digest, PublicKey, Signature};
use crate::secret::SecretBytes;

/// Generate a fresh 32-byte private key.
#[must_use]
pub fn generate_private() -> SecretBytes {
    SecretBytes::generate()
}

/// Derive the public key for a private key.
///
/// Deterministic: the same private key always derives the same public key.
#[must_use]
pub fn derive_public(private: &SecretBytes) -> PublicKey {
    let signing = SigningKey::from_bytes(private.as_bytes());
    PublicKey::from_bytes(signing.verifying_key().to_bytes())
}

/// Sign a message with a private key.
///
/// Ed25519 hashes the message internally, so arbitrary-length messages are
/// signed directly; no pre-hashing is required.
#[must_use]
pub fn sign(private: &SecretBytes, message: &[u8]) -> Signature {
    let signing = SigningKey::from_bytes(private.as_bytes());
    Signature::from_bytes(signing.sign(message).to_bytes())
}

/// Verify a signature over a message against a public key.
///
/// Returns `false` for a bad signature and for public-key bytes that do not
/// decode to a valid curve point.
#[must_use]
pub fn verify(public: &PublicKey, signature: &Signature, message: &[u8]) -> bool {
    let Ok(verifying) = VerifyingKey::from_bytes(public.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying.verify(message, &sig).is_ok()
}

/// Compute the SHA-512 digest of a message.
#[must_use]
pub fn digest(message: &[u8]) -> Digest {
    let mut hasher = Sha512::new();
    hasher.update(message);
    Digest::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let private = generate_private();
        let public = derive_public(&private);

        let message = b"the paired device says hello";
        let signature = sign(&private, message);
        assert!(verify(&public, &signature, message));
    }

    #[test]
    fn test_verify_fails_for_wrong_message() {
        let private = generate_private();
        let public = derive_public(&private);

        let signature = sign(&private, b"original");
        assert!(!verify(&public, &signature, b"tampered"));
    }

    #[test]
    fn test_verify_fails_for_wrong_key() {
        let private = generate_private();
        let other_public = derive_public(&generate_private());

        let signature = sign(&private, b"message");
        assert!(!verify(&other_public, &signature, b"message"));
    }

    #[test]
    fn test_verify_handles_garbage_public_key() {
        // 0xFF.. is not a valid curve point; verify must refuse, not panic.
        let garbage = PublicKey::from_bytes([0xFFu8; 32]);
        let signature = Signature::from_bytes([0u8; 64]);
        assert!(!verify(&garbage, &signature, b"anything"));
    }

    #[test]
    fn test_derive_public_is_deterministic() {
        let private = SecretBytes::new([0x9Du8; 32]);
        let a = derive_public(&private);
        let b = derive_public(&private);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signing_is_deterministic_per_key() {
        // Ed25519 signatures are deterministic: same key, same message,
        // same signature.
        let private = SecretBytes::new([0x11u8; 32]);
        let a = sign(&private, b"same message");
        let b = sign(&private, b"same message");
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_is_64_bytes() {
        let d = digest(b"hello");
        assert_eq!(d.as_bytes().len(), 64);
    }

    #[test]
    fn test_digest_known_vector() {
        // SHA-512 of the empty string.
        let d = digest(b"");
        assert_eq!(
            hex::encode(d.as_bytes()),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_digest_differs_per_message() {
        assert_ne!(digest(b"a"), digest(b"b"));
    }

    #[test]
    fn test_self_signature_of_private_bytes() {
        // The custodian's pair self-test signs the private-key bytes
        // themselves; make sure that shape verifies.
        let private = generate_private();
        let public = derive_public(&private);
        let signature = sign(&private, private.as_bytes());
        assert!(verify(&public, &signature, private.as_bytes()));
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_sign_verify_round_trip_any_seed(seed in any::<[u8; 32]>(), message in any::<Vec<u8>>()) {
            let private = SecretBytes::new(seed);
            let public = derive_public(&private);
            let signature = sign(&private, &message);
            prop_assert!(verify(&public, &signature, &message));
        }

        #[test]
        fn test_digest_is_stable(message in any::<Vec<u8>>()) {
            prop_assert_eq!(digest(&message), digest(&message));
        }
    }
}
