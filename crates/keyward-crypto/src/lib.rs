//! Cryptographic building blocks for the keyward custodian.
//!
//! This crate provides exactly three things:
//!
//! - [`secret::SecretBytes`] - the only type that holds secret material in
//!   RAM, zeroized on every release path
//! - [`material`] - plain byte wrappers for public keys, signatures, and
//!   digests
//! - [`primitive`] - fixed-width wrappers over Ed25519 and SHA-512
//!
//! Everything above this crate manipulates keys only through these types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod material;
pub mod primitive;
pub mod secret;

pub use material::{Digest, PublicKey, Signature, DIGEST_LEN, SIGNATURE_LEN};
pub use secret::{SecretBytes, KEY_LEN};
