//! The keyward HSM controller.
//!
//! A small state machine that custodies one Ed25519 signing key on behalf
//! of a single paired mobile device. The private key is never held in
//! plaintext outside the body of one operation: at rest it is stored XOR-ed
//! with a 32-byte mask the device supplies, and in RAM it lives only inside
//! zeroize-on-drop buffers.
//!
//! # Layers
//!
//! - [`state`] - the compile-time transition table guarding every request
//! - [`store`] - the single 129-byte persistent state blob
//! - [`consent`] - physical-button approval with a bounded wait
//! - [`custodian`] - mask/unmask, pair self-test, and the key ring
//! - [`controller`] - the coordinator tying the layers together
//!
//! # Example
//!
//! ```no_run
//! use keyward_crypto::SecretBytes;
//! use keyward_hsm::consent::ConsentGate;
//! use keyward_hsm::controller::HsmController;
//! use keyward_hsm::store::StateStore;
//!
//! let store = StateStore::new("/cdt/state");
//! let mut hsm = HsmController::open(store, ConsentGate::disabled())?;
//!
//! let mask = SecretBytes::generate();
//! let public = hsm.generate_keys(mask)?;
//! println!("paired, public key {public:?}");
//! # Ok::<(), keyward_core::error::HsmError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod consent;
pub mod controller;
pub mod custodian;
pub mod state;
pub mod store;

pub use controller::HsmController;
pub use state::{ControllerState, Request};
