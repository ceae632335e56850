//! The top-level HSM controller.
//!
//! [`HsmController`] coordinates the layers for every request:
//!
//! 1. consult the state machine; an inadmissible request is refused with
//!    no side effect
//! 2. gate on physical consent where required (generate, rotate, sign),
//!    holding the indicator LED lit for the duration
//! 3. delegate the cryptographic work to the [`KeyCustodian`]
//! 4. persist the staged ring, then commit it and advance the state
//! 5. let every transient secret zeroize on every exit path
//!
//! Failures surface as the uniform [`HsmError::Rejected`]; only a
//! persistence fault is distinguishable, and it aborts the operation
//! before any state change.

use tracing::{debug, info};

use keyward_core::error::{HsmError, HsmResult};
use keyward_crypto::{primitive, Digest, PublicKey, SecretBytes, Signature};

use crate::consent::{ConsentGate, Indicator, IndicatorGuard, NullIndicator};
use crate::custodian::KeyCustodian;
use crate::state::{ControllerState, Request};
use crate::store::{StateBlob, StateStore};

/// The hardware security module controller.
///
/// The physical device hosts exactly one controller; construct it once in
/// the entry point and own it there. On drop the custodied RAM buffers
/// zeroize; the persisted blob survives for the next boot.
pub struct HsmController {
    state: ControllerState,
    custodian: KeyCustodian,
    store: StateStore,
    consent: ConsentGate,
    indicator: Box<dyn Indicator>,
}

impl HsmController {
    /// Rehydrate a controller from its persistent store, with no
    /// indicator LED.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob exists but cannot be read. An
    /// absent or malformed blob is not an error; it boots the controller
    /// into `NoKeyPairs`.
    pub fn open(store: StateStore, consent: ConsentGate) -> HsmResult<Self> {
        Self::open_with_indicator(store, consent, Box::new(NullIndicator))
    }

    /// Rehydrate a controller, driving `indicator` during consent-gated
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob exists but cannot be read.
    pub fn open_with_indicator(
        store: StateStore,
        consent: ConsentGate,
        indicator: Box<dyn Indicator>,
    ) -> HsmResult<Self> {
        let blob = store.load()?;
        let custodian = KeyCustodian::from_blob(&blob);
        let state = ControllerState::from_key_count(custodian.key_count())
            .unwrap_or(ControllerState::NoKeyPairs);
        info!(%state, path = %store.path().display(), "controller rehydrated");

        Ok(Self {
            state,
            custodian,
            store,
            consent,
            indicator,
        })
    }

    /// The controller's current state.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether a physical button is enforcing consent.
    #[must_use]
    pub fn consent_enabled(&self) -> bool {
        self.consent.is_enabled()
    }

    /// A fresh copy of the current public key, if a pair is custodied.
    ///
    /// Public material only; the masked half is never exposed.
    #[must_use]
    pub fn current_public(&self) -> Option<PublicKey> {
        self.custodian.current_public().cloned()
    }

    /// Generate the first key pair, masked with `mask`, and return a fresh
    /// copy of the new public key.
    ///
    /// Admissible only from `NoKeyPairs`; requires consent. The mask is
    /// zeroized before this method returns, whether or not it succeeds.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] on any refusal; [`HsmError::Store`] on a
    /// persistence fault (aborts with no state change).
    pub fn generate_keys(&mut self, mask: SecretBytes) -> HsmResult<PublicKey> {
        self.admit(Request::GenerateKeys)?;
        let _led = IndicatorGuard::light(self.indicator.as_mut());
        if !self.consent.approved() {
            debug!("consent window expired");
            return Err(HsmError::Rejected);
        }

        let staged = self.custodian.generate(&mask)?;
        self.store.store(&staged.blob())?;
        let public = self.custodian.commit(staged);
        self.state = self.state.next(Request::GenerateKeys);
        info!(state = %self.state, "key pair generated");
        Ok(public)
    }

    /// Rotate the key pair: prove possession of `existing_mask`, retain
    /// the current pair as previous, and install a fresh pair masked with
    /// `fresh_mask`. Returns a fresh copy of the new public key.
    ///
    /// Admissible only from `OneKeyPair`; requires consent. The retained
    /// pair is consumed by the next successful [`Self::sign_bytes`], which
    /// is how the new public certificate gets signed by the old private
    /// key. Until then, further rotations are refused. Both masks are
    /// zeroized before this method returns.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] on any refusal, including a wrong existing
    /// mask; [`HsmError::Store`] on a persistence fault.
    pub fn rotate_keys(
        &mut self,
        existing_mask: SecretBytes,
        fresh_mask: SecretBytes,
    ) -> HsmResult<PublicKey> {
        self.admit(Request::RotateKeys)?;
        let _led = IndicatorGuard::light(self.indicator.as_mut());
        if !self.consent.approved() {
            debug!("consent window expired");
            return Err(HsmError::Rejected);
        }

        let staged = self.custodian.rotate(&existing_mask, &fresh_mask)?;
        self.store.store(&staged.blob())?;
        let public = self.custodian.commit(staged);
        self.state = self.state.next(Request::RotateKeys);
        info!(state = %self.state, "key pair rotated; previous pair retained for chain signing");
        Ok(public)
    }

    /// Destroy all key material, in RAM and on disk.
    ///
    /// Admissible from any state and deliberately not consent-gated: erase
    /// is the remedy for a lost or stolen paired device, and gating it
    /// behind the device's own button would be backwards.
    ///
    /// # Errors
    ///
    /// [`HsmError::Store`] if the zeroed blob cannot be persisted; the
    /// keys are retained in that case.
    pub fn erase_keys(&mut self) -> HsmResult<()> {
        self.admit(Request::EraseKeys)?;

        self.store.store(&StateBlob::default())?;
        self.custodian.erase();
        self.state = self.state.next(Request::EraseKeys);
        info!("all key material erased");
        Ok(())
    }

    /// Compute the SHA-512 digest of `message`. Touches no keys and does
    /// not change state.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] while a rotation is pending.
    pub fn digest_bytes(&self, message: &[u8]) -> HsmResult<Digest> {
        self.admit(Request::DigestBytes)?;
        Ok(primitive::digest(message))
    }

    /// Sign `message` with the custodied key and return the 64-byte
    /// signature.
    ///
    /// While a rotation is pending the *previous* pair signs (one last
    /// time, unlocked by the previous mask) and is then destroyed,
    /// returning the controller to `OneKeyPair`; otherwise the current
    /// pair signs and the state is unchanged. Requires consent. The mask
    /// is zeroized before this method returns.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] on any refusal, including a mask that fails
    /// the pair self-test; [`HsmError::Store`] on a persistence fault.
    pub fn sign_bytes(&mut self, mask: SecretBytes, message: &[u8]) -> HsmResult<Signature> {
        self.admit(Request::SignBytes)?;
        let consuming_previous = self.state == ControllerState::TwoKeyPairs;
        let _led = IndicatorGuard::light(self.indicator.as_mut());
        if !self.consent.approved() {
            debug!("consent window expired");
            return Err(HsmError::Rejected);
        }

        let staged = self.custodian.sign(&mask, message)?;
        if consuming_previous {
            // The previous pair is consumed; the shrunken ring must land
            // on disk before the state machine moves on.
            self.store.store(&staged.blob())?;
        }
        let signature = self.custodian.commit(staged);
        self.state = self.state.next(Request::SignBytes);
        if consuming_previous {
            info!(state = %self.state, "signed with previous key; rotation complete");
        }
        Ok(signature)
    }

    /// Check a signature over `message` against a caller-supplied public
    /// key, which need not be one of the controller's own. Stateless.
    ///
    /// # Errors
    ///
    /// [`HsmError::Rejected`] while a rotation is pending.
    pub fn valid_signature(
        &self,
        public: &PublicKey,
        signature: &Signature,
        message: &[u8],
    ) -> HsmResult<bool> {
        self.admit(Request::ValidSignature)?;
        Ok(primitive::verify(public, signature, message))
    }

    /// Refuse the request if the transition table disallows it here.
    fn admit(&self, request: Request) -> HsmResult<()> {
        if self.state.permits(request) {
            Ok(())
        } else {
            debug!(%request, state = %self.state, "request refused by state machine");
            Err(HsmError::Rejected)
        }
    }
}

impl std::fmt::Debug for HsmController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HsmController")
            .field("state", &self.state)
            .field("consent_enabled", &self.consent.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use keyward_crypto::KEY_LEN;
    use tempfile::TempDir;

    fn mask(fill: u8) -> SecretBytes {
        SecretBytes::new([fill; KEY_LEN])
    }

    fn controller_in(dir: &TempDir) -> HsmController {
        let store = StateStore::new(dir.path().join("state"));
        HsmController::open(store, ConsentGate::disabled()).expect("open")
    }

    #[test]
    fn test_boots_into_no_key_pairs() {
        let dir = TempDir::new().expect("temp dir");
        let hsm = controller_in(&dir);
        assert_eq!(hsm.state(), ControllerState::NoKeyPairs);
        assert!(!hsm.consent_enabled());
    }

    #[test]
    fn test_sign_before_generate_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut hsm = controller_in(&dir);
        let result = hsm.sign_bytes(mask(0x55), b"hello");
        assert!(matches!(result, Err(HsmError::Rejected)));
    }

    #[test]
    fn test_second_generate_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut hsm = controller_in(&dir);
        hsm.generate_keys(mask(0x55)).expect("first generate");
        let result = hsm.generate_keys(mask(0x66));
        assert!(matches!(result, Err(HsmError::Rejected)));
        assert_eq!(hsm.state(), ControllerState::OneKeyPair);
    }

    #[test]
    fn test_digest_and_verify_refused_during_pending_rotation() {
        let dir = TempDir::new().expect("temp dir");
        let mut hsm = controller_in(&dir);
        hsm.generate_keys(mask(0x55)).expect("generate");
        hsm.rotate_keys(mask(0x55), mask(0x77)).expect("rotate");
        assert_eq!(hsm.state(), ControllerState::TwoKeyPairs);

        assert!(matches!(
            hsm.digest_bytes(b"x"),
            Err(HsmError::Rejected)
        ));
        let public = PublicKey::from_bytes([0u8; KEY_LEN]);
        let signature = Signature::from_bytes([0u8; 64]);
        assert!(matches!(
            hsm.valid_signature(&public, &signature, b"x"),
            Err(HsmError::Rejected)
        ));
    }

    #[test]
    fn test_digest_works_without_keys() {
        let dir = TempDir::new().expect("temp dir");
        let hsm = controller_in(&dir);
        let digest = hsm.digest_bytes(b"no keys needed").expect("digest");
        assert_eq!(digest.as_bytes().len(), 64);
    }

    #[test]
    fn test_erase_without_keys_is_a_no_op_success() {
        let dir = TempDir::new().expect("temp dir");
        let mut hsm = controller_in(&dir);
        hsm.erase_keys().expect("erase");
        assert_eq!(hsm.state(), ControllerState::NoKeyPairs);
    }

    #[test]
    fn test_debug_output_has_no_key_material() {
        let dir = TempDir::new().expect("temp dir");
        let mut hsm = controller_in(&dir);
        hsm.generate_keys(mask(0x55)).expect("generate");
        let rendered = format!("{hsm:?}");
        assert!(rendered.contains("state"));
        assert!(!rendered.contains("masked"));
    }
}
