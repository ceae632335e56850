//! The digital-notary wrapper.
//!
//! [`DigitalNotary`] drives the HSM controller through the key-ceremony
//! and notarization flows:
//!
//! - **First certificate**: generate the key pair, assemble a certificate
//!   carrying the new public key, and sign it with that same key.
//! - **Renewal**: rotate the key pair and sign the new certificate with
//!   the *previous* private key, chaining certificates so each one is
//!   vouched for by its predecessor. Only the first certificate is
//!   self-signed.
//! - **Notarize**: wrap a component in a document form citing the signing
//!   certificate, and seal it.
//! - **Cite**: digest a document into a citation that pins its content.
//!
//! All binary material crosses this layer rendered in the base-32
//! alphabet; the controller itself traffics only in raw bytes.

use rand::RngCore;

use keyward_core::error::{HsmError, HsmResult};
use keyward_crypto::{PublicKey, SecretBytes};
use keyward_hsm::HsmController;

use crate::templates;

/// Length of a notary tag in bytes (rendered as 32 base-32 characters).
pub const TAG_LEN: usize = 20;

/// A certificate issued by the notary, ready to publish.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// The certificate text that was signed.
    pub certificate: String,
    /// The base-32 seal over the certificate text.
    pub seal: String,
    /// The public key the certificate carries.
    pub public: PublicKey,
    /// The key that can validate the seal: the previous certificate's key
    /// for a renewal, this certificate's own key for the first issue.
    pub sealed_by: PublicKey,
}

/// A thin notary layer over one HSM controller.
pub struct DigitalNotary {
    hsm: HsmController,
    account: String,
}

impl DigitalNotary {
    /// Wrap a controller for the given account.
    pub fn new(hsm: HsmController, account: impl Into<String>) -> Self {
        Self {
            hsm,
            account: account.into(),
        }
    }

    /// Borrow the underlying controller.
    #[must_use]
    pub const fn controller(&self) -> &HsmController {
        &self.hsm
    }

    /// Issue the first certificate for this account.
    ///
    /// Generates the key pair under `mask`, then signs the certificate
    /// with the same new key (the only self-signed certificate on the
    /// chain).
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection and storage errors.
    pub fn issue_first_certificate(
        &mut self,
        timestamp: &str,
        mask: SecretBytes,
    ) -> HsmResult<IssuedCertificate> {
        let sign_mask = SecretBytes::new(*mask.as_bytes());
        let public = self.hsm.generate_keys(mask)?;

        let certificate = self.assemble_certificate(timestamp, &public, "v1", "none");
        let signature = self.hsm.sign_bytes(sign_mask, certificate.as_bytes())?;

        Ok(IssuedCertificate {
            certificate,
            seal: keyward_codec::encode(signature.as_bytes()),
            sealed_by: public.clone(),
            public,
        })
    }

    /// Renew the certificate: rotate the key pair and seal the new
    /// certificate with the previous private key.
    ///
    /// `version` names the new certificate's version and `previous` cites
    /// the certificate being superseded.
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection (including a pending
    /// unconsumed rotation) and storage errors.
    pub fn renew_certificate(
        &mut self,
        timestamp: &str,
        version: &str,
        previous: &str,
        existing_mask: SecretBytes,
        fresh_mask: SecretBytes,
    ) -> HsmResult<IssuedCertificate> {
        let sign_mask = SecretBytes::new(*existing_mask.as_bytes());
        let sealed_by = self.current_public()?;
        let public = self.hsm.rotate_keys(existing_mask, fresh_mask)?;

        let certificate = self.assemble_certificate(timestamp, &public, version, previous);
        // The controller is in the rotating state, so this sign uses the
        // previous key one last time and completes the rotation.
        let signature = self.hsm.sign_bytes(sign_mask, certificate.as_bytes())?;

        Ok(IssuedCertificate {
            certificate,
            seal: keyward_codec::encode(signature.as_bytes()),
            public,
            sealed_by,
        })
    }

    /// Notarize a component: wrap it in a document citing the signing
    /// certificate, seal the document, and return the full document text.
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection and storage errors.
    pub fn notarize(
        &mut self,
        component: &str,
        timestamp: &str,
        certificate_citation: &str,
        mask: SecretBytes,
    ) -> HsmResult<String> {
        let body =
            templates::document_body(&templates::indent(component), timestamp, certificate_citation);
        let signature = self.hsm.sign_bytes(mask, body.as_bytes())?;
        let seal = keyward_codec::encode(signature.as_bytes());
        Ok(templates::seal_document(&body, &seal))
    }

    /// Check a sealed document against the public key of the certificate
    /// it cites. The seal covers the document body up to the signature
    /// field.
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection (verification is
    /// refused while a rotation is pending).
    pub fn document_is_valid(&self, document: &str, public: &PublicKey) -> HsmResult<bool> {
        let Some(body) = templates::unsealed_body(document) else {
            return Ok(false);
        };
        let seal_start = body.len() + "\n    $signature: ".len();
        let Some(tail) = document.get(seal_start..) else {
            return Ok(false);
        };
        let Some(seal) = tail.lines().next() else {
            return Ok(false);
        };
        self.seal_is_valid(body, seal, public)
    }

    /// Build a citation for a document: digest its bytes and pin them
    /// under a fresh tag.
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection (digesting is refused
    /// while a rotation is pending).
    pub fn cite(&self, document: &str, timestamp: &str, version: &str) -> HsmResult<String> {
        let digest = self.hsm.digest_bytes(document.as_bytes())?;
        Ok(templates::citation(
            timestamp,
            &new_tag(),
            version,
            &keyward_codec::encode(digest.as_bytes()),
        ))
    }

    /// Check a base-32 seal over `text` against a public key.
    ///
    /// The key may come from any certificate, not just this notary's; a
    /// seal that does not decode is simply invalid.
    ///
    /// # Errors
    ///
    /// Propagates the controller's uniform rejection (verification is
    /// refused while a rotation is pending).
    pub fn seal_is_valid(&self, text: &str, seal: &str, public: &PublicKey) -> HsmResult<bool> {
        let Ok(bytes) = keyward_codec::decode(seal) else {
            return Ok(false);
        };
        let Some(signature) = keyward_crypto::Signature::from_slice(&bytes) else {
            return Ok(false);
        };
        self.hsm.valid_signature(public, &signature, text.as_bytes())
    }

    fn assemble_certificate(
        &self,
        timestamp: &str,
        public: &PublicKey,
        version: &str,
        previous: &str,
    ) -> String {
        templates::certificate(
            timestamp,
            &self.account,
            &keyward_codec::encode(public.as_bytes()),
            &new_tag(),
            version,
            previous,
        )
    }

    /// The public key currently custodied; a renewal reports it as the
    /// sealer of the new certificate.
    fn current_public(&self) -> HsmResult<PublicKey> {
        self.hsm.current_public().ok_or(HsmError::Rejected)
    }
}

impl std::fmt::Debug for DigitalNotary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalNotary")
            .field("account", &self.account)
            .field("state", &self.hsm.state())
            .finish()
    }
}

/// Generate a fresh random tag, rendered as 32 base-32 characters.
#[must_use]
pub fn new_tag() -> String {
    let mut bytes = [0u8; TAG_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    keyward_codec::encode(&bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use keyward_crypto::KEY_LEN;
    use keyward_hsm::consent::ConsentGate;
    use keyward_hsm::store::StateStore;
    use tempfile::TempDir;

    fn mask(fill: u8) -> SecretBytes {
        SecretBytes::new([fill; KEY_LEN])
    }

    fn notary_in(dir: &TempDir) -> DigitalNotary {
        let store = StateStore::new(dir.path().join("state"));
        let hsm = HsmController::open(store, ConsentGate::disabled()).expect("open");
        DigitalNotary::new(hsm, "ZXN8VVV9KX2HGFJ4TGP1M0QS")
    }

    #[test]
    fn test_first_certificate_is_self_sealed() {
        let dir = TempDir::new().expect("temp dir");
        let mut notary = notary_in(&dir);

        let issued = notary
            .issue_first_certificate("2025-07-04T12:00:00Z", mask(0x55))
            .expect("issue");

        assert_eq!(issued.sealed_by, issued.public);
        assert!(issued.certificate.contains("$previous: none"));
        assert!(issued
            .certificate
            .contains(&keyward_codec::encode(issued.public.as_bytes())));
        assert!(notary
            .seal_is_valid(&issued.certificate, &issued.seal, &issued.sealed_by)
            .expect("validate"));
    }

    #[test]
    fn test_renewal_is_sealed_by_the_previous_key() {
        let dir = TempDir::new().expect("temp dir");
        let mut notary = notary_in(&dir);

        let first = notary
            .issue_first_certificate("2025-07-04T12:00:00Z", mask(0x55))
            .expect("issue");
        let citation = notary
            .cite(&first.certificate, "2025-07-04T12:00:01Z", "v1")
            .expect("cite");

        let renewed = notary
            .renew_certificate(
                "2026-07-04T12:00:00Z",
                "v2",
                &citation,
                mask(0x55),
                mask(0x77),
            )
            .expect("renew");

        // The chain link: the old key vouches for the new certificate.
        assert_eq!(renewed.sealed_by, first.public);
        assert_ne!(renewed.public, first.public);
        assert!(notary
            .seal_is_valid(&renewed.certificate, &renewed.seal, &first.public)
            .expect("validate"));
        assert!(!notary
            .seal_is_valid(&renewed.certificate, &renewed.seal, &renewed.public)
            .expect("validate"));
    }

    #[test]
    fn test_notarized_document_seal_validates() {
        let dir = TempDir::new().expect("temp dir");
        let mut notary = notary_in(&dir);

        let issued = notary
            .issue_first_certificate("2025-07-04T12:00:00Z", mask(0x55))
            .expect("issue");
        let citation = notary
            .cite(&issued.certificate, "2025-07-04T12:00:01Z", "v1")
            .expect("cite");

        let document = notary
            .notarize("a component\nwith two lines", "now", &citation, mask(0x55))
            .expect("notarize");

        assert!(document.contains("$component: a component\n    with two lines"));
        assert!(notary
            .document_is_valid(&document, &issued.public)
            .expect("validate"));

        // A flipped byte in the component invalidates the seal.
        let tampered = document.replace("two lines", "ten lines");
        assert!(!notary
            .document_is_valid(&tampered, &issued.public)
            .expect("validate"));
    }

    #[test]
    fn test_citation_pins_the_document_digest() {
        let dir = TempDir::new().expect("temp dir");
        let mut notary = notary_in(&dir);
        notary
            .issue_first_certificate("now", mask(0x55))
            .expect("issue");

        let citation = notary.cite("some document", "now", "v1").expect("cite");
        let expected = notary
            .controller()
            .digest_bytes(b"some document")
            .expect("digest");
        assert!(citation.contains(&keyward_codec::encode(expected.as_bytes())));
    }

    #[test]
    fn test_garbage_seal_is_invalid_not_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let mut notary = notary_in(&dir);
        let issued = notary
            .issue_first_certificate("now", mask(0x55))
            .expect("issue");

        assert!(!notary
            .seal_is_valid("text", "not base32!", &issued.public)
            .expect("validate"));
        assert!(!notary
            .seal_is_valid("text", "00", &issued.public)
            .expect("validate"));
    }

    #[test]
    fn test_tags_are_unique_and_well_formed() {
        let a = new_tag();
        let b = new_tag();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.bytes().all(|c| keyward_codec::ALPHABET.contains(&c)));
    }
}
