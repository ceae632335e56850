//! Text templates for citations, certificates, and documents.
//!
//! Every notarized artifact is a small bracketed text form with `$`-tagged
//! fields. The forms are assembled here and nowhere else, so the byte-exact
//! layout the controller signs is defined in one place. Binary fields
//! (keys, digests, signatures) arrive already rendered in base-32.

/// Assemble a citation: a verifiable reference to one version of a
/// document, carrying the document's digest.
#[must_use]
pub fn citation(timestamp: &str, tag: &str, version: &str, digest: &str) -> String {
    format!(
        "[\n    \
         $protocol: v1\n    \
         $timestamp: {timestamp}\n    \
         $tag: {tag}\n    \
         $version: {version}\n    \
         $digest: {digest}\n\
         ](\n    \
         $type: /keyward/notary/Citation/v1\n\
         )"
    )
}

/// Assemble a public-key certificate.
///
/// `previous` cites the prior certificate on the key chain, or `none` for
/// the first certificate of an account.
#[must_use]
pub fn certificate(
    timestamp: &str,
    account: &str,
    public_key: &str,
    tag: &str,
    version: &str,
    previous: &str,
) -> String {
    format!(
        "[\n    \
         $protocol: v1\n    \
         $timestamp: {timestamp}\n    \
         $accountId: {account}\n    \
         $publicKey: {public_key}\n\
         ](\n    \
         $type: /keyward/notary/Certificate/v1\n    \
         $tag: {tag}\n    \
         $version: {version}\n    \
         $permissions: /keyward/permissions/public/v1\n    \
         $previous: {previous}\n\
         )"
    )
}

/// Assemble the signable body of a document: the component text plus a
/// citation of the certificate whose key will seal it.
///
/// The seal covers exactly these bytes; [`seal_document`] appends the
/// signature afterwards.
#[must_use]
pub fn document_body(component: &str, timestamp: &str, certificate: &str) -> String {
    format!(
        "[\n    \
         $component: {component}\n    \
         $protocol: v1\n    \
         $timestamp: {timestamp}\n    \
         $certificate: {certificate}"
    )
}

/// Close a document body with its seal.
#[must_use]
pub fn seal_document(body: &str, signature: &str) -> String {
    format!(
        "{body}\n    \
         $signature: {signature}\n\
         ](\n    \
         $type: /keyward/notary/Document/v1\n\
         )"
    )
}

/// Recover the signable body of a sealed document, if it has the document
/// shape. This is what a verifier checks the seal against.
#[must_use]
pub fn unsealed_body(document: &str) -> Option<&str> {
    let end = document.rfind("\n    $signature: ")?;
    document.get(..end)
}

/// Indent every line of a component by four spaces so it nests cleanly
/// inside an enclosing form. The first line is not indented; it follows
/// its field tag.
#[must_use]
pub fn indent(component: &str) -> String {
    component.replace('\n', "\n    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_fields_in_order() {
        let text = citation("2025-07-04T12:00:00Z", "TAG123", "v1", "DIGEST456");

        let positions: Vec<usize> = [
            "$protocol: v1",
            "$timestamp: 2025-07-04T12:00:00Z",
            "$tag: TAG123",
            "$version: v1",
            "$digest: DIGEST456",
            "$type: /keyward/notary/Citation/v1",
        ]
        .iter()
        .map(|field| text.find(field).unwrap_or_else(|| panic!("missing {field}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_certificate_carries_the_chain_link() {
        let text = certificate("now", "ACCT", "PUBKEY", "TAG", "v2", "CITATION-OF-V1");
        assert!(text.contains("$publicKey: PUBKEY"));
        assert!(text.contains("$previous: CITATION-OF-V1"));
        assert!(text.contains("$type: /keyward/notary/Certificate/v1"));
        assert!(text.contains("$permissions: /keyward/permissions/public/v1"));
    }

    #[test]
    fn test_first_certificate_has_no_previous() {
        let text = certificate("now", "ACCT", "PUBKEY", "TAG", "v1", "none");
        assert!(text.contains("$previous: none"));
    }

    #[test]
    fn test_document_wraps_component_and_seal() {
        let body = document_body("the component", "now", "CERT-CITATION");
        let text = seal_document(&body, "SEAL");
        assert!(text.starts_with("[\n"));
        assert!(text.contains("$component: the component"));
        assert!(text.contains("$signature: SEAL"));
        assert!(text.ends_with(")"));
    }

    #[test]
    fn test_unsealed_body_recovers_the_signed_bytes() {
        let body = document_body("c", "now", "CERT");
        let sealed = seal_document(&body, "SEAL");
        assert_eq!(unsealed_body(&sealed), Some(body.as_str()));
    }

    #[test]
    fn test_unsealed_body_refuses_non_documents() {
        assert_eq!(unsealed_body("not a document"), None);
    }

    #[test]
    fn test_indent_shifts_continuation_lines_only() {
        assert_eq!(indent("one"), "one");
        assert_eq!(indent("one\ntwo\nthree"), "one\n    two\n    three");
    }

    #[test]
    fn test_forms_are_bracketed() {
        for text in [
            citation("t", "g", "v", "d"),
            certificate("t", "a", "k", "g", "v", "p"),
            seal_document(&document_body("c", "t", "r"), "s"),
        ] {
            assert!(text.starts_with('['));
            assert!(text.contains("]("));
            assert!(text.ends_with(')'));
        }
    }
}
