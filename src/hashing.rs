//! Document Fingerprints
//!
//! A fingerprint is the SHA-256 of a document's compact JSON text, the same
//! bytes `to_json(0)` writes. Generation is deterministic, so regenerating an
//! unchanged graph reproduces the fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn fingerprint<T: Serialize>(document: &T) -> Result<String, serde_json::Error> {
    let compact = serde_json::to_vec(document)?;
    Ok(digest_hex(&compact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_of_empty_input() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_covers_compact_text() {
        let doc = json!({"version": "1.0.0", "semantics": {"clif": "(and)"}});
        let compact = serde_json::to_string(&doc).unwrap();

        assert_eq!(fingerprint(&doc).unwrap(), digest_hex(compact.as_bytes()));
        assert_ne!(
            fingerprint(&doc).unwrap(),
            fingerprint(&json!({"version": "1.0.0"})).unwrap()
        );
    }
}
