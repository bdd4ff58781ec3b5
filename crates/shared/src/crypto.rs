//! Cryptographic helpers for credential checks and acceptance signatures.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a candidate secret against the expected secret.
///
/// Both sides are hashed first so the byte comparison runs over
/// fixed-length digests, and the comparison itself does not short-circuit.
pub fn secret_matches(candidate: &str, expected: &str) -> bool {
    let a = Sha256::digest(candidate.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Computes the opaque signature blob stored on an acceptance record:
/// HMAC-SHA256 of the accepted payload under the server secret, hex-encoded.
pub fn acceptance_signature(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("override-secret", "override-secret"));
        assert!(!secret_matches("override-secret", "other-secret"));
        assert!(!secret_matches("", "override-secret"));
        assert!(secret_matches("", ""));
    }

    #[test]
    fn test_secret_matches_length_mismatch() {
        assert!(!secret_matches("short", "a much longer secret value"));
    }

    #[test]
    fn test_acceptance_signature_deterministic() {
        let sig1 = acceptance_signature("secret", "guest@x.com:2025-03-15");
        let sig2 = acceptance_signature("secret", "guest@x.com:2025-03-15");
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 64);
    }

    #[test]
    fn test_acceptance_signature_varies_by_secret_and_payload() {
        let base = acceptance_signature("secret", "payload");
        assert_ne!(base, acceptance_signature("secret2", "payload"));
        assert_ne!(base, acceptance_signature("secret", "payload2"));
    }
}
