//! Short content identifiers.
//!
//! Projects and requests are identified by the first 16 hex digits of the
//! SHA-256 of their defining text. Sixteen digits (64 bits) keep log lines
//! and directory names short while making accidental collisions between
//! the handful of projects on a single host vanishingly unlikely.

use sha2::{Digest, Sha256};

/// First 16 hex digits of the SHA-256 of `data`.
#[must_use]
pub fn hex16(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(&digest[..8])
}

/// Correlation hash for a user request.
///
/// The same request text always produces the same hash, which is how
/// routing recommendations are later joined to tracking events.
#[must_use]
pub fn request_hash(request: &str) -> String {
    hex16(request.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex16_length_and_charset() {
        let h = hex16(b"hello");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hex16_is_sha256_prefix() {
        // SHA-256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(hex16(b"hello"), "2cf24dba5fb0a30e");
    }

    #[test]
    fn test_request_hash_stable() {
        let a = request_hash("fix the typo");
        let b = request_hash("fix the typo");
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_hash_distinguishes() {
        assert_ne!(request_hash("a"), request_hash("b"));
    }
}
