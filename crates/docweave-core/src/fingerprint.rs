//! Content fingerprinting.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of document content, hex-encoded.
///
/// Identical content always yields the same fingerprint, so it doubles as
/// the validity key for cached link extraction.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
