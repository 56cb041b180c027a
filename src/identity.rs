//! Canonical identifier normalization.
//!
//! Callers arrive with identifiers issued by external systems (LMS user
//! ids, SSO subjects) that are not necessarily UUID-shaped, while every
//! store keys on UUIDs. `canonical_id` maps any string to a UUID
//! deterministically: valid UUIDs pass through, anything else is derived
//! from a SHA-256 digest of the input with the version and variant bits
//! fixed per RFC 4122.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Normalize an arbitrary caller-supplied identifier to a UUID.
///
/// Idempotent: feeding the output back in returns the same value, and the
/// same input always maps to the same UUID.
pub fn canonical_id(id: &str) -> Uuid {
    if let Ok(parsed) = Uuid::parse_str(id) {
        return parsed;
    }
    derive_uuid(id)
}

/// Build a UUID from the leading 16 bytes of SHA-256(input), stamping the
/// version nibble to 4 and the variant bits to `10xx`.
fn derive_uuid(input: &str) -> Uuid {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}
