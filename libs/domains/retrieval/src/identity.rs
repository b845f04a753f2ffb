//! Caller ID -> backend point ID mapping.
//!
//! Qdrant only accepts unsigned integers or UUIDs as point IDs, while callers
//! hand us arbitrary strings. The mapping is a pure function of the string so
//! nothing has to be stored: re-upserting the same caller ID lands on the same
//! point and overwrites it.
//!
//! The value is the first 15 hex digits of the SHA-1 digest of the UTF-8
//! bytes, masked to 63 bits. Points written by earlier deployments of the
//! service use the same scheme, so the width must not change.

use sha1::{Digest, Sha1};

/// Number of leading hex digits of the digest that make up the ID.
pub const PREFIX_HEX_DIGITS: u32 = 15;

const SIGN_MASK: u64 = (1 << 63) - 1;

/// Map a caller-supplied string ID onto a non-negative 63-bit point ID.
pub fn point_id(id: &str) -> u64 {
    let digest = Sha1::digest(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);

    // 16 hex digits live in the first 8 bytes; drop the trailing nibbles.
    let prefix = u64::from_be_bytes(head) >> (4 * (16 - PREFIX_HEX_DIGITS));
    prefix & SIGN_MASK
}

/// Map a batch of caller IDs, preserving order.
pub fn point_ids<S: AsRef<str>>(ids: &[S]) -> Vec<u64> {
    ids.iter().map(|id| point_id(id.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_digests() {
        // sha1("abc") = a9993e364706816aba3e...
        assert_eq!(point_id("abc"), 0xa9993e364706816);
        // sha1("") = da39a3ee5e6b4b0d3255...
        assert_eq!(point_id(""), 0xda39a3ee5e6b4b0);
    }

    #[test]
    fn test_is_deterministic() {
        assert_eq!(point_id("snippet-42"), point_id("snippet-42"));
        assert_ne!(point_id("snippet-42"), point_id("snippet-43"));
    }

    #[test]
    fn test_fits_signed_range() {
        for i in 0..1_000 {
            let id = point_id(&format!("id-{}", i));
            assert!(id <= i64::MAX as u64);
        }
    }

    #[test]
    fn test_no_collisions_for_ten_thousand_ids() {
        let ids: HashSet<u64> = (0..10_000).map(|i| point_id(&format!("s{}", i))).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_batch_preserves_order() {
        let ids = point_ids(&["b", "a"]);
        assert_eq!(ids, vec![point_id("b"), point_id("a")]);
    }

    #[test]
    fn test_unicode_ids_hash_utf8_bytes() {
        assert_eq!(point_id("métrique"), point_id("métrique"));
        assert_ne!(point_id("métrique"), point_id("metrique"));
    }
}
