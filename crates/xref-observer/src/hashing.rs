//! Content hashing for signatures via xxh3.
//!
//! Digests are rendered as lowercase hex so they never carry a character a
//! downstream graph store rejects.

use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

/// Render a 64-bit hash as a fixed-width hex string.
#[inline]
pub fn hash_to_string(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Hash raw bytes (a buffer slice, a token) into a 16-character digest.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> String {
    hash_to_string(xxh3_64(bytes))
}

/// Shorten `input` to a 128-bit digest when it is longer than `threshold`
/// bytes, or unconditionally when `force` is set.
pub fn compress_string(input: &str, force: bool, threshold: usize) -> String {
    if !force && input.len() <= threshold {
        return input.to_string();
    }
    format!("{:032x}", xxh3_128(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(compress_string("C#c#t", false, 128), "C#c#t");
    }

    #[test]
    fn long_strings_are_hashed() {
        let long = "x".repeat(200);
        let compressed = compress_string(&long, false, 128);
        assert_eq!(compressed.len(), 32);
        assert!(compressed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(compressed, compress_string(&long, false, 128));
    }

    #[test]
    fn forced_hash_hides_raw_text() {
        let doc = "/// returns a\n\0value";
        let forced = compress_string(doc, true, 128);
        assert_ne!(forced, doc);
        assert!(!forced.contains('\n'));
        assert_eq!(forced, compress_string(doc, true, 4096));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(compress_string("abcd", false, 4), "abcd");
        assert_ne!(compress_string("abcde", false, 4), "abcde");
    }

    #[test]
    fn byte_hash_width() {
        assert_eq!(hash_bytes(b"").len(), 16);
        assert_ne!(hash_bytes(b"FOO"), hash_bytes(b"BAR"));
    }
}
