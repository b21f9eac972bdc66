//! Per-message checksum.
//!
//! A thin wrapper around a vetted hashing crate. Computes XXH64 since the
//! wire format is defined as `XXH64(seq_be || payload)`.

use xxhash_rust::xxh64::Xxh64;

use crate::constants::CHECKSUM_SEED;

/// Compute the checksum for a published message: XXH64 over the big-endian
/// sequence number concatenated with the serialized message bytes, seeded
/// with 7.
pub fn checksum_of(sequence: u64, payload: &[u8]) -> u64 {
    let mut hasher = Xxh64::new(CHECKSUM_SEED);
    hasher.update(&sequence.to_be_bytes());
    hasher.update(payload);
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let a = checksum_of(1, b"hello");
        let b = checksum_of(1, b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_depends_on_sequence() {
        let a = checksum_of(1, b"hello");
        let b = checksum_of(2, b"hello");
        assert_ne!(a, b);
    }

    #[test]
    fn checksum_depends_on_payload() {
        let a = checksum_of(1, b"hello");
        let b = checksum_of(1, b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn checksum_of_empty_payload_is_stable() {
        let a = checksum_of(0, b"");
        let b = checksum_of(0, b"");
        assert_eq!(a, b);
    }
}
