//! Layout constants shared by every ring variant.

/// Size in bytes of one padded sequence cell (one cache line).
pub const CELL_SIZE: usize = 64;

/// Byte offset of the live `u64` sequence within its cell.
///
/// Positioned mid-line (24 B pad, 8 B value, 32 B pad) so the hot word does
/// not share a prefetch boundary with either neighboring cell.
pub const CELL_SEQUENCE_OFFSET: usize = 24;

/// Magic identifying a file produced by this crate, checked on open.
pub const MAGIC: u64 = 0x52494e474d4d4150; // "RINGMMAP"

/// Sentinel written into a broadcast consumer's cell to disable it, taking
/// that consumer out of the producer's `min()` gating computation.
pub const DISABLED_CONSUMER: i64 = i64::MAX;

/// Seed used for the XXH64 per-message checksum.
pub const CHECKSUM_SEED: u64 = 7;

/// Number of leading bytes reserved for the checksum in a checksummed slot.
pub const CHECKSUM_SIZE: usize = 8;

/// Ceiling on the total size of a backing region.
pub const MAX_REGION_SIZE: u64 = 1u64 << 62;
