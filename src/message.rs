//! Serialization contract.
//!
//! Every message type used with a ring defines its own byte layout. The
//! ring only ever calls `write`/`read` against a plain `&mut [u8]`/`&[u8]`
//! view of a slot; ordering against the sequence-number publish is provided
//! entirely by the ring, not by this trait.

/// A message that can serialize itself into, and deserialize itself from, a
/// fixed-size slot.
///
/// Implementations must be deterministic: writing a value then reading it
/// back from the same bytes must reproduce the original logical value.
///
/// `Send` is required because a pool-managed instance routinely crosses the
/// thread boundary between the code that claims a slot and the code that
/// later flushes it.
pub trait RingMessage: Sized + Send {
    /// Upper bound on the number of bytes `write` will ever produce.
    ///
    /// This is a compile- or config-time constant for a given message type
    /// and determines the ring's `slot_size` (together with any checksum
    /// prefix).
    fn max_size() -> usize;

    /// Serialize `self` into `dst`, returning the number of bytes written.
    ///
    /// `dst.len() >= Self::max_size()` is guaranteed by callers. Writes are
    /// plain memory operations; the ring supplies the happens-before edge.
    fn write(&self, dst: &mut [u8]) -> usize;

    /// Deserialize a value from `src`, returning it along with the number of
    /// bytes consumed.
    ///
    /// `src.len() >= Self::max_size()` is guaranteed by callers.
    fn read(src: &[u8]) -> (Self, usize);
}

/// A `RingMessage` implementation for raw byte payloads up to `N` bytes,
/// length-prefixed with a 4-byte little-endian count.
///
/// Useful for callers who do not want to define a dedicated message type:
/// stores a length-prefixed byte payload inside a fixed-size slot.
#[derive(Debug, Clone)]
pub struct BytesMessage<const N: usize> {
    len: usize,
    data: [u8; N],
}

impl<const N: usize> BytesMessage<N> {
    /// Build a message from a byte slice, truncating to `N` bytes if needed.
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        let mut data = [0u8; N];
        data[..len].copy_from_slice(&bytes[..len]);
        Self { len, data }
    }

    /// The payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl<const N: usize> Default for BytesMessage<N> {
    fn default() -> Self {
        Self { len: 0, data: [0u8; N] }
    }
}

impl<const N: usize> RingMessage for BytesMessage<N> {
    fn max_size() -> usize {
        4 + N
    }

    fn write(&self, dst: &mut [u8]) -> usize {
        dst[0..4].copy_from_slice(&(self.len as u32).to_le_bytes());
        dst[4..4 + self.len].copy_from_slice(&self.data[..self.len]);
        4 + self.len
    }

    fn read(src: &[u8]) -> (Self, usize) {
        let len = u32::from_le_bytes(src[0..4].try_into().unwrap()) as usize;
        let mut data = [0u8; N];
        data[..len].copy_from_slice(&src[4..4 + len]);
        (Self { len, data }, 4 + len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_payload() {
        let msg = BytesMessage::<64>::new(b"hello ring");
        let mut buf = [0u8; 68];
        let written = msg.write(&mut buf);
        let (decoded, read) = BytesMessage::<64>::read(&buf);
        assert_eq!(written, read);
        assert_eq!(decoded.as_slice(), b"hello ring");
    }

    #[test]
    fn truncates_oversized_payload() {
        let msg = BytesMessage::<4>::new(b"too long");
        assert_eq!(msg.as_slice(), b"too ");
    }

    #[test]
    fn max_size_accounts_for_length_prefix() {
        assert_eq!(BytesMessage::<128>::max_size(), 132);
    }
}
