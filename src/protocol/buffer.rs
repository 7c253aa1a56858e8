//! Fixed-capacity scratch buffer.
//!
//! Backed by a single `bytes::BytesMut` allocated once; `len()` never exceeds
//! `capacity()`. Writes that would overflow are refused rather than grown.

use bytes::BytesMut;

use super::wire_format::BUFFER_CAPACITY;

/// Capacity-bounded byte region reused across frames.
#[derive(Debug)]
pub struct Buffer {
    data: BytesMut,
    capacity: usize,
}

impl Buffer {
    /// Create a buffer with the default 4096 byte capacity.
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_CAPACITY)
    }

    /// Create a buffer with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one byte. Returns `false` (and writes nothing) when full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        if self.data.len() >= self.capacity {
            return false;
        }
        self.data.extend_from_slice(&[byte]);
        true
    }

    /// Append a slice. Returns `false` (and writes nothing) if it does not fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.data.extend_from_slice(bytes);
        true
    }

    /// Drop the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still available before the buffer is full.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes past capacity are dropped; check `remaining()` first.
impl Extend<u8> for Buffer {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for byte in iter {
            if !self.push(byte) {
                break;
            }
        }
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let buffer = Buffer::new();
        assert_eq!(buffer.capacity(), 4096);
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 4096);
    }

    #[test]
    fn test_push_refuses_past_capacity() {
        let mut buffer = Buffer::with_capacity(2);
        assert!(buffer.push(1));
        assert!(buffer.push(2));
        assert!(!buffer.push(3));
        assert_eq!(buffer.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut buffer = Buffer::with_capacity(4);
        assert!(buffer.extend_from_slice(b"abc"));
        assert!(!buffer.extend_from_slice(b"de"));
        assert_eq!(buffer.as_slice(), b"abc");
        assert!(buffer.extend_from_slice(b"d"));
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_extend_trait_stops_at_capacity() {
        let mut buffer = Buffer::with_capacity(3);
        buffer.extend([1u8, 2, 3, 4, 5]);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.extend_from_slice(b"frame");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 8);
        assert!(buffer.extend_from_slice(b"12345678"));
    }
}
