//! Decoded frame types.
//!
//! A [`Message`] borrows its payload from the connection's decode buffer, so
//! it cannot outlive the dispatch call that produced it.
//!
//! # Example
//!
//! ```
//! use mk_link::protocol::{address, build_frame, FrameHeader, Message};
//!
//! let header = FrameHeader::new(b'D', address::FC);
//! let payload = [0u8; 6];
//! let msg = Message::new(header, &payload);
//!
//! assert!(msg.is_from_flight_ctrl());
//! assert_eq!(msg.payload().len(), 6);
//!
//! let bytes = build_frame(b'd', address::FC, Some(&[10]));
//! assert_eq!(bytes[0], b'#');
//! ```

use super::wire_format::{
    address, checksum, encode_data, frame_len, ADDRESS_OFFSET, END_BYTE, START_BYTE,
};

/// Command and source address of a completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Command identifier (opcode).
    pub command: u8,
    /// Device address, offset removed.
    pub address: u8,
}

impl FrameHeader {
    pub fn new(command: u8, address: u8) -> Self {
        Self { command, address }
    }
}

/// A decoded message with a borrowed payload view.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Decoded header.
    pub header: FrameHeader,
    payload: &'a [u8],
}

impl<'a> Message<'a> {
    pub fn new(header: FrameHeader, payload: &'a [u8]) -> Self {
        Self { header, payload }
    }

    /// Get the command identifier.
    #[inline]
    pub fn command(&self) -> u8 {
        self.header.command
    }

    /// Get the source address.
    #[inline]
    pub fn address(&self) -> u8 {
        self.header.address
    }

    /// Get the decoded payload.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Check if the message originates from the FlightCtrl.
    #[inline]
    pub fn is_from_flight_ctrl(&self) -> bool {
        self.header.address == address::FC
    }
}

/// Build a complete frame as a single byte vector.
///
/// Allocates; the connection encodes into its own scratch buffer instead.
/// Handy for tests and simulated devices.
pub fn build_frame(command: u8, address: u8, payload: Option<&[u8]>) -> Vec<u8> {
    let data = payload.unwrap_or(&[]);
    let mut buf = Vec::with_capacity(frame_len(data.len()));
    buf.extend_from_slice(&[START_BYTE, ADDRESS_OFFSET.wrapping_add(address), command]);
    encode_data(data, &mut buf);
    let crc = checksum(&buf);
    buf.extend_from_slice(&crc);
    buf.push(END_BYTE);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_accessors() {
        let payload = b"abc";
        let msg = Message::new(FrameHeader::new(b'A', address::NC), payload);

        assert_eq!(msg.command(), b'A');
        assert_eq!(msg.address(), address::NC);
        assert_eq!(msg.payload(), b"abc");
        assert!(!msg.is_from_flight_ctrl());
    }

    #[test]
    fn test_build_frame_without_payload() {
        let bytes = build_frame(b'i', address::FC, None);

        assert_eq!(bytes.len(), frame_len(0));
        assert_eq!(&bytes[..3], &[b'#', b'b', b'i']);
        assert_eq!(*bytes.last().unwrap(), b'\r');
        assert_eq!(&bytes[3..5], &checksum(&bytes[..3]));
    }

    #[test]
    fn test_build_frame_with_payload() {
        let bytes = build_frame(b'd', address::FC, Some(&[50]));

        assert_eq!(bytes.len(), frame_len(1));
        let data_end = bytes.len() - 3;
        assert_eq!(&bytes[data_end..data_end + 2], &checksum(&bytes[..data_end]));
    }

    #[test]
    fn test_build_frame_high_address_matches_assembler() {
        use crate::protocol::{Buffer, FrameAssembler, MkAssembler};

        let mut tx = Buffer::new();
        MkAssembler::new()
            .encode(&mut tx, b'D', 200, Some(&[7]))
            .unwrap();

        let bytes = build_frame(b'D', 200, Some(&[7]));

        assert_eq!(bytes[1], b'a'.wrapping_add(200));
        assert_eq!(bytes, tx.as_slice());
    }
}
