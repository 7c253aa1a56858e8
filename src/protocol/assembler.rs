//! Frame assembler: byte-at-a-time collection, encoding and decoding.
//!
//! [`FrameAssembler`] is the seam between the connection and the byte-level
//! codec. [`MkAssembler`] implements the MikroKopter format with a two-state
//! machine:
//! - `Idle`: bytes are discarded until a start byte arrives
//! - `Collecting`: bytes are appended until the end byte, then the checksum
//!   decides whether the frame is complete
//!
//! A start byte always restarts collection, so a truncated frame is dropped
//! as soon as the next one begins.
//!
//! # Example
//!
//! ```
//! use mk_link::protocol::{address, build_frame, Buffer, FrameAssembler, MkAssembler};
//!
//! let mut assembler = MkAssembler::new();
//! let mut rx = Buffer::new();
//!
//! let bytes = build_frame(b'D', address::FC, Some(&[1, 2, 3]));
//! let complete: Vec<bool> = bytes.iter().map(|&b| assembler.accumulate(&mut rx, b)).collect();
//!
//! assert_eq!(complete.iter().filter(|&&c| c).count(), 1);
//! assert_eq!(assembler.decode_header(&rx).unwrap().command, b'D');
//! ```

use bytes::BytesMut;

use super::buffer::Buffer;
use super::frame::FrameHeader;
use super::wire_format::{
    checksum, decode_data, encode_data, frame_len, ADDRESS_OFFSET, CHECKSUM_SIZE, END_BYTE,
    FRAME_PREFIX_SIZE, MIN_FRAME_SIZE, START_BYTE,
};
use crate::error::{MkError, Result};

/// Byte-level codec consumed by the connection.
///
/// The receive buffer is owned by the caller and handed in on every call;
/// the assembler only keeps its collection state.
pub trait FrameAssembler {
    /// Clear `tx` and write a ready-to-send frame into it.
    ///
    /// `payload` of `None` sends no data section.
    fn encode(
        &mut self,
        tx: &mut Buffer,
        command: u8,
        address: u8,
        payload: Option<&[u8]>,
    ) -> Result<()>;

    /// Feed one received byte. Returns `true` when `rx` holds a complete,
    /// valid frame that has not been decoded yet.
    fn accumulate(&mut self, rx: &mut Buffer, byte: u8) -> bool;

    /// Decode command and address of the complete frame in `rx`.
    fn decode_header(&self, rx: &Buffer) -> Result<FrameHeader>;

    /// Decode the data section of the complete frame in `rx` into `out`.
    fn decode_data(&self, rx: &Buffer, out: &mut BytesMut) -> Result<()>;

    /// Reset collection state and empty `rx`.
    fn clear(&mut self, rx: &mut Buffer);

    /// Frames discarded so far (bad checksum, overflow, malformed).
    fn rejected_frames(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
}

/// MikroKopter serial frame assembler.
#[derive(Debug)]
pub struct MkAssembler {
    state: State,
    checksum_errors: u64,
    overflows: u64,
}

impl MkAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            checksum_errors: 0,
            overflows: 0,
        }
    }

    /// Frames dropped because their checksum did not match.
    pub fn checksum_errors(&self) -> u64 {
        self.checksum_errors
    }

    /// Frames dropped because they outgrew the receive buffer.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Check the collected frame (end byte excluded) against its checksum.
    fn is_valid(frame: &[u8]) -> bool {
        if frame.len() < MIN_FRAME_SIZE {
            return false;
        }
        let (body, crc) = frame.split_at(frame.len() - CHECKSUM_SIZE);
        checksum(body) == crc
    }

    fn complete_frame(rx: &Buffer) -> Result<&[u8]> {
        let frame = rx.as_slice();
        if frame.len() < MIN_FRAME_SIZE || frame[0] != START_BYTE {
            return Err(MkError::Protocol(format!(
                "No complete frame in receive buffer ({} bytes)",
                frame.len()
            )));
        }
        Ok(frame)
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "Idle",
            State::Collecting => "Collecting",
        }
    }
}

impl Default for MkAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler for MkAssembler {
    fn encode(
        &mut self,
        tx: &mut Buffer,
        command: u8,
        address: u8,
        payload: Option<&[u8]>,
    ) -> Result<()> {
        let data = payload.unwrap_or(&[]);
        let size = frame_len(data.len());
        tx.clear();
        if size > tx.capacity() {
            return Err(MkError::FrameTooLarge {
                size,
                capacity: tx.capacity(),
            });
        }

        // Size was checked above, so none of these writes can be refused.
        tx.extend_from_slice(&[START_BYTE, ADDRESS_OFFSET.wrapping_add(address), command]);
        encode_data(data, tx);
        let crc = checksum(tx.as_slice());
        tx.extend_from_slice(&crc);
        tx.push(END_BYTE);
        Ok(())
    }

    fn accumulate(&mut self, rx: &mut Buffer, byte: u8) -> bool {
        if byte == START_BYTE {
            if self.state == State::Collecting {
                tracing::trace!("Frame restarted after {} bytes", rx.len());
            }
            rx.clear();
            rx.push(byte);
            self.state = State::Collecting;
            return false;
        }

        match self.state {
            State::Idle => false,
            State::Collecting if byte == END_BYTE => {
                self.state = State::Idle;
                if Self::is_valid(rx.as_slice()) {
                    return true;
                }
                tracing::debug!("Dropping frame with bad checksum ({} bytes)", rx.len());
                self.checksum_errors += 1;
                rx.clear();
                false
            }
            State::Collecting => {
                if !rx.push(byte) {
                    tracing::warn!(
                        "Receive buffer full at {} bytes, dropping frame",
                        rx.capacity()
                    );
                    self.overflows += 1;
                    self.state = State::Idle;
                    rx.clear();
                }
                false
            }
        }
    }

    fn decode_header(&self, rx: &Buffer) -> Result<FrameHeader> {
        let frame = Self::complete_frame(rx)?;
        Ok(FrameHeader::new(
            frame[2],
            frame[1].wrapping_sub(ADDRESS_OFFSET),
        ))
    }

    fn decode_data(&self, rx: &Buffer, out: &mut BytesMut) -> Result<()> {
        let frame = Self::complete_frame(rx)?;
        out.clear();
        decode_data(&frame[FRAME_PREFIX_SIZE..frame.len() - CHECKSUM_SIZE], out)
    }

    fn clear(&mut self, rx: &mut Buffer) {
        self.state = State::Idle;
        rx.clear();
    }

    fn rejected_frames(&self) -> u64 {
        self.checksum_errors + self.overflows
    }
}
