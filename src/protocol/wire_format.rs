//! Wire format encoding and decoding.
//!
//! Implements the MikroKopter serial frame:
//! ```text
//! ┌─────┬──────────┬─────────┬───────────────┬──────┬──────┬──────┐
//! │ '#' │ 'a'+addr │ command │ encoded data  │ crc1 │ crc2 │ '\r' │
//! │ 1   │ 1        │ 1       │ 4 per 3 bytes │ 1    │ 1    │ 1    │
//! └─────┴──────────┴─────────┴───────────────┴──────┴──────┴──────┘
//! ```
//!
//! Data bytes are packed 3 → 4 characters, six bits each, offset by `'='`.
//! Every character after the start byte therefore stays within `'='..='|'`
//! or the lowercase/uppercase command range, so `'#'` and `'\r'` only ever
//! appear as delimiters.

use crate::error::{MkError, Result};

/// Frame start delimiter.
pub const START_BYTE: u8 = b'#';

/// Frame end delimiter.
pub const END_BYTE: u8 = b'\r';

/// Offset added to the device address on the wire.
pub const ADDRESS_OFFSET: u8 = b'a';

/// Offset added to every 6-bit group (data and checksum).
pub const ENCODING_OFFSET: u8 = b'=';

/// Bytes in front of the encoded data: start, address, command.
pub const FRAME_PREFIX_SIZE: usize = 3;

/// Checksum characters after the encoded data.
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest complete frame without its end byte (no data).
pub const MIN_FRAME_SIZE: usize = FRAME_PREFIX_SIZE + CHECKSUM_SIZE;

/// Capacity of the transmit and receive scratch buffers.
pub const BUFFER_CAPACITY: usize = 4096;

/// Checksum modulus.
const CHECKSUM_MODULUS: u16 = 4096;

/// Device addresses on the MikroKopter bus.
pub mod address {
    /// FlightCtrl.
    pub const FC: u8 = 1;
    /// NaviCtrl.
    pub const NC: u8 = 2;
    /// MK3Mag compass.
    pub const MK3MAG: u8 = 3;
    /// Brushless motor controllers.
    pub const BL_CTRL: u8 = 5;
}

/// Commands the host sends to the FlightCtrl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxCommand {
    /// Request an analog label (debug header).
    DebugHeader = b'a',
    /// Subscribe to debug output at an interval.
    DebugOutput = b'd',
    /// Request a high-speed header.
    HighSpeedHeader = b'o',
    /// Subscribe to continuous high-speed output.
    HighSpeedOutput = b'i',
}

impl TxCommand {
    /// Opcode byte on the wire.
    #[inline]
    pub fn opcode(self) -> u8 {
        self as u8
    }
}

/// Commands the FlightCtrl sends to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RxCommand {
    Header = b'A',
    DebugOutput = b'D',
    HighSpeedOutput = b'I',
}

impl RxCommand {
    /// Map an opcode to a known command, `None` if unrecognized.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            b'A' => Some(Self::Header),
            b'D' => Some(Self::DebugOutput),
            b'I' => Some(Self::HighSpeedOutput),
            _ => None,
        }
    }

    /// Opcode byte on the wire.
    #[inline]
    pub fn opcode(self) -> u8 {
        self as u8
    }
}

/// Number of characters `len` data bytes occupy once encoded.
#[inline]
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Total frame size (end byte included) for a payload of `len` bytes.
#[inline]
pub fn frame_len(len: usize) -> usize {
    MIN_FRAME_SIZE + encoded_len(len) + 1
}

/// Compute the two checksum characters over `data`.
///
/// `data` runs from the start byte through the last encoded data character.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let sum = data
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
        % CHECKSUM_MODULUS;
    [
        ENCODING_OFFSET + (sum / 64) as u8,
        ENCODING_OFFSET + (sum % 64) as u8,
    ]
}

/// Encode payload bytes into `out`, zero padding the final group.
pub fn encode_data(data: &[u8], out: &mut impl Extend<u8>) {
    for chunk in data.chunks(3) {
        let a = chunk[0];
        let b = chunk.get(1).copied().unwrap_or(0);
        let c = chunk.get(2).copied().unwrap_or(0);
        out.extend([
            ENCODING_OFFSET + (a >> 2),
            ENCODING_OFFSET + (((a & 0x03) << 4) | ((b & 0xf0) >> 4)),
            ENCODING_OFFSET + (((b & 0x0f) << 2) | ((c & 0xc0) >> 6)),
            ENCODING_OFFSET + (c & 0x3f),
        ]);
    }
}

/// Decode encoded characters into `out`.
///
/// Produces three bytes per complete group of four; a trailing partial group
/// is ignored. Fails if a character is below the encoding offset or carries
/// more than six bits.
pub fn decode_data(encoded: &[u8], out: &mut impl Extend<u8>) -> Result<()> {
    for group in encoded.chunks_exact(4) {
        let mut sextets = [0u8; 4];
        for (slot, &ch) in sextets.iter_mut().zip(group) {
            let value = ch.wrapping_sub(ENCODING_OFFSET);
            if ch < ENCODING_OFFSET || value > 0x3f {
                return Err(MkError::Protocol(format!(
                    "Invalid data character 0x{:02x}",
                    ch
                )));
            }
            *slot = value;
        }
        let [a, b, c, d] = sextets;
        out.extend([
            (a << 2) | (b >> 4),
            ((b & 0x0f) << 4) | (c >> 2),
            ((c & 0x03) << 6) | d,
        ]);
    }
    Ok(())
}
