//! Codec module - fixed-layout telemetry records.
//!
//! Decoded frame payloads are plain byte blocks. Each record type validates
//! the payload length before reading any field, so a short or truncated
//! payload becomes an error instead of garbage values:
//!
//! - [`AnalogLabel`] - reply to a debug header request
//! - [`DebugOutput`] - periodic debug telemetry
//! - [`HighSpeedOutput`] - continuous high-rate telemetry
//!
//! Decoded payloads may carry up to two trailing padding bytes from the 3→4
//! data encoding, so records accept payloads longer than their size.
//!
//! # Example
//!
//! ```
//! use mk_link::codec::{DebugOutput, Record};
//!
//! let mut payload = vec![0u8; DebugOutput::SIZE];
//! payload[2..4].copy_from_slice(&(-120i16).to_le_bytes());
//!
//! let record = DebugOutput::decode(&payload).unwrap();
//! assert_eq!(record.analog[0], -120);
//! ```

mod debug_out;
mod high_speed;
mod label;

pub use debug_out::{DebugOutput, DEBUG_ANALOG_CHANNELS};
pub use high_speed::{HighSpeedOutput, HIGH_SPEED_CHANNELS};
pub use label::{AnalogLabel, LABEL_TEXT_LEN};

use crate::error::{MkError, Result};

/// A record with a fixed little-endian layout.
pub trait Record: Sized {
    /// Name used in error reports.
    const NAME: &'static str;
    /// Minimum payload length in bytes.
    const SIZE: usize;

    /// Decode from a payload, failing if it is shorter than `SIZE`.
    fn decode(payload: &[u8]) -> Result<Self>;

    /// Encode to exactly `SIZE` bytes.
    fn encode(&self) -> Vec<u8>;
}

/// Fail with a `Payload` error unless `payload` holds at least `R::SIZE` bytes.
pub(crate) fn check_len<R: Record>(payload: &[u8]) -> Result<()> {
    if payload.len() < R::SIZE {
        return Err(MkError::Payload {
            record: R::NAME,
            expected: R::SIZE,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Read `N` little-endian i16 values starting at `offset`.
pub(crate) fn read_i16_array<const N: usize>(payload: &[u8], offset: usize) -> [i16; N] {
    let mut values = [0i16; N];
    for (i, value) in values.iter_mut().enumerate() {
        let at = offset + i * 2;
        *value = i16::from_le_bytes([payload[at], payload[at + 1]]);
    }
    values
}
