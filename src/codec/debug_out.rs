//! Debug output record.

use serde::Serialize;

use super::{check_len, read_i16_array, Record};
use crate::error::Result;

/// Analog channels in a debug output record.
pub const DEBUG_ANALOG_CHANNELS: usize = 32;

/// Periodic debug telemetry: two status bytes and 32 signed channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugOutput {
    pub status: [u8; 2],
    pub analog: [i16; DEBUG_ANALOG_CHANNELS],
}

impl DebugOutput {
    /// Value of a channel by index, `None` if out of range.
    pub fn channel(&self, index: usize) -> Option<i16> {
        self.analog.get(index).copied()
    }
}

impl Default for DebugOutput {
    fn default() -> Self {
        Self {
            status: [0; 2],
            analog: [0; DEBUG_ANALOG_CHANNELS],
        }
    }
}

impl Record for DebugOutput {
    const NAME: &'static str = "DebugOutput";
    const SIZE: usize = 2 + DEBUG_ANALOG_CHANNELS * 2;

    fn decode(payload: &[u8]) -> Result<Self> {
        check_len::<Self>(payload)?;
        Ok(Self {
            status: [payload[0], payload[1]],
            analog: read_i16_array(payload, 2),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.status);
        for value in &self.analog {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}
