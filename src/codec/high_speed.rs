//! High-speed output record.

use serde::Serialize;

use super::{check_len, read_i16_array, Record};
use crate::error::Result;

/// Channels carried by a high-speed output record.
pub const HIGH_SPEED_CHANNELS: usize = 8;

/// Continuous high-rate telemetry: eight signed channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighSpeedOutput {
    pub analog: [i16; HIGH_SPEED_CHANNELS],
}

impl HighSpeedOutput {
    pub fn new(analog: [i16; HIGH_SPEED_CHANNELS]) -> Self {
        Self { analog }
    }
}

impl Record for HighSpeedOutput {
    const NAME: &'static str = "HighSpeedOutput";
    const SIZE: usize = HIGH_SPEED_CHANNELS * 2;

    fn decode(payload: &[u8]) -> Result<Self> {
        check_len::<Self>(payload)?;
        Ok(Self {
            analog: read_i16_array(payload, 0),
        })
    }

    fn encode(&self) -> Vec<u8> {
        self.analog.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_channels() {
        let record = HighSpeedOutput::new([1, -2, 3, -4, 500, -600, i16::MAX, i16::MIN]);
        let mut payload = record.encode();
        assert_eq!(payload.len(), 16);
        // 16 bytes travel as 6 groups, two padding bytes come back
        payload.extend_from_slice(&[0, 0]);

        assert_eq!(HighSpeedOutput::decode(&payload).unwrap(), record);
    }

    #[test]
    fn test_decode_too_short() {
        let err = HighSpeedOutput::decode(&[0u8; 15]).unwrap_err();
        assert!(err.to_string().starts_with("HighSpeedOutput payload needs 16 bytes"));
    }
}
