//! Analog label record, the FlightCtrl's reply to a debug header request.

use serde::Serialize;

use super::{check_len, Record};
use crate::error::Result;

/// Label text length on the wire (space padded).
pub const LABEL_TEXT_LEN: usize = 16;

/// Name of one debug output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalogLabel {
    /// Channel index the label belongs to.
    pub index: u8,
    /// Label text with padding removed.
    pub text: String,
}

impl AnalogLabel {
    pub fn new(index: u8, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

impl Record for AnalogLabel {
    const NAME: &'static str = "AnalogLabel";
    const SIZE: usize = 1 + LABEL_TEXT_LEN;

    fn decode(payload: &[u8]) -> Result<Self> {
        check_len::<Self>(payload)?;
        let raw = &payload[1..Self::SIZE];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let text = String::from_utf8_lossy(&raw[..end]).trim_end().to_string();
        Ok(Self {
            index: payload[0],
            text,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.push(self.index);
        out.extend(self.text.bytes().take(LABEL_TEXT_LEN));
        out.resize(Self::SIZE, b' ');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MkError;

    #[test]
    fn test_decode_trims_padding() {
        let mut payload = vec![4u8];
        payload.extend_from_slice(b"AccNick         ");
        payload.extend_from_slice(&[0, 0]);

        let label = AnalogLabel::decode(&payload).unwrap();
        assert_eq!(label, AnalogLabel::new(4, "AccNick"));
    }

    #[test]
    fn test_decode_stops_at_nul() {
        let mut payload = vec![1u8];
        payload.extend_from_slice(b"Gas\0garbage.....");

        let label = AnalogLabel::decode(&payload).unwrap();
        assert_eq!(label.text, "Gas");
    }

    #[test]
    fn test_decode_too_short() {
        let err = AnalogLabel::decode(b"\x01short").unwrap_err();
        assert!(matches!(
            err,
            MkError::Payload {
                record: "AnalogLabel",
                expected: 17,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_encode_pads_and_truncates() {
        let encoded = AnalogLabel::new(2, "Voltage").encode();
        assert_eq!(encoded.len(), AnalogLabel::SIZE);
        assert_eq!(&encoded[1..8], b"Voltage");
        assert!(encoded[8..].iter().all(|&b| b == b' '));

        let long = AnalogLabel::new(3, "a label that is far too long").encode();
        assert_eq!(long.len(), AnalogLabel::SIZE);
    }
}
