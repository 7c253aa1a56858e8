//! Error types for mk-link.

use thiserror::Error;

/// Main error type for all link operations.
#[derive(Debug, Error)]
pub enum MkError {
    /// The transport refused to open the port.
    #[error("Failed to open serial port {port} @ {baud_rate} baud: {source}")]
    Open {
        port: String,
        baud_rate: u32,
        #[source]
        source: std::io::Error,
    },

    /// Send or poll attempted before a successful open.
    #[error("Connection is not open")]
    NotOpen,

    /// The transport could not complete a frame write.
    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    /// I/O error while reading from or enumerating ports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while parsing configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoded frame does not fit the transmit buffer.
    #[error("Frame of {size} bytes exceeds buffer capacity {capacity}")]
    FrameTooLarge { size: usize, capacity: usize },

    /// Malformed frame (bad header, truncated data).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Decoded payload too short for the record it should hold.
    #[error("{record} payload needs {expected} bytes, got {actual}")]
    Payload {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Message from a device other than the FlightCtrl.
    #[error("Unhandled command '{}' from address #{address}", char::from(*command))]
    UnroutableMessage { address: u8, command: u8 },

    /// FlightCtrl message with an opcode this link does not know.
    #[error("Unhandled FlightCtrl command '{}'", char::from(*command))]
    UnknownCommand { command: u8 },
}

/// Result type alias using MkError.
pub type Result<T> = std::result::Result<T, MkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_names_port_and_rate() {
        let err = MkError::Open {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 57600,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/ttyUSB0"));
        assert!(msg.contains("57600"));
    }

    #[test]
    fn test_report_variants_render_command_as_char() {
        let err = MkError::UnroutableMessage {
            address: 2,
            command: b'V',
        };
        assert_eq!(err.to_string(), "Unhandled command 'V' from address #2");

        let err = MkError::UnknownCommand { command: b'Z' };
        assert_eq!(err.to_string(), "Unhandled FlightCtrl command 'Z'");
    }
}
