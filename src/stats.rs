//! Link statistics.

use serde::Serialize;

/// Counters for one open link. Reset on every open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Bytes read from the transport.
    pub bytes_read: u64,
    /// Bytes written to the transport.
    pub bytes_written: u64,
    /// Frames the assembler reported complete.
    pub frames_received: u64,
    /// Frames dropped by the assembler (checksum, overflow).
    pub frames_rejected: u64,
    /// Complete frames whose header or data would not decode.
    pub malformed_frames: u64,
    /// Records delivered to a handler.
    pub messages_dispatched: u64,
    /// Recognized messages with no handler registered.
    pub messages_unhandled: u64,
    /// Messages from a device other than the FlightCtrl.
    pub unroutable_messages: u64,
    /// FlightCtrl messages with an unknown command.
    pub unknown_commands: u64,
    /// Payloads too short for their record.
    pub malformed_payloads: u64,
}

impl LinkStats {
    /// Messages dropped for any reason after a frame completed.
    pub fn messages_dropped(&self) -> u64 {
        self.malformed_frames
            + self.messages_unhandled
            + self.unroutable_messages
            + self.unknown_commands
            + self.malformed_payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_dropped_sums_drop_counters() {
        let stats = LinkStats {
            frames_received: 10,
            messages_dispatched: 4,
            malformed_frames: 1,
            messages_unhandled: 2,
            unroutable_messages: 1,
            unknown_commands: 1,
            malformed_payloads: 1,
            ..LinkStats::default()
        };

        assert_eq!(stats.messages_dropped(), 6);
        assert_eq!(
            stats.messages_dispatched + stats.messages_dropped(),
            stats.frames_received
        );
    }
}
