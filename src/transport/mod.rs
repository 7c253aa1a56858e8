//! Transport module - byte-oriented access to one physical port.
//!
//! Provides:
//! - [`Transport`] - open/poll/write capability the connection drives
//! - [`SerialTransport`] - implementation on top of the `serialport` crate
//! - [`SerialConfig`] - port settings, deserializable from JSON
//! - [`list_ports`] - enumeration of candidate ports
//! - [`MemoryTransport`] - in-memory transport for tests and simulations

mod config;
mod memory;
mod serial;

use std::io;

pub use config::{Parity, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};
pub use memory::{MemoryHandle, MemoryTransport};
pub use serial::{list_ports, PortInfo, SerialTransport};

/// Byte transport for one port.
///
/// Implementations must not block in `poll` when nothing is pending.
pub trait Transport {
    /// Open the port described by `config`.
    fn open(config: &SerialConfig) -> io::Result<Self>
    where
        Self: Sized;

    /// Read whatever is pending into `buf`, returning 0 when nothing is.
    fn poll(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write some prefix of `data`, returning how many bytes were taken.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush buffered output to the wire.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
