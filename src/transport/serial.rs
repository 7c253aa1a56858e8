//! `serialport`-backed transport.
//!
//! The port is opened with a short timeout and polled by first asking how
//! many bytes are waiting, so `poll` never blocks on an idle line.

use std::io::{self, Read, Write};

use serde::Serialize;
use serialport::{SerialPort, SerialPortType};

use super::{SerialConfig, Transport};
use crate::error::Result;

/// A physical serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Name the port was opened with, if the driver reports it.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialTransport {
    fn open(config: &SerialConfig) -> io::Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(config.serialport_data_bits())
            .stop_bits(config.serialport_stop_bits())
            .parity(config.parity.into())
            .timeout(config.timeout())
            .open()?;
        Ok(Self { port })
    }

    fn poll(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = available.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port.name())
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

/// Information about an available serial port
#[derive(Clone, Debug, Serialize)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// Enumerate serial ports the system knows about.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(io::Error::from)?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                SerialPortType::UsbPort(info) => (
                    "USB".to_string(),
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                SerialPortType::BluetoothPort => {
                    ("Bluetooth".to_string(), None, None, None, None, None)
                }
                SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None, None),
                SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None, None),
            };
            PortInfo {
                port_name: p.port_name,
                port_type,
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect())
}
