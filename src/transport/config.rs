//! Serial port configuration.
//!
//! Deserializable from JSON; missing fields take the 57600 8N1 defaults:
//!
//! ```
//! use mk_link::transport::{Parity, SerialConfig};
//!
//! let config = SerialConfig::from_json(r#"{ "port": "/dev/ttyUSB0", "parity": "even" }"#).unwrap();
//! assert_eq!(config.baud_rate, 57600);
//! assert_eq!(config.parity, Parity::Even);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, StopBits};

use crate::error::Result;

/// Default FlightCtrl debug port speed.
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Default read/write timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10;

/// Parity setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for SpParity {
    fn from(p: Parity) -> Self {
        match p {
            Parity::None => SpParity::None,
            Parity::Odd => SpParity::Odd,
            Parity::Even => SpParity::Even,
        }
    }
}

/// Serial port settings for one link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    /// Port timeout; reads never wait longer than this.
    pub timeout_ms: u64,
}

impl SerialConfig {
    /// 8N1 settings for `port` at `baud_rate`.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Data bits as the serialport type; anything unknown means eight.
    pub fn serialport_data_bits(&self) -> DataBits {
        match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        }
    }

    /// Stop bits as the serialport type; anything but two means one.
    pub fn serialport_stop_bits(&self) -> StopBits {
        match self.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
