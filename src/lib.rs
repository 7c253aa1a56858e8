//! # mk-link
//!
//! Host-side serial link to a MikroKopter FlightCtrl.
//!
//! This crate lets a ground-station program request telemetry from a
//! FlightCtrl and receive it as typed records through registered callbacks.
//!
//! ## Architecture
//!
//! - **Transport**: byte-level serial port behind the [`transport::Transport`] trait
//! - **Protocol**: `#`-delimited frames with 6-bit data encoding and a 12-bit checksum
//! - **Codec**: analog labels, debug output and high-speed output records
//! - **Dispatch**: one callback slot per record type, driven by [`Connection::poll`]
//!
//! ## Example
//!
//! ```no_run
//! use mk_link::codec::{AnalogLabel, HighSpeedOutput};
//! use mk_link::Connection;
//!
//! fn main() -> mk_link::Result<()> {
//!     let mut conn: Connection = Connection::builder()
//!         .on_header(|label: &AnalogLabel| println!("{}: {}", label.index, label.text))
//!         .on_high_speed_output(|out: &HighSpeedOutput| println!("{:?}", out.analog))
//!         .open("/dev/ttyUSB0", 57600)?;
//!
//!     conn.send_header_request(true)?;
//!     conn.send_output_request(0)?;
//!     loop {
//!         conn.poll()?;
//!     }
//! }
//! ```

pub mod codec;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod transport;

mod connection;
mod stats;
mod writer;

pub use connection::{Connection, ConnectionBuilder, DEFAULT_SCRATCH_WINDOW};
pub use error::{MkError, Result};
pub use stats::LinkStats;
pub use writer::send_buffer;
