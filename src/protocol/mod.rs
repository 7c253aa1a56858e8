//! Protocol module - wire format, frame assembly, and scratch buffers.
//!
//! This module implements the MikroKopter serial framing:
//! - Start/address/command prefix, 6-bit data encoding, 12-bit checksum
//! - Byte-at-a-time frame assembler behind the [`FrameAssembler`] trait
//! - Fixed-capacity [`Buffer`] for transmit and receive scratch space
//! - Wrapping [`HeaderLabels`] for header requests

mod assembler;
mod buffer;
mod frame;
mod header_label;
mod wire_format;

pub use assembler::{FrameAssembler, MkAssembler};
pub use buffer::Buffer;
pub use frame::{build_frame, FrameHeader, Message};
pub use header_label::{HeaderLabels, DEBUG_LABEL_PERIOD, HIGH_SPEED_LABEL_PERIOD};
pub use wire_format::{
    address, checksum, decode_data, encode_data, encoded_len, frame_len, RxCommand, TxCommand,
    ADDRESS_OFFSET, BUFFER_CAPACITY, CHECKSUM_SIZE, ENCODING_OFFSET, END_BYTE, FRAME_PREFIX_SIZE,
    MIN_FRAME_SIZE, START_BYTE,
};
