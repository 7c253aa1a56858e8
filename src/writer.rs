//! Blocking frame writer.
//!
//! Pushes a complete frame through a [`Transport`], looping over partial
//! writes until every byte is taken. A transport that accepts nothing, or
//! fails with anything other than `Interrupted`, ends the send with
//! [`MkError::Write`]; there are no internal retries beyond that.

use std::io;

use crate::error::{MkError, Result};
use crate::transport::Transport;

/// Write the whole of `frame` and flush.
///
/// Returns the number of bytes written, always `frame.len()` on success.
pub fn send_buffer<T: Transport + ?Sized>(transport: &mut T, frame: &[u8]) -> Result<usize> {
    let mut remaining = frame;

    while !remaining.is_empty() {
        match transport.write(remaining) {
            Ok(0) => {
                return Err(MkError::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "transport accepted 0 bytes with {} of {} pending",
                        remaining.len(),
                        frame.len()
                    ),
                )));
            }
            Ok(n) => remaining = &remaining[n.min(remaining.len())..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(MkError::Write(e)),
        }
    }

    transport.flush().map_err(MkError::Write)?;
    Ok(frame.len())
}
