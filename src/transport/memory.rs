//! In-memory transport for tests and simulations.
//!
//! A [`MemoryTransport`] and its [`MemoryHandle`] share one state: the handle
//! queues bytes for the connection to read and inspects what it wrote.
//!
//! ```
//! use mk_link::transport::{MemoryTransport, Transport};
//!
//! let (mut transport, handle) = MemoryTransport::pair();
//! handle.push_inbound(b"#bA");
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(transport.poll(&mut buf).unwrap(), 3);
//! assert_eq!(transport.poll(&mut buf).unwrap(), 0);
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{SerialConfig, Transport};

#[derive(Debug, Default)]
struct Shared {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    max_write: Option<usize>,
    fail_writes: bool,
    polls: usize,
}

/// Transport half, handed to the connection.
#[derive(Debug)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

/// Test half, kept by the caller.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryTransport {
    /// Create a connected transport/handle pair.
    pub fn pair() -> (Self, MemoryHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: shared.clone(),
            },
            MemoryHandle { shared },
        )
    }
}

impl Transport for MemoryTransport {
    /// Memory transports have no port to open; attach one instead.
    fn open(config: &SerialConfig) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no memory transport registered for {}", config.port),
        ))
    }

    fn poll(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut shared = lock(&self.shared);
        shared.polls += 1;
        let n = buf.len().min(shared.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(shared.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut shared = lock(&self.shared);
        if shared.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port unplugged"));
        }
        let n = data.len().min(shared.max_write.unwrap_or(usize::MAX));
        shared.written.extend_from_slice(&data[..n]);
        Ok(n)
    }
}

impl MemoryHandle {
    /// Queue bytes for the connection to read.
    pub fn push_inbound(&self, bytes: &[u8]) {
        lock(&self.shared).inbound.extend(bytes.iter().copied());
    }

    /// Bytes queued but not yet read.
    pub fn inbound_len(&self) -> usize {
        lock(&self.shared).inbound.len()
    }

    /// Everything written so far, leaving it in place.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.shared).written.clone()
    }

    /// Everything written so far, clearing the record.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.shared).written)
    }

    /// Accept at most `n` bytes per write call.
    pub fn limit_writes(&self, n: usize) {
        lock(&self.shared).max_write = Some(n);
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.shared).fail_writes = fail;
    }

    /// Number of `poll` calls the transport has served.
    pub fn polls(&self) -> usize {
        lock(&self.shared).polls
    }
}
