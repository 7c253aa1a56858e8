//! Connection builder and polling loop.
//!
//! The [`ConnectionBuilder`] provides a fluent API for registering handlers
//! and opening the link. The [`Connection`] owns everything one link needs:
//! 1. The transport (present only while open)
//! 2. Transmit, receive and decode scratch buffers
//! 3. Header label counters
//! 4. The callback registry
//!
//! All work happens on the caller's thread. [`Connection::poll`] drains what
//! the transport has buffered, dispatches every completed frame and returns;
//! the application calls it again from its own loop.
//!
//! # Example
//!
//! ```no_run
//! use mk_link::codec::DebugOutput;
//! use mk_link::Connection;
//!
//! fn main() -> mk_link::Result<()> {
//!     let mut conn: Connection = Connection::builder()
//!         .on_debug_output(|out: &DebugOutput| println!("{:?}", out.analog))
//!         .open("/dev/ttyUSB0", 57600)?;
//!
//!     conn.send_output_request(10)?;
//!     loop {
//!         conn.poll()?;
//!         std::thread::sleep(std::time::Duration::from_millis(10));
//!     }
//! }
//! ```

use bytes::BytesMut;

use crate::codec::{AnalogLabel, DebugOutput, HighSpeedOutput, Record};
use crate::error::{MkError, Result};
use crate::handler::{CallbackRegistry, Handler};
use crate::protocol::{
    address, Buffer, FrameAssembler, HeaderLabels, Message, MkAssembler, RxCommand, TxCommand,
    BUFFER_CAPACITY,
};
use crate::stats::LinkStats;
use crate::transport::{SerialConfig, SerialTransport, Transport};
use crate::writer::send_buffer;

/// Default size of the window each transport read fills.
pub const DEFAULT_SCRATCH_WINDOW: usize = 4096;

/// Builder for configuring and opening a connection.
pub struct ConnectionBuilder<A: FrameAssembler = MkAssembler> {
    assembler: A,
    callbacks: CallbackRegistry,
    scratch_window: usize,
}

impl ConnectionBuilder {
    /// Create a new builder with the MikroKopter assembler.
    pub fn new() -> Self {
        Self {
            assembler: MkAssembler::new(),
            callbacks: CallbackRegistry::new(),
            scratch_window: DEFAULT_SCRATCH_WINDOW,
        }
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: FrameAssembler> ConnectionBuilder<A> {
    /// Use a different frame assembler.
    pub fn assembler<B: FrameAssembler>(self, assembler: B) -> ConnectionBuilder<B> {
        ConnectionBuilder {
            assembler,
            callbacks: self.callbacks,
            scratch_window: self.scratch_window,
        }
    }

    /// Register the analog label (header) handler.
    pub fn on_header<H: Handler<AnalogLabel>>(mut self, handler: H) -> Self {
        self.callbacks.set_header(handler);
        self
    }

    /// Register the debug output handler.
    pub fn on_debug_output<H: Handler<DebugOutput>>(mut self, handler: H) -> Self {
        self.callbacks.set_debug_output(handler);
        self
    }

    /// Register the high-speed output handler.
    pub fn on_high_speed_output<H: Handler<HighSpeedOutput>>(mut self, handler: H) -> Self {
        self.callbacks.set_high_speed_output(handler);
        self
    }

    /// Set how many bytes each transport read may return.
    ///
    /// Poll keeps reading while a read fills the whole window.
    /// Default: 4096, minimum 1.
    pub fn scratch_window(mut self, size: usize) -> Self {
        self.scratch_window = size.max(1);
        self
    }

    /// Build an unopened connection.
    pub fn build<T: Transport>(self) -> Connection<T, A> {
        Connection {
            transport: None,
            port: None,
            assembler: self.assembler,
            tx: Buffer::with_capacity(BUFFER_CAPACITY),
            rx: Buffer::with_capacity(BUFFER_CAPACITY),
            decoded: BytesMut::with_capacity(BUFFER_CAPACITY),
            window: vec![0u8; self.scratch_window],
            labels: HeaderLabels::new(),
            callbacks: self.callbacks,
            stats: LinkStats::default(),
            rejected_at_open: 0,
        }
    }

    /// Build and open `port` at `baud_rate` with 8N1 settings.
    pub fn open<T: Transport>(self, port: &str, baud_rate: u32) -> Result<Connection<T, A>> {
        self.open_with_config(&SerialConfig::new(port, baud_rate))
    }

    /// Build and open with full port settings.
    pub fn open_with_config<T: Transport>(self, config: &SerialConfig) -> Result<Connection<T, A>> {
        let mut conn = self.build();
        conn.open_with_config(config)?;
        Ok(conn)
    }

    /// Build around an already opened transport.
    pub fn attach<T: Transport>(self, transport: T) -> Connection<T, A> {
        let mut conn = self.build();
        conn.attach(transport);
        conn
    }
}

/// A link to one FlightCtrl over one transport.
///
/// Every operation takes `&mut self`; sharing a connection across threads
/// needs an outer lock.
pub struct Connection<T: Transport = SerialTransport, A: FrameAssembler = MkAssembler> {
    /// Open transport, `None` while closed.
    transport: Option<T>,
    /// Port name of the last successful open.
    port: Option<String>,
    assembler: A,
    /// Transmit scratch buffer.
    tx: Buffer,
    /// Receive reassembly buffer.
    rx: Buffer,
    /// Decoded payload of the frame being dispatched.
    decoded: BytesMut,
    /// Read window filled by each transport poll.
    window: Vec<u8>,
    labels: HeaderLabels,
    callbacks: CallbackRegistry,
    stats: LinkStats,
    /// Assembler rejection count when the link was opened.
    rejected_at_open: u64,
}

impl Connection {
    /// Create a new connection builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }
}

impl<T: Transport> Connection<T, MkAssembler> {
    /// Create an unopened connection with default settings.
    pub fn new() -> Self {
        ConnectionBuilder::new().build()
    }
}

impl<T: Transport> Default for Connection<T, MkAssembler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport, A: FrameAssembler> Connection<T, A> {
    /// Open `port` at `baud_rate` with 8N1 settings.
    pub fn open(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        self.open_with_config(&SerialConfig::new(port, baud_rate))
    }

    /// Open (or reopen) the link with full port settings.
    ///
    /// Any previous transport is dropped first. On failure the connection
    /// stays closed.
    pub fn open_with_config(&mut self, config: &SerialConfig) -> Result<()> {
        self.close();

        match T::open(config) {
            Ok(transport) => {
                self.install(transport);
                self.port = Some(config.port.clone());
                tracing::debug!("Opened {} @ {} baud", config.port, config.baud_rate);
                Ok(())
            }
            Err(source) => {
                tracing::error!(
                    "Failed to open serial port {} @ {}: {}",
                    config.port,
                    config.baud_rate,
                    source
                );
                Err(MkError::Open {
                    port: config.port.clone(),
                    baud_rate: config.baud_rate,
                    source,
                })
            }
        }
    }

    /// Install an already opened transport, resetting link state as `open` does.
    pub fn attach(&mut self, transport: T) {
        self.close();
        self.install(transport);
    }

    /// Close the link, handing back the transport if one was open.
    pub fn close(&mut self) -> Option<T> {
        self.port = None;
        self.transport.take()
    }

    fn install(&mut self, transport: T) {
        self.assembler.clear(&mut self.rx);
        self.tx.clear();
        self.decoded.clear();
        self.labels.reset();
        self.stats = LinkStats::default();
        self.rejected_at_open = self.assembler.rejected_frames();
        self.transport = Some(transport);
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Port name of the current link, if opened by name.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Counters since the last open.
    pub fn stats(&self) -> LinkStats {
        LinkStats {
            frames_rejected: self.assembler.rejected_frames() - self.rejected_at_open,
            ..self.stats
        }
    }

    /// Labels the next header requests will carry.
    pub fn header_labels(&self) -> HeaderLabels {
        self.labels
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    /// Replace the analog label (header) handler.
    pub fn set_header_callback<H: Handler<AnalogLabel>>(&mut self, handler: H) {
        self.callbacks.set_header(handler);
    }

    /// Replace the debug output handler.
    pub fn set_debug_output_callback<H: Handler<DebugOutput>>(&mut self, handler: H) {
        self.callbacks.set_debug_output(handler);
    }

    /// Replace the high-speed output handler.
    pub fn set_high_speed_output_callback<H: Handler<HighSpeedOutput>>(&mut self, handler: H) {
        self.callbacks.set_high_speed_output(handler);
    }

    /// Request a header with the next label of its type.
    ///
    /// The label only advances once the request was sent.
    pub fn send_header_request(&mut self, high_speed: bool) -> Result<()> {
        let label = self.labels.current(high_speed);
        let command = if high_speed {
            TxCommand::HighSpeedHeader
        } else {
            TxCommand::DebugHeader
        };

        self.send_request(command, Some(&[label]))?;
        self.labels.advance(high_speed);
        Ok(())
    }

    /// Request telemetry output.
    ///
    /// A non-zero `interval` subscribes to debug output at that interval.
    /// Zero subscribes to continuous high-speed output; it does not turn
    /// output off.
    pub fn send_output_request(&mut self, interval: u8) -> Result<()> {
        if interval != 0 {
            self.send_request(TxCommand::DebugOutput, Some(&[interval]))
        } else {
            self.send_request(TxCommand::HighSpeedOutput, None)
        }
    }

    fn send_request(&mut self, command: TxCommand, payload: Option<&[u8]>) -> Result<()> {
        self.send_frame(command.opcode(), address::FC, payload)
    }

    /// Encode and send an arbitrary frame.
    pub fn send_frame(&mut self, command: u8, address: u8, payload: Option<&[u8]>) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(MkError::NotOpen)?;
        self.assembler
            .encode(&mut self.tx, command, address, payload)?;

        let written = send_buffer(transport, self.tx.as_slice())?;
        self.stats.bytes_written += written as u64;
        tracing::trace!(
            "Sent '{}' to #{} ({} bytes)",
            char::from(command),
            address,
            written
        );
        Ok(())
    }

    /// Drain pending input and dispatch every completed frame.
    ///
    /// Reads repeat while a read fills the whole scratch window. Returns the
    /// number of records delivered to handlers. Frame-level problems are
    /// logged and skipped; only transport errors are returned.
    pub fn poll(&mut self) -> Result<usize> {
        let mut dispatched = 0;

        loop {
            let transport = self.transport.as_mut().ok_or(MkError::NotOpen)?;
            let read = transport.poll(&mut self.window)?.min(self.window.len());
            self.stats.bytes_read += read as u64;

            for i in 0..read {
                let byte = self.window[i];
                if self.assembler.accumulate(&mut self.rx, byte) {
                    self.stats.frames_received += 1;
                    if self.process_frame() {
                        dispatched += 1;
                    }
                }
            }

            if read < self.window.len() {
                break;
            }
        }

        Ok(dispatched)
    }

    /// Decode the completed frame in `rx`, clear it, then dispatch.
    fn process_frame(&mut self) -> bool {
        let header = self.assembler.decode_header(&self.rx);
        let data = self.assembler.decode_data(&self.rx, &mut self.decoded);
        self.assembler.clear(&mut self.rx);

        let header = match (header, data) {
            (Ok(header), Ok(())) => header,
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Dropping undecodable frame: {}", e);
                self.stats.malformed_frames += 1;
                return false;
            }
        };

        let message = Message::new(header, &self.decoded);
        dispatch(&mut self.callbacks, &mut self.stats, message)
    }
}

/// Route one message by address and command.
fn dispatch(callbacks: &mut CallbackRegistry, stats: &mut LinkStats, message: Message<'_>) -> bool {
    if !message.is_from_flight_ctrl() {
        stats.unroutable_messages += 1;
        tracing::warn!(
            "{}",
            MkError::UnroutableMessage {
                address: message.address(),
                command: message.command(),
            }
        );
        return false;
    }

    let payload = message.payload();
    match RxCommand::from_opcode(message.command()) {
        Some(RxCommand::Header) if callbacks.has_header() => {
            deliver::<AnalogLabel>(stats, payload, |r| callbacks.dispatch_header(r))
        }
        Some(RxCommand::DebugOutput) if callbacks.has_debug_output() => {
            deliver::<DebugOutput>(stats, payload, |r| callbacks.dispatch_debug_output(r))
        }
        Some(RxCommand::HighSpeedOutput) if callbacks.has_high_speed_output() => {
            deliver::<HighSpeedOutput>(stats, payload, |r| {
                callbacks.dispatch_high_speed_output(r)
            })
        }
        Some(command) => {
            tracing::trace!("No handler for '{}'", char::from(command.opcode()));
            stats.messages_unhandled += 1;
            false
        }
        None => {
            stats.unknown_commands += 1;
            tracing::warn!(
                "{}",
                MkError::UnknownCommand {
                    command: message.command()
                }
            );
            false
        }
    }
}

/// Decode a record and hand it to `handler`.
fn deliver<R: Record>(
    stats: &mut LinkStats,
    payload: &[u8],
    handler: impl FnOnce(&R) -> bool,
) -> bool {
    match R::decode(payload) {
        Ok(record) => {
            if handler(&record) {
                stats.messages_dispatched += 1;
                true
            } else {
                stats.messages_unhandled += 1;
                false
            }
        }
        Err(e) => {
            stats.malformed_payloads += 1;
            tracing::warn!("Dropping message: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::build_frame;
    use crate::transport::{MemoryHandle, MemoryTransport};
    use std::sync::{Arc, Mutex};

    fn attached() -> (Connection<MemoryTransport>, MemoryHandle) {
        let (transport, handle) = MemoryTransport::pair();
        (Connection::builder().attach(transport), handle)
    }

    fn debug_frame(first_channel: i16) -> Vec<u8> {
        let mut record = DebugOutput::default();
        record.analog[0] = first_channel;
        build_frame(b'D', address::FC, Some(&record.encode()))
    }

    #[test]
    fn test_builder_creation() {
        let builder = ConnectionBuilder::new();
        assert_eq!(builder.scratch_window, DEFAULT_SCRATCH_WINDOW);
        assert!(!builder.callbacks.has_header());
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = Connection::builder()
            .on_header(|_: &AnalogLabel| {})
            .on_debug_output(|_: &DebugOutput| {})
            .on_high_speed_output(|_: &HighSpeedOutput| {})
            .scratch_window(0);

        assert!(builder.callbacks.has_header());
        assert!(builder.callbacks.has_debug_output());
        assert!(builder.callbacks.has_high_speed_output());
        assert_eq!(builder.scratch_window, 1);
    }

    #[test]
    fn test_new_connection_is_closed() {
        let mut conn: Connection<MemoryTransport> = Connection::new();

        assert!(!conn.is_open());
        assert!(matches!(conn.poll(), Err(MkError::NotOpen)));
        assert!(matches!(
            conn.send_header_request(false),
            Err(MkError::NotOpen)
        ));
        assert!(matches!(conn.send_output_request(5), Err(MkError::NotOpen)));
    }

    #[test]
    fn test_open_failure_reports_port_and_rate() {
        let mut conn: Connection<MemoryTransport> = Connection::new();

        let err = conn.open("/dev/ttyS9", 38400).unwrap_err();

        match err {
            MkError::Open {
                port, baud_rate, ..
            } => {
                assert_eq!(port, "/dev/ttyS9");
                assert_eq!(baud_rate, 38400);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!conn.is_open());
        assert_eq!(conn.port(), None);
    }

    #[test]
    fn test_failed_reopen_closes_previous_link() {
        let (mut conn, _handle) = attached();
        assert!(conn.is_open());

        assert!(conn.open("/dev/missing", 57600).is_err());
        assert!(!conn.is_open());
    }

    #[test]
    fn test_attach_resets_labels() {
        let (mut conn, _handle) = attached();
        conn.send_header_request(false).unwrap();
        conn.send_header_request(true).unwrap();
        assert_ne!(conn.header_labels(), HeaderLabels::new());

        let (transport, _handle) = MemoryTransport::pair();
        conn.attach(transport);
        assert_eq!(conn.header_labels(), HeaderLabels::new());
        assert_eq!(conn.stats(), LinkStats::default());
    }

    #[test]
    fn test_header_request_frames() {
        let (mut conn, handle) = attached();

        conn.send_header_request(false).unwrap();
        conn.send_header_request(false).unwrap();
        conn.send_header_request(true).unwrap();

        let mut expected = build_frame(b'a', address::FC, Some(&[0]));
        expected.extend(build_frame(b'a', address::FC, Some(&[1])));
        expected.extend(build_frame(b'o', address::FC, Some(&[0])));
        assert_eq!(handle.written(), expected);
        assert_eq!(conn.stats().bytes_written, expected.len() as u64);
    }

    #[test]
    fn test_failed_header_request_keeps_label() {
        let (mut conn, handle) = attached();
        handle.fail_writes(true);

        assert!(matches!(
            conn.send_header_request(true),
            Err(MkError::Write(_))
        ));
        assert_eq!(conn.header_labels().current(true), 0);
    }

    #[test]
    fn test_output_request_frames() {
        let (mut conn, handle) = attached();

        conn.send_output_request(0).unwrap();
        assert_eq!(handle.take_written(), build_frame(b'i', address::FC, None));

        conn.send_output_request(25).unwrap();
        assert_eq!(
            handle.take_written(),
            build_frame(b'd', address::FC, Some(&[25]))
        );
    }

    #[test]
    fn test_send_frame_with_partial_writes() {
        let (mut conn, handle) = attached();
        handle.limit_writes(1);

        conn.send_frame(b'v', address::NC, Some(b"hello")).unwrap();

        assert_eq!(
            handle.written(),
            build_frame(b'v', address::NC, Some(b"hello"))
        );
    }

    #[test]
    fn test_send_frame_too_large() {
        let (mut conn, handle) = attached();

        let result = conn.send_frame(b'x', address::FC, Some(&[0u8; 4000]));

        assert!(matches!(result, Err(MkError::FrameTooLarge { .. })));
        assert!(handle.written().is_empty());
    }

    #[test]
    fn test_poll_dispatches_debug_output() {
        let (mut conn, handle) = attached();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        conn.set_debug_output_callback(move |out: &DebugOutput| {
            sink.lock().unwrap().push(out.analog[0]);
        });

        handle.push_inbound(&debug_frame(-42));
        let dispatched = conn.poll().unwrap();

        assert_eq!(dispatched, 1);
        assert_eq!(*seen.lock().unwrap(), vec![-42]);
        let stats = conn.stats();
        assert_eq!(stats.frames_received, 1);
        assert_eq!(stats.messages_dispatched, 1);
    }

    #[test]
    fn test_poll_without_handler_drops_silently() {
        let (mut conn, handle) = attached();
        handle.push_inbound(&debug_frame(1));

        assert_eq!(conn.poll().unwrap(), 0);
        assert_eq!(conn.stats().messages_unhandled, 1);
        assert_eq!(conn.stats().malformed_payloads, 0);
    }

    #[test]
    fn test_poll_drops_unroutable_and_unknown() {
        let (mut conn, handle) = attached();
        let calls = Arc::new(Mutex::new(0));
        let sink = calls.clone();
        conn.set_debug_output_callback(move |_: &DebugOutput| *sink.lock().unwrap() += 1);

        let record = DebugOutput::default().encode();
        handle.push_inbound(&build_frame(b'D', address::NC, Some(&record)));
        handle.push_inbound(&build_frame(b'Z', address::FC, Some(&record)));
        conn.poll().unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        let stats = conn.stats();
        assert_eq!(stats.unroutable_messages, 1);
        assert_eq!(stats.unknown_commands, 1);
    }

    #[test]
    fn test_poll_drops_short_payload() {
        let (mut conn, handle) = attached();
        conn.set_high_speed_output_callback(|_: &HighSpeedOutput| panic!("must not be called"));

        handle.push_inbound(&build_frame(b'I', address::FC, Some(&[1, 2, 3])));

        assert_eq!(conn.poll().unwrap(), 0);
        assert_eq!(conn.stats().malformed_payloads, 1);
    }

    #[test]
    fn test_poll_counts_rejected_frames() {
        let (mut conn, handle) = attached();
        let mut bytes = debug_frame(0);
        let crc = bytes.len() - 2;
        bytes[crc] ^= 0x01;
        handle.push_inbound(&bytes);

        conn.poll().unwrap();

        let stats = conn.stats();
        assert_eq!(stats.frames_received, 0);
        assert_eq!(stats.frames_rejected, 1);
    }

    #[test]
    fn test_poll_repeats_while_window_is_full() {
        let (transport, handle) = MemoryTransport::pair();
        let mut conn: Connection<MemoryTransport> =
            Connection::builder().scratch_window(8).attach(transport);
        handle.push_inbound(&[0u8; 20]);

        conn.poll().unwrap();

        // 8 + 8 + 4: the short read ends the pass.
        assert_eq!(handle.polls(), 3);
        assert_eq!(handle.inbound_len(), 0);
        assert_eq!(conn.stats().bytes_read, 20);
    }

    #[test]
    fn test_poll_exact_window_reads_once_more() {
        let (transport, handle) = MemoryTransport::pair();
        let mut conn: Connection<MemoryTransport> =
            Connection::builder().scratch_window(8).attach(transport);
        handle.push_inbound(&[0u8; 8]);

        conn.poll().unwrap();

        assert_eq!(handle.polls(), 2);
    }

    #[test]
    fn test_poll_with_nothing_pending_changes_nothing() {
        let (mut conn, handle) = attached();
        conn.set_header_callback(|_: &AnalogLabel| panic!("must not be called"));
        let labels = conn.header_labels();

        assert_eq!(conn.poll().unwrap(), 0);

        assert_eq!(handle.polls(), 1);
        assert_eq!(conn.stats(), LinkStats::default());
        assert_eq!(conn.header_labels(), labels);
        assert!(handle.written().is_empty());
    }

    #[test]
    fn test_frame_split_across_polls() {
        let (mut conn, handle) = attached();
        let labels = Arc::new(Mutex::new(Vec::new()));
        let sink = labels.clone();
        conn.set_header_callback(move |label: &AnalogLabel| {
            sink.lock().unwrap().push(label.clone());
        });

        let bytes = build_frame(
            b'A',
            address::FC,
            Some(&AnalogLabel::new(7, "Gyro Yaw").encode()),
        );
        let (first, second) = bytes.split_at(10);

        handle.push_inbound(first);
        assert_eq!(conn.poll().unwrap(), 0);
        handle.push_inbound(second);
        assert_eq!(conn.poll().unwrap(), 1);

        assert_eq!(*labels.lock().unwrap(), vec![AnalogLabel::new(7, "Gyro Yaw")]);
    }

    #[test]
    fn test_connection_is_send() {
        fn assert_send<S: Send>() {}
        assert_send::<Connection<MemoryTransport>>();
        assert_send::<Connection>();
    }

    #[test]
    fn test_close_returns_transport() {
        let (mut conn, _handle) = attached();

        assert!(conn.close().is_some());
        assert!(!conn.is_open());
        assert!(conn.close().is_none());
    }
}
