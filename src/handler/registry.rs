//! Callback registry for dispatching decoded records.
//!
//! The registry holds at most one handler per category. Setting a slot
//! replaces the previous handler; there is no multicast. An empty slot is a
//! normal state and dispatching into it is a no-op.

use crate::codec::{AnalogLabel, DebugOutput, HighSpeedOutput};

/// Trait for record handlers.
///
/// Any `FnMut(&T) + Send` closure is a handler. The record reference is only
/// valid for the duration of the call.
pub trait Handler<T>: Send + 'static {
    /// Handle one decoded record.
    fn handle(&mut self, record: &T);
}

impl<T, F> Handler<T> for F
where
    F: FnMut(&T) + Send + 'static,
{
    fn handle(&mut self, record: &T) {
        self(record)
    }
}

type Slot<T> = Option<Box<dyn Handler<T>>>;

/// Registry with one slot per message category.
#[derive(Default)]
pub struct CallbackRegistry {
    /// Analog label replies.
    header: Slot<AnalogLabel>,
    /// Debug output records.
    debug_output: Slot<DebugOutput>,
    /// High-speed output records.
    high_speed_output: Slot<HighSpeedOutput>,
}

impl CallbackRegistry {
    /// Create a registry with all slots empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the header handler.
    pub fn set_header<H: Handler<AnalogLabel>>(&mut self, handler: H) {
        self.header = Some(Box::new(handler));
    }

    /// Replace the debug output handler.
    pub fn set_debug_output<H: Handler<DebugOutput>>(&mut self, handler: H) {
        self.debug_output = Some(Box::new(handler));
    }

    /// Replace the high-speed output handler.
    pub fn set_high_speed_output<H: Handler<HighSpeedOutput>>(&mut self, handler: H) {
        self.high_speed_output = Some(Box::new(handler));
    }

    pub fn clear_header(&mut self) {
        self.header = None;
    }

    pub fn clear_debug_output(&mut self) {
        self.debug_output = None;
    }

    pub fn clear_high_speed_output(&mut self) {
        self.high_speed_output = None;
    }

    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }

    pub fn has_debug_output(&self) -> bool {
        self.debug_output.is_some()
    }

    pub fn has_high_speed_output(&self) -> bool {
        self.high_speed_output.is_some()
    }

    /// Invoke the header handler. Returns `false` if the slot is empty.
    pub fn dispatch_header(&mut self, record: &AnalogLabel) -> bool {
        dispatch(&mut self.header, record)
    }

    /// Invoke the debug output handler. Returns `false` if the slot is empty.
    pub fn dispatch_debug_output(&mut self, record: &DebugOutput) -> bool {
        dispatch(&mut self.debug_output, record)
    }

    /// Invoke the high-speed output handler. Returns `false` if the slot is empty.
    pub fn dispatch_high_speed_output(&mut self, record: &HighSpeedOutput) -> bool {
        dispatch(&mut self.high_speed_output, record)
    }
}

fn dispatch<T: 'static>(slot: &mut Slot<T>, record: &T) -> bool {
    match slot {
        Some(handler) => {
            handler.handle(record);
            true
        }
        None => false,
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("header", &self.has_header())
            .field("debug_output", &self.has_debug_output())
            .field("high_speed_output", &self.has_high_speed_output())
            .finish()
    }
}
