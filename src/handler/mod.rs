//! Handler module - telemetry callbacks and their registry.
//!
//! Provides:
//! - [`Handler`] - a single "handle this record" capability
//! - [`CallbackRegistry`] - one replaceable slot per message category
//!
//! # Example
//!
//! ```
//! use mk_link::codec::DebugOutput;
//! use mk_link::handler::CallbackRegistry;
//!
//! let mut registry = CallbackRegistry::new();
//!
//! registry.set_debug_output(|out: &DebugOutput| {
//!     println!("status: {:?}", out.status);
//! });
//!
//! assert!(registry.has_debug_output());
//! assert!(!registry.has_header());
//! ```

mod registry;

pub use registry::{CallbackRegistry, Handler};
