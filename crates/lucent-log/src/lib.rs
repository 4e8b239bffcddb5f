//! Logging for the Lucent regression harness.
//!
//! Engines report progress through a plain string callback. This crate
//! forwards those lines into `tracing` through an injected [`LogSink`] and
//! sets up the host subscriber that prints them.
//!
//! ```ignore
//! use std::sync::Arc;
//! use lucent_log::{LogBridge, LogConfig, LogLevel, TracingSink};
//!
//! lucent_log::init(&LogConfig::default());
//! let bridge = LogBridge::new(Arc::new(TracingSink));
//! let handler = bridge.handler(LogLevel::Info);
//! handler("engine started");
//! ```

mod bridge;
mod setup;

pub use bridge::{LogBridge, LogLevel, LogSink, TracingSink, ENGINE_TARGET};
pub use setup::{init, LogConfig};
