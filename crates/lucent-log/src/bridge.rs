//! Engine log bridge.

use std::sync::Arc;

use lucent_core::LogHandler;

/// Target under which forwarded engine lines are emitted.
pub const ENGINE_TARGET: &str = "lucent::engine";

/// Severity of a forwarded line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Debug,
}

/// Destination for forwarded log lines.
///
/// Implementations must not block or panic.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Sink that emits into the current `tracing` subscriber.
///
/// Without an installed subscriber events are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!(target: ENGINE_TARGET, "{message}"),
            LogLevel::Debug => tracing::debug!(target: ENGINE_TARGET, "{message}"),
        }
    }
}

/// Adapter from the engine's callback convention to a [`LogSink`].
#[derive(Clone)]
pub struct LogBridge {
    sink: Arc<dyn LogSink>,
}

impl LogBridge {
    /// Create a bridge writing into `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Forward a line at informational severity.
    pub fn info(&self, message: &str) {
        self.sink.log(LogLevel::Info, message);
    }

    /// Forward a line at debug severity.
    pub fn debug(&self, message: &str) {
        self.sink.log(LogLevel::Debug, message);
    }

    /// Engine callback forwarding every line at `level`.
    pub fn handler(&self, level: LogLevel) -> LogHandler {
        let sink = Arc::clone(&self.sink);
        Arc::new(move |message: &str| sink.log(level, message))
    }
}

impl Default for LogBridge {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBridge").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CaptureSink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl LogSink for CaptureSink {
        fn log(&self, level: LogLevel, message: &str) {
            self.lines.lock().push((level, message.to_string()));
        }
    }

    #[test]
    fn forwards_verbatim_at_fixed_levels() {
        let sink = Arc::new(CaptureSink::default());
        let bridge = LogBridge::new(sink.clone());

        bridge.info("  RenderSession started  ");
        bridge.debug("Film size 64x48");

        assert_eq!(
            *sink.lines.lock(),
            vec![
                (LogLevel::Info, "  RenderSession started  ".to_string()),
                (LogLevel::Debug, "Film size 64x48".to_string()),
            ]
        );
    }

    #[test]
    fn handler_uses_its_level() {
        let sink = Arc::new(CaptureSink::default());
        let bridge = LogBridge::new(sink.clone());

        let info = bridge.handler(LogLevel::Info);
        let debug = bridge.handler(LogLevel::Debug);
        info("a");
        debug("b");
        info("c");

        let levels: Vec<_> = sink.lines.lock().iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, [LogLevel::Info, LogLevel::Debug, LogLevel::Info]);
    }

    #[test]
    fn tracing_sink_without_subscriber_is_noop() {
        let bridge = LogBridge::default();
        bridge.info("nobody is listening");
        bridge.debug("still fine");
    }
}
