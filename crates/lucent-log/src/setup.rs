//! Host subscriber setup.

use tracing_subscriber::EnvFilter;

/// Host logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
    /// Prefix lines with the emitting thread's name.
    pub thread_names: bool,
    /// Print the event target.
    pub targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            thread_names: true,
            targets: false,
        }
    }
}

impl LogConfig {
    /// Set the fallback filter directive.
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Enable or disable event targets in the output.
    pub fn with_targets(mut self, targets: bool) -> Self {
        self.targets = targets;
        self
    }
}

/// Install the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(config.thread_names)
        .with_target(config.targets)
        .try_init()
        .is_ok()
}
