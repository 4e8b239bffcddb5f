//! Engine error types.

use thiserror::Error;

/// Errors reported by a rendering engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be read or has bad values.
    #[error(transparent)]
    Config(#[from] lucent_core::Error),

    #[error("Unknown render engine type: {0}")]
    UnknownEngine(String),

    #[error("Unknown sampler type: {0}")]
    UnknownSampler(String),

    #[error("Sampler {sampler} is not supported by {engine}")]
    UnsupportedSampler { engine: String, sampler: String },

    /// A session method was called in the wrong lifecycle state.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// A file referenced by the scene was not found on any search path.
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// The render itself failed.
    #[error("Render failed: {0}")]
    Render(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, EngineError>;
