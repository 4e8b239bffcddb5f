//! Core types for the Lucent regression harness.
//!
//! This crate provides the pieces every other crate builds on:
//! - Ordered, mergeable property sets and the property-file parser
//! - Resource search paths for resolving scene-relative asset names
//! - The shared error type

pub mod error;
pub mod properties;
pub mod resolver;

pub use error::{Error, Result};
pub use properties::{Properties, Property};
pub use resolver::ResourceResolver;

/// Callback through which an engine reports free-form log lines.
pub type LogHandler = std::sync::Arc<dyn Fn(&str) + Send + Sync>;

/// Well-known property keys shared between the harness and engines.
pub mod keys {
    /// Rendering engine selection.
    pub const RENDER_ENGINE_TYPE: &str = "renderengine.type";
    /// Sampler selection.
    pub const SAMPLER_TYPE: &str = "sampler.type";
    /// Samples per pixel after which a batch render is done.
    pub const BATCH_HALT_SPP: &str = "batch.haltspp";
    /// Film width in pixels.
    pub const FILM_WIDTH: &str = "film.width";
    /// Film height in pixels.
    pub const FILM_HEIGHT: &str = "film.height";
}
