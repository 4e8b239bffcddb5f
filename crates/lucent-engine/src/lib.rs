//! Rendering engine interface consumed by the Lucent regression harness.
//!
//! The harness treats the renderer as a black box driven through three
//! traits:
//! - [`RenderEngine`] creates sessions from a [`RenderConfig`]
//! - [`RenderSession`] runs, edits and stops one render
//! - [`Film`] exposes the accumulated image through its output pipeline
//!
//! [`SessionGuard`] stops a started session on every exit path.
//! The [`procedural`] module provides a small deterministic engine that
//! implements these traits so the harness can run without a native renderer.

pub mod config;
pub mod error;
pub mod procedural;
pub mod session;

pub use config::RenderConfig;
pub use error::{EngineError, Result};
pub use procedural::{EngineType, ProceduralEngine, SamplerType};
pub use session::{Film, RenderEngine, RenderSession, SessionGuard};
