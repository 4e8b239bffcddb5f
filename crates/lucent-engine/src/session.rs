//! Engine, session and film traits.

use std::ops::{Deref, DerefMut};

use lucent_core::Properties;
use tracing::warn;

use crate::{RenderConfig, Result};

/// Accumulation buffer of a render in progress.
pub trait Film {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Total number of samples accumulated over all pixels.
    fn total_sample_count(&self) -> f64;

    /// Run image pipeline `index` and return its display-ready RGB output.
    ///
    /// Three floats per pixel, rows top to bottom, nominally in `[0, 1]`.
    fn image_pipeline_rgb(&self, index: u32) -> Result<Vec<f32>>;
}

/// One render job.
///
/// Lifecycle: `start`, then any number of `begin_scene_edit` /
/// `edit_scene` / `end_scene_edit` transactions, then `stop`. Ending an
/// edit restarts accumulation.
pub trait RenderSession {
    /// The configuration this session was created from.
    fn config(&self) -> &RenderConfig;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn is_started(&self) -> bool;

    /// Open a scene edit transaction.
    fn begin_scene_edit(&mut self) -> Result<()>;

    /// Apply scene properties. Only valid inside an edit transaction.
    fn edit_scene(&mut self, props: &Properties) -> Result<()>;

    /// Close the edit transaction and restart accumulation.
    fn end_scene_edit(&mut self) -> Result<()>;

    fn is_in_scene_edit(&self) -> bool;

    /// Check if the current render reached its halt condition.
    fn has_done(&self) -> bool;

    /// Block until the current render reaches its halt condition.
    fn wait_for_done(&mut self) -> Result<()>;

    /// Refresh statistics and the film.
    fn update_stats(&mut self) -> Result<()>;

    /// Statistics as of the last [`RenderSession::update_stats`].
    fn stats(&self) -> &Properties;

    fn film(&self) -> &dyn Film;
}

/// Factory for render sessions.
pub trait RenderEngine {
    type Session: RenderSession;

    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Validate `config` and create a stopped session.
    fn create_session(&self, config: RenderConfig) -> Result<Self::Session>;
}

/// Scoped ownership of a started session.
///
/// Dropping the guard stops the session if it is still running, so early
/// returns and `?` never leak a running render.
pub struct SessionGuard<'a, S: RenderSession + ?Sized> {
    session: &'a mut S,
}

impl<'a, S: RenderSession + ?Sized> SessionGuard<'a, S> {
    /// Start `session` and guard it.
    pub fn start(session: &'a mut S) -> Result<Self> {
        session.start()?;
        Ok(Self { session })
    }

    /// Stop the session, reporting any error.
    pub fn stop(self) -> Result<()> {
        self.session.stop()
    }
}

impl<S: RenderSession + ?Sized> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: RenderSession + ?Sized> DerefMut for SessionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
    }
}

impl<S: RenderSession + ?Sized> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        if self.session.is_started() {
            if let Err(e) = self.session.stop() {
                warn!("Failed to stop render session: {e}");
            }
        }
    }
}
