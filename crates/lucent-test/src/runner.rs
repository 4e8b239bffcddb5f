//! Scene render invocation.
//!
//! Builds a render configuration from a scene file and test parameters,
//! drives one session to completion and hands the result to the
//! [`ImageChecker`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use lucent_core::{Properties, ResourceResolver};
use lucent_engine::{RenderConfig, RenderEngine, RenderSession, SessionGuard};
use tracing::{debug, info};

use crate::checker::{image_pipeline_image, ImageChecker, Verdict};
use crate::params::{reject_selection_keys, TestParams};
use crate::{HarnessConfig, Result};

/// Per-frame verdicts of an animation test.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimOutcome {
    pub frame_count: u32,
    /// One verdict per rendered frame, in frame order. Rendering stops at
    /// the first failing frame.
    pub verdicts: Vec<Verdict>,
}

impl AnimOutcome {
    /// Check if every frame was rendered and passed.
    pub fn is_pass(&self) -> bool {
        self.verdicts.len() == self.frame_count as usize
            && self.verdicts.iter().all(Verdict::is_pass)
    }

    /// The first failing frame and its verdict.
    pub fn first_failure(&self) -> Option<(u32, &Verdict)> {
        self.verdicts
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_pass())
            .map(|(i, v)| (i as u32, v))
    }
}

/// Runs regression tests against one engine.
pub struct SceneTestRunner<E: RenderEngine> {
    engine: E,
    config: HarnessConfig,
}

impl<E: RenderEngine> SceneTestRunner<E> {
    /// Create a new runner.
    pub fn new(engine: E, config: HarnessConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn checker(&self) -> ImageChecker<'_> {
        ImageChecker::new(&self.config)
    }

    /// Path of a scene configuration, relative names taken from the scenes root.
    pub fn scene_path(&self, cfg_name: impl AsRef<Path>) -> PathBuf {
        let cfg_name = cfg_name.as_ref();
        if cfg_name.is_absolute() {
            cfg_name.to_path_buf()
        } else {
            self.config.scenes_root.join(cfg_name)
        }
    }

    /// Build the render configuration for a scene file.
    ///
    /// Layers are merged in a fixed order, later ones winning: the file,
    /// the per-test parameters (extra properties, engine and sampler), the
    /// caller's overrides, then the run's global overrides. The file's
    /// directory becomes the only resource search path.
    ///
    /// Only `params` may select the engine and sampler: the extra
    /// properties, the caller's overrides and the global overrides are
    /// rejected with [`TestError::Config`] if they set either key.
    ///
    /// [`TestError::Config`]: crate::TestError::Config
    pub fn build_config(
        &self,
        params: &TestParams,
        cfg_name: impl AsRef<Path>,
        caller_props: &Properties,
    ) -> Result<RenderConfig> {
        for layer in [&params.additional, caller_props, &self.config.global_overrides] {
            reject_selection_keys(layer)?;
        }

        let cfg_path = self.scene_path(cfg_name);
        let mut props = Properties::load_file(&cfg_path)?;

        props
            .merge(&params.overrides())
            .merge(caller_props)
            .merge(&self.config.global_overrides);

        let cfg_dir = cfg_path.parent().unwrap_or_else(|| Path::new("."));
        let resolver = ResourceResolver::with_path(cfg_dir);

        Ok(RenderConfig::new(props, resolver))
    }

    /// Render a scene file under `params` and check it against its baseline.
    ///
    /// The baseline name is `{test_name}_{engine}[_{sampler}]`.
    pub fn scene_test(
        &self,
        params: &TestParams,
        cfg_name: impl AsRef<Path>,
        test_name: &str,
        caller_props: &Properties,
    ) -> Result<Verdict> {
        let config = self.build_config(params, cfg_name, caller_props)?;
        self.image_test(&params.output_name(test_name), config)
    }

    /// Render a still image and check it against the baseline `name`.
    pub fn image_test(&self, name: &str, config: RenderConfig) -> Result<Verdict> {
        let image = self.render_still(name, config)?;
        self.checker().check(&image, name, None)
    }

    /// Render a configuration to completion and read its image pipeline.
    pub fn render_still(&self, name: &str, config: RenderConfig) -> Result<RgbImage> {
        let mut session = self.engine.create_session(config)?;

        info!("{name}: rendering with {}...", self.engine.name());
        let start = Instant::now();
        {
            let mut guard = SessionGuard::start(&mut session)?;
            guard.wait_for_done()?;
            guard.update_stats()?;
            log_stats(name, &*guard);
            guard.stop()?;
        }
        debug!("{name}: done in {:.2?}", start.elapsed());

        image_pipeline_image(session.film())
    }

    /// Render a scene file as an animation under `params`.
    ///
    /// Frame images are named `{test_name}_{engine}[_{sampler}]-NNNN`.
    pub fn scene_anim_test<F>(
        &self,
        params: &TestParams,
        cfg_name: impl AsRef<Path>,
        test_name: &str,
        caller_props: &Properties,
        frame_count: u32,
        scene_edit: F,
    ) -> Result<AnimOutcome>
    where
        F: FnMut(&mut dyn RenderSession, u32) -> lucent_engine::Result<()>,
    {
        let config = self.build_config(params, cfg_name, caller_props)?;
        self.anim_test(&params.output_name(test_name), config, frame_count, scene_edit)
    }

    /// Render `frame_count` frames, checking each before editing the scene
    /// for the next one.
    ///
    /// `scene_edit` receives the session inside an open edit transaction and
    /// the index of the frame about to be rendered. The session is stopped
    /// on every exit path.
    pub fn anim_test<F>(
        &self,
        name: &str,
        config: RenderConfig,
        frame_count: u32,
        mut scene_edit: F,
    ) -> Result<AnimOutcome>
    where
        F: FnMut(&mut dyn RenderSession, u32) -> lucent_engine::Result<()>,
    {
        if frame_count == 0 {
            return Err(lucent_core::Error::InvalidValue {
                key: "frame count".to_string(),
                value: "0".to_string(),
                expected: "at least one frame",
            }
            .into());
        }

        let checker = self.checker();
        let mut session = self.engine.create_session(config)?;
        let mut verdicts = Vec::with_capacity(frame_count as usize);

        info!("{name}: frame 0...");
        let mut guard = SessionGuard::start(&mut session)?;
        let mut frame = 0;
        loop {
            guard.wait_for_done()?;
            // Also brings the film up to date
            guard.update_stats()?;
            log_stats(name, &*guard);

            let image = image_pipeline_image(guard.film())?;
            let verdict = checker.check(&image, name, Some(frame))?;
            let failed = !verdict.is_pass();
            verdicts.push(verdict);

            frame += 1;
            if failed || frame >= frame_count {
                break;
            }

            guard.begin_scene_edit()?;
            scene_edit(&mut *guard, frame)?;
            info!("{name}: frame {frame}...");
            guard.end_scene_edit()?;
        }
        guard.stop()?;

        Ok(AnimOutcome {
            frame_count,
            verdicts,
        })
    }
}

fn log_stats(name: &str, session: &dyn RenderSession) {
    let stats = session.stats();
    debug!(
        "{name}: {} passes, {} samples",
        stats.get_string("stats.renderengine.pass", "?"),
        stats.get_string("stats.renderengine.total.samplecount", "?"),
    );
}
