//! Image regression harness for the Lucent renderer.
//!
//! Renders scene configurations through a [`lucent_engine::RenderEngine`],
//! saves the results and compares them with committed baseline images.

pub mod cases;
pub mod checker;
pub mod params;
pub mod runner;

use std::path::PathBuf;

use lucent_core::{Properties, Property};
use lucent_engine::EngineError;
use thiserror::Error;

pub use cases::{
    standard_test_params, AnimCase, SceneCase, SceneEditFn, ANIM_CASES, MATERIAL_CASES,
};
pub use checker::{
    compare_files, compare_images, image_file_name, image_pipeline_image, Failure, ImageChecker,
    Verdict,
};
pub use params::{reject_selection_keys, TestParams};
pub use runner::{AnimOutcome, SceneTestRunner};

/// Errors that end a single test case.
///
/// Image mismatches are not errors; they are reported as a failing [`Verdict`].
#[derive(Error, Debug)]
pub enum TestError {
    #[error("Configuration error: {0}")]
    Config(#[from] lucent_core::Error),
    #[error("Engine error: {0}")]
    Engine(EngineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<EngineError> for TestError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Config(e) => Self::Config(e),
            other => Self::Engine(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TestError>;

/// Regression run configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Maximum allowed mean pixel difference (0.0-1.0).
    pub threshold: f64,
    /// Directory for baseline images.
    pub reference_dir: PathBuf,
    /// Directory for rendered images.
    pub output_dir: PathBuf,
    /// Root for relative scene configuration paths.
    pub scenes_root: PathBuf,
    /// Overrides applied last to every configuration.
    pub global_overrides: Properties,
    /// Replace missing or mismatching baselines instead of failing.
    pub update_baselines: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            threshold: 0.001,
            reference_dir: PathBuf::from("referenceimages"),
            output_dir: PathBuf::from("images"),
            scenes_root: PathBuf::from("resources/scenes"),
            global_overrides: Properties::new(),
            update_baselines: false,
        }
    }
}

impl HarnessConfig {
    /// Set the comparison threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the baseline directory.
    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = dir.into();
        self
    }

    /// Set the rendered image directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the scene configuration root.
    pub fn with_scenes_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scenes_root = dir.into();
        self
    }

    /// Add a global override.
    pub fn with_override(mut self, property: Property) -> Self {
        self.global_overrides.set(property);
        self
    }

    /// Enable or disable baseline updates.
    pub fn with_update_baselines(mut self, update: bool) -> Self {
        self.update_baselines = update;
        self
    }
}
