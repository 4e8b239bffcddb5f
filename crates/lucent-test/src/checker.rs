//! Baseline comparison.
//!
//! Rendered images are always written to the output directory first, then
//! compared with the baseline of the same file name in the reference
//! directory.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use lucent_engine::{EngineError, Film};
use tracing::{info, warn};

use crate::{HarnessConfig, Result};

/// Channel difference above which a diff image pixel is highlighted.
const DIFF_HIGHLIGHT: u8 = 10;

/// Why a comparison failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// No baseline file exists.
    MissingBaseline { baseline: PathBuf },
    /// The baseline exists but could not be decoded.
    UnreadableBaseline { baseline: PathBuf, reason: String },
    /// Rendered and baseline images have different sizes.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// Mean difference exceeds the threshold.
    Mismatch {
        score: f64,
        threshold: f64,
        diff: PathBuf,
    },
}

/// Outcome of one image check.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The image matches its baseline.
    Pass { score: f64 },
    /// The baseline was (re)written from the rendered image.
    Updated { baseline: PathBuf },
    Fail(Failure),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        !matches!(self, Self::Fail(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Fail(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { score } => write!(f, "pass (difference {score:.6})"),
            Self::Updated { baseline } => write!(f, "baseline updated: {}", baseline.display()),
            Self::Fail(Failure::MissingBaseline { baseline }) => {
                write!(f, "missing baseline {}", baseline.display())
            }
            Self::Fail(Failure::UnreadableBaseline { baseline, reason }) => {
                write!(f, "unreadable baseline {}: {reason}", baseline.display())
            }
            Self::Fail(Failure::DimensionMismatch { expected, actual }) => write!(
                f,
                "image dimensions don't match: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::Fail(Failure::Mismatch {
                score,
                threshold,
                diff,
            }) => write!(
                f,
                "image difference {score:.4} exceeds threshold {threshold:.4} (see {})",
                diff.display()
            ),
        }
    }
}

/// File name for a still (`name.png`) or an animation frame (`name-0007.png`).
pub fn image_file_name(name: &str, frame: Option<u32>) -> String {
    match frame {
        Some(frame) => format!("{name}-{frame:04}.png"),
        None => format!("{name}.png"),
    }
}

/// Read image pipeline 0 of `film` as an 8-bit RGB image.
pub fn image_pipeline_image(film: &dyn Film) -> Result<RgbImage> {
    let (width, height) = (film.width(), film.height());
    let data: Vec<u8> = film
        .image_pipeline_rgb(0)?
        .into_iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
        .collect();

    ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
        EngineError::Render(format!(
            "image pipeline output does not match film size {width}x{height}"
        ))
        .into()
    })
}

/// Mean absolute RGB difference normalized to 0.0-1.0.
///
/// Returns `None` when the dimensions differ.
pub fn compare_images(a: &RgbImage, b: &RgbImage) -> Option<f64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    if a.width() == 0 || a.height() == 0 {
        return Some(0.0);
    }

    let total_diff: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| {
            pa.0.iter()
                .zip(pb.0.iter())
                .map(|(&ca, &cb)| u64::from(ca.abs_diff(cb)))
                .sum::<u64>()
        })
        .sum();

    let max_diff = (u64::from(a.width()) * u64::from(a.height()) * 3 * 255) as f64;
    Some(total_diff as f64 / max_diff)
}

/// Compare two image files on disk.
pub fn compare_files(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<Option<f64>> {
    let a = image::open(a)?.to_rgb8();
    let b = image::open(b)?.to_rgb8();
    Ok(compare_images(&a, &b))
}

/// Highlight differing pixels in red over a dimmed copy of the baseline.
fn create_diff_image(baseline: &RgbImage, rendered: &RgbImage) -> RgbImage {
    let (width, height) = baseline.dimensions();
    let mut diff = ImageBuffer::new(width, height);

    for (x, y, pixel) in diff.enumerate_pixels_mut() {
        let pa = baseline.get_pixel(x, y);
        let pb = rendered.get_pixel(x, y);

        let max_diff = pa
            .0
            .iter()
            .zip(pb.0.iter())
            .map(|(&a, &b)| a.abs_diff(b))
            .max()
            .unwrap_or(0);

        *pixel = if max_diff > DIFF_HIGHLIGHT {
            Rgb([255, 0, 0])
        } else {
            Rgb([pa[0] / 2, pa[1] / 2, pa[2] / 2])
        };
    }

    diff
}

/// Saves rendered images and compares them with their baselines.
#[derive(Debug, Clone, Copy)]
pub struct ImageChecker<'a> {
    config: &'a HarnessConfig,
}

impl<'a> ImageChecker<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Where the rendered image for `name`/`frame` is written.
    pub fn rendered_path(&self, name: &str, frame: Option<u32>) -> PathBuf {
        self.config.output_dir.join(image_file_name(name, frame))
    }

    /// Where the baseline for `name`/`frame` is read from.
    pub fn baseline_path(&self, name: &str, frame: Option<u32>) -> PathBuf {
        self.config.reference_dir.join(image_file_name(name, frame))
    }

    /// Save `image` and compare it with its baseline.
    ///
    /// Only failures to write the rendered image are errors; everything
    /// about the baseline is reported through the verdict, which is logged
    /// once: failures as warnings, everything else as info.
    pub fn check(&self, image: &RgbImage, name: &str, frame: Option<u32>) -> Result<Verdict> {
        let verdict = self.evaluate(image, name, frame)?;
        let file = image_file_name(name, frame);
        if verdict.is_pass() {
            info!("{file}: {verdict}");
        } else {
            warn!("{file}: {verdict}");
        }
        Ok(verdict)
    }

    fn evaluate(&self, image: &RgbImage, name: &str, frame: Option<u32>) -> Result<Verdict> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let rendered_path = self.rendered_path(name, frame);
        let baseline_path = self.baseline_path(name, frame);

        image.save(&rendered_path)?;

        if !baseline_path.exists() {
            return self.update_or_fail(
                image,
                baseline_path.clone(),
                Failure::MissingBaseline {
                    baseline: baseline_path,
                },
            );
        }

        let baseline = match image::open(&baseline_path) {
            Ok(baseline) => baseline.to_rgb8(),
            Err(e) => {
                return self.update_or_fail(
                    image,
                    baseline_path.clone(),
                    Failure::UnreadableBaseline {
                        baseline: baseline_path,
                        reason: e.to_string(),
                    },
                );
            }
        };

        let Some(score) = compare_images(&baseline, image) else {
            return self.update_or_fail(
                image,
                baseline_path,
                Failure::DimensionMismatch {
                    expected: baseline.dimensions(),
                    actual: image.dimensions(),
                },
            );
        };

        if score > self.config.threshold {
            let stem = image_file_name(name, frame);
            let stem = stem.trim_end_matches(".png");
            let diff_path = self.config.output_dir.join(format!("{stem}_diff.png"));
            create_diff_image(&baseline, image).save(&diff_path)?;

            return self.update_or_fail(
                image,
                baseline_path,
                Failure::Mismatch {
                    score,
                    threshold: self.config.threshold,
                    diff: diff_path,
                },
            );
        }

        Ok(Verdict::Pass { score })
    }

    fn update_or_fail(
        &self,
        image: &RgbImage,
        baseline: PathBuf,
        failure: Failure,
    ) -> Result<Verdict> {
        if !self.config.update_baselines {
            return Ok(Verdict::Fail(failure));
        }

        std::fs::create_dir_all(&self.config.reference_dir)?;
        image.save(&baseline)?;
        Ok(Verdict::Updated { baseline })
    }
}
