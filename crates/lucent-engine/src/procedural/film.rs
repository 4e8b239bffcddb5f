//! Accumulation film and sample sequences.

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use super::scene::Scene;
use super::SamplerType;
use crate::{EngineError, Film, Result};

const DISPLAY_GAMMA: f32 = 2.2;

/// Per-pixel radiance sums over a number of full-film passes.
#[derive(Clone, Debug)]
pub struct ProceduralFilm {
    width: u32,
    height: u32,
    accum: Vec<Vec3>,
    passes: u32,
}

impl ProceduralFilm {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            accum: vec![Vec3::ZERO; width as usize * height as usize],
            passes: 0,
        }
    }

    /// Completed passes, i.e. samples per pixel.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Drop all accumulated samples.
    pub fn clear(&mut self) {
        self.accum.fill(Vec3::ZERO);
        self.passes = 0;
    }

    /// Add one sample to every pixel.
    pub fn render_pass(&mut self, scene: &Scene, sampler: SamplerType, total_passes: u32) {
        let (width, height, pass) = (self.width, self.height, self.passes);

        self.accum
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, sum) in row.iter_mut().enumerate() {
                    let pixel = y as u32 * width + x as u32;
                    let jitter = sampler.sample_2d(pixel, pass, total_passes);
                    let p = Vec2::new(x as f32, y as f32) + jitter;
                    *sum += scene.shade(p, width, height);
                }
            });

        self.passes += 1;
    }
}

impl Film for ProceduralFilm {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn total_sample_count(&self) -> f64 {
        f64::from(self.passes) * self.accum.len() as f64
    }

    fn image_pipeline_rgb(&self, index: u32) -> Result<Vec<f32>> {
        if index != 0 {
            return Err(EngineError::Render(format!("no image pipeline {index}")));
        }

        let scale = if self.passes == 0 {
            0.0
        } else {
            1.0 / self.passes as f32
        };

        Ok(self
            .accum
            .iter()
            .flat_map(|sum| {
                let c = (*sum * scale).clamp(Vec3::ZERO, Vec3::ONE);
                let c = c.powf(1.0 / DISPLAY_GAMMA);
                [c.x, c.y, c.z]
            })
            .collect())
    }
}

/// Integer hash with good avalanche (lowbias32).
fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn to_unit(x: u32) -> f32 {
    (x >> 8) as f32 / (1u32 << 24) as f32
}

fn radical_inverse_2(i: u32) -> f32 {
    to_unit(i.reverse_bits())
}

fn radical_inverse_3(mut i: u32) -> f32 {
    const INV_BASE: f32 = 1.0 / 3.0;
    let mut result = 0.0;
    let mut factor = INV_BASE;
    while i > 0 {
        result += (i % 3) as f32 * factor;
        i /= 3;
        factor *= INV_BASE;
    }
    result
}

impl SamplerType {
    /// Sub-pixel offset in `[0, 1)^2` for `pass` of `pixel`.
    pub fn sample_2d(self, pixel: u32, pass: u32, total_passes: u32) -> Vec2 {
        match self {
            Self::Random | Self::Metropolis => {
                let seed = if self == Self::Random { 0x9e37_79b9 } else { 0x85eb_ca6b };
                let h = hash(pixel ^ seed).wrapping_add(pass.wrapping_mul(0x27d4_eb2d));
                Vec2::new(to_unit(hash(h)), to_unit(hash(h ^ 0x68e3_1da4)))
            }
            Self::Sobol => {
                // Low-discrepancy points with a per-pixel rotation.
                let rotation = hash(pixel);
                let u = radical_inverse_2(pass) + to_unit(rotation);
                let v = radical_inverse_3(pass) + to_unit(hash(rotation));
                Vec2::new(u.fract(), v.fract())
            }
            Self::TilePath => {
                let n = (total_passes.max(1) as f32).sqrt().ceil() as u32;
                let ix = pass % n;
                let iy = (pass / n) % n;
                Vec2::new(
                    (ix as f32 + 0.5) / n as f32,
                    (iy as f32 + 0.5) / n as f32,
                )
            }
        }
    }
}
