//! Flat scene model: a vertical background gradient and one shaded disc.

use std::path::PathBuf;

use glam::{Vec2, Vec3};
use lucent_core::{Properties, ResourceResolver};

use crate::{EngineError, Result};

/// Direction towards the key light, roughly normalized.
const LIGHT_DIR: Vec3 = Vec3::new(-0.4, 0.5, 0.768);
const AMBIENT: f32 = 0.2;

/// Scene state parsed from `scene.*` properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub background_top: Vec3,
    pub background_bottom: Vec3,
    /// Diffuse colour of the disc.
    pub kd: Vec3,
    /// Disc centre in normalized film coordinates.
    pub center: Vec2,
    /// Disc radius as a fraction of the shorter film side.
    pub radius: f32,
    /// Resolved texture file, if the scene names one.
    pub texture: Option<PathBuf>,
}

impl Scene {
    /// Parse scene properties, resolving referenced files through `resolver`.
    pub fn from_properties(props: &Properties, resolver: &ResourceResolver) -> Result<Self> {
        let position = props.get_f32s("scene.object.position", &[0.5, 0.5])?;
        let &[x, y] = position.as_slice() else {
            return Err(lucent_core::Error::InvalidValue {
                key: "scene.object.position".to_string(),
                value: format!("{position:?}"),
                expected: "two numbers",
            }
            .into());
        };

        let texture = match props.get("scene.object.texture").and_then(|p| p.value(0)) {
            Some(name) => Some(
                resolver
                    .find(name)
                    .ok_or_else(|| EngineError::MissingResource(name.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            background_top: props
                .get_rgb("scene.background.top", [0.55, 0.7, 0.9])?
                .into(),
            background_bottom: props
                .get_rgb("scene.background.bottom", [0.9, 0.9, 0.85])?
                .into(),
            kd: props.get_rgb("scene.object.kd", [0.75, 0.75, 0.75])?.into(),
            center: Vec2::new(x, y),
            radius: props.get_f32("scene.object.radius", 0.35)?,
            texture,
        })
    }

    /// Radiance at film position `p`, in pixels from the top-left corner.
    pub fn shade(&self, p: Vec2, width: u32, height: u32) -> Vec3 {
        let size = Vec2::new(width as f32, height as f32);
        let t = (p.y / size.y).clamp(0.0, 1.0);
        let background = self.background_top.lerp(self.background_bottom, t);

        let radius = self.radius * size.min_element();
        if radius <= 0.0 {
            return background;
        }

        let offset = (p - self.center * size) / radius;
        let d2 = offset.length_squared();
        if d2 >= 1.0 {
            return background;
        }

        // Shade the disc as the visible half of a sphere.
        let normal = Vec3::new(offset.x, -offset.y, (1.0 - d2).sqrt());
        let diffuse = normal.dot(LIGHT_DIR).max(0.0);
        self.kd * (AMBIENT + (1.0 - AMBIENT) * diffuse)
    }
}
