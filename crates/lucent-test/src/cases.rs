//! Regression test tables.
//!
//! Every scene case is rendered once per entry of [`standard_test_params`].

use lucent_core::{keys, Properties, Property};
use lucent_engine::RenderSession;

use crate::params::TestParams;

/// A still-image scene test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneCase {
    /// Test name, the prefix of every output image name.
    pub name: &'static str,
    /// Scene configuration, relative to the scenes root.
    pub config: &'static str,
}

/// Per-frame scene mutation: receives the session inside an edit
/// transaction and the index of the frame about to be rendered.
pub type SceneEditFn = fn(&mut dyn RenderSession, u32) -> lucent_engine::Result<()>;

/// An animated scene test.
#[derive(Clone, Copy)]
pub struct AnimCase {
    pub name: &'static str,
    pub config: &'static str,
    pub frame_count: u32,
    pub edit: SceneEditFn,
}

impl std::fmt::Debug for AnimCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimCase")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

// Sorted by scene file
pub const MATERIAL_CASES: &[SceneCase] = &[
    SceneCase {
        name: "ArchGlassMaterial",
        config: "simple/mat-archglass-area.cfg",
    },
    SceneCase {
        name: "CarPaintMaterial",
        config: "simple/mat-carpaint-area.cfg",
    },
    SceneCase {
        name: "ClothMaterial",
        config: "simple/mat-cloth-area.cfg",
    },
    SceneCase {
        name: "DisneyMaterial",
        config: "simple/mat-disney-area.cfg",
    },
    SceneCase {
        name: "GlassMaterial",
        config: "simple/mat-glass-area.cfg",
    },
    SceneCase {
        name: "GlassDispMaterial",
        config: "simple/mat-glass-disp-area.cfg",
    },
    SceneCase {
        name: "Glossy2Material",
        config: "simple/mat-glossy2-area.cfg",
    },
    SceneCase {
        name: "GlossyCoatingMaterial",
        config: "simple/mat-glossycoating-area.cfg",
    },
    SceneCase {
        name: "GlossyTranslucentMaterial",
        config: "simple/mat-glossytranslucent-area.cfg",
    },
    SceneCase {
        name: "MatteMaterial",
        config: "simple/mat-matte-area.cfg",
    },
];

pub const ANIM_CASES: &[AnimCase] = &[AnimCase {
    name: "Anim",
    config: "simple/anim-disc.cfg",
    frame_count: 3,
    edit: move_disc,
}];

/// Engine and sampler combinations every scene case runs under.
pub fn standard_test_params() -> Vec<TestParams> {
    let spp = |n: u32| Property::with_value(keys::BATCH_HALT_SPP, n);

    vec![
        TestParams::new("PATHCPU", "RANDOM").with(spp(16)),
        TestParams::new("PATHCPU", "SOBOL").with(spp(16)),
        TestParams::new("PATHCPU", "METROPOLIS").with(spp(16)),
        TestParams::new("BIDIRCPU", "RANDOM").with(spp(8)),
        TestParams::new("TILEPATHCPU", "").with(spp(16)),
    ]
}

/// Slide the disc to the right and shift its colour towards red.
fn move_disc(session: &mut dyn RenderSession, frame: u32) -> lucent_engine::Result<()> {
    let t = frame as f32;
    let edit = Properties::new()
        .with(Property::with_values(
            "scene.object.position",
            [0.3 + 0.2 * t, 0.5],
        ))
        .with(Property::with_values(
            "scene.object.kd",
            [0.4 + 0.2 * t, 0.4, 0.4 - 0.1 * t],
        ));
    session.edit_scene(&edit)
}
