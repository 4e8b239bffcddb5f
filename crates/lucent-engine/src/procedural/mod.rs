//! Deterministic procedural reference engine.
//!
//! Renders a flat scene (background gradient and one shaded disc) by
//! accumulating jittered samples until `batch.haltspp` passes are done.
//! Output depends only on the configuration, so repeated renders are
//! bit-identical. Rendering happens inside
//! [`RenderSession::wait_for_done`], rows in parallel.

mod film;
mod scene;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use lucent_core::{keys, LogHandler, Properties, Property};

pub use film::ProceduralFilm;
pub use scene::Scene;

use crate::{EngineError, Film, RenderConfig, RenderEngine, RenderSession, Result};

/// Default samples per pixel.
pub const DEFAULT_HALT_SPP: u32 = 16;

/// Supported `renderengine.type` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineType {
    PathCpu,
    BidirCpu,
    TilePathCpu,
    LightCpu,
}

impl EngineType {
    pub const ALL: [Self; 4] = [Self::PathCpu, Self::BidirCpu, Self::TilePathCpu, Self::LightCpu];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathCpu => "PATHCPU",
            Self::BidirCpu => "BIDIRCPU",
            Self::TilePathCpu => "TILEPATHCPU",
            Self::LightCpu => "LIGHTCPU",
        }
    }
}

impl FromStr for EngineType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| EngineError::UnknownEngine(s.to_string()))
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported `sampler.type` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplerType {
    Random,
    Sobol,
    Metropolis,
    /// Stratified sampler used by tile engines.
    TilePath,
}

impl SamplerType {
    pub const ALL: [Self; 4] = [Self::Random, Self::Sobol, Self::Metropolis, Self::TilePath];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "RANDOM",
            Self::Sobol => "SOBOL",
            Self::Metropolis => "METROPOLIS",
            Self::TilePath => "TILEPATHSAMPLER",
        }
    }
}

impl FromStr for SamplerType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| EngineError::UnknownSampler(s.to_string()))
    }
}

impl fmt::Display for SamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Procedural reference engine.
#[derive(Clone, Default)]
pub struct ProceduralEngine {
    log: Option<LogHandler>,
}

impl ProceduralEngine {
    /// Create an engine that does not report log lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report engine log lines through `handler`.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log = Some(handler);
        self
    }
}

impl fmt::Debug for ProceduralEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProceduralEngine")
            .field("log", &self.log.is_some())
            .finish()
    }
}

impl RenderEngine for ProceduralEngine {
    type Session = ProceduralSession;

    fn name(&self) -> &str {
        "procedural"
    }

    fn create_session(&self, config: RenderConfig) -> Result<ProceduralSession> {
        let engine: EngineType = config
            .engine_type()
            .unwrap_or(EngineType::PathCpu.as_str())
            .parse()?;

        let sampler = match (engine, config.sampler_type()) {
            (EngineType::TilePathCpu, requested) => {
                if let Some(name) = requested.filter(|s| *s != SamplerType::TilePath.as_str()) {
                    log(&self.log, &format!("{engine} ignores sampler {name}"));
                }
                SamplerType::TilePath
            }
            (_, None) => SamplerType::Random,
            (_, Some(name)) => match name.parse()? {
                SamplerType::TilePath => {
                    return Err(EngineError::UnsupportedSampler {
                        engine: engine.to_string(),
                        sampler: name.to_string(),
                    })
                }
                sampler => sampler,
            },
        };

        let (width, height) = config.film_size()?;
        if width == 0 || height == 0 {
            return Err(lucent_core::Error::InvalidValue {
                key: keys::FILM_WIDTH.to_string(),
                value: format!("{width}x{height}"),
                expected: "a non-zero film size",
            }
            .into());
        }

        let halt_spp = config
            .properties()
            .get_u32(keys::BATCH_HALT_SPP, DEFAULT_HALT_SPP)?;
        if halt_spp == 0 {
            return Err(lucent_core::Error::InvalidValue {
                key: keys::BATCH_HALT_SPP.to_string(),
                value: "0".to_string(),
                expected: "at least one sample per pixel",
            }
            .into());
        }

        let scene_props = config.properties().with_prefix("scene.");
        let scene = Scene::from_properties(&scene_props, config.resolver())?;

        Ok(ProceduralSession {
            config,
            engine,
            sampler,
            halt_spp,
            scene_props,
            scene,
            pending_edit: None,
            film: ProceduralFilm::new(width, height),
            stats: Properties::new(),
            started: false,
            in_edit: false,
            render_time: Duration::ZERO,
            log: self.log.clone(),
        })
    }
}

/// Session of the procedural engine.
pub struct ProceduralSession {
    config: RenderConfig,
    engine: EngineType,
    sampler: SamplerType,
    halt_spp: u32,
    scene_props: Properties,
    scene: Scene,
    pending_edit: Option<(Properties, Scene)>,
    film: ProceduralFilm,
    stats: Properties,
    started: bool,
    in_edit: bool,
    render_time: Duration,
    log: Option<LogHandler>,
}

impl ProceduralSession {
    /// Selected engine type.
    pub fn engine_type(&self) -> EngineType {
        self.engine
    }

    /// Selected sampler type.
    pub fn sampler_type(&self) -> SamplerType {
        self.sampler
    }

    /// Current scene state.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn log(&self, message: &str) {
        log(&self.log, message);
    }

    fn require_started(&self, operation: &str) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "{operation} requires a started session"
            )))
        }
    }

    fn require_edit(&self, operation: &str) -> Result<()> {
        if self.in_edit {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "{operation} requires an open scene edit"
            )))
        }
    }
}

impl RenderSession for ProceduralSession {
    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(EngineError::InvalidState("session already started".into()));
        }
        self.film.clear();
        self.render_time = Duration::ZERO;
        self.started = true;
        self.log(&format!(
            "RenderSession starting: {} with {} sampler, {}x{}, {} spp",
            self.engine,
            self.sampler,
            self.film.width(),
            self.film.height(),
            self.halt_spp
        ));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.require_started("stop")?;
        self.started = false;
        self.in_edit = false;
        self.pending_edit = None;
        self.log("RenderSession stopped");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn begin_scene_edit(&mut self) -> Result<()> {
        self.require_started("begin_scene_edit")?;
        if self.in_edit {
            return Err(EngineError::InvalidState("scene edit already open".into()));
        }
        self.in_edit = true;
        Ok(())
    }

    fn edit_scene(&mut self, props: &Properties) -> Result<()> {
        self.require_edit("edit_scene")?;

        let mut next = self
            .pending_edit
            .as_ref()
            .map_or_else(|| self.scene_props.clone(), |(p, _)| p.clone());
        next.merge(props);
        let scene = Scene::from_properties(&next, self.config.resolver())?;
        self.pending_edit = Some((next, scene));
        Ok(())
    }

    fn end_scene_edit(&mut self) -> Result<()> {
        self.require_edit("end_scene_edit")?;
        if let Some((props, scene)) = self.pending_edit.take() {
            self.scene_props = props;
            self.scene = scene;
        }
        self.in_edit = false;
        self.film.clear();
        self.render_time = Duration::ZERO;
        self.log("Scene edit applied, restarting accumulation");
        Ok(())
    }

    fn is_in_scene_edit(&self) -> bool {
        self.in_edit
    }

    fn has_done(&self) -> bool {
        self.film.passes() >= self.halt_spp
    }

    fn wait_for_done(&mut self) -> Result<()> {
        self.require_started("wait_for_done")?;
        if self.in_edit {
            return Err(EngineError::InvalidState(
                "cannot render while a scene edit is open".into(),
            ));
        }

        let start = Instant::now();
        while !self.has_done() {
            self.film
                .render_pass(&self.scene, self.sampler, self.halt_spp);
        }
        self.render_time += start.elapsed();

        self.log(&format!(
            "Rendering done: {} passes in {:.1}ms",
            self.film.passes(),
            self.render_time.as_secs_f64() * 1000.0
        ));
        Ok(())
    }

    fn update_stats(&mut self) -> Result<()> {
        let seconds = self.render_time.as_secs_f64();
        let samples = self.film.total_sample_count();
        let rate = if seconds > 0.0 { samples / seconds } else { 0.0 };

        self.stats = Properties::new()
            .with(Property::with_value("stats.renderengine.pass", self.film.passes()))
            .with(Property::with_value(
                "stats.renderengine.total.samplecount",
                samples,
            ))
            .with(Property::with_value("stats.renderengine.total.samplesec", rate))
            .with(Property::with_value("stats.renderengine.time", seconds))
            .with(Property::with_values(
                "stats.film.size",
                [self.film.width(), self.film.height()],
            ));
        if let Some(texture) = &self.scene.texture {
            self.stats.set(Property::with_value(
                "stats.scene.texture",
                texture.display(),
            ));
        }
        Ok(())
    }

    fn stats(&self) -> &Properties {
        &self.stats
    }

    fn film(&self) -> &dyn Film {
        &self.film
    }
}

fn log(handler: &Option<LogHandler>, message: &str) {
    if let Some(handler) = handler {
        handler(message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lucent_core::ResourceResolver;
    use parking_lot::Mutex;

    use super::*;

    fn config(text: &str) -> RenderConfig {
        let base = "film.width = 12\nfilm.height = 8\nbatch.haltspp = 4\n";
        let props = Properties::parse_str(&format!("{base}{text}"), "t").unwrap();
        RenderConfig::new(props, ResourceResolver::new())
    }

    fn render(session: &mut ProceduralSession) -> Vec<f32> {
        session.start().unwrap();
        session.wait_for_done().unwrap();
        session.update_stats().unwrap();
        session.stop().unwrap();
        session.film().image_pipeline_rgb(0).unwrap()
    }

    #[test]
    fn engine_and_sampler_selection() {
        let engine = ProceduralEngine::new();

        let s = engine.create_session(config("")).unwrap();
        assert_eq!(s.engine_type(), EngineType::PathCpu);
        assert_eq!(s.sampler_type(), SamplerType::Random);

        let s = engine
            .create_session(config("renderengine.type = BIDIRCPU\nsampler.type = SOBOL"))
            .unwrap();
        assert_eq!(s.engine_type(), EngineType::BidirCpu);
        assert_eq!(s.sampler_type(), SamplerType::Sobol);

        let s = engine
            .create_session(config("renderengine.type = TILEPATHCPU\nsampler.type = RANDOM"))
            .unwrap();
        assert_eq!(s.sampler_type(), SamplerType::TilePath);
    }

    #[test]
    fn configuration_errors() {
        let engine = ProceduralEngine::new();
        assert!(matches!(
            engine.create_session(config("renderengine.type = RTPATHOCL")),
            Err(EngineError::UnknownEngine(_))
        ));
        assert!(matches!(
            engine.create_session(config("sampler.type = HALTON")),
            Err(EngineError::UnknownSampler(_))
        ));
        assert!(matches!(
            engine.create_session(config("sampler.type = TILEPATHSAMPLER")),
            Err(EngineError::UnsupportedSampler { .. })
        ));
        assert!(matches!(
            engine.create_session(config("batch.haltspp = 0")),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            engine.create_session(config("film.width = 0")),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn render_to_completion() {
        let mut session = ProceduralEngine::new().create_session(config("")).unwrap();
        let rgb = render(&mut session);

        assert!(session.has_done());
        assert_eq!(rgb.len(), 12 * 8 * 3);
        assert_eq!(
            session.stats().get_u32("stats.renderengine.pass", 0).unwrap(),
            4
        );
        assert_eq!(
            session.stats().get_f32("stats.renderengine.total.samplecount", 0.0).unwrap(),
            4.0 * 96.0
        );
    }

    #[test]
    fn repeated_renders_match() {
        let engine = ProceduralEngine::new();
        let a = render(&mut engine.create_session(config("")).unwrap());
        let b = render(&mut engine.create_session(config("")).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn scene_edit_restarts_accumulation() {
        let mut session = ProceduralEngine::new().create_session(config("")).unwrap();
        session.start().unwrap();
        session.wait_for_done().unwrap();
        let before = session.film().image_pipeline_rgb(0).unwrap();

        session.begin_scene_edit().unwrap();
        session
            .edit_scene(&Properties::parse_str("scene.object.kd = 1 0 0", "edit").unwrap())
            .unwrap();
        assert!(session.wait_for_done().is_err());
        session.end_scene_edit().unwrap();

        assert!(!session.has_done());
        assert_eq!(session.film().total_sample_count(), 0.0);
        assert_eq!(session.scene().kd, glam::Vec3::new(1.0, 0.0, 0.0));

        session.wait_for_done().unwrap();
        let after = session.film().image_pipeline_rgb(0).unwrap();
        session.stop().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn invalid_edit_keeps_scene() {
        let mut session = ProceduralEngine::new().create_session(config("")).unwrap();
        session.start().unwrap();
        session.begin_scene_edit().unwrap();
        let bad = Properties::parse_str("scene.object.radius = big", "edit").unwrap();
        assert!(session.edit_scene(&bad).is_err());
        session.end_scene_edit().unwrap();
        assert!((session.scene().radius - 0.35).abs() < f32::EPSILON);
        session.stop().unwrap();
    }

    #[test]
    fn lifecycle_violations() {
        let mut session = ProceduralEngine::new().create_session(config("")).unwrap();
        assert!(session.stop().is_err());
        assert!(session.begin_scene_edit().is_err());
        assert!(session.wait_for_done().is_err());

        session.start().unwrap();
        assert!(session.start().is_err());
        assert!(session.end_scene_edit().is_err());
        assert!(session.edit_scene(&Properties::new()).is_err());
        session.begin_scene_edit().unwrap();
        assert!(session.begin_scene_edit().is_err());
        session.stop().unwrap();
        assert!(!session.is_in_scene_edit());
    }

    #[test]
    fn reports_through_log_handler() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let engine = ProceduralEngine::new()
            .with_log_handler(Arc::new(move |msg: &str| sink.lock().push(msg.to_string())));

        let mut session = engine.create_session(config("")).unwrap();
        render(&mut session);

        let lines = lines.lock();
        assert!(lines[0].starts_with("RenderSession starting: PATHCPU with RANDOM sampler"));
        assert!(lines.iter().any(|l| l.starts_with("Rendering done: 4 passes")));
        assert_eq!(lines.last().map(String::as_str), Some("RenderSession stopped"));
    }
}
