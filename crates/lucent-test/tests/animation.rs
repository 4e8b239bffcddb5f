//! Animation driver ordering and the procedural animation case.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lucent_core::{Properties, ResourceResolver};
use lucent_engine::{
    EngineError, Film, ProceduralEngine, RenderConfig, RenderEngine, RenderSession,
};
use lucent_test::{
    standard_test_params, HarnessConfig, SceneTestRunner, TestError, TestParams, Verdict,
    ANIM_CASES,
};
use parking_lot::Mutex;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start,
    Stop,
    BeginEdit,
    Edit(u32),
    EndEdit,
    WaitForDone,
    UpdateStats,
    Film,
}

type EventLog = Arc<Mutex<Vec<Event>>>;

/// Flat grey film whose level follows the number of scene edits.
struct FlatFilm {
    level: f32,
}

impl Film for FlatFilm {
    fn width(&self) -> u32 {
        4
    }

    fn height(&self) -> u32 {
        4
    }

    fn total_sample_count(&self) -> f64 {
        16.0
    }

    fn image_pipeline_rgb(&self, _index: u32) -> lucent_engine::Result<Vec<f32>> {
        Ok(vec![self.level; 4 * 4 * 3])
    }
}

struct RecordingSession {
    config: RenderConfig,
    events: EventLog,
    stats: Properties,
    film: FlatFilm,
    started: bool,
    in_edit: bool,
}

impl RenderSession for RecordingSession {
    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn start(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::Start);
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::Stop);
        self.started = false;
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn begin_scene_edit(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::BeginEdit);
        self.in_edit = true;
        Ok(())
    }

    fn edit_scene(&mut self, props: &Properties) -> lucent_engine::Result<()> {
        let frame = props.get_u32("frame", 0)?;
        self.events.lock().push(Event::Edit(frame));
        Ok(())
    }

    fn end_scene_edit(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::EndEdit);
        self.in_edit = false;
        self.film.level += 0.25;
        Ok(())
    }

    fn is_in_scene_edit(&self) -> bool {
        self.in_edit
    }

    fn has_done(&self) -> bool {
        true
    }

    fn wait_for_done(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::WaitForDone);
        Ok(())
    }

    fn update_stats(&mut self) -> lucent_engine::Result<()> {
        self.events.lock().push(Event::UpdateStats);
        Ok(())
    }

    fn stats(&self) -> &Properties {
        &self.stats
    }

    fn film(&self) -> &dyn Film {
        self.events.lock().push(Event::Film);
        &self.film
    }
}

#[derive(Default)]
struct RecordingEngine {
    events: EventLog,
}

impl RenderEngine for RecordingEngine {
    type Session = RecordingSession;

    fn name(&self) -> &str {
        "recording"
    }

    fn create_session(&self, config: RenderConfig) -> lucent_engine::Result<RecordingSession> {
        Ok(RecordingSession {
            config,
            events: Arc::clone(&self.events),
            stats: Properties::new(),
            film: FlatFilm { level: 0.0 },
            started: false,
            in_edit: false,
        })
    }
}

fn harness(dir: &TempDir, update: bool) -> HarnessConfig {
    HarnessConfig::default()
        .with_scenes_root(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../resources/scenes"))
        .with_output_dir(dir.path().join("images"))
        .with_reference_dir(dir.path().join("referenceimages"))
        .with_update_baselines(update)
}

fn empty_config() -> RenderConfig {
    RenderConfig::new(Properties::new(), ResourceResolver::new())
}

fn edit_frame(session: &mut dyn RenderSession, frame: u32) -> lucent_engine::Result<()> {
    session.edit_scene(&Properties::parse_str(&format!("frame = {frame}"), "edit")?)
}

fn frame_events() -> [Event; 3] {
    [Event::WaitForDone, Event::UpdateStats, Event::Film]
}

#[test]
fn frames_are_checked_before_each_edit() {
    let dir = TempDir::new().unwrap();
    let runner = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, true));

    let outcome = runner
        .anim_test("Ordered", empty_config(), 3, edit_frame)
        .unwrap();
    assert_eq!(outcome.frame_count, 3);
    assert_eq!(outcome.verdicts.len(), 3);

    let mut expected = vec![Event::Start];
    expected.extend(frame_events());
    for frame in 1..3 {
        expected.extend([Event::BeginEdit, Event::Edit(frame), Event::EndEdit]);
        expected.extend(frame_events());
    }
    expected.push(Event::Stop);
    assert_eq!(*runner.engine().events.lock(), expected);

    for frame in 0..3 {
        let name = format!("Ordered-{frame:04}.png");
        assert!(dir.path().join("images").join(&name).exists(), "{name}");
        assert!(dir.path().join("referenceimages").join(&name).exists(), "{name}");
    }
}

#[test]
fn single_frame_has_no_edits() {
    let dir = TempDir::new().unwrap();
    let runner = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, true));

    runner
        .anim_test("Single", empty_config(), 1, |_: &mut dyn RenderSession, _| {
            panic!("no edit expected for a single frame")
        })
        .unwrap();

    let events = runner.engine().events.lock().clone();
    assert!(!events.contains(&Event::BeginEdit));
    assert_eq!(events.last(), Some(&Event::Stop));
}

#[test]
fn zero_frames_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let runner = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, true));

    let err = runner
        .anim_test("Empty", empty_config(), 0, edit_frame)
        .unwrap_err();
    assert!(matches!(err, TestError::Config(_)), "{err}");
    assert!(runner.engine().events.lock().is_empty());
}

#[test]
fn failing_edit_stops_the_session() {
    let dir = TempDir::new().unwrap();
    let runner = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, true));

    let err = runner
        .anim_test("Broken", empty_config(), 3, |_: &mut dyn RenderSession, frame| {
            Err(EngineError::Render(format!("edit {frame} rejected")))
        })
        .unwrap_err();
    assert!(matches!(err, TestError::Engine(EngineError::Render(_))), "{err}");

    let events = runner.engine().events.lock().clone();
    assert_eq!(events.last(), Some(&Event::Stop));
    assert_eq!(events.iter().filter(|e| **e == Event::Start).count(), 1);
    assert!(!dir.path().join("images/Broken-0001.png").exists());
}

#[test]
fn first_failing_frame_ends_the_animation() {
    let dir = TempDir::new().unwrap();

    // Bless three frames, then make frame 1 differ
    let bless = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, true));
    bless.anim_test("Drift", empty_config(), 3, edit_frame).unwrap();
    std::fs::copy(
        dir.path().join("referenceimages/Drift-0000.png"),
        dir.path().join("referenceimages/Drift-0001.png"),
    )
    .unwrap();

    let check = SceneTestRunner::new(RecordingEngine::default(), harness(&dir, false));
    let outcome = check.anim_test("Drift", empty_config(), 3, edit_frame).unwrap();

    assert!(!outcome.is_pass());
    assert_eq!(outcome.verdicts.len(), 2);
    let (frame, verdict) = outcome.first_failure().unwrap();
    assert_eq!(frame, 1);
    assert!(!verdict.is_pass());
    assert!(dir.path().join("images/Drift-0001_diff.png").exists());
    assert_eq!(check.engine().events.lock().last(), Some(&Event::Stop));
}

fn anim_dirs(dir: &TempDir) -> (PathBuf, PathBuf) {
    (dir.path().join("images"), dir.path().join("referenceimages"))
}

#[test]
fn procedural_animation_round_trip() {
    let dir = TempDir::new().unwrap();
    let (images, references) = anim_dirs(&dir);
    let case = &ANIM_CASES[0];
    let params = &standard_test_params()[0];

    let bless = SceneTestRunner::new(ProceduralEngine::new(), harness(&dir, true));
    let outcome = bless
        .scene_anim_test(
            params,
            case.config,
            case.name,
            &Properties::new(),
            case.frame_count,
            case.edit,
        )
        .unwrap();
    assert_eq!(outcome.verdicts.len(), case.frame_count as usize);

    let name = params.output_name(case.name);
    for frame in 0..case.frame_count {
        let file = format!("{name}-{frame:04}.png");
        assert!(images.join(&file).exists(), "{file}");
        assert!(references.join(&file).exists(), "{file}");
    }

    // Edits move the disc, so consecutive frames differ
    let first = lucent_test::compare_files(
        references.join(format!("{name}-0000.png")),
        references.join(format!("{name}-0001.png")),
    )
    .unwrap()
    .unwrap();
    assert!(first > 0.001, "frames 0 and 1 differ by {first}");

    let check = SceneTestRunner::new(ProceduralEngine::new(), harness(&dir, false));
    let outcome = check
        .scene_anim_test(
            params,
            case.config,
            case.name,
            &Properties::new(),
            case.frame_count,
            case.edit,
        )
        .unwrap();
    assert!(outcome.is_pass());
    assert!(outcome
        .verdicts
        .iter()
        .all(|v| matches!(v, Verdict::Pass { .. })));
}

#[test]
fn anim_frames_use_the_case_name() {
    let dir = TempDir::new().unwrap();
    let (images, _) = anim_dirs(&dir);
    let case = &ANIM_CASES[0];

    let runner = SceneTestRunner::new(ProceduralEngine::new(), harness(&dir, false));
    let config = runner
        .build_config(&TestParams::new("PATHCPU", ""), case.config, &Properties::new())
        .unwrap();
    let outcome = runner
        .anim_test(case.name, config, case.frame_count, case.edit)
        .unwrap();

    // No baselines yet: frame 0 fails and nothing else is rendered
    assert_eq!(outcome.verdicts.len(), 1);
    assert!(images.join("Anim-0000.png").exists());
    assert!(!images.join("Anim-0001.png").exists());
}
