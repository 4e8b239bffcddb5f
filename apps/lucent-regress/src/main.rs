//! Lucent Image Regression Runner
//!
//! Renders every material scene under every standard engine/sampler pair,
//! plus the animation cases, and compares the results with committed
//! baseline images.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p lucent-regress -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--images <DIR>`: Rendered image directory (default: images)
//! - `--reference <DIR>`: Baseline image directory (default: referenceimages)
//! - `--scenes <DIR>`: Scene configuration root (default: resources/scenes)
//! - `--threshold <F>`: Maximum mean pixel difference, 0.0-1.0 (default: 0.001)
//! - `--set <KEY=VALUE>`: Override a property in every test (repeatable).
//!   The engine and sampler keys are reserved for the test parameters.
//! - `--filter <TEXT>`: Only run tests whose output name contains TEXT
//! - `--update-baselines`: Replace missing or mismatching baselines
//! - `-h, --help`: Print help message
//!
//! ## Examples
//!
//! ```bash
//! # Run the full suite
//! cargo run -p lucent-regress
//!
//! # Only the matte scenes, at a lower sample count
//! cargo run -p lucent-regress -- --filter Matte --set batch.haltspp=4
//!
//! # Regenerate baselines after an intended change
//! cargo run -p lucent-regress -- --update-baselines
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::process::ExitCode;

use anyhow::{bail, Context};
use lucent_core::Properties;
use lucent_engine::ProceduralEngine;
use lucent_log::{LogBridge, LogConfig, LogLevel};
use lucent_test::{
    reject_selection_keys, standard_test_params, HarnessConfig, SceneTestRunner, TestParams,
    ANIM_CASES, MATERIAL_CASES,
};
use tracing::{error, info, warn};

/// Parsed command line.
#[derive(Debug, Default)]
struct Options {
    harness: HarnessConfig,
    filter: Option<String>,
    help: bool,
}

impl Options {
    fn parse_args(args: &[String]) -> anyhow::Result<Self> {
        let mut options = Self::default();

        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .map(String::as_str)
                    .with_context(|| format!("{arg} expects a value"))
            };

            match arg {
                "--images" => options.harness.output_dir = value()?.into(),
                "--reference" => options.harness.reference_dir = value()?.into(),
                "--scenes" => options.harness.scenes_root = value()?.into(),
                "--threshold" => {
                    let text = value()?;
                    options.harness.threshold = text
                        .parse()
                        .with_context(|| format!("invalid threshold {text:?}"))?;
                }
                "--set" => {
                    let text = value()?;
                    let props = Properties::parse_str(text, "--set")?;
                    if props.is_empty() {
                        bail!("--set expects key=value, got {text:?}");
                    }
                    reject_selection_keys(&props)
                        .context("--set cannot choose the engine or sampler")?;
                    options.harness.global_overrides.merge(&props);
                }
                "--filter" => options.filter = Some(value()?.to_string()),
                "--update-baselines" => options.harness.update_baselines = true,
                "-h" | "--help" => options.help = true,
                other => bail!("unknown option {other:?} (see --help)"),
            }
            i += 1;
        }

        Ok(options)
    }

    fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| name.contains(f))
    }
}

fn print_help() {
    eprintln!(
        "Lucent Image Regression Runner

USAGE:
    lucent-regress [OPTIONS]

OPTIONS:
    --images <DIR>          Rendered image directory (default: images)
    --reference <DIR>       Baseline image directory (default: referenceimages)
    --scenes <DIR>          Scene configuration root (default: resources/scenes)
    --threshold <F>         Maximum mean pixel difference, 0.0-1.0 (default: 0.001)
    --set <KEY=VALUE>       Override a property in every test (repeatable,
                            not renderengine.type or sampler.type)
    --filter <TEXT>         Only run tests whose output name contains TEXT
    --update-baselines      Replace missing or mismatching baselines
    -h, --help              Print this help message

EXAMPLES:
    lucent-regress --filter Matte --set batch.haltspp=4
    lucent-regress --update-baselines"
    );
}

/// Tally of one run.
#[derive(Debug, Default)]
struct Summary {
    passed: usize,
    failed: Vec<String>,
}

impl Summary {
    fn record(&mut self, name: String, passed: bool) {
        if passed {
            self.passed += 1;
        } else {
            self.failed.push(name);
        }
    }

    fn total(&self) -> usize {
        self.passed + self.failed.len()
    }
}

fn run(options: &Options) -> Summary {
    let bridge = LogBridge::default();
    let engine = ProceduralEngine::new().with_log_handler(bridge.handler(LogLevel::Info));
    let runner = SceneTestRunner::new(engine, options.harness.clone());
    let mut summary = Summary::default();

    let params = standard_test_params();
    for case in MATERIAL_CASES {
        for p in &params {
            let name = p.output_name(case.name);
            if !options.selects(&name) {
                continue;
            }
            let passed = match runner.scene_test(p, case.config, case.name, &Properties::new()) {
                Ok(verdict) => verdict.is_pass(),
                Err(e) => {
                    error!("{name}: {e}");
                    false
                }
            };
            summary.record(name, passed);
        }
    }

    // Animations run under the file's own sampler so frames keep the case name
    let anim_params = TestParams::new("PATHCPU", "");
    for case in ANIM_CASES {
        if !options.selects(case.name) {
            continue;
        }
        let outcome = runner
            .build_config(&anim_params, case.config, &Properties::new())
            .and_then(|config| runner.anim_test(case.name, config, case.frame_count, case.edit));
        let passed = match outcome {
            Ok(outcome) => outcome.is_pass(),
            Err(e) => {
                error!("{}: {e}", case.name);
                false
            }
        };
        summary.record(case.name.to_string(), passed);
    }

    summary
}

fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().collect();
    let options = Options::parse_args(&args)?;
    if options.help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    // Targets tell engine lines apart from harness lines
    lucent_log::init(&LogConfig::default().with_targets(true));
    info!(
        "Comparing {} against {} (threshold {})",
        options.harness.output_dir.display(),
        options.harness.reference_dir.display(),
        options.harness.threshold
    );
    if options.harness.update_baselines {
        warn!("Baseline update mode: mismatching baselines will be overwritten");
    }

    let summary = run(&options);
    if summary.total() == 0 {
        warn!("No tests matched the filter");
    }

    info!("{} passed, {} failed", summary.passed, summary.failed.len());
    for name in &summary.failed {
        info!("  FAILED {name}");
    }

    Ok(if summary.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
