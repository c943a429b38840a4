//! CLI command handlers.

use serde::Serialize;
use std::process::ExitCode;
use tracing::{info, warn};

use super::args::RunOptions;
use super::output::{print_help, print_outcome, print_version};
use super::{Args, Command};
use crate::config::SimConfig;
use crate::demos::{DemoSnapshot, HistoryExport, Terminal};
use crate::engine::{SimEngine, Tick};
use crate::error::SimResult;

/// Result of a headless run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Scenario name from the configuration.
    pub scenario: String,
    /// Demo identifier.
    pub demo: &'static str,
    /// Frames fed to the engine.
    pub frames: usize,
    /// Physics substeps executed.
    pub substeps: usize,
    /// Final simulated time (s).
    pub time: f64,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
    /// Final snapshot.
    pub snapshot: DemoSnapshot,
    /// Sampled history, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryExport>,
}

/// Main CLI entry point.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run(options) => match run_scenario(&options) {
            Ok(outcome) => match print_outcome(&outcome) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Load a scenario and tick it at a fixed frame rate.
///
/// Stops after `options.duration` wall-clock seconds of frames or as soon
/// as the demo halts.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or the state becomes
/// non-finite.
pub fn run_scenario(options: &RunOptions) -> SimResult<RunOutcome> {
    let config = SimConfig::load(&options.scenario_path)?;
    let scenario = config.name.clone();
    if options.frame_dt > config.clock.max_frame_dt {
        warn!(
            frame_dt = options.frame_dt,
            max_frame_dt = config.clock.max_frame_dt,
            "frame delta exceeds the clamp, simulation will run slower than wall time"
        );
    }

    let mut engine = SimEngine::new(config)?;
    engine.start();

    // slack keeps e.g. 1.0 / (1/60) from rounding up to 61 frames
    let planned = (options.duration / options.frame_dt - 1e-9).ceil() as usize;
    let mut frames = 0;
    let mut substeps = 0;
    for _ in 0..planned {
        let report = engine.tick(options.frame_dt)?;
        frames += 1;
        substeps += report.substeps;
        if report.terminal.is_some() {
            break;
        }
    }

    info!(
        demo = engine.demo().name(),
        frames,
        substeps,
        t = engine.time(),
        "run finished"
    );

    Ok(RunOutcome {
        scenario,
        demo: engine.demo().name(),
        frames,
        substeps,
        time: engine.time(),
        terminal: engine.terminal(),
        snapshot: engine.snapshot(),
        history: options.history.then(|| engine.history()),
    })
}
