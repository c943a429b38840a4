//! Core simulation engine.
//!
//! [`SimEngine`] owns one demo, its frame clock and a Jidoka guard, and
//! exposes the control surface a host drives:
//!
//! - `reset` / `restart` rebuild the demo at its initial conditions
//! - `start` / `pause` toggle the running flag checked on every tick
//! - `step` advances one explicit substep regardless of the flag
//! - [`Tick::tick`] consumes one frame of wall-clock time
//!
//! A host loop (browser animation callback, game loop, test harness) calls
//! `tick` with the elapsed wall time; the clock clamps it and converts it
//! into a bounded number of fixed substeps.

pub mod clock;
pub mod history;
pub mod jidoka;
pub mod state;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use clock::FrameClock;
pub use history::{HistoryBuffer, HistoryTable, SampleRecord};
pub use jidoka::{JidokaConfig, JidokaGuard, JidokaViolation};
pub use state::{PhaseState, Vec2};

use crate::config::{DemoConfig, SimConfig};
use crate::demos::{Demo, DemoSnapshot, HistoryExport, Terminal};
use crate::error::SimResult;

/// Run state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    /// Freshly reset, not yet started.
    Idle,
    /// Advancing on every tick.
    Running,
    /// Ticks are ignored until `start`.
    Paused,
    /// The demo reached a modeled end state.
    Halted(Terminal),
    /// The Jidoka guard stopped a non-finite state.
    Faulted,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    /// Substeps executed during the tick.
    pub substeps: usize,
    /// Simulated time after the tick (s).
    pub time: f64,
    /// Terminal condition, if the demo has reached one.
    pub terminal: Option<Terminal>,
}

/// Host-facing scheduler hook.
pub trait Tick {
    /// Advance by one frame of `elapsed` wall-clock seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the state becomes non-finite.
    fn tick(&mut self, elapsed: f64) -> SimResult<TickReport>;
}

/// Engine driving one demo.
#[derive(Debug, Clone)]
pub struct SimEngine {
    config: SimConfig,
    demo: Demo,
    clock: FrameClock,
    guard: JidokaGuard,
    run_state: RunState,
}

impl SimEngine {
    /// Build an engine from a scenario configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the demo or clock settings are invalid.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        let demo = Demo::from_config(&config.demo)?;
        let clock = FrameClock::new(
            config.substep_for(&demo),
            config.clock.max_frame_dt,
            config.clock.time_scale,
        )?;
        info!(
            demo = demo.name(),
            substep = clock.substep(),
            time_scale = clock.time_scale(),
            "engine created"
        );

        Ok(Self {
            guard: JidokaGuard::new(config.jidoka),
            config,
            demo,
            clock,
            run_state: RunState::Idle,
        })
    }

    /// Replace the demo configuration and rebuild from scratch.
    ///
    /// The run state returns to [`RunState::Idle`]. On error the engine
    /// keeps its previous demo.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the new parameters are invalid.
    pub fn reset(&mut self, demo_config: DemoConfig) -> SimResult<()> {
        let demo = Demo::from_config(&demo_config)?;
        let clock = FrameClock::new(
            self.config.substep_for(&demo),
            self.config.clock.max_frame_dt,
            self.config.clock.time_scale,
        )?;
        self.config.demo = demo_config;
        self.demo = demo;
        self.clock = clock;
        self.guard.reset();
        self.run_state = RunState::Idle;
        info!(demo = self.demo.name(), "engine reset");
        Ok(())
    }

    /// Reset with the current parameters.
    pub fn restart(&mut self) {
        self.demo.reset();
        self.clock.reset();
        self.guard.reset();
        self.run_state = RunState::Idle;
        info!(demo = self.demo.name(), "engine restarted");
    }

    /// Set the running flag.
    ///
    /// Has no effect while the demo still reports a terminal condition or
    /// after a fault; an interactive edit that clears the terminal (such as
    /// rebalancing the lever) makes the demo startable again.
    pub fn start(&mut self) {
        match self.run_state {
            RunState::Idle | RunState::Paused => {
                self.run_state = RunState::Running;
                info!(demo = self.demo.name(), t = self.demo.time(), "started");
            }
            RunState::Running => {}
            RunState::Halted(_) if self.demo.terminal().is_none() => {
                self.run_state = RunState::Running;
                info!(demo = self.demo.name(), t = self.demo.time(), "resumed after edit");
            }
            RunState::Halted(terminal) => {
                warn!(%terminal, "start ignored: demo halted, reset first");
            }
            RunState::Faulted => warn!("start ignored: engine faulted, reset first"),
        }
    }

    /// Clear the running flag.
    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
            info!(demo = self.demo.name(), t = self.demo.time(), "paused");
        }
    }

    /// Whether ticks advance the simulation.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Advance exactly one substep of `dt` seconds, running or not.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::NonFiniteValue`] if the state
    /// becomes NaN or infinite.
    pub fn step(&mut self, dt: f64) -> SimResult<()> {
        if self.run_state == RunState::Faulted {
            return Ok(());
        }
        self.demo.step(dt);
        self.after_substep()
    }

    /// Advance `n` substeps of the configured size.
    ///
    /// Stops early at a terminal condition and returns the number executed.
    ///
    /// # Errors
    ///
    /// Returns an error if the state becomes non-finite.
    pub fn step_substeps(&mut self, n: usize) -> SimResult<usize> {
        let dt = self.clock.substep();
        let mut executed = 0;
        for _ in 0..n {
            if self.demo.terminal().is_some() || self.run_state == RunState::Faulted {
                break;
            }
            self.step(dt)?;
            executed += 1;
        }
        Ok(executed)
    }

    fn after_substep(&mut self) -> SimResult<()> {
        if let Err(e) = self.guard.check(self.demo.name(), &self.demo.state_values()) {
            self.run_state = RunState::Faulted;
            return Err(e);
        }
        if let Some(terminal) = self.demo.terminal() {
            if self.run_state != RunState::Halted(terminal) {
                warn!(demo = self.demo.name(), t = self.demo.time(), %terminal, "halted");
                self.run_state = RunState::Halted(terminal);
            }
        }
        Ok(())
    }

    /// Simulated time (s).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.demo.time()
    }

    /// Terminal condition, if reached.
    #[must_use]
    pub fn terminal(&self) -> Option<Terminal> {
        self.demo.terminal()
    }

    /// Snapshot of the active demo.
    #[must_use]
    pub fn snapshot(&self) -> DemoSnapshot {
        self.demo.snapshot()
    }

    /// History of the active demo.
    #[must_use]
    pub fn history(&self) -> HistoryExport {
        self.demo.history()
    }

    /// Active demo.
    #[must_use]
    pub const fn demo(&self) -> &Demo {
        &self.demo
    }

    /// Mutable access for interactive edits (e.g. moving lever loads).
    pub fn demo_mut(&mut self) -> &mut Demo {
        &mut self.demo
    }

    /// Frame clock.
    #[must_use]
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Scenario configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl Tick for SimEngine {
    fn tick(&mut self, elapsed: f64) -> SimResult<TickReport> {
        let mut substeps = 0;
        if self.is_running() {
            let due = self.clock.advance(elapsed);
            substeps = self.step_substeps(due)?;
            if substeps < due {
                // remaining substeps of a halted frame are dropped
                self.clock.reset();
            }
        }
        Ok(TickReport {
            substeps,
            time: self.demo.time(),
            terminal: self.demo.terminal(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoSetup;
    use crate::demos::kinematics::{KinematicsInitial, KinematicsParams};

    fn engine(demo: DemoConfig) -> SimEngine {
        SimEngine::new(SimConfig::builder().demo(demo).build()).unwrap()
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = engine(DemoConfig::default());
        assert_eq!(engine.run_state(), RunState::Idle);
        assert!(!engine.is_running());
        assert!(engine.time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_tick_ignored_until_started() {
        let mut engine = engine(DemoConfig::default());
        let report = engine.tick(1.0 / 60.0).unwrap();
        assert_eq!(report.substeps, 0);
        assert!(engine.time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_tick_runs_fixed_substeps() {
        let mut engine = engine(DemoConfig::default());
        engine.start();
        // pendulum substep is 1/240 s
        let report = engine.tick(1.0 / 60.0).unwrap();
        assert_eq!(report.substeps, 4);
        assert!((report.time - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_tick_clamps_large_frames() {
        let mut engine = engine(DemoConfig::default());
        engine.start();
        let report = engine.tick(5.0).unwrap();
        assert_eq!(report.substeps, 12);
        assert!((engine.time() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_pause_stops_time() {
        let mut engine = engine(DemoConfig::default());
        engine.start();
        engine.tick(0.02).unwrap();
        engine.pause();
        let t = engine.time();
        engine.tick(0.02).unwrap();
        assert!((engine.time() - t).abs() < f64::EPSILON);
        assert_eq!(engine.run_state(), RunState::Paused);
    }

    #[test]
    fn test_step_works_while_paused() {
        let mut engine = engine(DemoConfig::default());
        engine.step(0.01).unwrap();
        assert!((engine.time() - 0.01).abs() < 1e-12);
        assert_eq!(engine.step_substeps(3).unwrap(), 3);
    }

    #[test]
    fn test_terminal_halts_engine() {
        let demo = DemoConfig::Kinematics(DemoSetup::new(
            KinematicsParams {
                track_length: 1.0,
                ..KinematicsParams::default()
            },
            KinematicsInitial {
                position: 0.0,
                velocity: 2.0,
            },
        ));
        let mut engine = engine(demo);
        engine.start();
        for _ in 0..100 {
            engine.tick(0.05).unwrap();
        }
        assert_eq!(engine.run_state(), RunState::Halted(Terminal::TrackEnd));
        assert!(!engine.is_running());

        let t = engine.time();
        engine.start();
        assert_eq!(engine.tick(0.05).unwrap().substeps, 0);
        assert!((engine.time() - t).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restart_clears_terminal() {
        let demo = DemoConfig::Kinematics(DemoSetup::new(
            KinematicsParams {
                track_length: 0.1,
                ..KinematicsParams::default()
            },
            KinematicsInitial::default(),
        ));
        let mut engine = engine(demo);
        engine.step_substeps(1000).unwrap();
        assert!(engine.terminal().is_some());

        engine.restart();
        assert_eq!(engine.run_state(), RunState::Idle);
        assert!(engine.terminal().is_none());
        assert!(engine.time().abs() < f64::EPSILON);
        assert_eq!(engine.history().table.len(), 1);
    }

    #[test]
    fn test_reset_switches_demo() {
        let mut engine = engine(DemoConfig::default());
        engine.start();
        engine.tick(0.05).unwrap();

        engine.reset(DemoConfig::Disk(DemoSetup::default())).unwrap();
        assert_eq!(engine.demo().name(), "disk");
        assert_eq!(engine.run_state(), RunState::Idle);
        assert!(engine.time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_rejects_invalid_and_keeps_demo() {
        let mut engine = engine(DemoConfig::default());
        let bad = DemoConfig::Kinematics(DemoSetup::new(
            KinematicsParams {
                track_length: -1.0,
                ..KinematicsParams::default()
            },
            KinematicsInitial::default(),
        ));
        assert!(engine.reset(bad).is_err());
        assert_eq!(engine.demo().name(), "pendulum");
    }

    #[test]
    fn test_time_scale_multiplies_substeps() {
        let config = SimConfig::builder().time_scale(2.0).build();
        let mut engine = SimEngine::new(config).unwrap();
        engine.start();
        let report = engine.tick(1.0 / 60.0).unwrap();
        assert_eq!(report.substeps, 8);
    }
}
