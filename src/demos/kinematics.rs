//! Straight-line motion with constant acceleration.
//!
//! Presets cover uniform, uniformly accelerated and uniformly decelerated
//! motion; `custom` takes the acceleration and launch velocity from the
//! configuration. The integrated state is compared against
//! `x(t) = x0 + v0·t + ½·a·t²` at every sample.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::PhaseState;
use crate::error::{require_finite, require_positive, SimError, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 0.05;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 1200;

/// Motion preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionPreset {
    /// `a = 0`, `v0 = 2 m/s`.
    #[default]
    Uniform,
    /// `a = 0.8 m/s²`, `v0 = 0.5 m/s`.
    Accelerated,
    /// `a = -0.8 m/s²`, `v0 = 4 m/s`.
    Decelerated,
    /// Acceleration and velocity from the configuration.
    Custom,
}

impl MotionPreset {
    /// `(acceleration, launch velocity)` of a fixed preset.
    #[must_use]
    pub const fn motion(self) -> Option<(f64, f64)> {
        match self {
            Self::Uniform => Some((0.0, 2.0)),
            Self::Accelerated => Some((0.8, 0.5)),
            Self::Decelerated => Some((-0.8, 4.0)),
            Self::Custom => None,
        }
    }
}

/// Kinematics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct KinematicsParams {
    /// Motion preset.
    pub preset: MotionPreset,
    /// Acceleration for the custom preset (m/s²).
    pub acceleration: f64,
    /// Track length (m).
    pub track_length: f64,
}

impl Default for KinematicsParams {
    fn default() -> Self {
        Self {
            preset: MotionPreset::Uniform,
            acceleration: 0.0,
            track_length: 20.0,
        }
    }
}

impl KinematicsParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive track length or a
    /// non-finite acceleration.
    pub fn check(&self) -> SimResult<()> {
        require_positive("track_length", self.track_length)?;
        require_finite("acceleration", self.acceleration)?;
        Ok(())
    }
}

/// Launch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KinematicsInitial {
    /// Start position (m).
    pub position: f64,
    /// Launch velocity for the custom preset (m/s).
    pub velocity: f64,
}

impl Default for KinematicsInitial {
    fn default() -> Self {
        Self {
            position: 0.0,
            velocity: 2.0,
        }
    }
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KinematicsSample {
    /// Time (s).
    pub t: f64,
    /// Position (m).
    pub position: f64,
    /// Velocity (m/s).
    pub velocity: f64,
    /// Closed-form position (m).
    pub analytical_position: f64,
}

impl SampleRecord for KinematicsSample {
    const FIELDS: &'static [&'static str] =
        &["t_s", "position_m", "velocity_m_s", "analytical_position_m"];

    fn values(&self) -> Vec<f64> {
        vec![self.t, self.position, self.velocity, self.analytical_position]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KinematicsSnapshot {
    /// Time (s).
    pub t: f64,
    /// Active preset.
    pub preset: MotionPreset,
    /// Position (m).
    pub position: f64,
    /// Velocity (m/s).
    pub velocity: f64,
    /// Acceleration (m/s²).
    pub acceleration: f64,
    /// Closed-form position (m).
    pub analytical_position: f64,
    /// Closed-form velocity (m/s).
    pub analytical_velocity: f64,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Constant-acceleration motion simulation.
#[derive(Debug, Clone)]
pub struct Kinematics {
    params: KinematicsParams,
    initial: KinematicsInitial,
    acceleration: f64,
    launch_velocity: f64,
    state: PhaseState<f64>,
    t: f64,
    history: HistoryBuffer<KinematicsSample>,
    terminal: Option<Terminal>,
}

impl Kinematics {
    /// Create the body at its start position.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or a start
    /// position off the track.
    pub fn new(params: KinematicsParams, initial: KinematicsInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.velocity", initial.velocity)?;
        if !(0.0..=params.track_length).contains(&initial.position) {
            return Err(SimError::invalid_parameter(
                "initial.position",
                initial.position,
                "must lie on the track",
            ));
        }

        let (acceleration, launch_velocity) = params
            .preset
            .motion()
            .unwrap_or((params.acceleration, initial.velocity));
        let mut demo = Self {
            params,
            initial,
            acceleration,
            launch_velocity,
            state: PhaseState::new(initial.position, launch_velocity),
            t: 0.0,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        demo.reset();
        Ok(demo)
    }

    /// Current position/velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Resolved acceleration (m/s²).
    #[must_use]
    pub const fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Closed-form position at `t` (m).
    #[must_use]
    pub fn analytical_position(&self, t: f64) -> f64 {
        self.initial.position + self.launch_velocity * t + 0.5 * self.acceleration * t * t
    }

    /// Closed-form velocity at `t` (m/s).
    #[must_use]
    pub fn analytical_velocity(&self, t: f64) -> f64 {
        self.launch_velocity + self.acceleration * t
    }

    fn sample(&self) -> KinematicsSample {
        KinematicsSample {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            analytical_position: self.analytical_position(self.t),
        }
    }
}

impl PhysicsDemo for Kinematics {
    type Snapshot = KinematicsSnapshot;
    type Sample = KinematicsSample;

    fn name(&self) -> &'static str {
        "kinematics"
    }

    fn native_substep(&self) -> f64 {
        SUBSTEP
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn step(&mut self, dt: f64) {
        if self.terminal.is_some() {
            return;
        }

        let a = self.acceleration;
        self.state = IntegratorType::SemiImplicitEuler.step(self.state, self.t, dt, |_, _| a);
        self.t += dt;

        let length = self.params.track_length;
        if !(0.0..=length).contains(&self.state.position) {
            self.state.position = self.state.position.clamp(0.0, length);
            self.state.velocity = 0.0;
            self.terminal = Some(Terminal::TrackEnd);
            tracing::warn!(t = self.t, x = self.state.position, "body left the track");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> KinematicsSnapshot {
        KinematicsSnapshot {
            t: self.t,
            preset: self.params.preset,
            position: self.state.position,
            velocity: self.state.velocity,
            acceleration: self.acceleration,
            analytical_position: self.analytical_position(self.t),
            analytical_velocity: self.analytical_velocity(self.t),
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<KinematicsSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("position", self.state.position),
            ("velocity", self.state.velocity),
        ]
    }

    fn reset(&mut self) {
        self.state = PhaseState::new(self.initial.position, self.launch_velocity);
        self.t = 0.0;
        self.terminal = None;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(preset: MotionPreset) -> Kinematics {
        let params = KinematicsParams {
            preset,
            ..KinematicsParams::default()
        };
        Kinematics::new(params, KinematicsInitial::default()).unwrap()
    }

    fn run(demo: &mut Kinematics, seconds: f64) {
        let n = (seconds / SUBSTEP).round() as usize;
        for _ in 0..n {
            demo.step(SUBSTEP);
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = KinematicsParams {
            track_length: 0.0,
            ..KinematicsParams::default()
        };
        assert!(Kinematics::new(params, KinematicsInitial::default()).is_err());

        let initial = KinematicsInitial {
            position: 25.0,
            velocity: 0.0,
        };
        assert!(Kinematics::new(KinematicsParams::default(), initial).is_err());
    }

    #[test]
    fn test_uniform_motion_is_exact() {
        let mut demo = preset(MotionPreset::Uniform);
        run(&mut demo, 3.0);
        assert!((demo.state().position - 6.0).abs() < 1e-9);
        assert!((demo.state().velocity - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accelerated_matches_closed_form() {
        let mut demo = preset(MotionPreset::Accelerated);
        run(&mut demo, 4.0);
        let snap = demo.snapshot();
        assert!((snap.velocity - snap.analytical_velocity).abs() < 1e-9);
        // semi-implicit Euler leads by a·t·dt/2
        let bound = 0.8 * 4.0 * SUBSTEP;
        assert!((snap.position - snap.analytical_position).abs() < bound);
    }

    #[test]
    fn test_decelerated_reverses_and_leaves_track() {
        let mut demo = preset(MotionPreset::Decelerated);
        run(&mut demo, 5.0);
        assert!(demo.state().velocity.abs() < 1e-9);
        assert!((demo.state().position - 10.0).abs() < 0.02);

        run(&mut demo, 6.0);
        assert_eq!(demo.terminal(), Some(Terminal::TrackEnd));
        assert!(demo.state().position.abs() < f64::EPSILON);
        assert!((demo.time() - 10.0).abs() < 0.05);
    }

    #[test]
    fn test_custom_uses_configured_motion() {
        let params = KinematicsParams {
            preset: MotionPreset::Custom,
            acceleration: 1.5,
            track_length: 20.0,
        };
        let initial = KinematicsInitial {
            position: 1.0,
            velocity: 0.0,
        };
        let demo = Kinematics::new(params, initial).unwrap();
        assert!((demo.acceleration() - 1.5).abs() < f64::EPSILON);
        assert!((demo.analytical_position(2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_preset_ignores_custom_fields() {
        let params = KinematicsParams {
            preset: MotionPreset::Accelerated,
            acceleration: 9.0,
            track_length: 20.0,
        };
        let demo = Kinematics::new(params, KinematicsInitial::default()).unwrap();
        assert!((demo.acceleration() - 0.8).abs() < f64::EPSILON);
        assert!((demo.state().velocity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_sampling() {
        let mut demo = preset(MotionPreset::Uniform);
        run(&mut demo, 1.0);
        let table = demo.history().export();
        assert_eq!(table.len(), 21);
        let x = table.column("position_m").unwrap();
        let xa = table.column("analytical_position_m").unwrap();
        for (a, b) in x.iter().zip(&xa) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
