//! Block on an inclined plane pushed by a constant force.
//!
//! The x axis runs up the slope from the bottom of the track.
//!
//! ```text
//! N       = m·g·cos θ + N_extra
//! F_drive = F_applied - m·g·sin θ
//! a       = (F_drive - F_friction) / m
//! ```
//!
//! Friction is resolved with the static/kinetic policy of
//! [`crate::domains::friction`], including stick-point settling. The block
//! halts with [`Terminal::TrackEnd`] when it leaves `[0, L]`. With
//! `θ = 0` this is the horizontal constant-force demo.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::friction::{resolve, settles, FrictionCoefficients, FrictionResolution};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::PhaseState;
use crate::error::{require_finite, require_non_negative, require_positive, SimError, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 0.1;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 2000;
/// Phase transitions kept for display.
pub const TRANSITION_CAPACITY: usize = 64;

/// Inclined block parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct InclinedBlockParams {
    /// Block mass (kg).
    pub mass: f64,
    /// Applied force along the slope, positive uphill (N).
    pub applied_force: f64,
    /// Friction coefficients between block and plane.
    #[validate(nested)]
    pub friction: FrictionCoefficients,
    /// Slope angle (deg).
    #[validate(range(min = -90.0, max = 90.0))]
    pub angle_deg: f64,
    /// Additional load pressing the block onto the plane (N).
    pub extra_normal_load: f64,
    /// Track length (m).
    pub track_length: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for InclinedBlockParams {
    fn default() -> Self {
        Self {
            mass: 5.0,
            applied_force: 80.0,
            friction: FrictionCoefficients::new(0.25, 0.2),
            angle_deg: 0.0,
            extra_normal_load: 0.0,
            track_length: 20.0,
            gravity: 9.81,
        }
    }
}

impl InclinedBlockParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive mass or track length,
    /// negative gravity or extra load, or `μs < μk`.
    pub fn check(&self) -> SimResult<()> {
        require_positive("mass", self.mass)?;
        require_positive("track_length", self.track_length)?;
        require_non_negative("gravity", self.gravity)?;
        require_non_negative("extra_normal_load", self.extra_normal_load)?;
        require_finite("applied_force", self.applied_force)?;
        self.friction.check("friction")
    }
}

/// Inclined block initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InclinedBlockInitial {
    /// Distance from the bottom of the track (m).
    pub position: f64,
    /// Velocity along the slope (m/s).
    pub velocity: f64,
}

/// Forces acting on the block, recomputed from state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockForces {
    /// Normal force (N).
    pub normal: f64,
    /// Applied force minus the gravity component along the slope (N).
    pub driving: f64,
    /// Friction resolution.
    pub friction: FrictionResolution,
    /// Resulting acceleration (m/s²).
    pub acceleration: f64,
}

/// Start or stop of sliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseChange {
    /// Static friction was overcome.
    Started,
    /// The block came to rest.
    Stopped,
}

/// Recorded phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Time of the transition (s).
    pub t: f64,
    /// Kind of transition.
    pub change: PhaseChange,
    /// Position at the transition (m).
    pub position: f64,
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockSample {
    /// Time (s).
    pub t: f64,
    /// Position (m).
    pub position: f64,
    /// Velocity (m/s).
    pub velocity: f64,
    /// Acceleration (m/s²).
    pub acceleration: f64,
    /// Friction force (N).
    pub friction: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
}

impl SampleRecord for BlockSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "position_m",
        "velocity_m_s",
        "acceleration_m_s2",
        "friction_n",
        "kinetic_energy_j",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.position,
            self.velocity,
            self.acceleration,
            self.friction,
            self.kinetic_energy,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSnapshot {
    /// Time (s).
    pub t: f64,
    /// Position (m).
    pub position: f64,
    /// Velocity (m/s).
    pub velocity: f64,
    /// Forces at this instant.
    pub forces: BlockForces,
    /// Net force (N).
    pub net_force: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Work done against friction (J).
    pub friction_work: f64,
    /// Work done by the applied force (J).
    pub applied_work: f64,
    /// Constant-acceleration prediction from the initial state (m).
    pub analytical_position: f64,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Inclined block simulation.
#[derive(Debug, Clone)]
pub struct InclinedBlock {
    params: InclinedBlockParams,
    initial: InclinedBlockInitial,
    angle: f64,
    state: PhaseState<f64>,
    t: f64,
    friction_work: f64,
    applied_work: f64,
    initial_acceleration: f64,
    sliding: bool,
    transitions: HistoryBuffer<PhaseTransition>,
    history: HistoryBuffer<BlockSample>,
    terminal: Option<Terminal>,
}

impl InclinedBlock {
    /// Create a block at its initial conditions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or an initial
    /// position outside the track.
    pub fn new(params: InclinedBlockParams, initial: InclinedBlockInitial) -> SimResult<Self> {
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

        let mut block = Self {
            angle: params.angle_deg.to_radians(),
            params,
            initial,
            state: PhaseState::new(initial.position, initial.velocity),
            t: 0.0,
            friction_work: 0.0,
            applied_work: 0.0,
            initial_acceleration: 0.0,
            sliding: false,
            transitions: HistoryBuffer::new(TRANSITION_CAPACITY, 0.0),
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        block.reset();
        Ok(block)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &InclinedBlockParams {
        &self.params
    }

    /// Current position/velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Force model for a given velocity.
    #[must_use]
    pub fn forces_at(&self, velocity: f64) -> BlockForces {
        let p = &self.params;
        let normal = p.mass * p.gravity * self.angle.cos() + p.extra_normal_load;
        let driving = p.applied_force - p.mass * p.gravity * self.angle.sin();
        let friction = resolve(
            driving,
            normal,
            velocity,
            p.friction.mu_static,
            p.friction.mu_kinetic,
        );
        BlockForces {
            normal,
            driving,
            friction,
            acceleration: friction.net(driving) / p.mass,
        }
    }

    /// Forces at the current state.
    #[must_use]
    pub fn forces(&self) -> BlockForces {
        self.forces_at(self.state.velocity)
    }

    /// Constant-acceleration position predicted from the initial state.
    #[must_use]
    pub fn analytical_position(&self, t: f64) -> f64 {
        self.initial.position + self.initial.velocity * t + 0.5 * self.initial_acceleration * t * t
    }

    /// Recorded start/stop events, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &PhaseTransition> + '_ {
        self.transitions.iter()
    }

    /// Work done against friction (J).
    #[must_use]
    pub const fn friction_work(&self) -> f64 {
        self.friction_work
    }

    fn kinetic_energy(&self) -> f64 {
        0.5 * self.params.mass * self.state.velocity * self.state.velocity
    }

    fn sample(&self) -> BlockSample {
        let forces = self.forces();
        BlockSample {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            acceleration: forces.acceleration,
            friction: forces.friction.force,
            kinetic_energy: self.kinetic_energy(),
        }
    }

    fn record_transition(&mut self, sliding: bool) {
        if sliding == self.sliding {
            return;
        }
        self.sliding = sliding;
        let change = if sliding {
            PhaseChange::Started
        } else {
            PhaseChange::Stopped
        };
        tracing::debug!(t = self.t, x = self.state.position, ?change, "block phase change");
        self.transitions.record(
            self.t,
            PhaseTransition {
                t: self.t,
                change,
                position: self.state.position,
            },
        );
    }
}

impl PhysicsDemo for InclinedBlock {
    type Snapshot = BlockSnapshot;
    type Sample = BlockSample;

    fn name(&self) -> &'static str {
        "inclined-block"
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

        let mut forces = self.forces();
        if !forces.friction.is_static
            && settles(
                self.state.velocity,
                forces.acceleration,
                dt,
                forces.driving,
                self.params.friction.max_static(forces.normal),
            )
        {
            self.state.velocity = 0.0;
            forces = self.forces_at(0.0);
        }
        if forces.friction.is_static {
            self.state.velocity = 0.0;
        }

        let a = forces.acceleration;
        let x0 = self.state.position;
        self.state = IntegratorType::SemiImplicitEuler.step(self.state, self.t, dt, |_, _| a);
        self.t += dt;

        let dx = self.state.position - x0;
        if !forces.friction.is_static {
            self.friction_work += (forces.friction.force * dx).abs();
        }
        self.applied_work += self.params.applied_force * dx;
        self.record_transition(!forces.friction.is_static);

        let length = self.params.track_length;
        if self.state.position > length || self.state.position < 0.0 {
            self.state.position = self.state.position.clamp(0.0, length);
            self.state.velocity = 0.0;
            self.terminal = Some(Terminal::TrackEnd);
            tracing::warn!(t = self.t, x = self.state.position, "block reached end of track");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> BlockSnapshot {
        let forces = self.forces();
        BlockSnapshot {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            net_force: forces.acceleration * self.params.mass,
            forces,
            kinetic_energy: self.kinetic_energy(),
            friction_work: self.friction_work,
            applied_work: self.applied_work,
            analytical_position: self.analytical_position(self.t),
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<BlockSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("position", self.state.position),
            ("velocity", self.state.velocity),
        ]
    }

    fn reset(&mut self) {
        self.state = PhaseState::new(self.initial.position, self.initial.velocity);
        self.t = 0.0;
        self.friction_work = 0.0;
        self.applied_work = 0.0;
        self.terminal = None;
        let forces = self.forces();
        self.initial_acceleration = forces.acceleration;
        self.sliding = !forces.friction.is_static;
        self.transitions.clear();
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope(angle_deg: f64, mu_s: f64, mu_k: f64) -> InclinedBlockParams {
        InclinedBlockParams {
            mass: 2.0,
            applied_force: 0.0,
            friction: FrictionCoefficients::new(mu_s, mu_k),
            angle_deg,
            extra_normal_load: 0.0,
            track_length: 10.0,
            gravity: 9.81,
        }
    }

    fn mid_track() -> InclinedBlockInitial {
        InclinedBlockInitial {
            position: 5.0,
            velocity: 0.0,
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut p = InclinedBlockParams::default();
        p.mass = 0.0;
        assert!(InclinedBlock::new(p, InclinedBlockInitial::default()).is_err());

        let mut p = InclinedBlockParams::default();
        p.friction = FrictionCoefficients::new(0.1, 0.2);
        assert!(InclinedBlock::new(p, InclinedBlockInitial::default()).is_err());

        let mut p = InclinedBlockParams::default();
        p.angle_deg = 120.0;
        assert!(InclinedBlock::new(p, InclinedBlockInitial::default()).is_err());

        let init = InclinedBlockInitial {
            position: 50.0,
            velocity: 0.0,
        };
        assert!(InclinedBlock::new(InclinedBlockParams::default(), init).is_err());
    }

    #[test]
    fn test_horizontal_push_matches_analytical() {
        // F = 80 N, m = 5 kg, μk = 0.2: a = (80 - 0.2·5·9.81)/5
        let mut block =
            InclinedBlock::new(InclinedBlockParams::default(), InclinedBlockInitial::default())
                .unwrap();
        let expected_a = (80.0 - 0.2 * 5.0 * 9.81) / 5.0;
        assert!((block.forces().acceleration - expected_a).abs() < 1e-12);

        for _ in 0..240 {
            block.step(SUBSTEP);
        }
        let snap = block.snapshot();
        // semi-implicit Euler overshoots by a·t·dt/2
        assert!((snap.position - snap.analytical_position).abs() < expected_a * SUBSTEP);
        assert!((snap.velocity - expected_a).abs() < 1e-9);
    }

    #[test]
    fn test_static_lock_holds_exactly() {
        let angle = 20.0_f64;
        let mu_s = angle.to_radians().tan() + 0.01;
        let mut block = InclinedBlock::new(slope(angle, mu_s, mu_s * 0.8), mid_track()).unwrap();
        for _ in 0..10_000 {
            block.step(SUBSTEP);
        }
        let s = block.state();
        assert_eq!(s.velocity, 0.0);
        assert_eq!(s.position, 5.0);
        assert!(block.snapshot().forces.friction.is_static);
    }

    #[test]
    fn test_breakaway_below_tan_theta() {
        let angle = 20.0_f64;
        let mu_s = angle.to_radians().tan() - 0.01;
        let mut block = InclinedBlock::new(slope(angle, mu_s, mu_s * 0.8), mid_track()).unwrap();
        let before = block.snapshot();
        assert!(!before.forces.friction.is_static);
        // slides downhill
        assert!(before.forces.acceleration < 0.0);

        block.step(SUBSTEP);
        assert!(block.state().velocity < 0.0);
        // sliding from the first instant, so no start event is logged
        assert!(block.transitions().next().is_none());
    }

    #[test]
    fn test_settles_instead_of_oscillating() {
        // sliding uphill on a grippy slope decelerates and sticks
        let params = slope(10.0, 0.6, 0.5);
        let init = InclinedBlockInitial {
            position: 1.0,
            velocity: 2.0,
        };
        let mut block = InclinedBlock::new(params, init).unwrap();
        for _ in 0..2400 {
            block.step(SUBSTEP);
        }
        assert_eq!(block.state().velocity, 0.0);
        let stops: Vec<_> = block
            .transitions()
            .filter(|t| t.change == PhaseChange::Stopped)
            .collect();
        assert_eq!(stops.len(), 1);
        // position no longer changes once stuck
        let x = block.state().position;
        block.step(SUBSTEP);
        assert_eq!(block.state().position, x);
    }

    #[test]
    fn test_friction_work_matches_kinetic_loss() {
        let params = slope(0.0, 0.5, 0.4);
        let init = InclinedBlockInitial {
            position: 1.0,
            velocity: 3.0,
        };
        let mut block = InclinedBlock::new(params, init).unwrap();
        let e0 = 0.5 * 2.0 * 9.0;
        for _ in 0..2400 {
            block.step(SUBSTEP);
        }
        assert_eq!(block.state().velocity, 0.0);
        // all kinetic energy went into friction, up to one step of slack
        assert!((block.friction_work() - e0).abs() / e0 < 0.02);
    }

    #[test]
    fn test_end_of_track_is_terminal() {
        let mut block =
            InclinedBlock::new(InclinedBlockParams::default(), InclinedBlockInitial::default())
                .unwrap();
        let mut steps = 0;
        while block.terminal().is_none() && steps < 100_000 {
            block.step(SUBSTEP);
            steps += 1;
        }
        assert_eq!(block.terminal(), Some(Terminal::TrackEnd));
        assert!((block.state().position - 20.0).abs() < 1e-12);
        assert_eq!(block.state().velocity, 0.0);

        let t = block.time();
        block.step(SUBSTEP);
        assert!((block.time() - t).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut block =
            InclinedBlock::new(InclinedBlockParams::default(), InclinedBlockInitial::default())
                .unwrap();
        for _ in 0..500 {
            block.step(SUBSTEP);
        }
        assert!(block.history().len() > 1);
        block.reset();
        assert!(block.time().abs() < f64::EPSILON);
        assert_eq!(block.history().len(), 1);
        assert!(block.friction_work().abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_sampled_every_tenth_second() {
        let mut block =
            InclinedBlock::new(InclinedBlockParams::default(), InclinedBlockInitial::default())
                .unwrap();
        for _ in 0..240 {
            block.step(SUBSTEP);
        }
        // t = 0, 0.1, ..., 1.0
        assert_eq!(block.history().len(), 11);
        assert_eq!(BlockSample::FIELDS.len(), block.history().first().unwrap().values().len());
    }
}
