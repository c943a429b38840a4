//! Atwood machine with both masses resting on inclines.
//!
//! A single rope over a massive pulley joins `m1` on the left incline and
//! `m2` on the right one. The coordinate `s` is the rope displacement,
//! positive when `m1` moves down its slope.
//!
//! ```text
//! F_drive = m1·g·sin α1 - m2·g·sin α2
//! M_eff   = m1 + m2 + ½·M_pulley          (I = ½·M·R², rope does not slip)
//! F_axle  = μ_axle·(m1 + m2)·g·0.1
//! ```
//!
//! Static limit and kinetic friction are summed over both inclines plus the
//! axle term and resolved as one contact. The reported friction on each
//! incline is the total weighted by that incline's share of the normal
//! force.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::friction::{
    resolve_with_limits, settles, FrictionCoefficients, FrictionResolution,
};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::PhaseState;
use crate::error::{require_finite, require_non_negative, require_positive, SimError, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 0.1;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 800;
/// Fraction of the total weight loading the pulley axle.
pub const AXLE_LOAD_FACTOR: f64 = 0.1;

/// Atwood machine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct AtwoodParams {
    /// Mass on the left incline (kg).
    pub m1: f64,
    /// Mass on the right incline (kg).
    pub m2: f64,
    /// Left incline angle (deg).
    #[validate(range(min = 0.0, max = 90.0))]
    pub alpha1_deg: f64,
    /// Right incline angle (deg).
    #[validate(range(min = 0.0, max = 90.0))]
    pub alpha2_deg: f64,
    /// Friction between `m1` and its incline.
    #[validate(nested)]
    pub friction1: FrictionCoefficients,
    /// Friction between `m2` and its incline.
    #[validate(nested)]
    pub friction2: FrictionCoefficients,
    /// Pulley mass (kg).
    pub pulley_mass: f64,
    /// Pulley radius (m).
    pub pulley_radius: f64,
    /// Axle friction coefficient.
    pub axle_friction: f64,
    /// Maximum rope travel either way before a mass reaches the pulley (m).
    pub travel_limit: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for AtwoodParams {
    fn default() -> Self {
        Self {
            m1: 6.0,
            m2: 2.0,
            alpha1_deg: 30.0,
            alpha2_deg: 10.0,
            friction1: FrictionCoefficients::new(0.195, 0.15),
            friction2: FrictionCoefficients::new(0.156, 0.12),
            pulley_mass: 1.5,
            pulley_radius: 0.06,
            axle_friction: 0.05,
            travel_limit: 2.5,
            gravity: 9.81,
        }
    }
}

impl AtwoodParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive masses, radius or
    /// travel limit, negative pulley mass or axle friction, or `μs < μk` on
    /// either incline.
    pub fn check(&self) -> SimResult<()> {
        require_positive("m1", self.m1)?;
        require_positive("m2", self.m2)?;
        require_positive("pulley_radius", self.pulley_radius)?;
        require_positive("travel_limit", self.travel_limit)?;
        require_non_negative("pulley_mass", self.pulley_mass)?;
        require_non_negative("axle_friction", self.axle_friction)?;
        require_non_negative("gravity", self.gravity)?;
        self.friction1.check("friction1")?;
        self.friction2.check("friction2")
    }

    /// Translational mass including the pulley's rotational inertia (kg).
    #[must_use]
    pub fn effective_mass(&self) -> f64 {
        self.m1 + self.m2 + 0.5 * self.pulley_mass
    }

    /// Axle friction magnitude (N).
    #[must_use]
    pub fn axle_force(&self) -> f64 {
        self.axle_friction * (self.m1 + self.m2) * self.gravity * AXLE_LOAD_FACTOR
    }
}

/// Initial rope state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtwoodInitial {
    /// Rope displacement (m).
    pub position: f64,
    /// Rope velocity (m/s).
    pub velocity: f64,
}

/// Force breakdown at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtwoodForces {
    /// Normal force on the left incline (N).
    pub normal1: f64,
    /// Normal force on the right incline (N).
    pub normal2: f64,
    /// Net gravitational pull along the rope (N).
    pub driving: f64,
    /// Combined friction resolution.
    pub friction: FrictionResolution,
    /// Friction attributed to the left incline (N).
    pub friction1: f64,
    /// Friction attributed to the right incline (N).
    pub friction2: f64,
    /// Rope acceleration (m/s²).
    pub acceleration: f64,
    /// Rope tension on the `m1` side (N).
    pub tension: f64,
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtwoodSample {
    /// Time (s).
    pub t: f64,
    /// Rope displacement (m).
    pub position: f64,
    /// Rope velocity (m/s).
    pub velocity: f64,
    /// Rope acceleration (m/s²).
    pub acceleration: f64,
    /// Rope tension (N).
    pub tension: f64,
    /// 1 when held by static friction.
    pub is_static: f64,
}

impl SampleRecord for AtwoodSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "position_m",
        "velocity_m_s",
        "acceleration_m_s2",
        "tension_n",
        "is_static",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.position,
            self.velocity,
            self.acceleration,
            self.tension,
            self.is_static,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtwoodSnapshot {
    /// Time (s).
    pub t: f64,
    /// Rope displacement (m).
    pub position: f64,
    /// Rope velocity (m/s).
    pub velocity: f64,
    /// Forces at this instant.
    pub forces: AtwoodForces,
    /// Pulley rotation (rad).
    pub pulley_angle: f64,
    /// Whether the system is held by static friction.
    pub is_static: bool,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Atwood machine simulation.
#[derive(Debug, Clone)]
pub struct Atwood {
    params: AtwoodParams,
    initial: AtwoodInitial,
    alpha1: f64,
    alpha2: f64,
    state: PhaseState<f64>,
    t: f64,
    is_static: bool,
    history: HistoryBuffer<AtwoodSample>,
    terminal: Option<Terminal>,
}

impl Atwood {
    /// Create the machine at its initial state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or an initial
    /// displacement beyond the travel limit.
    pub fn new(params: AtwoodParams, initial: AtwoodInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.velocity", initial.velocity)?;
        if initial.position.abs() > params.travel_limit {
            return Err(SimError::invalid_parameter(
                "initial.position",
                initial.position,
                "must lie within the travel limit",
            ));
        }

        let mut demo = Self {
            alpha1: params.alpha1_deg.to_radians(),
            alpha2: params.alpha2_deg.to_radians(),
            params,
            initial,
            state: PhaseState::new(initial.position, initial.velocity),
            t: 0.0,
            is_static: false,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        demo.reset();
        Ok(demo)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &AtwoodParams {
        &self.params
    }

    /// Current rope displacement/velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Whether the last step was held by static friction.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Pulley rotation for the current displacement (rad).
    #[must_use]
    pub fn pulley_angle(&self) -> f64 {
        self.state.position / self.params.pulley_radius
    }

    /// Force model for a given rope velocity.
    #[must_use]
    pub fn forces_at(&self, velocity: f64) -> AtwoodForces {
        let p = &self.params;
        let g = p.gravity;
        let normal1 = p.m1 * g * self.alpha1.cos();
        let normal2 = p.m2 * g * self.alpha2.cos();
        let driving = p.m1 * g * self.alpha1.sin() - p.m2 * g * self.alpha2.sin();

        let axle = p.axle_force();
        let max_static = p.friction1.max_static(normal1) + p.friction2.max_static(normal2) + axle;
        let kinetic = p.friction1.kinetic(normal1) + p.friction2.kinetic(normal2) + axle;
        let friction = resolve_with_limits(driving, velocity, max_static, kinetic);

        let total_normal = normal1 + normal2;
        let share1 = if total_normal > 0.0 {
            normal1 / total_normal
        } else {
            0.5
        };
        let friction1 = friction.force * share1;
        let friction2 = friction.force - friction1;

        let acceleration = friction.net(driving) / p.effective_mass();
        let tension = (p.m1 * g * self.alpha1.sin() - friction1 - p.m1 * acceleration).max(0.0);

        AtwoodForces {
            normal1,
            normal2,
            driving,
            friction,
            friction1,
            friction2,
            acceleration,
            tension,
        }
    }

    /// Forces at the current state.
    #[must_use]
    pub fn forces(&self) -> AtwoodForces {
        self.forces_at(self.state.velocity)
    }

    fn sample(&self) -> AtwoodSample {
        let forces = self.forces();
        AtwoodSample {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            acceleration: forces.acceleration,
            tension: forces.tension,
            is_static: if self.is_static { 1.0 } else { 0.0 },
        }
    }
}

impl PhysicsDemo for Atwood {
    type Snapshot = AtwoodSnapshot;
    type Sample = AtwoodSample;

    fn name(&self) -> &'static str {
        "atwood"
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
        if !forces.friction.is_static {
            let p = &self.params;
            let max_static = p.friction1.max_static(forces.normal1)
                + p.friction2.max_static(forces.normal2)
                + p.axle_force();
            if settles(
                self.state.velocity,
                forces.acceleration,
                dt,
                forces.driving,
                max_static,
            ) {
                self.state.velocity = 0.0;
                forces = self.forces_at(0.0);
            }
        }
        if forces.friction.is_static != self.is_static {
            tracing::debug!(
                t = self.t,
                is_static = forces.friction.is_static,
                "atwood friction regime change"
            );
        }
        self.is_static = forces.friction.is_static;
        if self.is_static {
            self.state.velocity = 0.0;
        }

        let a = forces.acceleration;
        self.state = IntegratorType::SemiImplicitEuler.step(self.state, self.t, dt, |_, _| a);
        self.t += dt;

        let limit = self.params.travel_limit;
        if self.state.position.abs() > limit {
            self.state.position = self.state.position.clamp(-limit, limit);
            self.state.velocity = 0.0;
            self.terminal = Some(Terminal::ReachedPulley);
            tracing::warn!(t = self.t, s = self.state.position, "mass reached the pulley");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> AtwoodSnapshot {
        AtwoodSnapshot {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            forces: self.forces(),
            pulley_angle: self.pulley_angle(),
            is_static: self.is_static,
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<AtwoodSample> {
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
        self.terminal = None;
        self.is_static = self.forces().friction.is_static;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}
