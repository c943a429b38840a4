//! Damped, driven simple pendulum.
//!
//! ```text
//! θ'' = -(g/L)·sin θ - 2β·θ' + A·sin(2π·f·t) / (m·L²)
//! ```
//!
//! Integrated with RK4 by default; the angle is wrapped into `(-π, π]`
//! after every substep for the phase portrait. Critical damping
//! `β_crit = √(g/L)` can be selected instead of an explicit β.
//!
//! # References
//!
//! Taylor, "Classical Mechanics," University Science Books, 2005, ch. 12.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::{wrap_angle, PhaseState};
use crate::error::{require_finite, require_non_negative, require_positive, SimResult};

/// Standard gravity (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.806_65;
/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 1.0 / 60.0;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 1200;
/// Phase-portrait capacity.
pub const PHASE_CAPACITY: usize = 2000;

/// Pendulum parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct PendulumParams {
    /// Rod length (m).
    pub length: f64,
    /// Bob mass (kg).
    pub mass: f64,
    /// Damping coefficient β (1/s).
    #[validate(range(min = 0.0))]
    pub damping: f64,
    /// Use `β = √(g/L)` instead of `damping`.
    pub critical_damping: bool,
    /// Drive torque amplitude (N·m).
    pub drive_amplitude: f64,
    /// Drive frequency (Hz).
    #[validate(range(min = 0.0))]
    pub drive_frequency: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
    /// Integration method.
    pub integrator: IntegratorType,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            mass: 1.0,
            damping: 0.15,
            critical_damping: false,
            drive_amplitude: 0.0,
            drive_frequency: 1.2,
            gravity: STANDARD_GRAVITY,
            integrator: IntegratorType::Rk4,
        }
    }
}

impl PendulumParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive length, mass or
    /// gravity, or negative damping.
    pub fn check(&self) -> SimResult<()> {
        require_positive("length", self.length)?;
        require_positive("mass", self.mass)?;
        require_positive("gravity", self.gravity)?;
        require_non_negative("damping", self.damping)?;
        require_non_negative("drive_frequency", self.drive_frequency)?;
        require_finite("drive_amplitude", self.drive_amplitude)?;
        Ok(())
    }

    /// Critical damping coefficient `√(g/L)`.
    #[must_use]
    pub fn critical_beta(&self) -> f64 {
        (self.gravity / self.length).sqrt()
    }

    /// Damping coefficient in effect.
    #[must_use]
    pub fn effective_damping(&self) -> f64 {
        if self.critical_damping {
            self.critical_beta()
        } else {
            self.damping
        }
    }

    /// Small-angle period `2π·√(L/g)`.
    #[must_use]
    pub fn small_angle_period(&self) -> f64 {
        TAU * (self.length / self.gravity).sqrt()
    }
}

/// Pendulum initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PendulumInitial {
    /// Initial angle from the downward vertical (deg).
    pub theta_deg: f64,
    /// Initial angular velocity (rad/s).
    pub omega: f64,
}

impl Default for PendulumInitial {
    fn default() -> Self {
        Self {
            theta_deg: 20.0,
            omega: 0.0,
        }
    }
}

/// Damping regime relative to critical damping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DampingRegime {
    /// No damping.
    Undamped,
    /// `β < β_crit`.
    Underdamped,
    /// `β = β_crit` (within 0.1%).
    Critical,
    /// `β > β_crit`.
    Overdamped,
}

/// Point in the (θ, ω) phase plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasePoint {
    /// Angle (rad).
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendulumSample {
    /// Time (s).
    pub t: f64,
    /// Angle (rad).
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Potential energy (J).
    pub potential_energy: f64,
    /// Total mechanical energy (J).
    pub total_energy: f64,
}

impl SampleRecord for PendulumSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "theta_rad",
        "omega_rad_s",
        "kinetic_energy_j",
        "potential_energy_j",
        "total_energy_j",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.theta,
            self.omega,
            self.kinetic_energy,
            self.potential_energy,
            self.total_energy,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendulumSnapshot {
    /// Time (s).
    pub t: f64,
    /// Angle (rad), in `(-π, π]`.
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Angular acceleration (rad/s²).
    pub alpha: f64,
    /// Instantaneous drive torque (N·m).
    pub drive_torque: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Potential energy (J).
    pub potential_energy: f64,
    /// Total mechanical energy (J).
    pub total_energy: f64,
    /// Damping coefficient in effect (1/s).
    pub damping: f64,
    /// Damping regime.
    pub regime: DampingRegime,
    /// Small-angle period (s).
    pub small_angle_period: f64,
}

/// Pendulum simulation.
#[derive(Debug, Clone)]
pub struct Pendulum {
    params: PendulumParams,
    initial: PendulumInitial,
    state: PhaseState<f64>,
    t: f64,
    phase: HistoryBuffer<PhasePoint>,
    history: HistoryBuffer<PendulumSample>,
}

impl Pendulum {
    /// Create a pendulum at its initial conditions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters.
    pub fn new(params: PendulumParams, initial: PendulumInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.theta_deg", initial.theta_deg)?;
        require_finite("initial.omega", initial.omega)?;

        let mut pendulum = Self {
            params,
            initial,
            state: PhaseState::at_rest(),
            t: 0.0,
            phase: HistoryBuffer::new(PHASE_CAPACITY, 0.0),
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
        };
        pendulum.reset();
        Ok(pendulum)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &PendulumParams {
        &self.params
    }

    /// Current angle/angular velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Phase-portrait trail, oldest first.
    #[must_use]
    pub const fn phase_portrait(&self) -> &HistoryBuffer<PhasePoint> {
        &self.phase
    }

    /// Drive torque at time `t` (N·m).
    #[must_use]
    pub fn drive_torque(&self, t: f64) -> f64 {
        self.params.drive_amplitude * (TAU * self.params.drive_frequency * t).sin()
    }

    /// Angular acceleration for a given time and state.
    #[must_use]
    pub fn angular_acceleration(&self, t: f64, state: PhaseState<f64>) -> f64 {
        let p = &self.params;
        let inertia = p.mass * p.length * p.length;
        -(p.gravity / p.length) * state.position.sin()
            - 2.0 * p.effective_damping() * state.velocity
            + self.drive_torque(t) / inertia
    }

    /// Kinetic energy `½·m·(L·ω)²` (J).
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        let v = self.params.length * self.state.velocity;
        0.5 * self.params.mass * v * v
    }

    /// Potential energy `m·g·L·(1 - cos θ)` (J).
    #[must_use]
    pub fn potential_energy(&self) -> f64 {
        let p = &self.params;
        p.mass * p.gravity * p.length * (1.0 - self.state.position.cos())
    }

    /// Total mechanical energy (J).
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }

    /// Classify the damping in effect.
    #[must_use]
    pub fn regime(&self) -> DampingRegime {
        let beta = self.params.effective_damping();
        let critical = self.params.critical_beta();
        if beta <= 0.0 {
            DampingRegime::Undamped
        } else if ((beta - critical) / critical).abs() < 1e-3 {
            DampingRegime::Critical
        } else if beta < critical {
            DampingRegime::Underdamped
        } else {
            DampingRegime::Overdamped
        }
    }

    fn sample(&self) -> PendulumSample {
        let kinetic_energy = self.kinetic_energy();
        let potential_energy = self.potential_energy();
        PendulumSample {
            t: self.t,
            theta: self.state.position,
            omega: self.state.velocity,
            kinetic_energy,
            potential_energy,
            total_energy: kinetic_energy + potential_energy,
        }
    }
}

impl PhysicsDemo for Pendulum {
    type Snapshot = PendulumSnapshot;
    type Sample = PendulumSample;

    fn name(&self) -> &'static str {
        "pendulum"
    }

    fn native_substep(&self) -> f64 {
        SUBSTEP
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn step(&mut self, dt: f64) {
        let next = self
            .params
            .integrator
            .step(self.state, self.t, dt, |t, s| self.angular_acceleration(t, s));
        self.state = PhaseState::new(wrap_angle(next.position), next.velocity);
        self.t += dt;

        self.phase.record(
            self.t,
            PhasePoint {
                theta: self.state.position,
                omega: self.state.velocity,
            },
        );
        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        None
    }

    fn snapshot(&self) -> PendulumSnapshot {
        let kinetic_energy = self.kinetic_energy();
        let potential_energy = self.potential_energy();
        PendulumSnapshot {
            t: self.t,
            theta: self.state.position,
            omega: self.state.velocity,
            alpha: self.angular_acceleration(self.t, self.state),
            drive_torque: self.drive_torque(self.t),
            kinetic_energy,
            potential_energy,
            total_energy: kinetic_energy + potential_energy,
            damping: self.params.effective_damping(),
            regime: self.regime(),
            small_angle_period: self.params.small_angle_period(),
        }
    }

    fn history(&self) -> &HistoryBuffer<PendulumSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![("theta", self.state.position), ("omega", self.state.velocity)]
    }

    fn reset(&mut self) {
        self.state = PhaseState::new(wrap_angle(self.initial.theta_deg.to_radians()), self.initial.omega);
        self.t = 0.0;
        self.phase.clear();
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}
