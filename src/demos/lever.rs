//! Rigid lever on a movable fulcrum.
//!
//! Positions are measured along the beam from its left end. A load at `x`
//! contributes the moment `(x - f)·m·g`; the beam's own weight acts at its
//! center, `(L/2 - f)·m_beam·g`. Positive moment increases the tilt `θ`.
//!
//! ```text
//! α = ΣM / I          I = I_base + Σ m_i·(x_i - f)²
//! ω ← (ω + α·dt)·d
//! θ ← θ + ω·dt
//! ```
//!
//! The per-step multiplier `d` is a display-tuned approximation rather than
//! viscous damping: its effect depends on the substep, so the demo always
//! runs at its native 1/120 s. Moments use the untilted geometry.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::friction::{resolve_with_limits, FrictionCoefficients};
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::PhaseState;
use crate::error::{require_finite, require_non_negative, require_positive, SimError, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 120.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 1.0 / 120.0;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 2000;
/// Moment below which the lever counts as balanced (N·m).
pub const BALANCE_TOLERANCE: f64 = 0.05;
/// Angular speed below which a balanced lever is put to rest (rad/s).
pub const REST_OMEGA: f64 = 1e-6;
/// Moment below which a slow lever is put to rest (N·m).
pub const REST_MOMENT: f64 = 1e-3;
/// Per-step tilt decay once at rest.
pub const REST_TILT_DECAY: f64 = 0.995;

/// Point load on the beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Load {
    /// Mass (kg).
    pub mass: f64,
    /// Distance from the left end of the beam (m).
    pub position: f64,
}

impl Load {
    /// Create a load.
    #[must_use]
    pub const fn new(mass: f64, position: f64) -> Self {
        Self { mass, position }
    }

    /// Moment about `fulcrum` under gravity `g` (N·m).
    #[must_use]
    pub fn moment(&self, fulcrum: f64, g: f64) -> f64 {
        (self.position - fulcrum) * self.mass * g
    }
}

/// Lever parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct LeverParams {
    /// Beam length (m).
    pub beam_length: f64,
    /// Beam mass (kg).
    pub beam_mass: f64,
    /// Moment of inertia of the bare beam about the fulcrum (kg·m²).
    pub base_inertia: f64,
    /// Angular velocity multiplier applied every substep, in (0, 1].
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub damping: f64,
    /// Fulcrum position from the left end (m).
    pub fulcrum: f64,
    /// Pivot friction.
    #[validate(nested)]
    pub pivot_friction: FrictionCoefficients,
    /// Pivot pin radius (m).
    pub pivot_radius: f64,
    /// Tilt at which the beam hits its stop (deg).
    #[validate(range(min = 0.0, max = 90.0))]
    pub max_tilt_deg: f64,
    /// Loads placed on the beam.
    pub loads: Vec<Load>,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for LeverParams {
    fn default() -> Self {
        Self {
            beam_length: 10.0,
            beam_mass: 2.0,
            base_inertia: 5.0,
            damping: 0.85,
            fulcrum: 5.0,
            pivot_friction: FrictionCoefficients::frictionless(),
            pivot_radius: 0.02,
            max_tilt_deg: 15.0,
            loads: vec![Load::new(10.0, 3.0), Load::new(5.0, 9.0)],
            gravity: 9.81,
        }
    }
}

impl LeverParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive beam length, inertia
    /// or tilt limit, a fulcrum or load off the beam, or a non-positive load
    /// mass.
    pub fn check(&self) -> SimResult<()> {
        require_positive("beam_length", self.beam_length)?;
        require_positive("base_inertia", self.base_inertia)?;
        require_positive("max_tilt_deg", self.max_tilt_deg)?;
        require_non_negative("beam_mass", self.beam_mass)?;
        require_non_negative("pivot_radius", self.pivot_radius)?;
        require_non_negative("gravity", self.gravity)?;
        self.on_beam("fulcrum", self.fulcrum)?;
        for load in &self.loads {
            require_positive("loads.mass", load.mass)?;
            self.on_beam("loads.position", load.position)?;
        }
        self.pivot_friction.check("pivot_friction")
    }

    fn on_beam(&self, name: &str, x: f64) -> SimResult<f64> {
        if (0.0..=self.beam_length).contains(&x) {
            Ok(x)
        } else {
            Err(SimError::invalid_parameter(name, x, "must lie on the beam"))
        }
    }
}

/// Initial tilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeverInitial {
    /// Tilt (deg).
    pub theta_deg: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeverSample {
    /// Time (s).
    pub t: f64,
    /// Tilt (rad).
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Net moment (N·m).
    pub moment: f64,
    /// Angular acceleration (rad/s²).
    pub alpha: f64,
}

impl SampleRecord for LeverSample {
    const FIELDS: &'static [&'static str] =
        &["t_s", "theta_rad", "omega_rad_s", "moment_n_m", "alpha_rad_s2"];

    fn values(&self) -> Vec<f64> {
        vec![self.t, self.theta, self.omega, self.moment, self.alpha]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeverSnapshot {
    /// Time (s).
    pub t: f64,
    /// Tilt (rad).
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Net moment (N·m).
    pub moment: f64,
    /// Moment of inertia (kg·m²).
    pub inertia: f64,
    /// Whether the net moment is within [`BALANCE_TOLERANCE`].
    pub is_balanced: bool,
    /// Mean left arm over mean right arm.
    pub mechanical_advantage: f64,
    /// Fulcrum position (m).
    pub fulcrum: f64,
    /// Current loads.
    pub loads: Vec<Load>,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Lever simulation.
#[derive(Debug, Clone)]
pub struct Lever {
    params: LeverParams,
    initial: LeverInitial,
    loads: Vec<Load>,
    max_tilt: f64,
    state: PhaseState<f64>,
    t: f64,
    history: HistoryBuffer<LeverSample>,
    terminal: Option<Terminal>,
}

impl Lever {
    /// Build the lever with its configured loads.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or a non-finite
    /// initial state.
    pub fn new(params: LeverParams, initial: LeverInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.theta_deg", initial.theta_deg)?;
        require_finite("initial.omega", initial.omega)?;

        let mut lever = Self {
            loads: params.loads.clone(),
            max_tilt: params.max_tilt_deg.to_radians(),
            params,
            initial,
            state: PhaseState::at_rest(),
            t: 0.0,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        lever.reset();
        Ok(lever)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &LeverParams {
        &self.params
    }

    /// Current tilt/angular velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Current loads.
    #[must_use]
    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    /// Net moment of loads and beam weight about the fulcrum (N·m).
    #[must_use]
    pub fn total_moment(&self) -> f64 {
        let p = &self.params;
        let loads: f64 = self
            .loads
            .iter()
            .map(|l| l.moment(p.fulcrum, p.gravity))
            .sum();
        loads + (p.beam_length / 2.0 - p.fulcrum) * p.beam_mass * p.gravity
    }

    /// Moment of inertia about the fulcrum (kg·m²).
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        let f = self.params.fulcrum;
        self.params.base_inertia
            + self
                .loads
                .iter()
                .map(|l| l.mass * (l.position - f).powi(2))
                .sum::<f64>()
    }

    /// Whether `|ΣM| ≤ tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        self.total_moment().abs() <= tolerance
    }

    /// Mean left arm divided by mean right arm.
    ///
    /// Infinite with no load right of the fulcrum, zero with none left of it.
    #[must_use]
    pub fn mechanical_advantage(&self) -> f64 {
        let f = self.params.fulcrum;
        let (mut left, mut n_left, mut right, mut n_right) = (0.0, 0u32, 0.0, 0u32);
        for load in &self.loads {
            let arm = load.position - f;
            if arm < 0.0 {
                left += -arm;
                n_left += 1;
            } else if arm > 0.0 {
                right += arm;
                n_right += 1;
            }
        }
        if n_right == 0 {
            return f64::INFINITY;
        }
        if n_left == 0 {
            return 0.0;
        }
        (left / f64::from(n_left)) / (right / f64::from(n_right))
    }

    /// Position that would zero the net moment if load `index` moved there.
    ///
    /// The result may lie off the beam. `None` for an unknown index.
    #[must_use]
    pub fn balancing_position(&self, index: usize) -> Option<f64> {
        let load = self.loads.get(index)?;
        let others = self.total_moment() - load.moment(self.params.fulcrum, self.params.gravity);
        Some(self.params.fulcrum - others / (load.mass * self.params.gravity))
    }

    /// Move the last load to its balancing position (clamped to the beam)
    /// and level the beam.
    ///
    /// Returns `false` when there is no load to move.
    pub fn restore_balance(&mut self) -> bool {
        let Some(index) = self.loads.len().checked_sub(1) else {
            return false;
        };
        let Some(x) = self.balancing_position(index) else {
            return false;
        };
        self.loads[index].position = x.clamp(0.0, self.params.beam_length);
        self.state = PhaseState::at_rest();
        self.terminal = None;
        tracing::debug!(x = self.loads[index].position, "lever rebalanced");
        true
    }

    /// Place a new load; returns its index.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive mass or a position
    /// off the beam.
    pub fn add_load(&mut self, mass: f64, position: f64) -> SimResult<usize> {
        require_positive("load.mass", mass)?;
        self.params.on_beam("load.position", position)?;
        self.loads.push(Load::new(mass, position));
        Ok(self.loads.len() - 1)
    }

    /// Take load `index` off the beam.
    pub fn remove_load(&mut self, index: usize) -> Option<Load> {
        (index < self.loads.len()).then(|| self.loads.remove(index))
    }

    /// Slide load `index` to `position`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown index or a position off
    /// the beam.
    pub fn move_load(&mut self, index: usize, position: f64) -> SimResult<()> {
        self.params.on_beam("load.position", position)?;
        let load = self
            .loads
            .get_mut(index)
            .ok_or_else(|| SimError::config(format!("no load at index {index}")))?;
        load.position = position;
        Ok(())
    }

    fn pivot_limits(&self) -> (f64, f64) {
        let p = &self.params;
        let weight =
            (p.beam_mass + self.loads.iter().map(|l| l.mass).sum::<f64>()) * p.gravity;
        (
            p.pivot_friction.max_static(weight) * p.pivot_radius,
            p.pivot_friction.kinetic(weight) * p.pivot_radius,
        )
    }

    fn sample(&self) -> LeverSample {
        let moment = self.total_moment();
        LeverSample {
            t: self.t,
            theta: self.state.position,
            omega: self.state.velocity,
            moment,
            alpha: moment / self.moment_of_inertia(),
        }
    }
}

impl PhysicsDemo for Lever {
    type Snapshot = LeverSnapshot;
    type Sample = LeverSample;

    fn name(&self) -> &'static str {
        "lever"
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

        let moment = self.total_moment();
        let (max_static, kinetic) = self.pivot_limits();
        let friction = resolve_with_limits(moment, self.state.velocity, max_static, kinetic);

        if friction.is_static {
            self.state.velocity = 0.0;
        } else {
            let alpha = friction.net(moment) / self.moment_of_inertia();
            self.state.velocity = (self.state.velocity + alpha * dt) * self.params.damping;
            self.state.position += self.state.velocity * dt;
        }
        if self.state.velocity.abs() < REST_OMEGA && moment.abs() < REST_MOMENT {
            self.state.velocity = 0.0;
            self.state.position *= REST_TILT_DECAY;
        }
        self.t += dt;

        if self.state.position.abs() > self.max_tilt {
            self.state.position = self.state.position.clamp(-self.max_tilt, self.max_tilt);
            self.state.velocity = 0.0;
            self.terminal = Some(Terminal::HardStop);
            tracing::warn!(t = self.t, theta = self.state.position, "lever hit its stop");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> LeverSnapshot {
        LeverSnapshot {
            t: self.t,
            theta: self.state.position,
            omega: self.state.velocity,
            moment: self.total_moment(),
            inertia: self.moment_of_inertia(),
            is_balanced: self.is_balanced(BALANCE_TOLERANCE),
            mechanical_advantage: self.mechanical_advantage(),
            fulcrum: self.params.fulcrum,
            loads: self.loads.clone(),
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<LeverSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![("theta", self.state.position), ("omega", self.state.velocity)]
    }

    fn reset(&mut self) {
        self.loads.clone_from(&self.params.loads);
        self.state = PhaseState::new(self.initial.theta_deg.to_radians(), self.initial.omega);
        self.t = 0.0;
        self.terminal = None;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}
