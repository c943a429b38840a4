//! Solid disk spinning on a fixed axis.
//!
//! ```text
//! I      = ½·m·R²
//! τ_fric = μ·I·g_equiv        (axis friction, static and kinetic)
//! τ_net  = τ_applied - c·ω - τ_fric
//! ```
//!
//! Axis friction is the linear static/kinetic resolver in rotational form:
//! a disk at rest stays put while `|τ_applied| ≤ τ_fric`. The run ends with
//! [`Terminal::ObservationComplete`] once the observation window elapses.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::friction::{resolve_with_limits, settles, FrictionResolution};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::{wrap_angle_positive, PhaseState};
use crate::error::{require_finite, require_non_negative, require_positive, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 1.0 / 60.0;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 1200;
/// Angular speed below which a decelerating disk counts as stopped (rad/s).
pub const STOP_OMEGA: f64 = 0.05;

/// Disk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DiskParams {
    /// Radius (m).
    pub radius: f64,
    /// Mass (kg).
    pub mass: f64,
    /// Axis friction coefficient.
    #[validate(range(min = 0.0))]
    pub axis_friction: f64,
    /// Equivalent gravity scaling the axis friction torque.
    pub g_equiv: f64,
    /// Applied torque (N·m).
    pub torque: f64,
    /// Viscous drag coefficient (N·m·s).
    #[validate(range(min = 0.0))]
    pub viscous: f64,
    /// Observation window (s).
    pub observation_time: f64,
}

impl Default for DiskParams {
    fn default() -> Self {
        Self {
            radius: 0.4,
            mass: 8.0,
            axis_friction: 0.05,
            g_equiv: 1.0,
            torque: 15.0,
            viscous: 0.1,
            observation_time: 20.0,
        }
    }
}

impl DiskParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive radius, mass or
    /// observation time, or a negative friction term.
    pub fn check(&self) -> SimResult<()> {
        require_positive("radius", self.radius)?;
        require_positive("mass", self.mass)?;
        require_positive("observation_time", self.observation_time)?;
        require_non_negative("axis_friction", self.axis_friction)?;
        require_non_negative("g_equiv", self.g_equiv)?;
        require_non_negative("viscous", self.viscous)?;
        require_finite("torque", self.torque)?;
        Ok(())
    }

    /// Moment of inertia of a solid disk (kg·m²).
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        0.5 * self.mass * self.radius * self.radius
    }

    /// Axis friction torque magnitude (N·m).
    #[must_use]
    pub fn axis_friction_torque(&self) -> f64 {
        self.axis_friction * self.moment_of_inertia() * self.g_equiv
    }
}

/// Initial spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskInitial {
    /// Angular velocity (rad/s).
    pub omega: f64,
}

impl Default for DiskInitial {
    fn default() -> Self {
        Self { omega: 35.0 }
    }
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskSample {
    /// Time (s).
    pub t: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Angular acceleration (rad/s²).
    pub alpha: f64,
    /// Rotational kinetic energy (J).
    pub kinetic_energy: f64,
    /// Work done by the applied torque (J).
    pub work: f64,
}

impl SampleRecord for DiskSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "omega_rad_s",
        "alpha_rad_s2",
        "kinetic_energy_j",
        "work_j",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.omega,
            self.alpha,
            self.kinetic_energy,
            self.work,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskSnapshot {
    /// Time (s).
    pub t: f64,
    /// Rotation angle in `[0, 2π)` (rad).
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub omega: f64,
    /// Angular acceleration (rad/s²).
    pub alpha: f64,
    /// Moment of inertia (kg·m²).
    pub inertia: f64,
    /// Axis friction resolution.
    pub friction: FrictionResolution,
    /// Rotational kinetic energy (J).
    pub kinetic_energy: f64,
    /// Work done by the applied torque (J).
    pub work: f64,
    /// Time the disk came to rest, if it did.
    pub stop_time: Option<f64>,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Disk simulation.
#[derive(Debug, Clone)]
pub struct Disk {
    params: DiskParams,
    initial: DiskInitial,
    inertia: f64,
    state: PhaseState<f64>,
    t: f64,
    work: f64,
    stop_time: Option<f64>,
    history: HistoryBuffer<DiskSample>,
    terminal: Option<Terminal>,
}

impl Disk {
    /// Create the disk with its initial spin.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters.
    pub fn new(params: DiskParams, initial: DiskInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.omega", initial.omega)?;

        let mut disk = Self {
            inertia: params.moment_of_inertia(),
            params,
            initial,
            state: PhaseState::new(0.0, initial.omega),
            t: 0.0,
            work: 0.0,
            stop_time: None,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        disk.reset();
        Ok(disk)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &DiskParams {
        &self.params
    }

    /// Current angle/angular velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Work done by the applied torque so far (J).
    #[must_use]
    pub const fn work(&self) -> f64 {
        self.work
    }

    /// Time the disk came to rest, if it did.
    #[must_use]
    pub const fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    /// Axis friction and angular acceleration at angular velocity `omega`.
    #[must_use]
    pub fn torques_at(&self, omega: f64) -> (FrictionResolution, f64) {
        let driving = self.params.torque - self.params.viscous * omega;
        let limit = self.params.axis_friction_torque();
        let friction = resolve_with_limits(driving, omega, limit, limit);
        (friction, friction.net(driving) / self.inertia)
    }

    fn kinetic_energy(&self) -> f64 {
        0.5 * self.inertia * self.state.velocity * self.state.velocity
    }

    fn sample(&self) -> DiskSample {
        DiskSample {
            t: self.t,
            omega: self.state.velocity,
            alpha: self.torques_at(self.state.velocity).1,
            kinetic_energy: self.kinetic_energy(),
            work: self.work,
        }
    }
}

impl PhysicsDemo for Disk {
    type Snapshot = DiskSnapshot;
    type Sample = DiskSample;

    fn name(&self) -> &'static str {
        "disk"
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

        let prev_omega = self.state.velocity;
        let (mut friction, mut alpha) = self.torques_at(prev_omega);
        let limit = self.params.axis_friction_torque();
        if !friction.is_static
            && settles(prev_omega, alpha, dt, self.params.torque, limit)
        {
            self.state.velocity = 0.0;
            (friction, alpha) = self.torques_at(0.0);
        }
        if friction.is_static {
            self.state.velocity = 0.0;
        }

        self.state = IntegratorType::SemiImplicitEuler.step(self.state, self.t, dt, |_, _| alpha);
        self.state.position = wrap_angle_positive(self.state.position);
        self.t += dt;
        self.work += self.params.torque * self.state.velocity * dt;

        if self.stop_time.is_none()
            && prev_omega.abs() > self.state.velocity.abs()
            && self.state.velocity.abs() < STOP_OMEGA
        {
            self.stop_time = Some(self.t);
            tracing::debug!(t = self.t, "disk stopped");
        }

        if self.t >= self.params.observation_time - 1e-9 {
            self.terminal = Some(Terminal::ObservationComplete);
            tracing::info!(t = self.t, omega = self.state.velocity, "disk observation complete");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> DiskSnapshot {
        let (friction, alpha) = self.torques_at(self.state.velocity);
        DiskSnapshot {
            t: self.t,
            theta: self.state.position,
            omega: self.state.velocity,
            alpha,
            inertia: self.inertia,
            friction,
            kinetic_energy: self.kinetic_energy(),
            work: self.work,
            stop_time: self.stop_time,
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<DiskSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![("theta", self.state.position), ("omega", self.state.velocity)]
    }

    fn reset(&mut self) {
        self.state = PhaseState::new(0.0, self.initial.omega);
        self.t = 0.0;
        self.work = 0.0;
        self.stop_time = None;
        self.terminal = None;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn run(disk: &mut Disk, seconds: f64) {
        let n = (seconds / SUBSTEP).round() as usize;
        for _ in 0..n {
            disk.step(SUBSTEP);
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut p = DiskParams::default();
        p.radius = 0.0;
        assert!(Disk::new(p, DiskInitial::default()).is_err());

        let mut p = DiskParams::default();
        p.axis_friction = -0.1;
        assert!(Disk::new(p, DiskInitial::default()).is_err());

        let mut p = DiskParams::default();
        p.observation_time = 0.0;
        assert!(Disk::new(p, DiskInitial::default()).is_err());
    }

    #[test]
    fn test_moment_of_inertia() {
        let p = DiskParams::default();
        assert!((p.moment_of_inertia() - 0.64).abs() < 1e-12);
        assert!((p.axis_friction_torque() - 0.032).abs() < 1e-12);
    }

    #[test]
    fn test_free_spin_up_is_linear() {
        let params = DiskParams {
            axis_friction: 0.0,
            viscous: 0.0,
            torque: 2.0,
            ..DiskParams::default()
        };
        let mut disk = Disk::new(params, DiskInitial::default()).unwrap();
        run(&mut disk, 2.0);
        let expected = 35.0 + 2.0 / 0.64 * 2.0;
        assert!((disk.state().velocity - expected).abs() < 1e-9);

        // work ≈ change in kinetic energy
        let dke = 0.5 * 0.64 * (expected * expected - 35.0 * 35.0);
        assert!((disk.work() - dke).abs() < 0.01 * dke);
    }

    #[test]
    fn test_axis_friction_stops_disk() {
        let params = DiskParams {
            axis_friction: 2.0,
            viscous: 0.0,
            torque: 0.0,
            ..DiskParams::default()
        };
        let mut disk = Disk::new(params, DiskInitial::default()).unwrap();
        run(&mut disk, 19.0);
        // deceleration μ·g_equiv = 2 rad/s²
        let stop = disk.stop_time().unwrap();
        assert!((stop - 17.5).abs() < 0.05);
        assert!(disk.state().velocity.abs() < f64::EPSILON);
        assert!(disk.terminal().is_none());
    }

    #[test]
    fn test_static_axis_holds_small_torque() {
        let params = DiskParams {
            torque: 0.01,
            ..DiskParams::default()
        };
        let mut disk = Disk::new(params, DiskInitial { omega: 0.0 }).unwrap();
        run(&mut disk, 1.0);
        assert!(disk.state().velocity.abs() < f64::EPSILON);
        assert!(disk.state().position.abs() < f64::EPSILON);
        assert!(disk.snapshot().friction.is_static);
    }

    #[test]
    fn test_viscous_terminal_speed() {
        let params = DiskParams {
            axis_friction: 0.0,
            observation_time: 100.0,
            ..DiskParams::default()
        };
        let mut disk = Disk::new(params, DiskInitial::default()).unwrap();
        run(&mut disk, 60.0);
        assert!((disk.state().velocity - 150.0).abs() < 0.1);
    }

    #[test]
    fn test_angle_wrapped() {
        let mut disk = Disk::new(DiskParams::default(), DiskInitial::default()).unwrap();
        for _ in 0..500 {
            disk.step(SUBSTEP);
            let theta = disk.state().position;
            assert!((0.0..TAU).contains(&theta));
        }
    }

    #[test]
    fn test_observation_window_ends_run() {
        let mut disk = Disk::new(DiskParams::default(), DiskInitial::default()).unwrap();
        run(&mut disk, 25.0);
        assert_eq!(disk.terminal(), Some(Terminal::ObservationComplete));
        assert!((disk.time() - 20.0).abs() < SUBSTEP);
        assert_eq!(disk.history().len(), HISTORY_CAPACITY);
    }
}
