//! Cart rolling into a damped spring buffer.
//!
//! The spring's free end sits at `x = 0`. The cart starts detached at
//! `x = -distance` and rolls towards it; `x ≥ 0` means the buffer is
//! compressed by `δ = x + preload`.
//!
//! ```text
//! F_drive = m·g·sin θ - k·δ - c·v        (spring terms only in contact)
//! c       = 2·ζ·√(m·k)
//! N       = m·g·cos θ
//! ```
//!
//! Rolling friction goes through the shared static/kinetic resolver. The
//! buffer rails stop the cart at the maximum compression and send it back
//! with the contact restitution; leaving the buffer applies the same
//! restitution once more. In stick mode the cart latches onto the buffer
//! at its first turnaround and oscillates with it from then on.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::friction::{resolve, settles, FrictionCoefficients};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::PhaseState;
use crate::error::{require_finite, require_non_negative, require_positive, SimError, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 1.0 / 240.0;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 0.005;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 4000;

/// Spring cart parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SpringCartParams {
    /// Cart mass (kg).
    pub mass: f64,
    /// Spring stiffness (N/m).
    pub stiffness: f64,
    /// Damping ratio ζ.
    #[validate(range(min = 0.0))]
    pub damping_ratio: f64,
    /// Spring preload (m).
    pub preload: f64,
    /// Compression at which the buffer rails stop the cart (m).
    pub max_compression: f64,
    /// Contact restitution.
    #[validate(range(min = 0.0, max = 1.0))]
    pub restitution: f64,
    /// Rolling friction.
    #[validate(nested)]
    pub friction: FrictionCoefficients,
    /// Track slope towards the spring (deg).
    #[validate(range(min = 0.0, max = 90.0))]
    pub angle_deg: f64,
    /// Latch onto the buffer at the first turnaround.
    pub stick_mode: bool,
    /// Track length behind the spring (m).
    pub track_length: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for SpringCartParams {
    fn default() -> Self {
        Self {
            mass: 2.0,
            stiffness: 500.0,
            damping_ratio: 0.05,
            preload: 0.0,
            max_compression: 0.3,
            restitution: 0.8,
            friction: FrictionCoefficients::new(0.05, 0.03),
            angle_deg: 0.0,
            stick_mode: false,
            track_length: 5.0,
            gravity: 9.81,
        }
    }
}

impl SpringCartParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive mass, stiffness,
    /// maximum compression or track length, a preload at or beyond the
    /// maximum compression, or `μs < μk`.
    pub fn check(&self) -> SimResult<()> {
        require_positive("mass", self.mass)?;
        require_positive("stiffness", self.stiffness)?;
        require_positive("max_compression", self.max_compression)?;
        require_positive("track_length", self.track_length)?;
        require_non_negative("preload", self.preload)?;
        require_non_negative("gravity", self.gravity)?;
        if self.preload >= self.max_compression {
            return Err(SimError::invalid_parameter(
                "preload",
                self.preload,
                "must be below max_compression",
            ));
        }
        self.friction.check("friction")
    }

    /// Viscous coefficient `c = 2ζ√(mk)` (N·s/m).
    #[must_use]
    pub fn damping_coefficient(&self) -> f64 {
        2.0 * self.damping_ratio * (self.mass * self.stiffness).sqrt()
    }
}

/// Launch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpringCartInitial {
    /// Distance from the cart to the free end of the spring (m).
    pub distance: f64,
    /// Speed towards the spring (m/s).
    pub speed: f64,
}

impl Default for SpringCartInitial {
    fn default() -> Self {
        Self {
            distance: 1.5,
            speed: 3.0,
        }
    }
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CartSample {
    /// Time (s).
    pub t: f64,
    /// Distance in front of the spring, negative while compressing (m).
    pub distance: f64,
    /// Velocity towards the spring (m/s).
    pub velocity: f64,
    /// Spring force magnitude (N).
    pub spring_force: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Spring energy (J).
    pub spring_energy: f64,
}

impl SampleRecord for CartSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "distance_m",
        "velocity_m_s",
        "spring_force_n",
        "kinetic_energy_j",
        "spring_energy_j",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.distance,
            self.velocity,
            self.spring_force,
            self.kinetic_energy,
            self.spring_energy,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    /// Time (s).
    pub t: f64,
    /// Cart coordinate, `x ≥ 0` in contact (m).
    pub x: f64,
    /// Velocity towards the spring (m/s).
    pub velocity: f64,
    /// Touching the buffer.
    pub in_contact: bool,
    /// Latched onto the buffer.
    pub attached: bool,
    /// Current spring compression (m).
    pub compression: f64,
    /// Spring force magnitude (N).
    pub spring_force: f64,
    /// Spring energy (J).
    pub spring_energy: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Largest compression so far (m).
    pub max_compression: f64,
    /// Speed at first contact (m/s).
    pub impact_speed: Option<f64>,
    /// Speed after first leaving the buffer (m/s).
    pub rebound_speed: Option<f64>,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Spring cart simulation.
#[derive(Debug, Clone)]
pub struct SpringCart {
    params: SpringCartParams,
    initial: SpringCartInitial,
    angle: f64,
    damping: f64,
    state: PhaseState<f64>,
    t: f64,
    in_contact: bool,
    attached: bool,
    max_compression: f64,
    impact_speed: Option<f64>,
    rebound_speed: Option<f64>,
    history: HistoryBuffer<CartSample>,
    terminal: Option<Terminal>,
}

impl SpringCart {
    /// Place the cart at its launch point.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or a launch
    /// point off the track.
    pub fn new(params: SpringCartParams, initial: SpringCartInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_finite("initial.speed", initial.speed)?;
        if !(0.0..=params.track_length).contains(&initial.distance) {
            return Err(SimError::invalid_parameter(
                "initial.distance",
                initial.distance,
                "must lie on the track",
            ));
        }

        let mut cart = Self {
            angle: params.angle_deg.to_radians(),
            damping: params.damping_coefficient(),
            params,
            initial,
            state: PhaseState::new(-initial.distance, initial.speed),
            t: 0.0,
            in_contact: false,
            attached: false,
            max_compression: 0.0,
            impact_speed: None,
            rebound_speed: None,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        cart.reset();
        Ok(cart)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &SpringCartParams {
        &self.params
    }

    /// Current coordinate/velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<f64> {
        self.state
    }

    /// Whether the cart latched onto the buffer.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Largest compression so far (m).
    #[must_use]
    pub const fn max_compression(&self) -> f64 {
        self.max_compression
    }

    /// Speed at first contact (m/s).
    #[must_use]
    pub const fn impact_speed(&self) -> Option<f64> {
        self.impact_speed
    }

    /// Speed after first leaving the buffer (m/s).
    #[must_use]
    pub const fn rebound_speed(&self) -> Option<f64> {
        self.rebound_speed
    }

    fn touching(&self) -> bool {
        self.attached || self.state.position >= 0.0
    }

    /// Spring compression at the current state (m).
    #[must_use]
    pub fn compression(&self) -> f64 {
        if self.touching() {
            (self.state.position + self.params.preload).min(self.params.max_compression)
        } else {
            0.0
        }
    }

    fn kinetic_energy(&self) -> f64 {
        0.5 * self.params.mass * self.state.velocity * self.state.velocity
    }

    fn spring_energy(&self) -> f64 {
        let delta = self.compression();
        0.5 * self.params.stiffness * delta * delta
    }

    fn sample(&self) -> CartSample {
        CartSample {
            t: self.t,
            distance: -self.state.position,
            velocity: self.state.velocity,
            spring_force: self.params.stiffness * self.compression().abs(),
            kinetic_energy: self.kinetic_energy(),
            spring_energy: self.spring_energy(),
        }
    }
}

impl PhysicsDemo for SpringCart {
    type Snapshot = CartSnapshot;
    type Sample = CartSample;

    fn name(&self) -> &'static str {
        "spring-cart"
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

        let p = &self.params;
        let prev_x = self.state.position;
        let prev_v = self.state.velocity;

        let mut spring = 0.0;
        if self.touching() {
            if !self.in_contact && !self.attached {
                self.in_contact = true;
                if self.impact_speed.is_none() {
                    self.impact_speed = Some(prev_v.abs());
                }
                tracing::debug!(t = self.t, v = prev_v, "cart hit the buffer");
            }
            let mut delta = self.state.position + p.preload;
            if delta > p.max_compression {
                delta = p.max_compression;
                self.state.position = p.max_compression - p.preload;
                self.state.velocity = -p.restitution * self.state.velocity.abs();
                tracing::debug!(t = self.t, "buffer rail stop");
            }
            self.max_compression = self.max_compression.max(delta);
            spring = -p.stiffness * delta - self.damping * self.state.velocity;
        } else {
            self.in_contact = false;
        }

        let driving = p.mass * p.gravity * self.angle.sin() + spring;
        let normal = p.mass * p.gravity * self.angle.cos();
        let max_static = p.friction.max_static(normal);
        let mut friction = resolve(
            driving,
            normal,
            self.state.velocity,
            p.friction.mu_static,
            p.friction.mu_kinetic,
        );
        let mut a = friction.net(driving) / p.mass;
        if !friction.is_static && settles(self.state.velocity, a, dt, driving, max_static) {
            self.state.velocity = 0.0;
            friction = resolve(driving, normal, 0.0, p.friction.mu_static, p.friction.mu_kinetic);
            a = friction.net(driving) / p.mass;
        }
        if friction.is_static {
            self.state.velocity = 0.0;
        }

        self.state = IntegratorType::SemiImplicitEuler.step(self.state, self.t, dt, |_, _| a);
        self.t += dt;

        if !self.attached && prev_x >= 0.0 && self.state.position < 0.0 {
            self.state.velocity = -p.restitution * self.state.velocity.abs();
            self.in_contact = false;
            if self.rebound_speed.is_none() {
                self.rebound_speed = Some(self.state.velocity.abs());
                tracing::debug!(t = self.t, v = self.state.velocity, "cart left the buffer");
            }
        }

        if p.stick_mode
            && !self.attached
            && self.in_contact
            && prev_v > 0.0
            && self.state.velocity <= 0.0
        {
            self.attached = true;
            tracing::debug!(t = self.t, x = self.state.position, "cart latched onto the buffer");
        }

        if self.state.position < -p.track_length {
            self.state.position = -p.track_length;
            self.state.velocity = 0.0;
            self.terminal = Some(Terminal::TrackEnd);
            tracing::warn!(t = self.t, "cart reached end of track");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> CartSnapshot {
        let sample = self.sample();
        CartSnapshot {
            t: self.t,
            x: self.state.position,
            velocity: self.state.velocity,
            in_contact: self.in_contact,
            attached: self.attached,
            compression: self.compression(),
            spring_force: sample.spring_force,
            spring_energy: sample.spring_energy,
            kinetic_energy: sample.kinetic_energy,
            max_compression: self.max_compression,
            impact_speed: self.impact_speed,
            rebound_speed: self.rebound_speed,
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<CartSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("x", self.state.position),
            ("velocity", self.state.velocity),
        ]
    }

    fn reset(&mut self) {
        self.state = PhaseState::new(-self.initial.distance, self.initial.speed);
        self.t = 0.0;
        self.in_contact = false;
        self.attached = false;
        self.max_compression = 0.0;
        self.impact_speed = None;
        self.rebound_speed = None;
        self.terminal = None;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ideal() -> SpringCartParams {
        SpringCartParams {
            damping_ratio: 0.0,
            restitution: 1.0,
            friction: FrictionCoefficients::frictionless(),
            ..SpringCartParams::default()
        }
    }

    fn run(cart: &mut SpringCart, seconds: f64) {
        let n = (seconds / SUBSTEP).round() as usize;
        for _ in 0..n {
            cart.step(SUBSTEP);
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut p = SpringCartParams::default();
        p.stiffness = 0.0;
        assert!(SpringCart::new(p, SpringCartInitial::default()).is_err());

        let mut p = SpringCartParams::default();
        p.restitution = 1.2;
        assert!(SpringCart::new(p, SpringCartInitial::default()).is_err());

        let mut p = SpringCartParams::default();
        p.preload = 0.5;
        assert!(SpringCart::new(p, SpringCartInitial::default()).is_err());

        let mut p = SpringCartParams::default();
        p.friction = FrictionCoefficients::new(0.01, 0.05);
        assert!(SpringCart::new(p, SpringCartInitial::default()).is_err());
    }

    #[test]
    fn test_damping_coefficient() {
        let p = SpringCartParams {
            mass: 2.0,
            stiffness: 800.0,
            damping_ratio: 0.5,
            ..SpringCartParams::default()
        };
        assert!((p.damping_coefficient() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_ideal_bounce_returns_launch_speed() {
        let mut cart = SpringCart::new(ideal(), SpringCartInitial::default()).unwrap();
        run(&mut cart, 1.5);

        let impact = cart.impact_speed().unwrap();
        assert!((impact - 3.0).abs() < 1e-9);
        let expected_compression = 3.0 * (2.0_f64 / 500.0).sqrt();
        assert!((cart.max_compression() - expected_compression).abs() < 0.08 * expected_compression);
        let rebound = cart.rebound_speed().unwrap();
        assert!((rebound - 3.0).abs() < 0.15);
        assert!(cart.state().velocity < 0.0);
    }

    #[test]
    fn test_restitution_scales_rebound() {
        let params = SpringCartParams {
            restitution: 0.5,
            ..ideal()
        };
        let mut cart = SpringCart::new(params, SpringCartInitial::default()).unwrap();
        run(&mut cart, 1.5);
        let rebound = cart.rebound_speed().unwrap();
        assert!((rebound - 1.5).abs() < 0.1);
    }

    #[test]
    fn test_damping_reduces_rebound() {
        let params = SpringCartParams {
            damping_ratio: 0.3,
            ..ideal()
        };
        let mut cart = SpringCart::new(params, SpringCartInitial::default()).unwrap();
        run(&mut cart, 1.5);
        assert!(cart.rebound_speed().unwrap() < 2.5);
    }

    #[test]
    fn test_rail_stop_limits_compression() {
        let initial = SpringCartInitial {
            distance: 1.0,
            speed: 10.0,
        };
        let mut cart = SpringCart::new(ideal(), initial).unwrap();
        run(&mut cart, 1.0);
        assert!(cart.max_compression() <= 0.3 + 1e-12);
        assert!(cart.rebound_speed().is_some());
    }

    #[test]
    fn test_stick_mode_latches() {
        let params = SpringCartParams {
            stick_mode: true,
            damping_ratio: 0.2,
            ..ideal()
        };
        let mut cart = SpringCart::new(params, SpringCartInitial::default()).unwrap();
        run(&mut cart, 5.0);
        assert!(cart.is_attached());
        assert!(cart.rebound_speed().is_none());
        assert!(cart.terminal().is_none());
        assert!(cart.state().position.abs() < 0.1);
    }

    #[test]
    fn test_rebound_reaches_track_end() {
        let mut cart = SpringCart::new(ideal(), SpringCartInitial::default()).unwrap();
        run(&mut cart, 5.0);
        assert_eq!(cart.terminal(), Some(Terminal::TrackEnd));
        assert!((cart.state().position + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_friction_stops_cart_before_spring() {
        let params = SpringCartParams {
            friction: FrictionCoefficients::new(0.6, 0.5),
            ..SpringCartParams::default()
        };
        let mut cart = SpringCart::new(params, SpringCartInitial::default()).unwrap();
        run(&mut cart, 2.0);
        assert!(cart.impact_speed().is_none());
        assert!(cart.state().velocity.abs() < f64::EPSILON);
        // v²/(2 μk g)
        let stop = -1.5 + 9.0 / (2.0 * 0.5 * 9.81);
        assert!((cart.state().position - stop).abs() < 0.02);
    }

    #[test]
    fn test_cart_at_rest_stays_put() {
        let initial = SpringCartInitial {
            distance: 1.0,
            speed: 0.0,
        };
        let mut cart = SpringCart::new(SpringCartParams::default(), initial).unwrap();
        run(&mut cart, 1.0);
        assert!((cart.state().position + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spring_energy_reported_in_contact() {
        let mut cart = SpringCart::new(ideal(), SpringCartInitial::default()).unwrap();
        run(&mut cart, 0.55);
        let snap = cart.snapshot();
        assert!(snap.in_contact);
        let expected = 0.5 * 500.0 * snap.compression * snap.compression;
        assert!((snap.spring_energy - expected).abs() < 1e-12);
        // total mechanical energy roughly conserved mid-contact
        assert!((snap.spring_energy + snap.kinetic_energy - 9.0).abs() < 0.5);
    }
}
