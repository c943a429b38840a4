//! Satellite around a planet: inverse-square gravity with optional drag.
//!
//! ```text
//! a = -μ·r/|r|³ - k·v          μ = G·M
//! ```
//!
//! The planet sits at the origin and the satellite starts on the +x axis
//! at `R + h`. The launch velocity is tangential, tilted by the flight
//! angle, with `vy` scaled by `cos(inclination)` to mimic an inclined orbit
//! projected on the display plane. A thrust impulse adds `Δv` along the
//! resulting velocity.
//!
//! Velocity Verlet at 0.5 s is the default integrator: it is symplectic,
//! so total energy oscillates without secular drift and angular momentum
//! is preserved to round-off for a pure central force.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::orbital::{
    circular_speed, escape_speed, OrbitalElements, EARTH_MASS, EARTH_RADIUS, G, MOON_MASS,
};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::{PhaseState, Vec2};
use crate::error::{require_finite, require_non_negative, require_positive, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 0.5;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 1.0;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 600;
/// Trace capacity (positions).
pub const TRACE_CAPACITY: usize = 5000;
/// Substeps between orbital element refreshes.
pub const ELEMENTS_REFRESH_STEPS: u64 = 10;
/// Fraction of the planet radius below which the satellite is lost.
pub const IMPACT_RADIUS_FRACTION: f64 = 0.9;

/// Orbit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct OrbitParams {
    /// Central body mass (kg).
    pub central_mass: f64,
    /// Central body radius (m).
    pub planet_radius: f64,
    /// Satellite mass (kg).
    pub satellite_mass: f64,
    /// Linear drag rate (1/s): the drag deceleration is `k·|v|` against
    /// the velocity.
    #[validate(range(min = 0.0))]
    pub drag: f64,
    /// Integration method.
    pub integrator: IntegratorType,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            central_mass: EARTH_MASS,
            planet_radius: EARTH_RADIUS,
            satellite_mass: 0.05 * MOON_MASS,
            drag: 0.0,
            integrator: IntegratorType::VelocityVerlet,
        }
    }
}

impl OrbitParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive masses or radius.
    pub fn check(&self) -> SimResult<()> {
        require_positive("central_mass", self.central_mass)?;
        require_positive("planet_radius", self.planet_radius)?;
        require_positive("satellite_mass", self.satellite_mass)?;
        require_non_negative("drag", self.drag)?;
        Ok(())
    }

    /// Gravitational parameter `μ = G·M` (m³/s²).
    #[must_use]
    pub fn mu(&self) -> f64 {
        G * self.central_mass
    }
}

/// Launch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrbitInitial {
    /// Altitude above the surface (m).
    pub altitude: f64,
    /// Launch speed (m/s).
    pub speed: f64,
    /// Flight path angle from the local horizontal (deg).
    pub flight_angle_deg: f64,
    /// Orbit inclination (deg).
    pub inclination_deg: f64,
    /// Impulse along the launch velocity (m/s).
    pub thrust: f64,
}

impl Default for OrbitInitial {
    fn default() -> Self {
        Self {
            altitude: 4.0e5,
            speed: 7_670.0,
            flight_angle_deg: 0.0,
            inclination_deg: 0.0,
            thrust: 0.0,
        }
    }
}

impl OrbitInitial {
    /// Position and velocity on the +x axis for a planet of `radius`.
    #[must_use]
    pub fn launch_state(&self, radius: f64) -> PhaseState<Vec2> {
        let flight = self.flight_angle_deg.to_radians();
        let incl = self.inclination_deg.to_radians();
        let mut velocity = Vec2::new(
            -self.speed * flight.sin(),
            self.speed * flight.cos() * incl.cos(),
        );
        if self.thrust > 0.0 {
            velocity += velocity.normalize() * self.thrust;
        }
        PhaseState::new(Vec2::new(radius + self.altitude, 0.0), velocity)
    }
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitSample {
    /// Time (s).
    pub t: f64,
    /// Kinetic energy (J).
    pub kinetic_energy: f64,
    /// Gravitational potential energy (J).
    pub potential_energy: f64,
    /// Total energy (J).
    pub total_energy: f64,
    /// Angular momentum (kg·m²/s).
    pub angular_momentum: f64,
    /// Distance from the planet center (m).
    pub radius: f64,
    /// Speed (m/s).
    pub speed: f64,
}

impl SampleRecord for OrbitSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "kinetic_energy_j",
        "potential_energy_j",
        "total_energy_j",
        "angular_momentum_kg_m2_s",
        "radius_m",
        "speed_m_s",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.kinetic_energy,
            self.potential_energy,
            self.total_energy,
            self.angular_momentum,
            self.radius,
            self.speed,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitSnapshot {
    /// Time (s).
    pub t: f64,
    /// Position (m).
    pub position: Vec2,
    /// Velocity (m/s).
    pub velocity: Vec2,
    /// Altitude above the surface (m).
    pub altitude: f64,
    /// Cached orbital elements.
    pub elements: OrbitalElements,
    /// Energies and angular momentum at this instant.
    pub sample: OrbitSample,
    /// Circular speed at the current radius (m/s).
    pub first_cosmic: f64,
    /// Escape speed at the current radius (m/s).
    pub second_cosmic: f64,
    /// Terminal condition, if reached.
    pub terminal: Option<Terminal>,
}

/// Satellite orbit simulation.
#[derive(Debug, Clone)]
pub struct Orbit {
    params: OrbitParams,
    initial: OrbitInitial,
    mu: f64,
    state: PhaseState<Vec2>,
    t: f64,
    steps: u64,
    elements: OrbitalElements,
    trace: HistoryBuffer<Vec2>,
    history: HistoryBuffer<OrbitSample>,
    terminal: Option<Terminal>,
}

impl Orbit {
    /// Launch the satellite.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or launch
    /// conditions.
    pub fn new(params: OrbitParams, initial: OrbitInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        require_non_negative("initial.altitude", initial.altitude)?;
        require_non_negative("initial.speed", initial.speed)?;
        require_non_negative("initial.thrust", initial.thrust)?;
        require_finite("initial.flight_angle_deg", initial.flight_angle_deg)?;
        require_finite("initial.inclination_deg", initial.inclination_deg)?;

        let mu = params.mu();
        let state = initial.launch_state(params.planet_radius);
        let mut orbit = Self {
            elements: OrbitalElements::compute(state.position, state.velocity, mu),
            mu,
            params,
            initial,
            state,
            t: 0.0,
            steps: 0,
            trace: HistoryBuffer::new(TRACE_CAPACITY, 0.0),
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
            terminal: None,
        };
        orbit.reset();
        Ok(orbit)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &OrbitParams {
        &self.params
    }

    /// Current position/velocity.
    #[must_use]
    pub const fn state(&self) -> PhaseState<Vec2> {
        self.state
    }

    /// Orbital elements from the most recent refresh.
    #[must_use]
    pub const fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    /// Recent positions, oldest first.
    #[must_use]
    pub const fn trace(&self) -> &HistoryBuffer<Vec2> {
        &self.trace
    }

    /// Gravity plus drag for a given state.
    #[must_use]
    pub fn acceleration(&self, state: PhaseState<Vec2>) -> Vec2 {
        let r = state.position.magnitude();
        let gravity = state.position * (-self.mu / (r * r * r));
        if self.params.drag > 0.0 {
            gravity - state.velocity * self.params.drag
        } else {
            gravity
        }
    }

    /// Energies, angular momentum, radius and speed at the current state.
    #[must_use]
    pub fn sample(&self) -> OrbitSample {
        let m = self.params.satellite_mass;
        let r = self.state.position.magnitude();
        let speed = self.state.velocity.magnitude();
        let kinetic_energy = 0.5 * m * speed * speed;
        let potential_energy = -self.mu * m / r;
        OrbitSample {
            t: self.t,
            kinetic_energy,
            potential_energy,
            total_energy: kinetic_energy + potential_energy,
            angular_momentum: m * self.state.position.cross(&self.state.velocity),
            radius: r,
            speed,
        }
    }

    fn refresh_elements(&mut self) {
        self.elements = OrbitalElements::compute(self.state.position, self.state.velocity, self.mu);
    }
}

impl PhysicsDemo for Orbit {
    type Snapshot = OrbitSnapshot;
    type Sample = OrbitSample;

    fn name(&self) -> &'static str {
        "orbit"
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

        let next = self
            .params
            .integrator
            .step(self.state, self.t, dt, |_, s| self.acceleration(s));
        self.state = next;
        self.t += dt;
        self.steps += 1;

        if self.steps % 2 == 0 {
            self.trace.record(self.t, self.state.position);
        }
        if self.steps % ELEMENTS_REFRESH_STEPS == 0 {
            self.refresh_elements();
        }

        let r = self.state.position.magnitude();
        if r < self.params.planet_radius * IMPACT_RADIUS_FRACTION {
            self.terminal = Some(Terminal::PlanetCollision);
            tracing::warn!(t = self.t, r, "satellite hit the planet");
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    fn snapshot(&self) -> OrbitSnapshot {
        let r = self.state.position.magnitude();
        OrbitSnapshot {
            t: self.t,
            position: self.state.position,
            velocity: self.state.velocity,
            altitude: r - self.params.planet_radius,
            elements: self.elements,
            sample: self.sample(),
            first_cosmic: circular_speed(self.mu, r),
            second_cosmic: escape_speed(self.mu, r),
            terminal: self.terminal,
        }
    }

    fn history(&self) -> &HistoryBuffer<OrbitSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("x", self.state.position.x),
            ("y", self.state.position.y),
            ("vx", self.state.velocity.x),
            ("vy", self.state.velocity.y),
        ]
    }

    fn reset(&mut self) {
        self.state = self.initial.launch_state(self.params.planet_radius);
        self.t = 0.0;
        self.steps = 0;
        self.terminal = None;
        self.refresh_elements();
        self.trace.clear();
        self.trace.record(0.0, self.state.position);
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}
