//! Two discs colliding in the plane.
//!
//! Free flight between contacts (zero acceleration), contact resolved with
//! [`crate::domains::collision::resolve_collision`]. Total momentum is
//! conserved by every contact; kinetic energy is conserved only for `e = 1`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{PhysicsDemo, Terminal};
use crate::domains::collision::{resolve_collision, Body, Contact};
use crate::domains::physics::IntegratorType;
use crate::engine::history::{HistoryBuffer, SampleRecord};
use crate::engine::state::{PhaseState, Vec2};
use crate::error::{require_finite, require_positive, SimResult};

/// Native substep (s).
pub const SUBSTEP: f64 = 0.02;
/// History sampling interval (s).
pub const SAMPLE_INTERVAL: f64 = 0.05;
/// History capacity.
pub const HISTORY_CAPACITY: usize = 2000;

/// Mass and size of one disc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscParams {
    /// Mass (kg).
    pub mass: f64,
    /// Radius (m).
    pub radius: f64,
}

impl Default for DiscParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            radius: 0.5,
        }
    }
}

/// Collision parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct CollisionParams {
    /// First disc.
    pub a: DiscParams,
    /// Second disc.
    pub b: DiscParams,
    /// Coefficient of restitution.
    #[validate(range(min = 0.0, max = 1.0))]
    pub restitution: f64,
}

impl CollisionParams {
    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive masses or radii.
    pub fn check(&self) -> SimResult<()> {
        require_positive("a.mass", self.a.mass)?;
        require_positive("a.radius", self.a.radius)?;
        require_positive("b.mass", self.b.mass)?;
        require_positive("b.radius", self.b.radius)?;
        Ok(())
    }
}

/// Launch state of one disc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscLaunch {
    /// Center x (m).
    pub x: f64,
    /// Center y (m).
    pub y: f64,
    /// Speed (m/s).
    pub speed: f64,
    /// Heading from +x (deg).
    pub heading_deg: f64,
}

impl Default for DiscLaunch {
    fn default() -> Self {
        Self {
            x: -3.0,
            y: 0.0,
            speed: 2.0,
            heading_deg: 0.0,
        }
    }
}

impl DiscLaunch {
    fn velocity(&self) -> Vec2 {
        Vec2::from_polar(self.speed, self.heading_deg.to_radians())
    }
}

/// Collision initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollisionInitial {
    /// First disc.
    pub a: DiscLaunch,
    /// Second disc.
    pub b: DiscLaunch,
}

impl Default for CollisionInitial {
    fn default() -> Self {
        Self {
            a: DiscLaunch::default(),
            b: DiscLaunch {
                x: 3.0,
                y: 0.3,
                speed: 1.0,
                heading_deg: 180.0,
            },
        }
    }
}

/// History row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionSample {
    /// Time (s).
    pub t: f64,
    /// Total momentum x (kg·m/s).
    pub momentum_x: f64,
    /// Total momentum y (kg·m/s).
    pub momentum_y: f64,
    /// Total momentum magnitude (kg·m/s).
    pub momentum: f64,
    /// Total kinetic energy (J).
    pub kinetic_energy: f64,
}

impl SampleRecord for CollisionSample {
    const FIELDS: &'static [&'static str] = &[
        "t_s",
        "momentum_x_kg_m_s",
        "momentum_y_kg_m_s",
        "momentum_kg_m_s",
        "kinetic_energy_j",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.t,
            self.momentum_x,
            self.momentum_y,
            self.momentum,
            self.kinetic_energy,
        ]
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// State snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionSnapshot {
    /// Time (s).
    pub t: f64,
    /// First disc.
    pub a: Body,
    /// Second disc.
    pub b: Body,
    /// Total momentum (kg·m/s).
    pub momentum: Vec2,
    /// Total kinetic energy (J).
    pub kinetic_energy: f64,
    /// Number of contacts that exchanged momentum.
    pub collisions: u32,
    /// Most recent contact.
    pub last_contact: Option<Contact>,
}

/// Two-disc collision simulation.
#[derive(Debug, Clone)]
pub struct Collision {
    params: CollisionParams,
    initial: CollisionInitial,
    a: Body,
    b: Body,
    t: f64,
    collisions: u32,
    last_contact: Option<Contact>,
    history: HistoryBuffer<CollisionSample>,
}

impl Collision {
    /// Create the pair at its launch state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters.
    pub fn new(params: CollisionParams, initial: CollisionInitial) -> SimResult<Self> {
        params.validate()?;
        params.check()?;
        for (name, value) in [
            ("a.x", initial.a.x),
            ("a.y", initial.a.y),
            ("a.speed", initial.a.speed),
            ("a.heading_deg", initial.a.heading_deg),
            ("b.x", initial.b.x),
            ("b.y", initial.b.y),
            ("b.speed", initial.b.speed),
            ("b.heading_deg", initial.b.heading_deg),
        ] {
            require_finite(name, value)?;
        }

        let mut demo = Self {
            a: Body::new(params.a.mass, params.a.radius, Vec2::zero(), Vec2::zero()),
            b: Body::new(params.b.mass, params.b.radius, Vec2::zero(), Vec2::zero()),
            params,
            initial,
            t: 0.0,
            collisions: 0,
            last_contact: None,
            history: HistoryBuffer::new(HISTORY_CAPACITY, SAMPLE_INTERVAL),
        };
        demo.reset();
        Ok(demo)
    }

    /// The two discs.
    #[must_use]
    pub const fn bodies(&self) -> (&Body, &Body) {
        (&self.a, &self.b)
    }

    /// Total momentum (kg·m/s).
    #[must_use]
    pub fn momentum(&self) -> Vec2 {
        self.a.momentum() + self.b.momentum()
    }

    /// Total kinetic energy (J).
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.a.kinetic_energy() + self.b.kinetic_energy()
    }

    /// Number of momentum-exchanging contacts so far.
    #[must_use]
    pub const fn collisions(&self) -> u32 {
        self.collisions
    }

    fn drift(body: &mut Body, t: f64, dt: f64) {
        let next = IntegratorType::SemiImplicitEuler.step(
            PhaseState::new(body.position, body.velocity),
            t,
            dt,
            |_, _| Vec2::zero(),
        );
        body.position = next.position;
        body.velocity = next.velocity;
    }

    fn sample(&self) -> CollisionSample {
        let p = self.momentum();
        CollisionSample {
            t: self.t,
            momentum_x: p.x,
            momentum_y: p.y,
            momentum: p.magnitude(),
            kinetic_energy: self.kinetic_energy(),
        }
    }
}

impl PhysicsDemo for Collision {
    type Snapshot = CollisionSnapshot;
    type Sample = CollisionSample;

    fn name(&self) -> &'static str {
        "collision"
    }

    fn native_substep(&self) -> f64 {
        SUBSTEP
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn step(&mut self, dt: f64) {
        Self::drift(&mut self.a, self.t, dt);
        Self::drift(&mut self.b, self.t, dt);
        self.t += dt;

        if let Some(contact) = resolve_collision(&mut self.a, &mut self.b, self.params.restitution) {
            if contact.approaching {
                self.collisions += 1;
                tracing::debug!(
                    t = self.t,
                    impulse = contact.impulse,
                    count = self.collisions,
                    "disc contact"
                );
            }
            self.last_contact = Some(contact);
        }

        if self.history.is_due(self.t) {
            let sample = self.sample();
            self.history.record(self.t, sample);
        }
    }

    fn terminal(&self) -> Option<Terminal> {
        None
    }

    fn snapshot(&self) -> CollisionSnapshot {
        CollisionSnapshot {
            t: self.t,
            a: self.a,
            b: self.b,
            momentum: self.momentum(),
            kinetic_energy: self.kinetic_energy(),
            collisions: self.collisions,
            last_contact: self.last_contact,
        }
    }

    fn history(&self) -> &HistoryBuffer<CollisionSample> {
        &self.history
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("a.x", self.a.position.x),
            ("a.y", self.a.position.y),
            ("a.vx", self.a.velocity.x),
            ("a.vy", self.a.velocity.y),
            ("b.x", self.b.position.x),
            ("b.y", self.b.position.y),
            ("b.vx", self.b.velocity.x),
            ("b.vy", self.b.velocity.y),
        ]
    }

    fn reset(&mut self) {
        let (ia, ib) = (self.initial.a, self.initial.b);
        self.a = Body::new(
            self.params.a.mass,
            self.params.a.radius,
            Vec2::new(ia.x, ia.y),
            ia.velocity(),
        );
        self.b = Body::new(
            self.params.b.mass,
            self.params.b.radius,
            Vec2::new(ib.x, ib.y),
            ib.velocity(),
        );
        self.t = 0.0;
        self.collisions = 0;
        self.last_contact = None;
        self.history.clear();
        let sample = self.sample();
        self.history.record(0.0, sample);
    }
}
