//! Physics demo models.
//!
//! Each demo owns its typed parameters, its phase state and a bounded
//! history of derived quantities, and advances by fixed substeps chosen by
//! the engine's frame clock.
//!
//! # Demos
//!
//! 1. [`inclined_block`] - block on a slope with static/kinetic friction
//! 2. [`pendulum`] - driven damped pendulum (RK4 by default)
//! 3. [`collision`] - two discs with restitution
//! 4. [`atwood`] - Atwood machine on two inclines with pulley inertia
//! 5. [`orbit`] - satellite with inverse-square gravity and drag
//! 6. [`spring_cart`] - cart into a damped spring buffer
//! 7. [`lever`] - rigid lever with movable loads
//! 8. [`disk`] - disk on a fixed axis with axis friction
//! 9. [`kinematics`] - uniform and uniformly accelerated motion
//!
//! Physical end states (hitting the planet, leaving the track) are not
//! errors: a demo reports them through [`PhysicsDemo::terminal`] and
//! ignores further steps until reset.

pub mod atwood;
pub mod collision;
pub mod disk;
pub mod inclined_block;
pub mod kinematics;
pub mod lever;
pub mod orbit;
pub mod pendulum;
pub mod spring_cart;

pub use atwood::Atwood;
pub use collision::Collision;
pub use disk::Disk;
pub use inclined_block::InclinedBlock;
pub use kinematics::Kinematics;
pub use lever::Lever;
pub use orbit::Orbit;
pub use pendulum::Pendulum;
pub use spring_cart::SpringCart;

use serde::{Deserialize, Serialize};

use crate::config::DemoConfig;
use crate::engine::history::{HistoryBuffer, HistoryTable, SampleRecord};
use crate::error::SimResult;

/// Modeled end state that halts stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Terminal {
    /// Satellite fell below the planet's surface.
    PlanetCollision,
    /// Body reached an end of its track.
    TrackEnd,
    /// Lever hit its tilt stop.
    HardStop,
    /// A mass was pulled up to the pulley.
    ReachedPulley,
    /// Observation window elapsed.
    ObservationComplete,
}

impl std::fmt::Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PlanetCollision => "planet collision",
            Self::TrackEnd => "end of track",
            Self::HardStop => "hard stop",
            Self::ReachedPulley => "reached pulley",
            Self::ObservationComplete => "observation complete",
        };
        f.write_str(s)
    }
}

/// Common interface of all demo models.
pub trait PhysicsDemo {
    /// Display snapshot type.
    type Snapshot: Serialize;
    /// History row type.
    type Sample: SampleRecord;

    /// Stable demo identifier, matching the configuration `kind`.
    fn name(&self) -> &'static str;

    /// Default physics substep (s).
    fn native_substep(&self) -> f64;

    /// Simulated time (s).
    fn time(&self) -> f64;

    /// Advance by one substep of `dt` seconds. No-op once terminal.
    fn step(&mut self, dt: f64);

    /// Terminal condition, if reached.
    fn terminal(&self) -> Option<Terminal>;

    /// Current state and derived quantities.
    fn snapshot(&self) -> Self::Snapshot;

    /// Sampled history.
    fn history(&self) -> &HistoryBuffer<Self::Sample>;

    /// Named state variables for finiteness checks.
    fn state_values(&self) -> Vec<(&'static str, f64)>;

    /// Return to the configured initial state and clear history.
    fn reset(&mut self);
}

/// Snapshot of any demo, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DemoSnapshot {
    /// Inclined block.
    InclinedBlock(inclined_block::BlockSnapshot),
    /// Pendulum.
    Pendulum(pendulum::PendulumSnapshot),
    /// Two-disc collision.
    Collision(collision::CollisionSnapshot),
    /// Atwood machine.
    Atwood(atwood::AtwoodSnapshot),
    /// Satellite orbit.
    Orbit(orbit::OrbitSnapshot),
    /// Spring cart.
    SpringCart(spring_cart::CartSnapshot),
    /// Lever.
    Lever(lever::LeverSnapshot),
    /// Disk.
    Disk(disk::DiskSnapshot),
    /// Kinematics.
    Kinematics(kinematics::KinematicsSnapshot),
}

/// Exported history of any demo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryExport {
    /// Demo identifier.
    pub demo: &'static str,
    /// Column names and rows.
    #[serde(flatten)]
    pub table: HistoryTable,
}

/// Any demo model.
#[derive(Debug, Clone)]
pub enum Demo {
    /// Inclined block.
    InclinedBlock(InclinedBlock),
    /// Pendulum.
    Pendulum(Pendulum),
    /// Two-disc collision.
    Collision(Collision),
    /// Atwood machine.
    Atwood(Atwood),
    /// Satellite orbit.
    Orbit(Orbit),
    /// Spring cart.
    SpringCart(SpringCart),
    /// Lever.
    Lever(Lever),
    /// Disk.
    Disk(Disk),
    /// Kinematics.
    Kinematics(Kinematics),
}

macro_rules! each_demo {
    ($demo:expr, $d:ident => $body:expr) => {
        match $demo {
            Demo::InclinedBlock($d) => $body,
            Demo::Pendulum($d) => $body,
            Demo::Collision($d) => $body,
            Demo::Atwood($d) => $body,
            Demo::Orbit($d) => $body,
            Demo::SpringCart($d) => $body,
            Demo::Lever($d) => $body,
            Demo::Disk($d) => $body,
            Demo::Kinematics($d) => $body,
        }
    };
}

impl Demo {
    /// Build the demo described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the demo rejects its parameters.
    pub fn from_config(config: &DemoConfig) -> SimResult<Self> {
        Ok(match config {
            DemoConfig::InclinedBlock(s) => {
                Self::InclinedBlock(InclinedBlock::new(s.params.clone(), s.initial)?)
            }
            DemoConfig::Pendulum(s) => Self::Pendulum(Pendulum::new(s.params.clone(), s.initial)?),
            DemoConfig::Collision(s) => {
                Self::Collision(Collision::new(s.params.clone(), s.initial)?)
            }
            DemoConfig::Atwood(s) => Self::Atwood(Atwood::new(s.params.clone(), s.initial)?),
            DemoConfig::Orbit(s) => Self::Orbit(Orbit::new(s.params.clone(), s.initial)?),
            DemoConfig::SpringCart(s) => {
                Self::SpringCart(SpringCart::new(s.params.clone(), s.initial)?)
            }
            DemoConfig::Lever(s) => Self::Lever(Lever::new(s.params.clone(), s.initial)?),
            DemoConfig::Disk(s) => Self::Disk(Disk::new(s.params.clone(), s.initial)?),
            DemoConfig::Kinematics(s) => {
                Self::Kinematics(Kinematics::new(s.params.clone(), s.initial)?)
            }
        })
    }

    /// Demo identifier.
    #[must_use]
    pub fn name(&self) -> &'static str {
        each_demo!(self, d => d.name())
    }

    /// Default physics substep (s).
    #[must_use]
    pub fn native_substep(&self) -> f64 {
        each_demo!(self, d => d.native_substep())
    }

    /// Whether the demo only runs at its native substep.
    ///
    /// The lever's multiplicative damping is applied once per step, so a
    /// different substep changes its decay rate.
    #[must_use]
    pub const fn has_fixed_substep(&self) -> bool {
        matches!(self, Self::Lever(_))
    }

    /// Simulated time (s).
    #[must_use]
    pub fn time(&self) -> f64 {
        each_demo!(self, d => d.time())
    }

    /// Advance by one substep.
    pub fn step(&mut self, dt: f64) {
        each_demo!(self, d => d.step(dt));
    }

    /// Terminal condition, if reached.
    #[must_use]
    pub fn terminal(&self) -> Option<Terminal> {
        each_demo!(self, d => d.terminal())
    }

    /// Named state variables.
    #[must_use]
    pub fn state_values(&self) -> Vec<(&'static str, f64)> {
        each_demo!(self, d => d.state_values())
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        each_demo!(self, d => d.reset());
    }

    /// Tagged snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DemoSnapshot {
        match self {
            Self::InclinedBlock(d) => DemoSnapshot::InclinedBlock(d.snapshot()),
            Self::Pendulum(d) => DemoSnapshot::Pendulum(d.snapshot()),
            Self::Collision(d) => DemoSnapshot::Collision(d.snapshot()),
            Self::Atwood(d) => DemoSnapshot::Atwood(d.snapshot()),
            Self::Orbit(d) => DemoSnapshot::Orbit(d.snapshot()),
            Self::SpringCart(d) => DemoSnapshot::SpringCart(d.snapshot()),
            Self::Lever(d) => DemoSnapshot::Lever(d.snapshot()),
            Self::Disk(d) => DemoSnapshot::Disk(d.snapshot()),
            Self::Kinematics(d) => DemoSnapshot::Kinematics(d.snapshot()),
        }
    }

    /// History as a column table.
    #[must_use]
    pub fn history(&self) -> HistoryExport {
        HistoryExport {
            demo: self.name(),
            table: each_demo!(self, d => d.history().export()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoSetup;

    fn all_defaults() -> Vec<DemoConfig> {
        vec![
            DemoConfig::InclinedBlock(DemoSetup::default()),
            DemoConfig::Pendulum(DemoSetup::default()),
            DemoConfig::Collision(DemoSetup::default()),
            DemoConfig::Atwood(DemoSetup::default()),
            DemoConfig::Orbit(DemoSetup::default()),
            DemoConfig::SpringCart(DemoSetup::default()),
            DemoConfig::Lever(DemoSetup::default()),
            DemoConfig::Disk(DemoSetup::default()),
            DemoConfig::Kinematics(DemoSetup::default()),
        ]
    }

    #[test]
    fn test_every_default_demo_builds() {
        for config in all_defaults() {
            let demo = Demo::from_config(&config).unwrap();
            assert_eq!(demo.name(), config.kind());
            assert!(demo.native_substep() > 0.0);
            assert!(demo.time().abs() < f64::EPSILON);
            assert_eq!(demo.history().table.len(), 1);
        }
    }

    #[test]
    fn test_every_default_demo_steps_finitely() {
        for config in all_defaults() {
            let mut demo = Demo::from_config(&config).unwrap();
            let dt = demo.native_substep();
            for _ in 0..100 {
                demo.step(dt);
            }
            assert!(
                demo.state_values().iter().all(|(_, v)| v.is_finite()),
                "{} produced non-finite state",
                demo.name()
            );
        }
    }

    #[test]
    fn test_snapshot_tagged_with_kind() {
        for config in all_defaults() {
            let demo = Demo::from_config(&config).unwrap();
            let json = serde_json::to_value(demo.snapshot()).unwrap();
            assert_eq!(json["kind"], demo.name());
        }
    }

    #[test]
    fn test_history_export_columns() {
        let demo = Demo::from_config(&DemoConfig::Pendulum(DemoSetup::default())).unwrap();
        let export = demo.history();
        assert_eq!(export.demo, "pendulum");
        assert_eq!(export.table.fields[0], "t_s");
        let json = serde_json::to_value(&export).unwrap();
        assert!(json["fields"].is_array());
        assert!(json["rows"].is_array());
    }

    #[test]
    fn test_reset_restores_time() {
        let mut demo = Demo::from_config(&DemoConfig::Disk(DemoSetup::default())).unwrap();
        demo.step(0.01);
        demo.reset();
        assert!(demo.time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_display() {
        assert_eq!(Terminal::PlanetCollision.to_string(), "planet collision");
        assert_eq!(Terminal::ObservationComplete.to_string(), "observation complete");
    }
}
