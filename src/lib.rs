//! # physlab
//!
//! Fixed-substep numerical core for interactive physics teaching demos.
//!
//! - Integrators: explicit Euler, semi-implicit Euler, Velocity Verlet, RK4
//! - Static/kinetic friction with stick-point settling
//! - Nine demo models, each with typed parameters, a bounded history and
//!   modeled terminal conditions
//! - A frame clock that turns irregular host frames into a bounded number
//!   of fixed substeps
//!
//! Rendering and UI are the host's concern: it drives [`engine::SimEngine`]
//! through [`engine::Tick`] and reads snapshots back.
//!
//! ## Example
//!
//! ```rust
//! use physlab::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .demo(DemoConfig::Pendulum(DemoSetup::default()))
//!     .build();
//! let mut engine = SimEngine::new(config).unwrap();
//! engine.start();
//! let report = engine.tick(1.0 / 60.0).unwrap();
//! assert_eq!(report.substeps, 4);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Written the way the equations read
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod demos;
pub mod domains;
pub mod engine;
pub mod error;

#[cfg(feature = "wasm")]
pub mod wasm;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ClockConfig, DemoConfig, DemoSetup, SimConfig, SimConfigBuilder};
    pub use crate::demos::{Demo, DemoSnapshot, HistoryExport, PhysicsDemo, Terminal};
    pub use crate::domains::friction::FrictionCoefficients;
    pub use crate::domains::physics::IntegratorType;
    pub use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    pub use crate::engine::state::{PhaseState, Vec2};
    pub use crate::engine::{RunState, SimEngine, Tick, TickReport};
    pub use crate::error::{SimError, SimResult};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
