//! Numerical building blocks shared by the demos.
//!
//! - [`physics`]: explicit integrators over phase state
//! - [`friction`]: static/kinetic friction resolution and stick settling
//! - [`collision`]: two-disc impulse resolution with restitution
//! - [`orbital`]: Keplerian elements from a two-body state

pub mod collision;
pub mod friction;
pub mod orbital;
pub mod physics;

pub use collision::{resolve_collision, Body, Contact};
pub use friction::{FrictionCoefficients, FrictionResolution};
pub use orbital::OrbitalElements;
pub use physics::{
    EulerIntegrator, Integrator, IntegratorType, RK4Integrator, SemiImplicitEulerIntegrator,
    VerletIntegrator,
};
