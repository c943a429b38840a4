//! Orbital elements from an instantaneous state vector.
//!
//! ```text
//! ε = v²/2 - μ/r                              specific orbital energy
//! h = x·vy - y·vx                             specific angular momentum
//! e = ((v² - μ/r)·r - (r·v)·v) / μ            eccentricity vector
//! ```
//!
//! Classification: bound when `ε < 0`, circular when `|e| < 0.02`.
//!
//! # References
//!
//! Vallado, "Fundamentals of Astrodynamics and Applications," 4th ed., 2013.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::engine::state::Vec2;

/// Newtonian gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;

/// Earth mass (kg).
pub const EARTH_MASS: f64 = 5.972e24;

/// Earth mean radius (m).
pub const EARTH_RADIUS: f64 = 6.371e6;

/// Moon mass (kg).
pub const MOON_MASS: f64 = 7.342e22;

/// Moon mean radius (m).
pub const MOON_RADIUS: f64 = 1.737_4e6;

/// Eccentricity below which an orbit is reported as circular.
pub const CIRCULAR_ECCENTRICITY: f64 = 0.02;

/// Keplerian view of a two-body state.
///
/// Derived and never authoritative: the position/velocity it was computed
/// from is the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Eccentricity magnitude.
    pub eccentricity: f64,
    /// Semi-major axis (m). Negative for hyperbolic, infinite for parabolic.
    pub semi_major_axis: f64,
    /// Periapsis (perigee) radius (m).
    pub perigee_radius: f64,
    /// Apoapsis (apogee) radius (m). Infinite when unbound.
    pub apogee_radius: f64,
    /// Argument of periapsis measured from +x (rad).
    pub periapsis_angle: f64,
    /// Orbital period (s). Infinite when unbound.
    pub period: f64,
    /// Eccentricity below [`CIRCULAR_ECCENTRICITY`].
    pub is_circular: bool,
    /// Negative specific energy.
    pub is_bound: bool,
    /// Specific orbital energy (J/kg).
    pub specific_energy: f64,
    /// Specific angular momentum (m²/s).
    pub specific_angular_momentum: f64,
}

impl OrbitalElements {
    /// Compute elements for `position`/`velocity` about a body with
    /// gravitational parameter `mu`.
    #[must_use]
    pub fn compute(position: Vec2, velocity: Vec2, mu: f64) -> Self {
        let r = position.magnitude();
        let v2 = velocity.magnitude_squared();

        let specific_energy = v2 / 2.0 - mu / r;
        let h = position.cross(&velocity);

        let e_vec = (position * (v2 - mu / r) - velocity * position.dot(&velocity)) * (1.0 / mu);
        let eccentricity = e_vec.magnitude();
        let periapsis_angle = e_vec.angle();

        let is_bound = specific_energy < 0.0;
        let is_circular = eccentricity < CIRCULAR_ECCENTRICITY;

        let (semi_major_axis, mut perigee_radius, apogee_radius, period) = if is_circular {
            (r, r, r, TAU * (r.powi(3) / mu).sqrt())
        } else if is_bound {
            let a = -mu / (2.0 * specific_energy);
            let rp = (a * (1.0 - eccentricity)).max(0.0);
            (a, rp, a * (1.0 + eccentricity), TAU * (a.powi(3) / mu).sqrt())
        } else {
            let p = h * h / mu;
            let a = if specific_energy.abs() > f64::EPSILON {
                -mu / (2.0 * specific_energy)
            } else {
                f64::INFINITY
            };
            (a, p / (1.0 + eccentricity), f64::INFINITY, f64::INFINITY)
        };

        if !(perigee_radius.is_finite() && perigee_radius > 0.0) {
            perigee_radius = r;
        }

        Self {
            eccentricity,
            semi_major_axis,
            perigee_radius,
            apogee_radius,
            periapsis_angle,
            period,
            is_circular,
            is_bound,
            specific_energy,
            specific_angular_momentum: h,
        }
    }
}

/// Speed of a circular orbit at radius `r` (first cosmic velocity).
#[must_use]
pub fn circular_speed(mu: f64, r: f64) -> f64 {
    (mu / r).sqrt()
}

/// Escape speed at radius `r` (second cosmic velocity).
#[must_use]
pub fn escape_speed(mu: f64, r: f64) -> f64 {
    (2.0 * mu / r).sqrt()
}
