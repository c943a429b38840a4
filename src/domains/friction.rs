//! Static/kinetic friction resolution.
//!
//! Decides whether a body is held by static friction or sliding, and
//! returns the friction force to subtract from the driving force:
//!
//! ```text
//! |v| < EPS and |F_drive| <= μs·N   =>  friction = F_drive        (locked)
//! otherwise                          =>  friction = μk·N·sign(v | F_drive)
//! net = F_drive - friction
//! ```
//!
//! The same policy serves rotational systems (torques instead of forces)
//! and multi-surface systems, where the caller sums the static limits and
//! kinetic magnitudes of every contact and uses [`resolve_with_limits`].

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::state::sign;
use crate::error::{require_non_negative, SimError, SimResult};

/// Speed below which a body is a candidate for static friction.
pub const STATIC_VELOCITY_EPS: f64 = 1e-3;

/// Static and kinetic friction coefficients for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FrictionCoefficients {
    /// Static coefficient μs.
    #[validate(range(min = 0.0))]
    pub mu_static: f64,
    /// Kinetic coefficient μk.
    #[validate(range(min = 0.0))]
    pub mu_kinetic: f64,
}

impl FrictionCoefficients {
    /// Create a new coefficient pair.
    #[must_use]
    pub const fn new(mu_static: f64, mu_kinetic: f64) -> Self {
        Self {
            mu_static,
            mu_kinetic,
        }
    }

    /// Frictionless contact.
    #[must_use]
    pub const fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Same coefficient for both regimes.
    #[must_use]
    pub const fn uniform(mu: f64) -> Self {
        Self::new(mu, mu)
    }

    /// Check that both coefficients are non-negative and `μs >= μk`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `context` otherwise.
    pub fn check(&self, context: &str) -> SimResult<()> {
        require_non_negative(&format!("{context}.mu_static"), self.mu_static)?;
        require_non_negative(&format!("{context}.mu_kinetic"), self.mu_kinetic)?;
        if self.mu_static < self.mu_kinetic {
            return Err(SimError::config(format!(
                "{context}: static friction coefficient {} is less than kinetic coefficient {}",
                self.mu_static, self.mu_kinetic
            )));
        }
        Ok(())
    }

    /// Maximum static friction for a normal force.
    #[must_use]
    pub fn max_static(&self, normal: f64) -> f64 {
        self.mu_static * normal.abs()
    }

    /// Kinetic friction magnitude for a normal force.
    #[must_use]
    pub fn kinetic(&self, normal: f64) -> f64 {
        self.mu_kinetic * normal.abs()
    }
}

impl Default for FrictionCoefficients {
    fn default() -> Self {
        Self::new(0.25, 0.2)
    }
}

/// Outcome of one friction resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrictionResolution {
    /// Friction force to subtract from the driving force.
    pub force: f64,
    /// Whether the contact is locked by static friction.
    pub is_static: bool,
}

impl FrictionResolution {
    /// Net force after friction.
    #[must_use]
    pub fn net(&self, driving: f64) -> f64 {
        if self.is_static {
            0.0
        } else {
            driving - self.force
        }
    }
}

/// Resolve friction for a single contact.
#[must_use]
pub fn resolve(driving: f64, normal: f64, velocity: f64, mu_static: f64, mu_kinetic: f64) -> FrictionResolution {
    resolve_with_limits(
        driving,
        velocity,
        mu_static * normal.abs(),
        mu_kinetic * normal.abs(),
    )
}

/// Resolve friction given the total static limit and kinetic magnitude.
#[must_use]
pub fn resolve_with_limits(driving: f64, velocity: f64, max_static: f64, kinetic: f64) -> FrictionResolution {
    if velocity.abs() < STATIC_VELOCITY_EPS {
        if driving.abs() <= max_static {
            return FrictionResolution {
                force: driving,
                is_static: true,
            };
        }
        // breakaway: no motion yet, friction opposes the driving force
        return FrictionResolution {
            force: kinetic * sign(driving),
            is_static: false,
        };
    }

    FrictionResolution {
        force: kinetic * sign(velocity),
        is_static: false,
    }
}

/// Check whether a decelerating body comes to rest within this step.
///
/// True when velocity and acceleration oppose each other, the velocity
/// would cross zero within `dt`, and static friction can hold the driving
/// force once stopped. Callers then zero the velocity and resolve again in
/// static mode, which keeps the stick point free of sign-flip jitter.
#[must_use]
pub fn settles(velocity: f64, acceleration: f64, dt: f64, driving: f64, max_static: f64) -> bool {
    velocity * acceleration < 0.0
        && velocity.abs() <= acceleration.abs() * dt
        && driving.abs() <= max_static
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lock_cancels_driving_force() {
        let r = resolve(10.0, 100.0, 0.0, 0.3, 0.2);
        assert!(r.is_static);
        assert!((r.force - 10.0).abs() < f64::EPSILON);
        assert!(r.net(10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_static_lock_at_exact_limit() {
        let r = resolve(30.0, 100.0, 0.0, 0.3, 0.2);
        assert!(r.is_static);
    }

    #[test]
    fn test_breakaway_uses_driving_sign() {
        let r = resolve(-31.0, 100.0, 0.0, 0.3, 0.2);
        assert!(!r.is_static);
        assert!((r.force + 20.0).abs() < 1e-12);
        assert!((r.net(-31.0) + 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_sliding_opposes_velocity() {
        // driving pushes forward but body slides backward
        let r = resolve(5.0, 100.0, -2.0, 0.3, 0.2);
        assert!(!r.is_static);
        assert!((r.force + 20.0).abs() < 1e-12);
        assert!((r.net(5.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_velocity_counts_as_rest() {
        let r = resolve(1.0, 100.0, STATIC_VELOCITY_EPS / 2.0, 0.3, 0.2);
        assert!(r.is_static);
    }

    #[test]
    fn test_negative_normal_uses_magnitude() {
        let r = resolve(10.0, -100.0, 0.0, 0.3, 0.2);
        assert!(r.is_static);
    }

    #[test]
    fn test_resolve_with_limits_sums() {
        // two surfaces plus an axle term
        let r = resolve_with_limits(12.0, 0.0, 5.0 + 6.0 + 2.0, 9.0);
        assert!(r.is_static);
        let r = resolve_with_limits(14.0, 0.0, 13.0, 9.0);
        assert!(!r.is_static);
        assert!((r.net(14.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_settles() {
        // moving forward, decelerating hard enough to stop in one step
        assert!(settles(0.01, -2.0, 0.01, 1.0, 5.0));
        // would not reach zero this step
        assert!(!settles(0.5, -2.0, 0.01, 1.0, 5.0));
        // accelerating, not decelerating
        assert!(!settles(0.01, 2.0, 0.01, 1.0, 5.0));
        // static friction cannot hold the driving force
        assert!(!settles(0.01, -2.0, 0.01, 6.0, 5.0));
    }

    #[test]
    fn test_coefficients_check() {
        assert!(FrictionCoefficients::new(0.5, 0.3).check("block").is_ok());
        assert!(FrictionCoefficients::uniform(0.4).check("block").is_ok());
        assert!(FrictionCoefficients::frictionless().check("block").is_ok());

        let err = FrictionCoefficients::new(0.2, 0.3).check("block").unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("block"));

        assert!(FrictionCoefficients::new(0.2, -0.1).check("block").is_err());
        assert!(FrictionCoefficients::new(f64::NAN, 0.1).check("block").is_err());
    }

    #[test]
    fn test_coefficients_limits() {
        let mu = FrictionCoefficients::new(0.5, 0.4);
        assert!((mu.max_static(10.0) - 5.0).abs() < 1e-12);
        assert!((mu.kinetic(-10.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_coefficients_schema_validation() {
        assert!(FrictionCoefficients::new(0.5, 0.4).validate().is_ok());
        assert!(FrictionCoefficients::new(-0.5, 0.4).validate().is_err());
    }
}
