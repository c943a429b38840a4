//! Physical state primitives.
//!
//! - [`Vec2`]: planar vector arithmetic for the collision and orbital models
//! - [`PhaseVector`]: the algebra an integrator needs from a coordinate type
//! - [`PhaseState`]: a `{position, velocity}` pair at a single instant
//! - angle wrapping helpers
//!
//! A `PhaseState` never carries derived quantities. Energies, forces and
//! momenta are recomputed from it on demand.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// 2D vector for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Vector of length `magnitude` at `angle` radians from the +x axis.
    #[must_use]
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Self {
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
        }
    }

    /// Magnitude squared.
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar (z-component) cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Counter-clockwise perpendicular `(-y, x)`.
    #[must_use]
    pub const fn perp(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Normalize to unit vector.
    ///
    /// A zero-length vector has no direction and normalizes to zero, so
    /// force terms built from it vanish instead of producing NaN.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            Self::zero()
        } else {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
        }
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*other - *self).magnitude()
    }

    /// Polar angle in radians, `atan2(y, x)`.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Coordinate algebra required by the integrators.
///
/// Implemented for `f64` (1D sliding and rotational systems) and [`Vec2`]
/// (planar systems).
pub trait PhaseVector:
    Copy + std::ops::Add<Output = Self> + std::ops::Sub<Output = Self> + std::ops::Mul<f64, Output = Self>
{
    /// Additive identity.
    fn zero() -> Self;

    /// Check if all components are finite.
    fn is_finite_value(&self) -> bool;
}

impl PhaseVector for f64 {
    fn zero() -> Self {
        0.0
    }

    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl PhaseVector for Vec2 {
    fn zero() -> Self {
        Self::zero()
    }

    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

/// Position/velocity pair at a single instant.
///
/// For rotational systems `position` is the angle (rad) and `velocity` the
/// angular velocity (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseState<V> {
    /// Position, or angle for rotational systems.
    pub position: V,
    /// Velocity, or angular velocity for rotational systems.
    pub velocity: V,
}

impl<V: PhaseVector> PhaseState<V> {
    /// Create a new phase state.
    #[must_use]
    pub const fn new(position: V, velocity: V) -> Self {
        Self { position, velocity }
    }

    /// State at rest at the origin.
    #[must_use]
    pub fn at_rest() -> Self {
        Self {
            position: V::zero(),
            velocity: V::zero(),
        }
    }

    /// Check if position and velocity are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite_value() && self.velocity.is_finite_value()
    }
}

/// Wrap an angle into `(-π, π]`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Wrap an angle into `[0, 2π)`.
#[must_use]
pub fn wrap_angle_positive(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Sign with an explicit zero, unlike `f64::signum`.
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_vec2_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -4.0);

        assert_eq!(a + b, Vec2::new(4.0, -2.0));
        assert_eq!(a - b, Vec2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
        assert!((a.dot(&b) - (-5.0)).abs() < EPS);
        assert!((a.cross(&b) - (-10.0)).abs() < EPS);
        assert!((b.magnitude() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_vec2_assign_ops() {
        let mut v = Vec2::new(1.0, 1.0);
        v += Vec2::new(2.0, 3.0);
        assert_eq!(v, Vec2::new(3.0, 4.0));
        v -= Vec2::new(1.0, 1.0);
        assert_eq!(v, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_vec2_normalize() {
        let n = Vec2::new(3.0, 4.0).normalize();
        assert!((n.magnitude() - 1.0).abs() < EPS);
        assert!((n.x - 0.6).abs() < EPS);
    }

    #[test]
    fn test_vec2_normalize_zero_is_zero() {
        assert_eq!(Vec2::zero().normalize(), Vec2::zero());
        assert_eq!(Vec2::new(1e-300, 0.0).normalize(), Vec2::zero());
    }

    #[test]
    fn test_vec2_perp_and_polar() {
        let v = Vec2::new(1.0, 0.0);
        assert_eq!(v.perp(), Vec2::new(0.0, 1.0));
        assert!(v.dot(&v.perp()).abs() < EPS);

        let p = Vec2::from_polar(2.0, PI / 2.0);
        assert!(p.x.abs() < EPS);
        assert!((p.y - 2.0).abs() < EPS);
        assert!((p.angle() - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_vec2_finite() {
        assert!(Vec2::new(1.0, 2.0).is_finite());
        assert!(!Vec2::new(f64::NAN, 2.0).is_finite());
        assert!(!Vec2::new(1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_phase_state_finite() {
        let s = PhaseState::new(1.0, 2.0);
        assert!(s.is_finite());
        let bad = PhaseState::new(Vec2::zero(), Vec2::new(f64::NAN, 0.0));
        assert!(!bad.is_finite());
        assert_eq!(PhaseState::<f64>::at_rest(), PhaseState::new(0.0, 0.0));
    }

    #[test]
    fn test_wrap_angle_range() {
        assert!((wrap_angle(PI) - PI).abs() < EPS);
        assert!((wrap_angle(-PI) - PI).abs() < EPS);
        assert!((wrap_angle(3.0 * PI / 2.0) - (-PI / 2.0)).abs() < 1e-9);
        assert!((wrap_angle(0.3) - 0.3).abs() < EPS);
        assert!((wrap_angle(0.3 + 4.0 * TAU) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_angle_positive_range() {
        assert!((wrap_angle_positive(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-9);
        assert!(wrap_angle_positive(TAU).abs() < 1e-9);
        assert!(wrap_angle_positive(-1e-18) < TAU);
    }

    #[test]
    fn test_sign() {
        assert!((sign(3.0) - 1.0).abs() < EPS);
        assert!((sign(-0.1) + 1.0).abs() < EPS);
        assert!(sign(0.0).abs() < EPS);
        assert!(sign(-0.0).abs() < EPS);
    }
}
