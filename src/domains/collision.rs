//! Two-body contact resolution with a coefficient of restitution.
//!
//! Relative motion is split along the contact normal `n = (p2 - p1)/|p2 - p1|`
//! and the tangent `t = perp(n)`. Only normal components change:
//!
//! ```text
//! v1n' = ((m1 - e·m2)·v1n + (1 + e)·m2·v2n) / (m1 + m2)
//! v2n' = ((m2 - e·m1)·v2n + (1 + e)·m1·v1n) / (m1 + m2)
//! ```
//!
//! Tangential components pass through unchanged (frictionless contact).
//! Overlapping bodies are pushed apart by half the penetration each.

use serde::{Deserialize, Serialize};

use crate::engine::state::Vec2;

/// Circular rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Mass (kg).
    pub mass: f64,
    /// Radius (m).
    pub radius: f64,
    /// Center position (m).
    pub position: Vec2,
    /// Velocity (m/s).
    pub velocity: Vec2,
}

impl Body {
    /// Create a new body.
    #[must_use]
    pub const fn new(mass: f64, radius: f64, position: Vec2, velocity: Vec2) -> Self {
        Self {
            mass,
            radius,
            position,
            velocity,
        }
    }

    /// Linear momentum `m·v`.
    #[must_use]
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    /// Kinetic energy `½·m·|v|²`.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Check if position and velocity are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Details of a resolved contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Unit normal from body A to body B.
    pub normal: Vec2,
    /// Contact point, weighted by the radii.
    pub point: Vec2,
    /// Penetration depth before correction (m).
    pub penetration: f64,
    /// Normal impulse transferred to body B (N·s). Zero when separating.
    pub impulse: f64,
    /// Whether the bodies were approaching along the normal.
    pub approaching: bool,
}

/// Post-contact normal velocities for the 1D restitution law.
#[must_use]
pub fn normal_velocities(m1: f64, m2: f64, v1n: f64, v2n: f64, restitution: f64) -> (f64, f64) {
    let total = m1 + m2;
    let v1 = ((m1 - restitution * m2) * v1n + (1.0 + restitution) * m2 * v2n) / total;
    let v2 = ((m2 - restitution * m1) * v2n + (1.0 + restitution) * m1 * v1n) / total;
    (v1, v2)
}

/// Check whether two bodies overlap.
#[must_use]
pub fn in_contact(a: &Body, b: &Body) -> bool {
    a.position.distance(&b.position) < a.radius + b.radius
}

/// Resolve a contact between two bodies in place.
///
/// Returns `None` when the bodies do not overlap. Velocities are only
/// exchanged while the bodies approach each other along the normal, so a
/// pair still overlapping after a bounce is separated without a second
/// impulse. Coincident centers have no normal and only report the contact.
pub fn resolve_collision(a: &mut Body, b: &mut Body, restitution: f64) -> Option<Contact> {
    let delta = b.position - a.position;
    let distance = delta.magnitude();
    let min_distance = a.radius + b.radius;
    if distance >= min_distance {
        return None;
    }

    let normal = delta.normalize();
    let tangent = normal.perp();

    let v1n = a.velocity.dot(&normal);
    let v1t = a.velocity.dot(&tangent);
    let v2n = b.velocity.dot(&normal);
    let v2t = b.velocity.dot(&tangent);

    let approaching = v1n - v2n > 0.0;
    let mut impulse = 0.0;
    if approaching {
        let (v1n_new, v2n_new) = normal_velocities(a.mass, b.mass, v1n, v2n, restitution);
        a.velocity = normal * v1n_new + tangent * v1t;
        b.velocity = normal * v2n_new + tangent * v2t;
        impulse = b.mass * (v2n_new - v2n);
    }

    let penetration = min_distance - distance;
    let correction = normal * (penetration / 2.0);
    a.position -= correction;
    b.position += correction;

    let point = a.position + (b.position - a.position) * (a.radius / min_distance);

    Some(Contact {
        normal,
        point,
        penetration,
        impulse,
        approaching,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn head_on(restitution: f64) -> (Body, Body, Contact) {
        let mut a = Body::new(2.0, 0.5, Vec2::new(-0.45, 0.0), Vec2::new(3.0, 0.0));
        let mut b = Body::new(1.0, 0.5, Vec2::new(0.45, 0.0), Vec2::new(-1.0, 0.0));
        let contact = resolve_collision(&mut a, &mut b, restitution).unwrap();
        (a, b, contact)
    }

    #[test]
    fn test_no_contact_when_apart() {
        let mut a = Body::new(1.0, 0.5, Vec2::new(-2.0, 0.0), Vec2::new(1.0, 0.0));
        let mut b = Body::new(1.0, 0.5, Vec2::new(2.0, 0.0), Vec2::zero());
        assert!(!in_contact(&a, &b));
        assert!(resolve_collision(&mut a, &mut b, 1.0).is_none());
        assert_eq!(a.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_equal_mass_elastic_exchange() {
        let (v1, v2) = normal_velocities(1.0, 1.0, 2.0, 0.0, 1.0);
        assert!(v1.abs() < EPS);
        assert!((v2 - 2.0).abs() < EPS);
    }

    #[test]
    fn test_elastic_conserves_momentum_and_energy() {
        let a0 = Body::new(2.0, 0.5, Vec2::new(-0.45, 0.0), Vec2::new(3.0, 0.0));
        let b0 = Body::new(1.0, 0.5, Vec2::new(0.45, 0.0), Vec2::new(-1.0, 0.0));
        let (a, b, contact) = head_on(1.0);

        let p0 = a0.momentum() + b0.momentum();
        let p1 = a.momentum() + b.momentum();
        assert!((p0 - p1).magnitude() < EPS);

        let e0 = a0.kinetic_energy() + b0.kinetic_energy();
        let e1 = a.kinetic_energy() + b.kinetic_energy();
        assert!((e0 - e1).abs() < EPS);
        assert!(contact.approaching);
        assert!(contact.impulse > 0.0);
    }

    #[test]
    fn test_perfectly_inelastic_normal_velocity_matches() {
        let (a, b, _) = head_on(0.0);
        assert!((a.velocity.x - b.velocity.x).abs() < EPS);
    }

    #[test]
    fn test_positional_correction_separates() {
        let (a, b, contact) = head_on(1.0);
        assert!((contact.penetration - 0.1).abs() < EPS);
        assert!((a.position.distance(&b.position) - 1.0).abs() < EPS);
        // each body moves half the overlap regardless of mass
        assert!((a.position.x + 0.5).abs() < EPS);
        assert!((b.position.x - 0.5).abs() < EPS);
        // radius-weighted point sits on the contact plane for equal radii
        assert!(contact.point.x.abs() < EPS);
    }

    #[test]
    fn test_tangential_velocity_preserved() {
        let mut a = Body::new(1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0));
        let mut b = Body::new(1.0, 1.0, Vec2::new(1.5, 0.0), Vec2::new(0.0, -1.0));
        resolve_collision(&mut a, &mut b, 1.0).unwrap();
        // normal is +x, tangent is +y
        assert!((a.velocity.y - 2.0).abs() < EPS);
        assert!((b.velocity.y + 1.0).abs() < EPS);
        assert!(a.velocity.x.abs() < EPS);
        assert!((b.velocity.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_separating_pair_gets_no_impulse() {
        let mut a = Body::new(1.0, 0.5, Vec2::new(-0.4, 0.0), Vec2::new(-1.0, 0.0));
        let mut b = Body::new(1.0, 0.5, Vec2::new(0.4, 0.0), Vec2::new(1.0, 0.0));
        let contact = resolve_collision(&mut a, &mut b, 1.0).unwrap();
        assert!(!contact.approaching);
        assert!(contact.impulse.abs() < EPS);
        assert_eq!(a.velocity, Vec2::new(-1.0, 0.0));
        assert!((a.position.distance(&b.position) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_coincident_centers_are_finite() {
        let mut a = Body::new(1.0, 0.5, Vec2::zero(), Vec2::new(1.0, 0.0));
        let mut b = Body::new(1.0, 0.5, Vec2::zero(), Vec2::new(-1.0, 0.0));
        let contact = resolve_collision(&mut a, &mut b, 1.0).unwrap();
        assert!(a.is_finite() && b.is_finite());
        assert!(contact.point.is_finite());
    }
}
