//! Fixed-step kinematic integrators.
//!
//! Every integrator advances a [`PhaseState`] by one substep given an
//! acceleration function `a(t, state)`:
//! - Euler (1st order, explicit)
//! - Semi-implicit Euler (1st order, symplectic)
//! - Velocity Verlet (2nd order, symplectic)
//! - RK4 (4th order)
//!
//! Steps are pure: the input state is taken by value and a new state is
//! returned. Model parameters are captured immutably by the acceleration
//! closure, so an integrator can never mutate them.
//!
//! # Energy Conservation
//!
//! Symplectic integrators (semi-implicit Euler, Verlet) keep the energy
//! error bounded over long runs. RK4 is more accurate per step but drifts
//! slowly.

use serde::{Deserialize, Serialize};

use crate::engine::state::{PhaseState, PhaseVector};

/// Numerical integrator trait.
pub trait Integrator {
    /// Advance `state` from time `t` by `dt`.
    ///
    /// `accel` returns the acceleration for a given time and state.
    fn step<V, F>(&self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V;

    /// Get the error order of this integrator.
    fn error_order(&self) -> u32;

    /// Check if integrator is symplectic (preserves phase space volume).
    fn is_symplectic(&self) -> bool;
}

/// Explicit Euler integrator.
///
/// ```text
/// x_{n+1} = x_n + h * v_n
/// v_{n+1} = v_n + h * a(t_n, x_n, v_n)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl EulerIntegrator {
    /// Create a new Euler integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for EulerIntegrator {
    fn step<V, F>(&self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V,
    {
        let a = accel(t, state);
        PhaseState {
            position: state.position + state.velocity * dt,
            velocity: state.velocity + a * dt,
        }
    }

    fn error_order(&self) -> u32 {
        1
    }

    fn is_symplectic(&self) -> bool {
        false
    }
}

/// Semi-implicit (symplectic) Euler integrator.
///
/// ```text
/// v_{n+1} = v_n + h * a(t_n, x_n, v_n)
/// x_{n+1} = x_n + h * v_{n+1}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEulerIntegrator;

impl SemiImplicitEulerIntegrator {
    /// Create a new semi-implicit Euler integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for SemiImplicitEulerIntegrator {
    fn step<V, F>(&self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V,
    {
        let a = accel(t, state);
        let velocity = state.velocity + a * dt;
        PhaseState {
            position: state.position + velocity * dt,
            velocity,
        }
    }

    fn error_order(&self) -> u32 {
        1
    }

    fn is_symplectic(&self) -> bool {
        true
    }
}

/// Velocity Verlet integrator.
///
/// Second-order and symplectic for position-only forces. Energy error
/// oscillates around the true value without secular drift.
///
/// ```text
/// a_n     = a(t_n, x_n, v_n)
/// x_{n+1} = x_n + h * v_n + h²/2 * a_n
/// a_{n+1} = a(t_n + h, x_{n+1}, v_n + h * a_n)
/// v_{n+1} = v_n + h/2 * (a_n + a_{n+1})
/// ```
///
/// Velocity-dependent forces (drag) see the explicit velocity estimate
/// `v_n + h * a_n` when evaluating `a_{n+1}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerletIntegrator;

impl VerletIntegrator {
    /// Create a new Verlet integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for VerletIntegrator {
    fn step<V, F>(&self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V,
    {
        let a0 = accel(t, state);
        let position = state.position + state.velocity * dt + a0 * (0.5 * dt * dt);
        let velocity_estimate = state.velocity + a0 * dt;
        let a1 = accel(t + dt, PhaseState::new(position, velocity_estimate));
        PhaseState {
            position,
            velocity: state.velocity + (a0 + a1) * (0.5 * dt),
        }
    }

    fn error_order(&self) -> u32 {
        2
    }

    fn is_symplectic(&self) -> bool {
        true
    }
}

/// Runge-Kutta 4th order integrator.
///
/// Fourth-order accurate, non-symplectic.
///
/// ```text
/// k1 = f(t,       y)
/// k2 = f(t + h/2, y + h/2 * k1)
/// k3 = f(t + h/2, y + h/2 * k2)
/// k4 = f(t + h,   y + h * k3)
/// y_{n+1} = y_n + h/6 * (k1 + 2*k2 + 2*k3 + k4)
/// ```
/// with `y = (x, v)` and `f(t, y) = (v, a(t, x, v))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4Integrator;

impl RK4Integrator {
    /// Create a new RK4 integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for RK4Integrator {
    fn step<V, F>(&self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V,
    {
        let half_dt = dt / 2.0;
        let sixth_dt = dt / 6.0;
        let x0 = state.position;
        let v0 = state.velocity;

        let k1_x = v0;
        let k1_v = accel(t, state);

        let k2_x = v0 + k1_v * half_dt;
        let k2_v = accel(t + half_dt, PhaseState::new(x0 + k1_x * half_dt, k2_x));

        let k3_x = v0 + k2_v * half_dt;
        let k3_v = accel(t + half_dt, PhaseState::new(x0 + k2_x * half_dt, k3_x));

        let k4_x = v0 + k3_v * dt;
        let k4_v = accel(t + dt, PhaseState::new(x0 + k3_x * dt, k4_x));

        PhaseState {
            position: x0 + (k1_x + k2_x * 2.0 + k3_x * 2.0 + k4_x) * sixth_dt,
            velocity: v0 + (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v) * sixth_dt,
        }
    }

    fn error_order(&self) -> u32 {
        4
    }

    fn is_symplectic(&self) -> bool {
        false
    }
}

/// Integrator selection for a demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegratorType {
    /// Explicit Euler.
    Euler,
    /// Semi-implicit Euler.
    #[default]
    SemiImplicitEuler,
    /// Velocity Verlet.
    VelocityVerlet,
    /// Classical Runge-Kutta 4.
    Rk4,
}

impl IntegratorType {
    /// Advance `state` by one substep with the selected method.
    #[must_use]
    pub fn step<V, F>(self, state: PhaseState<V>, t: f64, dt: f64, accel: F) -> PhaseState<V>
    where
        V: PhaseVector,
        F: Fn(f64, PhaseState<V>) -> V,
    {
        match self {
            Self::Euler => EulerIntegrator.step(state, t, dt, accel),
            Self::SemiImplicitEuler => SemiImplicitEulerIntegrator.step(state, t, dt, accel),
            Self::VelocityVerlet => VerletIntegrator.step(state, t, dt, accel),
            Self::Rk4 => RK4Integrator.step(state, t, dt, accel),
        }
    }

    /// Error order of the selected method.
    #[must_use]
    pub fn error_order(self) -> u32 {
        match self {
            Self::Euler => EulerIntegrator.error_order(),
            Self::SemiImplicitEuler => SemiImplicitEulerIntegrator.error_order(),
            Self::VelocityVerlet => VerletIntegrator.error_order(),
            Self::Rk4 => RK4Integrator.error_order(),
        }
    }

    /// Whether the selected method is symplectic.
    #[must_use]
    pub fn is_symplectic(self) -> bool {
        match self {
            Self::Euler => EulerIntegrator.is_symplectic(),
            Self::SemiImplicitEuler => SemiImplicitEulerIntegrator.is_symplectic(),
            Self::VelocityVerlet => VerletIntegrator.is_symplectic(),
            Self::Rk4 => RK4Integrator.is_symplectic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::Vec2;

    /// Unit harmonic oscillator `a = -x`.
    fn oscillator(_t: f64, s: PhaseState<f64>) -> f64 {
        -s.position
    }

    fn oscillator_energy(s: PhaseState<f64>) -> f64 {
        0.5 * s.velocity * s.velocity + 0.5 * s.position * s.position
    }

    fn run<I: Integrator>(integrator: &I, steps: usize, dt: f64) -> PhaseState<f64> {
        let mut state = PhaseState::new(1.0, 0.0);
        let mut t = 0.0;
        for _ in 0..steps {
            state = integrator.step(state, t, dt, oscillator);
            t += dt;
        }
        state
    }

    #[test]
    fn test_semi_implicit_update_order() {
        let s = SemiImplicitEulerIntegrator.step(PhaseState::new(0.0, 0.0), 0.0, 0.1, |_, _| 10.0);
        // velocity updated first, position uses new velocity
        assert!((s.velocity - 1.0).abs() < 1e-12);
        assert!((s.position - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_euler_update_order() {
        let s = EulerIntegrator.step(PhaseState::new(0.0, 0.0), 0.0, 0.1, |_, _| 10.0);
        assert!((s.velocity - 1.0).abs() < 1e-12);
        assert!(s.position.abs() < 1e-12);
    }

    #[test]
    fn test_verlet_constant_acceleration_is_exact() {
        let dt = 0.1;
        let mut state = PhaseState::new(0.0, 2.0);
        for i in 0..10 {
            state = VerletIntegrator.step(state, f64::from(i) * dt, dt, |_, _| -9.81);
        }
        let t = 1.0;
        let expected_x = 2.0 * t - 0.5 * 9.81 * t * t;
        assert!((state.position - expected_x).abs() < 1e-9);
        assert!((state.velocity - (2.0 - 9.81 * t)).abs() < 1e-9);
    }

    #[test]
    fn test_rk4_accuracy() {
        let dt = 0.01;
        let steps = 628;
        let state = run(&RK4Integrator, steps, dt);
        let t = dt * steps as f64;
        assert!((state.position - t.cos()).abs() < 1e-8);
        assert!((state.velocity + t.sin()).abs() < 1e-8);
    }

    #[test]
    fn test_rk4_uses_midpoint_time() {
        // a(t) = t integrates exactly under RK4 for a cubic position
        let s = RK4Integrator.step(PhaseState::new(0.0, 0.0), 0.0, 1.0, |t, _| t);
        assert!((s.velocity - 0.5).abs() < 1e-12);
        assert!((s.position - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_symplectic_energy_bounded() {
        let dt = 0.05;
        let steps = 20_000;
        let e0 = oscillator_energy(PhaseState::new(1.0, 0.0));
        let verlet = run(&VerletIntegrator, steps, dt);
        let semi = run(&SemiImplicitEulerIntegrator, steps, dt);
        let euler = run(&EulerIntegrator, steps, dt);

        assert!((oscillator_energy(verlet) - e0).abs() / e0 < 1e-3);
        assert!((oscillator_energy(semi) - e0).abs() / e0 < 0.05);
        // explicit Euler gains energy every step
        assert!(oscillator_energy(euler) > 2.0 * e0);
    }

    #[test]
    fn test_verlet_planar_free_particle() {
        let s = PhaseState::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, -1.0));
        let next = VerletIntegrator.step(s, 0.0, 0.5, |_, _| Vec2::zero());
        assert_eq!(next.position, Vec2::new(2.5, 1.5));
        assert_eq!(next.velocity, s.velocity);
    }

    #[test]
    fn test_verlet_drag_sees_velocity_estimate() {
        // a = -v: second evaluation sees v0 + a0*dt = 1 - 1 = 0
        let s = VerletIntegrator.step(PhaseState::new(0.0, 1.0), 0.0, 1.0, |_, st| -st.velocity);
        assert!((s.velocity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_integrator_properties() {
        assert_eq!(IntegratorType::Euler.error_order(), 1);
        assert_eq!(IntegratorType::SemiImplicitEuler.error_order(), 1);
        assert_eq!(IntegratorType::VelocityVerlet.error_order(), 2);
        assert_eq!(IntegratorType::Rk4.error_order(), 4);

        assert!(!IntegratorType::Euler.is_symplectic());
        assert!(IntegratorType::SemiImplicitEuler.is_symplectic());
        assert!(IntegratorType::VelocityVerlet.is_symplectic());
        assert!(!IntegratorType::Rk4.is_symplectic());
    }

    #[test]
    fn test_integrator_type_dispatch_matches_struct() {
        let s = PhaseState::new(0.3, -0.2);
        let a = IntegratorType::Rk4.step(s, 0.0, 0.01, oscillator);
        let b = RK4Integrator.step(s, 0.0, 0.01, oscillator);
        assert_eq!(a, b);
    }

    #[test]
    fn test_integrator_type_serde() {
        let json = serde_json::to_string(&IntegratorType::VelocityVerlet).unwrap();
        assert_eq!(json, "\"velocity-verlet\"");
        let back: IntegratorType = serde_json::from_str("\"rk4\"").unwrap();
        assert_eq!(back, IntegratorType::Rk4);
    }
}
