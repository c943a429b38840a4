//! Jidoka (自働化) - stop the line on numerical blow-up.
//!
//! The guard inspects every state variable after each substep. A NaN or
//! infinity means the model left its valid domain; continuing would only
//! propagate garbage into the history and the display, so the engine halts
//! with [`SimError::NonFiniteValue`] naming the offending variable.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Jidoka violation types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JidokaViolation {
    /// Non-finite value (NaN or Inf) detected.
    NonFiniteValue {
        /// Location of the non-finite value (e.g. `"pendulum.theta"`).
        location: String,
        /// The non-finite value itself.
        value: f64,
    },
}

impl std::fmt::Display for JidokaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteValue { location, value } => {
                write!(f, "non-finite value {value} at {location}")
            }
        }
    }
}

impl From<JidokaViolation> for SimError {
    fn from(v: JidokaViolation) -> Self {
        match v {
            JidokaViolation::NonFiniteValue { location, .. } => Self::NonFiniteValue { location },
        }
    }
}

/// Jidoka guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JidokaConfig {
    /// NaN/Inf detection enabled.
    #[serde(default = "default_true")]
    pub check_finite: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self { check_finite: true }
    }
}

/// Guard run after every substep.
///
/// # Example
///
/// ```rust
/// use physlab::engine::jidoka::{JidokaConfig, JidokaGuard};
///
/// let mut guard = JidokaGuard::new(JidokaConfig::default());
/// assert!(guard.check("pendulum", &[("theta", 0.1), ("omega", 0.0)]).is_ok());
/// assert!(guard.check("pendulum", &[("theta", f64::NAN)]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    config: JidokaConfig,
    last_violation: Option<JidokaViolation>,
}

impl JidokaGuard {
    /// Create a new guard.
    #[must_use]
    pub const fn new(config: JidokaConfig) -> Self {
        Self {
            config,
            last_violation: None,
        }
    }

    /// Inspect named state variables of `demo`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NonFiniteValue` for the first NaN or infinite value.
    pub fn check(&mut self, demo: &str, state: &[(&'static str, f64)]) -> SimResult<()> {
        if !self.config.check_finite {
            return Ok(());
        }
        if let Some((name, value)) = state.iter().find(|(_, v)| !v.is_finite()) {
            let violation = JidokaViolation::NonFiniteValue {
                location: format!("{demo}.{name}"),
                value: *value,
            };
            tracing::warn!(%violation, "jidoka halt");
            self.last_violation = Some(violation.clone());
            return Err(violation.into());
        }
        Ok(())
    }

    /// Most recent violation, if any.
    #[must_use]
    pub const fn last_violation(&self) -> Option<&JidokaViolation> {
        self.last_violation.as_ref()
    }

    /// Forget the recorded violation.
    pub fn reset(&mut self) {
        self.last_violation = None;
    }
}

impl Default for JidokaGuard {
    fn default() -> Self {
        Self::new(JidokaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_state_passes() {
        let mut guard = JidokaGuard::default();
        assert!(guard.check("disk", &[("theta", 1.0), ("omega", -3.0)]).is_ok());
        assert!(guard.last_violation().is_none());
    }

    #[test]
    fn test_nan_detected_with_location() {
        let mut guard = JidokaGuard::default();
        let err = guard
            .check("orbit", &[("x", 1.0), ("vy", f64::NAN)])
            .unwrap_err();
        match err {
            SimError::NonFiniteValue { location } => assert_eq!(location, "orbit.vy"),
            other => panic!("unexpected error {other}"),
        }
        assert!(guard.last_violation().is_some());
    }

    #[test]
    fn test_infinity_detected() {
        let mut guard = JidokaGuard::default();
        assert!(guard.check("cart", &[("x", f64::INFINITY)]).is_err());
    }

    #[test]
    fn test_disabled_guard_passes_everything() {
        let mut guard = JidokaGuard::new(JidokaConfig { check_finite: false });
        assert!(guard.check("cart", &[("x", f64::NAN)]).is_ok());
    }

    #[test]
    fn test_reset_clears_violation() {
        let mut guard = JidokaGuard::default();
        let _ = guard.check("cart", &[("x", f64::NAN)]);
        guard.reset();
        assert!(guard.last_violation().is_none());
    }

    #[test]
    fn test_violation_display() {
        let v = JidokaViolation::NonFiniteValue {
            location: "lever.omega".to_string(),
            value: f64::NAN,
        };
        assert!(v.to_string().contains("lever.omega"));
    }
}
