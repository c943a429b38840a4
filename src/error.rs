//! Error types for physlab.
//!
//! Only parameter ingestion is fallible. Stepping a validated model is
//! deterministic and never returns an error; the single runtime failure is
//! the non-finite guard that halts the engine when a state variable becomes
//! NaN or infinite.
//!
//! Physical end-states (planet collision, end of track, hard stops) are not
//! errors. They are reported through [`crate::demos::Terminal`].

use thiserror::Error;

/// Result type alias for physlab operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all physlab operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Configuration Errors =====
    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A named physical parameter is outside its admissible domain.
    #[error("Invalid parameter '{name}' = {value}: {constraint}")]
    InvalidParameter {
        /// Parameter name as it appears in the scenario file.
        name: String,
        /// Offending value.
        value: f64,
        /// Human-readable constraint that was violated.
        constraint: &'static str,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Schema validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Runtime Guard =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, value: f64, constraint: &'static str) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
            constraint,
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error was raised while ingesting parameters.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidParameter { .. }
                | Self::YamlParse(_)
                | Self::Validation(_)
        )
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Reject a quantity that must be strictly positive and finite.
///
/// Masses, lengths, radii and moments of inertia are divided by during
/// stepping, so zero or negative values are refused at ingestion.
///
/// # Errors
///
/// Returns [`SimError::InvalidParameter`] if `value` is not finite or `<= 0`.
pub fn require_positive(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::invalid_parameter(name, value, "must be positive and finite"))
    }
}

/// Reject a quantity that must be finite and non-negative.
///
/// # Errors
///
/// Returns [`SimError::InvalidParameter`] if `value` is not finite or `< 0`.
pub fn require_non_negative(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimError::invalid_parameter(name, value, "must be non-negative and finite"))
    }
}

/// Reject a non-finite quantity.
///
/// # Errors
///
/// Returns [`SimError::InvalidParameter`] if `value` is NaN or infinite.
pub fn require_finite(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::invalid_parameter(name, value, "must be finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_detection() {
        assert!(SimError::config("bad").is_configuration_error());
        assert!(SimError::invalid_parameter("mass", 0.0, "must be positive").is_configuration_error());

        let non_finite = SimError::NonFiniteValue {
            location: "theta".to_string(),
        };
        assert!(!non_finite.is_configuration_error());
        assert!(!SimError::serialization("x").is_configuration_error());
    }

    #[test]
    fn test_error_config_display() {
        let err = SimError::config("invalid parameter");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("invalid parameter"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = SimError::invalid_parameter("length", -1.0, "must be positive and finite");
        let msg = err.to_string();
        assert!(msg.contains("'length'"));
        assert!(msg.contains("-1"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_non_finite_display() {
        let err = SimError::NonFiniteValue {
            location: "orbit.velocity.x".to_string(),
        };
        assert!(err.to_string().contains("orbit.velocity.x"));
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive("mass", 1.0).is_ok());
        assert!(require_positive("mass", 0.0).is_err());
        assert!(require_positive("mass", -2.0).is_err());
        assert!(require_positive("mass", f64::NAN).is_err());
        assert!(require_positive("mass", f64::INFINITY).is_err());
    }

    #[test]
    fn test_require_non_negative() {
        assert!(require_non_negative("mu", 0.0).is_ok());
        assert!(require_non_negative("mu", 0.3).is_ok());
        assert!(require_non_negative("mu", -0.1).is_err());
    }

    #[test]
    fn test_require_finite() {
        assert!(require_finite("v0", -3.0).is_ok());
        assert!(require_finite("v0", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::other("disk gone");
        let err: SimError = io.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<f64>("not json").unwrap_err();
        let err: SimError = json_err.into();
        assert!(matches!(err, SimError::Serialization(_)));
    }
}
