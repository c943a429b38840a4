//! Scenario configuration with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe parameter structs per demo
//! - Range validation via `validator`
//! - Semantic validation by constructing the demo once
//!
//! # Example
//!
//! ```yaml
//! schema_version: "1.0"
//! name: "slope"
//! clock:
//!   max_frame_dt: 0.05
//! demo:
//!   kind: inclined-block
//!   params:
//!     angle_deg: 30.0
//!     friction:
//!       mu_static: 0.5
//!       mu_kinetic: 0.4
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::demos::{
    atwood, collision, disk, inclined_block, kinematics, lever, orbit, pendulum, spring_cart,
    Demo,
};
use crate::engine::clock::DEFAULT_MAX_FRAME_DT;
use crate::engine::jidoka::JidokaConfig;
use crate::error::{SimError, SimResult};

/// Top-level scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Scenario name.
    #[serde(default)]
    pub name: String,

    /// Frame clock settings.
    #[validate(nested)]
    #[serde(default)]
    pub clock: ClockConfig,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,

    /// Demo model and its parameters.
    #[serde(default)]
    pub demo: DemoConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;

        // Poka-Yoke: validate all constraints
        config.validate()?;

        config.validate_semantic()?;

        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        serde_yaml::to_string(self).map_err(|e| SimError::serialization(e.to_string()))
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        if let Some(substep) = self.clock.substep {
            if substep > self.clock.max_frame_dt * self.clock.time_scale {
                return Err(SimError::config(format!(
                    "substep {substep} s exceeds one clamped frame ({} s of simulated time)",
                    self.clock.max_frame_dt * self.clock.time_scale
                )));
            }
        }

        // Demo constructors own the cross-field physical checks
        let demo = Demo::from_config(&self.demo)?;
        if self.clock.substep.is_some() && demo.has_fixed_substep() {
            return Err(SimError::config(format!(
                "demo '{}' runs at its native substep ({} s); remove clock.substep",
                self.demo.kind(),
                demo.native_substep()
            )));
        }
        Ok(())
    }

    /// Substep to run: explicit override or the demo's native one.
    ///
    /// Demos whose per-step model is tuned to their native substep ignore
    /// the override.
    #[must_use]
    pub fn substep_for(&self, demo: &Demo) -> f64 {
        if demo.has_fixed_substep() {
            return demo.native_substep();
        }
        self.clock.substep.unwrap_or_else(|| demo.native_substep())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: String::new(),
            clock: ClockConfig::default(),
            jidoka: JidokaConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    name: Option<String>,
    substep: Option<f64>,
    max_frame_dt: Option<f64>,
    time_scale: Option<f64>,
    jidoka: Option<JidokaConfig>,
    demo: Option<DemoConfig>,
}

impl SimConfigBuilder {
    /// Set the scenario name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the physics substep in seconds.
    #[must_use]
    pub const fn substep(mut self, dt: f64) -> Self {
        self.substep = Some(dt);
        self
    }

    /// Set the per-frame clamp in seconds.
    #[must_use]
    pub const fn max_frame_dt(mut self, dt: f64) -> Self {
        self.max_frame_dt = Some(dt);
        self
    }

    /// Set the simulated-to-wall time ratio.
    #[must_use]
    pub const fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = Some(scale);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    pub const fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Select the demo.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // DemoConfig has a destructor
    pub fn demo(mut self, demo: DemoConfig) -> Self {
        self.demo = Some(demo);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(name) = self.name {
            config.name = name;
        }
        if self.substep.is_some() {
            config.clock.substep = self.substep;
        }
        if let Some(dt) = self.max_frame_dt {
            config.clock.max_frame_dt = dt;
        }
        if let Some(scale) = self.time_scale {
            config.clock.time_scale = scale;
        }
        if let Some(jidoka) = self.jidoka {
            config.jidoka = jidoka;
        }
        if let Some(demo) = self.demo {
            config.demo = demo;
        }

        config
    }
}

/// Frame clock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    /// Physics substep (s). `None` uses the demo's native substep.
    #[validate(range(min = 1e-6, max = 10.0))]
    #[serde(default)]
    pub substep: Option<f64>,

    /// Largest wall-clock delta consumed per frame (s).
    #[validate(range(min = 1e-4, max = 1.0))]
    #[serde(default = "default_max_frame_dt")]
    pub max_frame_dt: f64,

    /// Simulated seconds per wall-clock second.
    #[validate(range(min = 1e-3, max = 1e5))]
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

const fn default_max_frame_dt() -> f64 {
    DEFAULT_MAX_FRAME_DT
}

const fn default_time_scale() -> f64 {
    1.0
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            substep: None,
            max_frame_dt: default_max_frame_dt(),
            time_scale: default_time_scale(),
        }
    }
}

/// Parameters plus initial conditions of one demo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    default,
    bound(deserialize = "P: Deserialize<'de> + Default, I: Deserialize<'de> + Default")
)]
pub struct DemoSetup<P, I> {
    /// Model parameters.
    pub params: P,
    /// Initial conditions.
    pub initial: I,
}

impl<P, I> DemoSetup<P, I> {
    /// Pair parameters with initial conditions.
    pub const fn new(params: P, initial: I) -> Self {
        Self { params, initial }
    }
}

/// Demo selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DemoConfig {
    /// Block on an inclined plane.
    InclinedBlock(
        DemoSetup<inclined_block::InclinedBlockParams, inclined_block::InclinedBlockInitial>,
    ),
    /// Damped driven pendulum.
    Pendulum(DemoSetup<pendulum::PendulumParams, pendulum::PendulumInitial>),
    /// Two-disc collision.
    Collision(DemoSetup<collision::CollisionParams, collision::CollisionInitial>),
    /// Atwood machine on two inclines.
    Atwood(DemoSetup<atwood::AtwoodParams, atwood::AtwoodInitial>),
    /// Satellite orbit.
    Orbit(DemoSetup<orbit::OrbitParams, orbit::OrbitInitial>),
    /// Cart against a spring buffer.
    SpringCart(DemoSetup<spring_cart::SpringCartParams, spring_cart::SpringCartInitial>),
    /// Rigid lever.
    Lever(DemoSetup<lever::LeverParams, lever::LeverInitial>),
    /// Disk on a fixed axis.
    Disk(DemoSetup<disk::DiskParams, disk::DiskInitial>),
    /// Uniform and accelerated motion.
    Kinematics(DemoSetup<kinematics::KinematicsParams, kinematics::KinematicsInitial>),
}

impl DemoConfig {
    /// The `kind` tag of this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InclinedBlock(_) => "inclined-block",
            Self::Pendulum(_) => "pendulum",
            Self::Collision(_) => "collision",
            Self::Atwood(_) => "atwood",
            Self::Orbit(_) => "orbit",
            Self::SpringCart(_) => "spring-cart",
            Self::Lever(_) => "lever",
            Self::Disk(_) => "disk",
            Self::Kinematics(_) => "kinematics",
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::Pendulum(DemoSetup::default())
    }
}
