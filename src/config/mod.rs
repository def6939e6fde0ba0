//! Runtime configuration.
//!
//! A [`RuntimeConfig`] decides when a machine is live and how it reports
//! itself. Validation uses Stillwater's `Validation` type, so every problem
//! is reported in one pass instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use strata::config::{ActivationPolicy, RuntimeConfig};
//! use std::time::Duration;
//!
//! let config = RuntimeConfig::from_json(
//!     r#"{
//!         "name": "checkout",
//!         "activation": { "mode": "while_observed", "grace_period_ms": 250 }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.name, "checkout");
//! assert_eq!(
//!     config.activation,
//!     ActivationPolicy::WhileObserved { grace_period: Duration::from_millis(250) }
//! );
//! ```

mod error;

pub use error::{ConfigError, InvalidConfig};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Grace period used when none is configured.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Longest grace period a machine accepts.
pub const MAX_GRACE_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Queued effect count above which triggering logs a warning.
pub const DEFAULT_EFFECT_BACKLOG_WARNING: usize = 1024;

const DEFAULT_NAME: &str = "state-machine";

/// When a machine processes events and runs side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Live from construction until the machine's scope is cancelled.
    Eager,

    /// Live while at least one observer is attached, and for
    /// `grace_period` after the last one detaches.
    WhileObserved {
        #[serde(rename = "grace_period_ms", with = "millis")]
        grace_period: Duration,
    },
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self::WhileObserved {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Configuration of a single machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name recorded on every tracing span of the machine.
    pub name: String,
    pub activation: ActivationPolicy,
    /// Warn once the effect queue holds more than this many entries.
    pub effect_backlog_warning: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            activation: ActivationPolicy::default(),
            effect_backlog_warning: DEFAULT_EFFECT_BACKLOG_WARNING,
        }
    }
}

impl RuntimeConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stay live for the whole lifetime of the machine.
    pub fn eager(mut self) -> Self {
        self.activation = ActivationPolicy::Eager;
        self
    }

    /// Go live while observed, keeping alive for `grace_period` afterwards.
    pub fn while_observed(mut self, grace_period: Duration) -> Self {
        self.activation = ActivationPolicy::WhileObserved { grace_period };
        self
    }

    pub fn with_effect_backlog_warning(mut self, threshold: usize) -> Self {
        self.effect_backlog_warning = threshold;
        self
    }

    /// Check every setting, accumulating all problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigError>>> = Vec::new();

        checks.push(if self.name.trim().is_empty() {
            Validation::fail(ConfigError::EmptyName)
        } else {
            Validation::success(())
        });

        if let ActivationPolicy::WhileObserved { grace_period } = self.activation {
            checks.push(if grace_period > MAX_GRACE_PERIOD {
                Validation::fail(ConfigError::GracePeriodTooLong {
                    max: MAX_GRACE_PERIOD,
                    actual: grace_period,
                })
            } else {
                Validation::success(())
            });
        }

        checks.push(if self.effect_backlog_warning == 0 {
            Validation::fail(ConfigError::ZeroBacklogThreshold)
        } else {
            Validation::success(())
        });

        Validation::all_vec(checks).map(|_| ())
    }

    /// Return the configuration if it is valid, or every problem found.
    pub fn validated(self) -> Result<Self, InvalidConfig> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(errors) => Err(InvalidConfig {
                errors: errors.iter().cloned().collect(),
            }),
        }
    }

    /// Parse and validate a JSON configuration. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, InvalidConfig> {
        let config: Self = serde_json::from_str(json).map_err(|err| InvalidConfig {
            errors: vec![ConfigError::Parse(err.to_string())],
        })?;
        config.validated()
    }

    pub(crate) fn grace_period(&self) -> Option<Duration> {
        match self.activation {
            ActivationPolicy::Eager => None,
            ActivationPolicy::WhileObserved { grace_period } => Some(grace_period),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
