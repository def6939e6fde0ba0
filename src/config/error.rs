//! Configuration error types.

use std::time::Duration;
use thiserror::Error;

/// A single problem found in a runtime configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Machine name must not be empty")]
    EmptyName,

    #[error("Grace period ({actual:?}) exceeds the maximum of {max:?}")]
    GracePeriodTooLong { max: Duration, actual: Duration },

    #[error("Effect backlog warning threshold must be at least 1")]
    ZeroBacklogThreshold,

    #[error("Configuration could not be parsed: {0}")]
    Parse(String),
}

/// Every problem found while validating a configuration.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid runtime configuration: {}", describe(.errors))]
pub struct InvalidConfig {
    pub errors: Vec<ConfigError>,
}

fn describe(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
