//! Runtime error types.

use crate::config::InvalidConfig;
use crate::core::DefinitionId;
use thiserror::Error;

/// Errors reported by a running state machine.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The machine has stopped and no longer accepts events.
    #[error("State machine is closed")]
    Closed,

    /// Spawning requires a Tokio runtime on the current thread.
    #[error("No Tokio runtime available to spawn the state machine on")]
    NoRuntime,

    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfig),

    /// A side-effect job returned an error or panicked.
    #[error("Side effect {index} of {definition} failed: {source}")]
    SideEffectFailed {
        definition: DefinitionId,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// An internal task ended abnormally.
    #[error("Runtime task failed: {0}")]
    TaskFailed(String),
}
