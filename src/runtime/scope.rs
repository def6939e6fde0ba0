//! Handle given to side-effect jobs.

use crate::core::{Effect, Event, State};
use crate::runtime::error::RuntimeError;
use crate::runtime::machine::MachineCore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a running side-effect job can do with its machine.
///
/// Jobs send events back into the dispatcher, trigger effects, and observe
/// their own cancellation. The token is cancelled as soon as the job's key
/// leaves the desired set, the machine deactivates, or the machine stops.
pub struct MachineScope<S, E, F> {
    core: Arc<MachineCore<S, E, F>>,
    token: CancellationToken,
}

impl<S, E, F> MachineScope<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub(crate) fn new(core: Arc<MachineCore<S, E, F>>, token: CancellationToken) -> Self {
        Self { core, token }
    }

    /// Queue `event` behind every event already sent.
    pub fn send(&self, event: E) -> Result<(), RuntimeError> {
        self.core.send(event)
    }

    /// Queue `effect` and return the machine's current state.
    pub fn trigger(&self, effect: F) -> S {
        self.core.effects.trigger(effect);
        self.core.published.current()
    }

    /// The machine's last published state.
    pub fn state(&self) -> S {
        self.core.published.current()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once this job has been asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<S, E, F> Clone for MachineScope<S, E, F> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            token: self.token.clone(),
        }
    }
}
