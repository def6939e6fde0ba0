//! Supervision of side-effect jobs.
//!
//! On every emitted state the supervisor diffs the desired job keys against
//! the running ones. Stale jobs are cancelled and joined most specific
//! first; only then are new jobs started, root first. Jobs whose key is
//! unchanged keep running untouched.

use crate::core::{Effect, Event, SideEffect, SideEffectJobKey, State};
use crate::runtime::error::RuntimeError;
use crate::runtime::machine::MachineCore;
use crate::runtime::scope::MachineScope;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, Instrument};

struct RunningJob {
    key: SideEffectJobKey,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub(crate) struct SideEffectSupervisor<S, E, F> {
    core: Arc<MachineCore<S, E, F>>,
    token: CancellationToken,
    failures: mpsc::UnboundedSender<RuntimeError>,
    running: Vec<RunningJob>,
}

impl<S, E, F> SideEffectSupervisor<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    /// Jobs are cancelled together with `token`; failures are reported on `failures`.
    pub(crate) fn new(
        core: Arc<MachineCore<S, E, F>>,
        token: CancellationToken,
        failures: mpsc::UnboundedSender<RuntimeError>,
    ) -> Self {
        Self {
            core,
            token,
            failures,
            running: Vec::new(),
        }
    }

    /// Bring the running jobs in line with `state`.
    pub(crate) async fn apply(&mut self, state: &S) {
        let core = Arc::clone(&self.core);
        let desired = core.graph.side_effects_for(state);

        let (mut retained, stale): (Vec<_>, Vec<_>) = self
            .running
            .drain(..)
            .partition(|job| desired.iter().any(|(key, _)| *key == job.key));

        for job in stale.into_iter().rev() {
            stop(job).await;
        }

        let mut running = Vec::with_capacity(desired.len());
        for (key, side_effect) in desired {
            match retained.iter().position(|job| job.key == key) {
                Some(index) => running.push(retained.swap_remove(index)),
                None => running.push(self.start(key, side_effect, state.clone())),
            }
        }
        self.running = running;
    }

    /// Cancel and join every job, most specific first.
    pub(crate) async fn shutdown(&mut self) {
        for job in self.running.drain(..).rev() {
            stop(job).await;
        }
    }

    fn start(
        &self,
        key: SideEffectJobKey,
        side_effect: &SideEffect<S, E, F>,
        state: S,
    ) -> RunningJob {
        let token = self.token.child_token();
        let scope = MachineScope::new(Arc::clone(&self.core), token.clone());
        let job = side_effect.start(state, scope);

        let span = debug_span!(
            parent: &self.core.span,
            "side_effect",
            definition = %key.definition,
            index = key.index,
        );
        let cancelled = token.clone();
        let failures = self.failures.clone();
        let definition = key.definition;
        let index = key.index;

        let handle = tokio::spawn(
            async move {
                debug!("side effect started");
                let outcome = tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        debug!("side effect cancelled");
                        return;
                    }
                    outcome = AssertUnwindSafe(job).catch_unwind() => outcome,
                };

                let source = match outcome {
                    Ok(Ok(())) => {
                        debug!("side effect completed");
                        return;
                    }
                    Ok(Err(err)) => err,
                    Err(panic) => {
                        anyhow::anyhow!("side effect panicked: {}", panic_message(&*panic))
                    }
                };

                let failure = RuntimeError::SideEffectFailed {
                    definition,
                    index,
                    source,
                };
                error!(error = %failure, "side effect failed");
                let _ = failures.send(failure);
            }
            .instrument(span),
        );

        RunningJob { key, token, handle }
    }
}

async fn stop(job: RunningJob) {
    job.token.cancel();
    if let Err(err) = job.handle.await {
        debug!(
            definition = %job.key.definition,
            index = job.key.index,
            error = %err,
            "side effect join failed"
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
