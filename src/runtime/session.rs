//! One Hot period of a machine: the dispatch loop and its jobs.

use crate::core::{Effect, Event, State};
use crate::runtime::dispatcher::EventDispatcher;
use crate::runtime::error::RuntimeError;
use crate::runtime::machine::MachineCore;
use crate::runtime::supervisor::SideEffectSupervisor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, Instrument};

/// What a session hands back when it ends.
pub(crate) struct SessionEnd<E> {
    /// The event queue, with every event not yet folded still in it.
    pub(crate) events: mpsc::UnboundedReceiver<E>,
    pub(crate) failure: Option<RuntimeError>,
}

pub(crate) struct Session<E> {
    pub(crate) token: CancellationToken,
    pub(crate) handle: JoinHandle<SessionEnd<E>>,
}

impl<E: Event> Session<E> {
    /// Start folding `events` from the last published state.
    pub(crate) fn start<S, F>(
        core: Arc<MachineCore<S, E, F>>,
        events: mpsc::UnboundedReceiver<E>,
        parent: &CancellationToken,
    ) -> Self
    where
        S: State,
        F: Effect,
    {
        let token = parent.child_token();
        let span = debug_span!(parent: &core.span, "session");
        let handle = tokio::spawn(run(core, events, token.clone()).instrument(span));
        Self { token, handle }
    }
}

async fn run<S, E, F>(
    core: Arc<MachineCore<S, E, F>>,
    mut events: mpsc::UnboundedReceiver<E>,
    token: CancellationToken,
) -> SessionEnd<E>
where
    S: State,
    E: Event,
    F: Effect,
{
    let (failures_tx, mut failures) = mpsc::unbounded_channel();
    let mut supervisor = SideEffectSupervisor::new(Arc::clone(&core), token.clone(), failures_tx);
    let dispatcher = EventDispatcher::new(&core.graph, &core.effects);

    let mut state = core.published.current();
    debug!(state = state.name(), "session started");
    supervisor.apply(&state).await;

    let failure = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break None,
            Some(failure) = failures.recv() => break Some(failure),
            Some(event) = events.recv() => {
                let Some(next) = dispatcher.step(&state, &event) else {
                    continue;
                };
                debug!(from = state.name(), to = next.name(), event = event.name(), "transition");
                supervisor.apply(&next).await;
                core.published.publish(next.clone());
                state = next;
            }
        }
    };

    supervisor.shutdown().await;
    debug!(state = state.name(), "session ended");
    SessionEnd { events, failure }
}
