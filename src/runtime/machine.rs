//! The state machine handle.

use crate::builder::GraphBuilder;
use crate::config::RuntimeConfig;
use crate::core::{Effect, Event, State, StateGraph};
use crate::effects::EffectBroadcaster;
use crate::runtime::activation::{Activation, ActivationGate, GateSignal};
use crate::runtime::error::RuntimeError;
use crate::runtime::observer::{Published, StateStream};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

/// State shared by the handle, the activation gate, sessions and jobs.
pub(crate) struct MachineCore<S, E, F> {
    pub(crate) graph: StateGraph<S, E, F>,
    pub(crate) effects: EffectBroadcaster<F>,
    pub(crate) published: Arc<Published<S>>,
    pub(crate) events: mpsc::UnboundedSender<E>,
    pub(crate) signals: mpsc::UnboundedSender<GateSignal>,
    pub(crate) failure: Mutex<Option<Arc<RuntimeError>>>,
    pub(crate) grace_period: Option<Duration>,
    pub(crate) span: Span,
    scope: CancellationToken,
}

impl<S, E, F> MachineCore<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub(crate) fn send(&self, event: E) -> Result<(), RuntimeError> {
        if self.scope.is_cancelled() {
            return Err(RuntimeError::Closed);
        }
        self.events.send(event).map_err(|_| RuntimeError::Closed)
    }
}

struct Shared<S, E, F> {
    id: Uuid,
    name: String,
    core: Arc<MachineCore<S, E, F>>,
    status: watch::Receiver<Activation>,
    scope: CancellationToken,
    _guard: DropGuard,
}

/// Handle to a running hierarchical state machine.
///
/// Cloning is cheap; all clones drive the same machine. The machine stops
/// when its scope is cancelled, when [`shutdown`](Self::shutdown) is called,
/// when a side effect fails, or when the last handle is dropped.
///
/// # Example
///
/// ```
/// use futures_util::StreamExt;
/// use strata::config::RuntimeConfig;
/// use strata::runtime::state_machine;
/// use strata::{event_enum, state_enum};
///
/// state_enum! {
///     enum Light {
///         Off,
///         On,
///     }
/// }
///
/// event_enum! {
///     enum Switch {
///         Toggle,
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), strata::runtime::RuntimeError> {
/// let machine = state_machine::<_, _, (), _>(Light::Off, RuntimeConfig::default(), |graph| {
///     graph
///         .state("Off", |s| s.on_event("Toggle", |_, _| Light::On))
///         .state("On", |s| s.on_event("Toggle", |_, _| Light::Off))
/// })?;
///
/// let mut states = machine.observe();
/// assert_eq!(states.next().await, Some(Light::Off));
///
/// machine.send(Switch::Toggle)?;
/// assert_eq!(states.next().await, Some(Light::On));
/// # Ok(())
/// # }
/// ```
pub struct StateMachine<S, E, F> {
    shared: Arc<Shared<S, E, F>>,
}

impl<S, E, F> Clone for StateMachine<S, E, F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, E, F> StateMachine<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    /// Start a machine in its own scope on the current Tokio runtime.
    pub fn spawn(
        initial: S,
        graph: StateGraph<S, E, F>,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        Self::spawn_in(&CancellationToken::new(), initial, graph, config)
    }

    /// Start a machine whose scope ends when `host` is cancelled.
    pub fn spawn_in(
        host: &CancellationToken,
        initial: S,
        graph: StateGraph<S, E, F>,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let config = config.validated()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let id = Uuid::new_v4();
        let span = info_span!("state_machine", machine = %config.name, %id);
        let scope = host.child_token();

        let (events, events_rx) = mpsc::unbounded_channel();
        let (signals, signals_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(Activation::Cold);

        let core = Arc::new(MachineCore {
            graph,
            effects: EffectBroadcaster::new(config.effect_backlog_warning),
            published: Arc::new(Published::new(initial)),
            events,
            signals,
            failure: Mutex::new(None),
            grace_period: config.grace_period(),
            span: span.clone(),
            scope: scope.clone(),
        });

        let gate = ActivationGate::new(Arc::clone(&core), events_rx, scope.clone(), status_tx);
        runtime.spawn(gate.run(signals_rx).instrument(span.clone()));
        span.in_scope(|| info!(activation = ?config.activation, "state machine spawned"));

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                name: config.name,
                core,
                status,
                scope: scope.clone(),
                _guard: scope.drop_guard(),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queue `event`. Never blocks; events are folded in send order.
    ///
    /// Events sent while Cold wait for the next activation. Fails with
    /// [`RuntimeError::Closed`] once the machine has stopped.
    pub fn send(&self, event: E) -> Result<(), RuntimeError> {
        self.shared.core.send(event)
    }

    /// The last emitted state. Retained while Cold and after stopping.
    pub fn state(&self) -> S {
        self.shared.core.published.current()
    }

    /// Observe emitted states, starting with the current one.
    ///
    /// Under [`ActivationPolicy::WhileObserved`](crate::config::ActivationPolicy::WhileObserved)
    /// the first observer activates the machine.
    pub fn observe(&self) -> StateStream<S> {
        StateStream::attach(
            Arc::clone(&self.shared.core.published),
            self.shared.core.signals.clone(),
        )
    }

    pub fn observer_count(&self) -> usize {
        self.shared.core.published.observer_count()
    }

    /// Hand every effect to `callback` until this future is dropped or the machine stops.
    pub async fn consume_effects<C>(&self, callback: C)
    where
        C: FnMut(F),
    {
        tokio::select! {
            _ = self.shared.scope.cancelled() => {}
            _ = self.shared.core.effects.consume(callback) => {}
        }
    }

    /// Async variant of [`consume_effects`](Self::consume_effects).
    pub async fn consume_effects_async<C, Fut>(&self, callback: C)
    where
        C: FnMut(F) -> Fut,
        Fut: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.shared.scope.cancelled() => {}
            _ = self.shared.core.effects.consume_async(callback) => {}
        }
    }

    pub fn effect_consumer_count(&self) -> usize {
        self.shared.core.effects.consumer_count()
    }

    /// Effects triggered but not yet removed by a consumer.
    pub fn queued_effects(&self) -> usize {
        self.shared.core.effects.queued()
    }

    pub fn activation(&self) -> Activation {
        *self.shared.status.borrow()
    }

    /// Wait until the machine reaches `target`, or stops.
    pub async fn wait_for(&self, target: Activation) -> Activation {
        let mut status = self.shared.status.clone();
        let reached = status
            .wait_for(|activation| *activation == target || *activation == Activation::Stopped)
            .await
            .map(|activation| *activation);
        reached.unwrap_or(Activation::Stopped)
    }

    /// The side-effect failure that aborted the machine, if any.
    pub fn failure(&self) -> Option<Arc<RuntimeError>> {
        self.shared.core.failure.lock().clone()
    }

    /// Stop the machine: cancel every job child first and end all observer streams.
    pub async fn shutdown(&self) {
        self.shared.scope.cancel();
        self.wait_for(Activation::Stopped).await;
    }
}

/// Declare a graph with `build` and spawn a machine for it.
pub fn state_machine<S, E, F, B>(
    initial: S,
    config: RuntimeConfig,
    build: B,
) -> Result<StateMachine<S, E, F>, RuntimeError>
where
    S: State,
    E: Event,
    F: Effect,
    B: FnOnce(GraphBuilder<S, E, F>) -> GraphBuilder<S, E, F>,
{
    StateMachine::spawn(initial, build(GraphBuilder::new()).build(), config)
}
