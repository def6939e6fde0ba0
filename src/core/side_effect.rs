//! Side-effect declarations.
//!
//! A side effect pairs a key function with an async task. The supervisor
//! keeps one job running per distinct key for as long as the declaring
//! definition is part of the current state's lineage.

use crate::core::key::KeyValue;
use crate::core::state::{Effect, Event, State};
use crate::runtime::MachineScope;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// Future type of a running side-effect job.
pub type JobFuture = BoxFuture<'static, anyhow::Result<()>>;

type KeyFn<S> = Arc<dyn Fn(&S) -> KeyValue + Send + Sync>;
type TaskFn<S, E, F> = Arc<dyn Fn(S, MachineScope<S, E, F>) -> JobFuture + Send + Sync>;

/// Values a side-effect task may finish with.
///
/// Tasks either return nothing or a `Result`; an `Err` aborts the machine.
pub trait SideEffectOutcome {
    fn into_result(self) -> anyhow::Result<()>;
}

impl SideEffectOutcome for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> SideEffectOutcome for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// A declared side effect: a key function and the task it supervises.
pub struct SideEffect<S, E, F> {
    key: KeyFn<S>,
    task: TaskFn<S, E, F>,
}

impl<S, E, F> SideEffect<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    /// Create a side effect whose job identity is `key(state)`.
    pub fn keyed<K, V, T, Fut>(key: K, task: T) -> Self
    where
        K: Fn(&S) -> V + Send + Sync + 'static,
        V: PartialEq + Debug + Send + Sync + 'static,
        T: Fn(S, MachineScope<S, E, F>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: SideEffectOutcome,
    {
        Self {
            key: Arc::new(move |state: &S| KeyValue::new(key(state))),
            task: Arc::new(move |state: S, scope: MachineScope<S, E, F>| {
                task(state, scope)
                    .map(SideEffectOutcome::into_result)
                    .boxed()
            }),
        }
    }

    /// Create a side effect keyed by the whole state value.
    ///
    /// The job restarts whenever a different state is emitted.
    pub fn new<T, Fut>(task: T) -> Self
    where
        T: Fn(S, MachineScope<S, E, F>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: SideEffectOutcome,
    {
        Self::keyed(S::clone, task)
    }

    pub(crate) fn key_for(&self, state: &S) -> KeyValue {
        (self.key)(state)
    }

    pub(crate) fn start(&self, state: S, scope: MachineScope<S, E, F>) -> JobFuture {
        (self.task)(state, scope)
    }
}

impl<S, E, F> Clone for SideEffect<S, E, F> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            task: Arc::clone(&self.task),
        }
    }
}
