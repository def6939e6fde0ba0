//! Transition functions and the handle they run with.

use crate::core::state::{Effect, State};
use crate::effects::EffectBroadcaster;
use std::sync::Arc;

/// Handle passed to every transition function.
///
/// Gives read access to the state being transitioned from and lets the
/// transition queue effects alongside the state it returns.
pub struct TransitionScope<'a, S, F> {
    state: &'a S,
    effects: &'a EffectBroadcaster<F>,
}

impl<'a, S, F> TransitionScope<'a, S, F>
where
    S: State,
    F: Effect,
{
    pub(crate) fn new(state: &'a S, effects: &'a EffectBroadcaster<F>) -> Self {
        Self { state, effects }
    }

    /// The state the transition starts from.
    pub fn state(&self) -> &'a S {
        self.state
    }

    /// Queue `effect` for every effect consumer.
    ///
    /// Returns the current state unchanged, so a transition that only
    /// notifies can end with `scope.trigger(effect)`.
    pub fn trigger(&self, effect: F) -> S {
        self.effects.trigger(effect);
        self.state.clone()
    }
}

/// A pure transition from the current state and an event to the next state.
pub type TransitionFn<S, E, F> =
    Arc<dyn Fn(&TransitionScope<'_, S, F>, &E) -> S + Send + Sync>;
