//! Builder for a single concrete state's definition.

use crate::core::{
    DefinitionId, Effect, Event, SideEffect, SideEffectOutcome, State, StateDefinition,
    TransitionFn, TransitionScope,
};
use crate::runtime::MachineScope;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// Transitions and side effects collected for one definition.
pub(crate) struct DefinitionParts<S, E, F> {
    side_effects: Vec<SideEffect<S, E, F>>,
    transitions: HashMap<&'static str, TransitionFn<S, E, F>>,
}

impl<S, E, F> DefinitionParts<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub(crate) fn new() -> Self {
        Self {
            side_effects: Vec::new(),
            transitions: HashMap::new(),
        }
    }

    pub(crate) fn on_event<T>(&mut self, event: &'static str, transition: T)
    where
        T: Fn(&TransitionScope<'_, S, F>, &E) -> S + Send + Sync + 'static,
    {
        self.transitions.insert(event, Arc::new(transition));
    }

    pub(crate) fn side_effect(&mut self, side_effect: SideEffect<S, E, F>) {
        self.side_effects.push(side_effect);
    }

    pub(crate) fn into_definition(
        self,
        id: DefinitionId,
        parent: Option<&'static str>,
    ) -> StateDefinition<S, E, F> {
        let mut definition = StateDefinition::empty(id);
        definition.parent = parent;
        definition.side_effects = self.side_effects;
        definition.transitions = self.transitions;
        definition
    }
}

/// Fluent builder for one concrete state variant.
///
/// Handed to the closure of [`GraphBuilder::state`](crate::builder::GraphBuilder::state).
pub struct StateBuilder<S, E, F> {
    parts: DefinitionParts<S, E, F>,
}

impl<S, E, F> StateBuilder<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub fn new() -> Self {
        Self {
            parts: DefinitionParts::new(),
        }
    }

    /// Handle events named `event` while in this state.
    ///
    /// Declaring the same event twice keeps the later transition.
    pub fn on_event<T>(mut self, event: &'static str, transition: T) -> Self
    where
        T: Fn(&TransitionScope<'_, S, F>, &E) -> S + Send + Sync + 'static,
    {
        self.parts.on_event(event, transition);
        self
    }

    /// Run `task` while in this state, restarting it whenever the state value changes.
    pub fn side_effect<T, Fut>(mut self, task: T) -> Self
    where
        T: Fn(S, MachineScope<S, E, F>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: SideEffectOutcome,
    {
        self.parts.side_effect(SideEffect::new(task));
        self
    }

    /// Run `task` while in this state, restarting it only when `key(state)` changes.
    pub fn side_effect_keyed<K, V, T, Fut>(mut self, key: K, task: T) -> Self
    where
        K: Fn(&S) -> V + Send + Sync + 'static,
        V: PartialEq + Debug + Send + Sync + 'static,
        T: Fn(S, MachineScope<S, E, F>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: SideEffectOutcome,
    {
        self.parts.side_effect(SideEffect::keyed(key, task));
        self
    }

    pub(crate) fn build(
        self,
        name: &'static str,
        parent: Option<&'static str>,
    ) -> StateDefinition<S, E, F> {
        self.parts.into_definition(DefinitionId::State(name), parent)
    }
}

impl<S, E, F> Default for StateBuilder<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    fn default() -> Self {
        Self::new()
    }
}
