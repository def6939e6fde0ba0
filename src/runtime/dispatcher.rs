//! Folding events into states.

use crate::core::{Effect, Event, State, StateGraph, TransitionScope};
use crate::effects::EffectBroadcaster;
use tracing::trace;

/// Applies events to states through hierarchical resolution.
///
/// Stateless: the caller threads the current state through successive
/// calls, which keeps folding strictly sequential.
pub struct EventDispatcher<'a, S, E, F> {
    graph: &'a StateGraph<S, E, F>,
    effects: &'a EffectBroadcaster<F>,
}

impl<'a, S, E, F> EventDispatcher<'a, S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub fn new(graph: &'a StateGraph<S, E, F>, effects: &'a EffectBroadcaster<F>) -> Self {
        Self { graph, effects }
    }

    /// The state after `event`. Unhandled events leave the state unchanged.
    pub fn fold(&self, state: &S, event: &E) -> S {
        match self.graph.resolve(state, event) {
            Some(transition) => transition(&TransitionScope::new(state, self.effects), event),
            None => {
                trace!(state = state.name(), event = event.name(), "event ignored");
                state.clone()
            }
        }
    }

    /// The state after `event`, or `None` when it equals `state`.
    pub fn step(&self, state: &S, event: &E) -> Option<S> {
        let next = self.fold(state, event);
        if next == *state {
            trace!(state = state.name(), event = event.name(), "no-op transition suppressed");
            None
        } else {
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    #[derive(Clone, PartialEq, Debug)]
    enum Counter {
        Value(i32),
    }

    impl State for Counter {
        fn name(&self) -> &'static str {
            "Value"
        }
    }

    #[derive(Debug)]
    enum Op {
        Add(i32),
        Notify,
        Unknown,
    }

    impl Event for Op {
        fn name(&self) -> &'static str {
            match self {
                Self::Add(_) => "Add",
                Self::Notify => "Notify",
                Self::Unknown => "Unknown",
            }
        }
    }

    fn graph() -> StateGraph<Counter, Op, &'static str> {
        GraphBuilder::new()
            .state("Value", |s| {
                s.on_event("Add", |scope, event| match (scope.state(), event) {
                    (Counter::Value(v), Op::Add(n)) => Counter::Value(v + n),
                    (state, _) => state.clone(),
                })
                .on_event("Notify", |scope, _| scope.trigger("notified"))
            })
            .build()
    }

    #[test]
    fn fold_applies_resolved_transition() {
        let graph = graph();
        let effects = EffectBroadcaster::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        assert_eq!(dispatcher.fold(&Counter::Value(1), &Op::Add(2)), Counter::Value(3));
    }

    #[test]
    fn unhandled_event_is_ignored() {
        let graph = graph();
        let effects = EffectBroadcaster::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        assert_eq!(dispatcher.fold(&Counter::Value(1), &Op::Unknown), Counter::Value(1));
        assert_eq!(dispatcher.step(&Counter::Value(1), &Op::Unknown), None);
    }

    #[test]
    fn equal_successor_is_suppressed() {
        let graph = graph();
        let effects = EffectBroadcaster::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        assert_eq!(dispatcher.step(&Counter::Value(1), &Op::Add(0)), None);
        assert_eq!(dispatcher.step(&Counter::Value(1), &Op::Add(1)), Some(Counter::Value(2)));
    }

    #[test]
    fn suppressed_transition_still_queues_effects() {
        let graph = graph();
        let effects = EffectBroadcaster::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        assert_eq!(dispatcher.step(&Counter::Value(1), &Op::Notify), None);
        assert_eq!(dispatcher.step(&Counter::Value(1), &Op::Notify), None);
        assert_eq!(effects.queued(), 2);
    }
}
