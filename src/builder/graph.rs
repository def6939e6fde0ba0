//! Builder for state graphs and nested groups.

use crate::builder::state::{DefinitionParts, StateBuilder};
use crate::core::{
    DefinitionId, Effect, Event, SideEffect, SideEffectOutcome, State, StateDefinition,
    StateGraph, TransitionScope,
};
use crate::runtime::MachineScope;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;

/// Fluent builder for a state graph.
///
/// The same builder describes the root of a graph and every nested group
/// inside it. Transitions and side effects declared directly on it belong to
/// the root (or group) definition and apply to every state below it.
///
/// # Example
///
/// ```
/// use strata::builder::GraphBuilder;
/// use strata::{event_enum, state_enum};
///
/// state_enum! {
///     enum Door {
///         Open,
///         Closed,
///         Locked,
///     }
/// }
///
/// event_enum! {
///     enum Action {
///         Push,
///         Lock,
///     }
/// }
///
/// let graph = GraphBuilder::<Door, Action, ()>::new()
///     .state("Open", |s| s.on_event("Push", |_, _| Door::Closed))
///     .nested_state("Shut", |shut| {
///         shut.on_event("Push", |_, _| Door::Open)
///             .state("Closed", |s| s.on_event("Lock", |_, _| Door::Locked))
///             .state("Locked", |s| s.on_event("Push", |scope, _| scope.state().clone()))
///     })
///     .build();
///
/// assert_eq!(graph.lineage(&Door::Locked).len(), 3);
/// ```
pub struct GraphBuilder<S, E, F> {
    name: Option<&'static str>,
    parts: DefinitionParts<S, E, F>,
    states: HashMap<&'static str, StateDefinition<S, E, F>>,
    groups: HashMap<&'static str, StateDefinition<S, E, F>>,
}

impl<S, E, F> GraphBuilder<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    /// Create a builder for the root of a graph.
    pub fn new() -> Self {
        Self::scoped(None)
    }

    fn scoped(name: Option<&'static str>) -> Self {
        Self {
            name,
            parts: DefinitionParts::new(),
            states: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Handle events named `event` in every state below this builder,
    /// unless a more specific definition handles them first.
    pub fn on_event<T>(mut self, event: &'static str, transition: T) -> Self
    where
        T: Fn(&TransitionScope<'_, S, F>, &E) -> S + Send + Sync + 'static,
    {
        self.parts.on_event(event, transition);
        self
    }

    /// Run `task` while any state below this builder is current,
    /// restarting it whenever the state value changes.
    pub fn side_effect<T, Fut>(mut self, task: T) -> Self
    where
        T: Fn(S, MachineScope<S, E, F>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: SideEffectOutcome,
    {
        self.parts.side_effect(SideEffect::new(task));
        self
    }

    /// Run `task` while any state below this builder is current,
    /// restarting it only when `key(state)` changes.
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

    /// Declare the concrete state variant `name`.
    ///
    /// A later declaration of the same variant replaces this one.
    pub fn state<B>(mut self, name: &'static str, build: B) -> Self
    where
        B: FnOnce(StateBuilder<S, E, F>) -> StateBuilder<S, E, F>,
    {
        let definition = build(StateBuilder::new()).build(name, self.name);
        self.states.insert(name, definition);
        self
    }

    /// Declare a nested group `name` enclosing the states declared inside it.
    ///
    /// Everything declared in the group is flattened into this builder.
    pub fn nested_state<B>(mut self, name: &'static str, build: B) -> Self
    where
        B: FnOnce(GraphBuilder<S, E, F>) -> GraphBuilder<S, E, F>,
    {
        let group = build(Self::scoped(Some(name)));

        self.groups.insert(
            name,
            group.parts.into_definition(DefinitionId::Group(name), self.name),
        );
        self.states.extend(group.states);
        self.groups.extend(group.groups);
        self
    }

    pub fn build(self) -> StateGraph<S, E, F> {
        StateGraph {
            root: self.parts.into_definition(DefinitionId::Root, None),
            states: self.states,
            groups: self.groups,
        }
    }
}

impl<S, E, F> Default for GraphBuilder<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    enum TestState {
        A,
        B,
        C,
    }

    impl State for TestState {
        fn name(&self) -> &'static str {
            match self {
                Self::A => "A",
                Self::B => "B",
                Self::C => "C",
            }
        }
    }

    #[derive(Debug)]
    enum TestEvent {
        Next,
    }

    impl Event for TestEvent {
        fn name(&self) -> &'static str {
            "Next"
        }
    }

    type Builder = GraphBuilder<TestState, TestEvent, ()>;

    #[test]
    fn empty_builder_yields_bare_root() {
        let graph = Builder::new().build();

        assert_eq!(graph.root().id(), DefinitionId::Root);
        assert_eq!(graph.root().side_effect_count(), 0);
        assert!(graph.state("A").is_none());
    }

    #[test]
    fn states_in_groups_link_to_their_group() {
        let graph = Builder::new()
            .state("A", |s| s)
            .nested_state("Outer", |outer| {
                outer
                    .state("B", |s| s)
                    .nested_state("Inner", |inner| inner.state("C", |s| s))
            })
            .build();

        assert_eq!(graph.state("A").and_then(|d| d.parent()), None);
        assert_eq!(graph.state("B").and_then(|d| d.parent()), Some("Outer"));
        assert_eq!(graph.state("C").and_then(|d| d.parent()), Some("Inner"));
        assert_eq!(graph.group("Inner").and_then(|d| d.parent()), Some("Outer"));
        assert_eq!(graph.group("Outer").and_then(|d| d.parent()), None);
    }

    #[test]
    fn later_state_declaration_replaces_earlier() {
        let graph = Builder::new()
            .state("A", |s| s.side_effect(|_, _| async {}).on_event("Next", |_, _| TestState::B))
            .state("A", |s| s.side_effect(|_, _| async {}).side_effect(|_, _| async {}))
            .build();

        let a = graph.state("A").map(|d| (d.side_effect_count(), d.handles("Next")));
        assert_eq!(a, Some((2, false)));
    }

    #[test]
    fn group_declaration_after_flat_one_wins() {
        let graph = Builder::new()
            .state("A", |s| s.on_event("Next", |_, _| TestState::B))
            .nested_state("Group", |group| group.state("A", |s| s))
            .build();

        let a = graph.state("A").map(|d| (d.parent(), d.handles("Next")));
        assert_eq!(a, Some((Some("Group"), false)));
    }

    #[test]
    fn later_transition_for_same_event_wins() {
        let graph = Builder::new()
            .on_event("Next", |_, _| TestState::B)
            .on_event("Next", |_, _| TestState::C)
            .build();

        let effects = crate::effects::EffectBroadcaster::new(usize::MAX);
        let scope = TransitionScope::new(&TestState::A, &effects);
        let next = graph
            .resolve(&TestState::A, &TestEvent::Next)
            .map(|transition| transition(&scope, &TestEvent::Next));

        assert_eq!(next, Some(TestState::C));
    }
}
