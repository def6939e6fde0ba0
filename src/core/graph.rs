//! Immutable description of a hierarchical state machine.
//!
//! A graph holds one definition per concrete state variant, one definition
//! per nested group, and the root definition. Each state or group names its
//! enclosing group, which yields the lineage used for transition resolution
//! and side-effect supervision.

use crate::core::key::{DefinitionId, SideEffectJobKey};
use crate::core::side_effect::SideEffect;
use crate::core::state::{Effect, Event, State};
use crate::core::transition::TransitionFn;
use std::collections::HashMap;

/// Side effects, transitions and parent link of one definition.
pub struct StateDefinition<S, E, F> {
    pub(crate) id: DefinitionId,
    pub(crate) parent: Option<&'static str>,
    pub(crate) side_effects: Vec<SideEffect<S, E, F>>,
    pub(crate) transitions: HashMap<&'static str, TransitionFn<S, E, F>>,
}

impl<S, E, F> StateDefinition<S, E, F> {
    pub(crate) fn empty(id: DefinitionId) -> Self {
        Self {
            id,
            parent: None,
            side_effects: Vec::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn id(&self) -> DefinitionId {
        self.id
    }

    /// The enclosing group, or `None` when the root encloses this definition.
    pub fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    pub fn side_effect_count(&self) -> usize {
        self.side_effects.len()
    }

    pub fn handles(&self, event: &str) -> bool {
        self.transitions.contains_key(event)
    }
}

/// Built-once, immutable state graph.
pub struct StateGraph<S, E, F> {
    pub(crate) root: StateDefinition<S, E, F>,
    pub(crate) states: HashMap<&'static str, StateDefinition<S, E, F>>,
    pub(crate) groups: HashMap<&'static str, StateDefinition<S, E, F>>,
}

impl<S, E, F> StateGraph<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub fn root(&self) -> &StateDefinition<S, E, F> {
        &self.root
    }

    /// The definition registered for a concrete state variant.
    pub fn state(&self, name: &str) -> Option<&StateDefinition<S, E, F>> {
        self.states.get(name)
    }

    /// The definition of a nested group.
    pub fn group(&self, name: &str) -> Option<&StateDefinition<S, E, F>> {
        self.groups.get(name)
    }

    /// Definitions from the state's own up to the root, most specific first.
    ///
    /// A state without a registered definition has only the root in its
    /// lineage. The ancestor walk visits each declared group at most once.
    pub fn lineage(&self, state: &S) -> Vec<&StateDefinition<S, E, F>> {
        let mut lineage = Vec::new();

        if let Some(own) = self.states.get(state.name()) {
            lineage.push(own);

            let mut parent = own.parent;
            let mut remaining = self.groups.len();
            while let Some(name) = parent {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;

                let Some(group) = self.groups.get(name) else {
                    break;
                };
                lineage.push(group);
                parent = group.parent;
            }
        }

        lineage.push(&self.root);
        lineage
    }

    /// The transition that handles `event` in `state`, if any.
    ///
    /// The first definition in the lineage that handles the event wins.
    pub fn resolve(&self, state: &S, event: &E) -> Option<&TransitionFn<S, E, F>> {
        self.lineage(state)
            .into_iter()
            .find_map(|definition| definition.transitions.get(event.name()))
    }

    /// Side effects that should run while `state` is current.
    ///
    /// Ordered root first, then by declaration order within each definition.
    pub fn side_effects_for(&self, state: &S) -> Vec<(SideEffectJobKey, &SideEffect<S, E, F>)> {
        self.lineage(state)
            .into_iter()
            .rev()
            .flat_map(|definition| {
                definition
                    .side_effects
                    .iter()
                    .enumerate()
                    .map(move |(index, side_effect)| {
                        let key = SideEffectJobKey {
                            definition: definition.id,
                            index,
                            value: side_effect.key_for(state),
                        };
                        (key, side_effect)
                    })
            })
            .collect()
    }
}
