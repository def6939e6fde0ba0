//! Property-based tests for event folding and hierarchical resolution.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use strata::runtime::EventDispatcher;
use strata::{event_enum, state_enum, EffectBroadcaster, GraphBuilder, StateGraph};

state_enum! {
    enum Level {
        Low(u8),
        High(u8),
        Idle,
    }
}

event_enum! {
    enum Input {
        Set(u8),
        Raise,
        Keep,
        Unknown,
    }
}

type Graph = StateGraph<Level, Input, u8>;

fn level_graph() -> Graph {
    GraphBuilder::<Level, Input, u8>::new()
        .on_event("Set", |_, event| match event {
            Input::Set(value) if *value >= 128 => Level::High(*value),
            Input::Set(value) => Level::Low(*value),
            _ => Level::Idle,
        })
        .on_event("Keep", |scope, _| scope.state().clone())
        .state("Low", |s| {
            s.on_event("Raise", |scope, _| match scope.state() {
                Level::Low(value) => Level::High(value.saturating_add(128)),
                other => other.clone(),
            })
        })
        .state("Idle", |s| s.on_event("Raise", |_, _| Level::Low(0)))
        .build()
}

prop_compose! {
    fn arbitrary_input()(variant in 0..4u8, value in any::<u8>()) -> Input {
        match variant {
            0 => Input::Set(value),
            1 => Input::Raise,
            2 => Input::Keep,
            _ => Input::Unknown,
        }
    }
}

proptest! {
    #[test]
    fn emitted_states_never_repeat_consecutively(
        inputs in prop::collection::vec(arbitrary_input(), 0..64),
    ) {
        let graph = level_graph();
        let effects = EffectBroadcaster::<u8>::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        let mut current = Level::Idle;
        let mut emitted = vec![current.clone()];
        for input in &inputs {
            if let Some(next) = dispatcher.step(&current, input) {
                emitted.push(next.clone());
                current = next;
            }
        }

        for pair in emitted.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }

    #[test]
    fn step_agrees_with_fold(
        inputs in prop::collection::vec(arbitrary_input(), 0..64),
    ) {
        let graph = level_graph();
        let effects = EffectBroadcaster::<u8>::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        let mut stepped = Level::Idle;
        let mut folded = Level::Idle;
        for input in &inputs {
            if let Some(next) = dispatcher.step(&stepped, input) {
                stepped = next;
            }
            folded = dispatcher.fold(&folded, input);
        }

        prop_assert_eq!(stepped, folded);
    }

    #[test]
    fn most_specific_declaration_handles_the_event(
        at_root in any::<bool>(),
        at_outer in any::<bool>(),
        at_inner in any::<bool>(),
        at_state in any::<bool>(),
    ) {
        let graph = precedence_graph([at_root, at_outer, at_inner, at_state]);
        let effects = EffectBroadcaster::<u8>::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        let expected = if at_state {
            Level::High(3)
        } else if at_inner {
            Level::High(2)
        } else if at_outer {
            Level::High(1)
        } else if at_root {
            Level::High(0)
        } else {
            Level::Low(0)
        };

        prop_assert_eq!(dispatcher.fold(&Level::Low(0), &Input::Raise), expected);
        prop_assert_eq!(graph.lineage(&Level::Low(0)).len(), 4);
    }

    #[test]
    fn undeclared_states_fall_back_to_the_root(value in any::<u8>()) {
        let graph = precedence_graph([true, true, true, true]);
        let effects = EffectBroadcaster::<u8>::new(16);
        let dispatcher = EventDispatcher::new(&graph, &effects);

        prop_assert_eq!(graph.lineage(&Level::High(value)).len(), 1);
        prop_assert_eq!(dispatcher.fold(&Level::High(value), &Input::Raise), Level::High(0));
    }
}

/// `Low` nested two groups deep, with `Raise` declared at the selected levels.
fn precedence_graph(levels: [bool; 4]) -> Graph {
    let [at_root, at_outer, at_inner, at_state] = levels;

    let mut graph = GraphBuilder::<Level, Input, u8>::new();
    if at_root {
        graph = graph.on_event("Raise", |_, _| Level::High(0));
    }
    graph
        .nested_state("Outer", |outer| {
            let outer = if at_outer {
                outer.on_event("Raise", |_, _| Level::High(1))
            } else {
                outer
            };
            outer.nested_state("Inner", |inner| {
                let inner = if at_inner {
                    inner.on_event("Raise", |_, _| Level::High(2))
                } else {
                    inner
                };
                inner.state("Low", |s| {
                    if at_state {
                        s.on_event("Raise", |_, _| Level::High(3))
                    } else {
                        s
                    }
                })
            })
        })
        .build()
}
