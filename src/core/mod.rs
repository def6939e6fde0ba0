//! Core state machine types.
//!
//! This module contains the immutable description of a machine:
//! - State, event and effect values via the `State`, `Event` and `Effect` traits
//! - Transition functions and side-effect declarations
//! - The `StateGraph` with its lineage-based resolution
//!
//! Nothing here spawns tasks; the `runtime` module drives these types.

mod graph;
mod key;
mod side_effect;
mod state;
mod transition;

pub use graph::{StateDefinition, StateGraph};
pub use key::{DefinitionId, KeyValue, SideEffectJobKey};
pub use side_effect::{JobFuture, SideEffect, SideEffectOutcome};
pub use state::{Effect, Event, State};
pub use transition::{TransitionFn, TransitionScope};
