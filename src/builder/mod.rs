//! Builder API for declaring state graphs.
//!
//! Graphs are declared with fluent builders and frozen into an immutable
//! [`StateGraph`](crate::core::StateGraph) by `build`. The `state_enum!` and
//! `event_enum!` macros derive the variant discriminants the graph keys on.

mod graph;
pub mod macros;
mod state;

pub use graph::GraphBuilder;
pub use state::StateBuilder;
