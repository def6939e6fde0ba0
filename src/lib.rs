//! Strata: a hierarchical, event-driven state machine runtime
//!
//! Strata is meant to be embedded in reactive applications as a state
//! container. States are declared in a hierarchy of nested groups; events
//! are folded one at a time through hierarchical transition lookup; side
//! effects run as supervised Tokio tasks for as long as their state (or an
//! enclosing group) is current; one-shot effects are broadcast to every
//! subscribed consumer.
//!
//! # Core Concepts
//!
//! - **State / Event / Effect**: plain values; states and events expose a
//!   variant discriminant via `name()`
//! - **StateGraph**: the immutable declaration, built with [`GraphBuilder`]
//! - **Side effects**: async jobs keyed by a value derived from the state;
//!   a job only restarts when its key changes
//! - **Activation**: a machine is Hot while observed (plus a grace period),
//!   or for its whole lifetime when configured eagerly
//!
//! # Example
//!
//! ```rust
//! use futures_util::StreamExt;
//! use strata::{event_enum, state_enum, state_machine, RuntimeConfig};
//!
//! state_enum! {
//!     enum Upload {
//!         Idle,
//!         Sending { attempt: u32 },
//!         Done,
//!     }
//! }
//!
//! event_enum! {
//!     enum Action {
//!         Start,
//!         Delivered,
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), strata::RuntimeError> {
//! let config = RuntimeConfig::default().eager();
//! let machine = state_machine::<_, _, String, _>(Upload::Idle, config, |graph| {
//!     graph
//!         .state("Idle", |s| s.on_event("Start", |_, _| Upload::Sending { attempt: 1 }))
//!         .state("Sending", |s| {
//!             s.on_event("Delivered", |scope, _| {
//!                 scope.trigger("uploaded".to_string());
//!                 Upload::Done
//!             })
//!             .side_effect(|_, scope| async move {
//!                 scope.send(Action::Delivered)
//!             })
//!         })
//! })?;
//!
//! let mut states = machine.observe();
//! machine.send(Action::Start)?;
//!
//! assert_eq!(states.next().await, Some(Upload::Idle));
//! assert_eq!(states.next().await, Some(Upload::Sending { attempt: 1 }));
//! assert_eq!(states.next().await, Some(Upload::Done));
//! assert_eq!(machine.queued_effects(), 1);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
pub mod runtime;

// Re-export commonly used types
pub use builder::GraphBuilder;
pub use config::{ActivationPolicy, RuntimeConfig};
pub use core::{Effect, Event, State, StateGraph};
pub use effects::EffectBroadcaster;
pub use runtime::{state_machine, Activation, MachineScope, RuntimeError, StateMachine, StateStream};
