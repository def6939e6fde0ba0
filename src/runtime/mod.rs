//! The async runtime that drives a state graph.
//!
//! A machine is made of a few cooperating parts:
//! - the activation gate, which owns the event queue and decides when the
//!   machine is Hot
//! - a session per Hot period, folding events with the [`EventDispatcher`]
//! - the side-effect supervisor, starting and stopping jobs per emitted state
//! - the effect broadcaster, shared with every transition and job
//!
//! Each part runs under a child of the machine's cancellation token, so
//! cancelling the machine unwinds jobs, then the session, then the gate.

mod activation;
mod dispatcher;
mod error;
mod machine;
mod observer;
mod scope;
mod session;
mod supervisor;

pub use activation::Activation;
pub use dispatcher::EventDispatcher;
pub use error::RuntimeError;
pub use machine::{state_machine, StateMachine};
pub use observer::StateStream;
pub use scope::MachineScope;
