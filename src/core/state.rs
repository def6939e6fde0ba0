//! Core traits for state machine values.
//!
//! States, events and effects are plain immutable values. States and events
//! carry a variant discriminant (`name`) that the graph uses as its lookup
//! key, so hierarchy and dispatch are table walks rather than type tests.

use std::fmt::Debug;

/// Trait for state machine states.
///
/// States are immutable values. A new state is only ever produced by a
/// transition function or supplied as the initial value of a machine.
///
/// # Required Traits
///
/// - `Clone`: the current state is handed to observers, jobs and transitions
/// - `PartialEq`: structurally equal successors are suppressed as no-ops
/// - `Debug`: states appear in tracing output
///
/// # Example
///
/// ```rust
/// use strata::core::State;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Form {
///     Loading,
///     Editing { value: String },
///     Saved,
/// }
///
/// impl State for Form {
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Loading => "Loading",
///             Self::Editing { .. } => "Editing",
///             Self::Saved => "Saved",
///         }
///     }
/// }
///
/// let state = Form::Editing { value: "draft".into() };
/// assert_eq!(state.name(), "Editing");
/// ```
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// The variant discriminant of this state.
    ///
    /// Every value of the same variant must return the same name; the
    /// payload does not take part in definition lookup.
    fn name(&self) -> &'static str;
}

/// Trait for events sent into a state machine.
///
/// Events have no behavior of their own. The discriminant selects the
/// transition; the payload is handed to the transition function.
pub trait Event: Debug + Send + 'static {
    /// The variant discriminant of this event.
    fn name(&self) -> &'static str;
}

/// One-shot notifications broadcast to effect consumers.
///
/// Implemented for every type that can be cloned into each consumer and
/// shared across tasks.
pub trait Effect: Clone + Debug + Send + Sync + 'static {}

impl<T> Effect for T where T: Clone + Debug + Send + Sync + 'static {}
