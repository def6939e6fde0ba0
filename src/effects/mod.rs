//! Effect broadcasting.
//!
//! Effects are one-shot notifications produced by transitions and side
//! effects. They are delivered to every subscribed consumer and removed
//! from the shared queue by whichever consumer finishes first.

mod broadcaster;
mod queue;

pub use broadcaster::EffectBroadcaster;
