//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata::{event_enum, state_enum, StateStream};

pub const VALUE: &str = "I am a value";

state_enum! {
    pub enum TestState {
        StateA(String),
        StateB(String),
        StateC(String),
        NestedStateA(String),
        NestedStateB(String),
    }
}

impl TestState {
    pub fn value(&self) -> &str {
        match self {
            Self::StateA(value)
            | Self::StateB(value)
            | Self::StateC(value)
            | Self::NestedStateA(value)
            | Self::NestedStateB(value) => value,
        }
    }

    pub fn a() -> Self {
        Self::StateA(VALUE.to_string())
    }
}

event_enum! {
    pub enum TestEvent {
        MoveForward,
        Append(String),
        Close,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TestEffect {
    Close,
    Count(u32),
}

/// Let every ready task run and advance paused time by a millisecond.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn take(states: &mut StateStream<TestState>, count: usize) -> Vec<TestState> {
    let mut taken = Vec::with_capacity(count);
    while taken.len() < count {
        match states.recv().await {
            Some(state) => taken.push(state),
            None => break,
        }
    }
    taken
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Set while a job holding the matching [`Alive`] guard is running.
#[derive(Clone, Default)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn enter(&self) -> Alive {
        self.0.store(true, Ordering::SeqCst);
        Alive(Arc::clone(&self.0))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Alive(Arc<AtomicBool>);

impl Drop for Alive {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
