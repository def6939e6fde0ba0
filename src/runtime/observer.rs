//! Fan-out of emitted states to observers.

use crate::runtime::activation::GateSignal;
use futures_core::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

struct Observers<S> {
    current: S,
    senders: Vec<(u64, mpsc::UnboundedSender<S>)>,
    next_id: u64,
    closed: bool,
}

/// The last emitted state and the observers waiting for the next one.
///
/// Each observer has its own channel, so no observer ever misses or
/// reorders an emitted state.
pub(crate) struct Published<S> {
    inner: Mutex<Observers<S>>,
}

impl<S: Clone> Published<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(Observers {
                current: initial,
                senders: Vec::new(),
                next_id: 0,
                closed: false,
            }),
        }
    }

    pub(crate) fn current(&self) -> S {
        self.inner.lock().current.clone()
    }

    pub(crate) fn publish(&self, state: S) {
        let mut inner = self.inner.lock();
        inner.senders.retain(|(_, tx)| tx.send(state.clone()).is_ok());
        inner.current = state;
    }

    /// Register an observer. The receiver starts with the current state.
    ///
    /// Returns no id once closed; that receiver ends after the current state.
    pub(crate) fn attach(&self) -> (Option<u64>, mpsc::UnboundedReceiver<S>) {
        let mut inner = self.inner.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        // the receiver is held below, so this cannot fail
        let _ = tx.send(inner.current.clone());

        if inner.closed {
            return (None, rx);
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.senders.push((id, tx));
        (Some(id), rx)
    }

    pub(crate) fn detach(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.senders.len();
        inner.senders.retain(|(observer, _)| *observer != id);
        inner.senders.len() < before
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.inner.lock().senders.len()
    }

    /// End every observer stream and refuse new registrations.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.senders.clear();
    }
}

/// Stream of the states a machine emits.
///
/// Starts with the state current at subscription time, then yields every
/// emitted state in order. Keeping the stream alive counts as observing
/// the machine; dropping it detaches. The stream ends once the machine stops.
pub struct StateStream<S: Clone> {
    id: Option<u64>,
    states: mpsc::UnboundedReceiver<S>,
    published: Arc<Published<S>>,
    signals: mpsc::UnboundedSender<GateSignal>,
}

impl<S: Clone> StateStream<S> {
    pub(crate) fn attach(
        published: Arc<Published<S>>,
        signals: mpsc::UnboundedSender<GateSignal>,
    ) -> Self {
        let (id, states) = published.attach();
        if id.is_some() {
            let _ = signals.send(GateSignal::Attached);
        }
        Self {
            id,
            states,
            published,
            signals,
        }
    }

    /// Wait for the next state, or `None` once the machine has stopped.
    pub async fn recv(&mut self) -> Option<S> {
        self.states.recv().await
    }
}

impl<S: Clone> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.states.poll_recv(cx)
    }
}

impl<S: Clone> Drop for StateStream<S> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if self.published.detach(id) {
                let _ = self.signals.send(GateSignal::Detached);
            }
        }
    }
}
