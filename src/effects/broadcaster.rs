//! Multi-consumer broadcast of one-shot effects.

use crate::core::Effect;
use crate::effects::queue::{ConsumerId, EffectLog};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

struct Shared<F> {
    log: watch::Sender<EffectLog<F>>,
    next_consumer: AtomicU64,
    backlog_warning: usize,
}

/// Shared, ordered queue of effects with any number of consumers.
///
/// Every effect triggered while a consumer is subscribed reaches that
/// consumer exactly once, in trigger order. Effects triggered while nobody
/// is subscribed stay queued until the next consumer arrives.
pub struct EffectBroadcaster<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for EffectBroadcaster<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: Effect> EffectBroadcaster<F> {
    /// Create an empty broadcaster that warns once `backlog_warning` is exceeded.
    pub fn new(backlog_warning: usize) -> Self {
        let (log, _) = watch::channel(EffectLog::new());
        Self {
            shared: Arc::new(Shared {
                log,
                next_consumer: AtomicU64::new(0),
                backlog_warning,
            }),
        }
    }

    /// Append `effect` to the queue. Never blocks.
    pub fn trigger(&self, effect: F) {
        let mut pending = 0;
        let mut seq = 0;
        self.shared.log.send_modify(|log| {
            seq = log.push(effect);
            pending = log.pending();
        });
        trace!(seq, pending, "effect triggered");

        if pending == self.shared.backlog_warning.saturating_add(1) {
            warn!(
                pending,
                threshold = self.shared.backlog_warning,
                "effect backlog above warning threshold"
            );
        }
    }

    /// Effects queued and not yet removed by any consumer.
    pub fn queued(&self) -> usize {
        self.shared.log.borrow().pending()
    }

    pub fn consumer_count(&self) -> usize {
        self.shared.log.borrow().consumers()
    }

    /// Deliver effects to `callback` until the returned future is dropped.
    pub async fn consume<C>(&self, mut callback: C)
    where
        C: FnMut(F),
    {
        self.consume_async(move |effect| {
            callback(effect);
            std::future::ready(())
        })
        .await
    }

    /// Deliver effects to an async `callback` until the returned future is dropped.
    ///
    /// An effect counts as handled once the callback's future completes.
    /// Dropping this future mid-callback leaves the effect for other consumers.
    pub async fn consume_async<C, Fut>(&self, mut callback: C)
    where
        C: FnMut(F) -> Fut,
        Fut: Future<Output = ()>,
    {
        let id = self.shared.next_consumer.fetch_add(1, Ordering::Relaxed);
        let mut changes = self.shared.log.subscribe();
        self.shared.log.send_if_modified(|log| {
            log.subscribe(id);
            false
        });
        let _subscription = Subscription {
            log: &self.shared.log,
            id,
        };
        debug!(consumer = id, "effect consumer subscribed");

        loop {
            let next = {
                let log = changes.borrow_and_update();
                log.next_for(id)
            };

            let Some((seq, effect)) = next else {
                if changes.changed().await.is_err() {
                    return;
                }
                continue;
            };

            callback(effect).await;

            let mut removed = false;
            self.shared.log.send_if_modified(|log| {
                removed = log.acknowledge(id, seq);
                false
            });
            trace!(consumer = id, seq, removed, "effect delivered");

            tokio::task::yield_now().await;
        }
    }
}

struct Subscription<'a, F> {
    log: &'a watch::Sender<EffectLog<F>>,
    id: ConsumerId,
}

impl<F> Drop for Subscription<'_, F> {
    fn drop(&mut self) {
        self.log.send_if_modified(|log| {
            log.unsubscribe(self.id);
            false
        });
        debug!(consumer = self.id, "effect consumer unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn queued_effects_reach_first_consumer() {
        let effects = EffectBroadcaster::new(16);
        effects.trigger("a");
        effects.trigger("b");
        assert_eq!(effects.queued(), 2);

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let consumer = effects.clone();
        let task = tokio::spawn(async move {
            consumer.consume(move |e| sink.lock().push(e)).await;
        });

        settle().await;
        assert_eq!(*received.lock(), vec!["a", "b"]);
        assert_eq!(effects.queued(), 0);
        assert_eq!(effects.consumer_count(), 1);

        task.abort();
        let _ = task.await;
        assert_eq!(effects.consumer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_consumer_stops_without_losing_effects() {
        let effects = EffectBroadcaster::new(16);
        let token = CancellationToken::new();
        let first = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let effects = effects.clone();
            let token = token.clone();
            let first = Arc::clone(&first);
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    _ = effects.consume(|e| {
                        first.lock().push(e);
                        token.cancel();
                    }) => {}
                }
            })
        };

        settle().await;
        effects.trigger(1);
        effects.trigger(2);
        handle.await.unwrap();

        assert_eq!(*first.lock(), vec![1]);
        assert_eq!(effects.queued(), 1);
        assert_eq!(effects.consumer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn async_callbacks_complete_before_removal() {
        let effects = EffectBroadcaster::new(16);
        let consumer = effects.clone();
        let task = tokio::spawn(async move {
            consumer
                .consume_async(|_: u8| tokio::time::sleep(Duration::from_secs(1)))
                .await;
        });

        settle().await;
        effects.trigger(1);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(effects.queued(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(effects.queued(), 0);
        task.abort();
    }
}
