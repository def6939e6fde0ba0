//! The shared effect log behind an [`EffectBroadcaster`](super::EffectBroadcaster).
//!
//! Effects carry a sequence number. The logical head is the oldest effect
//! not yet removed; a consumer removes it only if the head still holds the
//! sequence number it just finished, so each effect is removed exactly once.
//! Every subscribed consumer also has a cursor, and an entry is dropped from
//! memory only once the head and every cursor have moved past it.

use std::collections::{HashMap, VecDeque};

pub(crate) type ConsumerId = u64;

pub(crate) struct EffectLog<F> {
    entries: VecDeque<F>,
    base: u64,
    head: u64,
    cursors: HashMap<ConsumerId, u64>,
}

impl<F> EffectLog<F> {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            base: 0,
            head: 0,
            cursors: HashMap::new(),
        }
    }

    fn tail(&self) -> u64 {
        self.base + self.entries.len() as u64
    }

    /// Append an effect and return its sequence number.
    pub(crate) fn push(&mut self, effect: F) -> u64 {
        let seq = self.tail();
        self.entries.push_back(effect);
        seq
    }

    /// Effects queued and not yet removed.
    pub(crate) fn pending(&self) -> usize {
        (self.tail() - self.head) as usize
    }

    pub(crate) fn consumers(&self) -> usize {
        self.cursors.len()
    }

    fn get(&self, seq: u64) -> Option<&F> {
        let offset = seq.checked_sub(self.base)?;
        self.entries.get(usize::try_from(offset).ok()?)
    }

    /// Start delivering to `id` from the current head. Removed effects are never replayed.
    pub(crate) fn subscribe(&mut self, id: ConsumerId) {
        self.cursors.insert(id, self.head);
    }

    pub(crate) fn unsubscribe(&mut self, id: ConsumerId) {
        self.cursors.remove(&id);
        self.compact();
    }

    /// Mark `seq` as handled by `id`. Returns `true` if this call removed it.
    pub(crate) fn acknowledge(&mut self, id: ConsumerId, seq: u64) -> bool {
        let removed = self.head == seq && seq < self.tail();
        if removed {
            self.head += 1;
        }
        if let Some(cursor) = self.cursors.get_mut(&id) {
            *cursor = (*cursor).max(seq + 1);
        }
        self.compact();
        removed
    }

    fn compact(&mut self) {
        let low = self
            .cursors
            .values()
            .copied()
            .fold(self.head, u64::min);
        while self.base < low && self.entries.pop_front().is_some() {
            self.base += 1;
        }
    }
}

impl<F: Clone> EffectLog<F> {
    /// The next effect owed to `id`, with its sequence number.
    pub(crate) fn next_for(&self, id: ConsumerId) -> Option<(u64, F)> {
        let cursor = *self.cursors.get(&id)?;
        self.get(cursor).map(|effect| (cursor, effect.clone()))
    }
}
