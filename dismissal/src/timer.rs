// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-time timers and debounced tasks.
//!
//! [`TimerQueue`] is a keyed macrotask queue driven by an explicit clock in
//! milliseconds. Each key holds at most one pending timer, so scheduling a key
//! again replaces it and cancelling is always safe. Due timers are popped in
//! `(due time, scheduling order)` order, which is the order a browser runs
//! `setTimeout` callbacks.
//!
//! [`Debounce`] layers schedule/cancel/flush semantics over one key.
//!
//! ```
//! use dismissal::timer::{Debounce, TimerQueue};
//!
//! let mut q: TimerQueue<&str> = TimerQueue::new();
//! let redraw = Debounce::new("redraw", 75);
//!
//! redraw.schedule(&mut q);
//! q.advance_to(50);
//! redraw.schedule(&mut q); // pushed back to t = 125
//! assert_eq!(q.pop_due(100), None);
//! assert_eq!(q.pop_due(125), Some("redraw"));
//! ```

use core::hash::Hash;

use hashbrown::HashMap;

/// Default debounce window for clip-path recomputation, in milliseconds.
pub const CLIP_DEBOUNCE_MS: u64 = 75;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Pending {
    due: u64,
    seq: u64,
}

/// Keyed one-shot timers over a virtual clock.
#[derive(Clone, Debug)]
pub struct TimerQueue<K> {
    now: u64,
    seq: u64,
    pending: HashMap<K, Pending>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            now: 0,
            seq: 0,
            pending: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + core::fmt::Debug> TimerQueue<K> {
    /// Create an empty queue at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `key` to fire `delay` ms from now. Returns `true` if this
    /// replaced a pending timer.
    pub fn schedule(&mut self, key: K, delay: u64) -> bool {
        self.seq += 1;
        let due = self.now.saturating_add(delay);
        tracing::trace!(?key, due, "timer scheduled");
        self.pending
            .insert(key, Pending { due, seq: self.seq })
            .is_some()
    }

    /// Drop the pending timer for `key`. Returns `true` if one was pending.
    pub fn cancel(&mut self, key: K) -> bool {
        let cancelled = self.pending.remove(&key).is_some();
        if cancelled {
            tracing::trace!(?key, "timer cancelled");
        }
        cancelled
    }

    /// Drop every pending timer whose key satisfies `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.pending.retain(|k, _| !pred(k));
    }

    /// Whether `key` is pending.
    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    /// When `key` will fire, if pending.
    pub fn due_at(&self, key: K) -> Option<u64> {
        self.pending.get(&key).map(|p| p.due)
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// advancing the clock to its due time.
    pub fn pop_due(&mut self, until: u64) -> Option<K> {
        let (&key, &p) = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))?;
        self.pending.remove(&key);
        self.now = self.now.max(p.due);
        Some(key)
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn advance_to(&mut self, t: u64) {
        self.now = self.now.max(t);
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A debounced task bound to one timer key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Debounce<K> {
    key: K,
    window: u64,
}

impl<K: Copy + Eq + Hash + core::fmt::Debug> Debounce<K> {
    /// Debounce over `window` ms using `key`.
    pub fn new(key: K, window: u64) -> Self {
        Self { key, window }
    }

    /// The timer key.
    pub fn key(&self) -> K {
        self.key
    }

    /// (Re)start the window; a pending run is pushed back.
    pub fn schedule(&self, queue: &mut TimerQueue<K>) {
        queue.schedule(self.key, self.window);
    }

    /// Drop the pending run.
    pub fn cancel(&self, queue: &mut TimerQueue<K>) -> bool {
        queue.cancel(self.key)
    }

    /// Whether a run is pending.
    pub fn is_pending(&self, queue: &TimerQueue<K>) -> bool {
        queue.is_pending(self.key)
    }

    /// Take the pending run so the caller can perform it now. Returns `false`
    /// if nothing was pending.
    pub fn flush(&self, queue: &mut TimerQueue<K>) -> bool {
        queue.cancel(self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut q: TimerQueue<u8> = TimerQueue::new();
        q.schedule(1, 10);
        q.schedule(2, 0);
        q.schedule(3, 0);
        assert_eq!(q.pop_due(0), Some(2));
        assert_eq!(q.pop_due(0), Some(3));
        assert_eq!(q.pop_due(0), None, "not yet due");
        assert_eq!(q.pop_due(10), Some(1));
        assert_eq!(q.now(), 10);
        assert!(q.is_empty());
    }

    #[test]
    fn rescheduling_replaces_and_cancel_is_idempotent() {
        let mut q: TimerQueue<u8> = TimerQueue::new();
        assert!(!q.schedule(1, 5));
        assert!(q.schedule(1, 20), "second schedule replaces");
        assert_eq!(q.len(), 1);
        assert_eq!(q.due_at(1), Some(20));
        assert!(q.cancel(1));
        assert!(!q.cancel(1));
        assert_eq!(q.pop_due(100), None);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut q: TimerQueue<u8> = TimerQueue::new();
        q.advance_to(40);
        q.advance_to(10);
        assert_eq!(q.now(), 40);
        q.schedule(9, 0);
        assert_eq!(q.due_at(9), Some(40));
    }

    #[test]
    fn debounce_coalesces_bursts() {
        let mut q: TimerQueue<&str> = TimerQueue::new();
        let d = Debounce::new("clip", CLIP_DEBOUNCE_MS);
        for t in [0, 20, 40, 60] {
            q.advance_to(t);
            d.schedule(&mut q);
        }
        assert_eq!(q.pop_due(134), None);
        assert_eq!(q.pop_due(135), Some("clip"));
        assert!(!d.is_pending(&q));
    }

    #[test]
    fn debounce_flush_and_cancel() {
        let mut q: TimerQueue<&str> = TimerQueue::new();
        let d = Debounce::new("clip", 75);
        assert!(!d.flush(&mut q), "nothing to flush");
        d.schedule(&mut q);
        assert!(d.flush(&mut q));
        assert!(!d.is_pending(&q));
        d.schedule(&mut q);
        assert!(d.cancel(&mut q));
        assert_eq!(q.pop_due(u64::MAX), None);
    }

    #[test]
    fn cancel_where_filters_keys() {
        let mut q: TimerQueue<(u8, u8)> = TimerQueue::new();
        q.schedule((1, 0), 0);
        q.schedule((1, 1), 0);
        q.schedule((2, 0), 0);
        q.cancel_where(|&(owner, _)| owner == 1);
        assert_eq!(q.len(), 1);
        assert!(q.is_pending((2, 0)));
    }
}
