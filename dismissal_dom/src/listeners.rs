// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry with idempotent add/remove and instrumentation.
//!
//! A registration is identified by `(target, kind, handler)`, mirroring how
//! `addEventListener` deduplicates identical listeners. Unlike the platform,
//! the registry reports whether each call changed anything and counts the
//! changes, so callers can assert that listeners are installed exactly once
//! per cycle.

use alloc::vec::Vec;

use crate::types::{EventKind, EventTarget};

/// A single installed listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Registration<H> {
    /// Where the listener is attached.
    pub target: EventTarget,
    /// What it listens for.
    pub kind: EventKind,
    /// Host-defined handler key.
    pub handler: H,
    /// Removed before its first invocation.
    pub once: bool,
}

/// Add/remove counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Successful adds.
    pub added: u64,
    /// Successful explicit removes (including `once` consumption).
    pub removed: u64,
    /// Registrations dropped because their element was freed.
    pub purged: u64,
}

/// Installed listeners in installation order.
#[derive(Clone, Debug)]
pub struct ListenerRegistry<H> {
    entries: Vec<Registration<H>>,
    stats: ListenerStats,
}

impl<H> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            stats: ListenerStats::default(),
        }
    }
}

impl<H: Copy + Eq> ListenerRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a listener. Returns `false` if an identical one is already present.
    pub fn add(&mut self, target: EventTarget, kind: EventKind, handler: H, once: bool) -> bool {
        if self.contains(target, kind, handler) {
            return false;
        }
        self.entries.push(Registration {
            target,
            kind,
            handler,
            once,
        });
        self.stats.added += 1;
        true
    }

    /// Remove a listener. Returns `false` if it was not installed.
    pub fn remove(&mut self, target: EventTarget, kind: EventKind, handler: H) -> bool {
        let Some(pos) = self.position(target, kind, handler) else {
            return false;
        };
        self.entries.remove(pos);
        self.stats.removed += 1;
        true
    }

    /// Whether a listener is installed.
    pub fn contains(&self, target: EventTarget, kind: EventKind, handler: H) -> bool {
        self.position(target, kind, handler).is_some()
    }

    /// Snapshot of listeners for `(target, kind)` in installation order.
    pub fn snapshot(&self, target: EventTarget, kind: EventKind) -> Vec<Registration<H>> {
        self.entries
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .copied()
            .collect()
    }

    /// Consume a `once` listener before invoking it. Returns `false` if it
    /// was removed in the meantime.
    pub fn take_once(&mut self, reg: &Registration<H>) -> bool {
        self.remove(reg.target, reg.kind, reg.handler)
    }

    /// Number of listeners attached to `(target, kind)`.
    pub fn count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.entries
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .count()
    }

    /// Number of listeners whose handler satisfies `pred`.
    pub fn count_where(&self, mut pred: impl FnMut(&Registration<H>) -> bool) -> usize {
        self.entries.iter().filter(|r| pred(r)).count()
    }

    /// Remove every listener satisfying `pred`, counting each as a remove.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Registration<H>) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| !pred(r));
        let removed = before - self.entries.len();
        self.stats.removed += removed as u64;
        removed
    }

    /// Drop every listener whose target satisfies `dead`. Returns how many were dropped.
    pub fn purge(&mut self, mut dead: impl FnMut(EventTarget) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| !dead(r.target));
        let purged = before - self.entries.len();
        self.stats.purged += purged as u64;
        purged
    }

    /// Add/remove counters since creation.
    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    /// Total installed listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, target: EventTarget, kind: EventKind, handler: H) -> Option<usize> {
        self.entries
            .iter()
            .position(|r| r.target == target && r.kind == kind && r.handler == handler)
    }
}
