// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismiss stack: the ordered set of open instances.
//!
//! Entries are kept in open order. Escape routing reads [`DismissStack::top`];
//! closing removes by id wherever the entry sits. The stack reports the
//! empty/non-empty edges as [`StackTransition`]s so that its owner can keep
//! exactly one document-level Escape listener installed while it is non-empty.
//!
//! ```
//! use dismissal::{DismissStack, InstanceId, StackEntry, StackTransition};
//! # use dismissal_dom::Document;
//! # let mut doc = Document::new();
//! # let body = doc.body();
//! # let a_btn = doc.build("button").append_to(body);
//! # let b_btn = doc.build("button").append_to(body);
//!
//! let mut stack = DismissStack::new();
//! let a = InstanceId::new(1);
//! let b = InstanceId::new(2);
//! assert_eq!(stack.push(StackEntry::new(a, a_btn)), Some(StackTransition::BecameNonEmpty));
//! assert_eq!(stack.push(StackEntry::new(b, b_btn)), None);
//! assert_eq!(stack.top().map(|e| e.id), Some(b));
//!
//! // Out-of-order close.
//! let removed = stack.remove(a).unwrap();
//! assert_eq!(removed.transition, None);
//! let removed = stack.remove(b).unwrap();
//! assert_eq!(removed.transition, Some(StackTransition::BecameEmpty));
//! ```

use alloc::vec::Vec;

use dismissal_dom::ElementId;

use crate::types::InstanceId;

/// Base z-index of overlays; containers sit one above.
pub const OVERLAY_Z_BASE: i32 = 999;

/// What the stack remembers about an open instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackEntry {
    /// Owning instance.
    pub id: InstanceId,
    /// The trigger, focused when Escape closes this entry.
    pub menu_button: ElementId,
    /// Whether a clip record lives as long as this entry.
    pub overlay_clipped: bool,
    /// Whether Escape closes this entry.
    pub escape_key: bool,
}

impl StackEntry {
    /// A minimal entry: trigger only, Escape enabled.
    pub fn new(id: InstanceId, menu_button: ElementId) -> Self {
        Self {
            id,
            menu_button,
            overlay_clipped: false,
            escape_key: true,
        }
    }
}

/// Empty/non-empty edges of the stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackTransition {
    /// Size went from 0 to 1.
    BecameNonEmpty,
    /// Size went from 1 to 0.
    BecameEmpty,
}

/// Result of [`DismissStack::remove`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    /// The removed entry. The runtime tears down the clip record of a
    /// clipped entry from it.
    pub entry: StackEntry,
    /// Set when this removal emptied the stack.
    pub transition: Option<StackTransition>,
}

/// Ordered open instances, most recently opened last.
#[derive(Clone, Debug, Default)]
pub struct DismissStack {
    entries: Vec<StackEntry>,
}

impl DismissStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Pushing an id that is already present is ignored.
    pub fn push(&mut self, entry: StackEntry) -> Option<StackTransition> {
        if self.depth_of(entry.id).is_some() {
            return None;
        }
        tracing::debug!(id = %entry.id, depth = self.entries.len(), "stack push");
        self.entries.push(entry);
        (self.entries.len() == 1).then_some(StackTransition::BecameNonEmpty)
    }

    /// Remove the entry for `id` wherever it sits.
    pub fn remove(&mut self, id: InstanceId) -> Option<Removal> {
        let pos = self.depth_of(id)?;
        let entry = self.entries.remove(pos);
        tracing::debug!(id = %id, depth = pos, "stack remove");
        Some(Removal {
            entry,
            transition: self
                .entries
                .is_empty()
                .then_some(StackTransition::BecameEmpty),
        })
    }

    /// The most recently opened entry.
    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    /// Position of `id`, counted from the bottom.
    pub fn depth_of(&self, id: InstanceId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Number of open entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &StackEntry> + '_ {
        self.entries.iter()
    }
}

/// Overlay z-index for an instance opened at `depth`.
pub fn overlay_z_index(depth: usize) -> i32 {
    OVERLAY_Z_BASE.saturating_add(depth_offset(depth))
}

/// Container z-index for an instance opened at `depth`; always above its overlay.
pub fn container_z_index(depth: usize) -> i32 {
    overlay_z_index(depth).saturating_add(1)
}

fn depth_offset(depth: usize) -> i32 {
    i32::try_from(depth).unwrap_or(i32::MAX)
}
