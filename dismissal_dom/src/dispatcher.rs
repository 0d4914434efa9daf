// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: build a bubble path and walk it, honoring stop outcomes.
//!
//! Propagation is deliberately minimal:
//!
//! - [`propagation_path`] lists the targets an event visits: the target itself,
//!   then (for bubbling kinds on connected elements) its ancestors, the
//!   document and the window.
//! - [`run`] invokes a handler for each target in order. [`Outcome::Stop`]
//!   aborts immediately, which is how `stopImmediatePropagation` is modelled.
//! - "Default prevented" lives on the [`Event`] payload, not in [`Outcome`].
//!
//! ```
//! use dismissal_dom::dispatcher::{self, Event, Outcome};
//! use dismissal_dom::{Document, EventKind, EventTarget};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let list = doc.build("ul").append_to(body);
//! let item = doc.build("li").append_to(list);
//!
//! let path = dispatcher::propagation_path(&doc, EventTarget::Element(item), EventKind::Click);
//! let mut seen = Vec::new();
//! let mut event = Event::new(EventKind::Click, EventTarget::Element(item));
//! let stopped = dispatcher::run(&path, &mut event, |target, _| {
//!     seen.push(target);
//!     if target == EventTarget::Element(list) {
//!         Outcome::Stop
//!     } else {
//!         Outcome::Continue
//!     }
//! });
//!
//! assert_eq!(stopped, Some(EventTarget::Element(list)));
//! assert_eq!(seen, vec![EventTarget::Element(item), EventTarget::Element(list)]);
//! ```

use smallvec::SmallVec;

use crate::document::Document;
use crate::types::{ElementId, EventKind, EventTarget, Key, Modifiers};

/// Propagation control returned by handlers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep going.
    Continue,
    /// Abort propagation immediately, skipping the remaining listeners.
    Stop,
}

/// An event travelling through the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Where it happened.
    pub target: EventTarget,
    /// For focus events: the element losing (for `focus`/`focusin`) or gaining
    /// (for `blur`/`focusout`) focus, when the platform reports it.
    pub related_target: Option<ElementId>,
    /// For key events: the key.
    pub key: Option<Key>,
    /// For key events: held modifiers.
    pub modifiers: Modifiers,
    /// Set by handlers to suppress the default action.
    pub default_prevented: bool,
}

impl Event {
    /// A bare event with no related target and no key.
    pub fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            related_target: None,
            key: None,
            modifiers: Modifiers::empty(),
            default_prevented: false,
        }
    }

    /// Attach a related target.
    pub fn with_related(mut self, related: Option<ElementId>) -> Self {
        self.related_target = related;
        self
    }

    /// Attach a key and modifiers.
    pub fn with_key(mut self, key: Key, modifiers: Modifiers) -> Self {
        self.key = Some(key);
        self.modifiers = modifiers;
        self
    }

    /// Whether the event carries `key` with shift held.
    pub fn is_shift(&self, key: Key) -> bool {
        self.key == Some(key) && self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Whether the event carries `key` without shift.
    pub fn is_plain(&self, key: Key) -> bool {
        self.key == Some(key) && !self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Targets visited by an event of `kind` fired at `target`, in order.
pub fn propagation_path(
    doc: &Document,
    target: EventTarget,
    kind: EventKind,
) -> SmallVec<[EventTarget; 8]> {
    let mut path = SmallVec::new();
    path.push(target);
    if !kind.bubbles() {
        return path;
    }
    match target {
        EventTarget::Element(el) => {
            if !doc.is_connected(el) {
                return path;
            }
            path.extend(doc.ancestors(el).map(EventTarget::Element));
            path.push(EventTarget::Document);
            path.push(EventTarget::Window);
        }
        EventTarget::Document => path.push(EventTarget::Window),
        EventTarget::Window => {}
    }
    path
}

/// Run a handler over a propagation path and honor stop outcomes.
///
/// Returns `None` if every target was visited, or the target whose handler
/// returned [`Outcome::Stop`].
pub fn run<E>(
    path: &[EventTarget],
    event: &mut E,
    mut handler: impl FnMut(EventTarget, &mut E) -> Outcome,
) -> Option<EventTarget> {
    for &target in path {
        match handler(target, event) {
            Outcome::Continue => {}
            Outcome::Stop => return Some(target),
        }
    }
    None
}
