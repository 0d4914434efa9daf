// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal DOM: a deterministic, in-memory document model.
//!
//! This crate is the browser-facing half of the dismissal stack, reduced to
//! the pieces "dismiss on outside interaction" logic actually observes:
//!
//! - A tree of elements with generational [`ElementId`] handles, tag names,
//!   attributes, inline styles and host-supplied layout rectangles ([`Document`]).
//! - The read-only queries dismissal logic makes, as a trait a real DOM host
//!   can implement ([`DocumentView`]).
//! - CSS selector queries scoped to the document or to a container ([`Selector`]).
//! - The focused element (`active_element`), without any event machinery.
//! - A [`ListenerRegistry`] that deduplicates `(target, kind, handler)` and
//!   counts adds/removes for instrumentation.
//! - Bubble-path construction and a stop-aware walker in [`dispatcher`].
//! - Hit testing that honours z-index, `pointer-events: none` and cut-out
//!   regions ([`Document::hit_test`]).
//!
//! It does not schedule anything and fires no events on its own. A host (see
//! the `dismissal` crate's `Runtime`) decides event order, platform quirks and
//! timing, which keeps every ordering reproducible in tests.
//!
//! ## Minimal example
//!
//! ```rust
//! use dismissal_dom::{Document, EventKind, EventTarget, ListenerRegistry};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let menu = doc.build("div").attr("data-menu", "").append_to(body);
//! let item = doc.build("button").class("item").append_to(menu);
//!
//! assert_eq!(doc.query_selector(Some(menu), ".item"), Ok(Some(item)));
//! assert!(doc.contains(menu, item));
//!
//! let mut listeners: ListenerRegistry<u32> = ListenerRegistry::new();
//! assert!(listeners.add(EventTarget::Document, EventKind::Click, 7, false));
//! assert!(!listeners.add(EventTarget::Document, EventKind::Click, 7, false));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: `no_std` + `alloc` builds relying on `libm` for float math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dispatcher;
mod document;
mod listeners;
mod selector;
mod types;
mod view;

pub use document::{DEFAULT_VIEWPORT, Document, ElementBuilder};
pub use listeners::{ListenerRegistry, ListenerStats, Registration};
pub use selector::{Selector, SelectorError};
pub use types::{ElementId, EventKind, EventTarget, Key, Modifiers};
pub use view::DocumentView;
