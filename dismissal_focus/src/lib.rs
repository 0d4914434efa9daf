// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal Focus: keyboard tab-order navigation over a [`DocumentView`].
//!
//! This crate models sequential focus navigation as:
//! - **Navigation intents** ([`Navigation`]): Tab and Shift+Tab.
//! - **Focusability tests** ([`is_focusable`], [`is_tabbable`], [`tab_index`]) that
//!   follow the platform rules closely enough for focus traps: disabled
//!   controls, hidden subtrees and elements without a box are skipped.
//! - A **tab sequence** ([`TabOrder`]): tabbable elements with positive
//!   `tabindex` first (ascending, then document order), followed by the
//!   `tabindex = 0` band in document order.
//! - A **bounded search** ([`next_focusable`]) that can refuse to run past a
//!   stop element and can skip a whole subtree, which is what focus traps and
//!   "move focus past the dropdown" need.
//!
//! ## Minimal example
//!
//! ```rust
//! use dismissal_dom::Document;
//! use dismissal_focus::{Navigation, TabQuery, next_focusable};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let first = doc.build("button").append_to(body);
//! let panel = doc.build("div").append_to(body);
//! let inner = doc.build("a").attr("href", "#").append_to(panel);
//! let after = doc.build("input").append_to(body);
//!
//! // Tab moves from the button into the panel…
//! let query = TabQuery::new(first, Navigation::Next);
//! assert_eq!(next_focusable(&doc, &query), Some(inner));
//!
//! // …unless the panel's subtree is skipped.
//! let query = TabQuery::new(first, Navigation::Next).skip_within(panel);
//! assert_eq!(next_focusable(&doc, &query), Some(after));
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `dismissal_dom/std`.
//! - `libm`: forwards to `dismissal_dom/libm`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::cmp::Ordering;

use dismissal_dom::{DocumentView, ElementId};

/// Direction of sequential focus navigation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Navigation {
    /// Move forward (Tab).
    Next,
    /// Move backward (Shift+Tab).
    Prev,
}

/// What happens when a search runs off either end of the tab sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Yield no candidate.
    #[default]
    Never,
    /// Continue from the other end of the document.
    Document,
}

/// Tags that take focus without a `tabindex`.
fn is_natively_focusable(doc: &dyn DocumentView, el: ElementId) -> bool {
    match doc.tag(el) {
        Some("button" | "select" | "textarea") => true,
        Some("input") => doc.attribute(el, "type") != Some("hidden"),
        Some("a" | "area") => doc.has_attribute(el, "href"),
        _ => false,
    }
}

fn is_disableable(doc: &dyn DocumentView, el: ElementId) -> bool {
    matches!(
        doc.tag(el),
        Some("button" | "input" | "select" | "textarea" | "fieldset" | "optgroup" | "option")
    )
}

/// Explicit `tabindex`, or 0 for natively focusable elements.
///
/// Returns `None` for elements that take no part in focus at all.
pub fn tab_index(doc: &dyn DocumentView, el: ElementId) -> Option<i32> {
    match doc.attribute(el, "tabindex").map(|v| v.trim().parse::<i32>()) {
        Some(Ok(index)) => Some(index),
        // Unparsable values behave as if the attribute were absent.
        Some(Err(_)) | None => is_natively_focusable(doc, el).then_some(0),
    }
}

/// Whether `el` can receive focus programmatically.
///
/// The element must be connected, not disabled, produce a box (inputs are
/// exempt from the box requirement), not sit in a `display: none` subtree,
/// not be `visibility: hidden`, and be either natively focusable or carry a
/// `tabindex`.
pub fn is_focusable(doc: &dyn DocumentView, el: ElementId) -> bool {
    if !doc.is_connected(el) || el == doc.body() {
        return false;
    }
    if is_disableable(doc, el) && doc.has_attribute(el, "disabled") {
        return false;
    }
    let has_box = doc.layout(el).is_some() || doc.tag(el) == Some("input");
    if !has_box || doc.is_display_none(el) || doc.is_visibility_hidden(el) {
        return false;
    }
    tab_index(doc, el).is_some()
}

/// Whether `el` takes part in sequential (Tab) navigation.
pub fn is_tabbable(doc: &dyn DocumentView, el: ElementId) -> bool {
    is_focusable(doc, el) && tab_index(doc, el).is_some_and(|i| i >= 0)
}

/// A single tabbable candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TabEntry {
    /// The element.
    pub id: ElementId,
    /// Positive `tabindex`, if any; `None` for the `tabindex = 0` band.
    pub order: Option<i32>,
    /// Position in document order.
    pub doc_index: usize,
}

/// The document's tab sequence, in navigation order.
#[derive(Clone, Debug, Default)]
pub struct TabOrder {
    /// Tabbable candidates, sorted.
    pub entries: Vec<TabEntry>,
}

impl TabOrder {
    /// Collect and sort every tabbable element of `doc`.
    pub fn new(doc: &dyn DocumentView) -> Self {
        let mut entries: Vec<TabEntry> = doc
            .document_order()
            .into_iter()
            .enumerate()
            .filter(|&(_, id)| is_tabbable(doc, id))
            .map(|(doc_index, id)| TabEntry {
                id,
                order: tab_index(doc, id).filter(|&i| i > 0),
                doc_index,
            })
            .collect();
        entries.sort_by(compare_tab_order);
        Self { entries }
    }

    /// Sequence position of `el`, if it is tabbable.
    pub fn position(&self, el: ElementId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == el)
    }

    /// Number of tabbable elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tabbable.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compare_tab_order(a: &TabEntry, b: &TabEntry) -> Ordering {
    // Positive tabindex first, ascending; document order breaks ties and
    // orders the zero band.
    match (a.order, b.order) {
        (Some(ao), Some(bo)) => ao.cmp(&bo).then_with(|| a.doc_index.cmp(&b.doc_index)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.doc_index.cmp(&b.doc_index),
    }
}

/// Parameters for [`next_focusable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TabQuery {
    /// Where the search starts. Need not be tabbable itself.
    pub from: ElementId,
    /// Search direction.
    pub navigation: Navigation,
    /// Reaching this element aborts the search with `None`.
    pub stop_at: Option<ElementId>,
    /// Candidates inside this subtree (inclusive) are skipped.
    pub skip_within: Option<ElementId>,
    /// Behaviour at the ends of the sequence.
    pub wrap: WrapMode,
}

impl TabQuery {
    /// Unbounded, non-wrapping search from `from`.
    pub fn new(from: ElementId, navigation: Navigation) -> Self {
        Self {
            from,
            navigation,
            stop_at: None,
            skip_within: None,
            wrap: WrapMode::Never,
        }
    }

    /// Abort when the search reaches `el`.
    pub fn stop_at(mut self, el: ElementId) -> Self {
        self.stop_at = Some(el);
        self
    }

    /// Skip every candidate inside `el`.
    pub fn skip_within(mut self, el: ElementId) -> Self {
        self.skip_within = Some(el);
        self
    }

    /// Set the wrap mode.
    pub fn wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }
}

/// Find the next (or previous) tabbable element relative to `query.from`.
///
/// If `from` is in the tab sequence the search steps from its position.
/// Otherwise it starts where `from` would sit in the `tabindex = 0` band,
/// judged by document order.
pub fn next_focusable(doc: &dyn DocumentView, query: &TabQuery) -> Option<ElementId> {
    let order = TabOrder::new(doc);
    if order.is_empty() {
        return None;
    }
    let len = order.len();
    let mut cursor = start_cursor(doc, &order, query.from, query.navigation);

    for _ in 0..len {
        let pos = match cursor {
            Some(p) if p < len => p,
            _ => match query.wrap {
                WrapMode::Never => return None,
                WrapMode::Document => match query.navigation {
                    Navigation::Next => 0,
                    Navigation::Prev => len - 1,
                },
            },
        };
        let candidate = order.entries[pos].id;
        if query.stop_at == Some(candidate) {
            return None;
        }
        let skipped = candidate == query.from
            || query
                .skip_within
                .is_some_and(|scope| doc.contains(scope, candidate));
        if !skipped {
            return Some(candidate);
        }
        cursor = step(pos, query.navigation);
    }
    None
}

/// First sequence position to examine; `None` means "off the end".
fn start_cursor(
    doc: &dyn DocumentView,
    order: &TabOrder,
    from: ElementId,
    navigation: Navigation,
) -> Option<usize> {
    if let Some(pos) = order.position(from) {
        return step(pos, navigation);
    }
    let from_index = doc.document_order().iter().position(|&id| id == from)?;
    let band = order.entries.iter().position(|e| e.order.is_none());
    match navigation {
        Navigation::Next => {
            let band = band?;
            order.entries[band..]
                .iter()
                .position(|e| e.doc_index > from_index)
                .map(|p| band + p)
        }
        Navigation::Prev => {
            let band = band.unwrap_or(order.len());
            order.entries[band..]
                .iter()
                .rposition(|e| e.doc_index < from_index)
                .map(|p| band + p)
                .or_else(|| band.checked_sub(1))
        }
    }
}

fn step(pos: usize, navigation: Navigation) -> Option<usize> {
    match navigation {
        Navigation::Next => pos.checked_add(1),
        Navigation::Prev => pos.checked_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dismissal_dom::{Document, SelectorError};
    use kurbo::Rect;

    struct Fixture {
        doc: Document,
        a: ElementId,
        panel: ElementId,
        b: ElementId,
        c: ElementId,
        d: ElementId,
    }

    /// body -> [a, panel -> [b, c], d]
    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.build("button").append_to(body);
        let panel = doc.build("div").attr("tabindex", "-1").append_to(body);
        let b = doc.build("input").append_to(panel);
        let c = doc.build("a").attr("href", "/x").append_to(panel);
        let d = doc.build("textarea").append_to(body);
        Fixture {
            doc,
            a,
            panel,
            b,
            c,
            d,
        }
    }

    #[test]
    fn focusability_rules() {
        let mut f = fixture();
        let body = f.doc.body();
        assert!(is_tabbable(&f.doc, f.a));
        assert!(is_focusable(&f.doc, f.panel), "tabindex=-1 is focusable");
        assert!(!is_tabbable(&f.doc, f.panel), "…but not tabbable");

        let anchor = f.doc.build("a").append_to(body);
        assert!(!is_focusable(&f.doc, anchor), "anchors need href");

        f.doc.set_attribute(f.a, "disabled", "");
        assert!(!is_focusable(&f.doc, f.a));

        f.doc.set_style(f.panel, "display", "none");
        assert!(!is_focusable(&f.doc, f.b), "hidden subtree");
        f.doc.remove_style(f.panel, "display");

        f.doc.set_style(f.c, "visibility", "hidden");
        assert!(!is_focusable(&f.doc, f.c));

        f.doc.set_layout(f.d, None);
        assert!(!is_focusable(&f.doc, f.d), "no box");
        f.doc.set_layout(f.b, None);
        assert!(is_focusable(&f.doc, f.b), "inputs are exempt from the box rule");

        let hidden_input = f.doc.build("input").attr("type", "hidden").append_to(body);
        assert!(!is_focusable(&f.doc, hidden_input));
    }

    #[test]
    fn document_order_next_and_prev() {
        let f = fixture();
        let next = |from| next_focusable(&f.doc, &TabQuery::new(from, Navigation::Next));
        let prev = |from| next_focusable(&f.doc, &TabQuery::new(from, Navigation::Prev));
        assert_eq!(next(f.a), Some(f.b));
        assert_eq!(next(f.b), Some(f.c));
        assert_eq!(next(f.c), Some(f.d));
        assert_eq!(next(f.d), None, "no wrap by default");
        assert_eq!(prev(f.b), Some(f.a));
        assert_eq!(prev(f.a), None);
    }

    #[test]
    fn wraps_when_asked() {
        let f = fixture();
        let q = TabQuery::new(f.d, Navigation::Next).wrap(WrapMode::Document);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.a));
        let q = TabQuery::new(f.a, Navigation::Prev).wrap(WrapMode::Document);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.d));
    }

    #[test]
    fn positive_tabindex_comes_first() {
        let mut f = fixture();
        f.doc.set_attribute(f.d, "tabindex", "2");
        f.doc.set_attribute(f.c, "tabindex", "1");
        let order: Vec<ElementId> = TabOrder::new(&f.doc).entries.iter().map(|e| e.id).collect();
        assert_eq!(order, alloc::vec![f.c, f.d, f.a, f.b]);

        // Leaving the positive band continues with the zero band.
        let q = TabQuery::new(f.d, Navigation::Next);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.a));
    }

    #[test]
    fn non_tabbable_origin_uses_document_position() {
        let f = fixture();
        let q = TabQuery::new(f.panel, Navigation::Next);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.b));
        let q = TabQuery::new(f.panel, Navigation::Prev);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.a));
    }

    #[test]
    fn stop_at_aborts_search() {
        let f = fixture();
        let q = TabQuery::new(f.a, Navigation::Next).stop_at(f.b);
        assert_eq!(next_focusable(&f.doc, &q), None);
        let q = TabQuery::new(f.b, Navigation::Next).stop_at(f.d);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.c));
    }

    #[test]
    fn skip_within_jumps_over_subtree() {
        let f = fixture();
        let q = TabQuery::new(f.a, Navigation::Next).skip_within(f.panel);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.d));
        let q = TabQuery::new(f.d, Navigation::Prev).skip_within(f.panel);
        assert_eq!(next_focusable(&f.doc, &q), Some(f.a));
    }

    #[test]
    fn empty_document_has_no_candidates() {
        let doc = Document::new();
        let q = TabQuery::new(doc.body(), Navigation::Next).wrap(WrapMode::Document);
        assert_eq!(next_focusable(&doc, &q), None);
    }

    /// A host whose layout collapses one subtree without touching styles.
    struct Collapsed<'a> {
        doc: &'a Document,
        hidden: ElementId,
    }

    impl DocumentView for Collapsed<'_> {
        fn body(&self) -> ElementId {
            self.doc.body()
        }
        fn viewport(&self) -> Rect {
            self.doc.viewport()
        }
        fn is_alive(&self, el: ElementId) -> bool {
            self.doc.is_alive(el)
        }
        fn is_connected(&self, el: ElementId) -> bool {
            self.doc.is_connected(el)
        }
        fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
            self.doc.contains(ancestor, node)
        }
        fn tag(&self, el: ElementId) -> Option<&str> {
            self.doc.tag(el)
        }
        fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
            self.doc.attribute(el, name)
        }
        fn layout(&self, el: ElementId) -> Option<Rect> {
            self.doc.layout(el)
        }
        fn is_display_none(&self, el: ElementId) -> bool {
            self.doc.contains(self.hidden, el) || self.doc.is_display_none(el)
        }
        fn is_visibility_hidden(&self, el: ElementId) -> bool {
            self.doc.is_visibility_hidden(el)
        }
        fn document_order(&self) -> Vec<ElementId> {
            self.doc.document_order()
        }
        fn query_selector(
            &self,
            scope: Option<ElementId>,
            selector: &str,
        ) -> Result<Option<ElementId>, SelectorError> {
            self.doc.query_selector(scope, selector)
        }
    }

    #[test]
    fn navigation_runs_over_any_view() {
        let f = fixture();
        let view = Collapsed {
            doc: &f.doc,
            hidden: f.panel,
        };
        assert!(!is_focusable(&view, f.b));
        let q = TabQuery::new(f.a, Navigation::Next);
        assert_eq!(next_focusable(&view, &q), Some(f.d));
        assert_eq!(next_focusable(&f.doc, &q), Some(f.b), "the document itself is unchanged");
    }
}
