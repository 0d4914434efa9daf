// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only document access.
//!
//! [`DocumentView`] is the set of queries the tab-order navigator and the
//! dismiss state machine make. [`Document`] implements it; a host backed by a
//! real DOM implements it over its own node handles, minting [`ElementId`]s
//! with [`ElementId::from_raw`].

use alloc::vec::Vec;

use kurbo::Rect;

use crate::document::Document;
use crate::selector::SelectorError;
use crate::types::ElementId;

/// Queries over a document tree.
pub trait DocumentView {
    /// The `<body>` element.
    fn body(&self) -> ElementId;

    /// The viewport in world coordinates.
    fn viewport(&self) -> Rect;

    /// Whether `el` still refers to an element.
    fn is_alive(&self, el: ElementId) -> bool;

    /// Whether `el` is attached below the body.
    fn is_connected(&self, el: ElementId) -> bool;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// Lowercase tag name.
    fn tag(&self, el: ElementId) -> Option<&str>;

    /// Attribute value.
    fn attribute(&self, el: ElementId, name: &str) -> Option<&str>;

    /// Whether the attribute is present.
    fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        self.attribute(el, name).is_some()
    }

    /// Layout box, or `None` when the element has none.
    fn layout(&self, el: ElementId) -> Option<Rect>;

    /// Whether `el` or an ancestor is `display: none`.
    fn is_display_none(&self, el: ElementId) -> bool;

    /// Whether `el` is `visibility: hidden` (inherited).
    fn is_visibility_hidden(&self, el: ElementId) -> bool;

    /// Whether `el` has a layout box and is displayed.
    fn is_rendered(&self, el: ElementId) -> bool {
        self.layout(el).is_some() && !self.is_display_none(el)
    }

    /// Connected elements in pre-order, the body first.
    fn document_order(&self) -> Vec<ElementId>;

    /// First element matching `selector` below `scope`, or in the whole
    /// document when `scope` is `None`.
    fn query_selector(
        &self,
        scope: Option<ElementId>,
        selector: &str,
    ) -> Result<Option<ElementId>, SelectorError>;
}

impl DocumentView for Document {
    fn body(&self) -> ElementId {
        Self::body(self)
    }

    fn viewport(&self) -> Rect {
        Self::viewport(self)
    }

    fn is_alive(&self, el: ElementId) -> bool {
        Self::is_alive(self, el)
    }

    fn is_connected(&self, el: ElementId) -> bool {
        Self::is_connected(self, el)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        Self::contains(self, ancestor, node)
    }

    fn tag(&self, el: ElementId) -> Option<&str> {
        Self::tag(self, el)
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        Self::attribute(self, el, name)
    }

    fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        Self::has_attribute(self, el, name)
    }

    fn layout(&self, el: ElementId) -> Option<Rect> {
        Self::layout(self, el)
    }

    fn is_display_none(&self, el: ElementId) -> bool {
        Self::is_display_none(self, el)
    }

    fn is_visibility_hidden(&self, el: ElementId) -> bool {
        Self::is_visibility_hidden(self, el)
    }

    fn is_rendered(&self, el: ElementId) -> bool {
        Self::is_rendered(self, el)
    }

    fn document_order(&self) -> Vec<ElementId> {
        Self::document_order(self)
    }

    fn query_selector(
        &self,
        scope: Option<ElementId>,
        selector: &str,
    ) -> Result<Option<ElementId>, SelectorError> {
        Self::query_selector(self, scope, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_button(view: &dyn DocumentView) -> Option<ElementId> {
        view.query_selector(None, "button").ok().flatten()
    }

    #[test]
    fn document_answers_through_the_trait() {
        let mut doc = Document::new();
        let body = doc.body();
        let panel = doc.build("div").style("display", "none").append_to(body);
        let button = doc.build("button").attr("disabled", "").append_to(panel);

        let view: &dyn DocumentView = &doc;
        assert_eq!(first_button(view), Some(button));
        assert_eq!(view.tag(button), Some("button"));
        assert!(view.has_attribute(button, "disabled"));
        assert!(view.contains(panel, button));
        assert!(view.is_display_none(button));
        assert!(!view.is_rendered(button));
        assert_eq!(view.document_order(), [body, panel, button]);
    }
}
