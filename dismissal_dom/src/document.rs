// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, attributes, styles, queries, hit testing.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::selector::{Selector, SelectorError};
use crate::types::ElementId;

/// Default viewport used by [`Document::new`].
pub const DEFAULT_VIEWPORT: Rect = Rect::new(0.0, 0.0, 1280.0, 800.0);

/// An in-memory document.
///
/// The document always has a `<body>` root. Elements are created detached and
/// become connected once appended below the body. Removing an element frees
/// its whole subtree; stale [`ElementId`]s are never reported as live again.
///
/// Layout is supplied by the host: every element carries an optional
/// world-space rectangle. Elements start out rendered with an empty
/// rectangle; [`Document::set_layout`] with `None` models an element that has
/// no layout box at all.
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use dismissal_dom::Document;
///
/// let mut doc = Document::new();
/// let body = doc.body();
/// let button = doc
///     .build("button")
///     .id("menu")
///     .layout(Rect::new(10.0, 10.0, 90.0, 40.0))
///     .append_to(body);
///
/// assert_eq!(doc.query_selector(None, "#menu"), Ok(Some(button)));
/// assert_eq!(doc.hit_test(Point::new(20.0, 20.0)), Some(button));
/// ```
pub struct Document {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    body: ElementId,
    viewport: Rect,
    active: Option<ElementId>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("viewport", &self.viewport)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    tag: String,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    layout: Option<Rect>,
    cutouts: SmallVec<[Rect; 2]>,
}

impl Node {
    fn new(generation: u32, tag: &str) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            layout: Some(Rect::ZERO),
            cutouts: SmallVec::new(),
        }
    }
}

impl Document {
    /// Create a document containing only `<body>`, sized to [`DEFAULT_VIEWPORT`].
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            body: ElementId::new(0, 0),
            viewport: DEFAULT_VIEWPORT,
            active: None,
        };
        doc.body = doc.create_element("body");
        doc.set_layout(doc.body, Some(DEFAULT_VIEWPORT));
        doc
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// The viewport rectangle.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Resize the viewport; the body follows.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.set_layout(self.body, Some(viewport));
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, tag));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId stores 32-bit indices."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, tag)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId stores 32-bit indices."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        ElementId::new(idx, generation)
    }

    /// Start building an element; see [`ElementBuilder`].
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        let id = self.create_element(tag);
        ElementBuilder { doc: self, id }
    }

    /// Append `child` as the last child of `parent`, detaching it first if needed.
    ///
    /// Appending an element below itself is ignored.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `reference` (or last when `None` or
    /// when `reference` is not a child of `parent`).
    pub fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        if !self.is_alive(parent) || !self.is_alive(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        let siblings = &mut self.node_mut(parent).children;
        let pos = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Unlink an element from its parent without freeing it.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.parent_of(id) {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Remove an element and its subtree, returning every freed id (root first).
    ///
    /// If focus was inside the subtree it silently moves to the body, as
    /// browsers do when a focused node is removed.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.is_alive(id) || id == self.body {
            return Vec::new();
        }
        self.detach(id);
        let mut freed = Vec::new();
        self.free_subtree(id, &mut freed);
        if self.active.is_some_and(|a| !self.is_alive(a)) {
            self.active = None;
        }
        freed
    }

    fn free_subtree(&mut self, id: ElementId, freed: &mut Vec<ElementId>) {
        freed.push(id);
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child, freed);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    // --- liveness and structure ---

    /// Returns true if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Whether the element is attached below the body (or is the body).
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.is_alive(id) && self.contains(self.body, id)
    }

    /// Returns the parent of a live element, or `None` for detached roots or stale ids.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Get the children of an element, or an empty slice if it is stale.
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Inclusive containment: an element contains itself.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// Ancestors of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        core::iter::successors(self.parent_of(id), move |&p| self.parent_of(p))
    }

    /// Get the next element in depth-first (document) order.
    ///
    /// Returns `None` at the end of the tree or if `current` is stale.
    pub fn next_in_order(&self, current: ElementId) -> Option<ElementId> {
        let node = self.node(current)?;
        if let Some(&first_child) = node.children.first() {
            return Some(first_child);
        }
        let mut cursor = current;
        while let Some(parent) = self.parent_of(cursor) {
            if let Some(next_sibling) = self.next_sibling(cursor) {
                return Some(next_sibling);
            }
            cursor = parent;
        }
        None
    }

    /// Get the previous element in reverse depth-first (document) order.
    pub fn prev_in_order(&self, current: ElementId) -> Option<ElementId> {
        if !self.is_alive(current) {
            return None;
        }
        if let Some(prev_sibling) = self.prev_sibling(current) {
            return Some(self.last_in_subtree(prev_sibling));
        }
        self.parent_of(current)
    }

    /// All connected elements in document order, starting with the body.
    pub fn document_order(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cursor = Some(self.body);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.next_in_order(id);
        }
        out
    }

    /// Descendants of `scope` in document order, excluding `scope`.
    pub fn descendants(&self, scope: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut cursor = self.next_in_order(scope).filter(|&n| self.contains(scope, n) && n != scope);
        core::iter::from_fn(move || {
            let current = cursor?;
            cursor = self
                .next_in_order(current)
                .filter(|&n| self.contains(scope, n));
            Some(current)
        })
    }

    fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent_of(id)?;
        let siblings = self.children_of(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent_of(id)?;
        let siblings = self.children_of(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).and_then(|p| siblings.get(p).copied())
    }

    fn last_in_subtree(&self, id: ElementId) -> ElementId {
        let mut current = id;
        while let Some(&last) = self.children_of(current).last() {
            current = last;
        }
        current
    }

    // --- attributes and style ---

    /// Lowercase tag name.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.node(id).map(|n| n.tag.as_str())
    }

    /// Read an attribute.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.node(id)?.attributes.get(name).map(String::as_str)
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute. Returns `true` if the stored value changed.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> bool {
        let Some(n) = self.node_opt_mut(id) else {
            return false;
        };
        if n.attributes.get(name).map(String::as_str) == Some(value) {
            return false;
        }
        n.attributes.insert(name.to_string(), value.to_string());
        true
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        self.node_opt_mut(id)
            .is_some_and(|n| n.attributes.remove(name).is_some())
    }

    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Add a class to the `class` attribute.
    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if self.has_class(id, class) || !self.is_alive(id) {
            return;
        }
        let list = match self.attribute(id, "class") {
            Some(existing) if !existing.is_empty() => alloc::format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &list);
    }

    /// Read an inline style property.
    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.node(id)?.style.get(property).map(String::as_str)
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(n) = self.node_opt_mut(id) {
            n.style.insert(property.to_string(), value.to_string());
        }
    }

    /// Remove an inline style property.
    pub fn remove_style(&mut self, id: ElementId, property: &str) {
        if let Some(n) = self.node_opt_mut(id) {
            n.style.remove(property);
        }
    }

    // --- layout ---

    /// The element's world-space rectangle, `None` if it has no layout box.
    pub fn layout(&self, id: ElementId) -> Option<Rect> {
        self.node(id)?.layout
    }

    /// Replace the element's rectangle.
    pub fn set_layout(&mut self, id: ElementId, rect: Option<Rect>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.layout = rect;
        }
    }

    /// Regions of the element that do not take part in hit testing.
    pub fn cutouts(&self, id: ElementId) -> &[Rect] {
        self.node(id).map(|n| n.cutouts.as_slice()).unwrap_or(&[])
    }

    /// Replace the element's hit-test cut-outs.
    pub fn set_cutouts(&mut self, id: ElementId, cutouts: &[Rect]) {
        if let Some(n) = self.node_opt_mut(id) {
            n.cutouts = cutouts.iter().copied().collect();
        }
    }

    /// Whether the element produces a box: it has a layout rectangle and is not
    /// [`display: none`](Self::is_display_none).
    pub fn is_rendered(&self, id: ElementId) -> bool {
        self.layout(id).is_some() && !self.is_display_none(id)
    }

    /// Whether the element or an ancestor is `display: none` or carries `hidden`.
    pub fn is_display_none(&self, id: ElementId) -> bool {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .any(|el| self.style(el, "display") == Some("none") || self.has_attribute(el, "hidden"))
    }

    /// Computed `visibility`, which inherits.
    pub fn is_visibility_hidden(&self, id: ElementId) -> bool {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|el| self.style(el, "visibility"))
            .is_some_and(|v| v == "hidden" || v == "collapse")
    }

    /// Stacking order: the nearest inclusive ancestor's inline `z-index`, or 0.
    pub fn effective_z_index(&self, id: ElementId) -> i32 {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|el| self.style(el, "z-index").and_then(|z| z.trim().parse().ok()))
            .unwrap_or(0)
    }

    // --- focus ---

    /// The focused element; `None` means the body.
    pub fn active_element(&self) -> Option<ElementId> {
        self.active.filter(|&a| self.is_alive(a))
    }

    /// Record the focused element without firing any events.
    pub fn set_active_element(&mut self, id: Option<ElementId>) {
        self.active = id.filter(|&a| self.is_connected(a) && a != self.body);
    }

    // --- queries ---

    /// First element in document order matching `selector`.
    ///
    /// With `scope == None` the whole document is searched (the body included);
    /// otherwise only descendants of `scope`.
    pub fn query_selector(
        &self,
        scope: Option<ElementId>,
        selector: &str,
    ) -> Result<Option<ElementId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self.candidates(scope).find(|&el| sel.matches(self, el)))
    }

    /// All elements in document order matching `selector`.
    pub fn query_selector_all(
        &self,
        scope: Option<ElementId>,
        selector: &str,
    ) -> Result<Vec<ElementId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self
            .candidates(scope)
            .filter(|&el| sel.matches(self, el))
            .collect())
    }

    fn candidates(&self, scope: Option<ElementId>) -> impl Iterator<Item = ElementId> + '_ {
        let (head, root) = match scope {
            None => (Some(self.body), self.body),
            Some(s) => (None, s),
        };
        head.into_iter().chain(self.descendants(root))
    }

    /// Topmost element under `point`.
    ///
    /// Candidates are connected, rendered, not `visibility: hidden`, not
    /// `pointer-events: none`, and the point lies in their rectangle but
    /// outside their cut-outs. Higher effective z-index wins; ties go to the
    /// element later in document order.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        let mut best: Option<(i32, usize, ElementId)> = None;
        for (order, el) in self.document_order().into_iter().enumerate() {
            let Some(rect) = self.layout(el) else {
                continue;
            };
            if !rect.contains(point)
                || self.cutouts(el).iter().any(|c| c.contains(point))
                || !self.is_rendered(el)
                || self.is_visibility_hidden(el)
                || self.style(el, "pointer-events") == Some("none")
            {
                continue;
            }
            let z = self.effective_z_index(el);
            if best.is_none_or(|(bz, bo, _)| (z, order) > (bz, bo)) {
                best = Some((z, order, el));
            }
        }
        best.map(|(_, _, el)| el)
    }

    // --- internals ---

    fn node(&self, id: ElementId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling ElementId")
    }

    fn node_opt_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }
}

/// Fluent element construction.
///
/// The element exists as soon as the builder does; [`ElementBuilder::append_to`]
/// attaches it and returns its id, [`ElementBuilder::finish`] leaves it detached.
#[derive(Debug)]
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    id: ElementId,
}

impl ElementBuilder<'_> {
    /// Set the `id` attribute.
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Add a class.
    pub fn class(self, class: &str) -> Self {
        self.doc.add_class(self.id, class);
        self
    }

    /// Set an attribute.
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.id, name, value);
        self
    }

    /// Set an inline style property.
    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.id, property, value);
        self
    }

    /// Set the layout rectangle.
    pub fn layout(self, rect: Rect) -> Self {
        self.doc.set_layout(self.id, Some(rect));
        self
    }

    /// Attach as the last child of `parent`.
    pub fn append_to(self, parent: ElementId) -> ElementId {
        self.doc.append_child(parent, self.id);
        self.id
    }

    /// Finish without attaching.
    pub fn finish(self) -> ElementId {
        self.id
    }
}
