// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime: the reactive host and the event loop around dismiss instances.
//!
//! The [`Runtime`] owns the [`Document`], the [`DismissStack`], the listener
//! registry, the [`TimerQueue`] and every mounted [`DismissInstance`]. It
//! plays the part of both the rendering layer (mounting the container,
//! sentinels and overlay when an instance opens) and the browser (turning
//! simulated input into events in platform order and running macrotasks).
//!
//! ## Focus
//!
//! Moving focus fires `blur` and `focusout` on the old element, then `focus`
//! and `focusin` on the new one. With [`Platform::SAFARI_IOS`] the losing side
//! sees no related target and tapping a `<button>` does not focus it.
//! If a handler moves focus again while a change is being delivered, the rest
//! of the outer change is dropped.
//!
//! Programmatic focus scrolls every `overflow: auto | scroll` ancestor that
//! does not fully show the target, which fires `scroll` on it, unless the
//! caller asked to prevent scrolling.
//!
//! ## Rendering
//!
//! Container content comes from a [`Content`] builder that runs on every
//! open with a [`RenderCx`]. Instances it mounts through the context live
//! inside the container: they are unmounted when it is torn down and mounted
//! afresh the next time it renders.
//!
//! ## Time
//!
//! Deferred work runs only when the clock is driven with [`Runtime::tick`]
//! (zero-delay tasks) or [`Runtime::advance`].

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::{fmt, mem};

use dismissal_dom::dispatcher::{self, Event, Outcome};
use dismissal_dom::{
    Document, ElementBuilder, ElementId, EventKind, EventTarget, Key, ListenerRegistry,
    ListenerStats, Modifiers,
};
use dismissal_focus::{Navigation, TabQuery, WrapMode, is_focusable, next_focusable};
use hashbrown::HashMap;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::config::DismissConfig;
use crate::effect::{Effect, Effects};
use crate::instance::{DismissInstance, Rendered};
use crate::locator::{self, Role};
use crate::overlay::{
    ATTR_OVERLAY, ATTR_OVERLAY_CLIPPED, ATTR_OVERLAY_CLIPPED_LEVEL, ATTR_OVERLAY_LEVEL, ClipRecord,
    OverlayMode,
};
use crate::stack::{DismissStack, StackEntry, StackTransition, container_z_index, overlay_z_index};
use crate::timer::TimerQueue;
use crate::types::{Handler, InstanceId, ListenerKey, TimerKey, TimerSlot};

/// Attribute marking a rendered container; value is the instance `id` option.
pub const ATTR_CONTAINER: &str = "data-dismiss-container";

/// Browser behaviours the state machine has to cope with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    /// `blur`/`focusout` carry the element receiving focus.
    pub reports_related_target: bool,
    /// Clicking a `<button>` focuses it.
    pub focuses_buttons_on_click: bool,
}

impl Platform {
    /// Desktop browsers.
    pub const DESKTOP: Self = Self {
        reports_related_target: true,
        focuses_buttons_on_click: true,
    };

    /// Safari on iOS.
    pub const SAFARI_IOS: Self = Self {
        reports_related_target: false,
        focuses_buttons_on_click: false,
    };
}

impl Default for Platform {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Builds the children of a container each time its instance opens.
pub type Content = Box<dyn FnMut(&mut RenderCx<'_>, ElementId)>;

fn no_content(_: &mut RenderCx<'_>, _: ElementId) {}

/// What a [`Content`] builder sees while its container renders.
pub struct RenderCx<'a> {
    rt: &'a mut Runtime,
    container: ElementId,
    nested: Vec<Nested>,
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("container", &self.container)
            .field("nested", &self.nested.len())
            .finish_non_exhaustive()
    }
}

impl RenderCx<'_> {
    /// The container being filled.
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.rt.doc
    }

    /// The document, for edits the builder API does not cover.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.rt.doc
    }

    /// Start a detached element; see [`Document::build`].
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        self.rt.doc.build(tag)
    }

    /// Declare an instance nested in this container.
    ///
    /// It is mounted once the enclosing instance has finished opening, so its
    /// trigger may be built after this call, and it is unmounted when the
    /// container goes away. The id is fresh on every render.
    pub fn mount(
        &mut self,
        parent: ElementId,
        config: DismissConfig,
        content: impl FnMut(&mut RenderCx<'_>, ElementId) + 'static,
    ) -> InstanceId {
        let id = self.rt.next_instance_id();
        self.nested.push(Nested {
            id,
            parent,
            config,
            content: Box::new(content),
        });
        id
    }
}

/// An instance declared by a content builder, mounted after its parent opens.
struct Nested {
    id: InstanceId,
    parent: ElementId,
    config: DismissConfig,
    content: Content,
}

struct Slot {
    instance: DismissInstance,
    parent: ElementId,
    content: Content,
    /// The host's open signal.
    open: bool,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("instance", &self.instance)
            .field("parent", &self.parent)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

/// Host and event loop for dismiss instances.
#[derive(Debug)]
pub struct Runtime {
    doc: Document,
    platform: Platform,
    stack: DismissStack,
    listeners: ListenerRegistry<ListenerKey>,
    timers: TimerQueue<TimerKey>,
    slots: HashMap<InstanceId, Slot>,
    clips: HashMap<InstanceId, ClipRecord>,
    focus_within: HashMap<InstanceId, bool>,
    escape_listener_installed: bool,
    next_id: u32,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

struct Delivery<'a> {
    rt: &'a mut Runtime,
    event: Event,
}

impl Runtime {
    /// An empty document on a desktop platform.
    pub fn new() -> Self {
        Self::with_platform(Platform::DESKTOP)
    }

    /// An empty document on the given platform.
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            doc: Document::new(),
            platform,
            stack: DismissStack::new(),
            listeners: ListenerRegistry::new(),
            timers: TimerQueue::new(),
            slots: HashMap::new(),
            clips: HashMap::new(),
            focus_within: HashMap::new(),
            escape_listener_installed: false,
            next_id: 0,
        }
    }

    // --- accessors ---

    /// The document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document, for building page content.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Platform quirks in effect.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The dismiss stack.
    pub fn stack(&self) -> &DismissStack {
        &self.stack
    }

    /// Installed listeners.
    pub fn listeners(&self) -> &ListenerRegistry<ListenerKey> {
        &self.listeners
    }

    /// Listener add/remove counters.
    pub fn listener_stats(&self) -> ListenerStats {
        self.listeners.stats()
    }

    /// Whether the document-level Escape listener is installed.
    pub fn escape_listener_installed(&self) -> bool {
        self.escape_listener_installed
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// The focused element; `None` means the body.
    pub fn active_element(&self) -> Option<ElementId> {
        self.doc.active_element()
    }

    /// A mounted instance.
    pub fn instance(&self, id: InstanceId) -> Option<&DismissInstance> {
        self.slots.get(&id).map(|s| &s.instance)
    }

    /// The host's open value for `id`.
    pub fn is_open(&self, id: InstanceId) -> bool {
        self.slots.get(&id).is_some_and(|s| s.open)
    }

    /// Number of instances whose open value is `true`.
    pub fn open_count(&self) -> usize {
        self.slots.values().filter(|s| s.open).count()
    }

    /// Last "focus within" report of `id`, if it made one.
    pub fn focus_within(&self, id: InstanceId) -> Option<bool> {
        self.focus_within.get(&id).copied()
    }

    /// Live clip record of a clipped instance.
    pub fn clip(&self, id: InstanceId) -> Option<&ClipRecord> {
        self.clips.get(&id)
    }

    /// Outside-interaction listeners currently installed for `id`.
    pub fn outside_listener_count(&self, id: InstanceId) -> usize {
        self.listeners.count_where(|r| {
            matches!(
                r.handler,
                ListenerKey::Instance(owner, Handler::OutsideClick | Handler::OutsideFocus)
                    if owner == id
            )
        })
    }

    /// The instance whose trigger is `menu_button`; the oldest one if several
    /// share it.
    pub fn instance_of(&self, menu_button: ElementId) -> Option<InstanceId> {
        self.slots
            .iter()
            .filter(|(_, s)| s.instance.menu_button() == Some(menu_button))
            .map(|(&id, _)| id)
            .min()
    }

    /// All listeners currently installed for `id`.
    pub fn listener_count(&self, id: InstanceId) -> usize {
        self.listeners
            .count_where(|r| r.handler.instance() == Some(id))
    }

    // --- host lifecycle ---

    /// Mount an instance whose container will be appended to `parent`.
    ///
    /// `content` fills the container on every open. If the config starts open
    /// the open effect runs immediately; otherwise it first runs on the first
    /// change.
    pub fn mount(
        &mut self,
        parent: ElementId,
        config: DismissConfig,
        content: impl FnMut(&mut RenderCx<'_>, ElementId) + 'static,
    ) -> InstanceId {
        let id = self.next_instance_id();
        self.mount_as(id, parent, config, Box::new(content));
        id
    }

    fn next_instance_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    fn mount_as(&mut self, id: InstanceId, parent: ElementId, config: DismissConfig, content: Content) {
        let start_open = config.open;
        let mut instance = DismissInstance::new(id, config);
        let fx = instance.mount(&self.doc);
        self.slots.insert(
            id,
            Slot {
                instance,
                parent,
                content,
                open: false,
            },
        );
        self.apply(id, fx, None);
        if start_open {
            self.set_open(id, true);
        }
    }

    /// Run the instance cleanup and remove everything it rendered.
    pub fn unmount(&mut self, id: InstanceId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        let fx = slot.instance.cleanup();
        self.apply(id, fx, None);
        self.unrender(id);
        self.slots.remove(&id);
        self.focus_within.remove(&id);
        self.timers.cancel_where(|k| k.instance == id);
        tracing::debug!(id = %id, "unmounted");
    }

    /// The host's open setter. Unchanged values are ignored, as are attempts
    /// to open an inert instance.
    pub fn set_open(&mut self, id: InstanceId, open: bool) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if slot.open == open {
            return;
        }
        if open && slot.instance.is_inert() {
            tracing::debug!(id = %id, "ignoring open of inert instance");
            return;
        }
        slot.open = open;
        if open {
            // Reopened from inside its own close: the old elements are still up.
            let nested = if slot.instance.rendered().is_none() {
                self.render(id)
            } else {
                Vec::new()
            };
            let Some(slot) = self.slots.get_mut(&id) else {
                return;
            };
            let fx = slot.instance.open_changed(&self.doc, true);
            self.apply(id, fx, None);
            for n in nested {
                if !self.doc.is_connected(n.parent) {
                    tracing::debug!(id = %n.id, "nested parent gone before mount");
                    continue;
                }
                self.mount_as(n.id, n.parent, n.config, n.content);
            }
        } else {
            let fx = slot.instance.open_changed(&self.doc, false);
            self.apply(id, fx, None);
            // A handler may have reopened it meanwhile.
            if !self.is_open(id) {
                self.unrender(id);
            }
        }
    }

    /// Recompute a clipped overlay now, dropping any pending debounced run.
    pub fn redraw_clipped(&mut self, id: InstanceId) {
        if let Some(record) = self.clips.get_mut(&id) {
            record.debounce.flush(&mut self.timers);
            record.redraw(&mut self.doc);
        }
    }

    // --- input ---

    /// Move focus to `el` like `el.focus()`; ignored if it cannot take focus.
    pub fn focus(&mut self, el: ElementId) {
        self.focus_with(el, false);
    }

    /// Like [`Runtime::focus`], optionally with `preventScroll`.
    pub fn focus_with(&mut self, el: ElementId, prevent_scroll: bool) {
        if !is_focusable(&self.doc, el) {
            tracing::trace!(?el, "focus ignored: not focusable");
            return;
        }
        self.move_focus(Some(el));
        if !prevent_scroll && self.doc.active_element() == Some(el) {
            self.scroll_into_view(el);
        }
    }

    /// Move focus to the body.
    pub fn blur(&mut self) {
        self.move_focus(None);
    }

    /// Press and release the primary pointer over `el`.
    ///
    /// Focus moves to the nearest focusable inclusive ancestor (or the body)
    /// before `click` is dispatched.
    pub fn click(&mut self, el: ElementId) {
        if !self.doc.is_connected(el) {
            return;
        }
        let focus_target = core::iter::once(el)
            .chain(self.doc.ancestors(el))
            .find(|&a| is_focusable(&self.doc, a));
        match focus_target {
            Some(f) if self.platform.focuses_buttons_on_click || self.doc.tag(f) != Some("button") => {
                self.move_focus(Some(f));
            }
            _ => self.move_focus(None),
        }
        self.dispatch(Event::new(EventKind::Click, el.into()));
    }

    /// Click whatever is topmost at `point`. Returns the element hit.
    pub fn click_at(&mut self, point: Point) -> Option<ElementId> {
        let hit = self.doc.hit_test(point)?;
        self.click(hit);
        Some(hit)
    }

    /// Dispatch `keydown` to the focused element and run the default action
    /// unless a handler prevented it. Returns the dispatched event.
    pub fn press_key(&mut self, key: Key, modifiers: Modifiers) -> Event {
        let target = self.doc.active_element().unwrap_or(self.doc.body());
        let event = self.dispatch(Event::new(EventKind::KeyDown, target.into()).with_key(key, modifiers));
        if !event.default_prevented && key == Key::Tab {
            self.sequential_focus(modifiers.contains(Modifiers::SHIFT));
        }
        event
    }

    /// Press Tab.
    pub fn tab(&mut self) -> Event {
        self.press_key(Key::Tab, Modifiers::empty())
    }

    /// Press Shift+Tab.
    pub fn shift_tab(&mut self) -> Event {
        self.press_key(Key::Tab, Modifiers::SHIFT)
    }

    /// Press Escape.
    pub fn escape(&mut self) -> Event {
        self.press_key(Key::Escape, Modifiers::empty())
    }

    // --- environment ---

    /// `el` scrolled.
    pub fn scroll(&mut self, el: ElementId) {
        self.dispatch(Event::new(EventKind::Scroll, el.into()));
    }

    fn scroll_into_view(&mut self, el: ElementId) {
        let Some(rect) = self.doc.layout(el) else {
            return;
        };
        let doc = &self.doc;
        let scrolled: SmallVec<[ElementId; 4]> = doc
            .ancestors(el)
            .filter(|&a| is_scroll_container(doc, a))
            .filter(|&a| doc.layout(a).is_some_and(|port| port.intersect(rect) != rect))
            .collect();
        for container in scrolled {
            tracing::trace!(?el, ?container, "scrolled into view");
            self.scroll(container);
        }
    }

    /// The viewport changed size.
    pub fn resize(&mut self, viewport: Rect) {
        self.doc.set_viewport(viewport);
        let block_overlays: SmallVec<[ElementId; 4]> = self
            .slots
            .values()
            .filter(|s| s.instance.config().overlay.is_block())
            .filter_map(|s| s.instance.overlay())
            .collect();
        for overlay in block_overlays {
            self.doc.set_layout(overlay, Some(viewport));
        }
        self.dispatch(Event::new(EventKind::Resize, EventTarget::Window));
    }

    /// An animation finished on `el`.
    pub fn animation_end(&mut self, el: ElementId) {
        self.dispatch(Event::new(EventKind::AnimationEnd, el.into()));
    }

    /// A transition finished on `el`.
    pub fn transition_end(&mut self, el: ElementId) {
        self.dispatch(Event::new(EventKind::TransitionEnd, el.into()));
    }

    /// `el` changed attributes or size; clipped overlays measuring it redraw
    /// after the debounce window.
    pub fn mutate(&mut self, el: ElementId) {
        for record in self.clips.values().filter(|r| r.observes(el)) {
            record.debounce.schedule(&mut self.timers);
        }
    }

    // --- time ---

    /// Run every task due now.
    pub fn tick(&mut self) {
        self.advance(0);
    }

    /// Move the clock forward by `ms`, running due tasks in order.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now().saturating_add(ms);
        while let Some(key) = self.timers.pop_due(until) {
            self.fire(key);
        }
        self.timers.advance_to(until);
    }

    fn fire(&mut self, key: TimerKey) {
        match key.slot {
            TimerSlot::ClipRedraw => {
                if let Some(record) = self.clips.get_mut(&key.instance) {
                    record.redraw(&mut self.doc);
                }
            }
            slot => {
                let Some(s) = self.slots.get_mut(&key.instance) else {
                    return;
                };
                let fx = s.instance.timer_fired(slot);
                self.apply(key.instance, fx, None);
            }
        }
    }

    // --- rendering ---

    /// Build the container, sentinels and overlay of an opening instance.
    /// Returns the nested instances its content declared.
    fn render(&mut self, id: InstanceId) -> Vec<Nested> {
        let depth = self.stack.len();
        let Some(slot) = self.slots.get_mut(&id) else {
            return Vec::new();
        };
        let config = slot.instance.config();
        let html_id = config.id.clone();
        let class = config.class.clone();
        let marker = html_id.clone().unwrap_or_default();
        let block = config.overlay.is_block();
        let clipped = config.overlay.is_clipped();
        let sentinels = config.needs_sentinels();
        let parent = slot.parent;
        let mut content = mem::replace(&mut slot.content, Box::new(no_content));

        let container = self
            .doc
            .build("div")
            .attr(ATTR_CONTAINER, &marker)
            .attr("tabindex", "-1")
            .finish();
        if let Some(html_id) = &html_id {
            self.doc.set_attribute(container, "id", html_id);
        }
        if let Some(class) = &class {
            self.doc.set_attribute(container, "class", class);
        }
        if block {
            self.doc
                .set_style(container, "z-index", &container_z_index(depth).to_string());
        }
        self.doc.append_child(parent, container);

        let first = sentinels.then(|| sentinel(&mut self.doc, container));
        let mut cx = RenderCx {
            rt: self,
            container,
            nested: Vec::new(),
        };
        content(&mut cx, container);
        let nested = cx.nested;
        let last = sentinels.then(|| sentinel(&mut self.doc, container));

        let overlay = (block || clipped).then(|| {
            let (attr, level) = if block {
                (ATTR_OVERLAY, ATTR_OVERLAY_LEVEL)
            } else {
                (ATTR_OVERLAY_CLIPPED, ATTR_OVERLAY_CLIPPED_LEVEL)
            };
            let viewport = self.doc.viewport();
            let body = self.doc.body();
            self.doc
                .build("div")
                .attr(attr, &marker)
                .attr(level, &depth.to_string())
                .style("position", "fixed")
                .style("z-index", &overlay_z_index(depth).to_string())
                .layout(viewport)
                .append_to(body)
        });

        let Some(slot) = self.slots.get_mut(&id) else {
            return nested;
        };
        slot.content = content;
        let fx = slot.instance.attach(Rendered {
            container,
            sentinels: first.zip(last),
            overlay,
            depth,
        });
        self.apply(id, fx, None);
        nested
    }

    fn unrender(&mut self, id: InstanceId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        let Some(rendered) = slot.instance.detach() else {
            return;
        };
        let roots: SmallVec<[ElementId; 2]> =
            core::iter::once(rendered.container).chain(rendered.overlay).collect();

        // Instances mounted inside the rendered subtree go first.
        let mut nested: Vec<InstanceId> = self
            .slots
            .iter()
            .filter(|&(&other, s)| other != id && roots.iter().any(|&r| self.doc.contains(r, s.parent)))
            .map(|(&other, _)| other)
            .collect();
        nested.sort_unstable();
        for child in nested.into_iter().rev() {
            self.unmount(child);
        }

        for root in roots {
            self.doc.remove(root);
        }
        let doc = &self.doc;
        let purged = self
            .listeners
            .purge(|t| t.element().is_some_and(|el| !doc.is_alive(el)));
        tracing::trace!(id = %id, purged, "unrendered");
    }

    // --- clip controller ---

    fn mount_clip(&mut self, id: InstanceId) {
        let Some(slot) = self.slots.get(&id) else {
            return;
        };
        let inst = &slot.instance;
        let (Some(overlay), OverlayMode::Clipped(cfg)) = (inst.overlay(), &inst.config().overlay)
        else {
            return;
        };
        let scope = inst.scope();
        let button = locator::resolve(&self.doc, cfg.menu_button.el.as_ref(), Role::Focus, &scope)
            .or(inst.menu_button());
        let dropdown =
            locator::resolve(&self.doc, cfg.menu_dropdown.el.as_ref(), Role::Focus, &scope)
                .or(inst.menu_dropdown())
                .or(inst.container());
        let literal = cfg.literal_clip_path().map(String::from);
        let container = inst.container();

        let mut targets: SmallVec<[ElementId; 2]> = SmallVec::new();
        for el in [button, dropdown].into_iter().flatten() {
            if !targets.contains(&el) {
                targets.push(el);
            }
        }

        let key = ListenerKey::Instance(id, Handler::ClipRedraw);
        let mut scrollers: SmallVec<[ElementId; 8]> = SmallVec::new();
        for &el in &targets {
            for ancestor in self.doc.ancestors(el) {
                if !scrollers.contains(&ancestor) {
                    scrollers.push(ancestor);
                }
            }
        }
        for el in scrollers {
            self.listeners.add(el.into(), EventKind::Scroll, key, false);
        }
        self.listeners.add(EventTarget::Window, EventKind::Resize, key, false);
        let mut animated: SmallVec<[ElementId; 2]> = container.into_iter().collect();
        if let Some(d) = dropdown
            && !animated.contains(&d)
        {
            animated.push(d);
        }
        for el in animated {
            self.listeners.add(el.into(), EventKind::AnimationEnd, key, false);
            self.listeners.add(el.into(), EventKind::TransitionEnd, key, false);
        }

        let mut record = ClipRecord::new(id, overlay, targets, literal);
        record.redraw(&mut self.doc);
        tracing::debug!(id = %id, "clipped overlay mounted");
        self.clips.insert(id, record);
    }

    fn unmount_clip(&mut self, entry: &StackEntry) {
        let id = entry.id;
        let Some(record) = self.clips.remove(&id) else {
            return;
        };
        record.debounce.cancel(&mut self.timers);
        let key = ListenerKey::Instance(id, Handler::ClipRedraw);
        self.listeners.remove_where(|r| r.handler == key);
        tracing::debug!(id = %id, redraws = record.redraws, "clipped overlay unmounted");
    }

    // --- stack ---

    fn push_stack(&mut self, entry: StackEntry) {
        if self.stack.push(entry) == Some(StackTransition::BecameNonEmpty) {
            self.install_escape_listener();
        }
    }

    fn remove_stack(&mut self, id: InstanceId) {
        let Some(removal) = self.stack.remove(id) else {
            return;
        };
        if removal.entry.overlay_clipped {
            self.unmount_clip(&removal.entry);
        }
        if removal.transition == Some(StackTransition::BecameEmpty) {
            self.remove_escape_listener();
        }
    }

    fn install_escape_listener(&mut self) {
        if self.escape_listener_installed {
            return;
        }
        self.escape_listener_installed = true;
        self.listeners
            .add(EventTarget::Document, EventKind::KeyDown, ListenerKey::Escape, false);
        tracing::debug!("escape listener installed");
    }

    fn remove_escape_listener(&mut self) {
        if !self.escape_listener_installed {
            return;
        }
        self.escape_listener_installed = false;
        self.listeners
            .remove(EventTarget::Document, EventKind::KeyDown, ListenerKey::Escape);
        tracing::debug!("escape listener removed");
    }

    fn on_escape(&mut self, event: &Event) {
        if event.key != Some(Key::Escape) {
            return;
        }
        let Some(top) = self.stack.top() else {
            return;
        };
        if !top.escape_key {
            return;
        }
        let (id, menu_button) = (top.id, top.menu_button);
        tracing::debug!(id = %id, "escape closes top of stack");
        self.focus(menu_button);
        self.set_open(id, false);
    }

    // --- events ---

    fn move_focus(&mut self, new: Option<ElementId>) {
        let old = self.doc.active_element();
        if old == new {
            return;
        }
        self.doc.set_active_element(new);
        let new = self.doc.active_element();
        let gaining = if self.platform.reports_related_target {
            new
        } else {
            None
        };
        if let Some(old) = old {
            self.dispatch(Event::new(EventKind::Blur, old.into()).with_related(gaining));
            self.dispatch(Event::new(EventKind::FocusOut, old.into()).with_related(gaining));
            if self.doc.active_element() != new {
                return;
            }
        }
        if let Some(el) = new {
            self.dispatch(Event::new(EventKind::Focus, el.into()).with_related(old));
            if self.doc.active_element() != new {
                return;
            }
            self.dispatch(Event::new(EventKind::FocusIn, el.into()).with_related(old));
        }
    }

    fn sequential_focus(&mut self, backwards: bool) {
        let navigation = if backwards {
            Navigation::Prev
        } else {
            Navigation::Next
        };
        let next = match self.doc.active_element() {
            Some(from) => next_focusable(&self.doc, &TabQuery::new(from, navigation)),
            None => next_focusable(
                &self.doc,
                &TabQuery::new(self.doc.body(), navigation).wrap(WrapMode::Document),
            ),
        };
        self.move_focus(next);
    }

    fn dispatch(&mut self, event: Event) -> Event {
        let path = dispatcher::propagation_path(&self.doc, event.target, event.kind);
        let mut delivery = Delivery { rt: self, event };
        dispatcher::run(&path, &mut delivery, |target, d| d.rt.deliver(target, &mut d.event));
        delivery.event
    }

    fn deliver(&mut self, target: EventTarget, event: &mut Event) -> Outcome {
        for reg in self.listeners.snapshot(target, event.kind) {
            let live = if reg.once {
                self.listeners.take_once(&reg)
            } else {
                self.listeners.contains(reg.target, reg.kind, reg.handler)
            };
            if live && self.invoke(reg.handler, event) == Outcome::Stop {
                return Outcome::Stop;
            }
        }
        Outcome::Continue
    }

    fn invoke(&mut self, key: ListenerKey, event: &mut Event) -> Outcome {
        match key {
            ListenerKey::Escape => {
                self.on_escape(event);
                Outcome::Continue
            }
            ListenerKey::Instance(id, Handler::ClipRedraw) => {
                if let Some(record) = self.clips.get(&id) {
                    record.debounce.schedule(&mut self.timers);
                }
                Outcome::Continue
            }
            ListenerKey::Instance(id, handler) => {
                let Some(slot) = self.slots.get_mut(&id) else {
                    return Outcome::Continue;
                };
                let fx = slot.instance.handle(&self.doc, handler, event);
                self.apply(id, fx, Some(event))
            }
        }
    }

    fn apply(&mut self, id: InstanceId, fx: Effects, mut event: Option<&mut Event>) -> Outcome {
        let mut outcome = Outcome::Continue;
        for effect in fx {
            match effect {
                Effect::SetOpen(open) => self.set_open(id, open),
                Effect::Focus { el, prevent_scroll } => self.focus_with(el, prevent_scroll),
                Effect::Listen {
                    target,
                    kind,
                    handler,
                    once,
                } => {
                    if self
                        .listeners
                        .add(target, kind, ListenerKey::Instance(id, handler), once)
                    {
                        tracing::trace!(id = %id, ?target, ?kind, ?handler, once, "listen");
                    }
                }
                Effect::Unlisten {
                    target,
                    kind,
                    handler,
                } => {
                    if self
                        .listeners
                        .remove(target, kind, ListenerKey::Instance(id, handler))
                    {
                        tracing::trace!(id = %id, ?target, ?kind, ?handler, "unlisten");
                    }
                }
                Effect::Schedule(slot) => {
                    self.timers.schedule(TimerKey::new(id, slot), 0);
                }
                Effect::Cancel(slot) => {
                    self.timers.cancel(TimerKey::new(id, slot));
                }
                Effect::SetAttribute { el, name, value } => {
                    if self.doc.set_attribute(el, name, &value) {
                        self.mutate(el);
                    }
                }
                Effect::PreventDefault => {
                    if let Some(ev) = event.as_deref_mut() {
                        ev.default_prevented = true;
                    }
                }
                Effect::StopPropagation => outcome = Outcome::Stop,
                Effect::ReportFocusWithin(within) => {
                    self.focus_within.insert(id, within);
                }
                Effect::PushStack(entry) => self.push_stack(entry),
                Effect::RemoveStack => self.remove_stack(id),
                Effect::MountClip => self.mount_clip(id),
            }
        }
        outcome
    }
}

fn is_scroll_container(doc: &Document, el: ElementId) -> bool {
    ["overflow", "overflow-x", "overflow-y"]
        .iter()
        .any(|p| matches!(doc.style(el, p), Some("auto" | "scroll")))
}

fn sentinel(doc: &mut Document, container: ElementId) -> ElementId {
    doc.build("div")
        .attr("tabindex", "0")
        .attr("aria-hidden", "true")
        .style("position", "absolute")
        .style("outline", "none")
        .style("pointer-events", "none")
        .append_to(container)
}
