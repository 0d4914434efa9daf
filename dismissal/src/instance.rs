// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dismiss instance state machine.
//!
//! One [`DismissInstance`] exists per mounted dropdown. It is **Closed**
//! (only the trigger's own listeners) or **Open** (container, sentinel,
//! close-button and fallback listeners active, stack membership held).
//! Every input is a method taking the current document read-only and
//! returning [`Effects`]; nothing here mutates the world directly, so event
//! orderings can be replayed and asserted on.
//!
//! ## Close paths
//!
//! - Close-button click and overlay click close immediately.
//! - Focus leaving the container or the trigger for a known element closes on
//!   the next macrotask ([`TimerSlot::ContainerFocusOut`],
//!   [`TimerSlot::TriggerBlur`]). Focus returning to the component first
//!   cancels it, and a close that already happened makes the timer a no-op.
//! - Focus leaving with no related target (Safari iOS, leaving the window)
//!   installs a document `focusin` listener and a document `click` listener
//!   that close on the next outside interaction. The click listener is a
//!   single registration per instance: one-shot when the trigger blur
//!   installed it, persistent when the container focusout did, and whichever
//!   path installs it first decides.
//! - Tab past the trailing sentinel releases focus after the trigger and
//!   closes; Shift+Tab past the leading sentinel returns to the trigger (or
//!   the focus-on-leave target), closing only if configured to.
//! - Escape is routed by the runtime through the dismiss stack.

use alloc::format;
use alloc::string::{String, ToString};

use dismissal_dom::dispatcher::Event;
use dismissal_dom::{DocumentView, ElementId, EventKind, EventTarget, Key};
use dismissal_focus::{Navigation, TabQuery, next_focusable};
use smallvec::SmallVec;

use crate::config::DismissConfig;
use crate::effect::{Effect, Effects};
use crate::locator::{self, Role, Scope};
use crate::stack::StackEntry;
use crate::types::{Handler, InstanceId, TimerSlot};

bitflags::bitflags! {
    /// Deferred closes currently scheduled by an instance.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PendingTimers: u8 {
        /// [`TimerSlot::ContainerFocusOut`] is pending.
        const CONTAINER_FOCUS_OUT = 0b0000_0001;
        /// [`TimerSlot::TriggerBlur`] is pending.
        const TRIGGER_BLUR        = 0b0000_0010;
    }
}

impl PendingTimers {
    fn for_slot(slot: TimerSlot) -> Self {
        match slot {
            TimerSlot::ContainerFocusOut => Self::CONTAINER_FOCUS_OUT,
            TimerSlot::TriggerBlur => Self::TRIGGER_BLUR,
            TimerSlot::ClipRedraw => Self::empty(),
        }
    }
}

/// State of the document `click` registration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum ClickWatch {
    #[default]
    Off,
    Once,
    Persistent,
}

/// Elements the runtime created for an open instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    /// The container wrapping sentinels and content.
    pub container: ElementId,
    /// Leading and trailing focus sentinels.
    pub sentinels: Option<(ElementId, ElementId)>,
    /// Block or clipped overlay, portalled to the body.
    pub overlay: Option<ElementId>,
    /// Stack length when the instance opened.
    pub depth: usize,
}

/// State machine context for one dropdown.
#[derive(Clone, Debug)]
pub struct DismissInstance {
    id: InstanceId,
    config: DismissConfig,
    open: bool,
    menu_button: Option<ElementId>,
    menu_button_id: String,
    rendered: Option<Rendered>,
    menu_dropdown: Option<ElementId>,
    close_buttons: SmallVec<[ElementId; 2]>,
    pending: PendingTimers,
    /// Set when a Tab on the trigger already moved focus; the next trigger
    /// blur consumes it instead of scheduling a close.
    trigger_tab_handled: bool,
    outside_focus: bool,
    outside_click: ClickWatch,
}

impl DismissInstance {
    /// A closed, unmounted instance.
    pub fn new(id: InstanceId, config: DismissConfig) -> Self {
        Self {
            id,
            config,
            open: false,
            menu_button: None,
            menu_button_id: String::new(),
            rendered: None,
            menu_dropdown: None,
            close_buttons: SmallVec::new(),
            pending: PendingTimers::empty(),
            trigger_tab_handled: false,
            outside_focus: false,
            outside_click: ClickWatch::Off,
        }
    }

    /// Identifier.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Options.
    pub fn config(&self) -> &DismissConfig {
        &self.config
    }

    /// Mirrored open state.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the trigger could not be resolved; such instances never open.
    pub fn is_inert(&self) -> bool {
        self.menu_button.is_none()
    }

    /// The trigger.
    pub fn menu_button(&self) -> Option<ElementId> {
        self.menu_button
    }

    /// The trigger's `id` attribute (generated when it had none).
    pub fn menu_button_id(&self) -> &str {
        &self.menu_button_id
    }

    /// The panel, while open.
    pub fn menu_dropdown(&self) -> Option<ElementId> {
        self.menu_dropdown
    }

    /// Close buttons, while open.
    pub fn close_buttons(&self) -> &[ElementId] {
        &self.close_buttons
    }

    /// Rendered elements, while open.
    pub fn rendered(&self) -> Option<&Rendered> {
        self.rendered.as_ref()
    }

    /// The container, while open.
    pub fn container(&self) -> Option<ElementId> {
        self.rendered.map(|r| r.container)
    }

    /// The overlay element, while open.
    pub fn overlay(&self) -> Option<ElementId> {
        self.rendered.and_then(|r| r.overlay)
    }

    /// Scheduled deferred closes.
    pub fn pending(&self) -> PendingTimers {
        self.pending
    }

    /// Whether the document `focusin` fallback is installed.
    pub fn has_outside_fallback(&self) -> bool {
        self.outside_focus
    }

    /// Whether the document `click` fallback is installed, and if so whether
    /// it is one-shot.
    pub fn outside_click(&self) -> Option<bool> {
        match self.outside_click {
            ClickWatch::Off => None,
            ClickWatch::Once => Some(true),
            ClickWatch::Persistent => Some(false),
        }
    }

    /// The scope references resolve against.
    pub fn scope(&self) -> Scope {
        Scope {
            menu_button: self.menu_button,
            menu_dropdown: self.menu_dropdown,
            container: self.container(),
        }
    }

    /// Stack projection of this instance.
    pub fn stack_entry(&self) -> Option<StackEntry> {
        Some(StackEntry {
            id: self.id,
            menu_button: self.menu_button?,
            overlay_clipped: self.config.overlay.is_clipped(),
            escape_key: self.config.escape_key,
        })
    }

    // --- lifecycle ---

    /// Runs once after the host attached its elements: resolve the trigger and
    /// wire its click and focus listeners.
    ///
    /// A missing trigger leaves the instance inert.
    pub fn mount(&mut self, doc: &dyn DocumentView) -> Effects {
        let mut fx = Effects::new();
        let Some(btn) = locator::resolve(
            doc,
            Some(&self.config.menu_button),
            Role::MenuButton,
            &self.scope(),
        ) else {
            tracing::debug!(id = %self.id, "menu button not found; instance stays inert");
            return fx;
        };
        self.menu_button = Some(btn);
        fx.push(Effect::listen(btn, EventKind::Click, Handler::TriggerClick));
        fx.push(Effect::listen(btn, EventKind::Focus, Handler::TriggerFocus));
        match doc.attribute(btn, "id").filter(|v| !v.is_empty()) {
            Some(existing) => self.menu_button_id = existing.to_string(),
            None => {
                self.menu_button_id = format!("dismiss-menu-button-{}", self.id.get());
                fx.push(Effect::SetAttribute {
                    el: btn,
                    name: "id",
                    value: self.menu_button_id.clone(),
                });
            }
        }
        self.write_aria_expanded(&mut fx, self.config.open);
        fx
    }

    /// Record the elements the runtime rendered for an opening instance and
    /// wire their listeners.
    pub fn attach(&mut self, rendered: Rendered) -> Effects {
        let mut fx = Effects::new();
        let container = rendered.container;
        fx.push(Effect::listen(container, EventKind::FocusIn, Handler::ContainerFocusIn));
        fx.push(Effect::listen(container, EventKind::FocusOut, Handler::ContainerFocusOut));
        if let Some((first, last)) = rendered.sentinels {
            fx.push(Effect::listen(first, EventKind::Focus, Handler::SentinelFirst));
            fx.push(Effect::listen(last, EventKind::Focus, Handler::SentinelLast));
        }
        if let Some(overlay) = rendered.overlay {
            fx.push(Effect::listen(overlay, EventKind::Click, Handler::OverlayClick));
        }
        self.rendered = Some(rendered);
        fx
    }

    /// Forget the rendered elements; the runtime removes them (and their
    /// listeners) from the document.
    pub fn detach(&mut self) -> Option<Rendered> {
        self.rendered.take()
    }

    /// The reactive effect: runs whenever the host's open state changes.
    pub fn open_changed(&mut self, doc: &dyn DocumentView, open: bool) -> Effects {
        let mut fx = Effects::new();
        if self.open == open {
            return fx;
        }
        self.open = open;
        if self.menu_button.is_none() {
            return fx;
        }
        if open {
            self.enter_open(doc, &mut fx);
        } else {
            self.enter_closed(doc, &mut fx);
        }
        fx
    }

    fn enter_open(&mut self, doc: &dyn DocumentView, fx: &mut Effects) {
        tracing::debug!(id = %self.id, "open");
        self.write_aria_expanded(fx, true);

        self.menu_dropdown = locator::resolve(
            doc,
            self.config.menu_dropdown.as_ref(),
            Role::MenuDropdown,
            &self.scope(),
        );
        if let Some(panel) = self.menu_dropdown
            && !doc.has_attribute(panel, "aria-labelledby")
        {
            fx.push(Effect::SetAttribute {
                el: panel,
                name: "aria-labelledby",
                value: self.menu_button_id.clone(),
            });
        }

        let scope = self.scope();
        self.close_buttons =
            locator::resolve_all(doc, self.config.close_button.as_ref(), Role::CloseButton, &scope);
        for &el in &self.close_buttons {
            fx.push(Effect::listen(el, EventKind::Click, Handler::CloseButton));
        }

        if let Some(entry) = self.stack_entry() {
            fx.push(Effect::PushStack(entry));
        }
        if self.config.overlay.is_clipped() {
            fx.push(Effect::MountClip);
        }
        if let Some(target) = &self.config.focus_on_active
            && let Some(el) = locator::resolve(doc, Some(target), Role::Focus, &scope)
        {
            fx.push(Effect::Focus {
                el,
                prevent_scroll: target.prevent_scroll(),
            });
        }
    }

    fn enter_closed(&mut self, doc: &dyn DocumentView, fx: &mut Effects) {
        tracing::debug!(id = %self.id, "closed");
        if let Some(target) = &self.config.focus_on_leave
            && let Some(el) = locator::resolve(doc, Some(target), Role::Focus, &self.scope())
        {
            fx.push(Effect::Focus {
                el,
                prevent_scroll: target.prevent_scroll(),
            });
        }
        self.write_aria_expanded(fx, false);
        self.remove_outside_listeners(fx);
        self.remove_close_buttons(fx);
        self.menu_dropdown = None;
        self.cancel_timers(fx);
        self.trigger_tab_handled = false;
        fx.push(Effect::RemoveStack);
    }

    /// Runs once before the host detaches: tear everything down without
    /// calling the open setter.
    pub fn cleanup(&mut self) -> Effects {
        let mut fx = Effects::new();
        if let Some(btn) = self.menu_button {
            fx.push(Effect::unlisten(btn, EventKind::Click, Handler::TriggerClick));
            fx.push(Effect::unlisten(btn, EventKind::Focus, Handler::TriggerFocus));
            fx.push(Effect::unlisten(btn, EventKind::KeyDown, Handler::TriggerKeyDown));
            fx.push(Effect::unlisten(btn, EventKind::Blur, Handler::TriggerBlur));
        }
        self.remove_outside_listeners(&mut fx);
        self.remove_close_buttons(&mut fx);
        self.cancel_timers(&mut fx);
        fx.push(Effect::RemoveStack);
        self.menu_dropdown = None;
        self.open = false;
        fx
    }

    /// A deferred close came due.
    pub fn timer_fired(&mut self, slot: TimerSlot) -> Effects {
        let mut fx = Effects::new();
        self.pending.remove(PendingTimers::for_slot(slot));
        if !self.open {
            tracing::trace!(id = %self.id, ?slot, "deferred close on closed instance");
            return fx;
        }
        fx.push(Effect::SetOpen(false));
        fx.push(Effect::ReportFocusWithin(false));
        fx
    }

    // --- events ---

    /// Route a DOM event to the callback registered as `handler`.
    pub fn handle(&mut self, doc: &dyn DocumentView, handler: Handler, event: &Event) -> Effects {
        match handler {
            Handler::TriggerClick => self.on_trigger_click(),
            Handler::TriggerFocus => self.on_trigger_focus(),
            Handler::TriggerBlur => self.on_trigger_blur(doc, event),
            Handler::TriggerKeyDown => self.on_trigger_keydown(doc, event),
            Handler::ContainerFocusIn => self.on_container_focus_in(),
            Handler::ContainerFocusOut => self.on_container_focus_out(event),
            Handler::SentinelFirst => self.on_sentinel_first(doc, event),
            Handler::SentinelLast => self.on_sentinel_last(doc),
            Handler::CloseButton | Handler::OverlayClick => self.close(),
            Handler::OutsideClick => {
                if self.outside_click == ClickWatch::Once {
                    self.outside_click = ClickWatch::Off;
                }
                self.on_outside_click(doc, event)
            }
            Handler::OutsideFocus => self.on_outside_focus(doc, event),
            Handler::ClipRedraw => Effects::new(),
        }
    }

    fn close(&self) -> Effects {
        let mut fx = Effects::new();
        fx.push(Effect::SetOpen(false));
        fx
    }

    fn on_trigger_click(&mut self) -> Effects {
        let mut fx = Effects::new();
        let Some(btn) = self.menu_button else {
            return fx;
        };
        self.cancel_timers(&mut fx);
        fx.push(Effect::focus(btn));
        let next = !self.config.close_when_menu_button_is_clicked || !self.open;
        fx.push(Effect::SetOpen(next));
        fx
    }

    fn on_trigger_focus(&mut self) -> Effects {
        let mut fx = Effects::new();
        let Some(btn) = self.menu_button else {
            return fx;
        };
        if !self.config.close_when_menu_button_is_tabbed {
            self.cancel(&mut fx, TimerSlot::ContainerFocusOut);
        }
        fx.push(Effect::listen(btn, EventKind::KeyDown, Handler::TriggerKeyDown));
        fx.push(Effect::listen_once(btn, EventKind::Blur, Handler::TriggerBlur));
        fx.push(Effect::ReportFocusWithin(true));
        fx
    }

    fn on_trigger_blur(&mut self, doc: &dyn DocumentView, event: &Event) -> Effects {
        let mut fx = Effects::new();
        let Some(btn) = self.menu_button else {
            return fx;
        };
        if !self.open {
            fx.push(Effect::ReportFocusWithin(false));
            return fx;
        }
        if self.trigger_tab_handled {
            self.trigger_tab_handled = false;
            fx.push(Effect::unlisten(btn, EventKind::KeyDown, Handler::TriggerKeyDown));
            return fx;
        }
        let Some(related) = event.related_target else {
            if !self.config.overlay.is_some() {
                self.watch_outside_click(&mut fx, true);
            }
            return fx;
        };
        self.remove_outside_listeners(&mut fx);
        if within(doc, self.container(), related) {
            return fx;
        }
        self.schedule(&mut fx, TimerSlot::TriggerBlur);
        fx
    }

    fn on_trigger_keydown(&mut self, doc: &dyn DocumentView, event: &Event) -> Effects {
        let mut fx = Effects::new();
        let Some(btn) = self.menu_button else {
            return fx;
        };
        if !self.open {
            return fx;
        }
        if event.is_shift(Key::Tab) {
            self.trigger_tab_handled = true;
            fx.push(Effect::SetOpen(false));
            fx.push(Effect::unlisten(btn, EventKind::KeyDown, Handler::TriggerKeyDown));
            fx.push(Effect::unlisten(btn, EventKind::Blur, Handler::TriggerBlur));
        } else if event.is_plain(Key::Tab) {
            self.trigger_tab_handled = true;
            fx.push(Effect::PreventDefault);
            if let Some(el) = self.first_in_panel(doc).or(self.container()) {
                fx.push(Effect::focus(el));
            }
        }
        fx
    }

    fn on_container_focus_in(&mut self) -> Effects {
        let mut fx = Effects::new();
        self.cancel(&mut fx, TimerSlot::ContainerFocusOut);
        fx.push(Effect::ReportFocusWithin(true));
        fx
    }

    fn on_container_focus_out(&mut self, event: &Event) -> Effects {
        let mut fx = Effects::new();
        if self.config.focus_on_leave.is_some() || self.config.overlay.is_block() {
            fx.push(Effect::StopPropagation);
        }
        if !self.open {
            return fx;
        }
        if event.related_target.is_some() {
            self.schedule(&mut fx, TimerSlot::ContainerFocusOut);
            return fx;
        }
        if !self.outside_focus {
            self.outside_focus = true;
            fx.push(Effect::listen(
                EventTarget::Document,
                EventKind::FocusIn,
                Handler::OutsideFocus,
            ));
        }
        if !self.config.overlay.is_some() {
            self.watch_outside_click(&mut fx, false);
        }
        fx
    }

    fn on_sentinel_first(&mut self, doc: &dyn DocumentView, event: &Event) -> Effects {
        let mut fx = Effects::new();
        let (Some(btn), Some(container)) = (self.menu_button, self.container()) else {
            return fx;
        };
        self.cancel(&mut fx, TimerSlot::ContainerFocusOut);

        // Arriving from the trigger or the container itself means "enter".
        if event
            .related_target
            .is_some_and(|r| r == container || r == btn)
        {
            let el = self.first_in_panel(doc).unwrap_or(container);
            fx.push(Effect::focus(el));
            return fx;
        }
        if self.config.trap_focus {
            let el = self.last_in_panel(doc).unwrap_or(container);
            fx.push(Effect::focus(el));
            return fx;
        }
        if self.config.close_when_menu_button_is_tabbed {
            fx.push(Effect::SetOpen(false));
        }
        let leave = match &self.config.focus_on_leave {
            None => Some((btn, false)),
            Some(r) => locator::resolve(doc, Some(r), Role::Focus, &self.scope())
                .map(|el| (el, r.prevent_scroll())),
        };
        if let Some((el, prevent_scroll)) = leave {
            fx.push(Effect::Focus { el, prevent_scroll });
        }
        fx
    }

    fn on_sentinel_last(&mut self, doc: &dyn DocumentView) -> Effects {
        let mut fx = Effects::new();
        let (Some(btn), Some(container)) = (self.menu_button, self.container()) else {
            return fx;
        };
        self.cancel(&mut fx, TimerSlot::ContainerFocusOut);
        if self.config.trap_focus {
            let el = self.first_in_panel(doc).unwrap_or(container);
            fx.push(Effect::focus(el));
            return fx;
        }
        let query = TabQuery::new(btn, Navigation::Next).skip_within(container);
        if let Some(el) = next_focusable(doc, &query) {
            fx.push(Effect::focus(el));
        }
        fx.push(Effect::SetOpen(false));
        fx
    }

    fn on_outside_click(&mut self, doc: &dyn DocumentView, event: &Event) -> Effects {
        let mut fx = Effects::new();
        if !self.open {
            return fx;
        }
        let Some(target) = event.target.element() else {
            return fx;
        };
        if within(doc, self.container(), target)
            || within(doc, self.menu_button, target)
            || within(doc, self.overlay(), target)
        {
            return fx;
        }
        self.remove_outside_listeners(&mut fx);
        fx.push(Effect::SetOpen(false));
        fx
    }

    fn on_outside_focus(&mut self, doc: &dyn DocumentView, event: &Event) -> Effects {
        let mut fx = Effects::new();
        if !self.open {
            return fx;
        }
        let Some(target) = event.target.element() else {
            return fx;
        };
        if within(doc, self.container(), target) || within(doc, self.menu_button, target) {
            // Focus came back; the regular focusout path takes over again.
            self.remove_outside_listeners(&mut fx);
            return fx;
        }
        if within(doc, self.overlay(), target) {
            return fx;
        }
        self.remove_outside_listeners(&mut fx);
        fx.push(Effect::SetOpen(false));
        fx
    }

    // --- helpers ---

    /// First tabbable element between the sentinels (or inside the container).
    fn first_in_panel(&self, doc: &dyn DocumentView) -> Option<ElementId> {
        let r = self.rendered?;
        let (from, stop) = match r.sentinels {
            Some((first, last)) => (first, Some(last)),
            None => (r.container, None),
        };
        let mut query = TabQuery::new(from, Navigation::Next);
        query.stop_at = stop;
        next_focusable(doc, &query).filter(|&el| doc.contains(r.container, el))
    }

    /// Last tabbable element between the sentinels.
    fn last_in_panel(&self, doc: &dyn DocumentView) -> Option<ElementId> {
        let r = self.rendered?;
        let (first, last) = r.sentinels?;
        let query = TabQuery::new(last, Navigation::Prev).stop_at(first);
        next_focusable(doc, &query).filter(|&el| doc.contains(r.container, el))
    }

    fn write_aria_expanded(&self, fx: &mut Effects, open: bool) {
        if !self.config.use_aria_expanded {
            return;
        }
        if let Some(btn) = self.menu_button {
            fx.push(Effect::SetAttribute {
                el: btn,
                name: "aria-expanded",
                value: open.to_string(),
            });
        }
    }

    fn schedule(&mut self, fx: &mut Effects, slot: TimerSlot) {
        self.pending.insert(PendingTimers::for_slot(slot));
        fx.push(Effect::Schedule(slot));
    }

    fn cancel(&mut self, fx: &mut Effects, slot: TimerSlot) {
        let flag = PendingTimers::for_slot(slot);
        if self.pending.contains(flag) {
            self.pending.remove(flag);
            fx.push(Effect::Cancel(slot));
        }
    }

    fn cancel_timers(&mut self, fx: &mut Effects) {
        self.cancel(fx, TimerSlot::ContainerFocusOut);
        self.cancel(fx, TimerSlot::TriggerBlur);
    }

    /// Install the document `click` listener unless one is already
    /// registered; the first registration keeps its `once` flag.
    fn watch_outside_click(&mut self, fx: &mut Effects, once: bool) {
        if self.outside_click != ClickWatch::Off {
            return;
        }
        let (target, kind, handler) = (EventTarget::Document, EventKind::Click, Handler::OutsideClick);
        if once {
            self.outside_click = ClickWatch::Once;
            fx.push(Effect::listen_once(target, kind, handler));
        } else {
            self.outside_click = ClickWatch::Persistent;
            fx.push(Effect::listen(target, kind, handler));
        }
    }

    fn remove_outside_listeners(&mut self, fx: &mut Effects) {
        if self.outside_focus {
            self.outside_focus = false;
            fx.push(Effect::unlisten(
                EventTarget::Document,
                EventKind::FocusIn,
                Handler::OutsideFocus,
            ));
        }
        if self.outside_click != ClickWatch::Off {
            self.outside_click = ClickWatch::Off;
            fx.push(Effect::unlisten(
                EventTarget::Document,
                EventKind::Click,
                Handler::OutsideClick,
            ));
        }
    }

    fn remove_close_buttons(&mut self, fx: &mut Effects) {
        for el in self.close_buttons.drain(..) {
            fx.push(Effect::unlisten(el, EventKind::Click, Handler::CloseButton));
        }
    }
}

fn within(doc: &dyn DocumentView, scope: Option<ElementId>, el: ElementId) -> bool {
    scope.is_some_and(|s| doc.contains(s, el))
}
