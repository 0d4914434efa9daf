// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers shared by the state machine, the stack and the runtime.

use core::fmt;

/// Identifier for a mounted dismiss instance.
///
/// Ids are handed out by the [`Runtime`](crate::Runtime) in mount order and
/// never reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl InstanceId {
    /// Construct an id directly. Useful for tests of the stack in isolation.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which instance callback a listener invokes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Handler {
    /// `click` on the trigger.
    TriggerClick,
    /// `focus` on the trigger.
    TriggerFocus,
    /// `blur` on the trigger (installed `once` on every trigger focus).
    TriggerBlur,
    /// `keydown` on the trigger.
    TriggerKeyDown,
    /// `focusin` on the container.
    ContainerFocusIn,
    /// `focusout` on the container.
    ContainerFocusOut,
    /// `focus` on the leading sentinel.
    SentinelFirst,
    /// `focus` on the trailing sentinel.
    SentinelLast,
    /// `click` on a close button.
    CloseButton,
    /// `click` on the block or clipped overlay.
    OverlayClick,
    /// Document `click` that closes on the next outside click. One per
    /// instance: `once` when the trigger blur installed it, persistent when
    /// focus left the container without a related target.
    OutsideClick,
    /// Document `focusin` half of the outside-focus fallback pair.
    OutsideFocus,
    /// Scroll, resize and animation signals that redraw a clipped overlay.
    ClipRedraw,
}

/// Listener identity stored in the runtime's registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ListenerKey {
    /// The process-wide Escape listener on the document.
    Escape,
    /// A per-instance callback.
    Instance(InstanceId, Handler),
}

impl ListenerKey {
    /// The owning instance, if any.
    pub fn instance(self) -> Option<InstanceId> {
        match self {
            Self::Escape => None,
            Self::Instance(id, _) => Some(id),
        }
    }
}

/// Per-instance timer slots. Scheduling a slot again replaces the pending one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TimerSlot {
    /// Deferred close after focus left the container.
    ContainerFocusOut,
    /// Deferred close after the trigger blurred to an outside element.
    TriggerBlur,
    /// Debounced clip-path recomputation.
    ClipRedraw,
}

/// Key of a pending timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimerKey {
    /// Owning instance.
    pub instance: InstanceId,
    /// Which of its timers.
    pub slot: TimerSlot,
}

impl TimerKey {
    /// Shorthand constructor.
    pub const fn new(instance: InstanceId, slot: TimerSlot) -> Self {
        Self { instance, slot }
    }
}
