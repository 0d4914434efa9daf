// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Side effects requested by the state machine.
//!
//! Handlers on [`DismissInstance`](crate::DismissInstance) never touch the
//! document, the listener registry, the timers or the stack. They return an
//! ordered list of [`Effect`]s and the [`Runtime`](crate::Runtime) applies
//! them one by one. Applying an effect may dispatch further events (a focus
//! change fires `blur`/`focusout`/`focus`/`focusin`), which re-enter the
//! state machine before the next effect runs, just as synchronous listener
//! calls would in a browser.

use alloc::string::String;

use dismissal_dom::{ElementId, EventKind, EventTarget};
use smallvec::SmallVec;

use crate::stack::StackEntry;
use crate::types::{Handler, TimerSlot};

/// Effects of one handler invocation, in application order.
pub type Effects = SmallVec<[Effect; 4]>;

/// A single side effect.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Call the host's open setter. Unchanged values are ignored.
    SetOpen(bool),
    /// Move focus to an element (ignored if it cannot take focus).
    Focus {
        /// Target.
        el: ElementId,
        /// Leave scroll containers where they are.
        prevent_scroll: bool,
    },
    /// Install a listener for this instance.
    Listen {
        /// Where.
        target: EventTarget,
        /// What.
        kind: EventKind,
        /// Which callback.
        handler: Handler,
        /// Remove before first invocation.
        once: bool,
    },
    /// Remove a listener of this instance.
    Unlisten {
        /// Where.
        target: EventTarget,
        /// What.
        kind: EventKind,
        /// Which callback.
        handler: Handler,
    },
    /// Start a zero-delay timer in a slot, replacing a pending one.
    Schedule(TimerSlot),
    /// Cancel a timer slot.
    Cancel(TimerSlot),
    /// Write an attribute.
    SetAttribute {
        /// Element.
        el: ElementId,
        /// Attribute name.
        name: &'static str,
        /// New value.
        value: String,
    },
    /// Suppress the default action of the event being handled.
    PreventDefault,
    /// Stop propagation of the event being handled, including remaining
    /// listeners on the current target.
    StopPropagation,
    /// Report whether focus is within the component.
    ReportFocusWithin(bool),
    /// Register on the dismiss stack.
    PushStack(StackEntry),
    /// Leave the dismiss stack.
    RemoveStack,
    /// Create the clip record and draw the clipped overlay. The record goes
    /// away with the instance's stack entry.
    MountClip,
}

impl Effect {
    /// [`Effect::Focus`] that scrolls the target into view, like a plain
    /// `focus()` call.
    pub fn focus(el: ElementId) -> Self {
        Self::Focus {
            el,
            prevent_scroll: false,
        }
    }

    /// Shorthand for a persistent [`Effect::Listen`].
    pub fn listen(target: impl Into<EventTarget>, kind: EventKind, handler: Handler) -> Self {
        Self::Listen {
            target: target.into(),
            kind,
            handler,
            once: false,
        }
    }

    /// Shorthand for a `once` [`Effect::Listen`].
    pub fn listen_once(target: impl Into<EventTarget>, kind: EventKind, handler: Handler) -> Self {
        Self::Listen {
            target: target.into(),
            kind,
            handler,
            once: true,
        }
    }

    /// Shorthand for [`Effect::Unlisten`].
    pub fn unlisten(target: impl Into<EventTarget>, kind: EventKind, handler: Handler) -> Self {
        Self::Unlisten {
            target: target.into(),
            kind,
            handler,
        }
    }
}
