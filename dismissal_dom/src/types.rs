// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document: element identifiers, event targets, kinds and keys.

/// Identifier for an element in the document (generational).
///
/// A removed element's slot may be reused; the generation keeps old handles
/// from aliasing the new occupant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Build a handle from a slot index and generation.
    ///
    /// For hosts implementing [`DocumentView`](crate::DocumentView) over
    /// their own node storage. Handles minted this way mean nothing to a
    /// [`Document`](crate::Document).
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self(index, generation)
    }

    /// Slot index.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Slot generation.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Something listeners can be attached to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventTarget {
    /// The window object. Receives `resize` and the tail of bubbling events.
    Window,
    /// The document object. Receives bubbling events after the `<body>`.
    Document,
    /// A concrete element.
    Element(ElementId),
}

impl EventTarget {
    /// Returns the element if this target is one.
    pub fn element(self) -> Option<ElementId> {
        match self {
            Self::Element(id) => Some(id),
            _ => None,
        }
    }
}

impl From<ElementId> for EventTarget {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

/// Event types the document can route.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    /// Primary pointer activation.
    Click,
    /// Element gained focus. Does not bubble.
    Focus,
    /// Element lost focus. Does not bubble.
    Blur,
    /// Element (or a descendant) gained focus.
    FocusIn,
    /// Element (or a descendant) lost focus.
    FocusOut,
    /// A key was pressed.
    KeyDown,
    /// A scroll container scrolled.
    Scroll,
    /// The viewport changed size.
    Resize,
    /// A CSS animation finished.
    AnimationEnd,
    /// A CSS transition finished.
    TransitionEnd,
}

impl EventKind {
    /// Whether events of this kind walk up to ancestors, the document and the window.
    pub fn bubbles(self) -> bool {
        !matches!(self, Self::Focus | Self::Blur | Self::Scroll | Self::Resize)
    }
}

/// Keys the dismiss logic cares about.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Key {
    /// `Tab`; see [`Modifiers::SHIFT`] for reverse traversal.
    Tab,
    /// `Escape`.
    Escape,
    /// `Enter`.
    Enter,
    /// A printable character.
    Char(char),
}

bitflags::bitflags! {
    /// Keyboard modifiers held during a key event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT = 0b0000_0001;
        /// Control key.
        const CTRL  = 0b0000_0010;
        /// Alt/Option key.
        const ALT   = 0b0000_0100;
        /// Meta/Command key.
        const META  = 0b0000_1000;
    }
}
