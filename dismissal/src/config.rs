// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance options.

use alloc::string::String;

use crate::locator::ElementRef;
use crate::overlay::OverlayMode;

/// Options for one dismiss instance.
///
/// Built with [`DismissConfig::new`] and the `with_*` methods:
///
/// ```
/// use dismissal::{DismissConfig, ElementRef, OverlayMode};
///
/// let config = DismissConfig::new("#settings-btn")
///     .with_menu_dropdown(".settings-menu")
///     .with_close_button(ElementRef::list([".ok", ".cancel"]))
///     .with_focus_on_leave("menuButton")
///     .with_overlay(OverlayMode::Block);
/// assert!(config.close_when_menu_button_is_clicked);
/// assert!(config.needs_sentinels());
/// ```
#[derive(Clone, Debug)]
pub struct DismissConfig {
    /// Written to the container's `id` and marker attributes.
    pub id: Option<String>,
    /// Written to the container's `class`.
    pub class: Option<String>,
    /// The trigger, resolved once at mount against the whole document.
    pub menu_button: ElementRef,
    /// The panel, resolved within the container on every open. Defaults to the container.
    pub menu_dropdown: Option<ElementRef>,
    /// Close buttons, resolved within the container on every open.
    pub close_button: Option<ElementRef>,
    /// Keep Tab navigation inside the container while open.
    pub trap_focus: bool,
    /// Focused after opening. Default: focus stays on the trigger.
    pub focus_on_active: Option<ElementRef>,
    /// Focused after closing. Default: platform behaviour.
    pub focus_on_leave: Option<ElementRef>,
    /// Close when focus moves back to the trigger with the keyboard.
    pub close_when_menu_button_is_tabbed: bool,
    /// Trigger clicks toggle. When `false` they only ever open.
    pub close_when_menu_button_is_clicked: bool,
    /// Overlay behaviour.
    pub overlay: OverlayMode,
    /// Escape closes the instance when it is the most recently opened.
    pub escape_key: bool,
    /// Mirror the open state into the trigger's `aria-expanded`.
    pub use_aria_expanded: bool,
    /// Initial value of the host's open state.
    pub open: bool,
}

impl DismissConfig {
    /// Options with defaults for everything but the trigger.
    pub fn new(menu_button: impl Into<ElementRef>) -> Self {
        Self {
            id: None,
            class: None,
            menu_button: menu_button.into(),
            menu_dropdown: None,
            close_button: None,
            trap_focus: false,
            focus_on_active: None,
            focus_on_leave: None,
            close_when_menu_button_is_tabbed: false,
            close_when_menu_button_is_clicked: true,
            overlay: OverlayMode::None,
            escape_key: true,
            use_aria_expanded: true,
            open: false,
        }
    }

    /// Set the container id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the container class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the panel reference.
    pub fn with_menu_dropdown(mut self, r: impl Into<ElementRef>) -> Self {
        self.menu_dropdown = Some(r.into());
        self
    }

    /// Set the close button reference(s).
    pub fn with_close_button(mut self, r: impl Into<ElementRef>) -> Self {
        self.close_button = Some(r.into());
        self
    }

    /// Enable or disable the focus trap.
    pub fn with_trap_focus(mut self, on: bool) -> Self {
        self.trap_focus = on;
        self
    }

    /// Set the focus-on-active target.
    pub fn with_focus_on_active(mut self, r: impl Into<ElementRef>) -> Self {
        self.focus_on_active = Some(r.into());
        self
    }

    /// Set the focus-on-leave target.
    pub fn with_focus_on_leave(mut self, r: impl Into<ElementRef>) -> Self {
        self.focus_on_leave = Some(r.into());
        self
    }

    /// Close when the trigger is reached with the keyboard.
    pub fn with_close_when_menu_button_is_tabbed(mut self, on: bool) -> Self {
        self.close_when_menu_button_is_tabbed = on;
        self
    }

    /// Whether trigger clicks may close.
    pub fn with_close_when_menu_button_is_clicked(mut self, on: bool) -> Self {
        self.close_when_menu_button_is_clicked = on;
        self
    }

    /// Set the overlay mode.
    pub fn with_overlay(mut self, overlay: OverlayMode) -> Self {
        self.overlay = overlay;
        self
    }

    /// Enable or disable Escape handling.
    pub fn with_escape_key(mut self, on: bool) -> Self {
        self.escape_key = on;
        self
    }

    /// Enable or disable `aria-expanded` writes.
    pub fn with_aria_expanded(mut self, on: bool) -> Self {
        self.use_aria_expanded = on;
        self
    }

    /// Start open.
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Whether focus sentinels bookend the container.
    pub fn needs_sentinels(&self) -> bool {
        self.trap_focus || self.focus_on_leave.is_some() || self.overlay.is_block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_options() {
        let c = DismissConfig::new("menuButton");
        assert!(matches!(c.menu_button, ElementRef::MenuButton));
        assert!(!c.trap_focus);
        assert!(!c.close_when_menu_button_is_tabbed);
        assert!(c.close_when_menu_button_is_clicked);
        assert!(matches!(c.overlay, OverlayMode::None));
        assert!(c.escape_key);
        assert!(c.use_aria_expanded);
        assert!(!c.open);
        assert!(!c.needs_sentinels());
    }

    #[test]
    fn sentinels_follow_trap_leave_or_block() {
        assert!(DismissConfig::new("#b").with_trap_focus(true).needs_sentinels());
        assert!(DismissConfig::new("#b").with_focus_on_leave("#x").needs_sentinels());
        assert!(
            DismissConfig::new("#b")
                .with_overlay(OverlayMode::Block)
                .needs_sentinels()
        );
        assert!(
            !DismissConfig::new("#b")
                .with_overlay("clipped".parse().unwrap())
                .needs_sentinels()
        );
    }
}
