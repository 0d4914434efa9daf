// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal: close menus, dropdowns and modals on outside interaction.
//!
//! A dropdown is described by a [`DismissConfig`] naming its trigger (the
//! "menu button"), its panel (the "menu dropdown") and optional close buttons,
//! focus targets and overlay. This crate models:
//! - **The state machine** ([`DismissInstance`]): one per dropdown. It reacts to
//!   trigger, container, sentinel and outside events and to the host's open
//!   state, and answers with ordered [`Effect`]s instead of touching anything.
//! - **The dismiss stack** ([`DismissStack`]): open instances in opening order.
//!   Escape closes only the top entry, and overlays stack by depth.
//! - **Overlays** ([`OverlayMode`]): a blocking backdrop, or a clipped one with
//!   holes over the trigger and panel ([`ClipRecord`]), redrawn on scroll,
//!   resize and mutation after a [`CLIP_DEBOUNCE_MS`](timer::CLIP_DEBOUNCE_MS)
//!   debounce.
//! - **Element references** ([`ElementRef`]): selectors, handles, producers,
//!   lists and the `"menuButton"`/`"menuDropdown"` keywords, resolved by
//!   [`resolve`] against a role-dependent [`Scope`].
//! - **A runtime** ([`Runtime`]): owns the document, listeners, timers and
//!   mounted instances, renders containers, sentinels and overlays when an
//!   instance opens, and turns simulated input into events in platform order.
//!   Content builders get a [`RenderCx`] and can declare nested instances
//!   that come and go with their container.
//!
//! Tab order and focusability come from `dismissal_focus`; the document,
//! listener registry and dispatch path from `dismissal_dom`. The state
//! machine, locator and navigator only read the document through
//! `dismissal_dom::DocumentView`.
//!
//! ## Minimal example
//!
//! ```rust
//! use dismissal::{DismissConfig, Runtime};
//!
//! let mut rt = Runtime::new();
//! let doc = rt.document_mut();
//! let body = doc.body();
//! let trigger = doc.build("button").id("menu-btn").append_to(body);
//! let outside = doc.build("input").append_to(body);
//!
//! let menu = rt.mount(body, DismissConfig::new("#menu-btn"), |cx, container| {
//!     cx.build("button").class("item").append_to(container);
//! });
//!
//! rt.click(trigger);
//! assert!(rt.is_open(menu));
//! assert_eq!(rt.document().attribute(trigger, "aria-expanded"), Some("true"));
//!
//! // Focus leaves for something unrelated; the close runs on the next task.
//! rt.click(outside);
//! rt.tick();
//! assert!(!rt.is_open(menu));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support in dependencies.
//! - `libm`: `no_std` + `alloc` builds relying on `libm` for float math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod effect;
mod instance;
mod locator;
mod overlay;
mod runtime;
mod stack;
pub mod timer;
mod types;

pub use config::DismissConfig;
pub use effect::{Effect, Effects};
pub use instance::{DismissInstance, PendingTimers, Rendered};
pub use locator::{ElementRef, MENU_BUTTON, MENU_DROPDOWN, Role, Scope, resolve, resolve_all};
pub use overlay::{
    ATTR_OVERLAY, ATTR_OVERLAY_CLIPPED, ATTR_OVERLAY_CLIPPED_LEVEL, ATTR_OVERLAY_LEVEL,
    ClipGeometry, ClipRecord, ClipTarget, ClippedConfig, OverlayMode, ParseOverlayError,
};
pub use runtime::{ATTR_CONTAINER, Content, Platform, RenderCx, Runtime};
pub use stack::{
    DismissStack, OVERLAY_Z_BASE, Removal, StackEntry, StackTransition, container_z_index,
    overlay_z_index,
};
pub use types::{Handler, InstanceId, ListenerKey, TimerKey, TimerSlot};
