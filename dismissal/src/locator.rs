// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focusable-element locator: resolve loosely-typed element references.
//!
//! Options such as the trigger, the panel, close buttons and focus targets
//! accept several shapes. [`ElementRef`] is the tagged union of those shapes
//! and [`resolve`]/[`resolve_all`] turn one into concrete elements for a given
//! [`Role`]. Resolution never fails loudly: anything that cannot be resolved
//! yields `None` and the dependent feature is skipped.
//!
//! Scope rules:
//! - [`Role::MenuButton`] and [`Role::Focus`] selectors query the whole document.
//! - [`Role::MenuDropdown`] and [`Role::CloseButton`] selectors query the
//!   instance container, and resolve to nothing while it is not rendered.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use dismissal_dom::{DocumentView, ElementId};
use smallvec::SmallVec;

/// Sentinel string that refers to the instance trigger.
pub const MENU_BUTTON: &str = "menuButton";
/// Sentinel string that refers to the instance panel.
pub const MENU_DROPDOWN: &str = "menuDropdown";

/// A reference to one or more elements.
#[derive(Clone)]
pub enum ElementRef {
    /// The instance trigger.
    MenuButton,
    /// The instance panel.
    MenuDropdown,
    /// A CSS selector, scoped by [`Role`].
    Selector(String),
    /// A concrete element handle.
    Element(ElementId),
    /// Computed on every resolution; the result is resolved with the same role.
    Producer(Rc<dyn Fn(&dyn DocumentView) -> ElementRef>),
    /// Several references (close buttons).
    List(Vec<ElementRef>),
    /// A focus target with scroll preference.
    Keyed {
        /// The element reference.
        el: Box<ElementRef>,
        /// Focus without scrolling the target into view.
        prevent_scroll: bool,
    },
}

impl ElementRef {
    /// Wrap a closure as a [`ElementRef::Producer`].
    pub fn producer(f: impl Fn(&dyn DocumentView) -> Self + 'static) -> Self {
        Self::Producer(Rc::new(f))
    }

    /// Build a [`ElementRef::List`].
    pub fn list<I, R>(items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`ElementRef::Keyed`] focus target.
    pub fn keyed(el: impl Into<Self>, prevent_scroll: bool) -> Self {
        Self::Keyed {
            el: Box::new(el.into()),
            prevent_scroll,
        }
    }

    /// Whether focusing this target should avoid scrolling.
    pub fn prevent_scroll(&self) -> bool {
        matches!(
            self,
            Self::Keyed {
                prevent_scroll: true,
                ..
            }
        )
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MenuButton => f.write_str("MenuButton"),
            Self::MenuDropdown => f.write_str("MenuDropdown"),
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Element(id) => f.debug_tuple("Element").field(id).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Keyed { el, prevent_scroll } => f
                .debug_struct("Keyed")
                .field("el", el)
                .field("prevent_scroll", prevent_scroll)
                .finish(),
        }
    }
}

impl From<&str> for ElementRef {
    fn from(s: &str) -> Self {
        match s {
            MENU_BUTTON => Self::MenuButton,
            MENU_DROPDOWN => Self::MenuDropdown,
            _ => Self::Selector(s.into()),
        }
    }
}

impl From<String> for ElementRef {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ElementId> for ElementRef {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

/// What a reference is being resolved for. Decides selector scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The trigger, looked up once at mount.
    MenuButton,
    /// The panel, looked up on every open.
    MenuDropdown,
    /// Close buttons, looked up on every open.
    CloseButton,
    /// Focus-on-active / focus-on-leave targets.
    Focus,
}

/// The instance elements a reference may point at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    /// Resolved trigger.
    pub menu_button: Option<ElementId>,
    /// Resolved panel (only while open).
    pub menu_dropdown: Option<ElementId>,
    /// Rendered container (only while open).
    pub container: Option<ElementId>,
}

/// Resolve `reference` to a single element.
///
/// An absent reference resolves to the panel (or the container) for
/// [`Role::MenuDropdown`] and to nothing for every other role. Lists yield
/// their first resolvable entry.
pub fn resolve(
    doc: &dyn DocumentView,
    reference: Option<&ElementRef>,
    role: Role,
    scope: &Scope,
) -> Option<ElementId> {
    let Some(reference) = reference else {
        return match role {
            Role::MenuDropdown => scope.menu_dropdown.or(scope.container),
            _ => None,
        };
    };
    match reference {
        ElementRef::MenuButton => scope.menu_button.filter(|&el| doc.is_alive(el)),
        ElementRef::MenuDropdown => scope.menu_dropdown.filter(|&el| doc.is_alive(el)),
        ElementRef::Selector(selector) => query(doc, selector, role, scope),
        ElementRef::Element(el) => doc.is_alive(*el).then_some(*el),
        ElementRef::Producer(f) => resolve(doc, Some(&f(doc)), role, scope),
        ElementRef::List(items) => items
            .iter()
            .find_map(|item| resolve(doc, Some(item), role, scope)),
        ElementRef::Keyed { el, .. } => resolve(doc, Some(el), role, scope),
    }
}

/// Resolve `reference` element-wise, without duplicates, in list order.
pub fn resolve_all(
    doc: &dyn DocumentView,
    reference: Option<&ElementRef>,
    role: Role,
    scope: &Scope,
) -> SmallVec<[ElementId; 2]> {
    let mut out = SmallVec::new();
    collect(doc, reference, role, scope, &mut out);
    out
}

fn collect(
    doc: &dyn DocumentView,
    reference: Option<&ElementRef>,
    role: Role,
    scope: &Scope,
    out: &mut SmallVec<[ElementId; 2]>,
) {
    match reference {
        Some(ElementRef::List(items)) => {
            for item in items {
                collect(doc, Some(item), role, scope, out);
            }
        }
        Some(ElementRef::Producer(f)) => collect(doc, Some(&f(doc)), role, scope, out),
        _ => {
            if let Some(el) = resolve(doc, reference, role, scope)
                && !out.contains(&el)
            {
                out.push(el);
            }
        }
    }
}

fn query(doc: &dyn DocumentView, selector: &str, role: Role, scope: &Scope) -> Option<ElementId> {
    let within = match role {
        Role::MenuButton | Role::Focus => None,
        Role::MenuDropdown | Role::CloseButton => Some(scope.container?),
    };
    match doc.query_selector(within, selector) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(selector, %err, "ignoring invalid selector");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dismissal_dom::Document;

    struct Fixture {
        doc: Document,
        trigger: ElementId,
        container: ElementId,
        panel: ElementId,
        close: ElementId,
        outside_close: ElementId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let body = doc.body();
        let trigger = doc.build("button").id("menu-btn").append_to(body);
        let outside_close = doc.build("button").class("close").append_to(body);
        let container = doc.build("div").append_to(body);
        let panel = doc.build("ul").class("panel").append_to(container);
        let close = doc.build("button").class("close").append_to(panel);
        Fixture {
            doc,
            trigger,
            container,
            panel,
            close,
            outside_close,
        }
    }

    fn scope(f: &Fixture) -> Scope {
        Scope {
            menu_button: Some(f.trigger),
            menu_dropdown: Some(f.panel),
            container: Some(f.container),
        }
    }

    #[test]
    fn all_reference_shapes_agree_with_direct_query() {
        let f = fixture();
        let s = scope(&f);
        let direct = f.doc.query_selector(None, "#menu-btn").unwrap();
        let shapes = [
            ElementRef::from("#menu-btn"),
            ElementRef::from(f.trigger),
            ElementRef::producer(|_| "#menu-btn".into()),
            ElementRef::producer(move |doc: &dyn DocumentView| {
                doc.query_selector(None, "#menu-btn").unwrap().unwrap().into()
            }),
            ElementRef::MenuButton,
        ];
        for shape in &shapes {
            assert_eq!(
                resolve(&f.doc, Some(shape), Role::MenuButton, &s),
                direct,
                "{shape:?}"
            );
        }
    }

    #[test]
    fn sentinel_strings_parse() {
        assert!(matches!(ElementRef::from("menuButton"), ElementRef::MenuButton));
        assert!(matches!(ElementRef::from("menuDropdown"), ElementRef::MenuDropdown));
        assert!(matches!(ElementRef::from(".x"), ElementRef::Selector(_)));
    }

    #[test]
    fn close_buttons_are_scoped_to_container() {
        let f = fixture();
        let s = scope(&f);
        let r = ElementRef::from(".close");
        assert_eq!(resolve(&f.doc, Some(&r), Role::CloseButton, &s), Some(f.close));
        assert_eq!(
            resolve(&f.doc, Some(&r), Role::Focus, &s),
            Some(f.outside_close),
            "focus targets search the whole document"
        );

        let closed = Scope {
            container: None,
            ..s
        };
        assert_eq!(resolve(&f.doc, Some(&r), Role::CloseButton, &closed), None);
    }

    #[test]
    fn absent_dropdown_defaults_to_container() {
        let f = fixture();
        let s = Scope {
            menu_dropdown: None,
            ..scope(&f)
        };
        assert_eq!(resolve(&f.doc, None, Role::MenuDropdown, &s), Some(f.container));
        assert_eq!(resolve(&f.doc, None, Role::Focus, &s), None);
    }

    #[test]
    fn lists_resolve_element_wise() {
        let f = fixture();
        let s = scope(&f);
        let r = ElementRef::list([
            ElementRef::from(".missing"),
            ElementRef::from(".close"),
            ElementRef::from(f.close),
            ElementRef::from("ul"),
        ]);
        assert_eq!(resolve(&f.doc, Some(&r), Role::CloseButton, &s), Some(f.close));
        let all = resolve_all(&f.doc, Some(&r), Role::CloseButton, &s);
        assert_eq!(all.as_slice(), &[f.close, f.panel], "deduplicated, in order");

        let produced = ElementRef::producer(|_| ElementRef::list([".close", "ul"]));
        let all = resolve_all(&f.doc, Some(&produced), Role::CloseButton, &s);
        assert_eq!(all.as_slice(), &[f.close, f.panel]);
    }

    #[test]
    fn failures_resolve_to_nothing() {
        let mut f = fixture();
        let s = scope(&f);
        let bad = ElementRef::from("[unterminated");
        assert_eq!(resolve(&f.doc, Some(&bad), Role::Focus, &s), None);

        let stale = f.close;
        f.doc.remove(stale);
        assert_eq!(resolve(&f.doc, Some(&ElementRef::from(stale)), Role::Focus, &s), None);
    }

    #[test]
    fn keyed_targets_unwrap() {
        let f = fixture();
        let s = scope(&f);
        let r = ElementRef::keyed("menuButton", true);
        assert!(r.prevent_scroll());
        assert_eq!(resolve(&f.doc, Some(&r), Role::Focus, &s), Some(f.trigger));
        assert!(!ElementRef::MenuButton.prevent_scroll());
    }
}
