// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end interaction scenarios driven through the runtime.

use dismissal::{
    ATTR_OVERLAY, ATTR_OVERLAY_CLIPPED, ATTR_OVERLAY_LEVEL, ClipTarget, ClippedConfig,
    DismissConfig, ElementRef, Handler, InstanceId, ListenerKey, OverlayMode, PendingTimers,
    Platform, Runtime,
};
use dismissal_dom::{ElementId, EventKind, EventTarget};
use kurbo::{Point, Rect};

fn find(rt: &Runtime, selector: &str) -> ElementId {
    rt.document()
        .query_selector(None, selector)
        .unwrap()
        .unwrap_or_else(|| panic!("no element matches {selector}"))
}

fn assert_listener_ledger(rt: &Runtime) {
    let stats = rt.listener_stats();
    assert_eq!(
        stats.added - stats.removed - stats.purged,
        rt.listeners().len() as u64,
        "every listener added is either live or accounted for"
    );
}

#[test]
fn nested_escape_closes_innermost_first() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let a_btn = doc.build("button").id("a-btn").append_to(body);

    let a = rt.mount(body, DismissConfig::new("#a-btn"), |cx, container| {
        let panel = cx.build("ul").class("a-panel").append_to(container);
        cx.build("button").id("b-btn").append_to(panel);
        cx.mount(panel, DismissConfig::new("#b-btn"), |cx, container| {
            cx.build("button").class("b-item").append_to(container);
        });
    });
    rt.click(a_btn);
    assert!(rt.is_open(a));

    let b_btn = find(&rt, "#b-btn");
    let b = rt.instance_of(b_btn).expect("nested instance mounts with its parent");
    rt.click(b_btn);
    assert!(rt.is_open(a) && rt.is_open(b));
    assert_eq!(rt.stack().len(), 2);
    assert_eq!(rt.stack().top().map(|e| e.id), Some(b));

    rt.escape();
    assert!(!rt.is_open(b));
    assert!(rt.is_open(a), "escape only closes the top of the stack");
    assert_eq!(rt.active_element(), Some(b_btn));
    assert_eq!(rt.stack().len(), 1);
    assert!(rt.escape_listener_installed());

    rt.escape();
    rt.tick();
    assert!(!rt.is_open(a));
    assert_eq!(rt.active_element(), Some(a_btn));
    assert!(rt.stack().is_empty());
    assert!(!rt.escape_listener_installed());
    assert!(rt.instance(b).is_none(), "nested instance goes away with its parent content");
    assert_listener_ledger(&rt);

    // Reopening the parent brings the nested menu back.
    rt.click(a_btn);
    assert!(rt.is_open(a));
    let b_btn = find(&rt, "#b-btn");
    let b = rt.instance_of(b_btn).expect("nested instance mounts again on reopen");
    rt.click(b_btn);
    assert!(rt.is_open(a) && rt.is_open(b));
    assert_eq!(rt.stack().top().map(|e| e.id), Some(b));
    assert!(rt.document().query_selector(None, ".b-item").unwrap().is_some());
}

#[test]
fn escape_is_ignored_when_top_disables_it() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let id = rt.mount(body, DismissConfig::new("#t").with_escape_key(false), |cx, c| {
        cx.build("button").append_to(c);
    });
    rt.click(trigger);
    rt.escape();
    assert!(rt.is_open(id));
}

#[test]
fn block_overlay_swallows_page_clicks() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc
        .build("button")
        .id("open")
        .layout(Rect::new(10.0, 10.0, 60.0, 30.0))
        .append_to(body);
    let behind = doc
        .build("button")
        .class("behind")
        .layout(Rect::new(100.0, 100.0, 200.0, 140.0))
        .append_to(body);

    let id = rt.mount(
        body,
        DismissConfig::new("#open").with_overlay(OverlayMode::Block),
        |cx, container| {
            let panel = cx
                .build("ul")
                .class("panel")
                .layout(Rect::new(300.0, 300.0, 500.0, 500.0))
                .append_to(container);
            cx.build("button")
                .class("item")
                .layout(Rect::new(310.0, 310.0, 400.0, 340.0))
                .append_to(panel);
        },
    );
    rt.click(trigger);
    assert!(rt.is_open(id));

    let overlay = rt.instance(id).unwrap().overlay().unwrap();
    let container = rt.instance(id).unwrap().container().unwrap();
    let doc = rt.document();
    assert_eq!(doc.attribute(overlay, ATTR_OVERLAY), Some(""));
    assert_eq!(doc.attribute(overlay, ATTR_OVERLAY_LEVEL), Some("0"));
    assert_eq!(doc.style(overlay, "z-index"), Some("999"));
    assert_eq!(doc.style(container, "z-index"), Some("1000"));
    assert_eq!(doc.parent_of(overlay), Some(doc.body()));
    assert_eq!(doc.style(overlay, "background"), None, "the overlay itself is transparent");
    assert_eq!(doc.style(overlay, "background-color"), None);

    let item = find(&rt, ".item");
    assert_eq!(rt.click_at(Point::new(350.0, 320.0)), Some(item));
    assert!(rt.is_open(id), "clicks in the panel sit above the overlay");

    assert_eq!(rt.click_at(Point::new(150.0, 120.0)), Some(overlay));
    assert!(!rt.is_open(id));
    assert_ne!(rt.active_element(), Some(behind));
    assert!(!rt.document().is_alive(overlay));
    assert_eq!(rt.outside_listener_count(id), 0);
}

#[test]
fn focus_on_leave_returns_to_trigger() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t")
            .with_close_button(".close")
            .with_focus_on_leave("menuButton"),
        |cx, c| {
            cx.build("button").class("close").append_to(c);
        },
    );
    rt.click(trigger);
    let close = find(&rt, ".close");
    rt.click(close);
    assert!(!rt.is_open(id));
    assert_eq!(rt.active_element(), Some(trigger));
    rt.tick();
    assert!(!rt.is_open(id));
}

#[test]
fn aria_expanded_follows_open_state() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").class("toggle").append_to(body);
    let quiet_trigger = doc.build("button").class("quiet").append_to(body);

    let id = rt.mount(body, DismissConfig::new(".toggle"), |_, _| {});
    let quiet = rt.mount(
        body,
        DismissConfig::new(".quiet").with_aria_expanded(false),
        |_, _| {},
    );

    let doc = rt.document();
    assert_eq!(doc.attribute(trigger, "id"), Some("dismiss-menu-button-1"));
    assert_eq!(doc.attribute(trigger, "aria-expanded"), Some("false"));

    rt.set_open(id, true);
    let container = rt.instance(id).unwrap().container().unwrap();
    let doc = rt.document();
    assert_eq!(doc.attribute(trigger, "aria-expanded"), Some("true"));
    assert_eq!(
        doc.attribute(container, "aria-labelledby"),
        Some("dismiss-menu-button-1"),
        "the container doubles as the panel"
    );

    rt.set_open(id, false);
    assert_eq!(rt.document().attribute(trigger, "aria-expanded"), Some("false"));

    rt.set_open(quiet, true);
    assert!(rt.is_open(quiet));
    assert_eq!(rt.document().attribute(quiet_trigger, "aria-expanded"), None);
}

#[test]
fn safari_fallback_listeners_do_not_accumulate() {
    let mut rt = Runtime::with_platform(Platform::SAFARI_IOS);
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let outside = doc.build("div").class("outside").append_to(body);
    let id = rt.mount(body, DismissConfig::new("#t"), |cx, c| {
        cx.build("input").class("search").append_to(c);
    });

    let doc_clicks = |rt: &Runtime| rt.listeners().count(EventTarget::Document, EventKind::Click);
    let doc_focusins =
        |rt: &Runtime| rt.listeners().count(EventTarget::Document, EventKind::FocusIn);

    for cycle in 0..3 {
        rt.click(trigger);
        assert!(rt.is_open(id), "cycle {cycle}: trigger opens");
        assert_eq!(rt.active_element(), Some(trigger), "programmatic focus still works");
        assert_eq!(rt.outside_listener_count(id), 0);

        let search = find(&rt, ".search");
        rt.focus(search);
        assert_eq!(rt.instance(id).unwrap().outside_click(), Some(true));
        assert_eq!(doc_clicks(&rt), 1);

        rt.click(search);
        assert!(rt.is_open(id), "cycle {cycle}: click inside keeps it open");
        assert_eq!(rt.instance(id).unwrap().outside_click(), None);
        assert_eq!(doc_clicks(&rt), 0);

        rt.click(outside);
        assert!(!rt.is_open(id), "cycle {cycle}: click outside closes");
        assert!(doc_clicks(&rt) <= 1 && doc_focusins(&rt) <= 1);
        assert_eq!(rt.outside_listener_count(id), 0);
        assert_listener_ledger(&rt);
    }
}

#[test]
fn trigger_blur_and_container_focusout_share_one_click_listener() {
    let mut rt = Runtime::with_platform(Platform::SAFARI_IOS);
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let outside = doc.build("div").class("outside").append_to(body);
    let id = rt.mount(body, DismissConfig::new("#t"), |cx, c| {
        cx.build("input").class("search").append_to(c);
    });

    rt.click(trigger);
    let search = find(&rt, ".search");
    rt.focus(search);
    rt.blur();
    assert!(rt.is_open(id));
    let clicks = rt.listeners().snapshot(EventTarget::Document, EventKind::Click);
    assert_eq!(clicks.len(), 1, "{clicks:?}");
    assert!(clicks[0].once, "the trigger blur registered it first");
    assert_eq!(rt.listeners().count(EventTarget::Document, EventKind::FocusIn), 1);
    assert!(rt.instance(id).unwrap().has_outside_fallback());

    rt.click(outside);
    assert!(!rt.is_open(id));
    assert_eq!(rt.outside_listener_count(id), 0);
    assert_eq!(rt.listeners().count(EventTarget::Document, EventKind::Click), 0);
    assert_listener_ledger(&rt);
}

#[test]
fn trap_focus_keeps_tab_inside() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    doc.build("input").class("after").append_to(body);
    let id = rt.mount(body, DismissConfig::new("#t").with_trap_focus(true), |cx, c| {
        cx.build("button").class("one").append_to(c);
        cx.build("button").class("two").append_to(c);
    });
    rt.click(trigger);
    let rendered = *rt.instance(id).unwrap().rendered().unwrap();
    let (first, last) = rendered.sentinels.unwrap();
    let one = find(&rt, ".one");
    let two = find(&rt, ".two");

    rt.tab();
    assert_eq!(rt.active_element(), Some(one), "tab from the trigger enters the panel");

    let mut seen = Vec::new();
    for _ in 0..5 {
        rt.tab();
        rt.tick();
        let active = rt.active_element().unwrap();
        assert!(rt.document().contains(rendered.container, active));
        assert!(active != first && active != last);
        assert!(rt.is_open(id));
        seen.push(active);
    }
    assert_eq!(seen, vec![two, one, two, one, two]);

    for _ in 0..3 {
        rt.shift_tab();
        rt.tick();
        assert!(rt.is_open(id));
    }
    assert_eq!(rt.active_element(), Some(one));
    rt.shift_tab();
    assert_eq!(rt.active_element(), Some(two), "shift-tab wraps to the end");
}

#[test]
fn trigger_only_opens_when_click_close_disabled() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t").with_close_when_menu_button_is_clicked(false),
        |_, _| {},
    );
    for _ in 0..3 {
        rt.click(trigger);
        rt.tick();
        assert!(rt.is_open(id));
    }
    assert_eq!(rt.stack().len(), 1);
}

#[test]
fn stack_tracks_open_instances() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let triggers: Vec<_> = (0..3)
        .map(|i| doc.build("button").id(&format!("t{i}")).append_to(body))
        .collect();
    let ids: Vec<_> = (0..3)
        .map(|i| {
            rt.mount(body, DismissConfig::new(format!("#t{i}")), |cx, c| {
                cx.build("button").append_to(c);
            })
        })
        .collect();

    let check = |rt: &Runtime| assert_eq!(rt.stack().len(), rt.open_count());

    rt.click(triggers[0]);
    check(&rt);
    rt.click(triggers[1]);
    check(&rt);
    rt.tick();
    check(&rt);
    assert!(!rt.is_open(ids[0]), "focus moved to another trigger");
    rt.set_open(ids[2], true);
    rt.set_open(ids[0], true);
    check(&rt);
    assert_eq!(rt.stack().len(), 3);
    rt.set_open(ids[2], false);
    check(&rt);
    rt.unmount(ids[1]);
    check(&rt);
    assert_eq!(rt.stack().len(), 1);
}

#[test]
fn trigger_click_cancels_pending_close() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let outside = doc.build("input").append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t")
            .with_close_when_menu_button_is_clicked(false)
            .with_close_when_menu_button_is_tabbed(true),
        |cx, c| {
            cx.build("button").class("item").append_to(c);
        },
    );
    rt.click(trigger);
    let item = find(&rt, ".item");
    rt.focus(item);
    rt.focus(outside);
    assert!(
        rt.instance(id)
            .unwrap()
            .pending()
            .contains(PendingTimers::CONTAINER_FOCUS_OUT)
    );

    rt.click(trigger);
    assert!(rt.instance(id).unwrap().pending().is_empty());
    rt.tick();
    assert!(rt.is_open(id));
}

#[test]
fn close_button_wins_over_deferred_blur() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t").with_close_button(".close"),
        |cx, c| {
            cx.build("button").class("item").append_to(c);
            cx.build("button").class("close").append_to(c);
        },
    );
    rt.click(trigger);
    rt.click(find(&rt, ".item"));
    rt.click(find(&rt, ".close"));
    assert!(!rt.is_open(id));
    rt.tick();
    assert!(!rt.is_open(id));

    rt.click(trigger);
    rt.tick();
    assert!(rt.is_open(id), "no stale close survives a reopen");
}

#[test]
fn clipped_overlay_cuts_holes_and_debounces_redraws() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc
        .build("button")
        .id("t")
        .layout(Rect::new(10.0, 10.0, 60.0, 30.0))
        .append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t")
            .with_menu_dropdown(".panel")
            .with_overlay("clipped".parse().unwrap()),
        |cx, c| {
            let panel = cx
                .build("ul")
                .class("panel")
                .layout(Rect::new(10.0, 40.0, 210.0, 240.0))
                .append_to(c);
            cx.build("button")
                .class("item")
                .layout(Rect::new(20.0, 50.0, 200.0, 80.0))
                .append_to(panel);
        },
    );
    rt.click(trigger);
    let overlay = rt.instance(id).unwrap().overlay().unwrap();
    assert_eq!(rt.document().attribute(overlay, ATTR_OVERLAY_CLIPPED), Some(""));
    let clip = rt.clip(id).unwrap();
    assert_eq!(clip.redraws, 1);
    assert_eq!(clip.geometry.as_ref().unwrap().holes.len(), 2);
    assert!(
        rt.document()
            .style(overlay, "clip-path")
            .unwrap()
            .starts_with("path(evenodd")
    );

    let item = find(&rt, ".item");
    assert_eq!(rt.click_at(Point::new(30.0, 60.0)), Some(item));
    assert!(rt.is_open(id));

    let panel = find(&rt, ".panel");
    rt.scroll(body);
    rt.resize(Rect::new(0.0, 0.0, 1024.0, 768.0));
    rt.mutate(panel);
    rt.advance(74);
    assert_eq!(rt.clip(id).unwrap().redraws, 1, "burst still settling");
    rt.advance(1);
    let clip = rt.clip(id).unwrap();
    assert_eq!(clip.redraws, 2, "burst coalesced into one redraw");
    assert_eq!(
        clip.geometry.as_ref().unwrap().viewport,
        Rect::new(0.0, 0.0, 1024.0, 768.0)
    );

    rt.mutate(panel);
    rt.redraw_clipped(id);
    assert_eq!(rt.clip(id).unwrap().redraws, 3);
    rt.advance(200);
    assert_eq!(rt.clip(id).unwrap().redraws, 3, "forced redraw consumed the pending one");

    assert_eq!(rt.click_at(Point::new(600.0, 600.0)), Some(overlay));
    assert!(!rt.is_open(id));
    assert!(rt.clip(id).is_none());
    let key = ListenerKey::Instance(id, Handler::ClipRedraw);
    assert_eq!(rt.listeners().count_where(|r| r.handler == key), 0);
    assert_listener_ledger(&rt);
}

#[test]
fn focus_within_is_reported_to_the_host() {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let outside = doc.build("input").append_to(body);
    let id = rt.mount(body, DismissConfig::new("#t"), |cx, c| {
        cx.build("button").class("item").append_to(c);
    });
    assert_eq!(rt.focus_within(id), None);

    rt.click(trigger);
    assert_eq!(rt.focus_within(id), Some(true));
    rt.focus(find(&rt, ".item"));
    assert_eq!(rt.focus_within(id), Some(true));

    rt.focus(outside);
    assert_eq!(rt.focus_within(id), Some(true), "the close is deferred");
    rt.tick();
    assert!(!rt.is_open(id));
    assert_eq!(rt.focus_within(id), Some(false));
}

fn shift_tab_back_to_trigger(close_when_tabbed: bool) -> bool {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let trigger = doc.build("button").id("t").append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t").with_close_when_menu_button_is_tabbed(close_when_tabbed),
        |cx, c| {
            cx.build("button").class("first").append_to(c);
            cx.build("button").class("second").append_to(c);
        },
    );
    rt.click(trigger);
    rt.tab();
    assert_eq!(rt.active_element(), Some(find(&rt, ".first")));
    rt.shift_tab();
    assert_eq!(rt.active_element(), Some(trigger));
    assert!(rt.is_open(id), "the close waits for the next task");
    rt.tick();
    rt.is_open(id)
}

#[test]
fn shift_tab_onto_trigger_closes_only_when_configured() {
    assert!(!shift_tab_back_to_trigger(true));
    assert!(shift_tab_back_to_trigger(false));
}

fn clipped_page(clipped: ClippedConfig) -> (Runtime, InstanceId) {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    doc.build("button")
        .id("t")
        .layout(Rect::new(10.0, 10.0, 60.0, 30.0))
        .append_to(body);
    doc.build("div")
        .class("hint")
        .layout(Rect::new(300.0, 10.0, 400.0, 60.0))
        .append_to(body);
    let id = rt.mount(
        body,
        DismissConfig::new("#t")
            .with_menu_dropdown(".panel")
            .with_overlay(OverlayMode::Clipped(clipped)),
        |cx, c| {
            let panel = cx
                .build("ul")
                .class("panel")
                .layout(Rect::new(10.0, 40.0, 210.0, 240.0))
                .append_to(c);
            cx.build("li")
                .class("entry")
                .layout(Rect::new(20.0, 50.0, 200.0, 80.0))
                .append_to(panel);
        },
    );
    rt.set_open(id, true);
    (rt, id)
}

#[test]
fn clip_redraws_after_animation_and_transition_end() {
    let (mut rt, id) = clipped_page(ClippedConfig::default());
    let panel = find(&rt, ".panel");
    let container = rt.instance(id).unwrap().container().unwrap();
    let hint = find(&rt, ".hint");
    assert_eq!(rt.clip(id).unwrap().redraws, 1);

    rt.animation_end(find(&rt, ".entry"));
    rt.advance(75);
    assert_eq!(rt.clip(id).unwrap().redraws, 2, "bubbled up to the panel");

    rt.transition_end(container);
    rt.animation_end(panel);
    rt.advance(75);
    assert_eq!(rt.clip(id).unwrap().redraws, 3, "coalesced");

    rt.animation_end(hint);
    rt.transition_end(hint);
    rt.advance(200);
    assert_eq!(rt.clip(id).unwrap().redraws, 3, "unrelated elements are ignored");
}

#[test]
fn clip_target_override_moves_the_hole() {
    let (mut rt, id) = clipped_page(ClippedConfig {
        menu_button: ClipTarget {
            el: Some(".hint".into()),
            clip_path: None,
        },
        menu_dropdown: ClipTarget::default(),
    });
    let trigger = find(&rt, "#t");
    let hint = find(&rt, ".hint");
    let panel = find(&rt, ".panel");
    let clip = rt.clip(id).unwrap();
    let overlay = clip.overlay;
    assert_eq!(clip.targets.as_slice(), &[hint, panel]);
    assert_eq!(
        clip.geometry.as_ref().unwrap().holes.as_slice(),
        &[Rect::new(300.0, 10.0, 400.0, 60.0), Rect::new(10.0, 40.0, 210.0, 240.0)]
    );

    rt.mutate(trigger);
    rt.advance(75);
    assert_eq!(rt.clip(id).unwrap().redraws, 1, "the trigger is no longer measured");
    rt.mutate(hint);
    rt.advance(75);
    assert_eq!(rt.clip(id).unwrap().redraws, 2);

    assert_eq!(rt.click_at(Point::new(350.0, 30.0)), Some(hint));
    assert!(rt.is_open(id));
    assert_eq!(rt.click_at(Point::new(20.0, 20.0)), Some(overlay), "trigger sits under the overlay");
    assert!(!rt.is_open(id));
    assert!(rt.clip(id).is_none());
    assert!(!rt.document().is_alive(overlay));
}

#[test]
fn literal_clip_path_is_written_verbatim() {
    let (mut rt, id) = clipped_page(ClippedConfig {
        menu_button: ClipTarget::default(),
        menu_dropdown: ClipTarget {
            el: None,
            clip_path: Some("inset(10px 20px)".into()),
        },
    });
    let overlay = rt.clip(id).unwrap().overlay;
    assert_eq!(rt.document().style(overlay, "clip-path"), Some("inset(10px 20px)"));
    assert_eq!(rt.document().cutouts(overlay).len(), 2, "hit-testing still honours the holes");

    rt.resize(Rect::new(0.0, 0.0, 1024.0, 768.0));
    rt.advance(75);
    assert_eq!(rt.clip(id).unwrap().redraws, 2);
    assert_eq!(rt.document().style(overlay, "clip-path"), Some("inset(10px 20px)"));
}

/// Opens a clipped menu whose focus-on-activate target sits below the fold
/// of a scroll container, and returns the settled redraw count.
fn redraws_after_focusing_offscreen(prevent_scroll: bool) -> u32 {
    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let scroller = doc
        .build("div")
        .style("overflow-y", "auto")
        .layout(Rect::new(0.0, 0.0, 300.0, 200.0))
        .append_to(body);
    doc.build("button")
        .id("t")
        .layout(Rect::new(10.0, 10.0, 60.0, 30.0))
        .append_to(scroller);
    let far = doc
        .build("input")
        .id("far")
        .layout(Rect::new(10.0, 500.0, 200.0, 530.0))
        .append_to(scroller);
    let id = rt.mount(
        body,
        DismissConfig::new("#t")
            .with_overlay(OverlayMode::Clipped(ClippedConfig::default()))
            .with_focus_on_active(ElementRef::keyed("#far", prevent_scroll)),
        |cx, c| {
            cx.build("div")
                .class("panel")
                .layout(Rect::new(10.0, 40.0, 210.0, 140.0))
                .append_to(c);
        },
    );
    rt.set_open(id, true);
    assert_eq!(rt.active_element(), Some(far));
    rt.advance(75);
    rt.clip(id).unwrap().redraws
}

#[test]
fn focus_targets_honour_prevent_scroll() {
    assert_eq!(redraws_after_focusing_offscreen(false), 2, "focus scrolled the container");
    assert_eq!(redraws_after_focusing_offscreen(true), 1);
}
