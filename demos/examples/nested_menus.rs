// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A settings menu with a nested submenu, a modal with a blocking overlay and
//! a tour step with a clipped overlay, driven by simulated input.
//!
//! Run:
//! - `cargo run -p dismissal_demos --example nested_menus`
//! - `RUST_LOG=dismissal=trace cargo run -p dismissal_demos --example nested_menus`

use dismissal::{DismissConfig, ElementRef, OverlayMode, RenderCx, Runtime};
use dismissal_dom::ElementId;
use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;

fn settings_panel(cx: &mut RenderCx<'_>, container: ElementId) -> ElementId {
    let panel = cx
        .build("ul")
        .class("settings")
        .layout(Rect::new(20.0, 60.0, 220.0, 260.0))
        .append_to(container);
    cx.build("button")
        .id("theme-btn")
        .layout(Rect::new(30.0, 70.0, 210.0, 100.0))
        .append_to(panel);
    cx.build("button")
        .class("done")
        .layout(Rect::new(30.0, 110.0, 210.0, 140.0))
        .append_to(panel);
    panel
}

/// Settings with the theme submenu nested inside; the submenu is declared
/// again every time settings opens.
fn settings_menu(cx: &mut RenderCx<'_>, container: ElementId) {
    let panel = settings_panel(cx, container);
    cx.mount(panel, DismissConfig::new("#theme-btn"), theme_menu);
}

/// The settings panel alone, for the tour step.
fn tour_step(cx: &mut RenderCx<'_>, container: ElementId) {
    settings_panel(cx, container);
}

fn theme_menu(cx: &mut RenderCx<'_>, container: ElementId) {
    for theme in ["light", "dark", "system"] {
        cx.build("button").class(theme).append_to(container);
    }
}

fn dialog(cx: &mut RenderCx<'_>, container: ElementId) {
    let form = cx
        .build("form")
        .layout(Rect::new(400.0, 200.0, 800.0, 500.0))
        .append_to(container);
    cx.build("input").class("name").append_to(form);
    cx.build("button").class("cancel").append_to(form);
}

fn report(rt: &Runtime, label: &str) {
    let open: Vec<_> = rt.stack().iter().map(|e| e.id.to_string()).collect();
    tracing::info!(
        now = rt.now(),
        active = ?rt.active_element(),
        stack = ?open,
        "{label}"
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rt = Runtime::new();
    let doc = rt.document_mut();
    let body = doc.body();
    let settings_btn = doc
        .build("button")
        .id("settings-btn")
        .layout(Rect::new(20.0, 20.0, 120.0, 50.0))
        .append_to(body);
    let dialog_btn = doc
        .build("button")
        .id("dialog-btn")
        .layout(Rect::new(140.0, 20.0, 240.0, 50.0))
        .append_to(body);
    let search = doc
        .build("input")
        .class("search")
        .layout(Rect::new(260.0, 20.0, 560.0, 50.0))
        .append_to(body);

    let settings = rt.mount(
        body,
        DismissConfig::new("#settings-btn")
            .with_menu_dropdown(".settings")
            .with_close_button(".done")
            .with_focus_on_leave("menuButton"),
        settings_menu,
    );
    let modal = rt.mount(
        body,
        DismissConfig::new("#dialog-btn")
            .with_overlay(OverlayMode::Block)
            .with_trap_focus(true)
            .with_close_button(".cancel")
            .with_focus_on_active(ElementRef::keyed(".name", true)),
        dialog,
    );

    // Nested menus: the submenu trigger only exists while settings is open.
    for round in 0..2 {
        rt.click(settings_btn);
        let Ok(Some(theme_btn)) = rt.document().query_selector(None, "#theme-btn") else {
            tracing::error!("settings panel did not render");
            return;
        };
        let theme = rt.instance_of(theme_btn);
        rt.click(theme_btn);
        report(&rt, "settings and theme open");

        rt.escape();
        report(&rt, "escape closed the theme submenu");
        rt.escape();
        report(&rt, "escape closed settings");
        tracing::info!(
            round,
            settings = rt.is_open(settings),
            theme_mounted = theme.is_some_and(|t| rt.instance(t).is_some()),
            "after escapes"
        );
    }

    // Modal: the overlay swallows clicks on the page behind it.
    rt.click(dialog_btn);
    report(&rt, "dialog open");
    for _ in 0..4 {
        rt.tab();
    }
    report(&rt, "tabbing stays inside the dialog");
    let hit = rt.click_at(Point::new(300.0, 30.0));
    tracing::info!(?hit, search_focused = rt.active_element() == Some(search), "clicked the page");
    report(&rt, "overlay click closed the dialog");
    tracing::info!(modal = rt.is_open(modal), "modal state");

    // Tour step: a clipped overlay leaves the trigger and panel reachable.
    let tour = rt.mount(
        body,
        DismissConfig::new("#settings-btn")
            .with_menu_dropdown(".settings")
            .with_overlay("clipped".parse().unwrap_or_default()),
        tour_step,
    );
    rt.set_open(tour, true);
    if let Some(clip) = rt.clip(tour) {
        let overlay = clip.overlay;
        tracing::info!(clip_path = ?rt.document().style(overlay, "clip-path"), "tour overlay");
    }
    rt.resize(Rect::new(0.0, 0.0, 1024.0, 768.0));
    rt.advance(75);
    if let Some(clip) = rt.clip(tour) {
        tracing::info!(redraws = clip.redraws, "after resize settles");
    }
    rt.unmount(tour);
    report(&rt, "done");
}
