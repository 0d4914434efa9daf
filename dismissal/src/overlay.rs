// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay and clip controller.
//!
//! An open instance may put a full-viewport element above the page:
//!
//! - [`OverlayMode::Block`]: a transparent interceptor with no background of
//!   its own; hosts style it through [`ATTR_OVERLAY`]. Clicking it closes the
//!   owning instance; the page below never sees the click.
//! - [`OverlayMode::Clipped`]: the same interceptor with holes cut around the
//!   trigger and the panel, so those stay interactive. The holes are written
//!   as an even-odd CSS `path()` into the overlay's `clip-path` style and are
//!   registered as hit-test cut-outs.
//!
//! Clip geometry is recomputed from layout on scroll, resize, animation and
//! transition end, and trigger/panel mutation, coalesced through a
//! [`Debounce`] of [`CLIP_DEBOUNCE_MS`].

use alloc::format;
use alloc::string::String;
use core::fmt::Write as _;
use core::str::FromStr;

use dismissal_dom::{Document, DocumentView, ElementId};
use kurbo::Rect;
use smallvec::SmallVec;

use crate::locator::ElementRef;
use crate::timer::{CLIP_DEBOUNCE_MS, Debounce};
use crate::types::{InstanceId, TimerKey, TimerSlot};

/// Attribute carried by block overlays; value is the instance `id` option.
pub const ATTR_OVERLAY: &str = "dismiss-overlay";
/// Stack depth of a block overlay.
pub const ATTR_OVERLAY_LEVEL: &str = "dismiss-overlay-level";
/// Attribute carried by clipped overlays; value is the instance `id` option.
pub const ATTR_OVERLAY_CLIPPED: &str = "dismiss-overlay-clipped";
/// Stack depth of a clipped overlay.
pub const ATTR_OVERLAY_CLIPPED_LEVEL: &str = "dismiss-overlay-clipped-level";

/// How an open instance blocks the rest of the page.
#[derive(Clone, Debug, Default)]
pub enum OverlayMode {
    /// No overlay; outside clicks reach the page.
    #[default]
    None,
    /// Full-viewport interceptor.
    Block,
    /// Interceptor with holes around the trigger and the panel.
    Clipped(ClippedConfig),
}

impl OverlayMode {
    /// Whether any overlay element is rendered.
    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether this is [`OverlayMode::Block`].
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block)
    }

    /// Whether this is [`OverlayMode::Clipped`].
    pub fn is_clipped(&self) -> bool {
        matches!(self, Self::Clipped(_))
    }
}

/// Error returned when parsing an [`OverlayMode`] from a string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown overlay mode `{0}`, expected `none`, `block` or `clipped`")]
pub struct ParseOverlayError(String);

impl FromStr for OverlayMode {
    type Err = ParseOverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "block" => Ok(Self::Block),
            "clipped" => Ok(Self::Clipped(ClippedConfig::default())),
            other => Err(ParseOverlayError(other.into())),
        }
    }
}

/// Per-target clip overrides.
#[derive(Clone, Debug, Default)]
pub struct ClipTarget {
    /// Element whose box defines the hole, instead of the trigger/panel.
    pub el: Option<ElementRef>,
    /// Literal `clip-path` value written instead of the generated one.
    pub clip_path: Option<String>,
}

/// Configuration of [`OverlayMode::Clipped`].
#[derive(Clone, Debug, Default)]
pub struct ClippedConfig {
    /// Hole around the trigger.
    pub menu_button: ClipTarget,
    /// Hole around the panel.
    pub menu_dropdown: ClipTarget,
}

impl ClippedConfig {
    /// The literal clip path to use, if any. The panel's wins over the trigger's.
    pub fn literal_clip_path(&self) -> Option<&str> {
        self.menu_dropdown
            .clip_path
            .as_deref()
            .or(self.menu_button.clip_path.as_deref())
    }
}

/// Viewport minus the interactive holes.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipGeometry {
    /// Area covered by the overlay.
    pub viewport: Rect,
    /// Regions left uncovered.
    pub holes: SmallVec<[Rect; 2]>,
}

impl ClipGeometry {
    /// Measure `targets` against the viewport.
    ///
    /// Dead or unlaid-out targets contribute no hole; holes are clamped to the
    /// viewport and empty ones dropped.
    pub fn measure(doc: &dyn DocumentView, targets: &[ElementId]) -> Self {
        let viewport = doc.viewport();
        let holes = targets
            .iter()
            .filter(|&&el| doc.is_rendered(el))
            .filter_map(|&el| doc.layout(el))
            .map(|r| r.intersect(viewport))
            .filter(|r| r.area() > 0.0)
            .collect();
        Self { viewport, holes }
    }

    /// Even-odd CSS `path()` that fills the viewport except the holes.
    pub fn path(&self) -> String {
        let mut d = String::new();
        push_rect(&mut d, self.viewport);
        for hole in &self.holes {
            d.push(' ');
            push_rect(&mut d, *hole);
        }
        format!("path(evenodd, '{d}')")
    }

    /// Whether `point` falls into a hole.
    pub fn is_hole(&self, point: kurbo::Point) -> bool {
        self.holes.iter().any(|h| h.contains(point))
    }
}

fn push_rect(d: &mut String, r: Rect) {
    // Writing into a String cannot fail.
    let _ = write!(
        d,
        "M{} {} H{} V{} H{} Z",
        r.x0, r.y0, r.x1, r.y1, r.x0
    );
}

/// Live state of a clipped overlay, created on open and destroyed on close.
#[derive(Clone, Debug)]
pub struct ClipRecord {
    /// Owning instance.
    pub instance: InstanceId,
    /// The overlay element.
    pub overlay: ElementId,
    /// Elements whose boxes define the holes (trigger, panel or overrides).
    pub targets: SmallVec<[ElementId; 2]>,
    /// Literal clip path, if configured.
    pub literal: Option<String>,
    /// Last computed geometry.
    pub geometry: Option<ClipGeometry>,
    /// Pending recomputation.
    pub debounce: Debounce<TimerKey>,
    /// Completed recomputations, for instrumentation.
    pub redraws: u32,
}

impl ClipRecord {
    /// A record with no geometry yet.
    pub fn new(
        instance: InstanceId,
        overlay: ElementId,
        targets: SmallVec<[ElementId; 2]>,
        literal: Option<String>,
    ) -> Self {
        Self {
            instance,
            overlay,
            targets,
            literal,
            geometry: None,
            debounce: Debounce::new(
                TimerKey::new(instance, TimerSlot::ClipRedraw),
                CLIP_DEBOUNCE_MS,
            ),
            redraws: 0,
        }
    }

    /// Whether `el` is one of the measured targets.
    pub fn observes(&self, el: ElementId) -> bool {
        self.targets.contains(&el)
    }

    /// Recompute geometry and write it to the overlay element.
    pub fn redraw(&mut self, doc: &mut Document) {
        let geometry = ClipGeometry::measure(&*doc, &self.targets);
        let clip_path = self.literal.clone().unwrap_or_else(|| geometry.path());
        doc.set_style(self.overlay, "clip-path", &clip_path);
        doc.set_layout(self.overlay, Some(geometry.viewport));
        doc.set_cutouts(self.overlay, &geometry.holes);
        tracing::trace!(instance = %self.instance, holes = geometry.holes.len(), "clip redrawn");
        self.geometry = Some(geometry);
        self.redraws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn parses_modes() {
        assert!(matches!("none".parse::<OverlayMode>(), Ok(OverlayMode::None)));
        assert!(matches!("block".parse::<OverlayMode>(), Ok(OverlayMode::Block)));
        assert!("clipped".parse::<OverlayMode>().unwrap().is_clipped());
        let err = "opaque".parse::<OverlayMode>().unwrap_err();
        assert_eq!(err, ParseOverlayError("opaque".into()));
        assert!(format!("{err}").contains("opaque"));
    }

    #[test]
    fn geometry_path_is_even_odd_with_holes() {
        let mut doc = Document::new();
        doc.set_viewport(Rect::new(0.0, 0.0, 100.0, 50.0));
        let body = doc.body();
        let trigger = doc
            .build("button")
            .layout(Rect::new(10.0, 10.0, 30.0, 20.0))
            .append_to(body);
        let hidden = doc
            .build("div")
            .style("display", "none")
            .layout(Rect::new(0.0, 0.0, 5.0, 5.0))
            .append_to(body);
        let g = ClipGeometry::measure(&doc, &[trigger, hidden]);
        assert_eq!(g.holes.as_slice(), &[Rect::new(10.0, 10.0, 30.0, 20.0)]);
        assert_eq!(
            g.path(),
            "path(evenodd, 'M0 0 H100 V50 H0 Z M10 10 H30 V20 H10 Z')"
        );
        assert!(g.is_hole(Point::new(15.0, 15.0)));
        assert!(!g.is_hole(Point::new(50.0, 40.0)));
    }

    #[test]
    fn holes_are_clamped_to_viewport() {
        let mut doc = Document::new();
        doc.set_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        let body = doc.body();
        let panel = doc
            .build("div")
            .layout(Rect::new(80.0, 80.0, 150.0, 150.0))
            .append_to(body);
        let offscreen = doc
            .build("div")
            .layout(Rect::new(200.0, 200.0, 250.0, 250.0))
            .append_to(body);
        let g = ClipGeometry::measure(&doc, &[panel, offscreen]);
        assert_eq!(g.holes.as_slice(), &[Rect::new(80.0, 80.0, 100.0, 100.0)]);
    }

    #[test]
    fn record_redraw_writes_style_and_cutouts() {
        let mut doc = Document::new();
        let body = doc.body();
        let trigger = doc
            .build("button")
            .layout(Rect::new(0.0, 0.0, 10.0, 10.0))
            .append_to(body);
        let overlay = doc.build("div").append_to(body);
        let mut record = ClipRecord::new(
            InstanceId::new(1),
            overlay,
            SmallVec::from_slice(&[trigger]),
            None,
        );
        record.redraw(&mut doc);
        assert!(doc.style(overlay, "clip-path").unwrap().starts_with("path(evenodd"));
        assert_eq!(doc.cutouts(overlay), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(doc.hit_test(Point::new(5.0, 5.0)), Some(trigger));
        assert_eq!(doc.hit_test(Point::new(50.0, 50.0)), Some(overlay));

        record.literal = Some("inset(0)".into());
        record.redraw(&mut doc);
        assert_eq!(doc.style(overlay, "clip-path"), Some("inset(0)"));
        assert_eq!(record.redraws, 2);
    }

    #[test]
    fn literal_prefers_dropdown() {
        let cfg = ClippedConfig {
            menu_button: ClipTarget {
                el: None,
                clip_path: Some("a".into()),
            },
            menu_dropdown: ClipTarget {
                el: None,
                clip_path: Some("b".into()),
            },
        };
        assert_eq!(cfg.literal_clip_path(), Some("b"));
        assert_eq!(ClippedConfig::default().literal_clip_path(), None);
    }
}
