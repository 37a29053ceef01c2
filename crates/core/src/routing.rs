//! Leader-line routing between an annotated frame and its label.
//!
//! The label box has its origin at the user-chosen anchor point and extends
//! `label_width` to the right and `label_height` toward the frame's bottom edge.

use crate::geometry::{BoundingBox, Point};
use crate::units;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_6;

/// Fixed layout constants for routing, in document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Outline margin around the envelope.
    pub margin: f64,
    pub label_width: f64,
    pub label_height: f64,
    /// Distance between the leader endpoint and the label's side edge.
    pub endpoint_gap: f64,
    /// Length of the arrowhead's sides.
    pub arrow_size: f64,
}

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            margin: 7.0,
            label_width: units::mm_to_units(66.0),
            label_height: units::mm_to_units(42.0),
            endpoint_gap: 15.0,
            arrow_size: 8.0,
        }
    }
}

/// Frame edge the leader line leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl AnchorSide {
    pub fn is_horizontal(self) -> bool {
        matches!(self, AnchorSide::Left | AnchorSide::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Envelope grown by the margin; the outline actually drawn.
    pub frame: BoundingBox,
    pub anchor_side: AnchorSide,
    /// `[frame anchor, endpoint near the label]`
    pub leader: [Point; 2],
    /// `[tip, back vertex, back vertex]`
    pub arrowhead: [Point; 3],
    pub label_origin: Point,
}

/// Route a leader from `envelope` to a label placed at `label_anchor`.
///
/// Degenerate envelopes are routed like any other; the frame collapses to a
/// line (or a point grown by the margin).
pub fn route(envelope: &BoundingBox, label_anchor: Point, params: &RouteParams) -> Route {
    let frame = envelope.expand(params.margin);
    let center = frame.center();
    let dx = label_anchor.x - center.x;
    let dy = label_anchor.y - center.y;
    let sense = frame.vertical_sense();

    // Horizontal only when strictly dominant; ties resolve vertically.
    let anchor_side = if dx.abs() > dy.abs() {
        if dx > 0.0 {
            AnchorSide::Right
        } else {
            AnchorSide::Left
        }
    } else if dy * sense > 0.0 {
        AnchorSide::Top
    } else {
        AnchorSide::Bottom
    };

    let start = match anchor_side {
        AnchorSide::Right => frame.right_mid(),
        AnchorSide::Left => frame.left_mid(),
        AnchorSide::Top => frame.top_mid(),
        AnchorSide::Bottom => frame.bottom_mid(),
    };

    // The endpoint picks its own axis: horizontal unless vertical strictly
    // dominates, so a tie leaves the top or bottom edge with a dogleg.
    let label_mid_y = label_anchor.y - sense * params.label_height / 2.0;
    let end = if dy.abs() > dx.abs() {
        let x = label_anchor.x + params.label_width / 2.0;
        if dy * sense > 0.0 {
            Point::new(x, label_anchor.y - sense * params.label_height)
        } else {
            Point::new(x, label_anchor.y)
        }
    } else if dx > 0.0 {
        Point::new(label_anchor.x - params.endpoint_gap, label_mid_y)
    } else {
        Point::new(label_anchor.x + params.label_width + params.endpoint_gap, label_mid_y)
    };

    Route {
        frame,
        anchor_side,
        leader: [start, end],
        arrowhead: arrowhead(start, end, params.arrow_size),
        label_origin: label_anchor,
    }
}

/// Triangle at `end` with back vertices at ±30° from the line direction.
pub fn arrowhead(start: Point, end: Point, size: f64) -> [Point; 3] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let back = |offset: f64| {
        Point::new(
            end.x - size * (angle + offset).cos(),
            end.y - size * (angle + offset).sin(),
        )
    };
    [end, back(-FRAC_PI_6), back(FRAC_PI_6)]
}
