//! Speech-bubble outline geometry and rendering.
//!
//! The bubble hangs from the top edge of the canvas. Five draggable points
//! (left anchor, left shoulder, tip, right shoulder, right anchor) are
//! joined by two quadratic shoulder curves around two straight tip
//! segments, and the shape closes along the top edge above the anchors.
//! [`BubbleOutline`] owns the point ids and the connector layout; the
//! positions live in a shared [`MovablePoints`] manager so the editor's
//! pointer handling moves them like any other point.

use crate::movable::MovablePoints;
use crate::point::{Point, PointId};
use crate::surface::{Color, Surface};

/// Sample count when flattening a quadratic connector to line segments.
const CURVE_STEPS: usize = 16;

/// Handle dot for an unfocused point.
const DOT: Color = Color::rgb(255, 0, 0);

/// Handle dot for a focused point.
const FOCUSED_DOT: Color = Color::rgb(255, 255, 0);

/// How one outline point connects to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// Straight segment.
    Line,
    /// Quadratic curve with an implied control point: x midway between the
    /// endpoints, y at the lower (larger) of the two.
    Quadratic,
}

/// Per-frame styling for [`BubbleOutline::draw`], assembled by the editor
/// from its options.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleStyle {
    /// Bubble interior and top-strip fill as a `#rrggbb` string.
    pub bubble_color: String,
    /// Outline stroke as a `#rrggbb` string.
    pub stroke_color: String,
    /// Stroke thickness in canvas pixels.
    pub line_width: f64,
    /// Fill the strip between the top edge and the outline's lowest point.
    pub fill_top: bool,
    /// Draw the handle dots.
    pub show_dots: bool,
    /// Handle dot radius in canvas pixels.
    pub dot_radius: f64,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            bubble_color: "#FFFFFF".to_string(),
            stroke_color: "#000000".to_string(),
            line_width: 8.0,
            fill_top: true,
            show_dots: true,
            dot_radius: 5.0,
        }
    }
}

/// The five-point speech-bubble outline.
///
/// Holds point ids only; positions belong to the [`MovablePoints`] manager
/// passed to each method.
#[derive(Debug, Clone)]
pub struct BubbleOutline {
    /// Left anchor, left shoulder, tip, right shoulder, right anchor.
    points: [PointId; 5],
    connectors: [Connector; 4],
}

impl BubbleOutline {
    /// Register the default bubble layout for a canvas into `path` and
    /// return the outline that tracks it.
    ///
    /// The anchors sit on the top edge at one sixth in from each side; the
    /// tip reaches down to a sixth of the canvas height with the shoulders
    /// halfway back up.
    pub fn new(path: &mut MovablePoints, canvas_width: f64, canvas_height: f64) -> Self {
        let w = canvas_width;
        let h = canvas_height;

        let a = Point::new(w / 6.0, 0.0);
        let b = Point::new(w / 2.0 - w / 20.0, h / 6.0 - h / 12.0);
        let c = Point::new(w / 2.0, h / 6.0);
        let d = Point::new(w / 2.0 + w / 20.0, h / 6.0 - h / 12.0);
        let e = Point::new(5.0 * w / 6.0, 0.0);

        let points = [a.id(), b.id(), c.id(), d.id(), e.id()];
        path.add_points([a, b, c, d, e]);

        Self {
            points,
            connectors: [
                Connector::Quadratic,
                Connector::Line,
                Connector::Line,
                Connector::Quadratic,
            ],
        }
    }

    /// Outline point ids in drawing order.
    pub fn point_ids(&self) -> &[PointId; 5] {
        &self.points
    }

    /// Flatten the outline to a closed-polygon vertex list.
    ///
    /// The list starts on the top edge above the first anchor, drops to the
    /// anchor, follows the connectors (quadratics sampled at
    /// [`CURVE_STEPS`] points), and ends on the top edge above the last
    /// anchor. Closing back along the top edge is left to the polygon
    /// fill.
    pub fn flatten(&self, path: &MovablePoints) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let Some(first) = path.point(self.points[0]) else {
            return out;
        };
        out.push((first.x, 0.0));
        out.push((first.x, first.y));

        let mut prev = (first.x, first.y);
        for (i, connector) in self.connectors.iter().enumerate() {
            let Some(next) = path.point(self.points[i + 1]) else {
                return out;
            };
            let end = (next.x, next.y);
            match connector {
                Connector::Line => out.push(end),
                Connector::Quadratic => {
                    let control = ((prev.0 + end.0) / 2.0, prev.1.max(end.1));
                    for step in 1..=CURVE_STEPS {
                        let t = step as f64 / CURVE_STEPS as f64;
                        let u = 1.0 - t;
                        out.push((
                            u * u * prev.0 + 2.0 * u * t * control.0 + t * t * end.0,
                            u * u * prev.1 + 2.0 * u * t * control.1 + t * t * end.1,
                        ));
                    }
                }
            }
            prev = end;
        }

        out.push((prev.0, 0.0));
        out
    }

    /// Lowest y reached by the outline.
    ///
    /// The implied quadratic controls never push a curve below both of its
    /// endpoints, so the extreme over the five points is the extreme of
    /// the whole outline. With every point dragged above the top edge the
    /// result goes negative and the top-strip fill collapses to nothing.
    pub fn max_y(&self, path: &MovablePoints) -> f64 {
        let mut ys = self
            .points
            .iter()
            .filter_map(|&id| path.point(id))
            .map(|p| p.y);
        let first = ys.next().unwrap_or(0.0);
        ys.fold(first, f64::max)
    }

    /// Paint the bubble onto `surface`.
    ///
    /// Order matters: the top strip goes down first, then the stroked
    /// outline, then the interior fill over the stroke's inner half, then
    /// the handle dots. Focused points get the highlight dot color.
    pub fn draw(&self, path: &MovablePoints, surface: &mut Surface, style: &BubbleStyle) {
        let outline = self.flatten(path);
        if outline.len() < 3 {
            return;
        }

        let bubble = Color::from_hex(&style.bubble_color);
        let stroke = Color::from_hex(&style.stroke_color);

        if style.fill_top {
            let strip = self.max_y(path) + style.line_width / 2.0;
            surface.fill_rect(0.0, 0.0, surface.width() as f64, strip, bubble);
        }

        surface.stroke_polyline(&outline, style.line_width, stroke);
        surface.fill_polygon(&outline, bubble);

        if style.show_dots {
            for &id in &self.points {
                if let Some(point) = path.point(id) {
                    let color = if path.is_focused(id) { FOCUSED_DOT } else { DOT };
                    surface.fill_circle(point.x, point.y, style.dot_radius, color);
                }
            }
        }
    }
}
