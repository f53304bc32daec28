//! Rectangular crop box with draggable handles.
//!
//! Eight handles back the box: four corners (`tl`, `tr`, `bl`, `br`) and
//! four edge midpoints (`t`, `b`, `l`, `r`), all registered as points in
//! the box's own [`MovablePoints`]. The corners are the independent
//! coordinates; midpoints are derived and recomputed every draw pass, and
//! dragging a midpoint is translated back into corner moves along its axis.
//!
//! Every [`CropBox::draw`] call runs the same pipeline: clamp the corners
//! against each other and the canvas (an inside-out box flips by clamping,
//! not swapping), propagate the focused handle's edit to the dependent
//! corners, recompute the midpoints, then paint the overlay. The
//! bookkeeping steps run even when the overlay is hidden, so the corners
//! stay a valid rectangle whenever a draw pass has happened.

use serde::{Deserialize, Serialize};

use crate::export::{self, ExportError};
use crate::movable::{
    MovableOptionsUpdate, MovablePoints, PointerEvent, PointerResponse,
};
use crate::point::{Point, PointId};
use crate::surface::{Color, Surface};

/// Grid lines and the mid-gesture outside fill use the box color at this
/// alpha.
const TRANSLUCENT_ALPHA: u8 = 127;

/// Crop box appearance and behavior options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOptions {
    /// Handle and grid color as a `#rrggbb` string.
    pub box_color: String,
    /// Fill the canvas regions outside the box.
    pub blur_outside: bool,
    /// Long side of the corner marks and edge bars; doubles as the handle
    /// hit radius.
    pub side_length: f64,
    /// Short side of the corner marks and edge bars.
    pub side_width: f64,
    /// Draw the overlay at all.
    pub show_box: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            box_color: "#000000".to_string(),
            blur_outside: true,
            side_length: 40.0,
            side_width: 10.0,
            show_box: true,
        }
    }
}

/// Partial update for [`CropOptions`]; unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropOptionsUpdate {
    pub box_color: Option<String>,
    pub blur_outside: Option<bool>,
    pub side_length: Option<f64>,
    pub side_width: Option<f64>,
    pub show_box: Option<bool>,
}

impl CropOptions {
    /// Merge an update into this configuration.
    pub fn merge(&mut self, update: &CropOptionsUpdate) {
        if let Some(box_color) = &update.box_color {
            self.box_color = box_color.clone();
        }
        if let Some(blur_outside) = update.blur_outside {
            self.blur_outside = blur_outside;
        }
        if let Some(side_length) = update.side_length {
            self.side_length = side_length;
        }
        if let Some(side_width) = update.side_width {
            self.side_width = side_width;
        }
        if let Some(show_box) = update.show_box {
            self.show_box = show_box;
        }
    }
}

/// A draggable crop rectangle over a canvas.
#[derive(Debug, Clone)]
pub struct CropBox {
    path: MovablePoints,
    options: CropOptions,
    tl: PointId,
    tr: PointId,
    bl: PointId,
    br: PointId,
    t: PointId,
    b: PointId,
    l: PointId,
    r: PointId,
}

impl CropBox {
    /// Create a crop box spanning the whole canvas.
    pub fn new(canvas_width: f64, canvas_height: f64, options: CropOptionsUpdate) -> Self {
        let mut merged = CropOptions::default();
        merged.merge(&options);

        let mut path = MovablePoints::new(
            canvas_width,
            canvas_height,
            MovableOptionsUpdate {
                allow_modify: Some(true),
                point_radius: Some(merged.side_length),
            },
        );

        let tl = Point::new(0.0, 0.0);
        let br = Point::new(canvas_width, canvas_height);
        let tr = Point::new(br.x, tl.y);
        let bl = Point::new(tl.x, br.y);
        let t = Point::new((tl.x + tr.x) / 2.0, (tl.y + tr.y) / 2.0);
        let b = Point::new((bl.x + br.x) / 2.0, (bl.y + br.y) / 2.0);
        let l = Point::new((tl.x + bl.x) / 2.0, (tl.y + bl.y) / 2.0);
        let r = Point::new((br.x + tr.x) / 2.0, (br.y + tr.y) / 2.0);

        let ids = (
            tl.id(),
            tr.id(),
            bl.id(),
            br.id(),
            t.id(),
            b.id(),
            l.id(),
            r.id(),
        );
        path.add_points([tl, tr, bl, br, t, b, l, r]);

        Self {
            path,
            options: merged,
            tl: ids.0,
            tr: ids.1,
            bl: ids.2,
            br: ids.3,
            t: ids.4,
            b: ids.5,
            l: ids.6,
            r: ids.7,
        }
    }

    /// The underlying point manager.
    pub fn path(&self) -> &MovablePoints {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut MovablePoints {
        &mut self.path
    }

    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    /// Merge a partial option update. Purely a configuration change: the
    /// next draw pass picks it up.
    pub fn set_options(&mut self, update: CropOptionsUpdate) {
        self.options.merge(&update);
    }

    /// Whether a crop gesture is in progress (any handle focused).
    /// Computed from the manager's focus state, never cached.
    pub fn is_cropping(&self) -> bool {
        !self.path.focused_ids().is_empty()
    }

    /// The box color at half alpha, parsed fresh on every call.
    pub fn box_color_translucent(&self) -> Color {
        Color::from_hex(&self.options.box_color).with_alpha(TRANSLUCENT_ALPHA)
    }

    /// Show or hide the box and gate handle dragging in one step.
    pub fn set_enable_crop(&mut self, enable: bool) {
        self.options.show_box = enable;
        self.path.set_options(MovableOptionsUpdate {
            allow_modify: Some(enable),
            ..Default::default()
        });
    }

    /// Forward a pointer event to the box's manager.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        self.path.handle_pointer(event)
    }

    /// Current `(tl, br)` corner positions, as last stored. Clamping and
    /// propagation happen in [`CropBox::draw`].
    pub fn bounds(&self) -> Option<(Point, Point)> {
        Some((
            self.path.point(self.tl)?.clone(),
            self.path.point(self.br)?.clone(),
        ))
    }

    /// Run the per-frame pipeline and paint the overlay onto `surface`.
    ///
    /// Clamping, corner propagation, and midpoint recomputation always run;
    /// the painting steps are skipped while `show_box` is off.
    pub fn draw(&mut self, surface: &mut Surface) {
        let canvas_width = surface.width() as f64;
        let canvas_height = surface.height() as f64;

        self.clamp_to_canvas(canvas_width, canvas_height);
        self.propagate_focused_edits();
        self.update_side_positions();

        if !self.options.show_box {
            return;
        }
        let Some([tl, tr, bl, br, t, b, l, r]) = self.handle_positions() else {
            return;
        };

        let opaque = Color::from_hex(&self.options.box_color);
        let width = self.options.side_width;
        let length = self.options.side_length;

        // Corner L-marks: two bars meeting at each corner
        surface.fill_rect(tl.x, tl.y, width, length, opaque);
        surface.fill_rect(tl.x, tl.y, length, width, opaque);
        surface.fill_rect(br.x - width, br.y - length, width, length, opaque);
        surface.fill_rect(br.x - length, br.y - width, length, width, opaque);
        surface.fill_rect(tr.x - width, tr.y, width, length, opaque);
        surface.fill_rect(tr.x - length, tr.y, length, width, opaque);
        surface.fill_rect(bl.x, bl.y - width, length, width, opaque);
        surface.fill_rect(bl.x, bl.y - length, width, length, opaque);

        // Edge bars, centered on the midpoints
        surface.fill_rect(t.x - length / 2.0, tl.y, length, width, opaque);
        surface.fill_rect(b.x - length / 2.0, br.y - width, length, width, opaque);
        surface.fill_rect(tl.x, l.y - length / 2.0, width, length, opaque);
        surface.fill_rect(br.x - width, r.y - length / 2.0, width, length, opaque);

        let translucent = self.box_color_translucent();
        if self.is_cropping() {
            // Rule-of-thirds grid inside the box
            let sx = tr.x - tl.x;
            let sy = bl.y - tl.y;
            let grid_height = br.y - tl.y;
            let grid_width = br.x - tl.x;
            surface.fill_rect(
                tl.x + sx / 3.0 - width / 2.0,
                tl.y,
                width,
                grid_height,
                translucent,
            );
            surface.fill_rect(
                tl.x + sx * 2.0 / 3.0 - width / 2.0,
                tl.y,
                width,
                grid_height,
                translucent,
            );
            surface.fill_rect(
                tl.x,
                tl.y + sy / 3.0 - width / 2.0,
                grid_width,
                width,
                translucent,
            );
            surface.fill_rect(
                tl.x,
                tl.y + sy * 2.0 / 3.0 - width / 2.0,
                grid_width,
                width,
                translucent,
            );
        }

        if self.options.blur_outside {
            // The outside fill inherits the grid's translucent color during
            // a crop gesture and is the opaque box color otherwise.
            let outside = if self.is_cropping() { translucent } else { opaque };
            surface.fill_rect(0.0, 0.0, canvas_width, tr.y, outside);
            surface.fill_rect(0.0, br.y, canvas_width, canvas_height, outside);
            surface.fill_rect(0.0, 0.0, tl.x, canvas_height, outside);
            surface.fill_rect(br.x, 0.0, canvas_width, canvas_height, outside);
        }
    }

    /// Export the boxed region of `surface` as a PNG data URL.
    ///
    /// The copy is 1:1 at the stored corner positions; regions outside the
    /// surface stay transparent.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidDimensions`] when the box is empty or
    /// inverted (possible if no draw pass has clamped it yet).
    pub fn cropped_image_url(&self, surface: &Surface) -> Result<String, ExportError> {
        let (tl, br) = self
            .bounds()
            .ok_or(ExportError::InvalidDimensions { width: 0, height: 0 })?;
        export::cropped_png_url(surface, tl.x, tl.y, br.x - tl.x, br.y - tl.y)
    }

    fn position(&self, id: PointId) -> Option<Point> {
        self.path.point(id).cloned()
    }

    fn handle_positions(&self) -> Option<[Point; 8]> {
        Some([
            self.position(self.tl)?,
            self.position(self.tr)?,
            self.position(self.bl)?,
            self.position(self.br)?,
            self.position(self.t)?,
            self.position(self.b)?,
            self.position(self.l)?,
            self.position(self.r)?,
        ])
    }

    /// Clamp the corners against their partner and the canvas, evaluated
    /// simultaneously against the pre-pass coordinates, so dragging a
    /// corner past its opposite flips the box instead of collapsing it.
    ///
    /// The tl/br pair clamps against itself; the bl/tr pair clamps against
    /// itself with its own basis. The bases are intentionally kept as they
    /// are, asymmetries included.
    fn clamp_to_canvas(&mut self, canvas_width: f64, canvas_height: f64) {
        let (Some(tl), Some(tr), Some(bl), Some(br)) = (
            self.position(self.tl),
            self.position(self.tr),
            self.position(self.bl),
            self.position(self.br),
        ) else {
            return;
        };

        let new_tl = (
            tl.x.min(br.x).min(canvas_width),
            tl.y.min(br.y).min(canvas_height),
        );
        let new_br = (tl.x.max(br.x).max(0.0), tl.y.max(br.y).max(0.0));
        let new_bl = (bl.x.min(tr.x).min(canvas_width), bl.y.max(tr.y).max(0.0));
        let new_tr = (bl.x.max(tr.x).max(0.0), bl.y.min(tr.y).min(canvas_height));

        if let Some(p) = self.path.point_mut(self.tl) {
            p.set(new_tl.0, new_tl.1);
        }
        if let Some(p) = self.path.point_mut(self.br) {
            p.set(new_br.0, new_br.1);
        }
        if let Some(p) = self.path.point_mut(self.bl) {
            p.set(new_bl.0, new_bl.1);
        }
        if let Some(p) = self.path.point_mut(self.tr) {
            p.set(new_tr.0, new_tr.1);
        }
    }

    /// Push the focused handle's edit into the dependent corners. One
    /// branch per pass, first match wins: a diagonal pair derives the other
    /// diagonal, an edge midpoint moves only its corner pair on its axis.
    fn propagate_focused_edits(&mut self) {
        if self.path.is_focused(self.tl) || self.path.is_focused(self.br) {
            let (Some(tl), Some(br)) = (self.position(self.tl), self.position(self.br)) else {
                return;
            };
            if let Some(p) = self.path.point_mut(self.bl) {
                p.set(tl.x, br.y);
            }
            if let Some(p) = self.path.point_mut(self.tr) {
                p.set(br.x, tl.y);
            }
        } else if self.path.is_focused(self.bl) || self.path.is_focused(self.tr) {
            let (Some(bl), Some(tr)) = (self.position(self.bl), self.position(self.tr)) else {
                return;
            };
            if let Some(p) = self.path.point_mut(self.tl) {
                p.set(bl.x, tr.y);
            }
            if let Some(p) = self.path.point_mut(self.br) {
                p.set(tr.x, bl.y);
            }
        } else if self.path.is_focused(self.t) {
            let Some(t) = self.position(self.t) else { return };
            if let Some(p) = self.path.point_mut(self.tl) {
                p.y = t.y;
            }
            if let Some(p) = self.path.point_mut(self.tr) {
                p.y = t.y;
            }
        } else if self.path.is_focused(self.b) {
            let Some(b) = self.position(self.b) else { return };
            if let Some(p) = self.path.point_mut(self.bl) {
                p.y = b.y;
            }
            if let Some(p) = self.path.point_mut(self.br) {
                p.y = b.y;
            }
        } else if self.path.is_focused(self.l) {
            let Some(l) = self.position(self.l) else { return };
            if let Some(p) = self.path.point_mut(self.tl) {
                p.x = l.x;
            }
            if let Some(p) = self.path.point_mut(self.bl) {
                p.x = l.x;
            }
        } else if self.path.is_focused(self.r) {
            let Some(r) = self.position(self.r) else { return };
            if let Some(p) = self.path.point_mut(self.tr) {
                p.x = r.x;
            }
            if let Some(p) = self.path.point_mut(self.br) {
                p.x = r.x;
            }
        }
    }

    /// Recompute each midpoint as the mean of its corner pair.
    fn update_side_positions(&mut self) {
        let (Some(tl), Some(tr), Some(bl), Some(br)) = (
            self.position(self.tl),
            self.position(self.tr),
            self.position(self.bl),
            self.position(self.br),
        ) else {
            return;
        };

        if let Some(t) = self.path.point_mut(self.t) {
            t.set(0.0, 0.0).plus(&tl, 1.0).plus(&tr, 1.0).divide(2.0);
        }
        if let Some(b) = self.path.point_mut(self.b) {
            b.set(0.0, 0.0).plus(&bl, 1.0).plus(&br, 1.0).divide(2.0);
        }
        if let Some(l) = self.path.point_mut(self.l) {
            l.set(0.0, 0.0).plus(&tl, 1.0).plus(&bl, 1.0).divide(2.0);
        }
        if let Some(r) = self.path.point_mut(self.r) {
            r.set(0.0, 0.0).plus(&br, 1.0).plus(&tr, 1.0).divide(2.0);
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
