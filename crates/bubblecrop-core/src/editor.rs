//! The speech-bubble editor: composition root for the core.
//!
//! [`Editor`] owns the render surface, the optional uploaded image, the
//! bubble outline with its point manager, and the crop box. Pointer events
//! go to the crop box first and the bubble manager second, matching the
//! overlay's stacking order; the merged [`PointerResponse`] tells the host
//! what to do. Every state change ends in a full re-render, so the surface
//! always reflects current state.

use serde::{Deserialize, Serialize};

use crate::bubble::{BubbleOutline, BubbleStyle};
use crate::cropbox::{CropBox, CropOptionsUpdate};
use crate::decode::{self, DecodeError};
use crate::export::ExportError;
use crate::movable::{
    DisplayBounds, MovableOptionsUpdate, MovablePoints, PointerEvent, PointerResponse, Target,
};
use crate::surface::Surface;

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    /// Show the crop box and let its handles be dragged.
    pub enable_crop: bool,
    /// Draw a dot on every bubble point.
    pub display_points_as_dots: bool,
    /// Fill the strip above the bubble outline with the bubble color.
    pub fill_top_with_bubble_color: bool,
    /// Drag all bubble points together instead of one at a time.
    pub move_all_point_at_once: bool,
    /// Bubble fill color as `#rrggbb`.
    pub bubble_color: String,
    /// Outline stroke color as `#rrggbb`.
    pub stroke_color: String,
    /// Outline stroke thickness in canvas pixels.
    pub line_width: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            enable_crop: true,
            display_points_as_dots: true,
            fill_top_with_bubble_color: true,
            move_all_point_at_once: false,
            bubble_color: "#FFFFFF".to_string(),
            stroke_color: "#000000".to_string(),
            line_width: 8.0,
        }
    }
}

/// Partial update for [`EditorOptions`]; unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorOptionsUpdate {
    pub enable_crop: Option<bool>,
    pub display_points_as_dots: Option<bool>,
    pub fill_top_with_bubble_color: Option<bool>,
    pub move_all_point_at_once: Option<bool>,
    pub bubble_color: Option<String>,
    pub stroke_color: Option<String>,
    pub line_width: Option<f64>,
}

impl EditorOptions {
    /// Merge an update into this configuration.
    pub fn merge(&mut self, update: &EditorOptionsUpdate) {
        if let Some(enable_crop) = update.enable_crop {
            self.enable_crop = enable_crop;
        }
        if let Some(display_points_as_dots) = update.display_points_as_dots {
            self.display_points_as_dots = display_points_as_dots;
        }
        if let Some(fill_top_with_bubble_color) = update.fill_top_with_bubble_color {
            self.fill_top_with_bubble_color = fill_top_with_bubble_color;
        }
        if let Some(move_all_point_at_once) = update.move_all_point_at_once {
            self.move_all_point_at_once = move_all_point_at_once;
        }
        if let Some(bubble_color) = &update.bubble_color {
            self.bubble_color = bubble_color.clone();
        }
        if let Some(stroke_color) = &update.stroke_color {
            self.stroke_color = stroke_color.clone();
        }
        if let Some(line_width) = update.line_width {
            self.line_width = line_width;
        }
    }
}

/// The complete editor state for one canvas.
#[derive(Debug, Clone)]
pub struct Editor {
    surface: Surface,
    image: Option<Surface>,
    path: MovablePoints,
    bubble: BubbleOutline,
    crop_box: CropBox,
    options: EditorOptions,
}

impl Editor {
    /// Create an editor for an empty canvas of the given pixel size.
    ///
    /// Handle sizes scale with the canvas: the bubble point radius is a
    /// fortieth of the smaller dimension (at least 1), the crop handles
    /// five times that, and the stroke width matches the point radius.
    pub fn new(width: u32, height: u32) -> Self {
        let (path, bubble, crop_box, radius) = Self::build_scene(width as f64, height as f64);

        let mut options = EditorOptions::default();
        options.line_width = radius;

        let mut editor = Self {
            surface: Surface::new(width, height),
            image: None,
            path,
            bubble,
            crop_box,
            options,
        };
        editor.render(true);
        editor
    }

    fn build_scene(width: f64, height: f64) -> (MovablePoints, BubbleOutline, CropBox, f64) {
        let radius = (width.min(height) / 40.0).max(1.0);

        let mut path = MovablePoints::new(
            width,
            height,
            MovableOptionsUpdate {
                point_radius: Some(radius),
                ..Default::default()
            },
        );
        path.target = Target::Select;
        let bubble = BubbleOutline::new(&mut path, width, height);
        path.select_all();

        let crop_box = CropBox::new(
            width,
            height,
            CropOptionsUpdate {
                side_length: Some(radius * 5.0),
                side_width: Some(radius),
                ..Default::default()
            },
        );

        (path, bubble, crop_box, radius)
    }

    /// Decode an uploaded file and adopt it as the backdrop.
    ///
    /// # Errors
    ///
    /// Propagates [`DecodeError`] from the decoder; the editor state is
    /// untouched on failure.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let image = decode::decode_image(bytes)?;
        self.set_image(image);
        Ok(())
    }

    /// Adopt `image` as the backdrop, resizing the canvas to match.
    ///
    /// The bubble, crop box, and handle sizes are rebuilt from scratch for
    /// the new dimensions.
    pub fn set_image(&mut self, image: Surface) {
        let width = image.width();
        let height = image.height();
        let (path, bubble, crop_box, radius) = Self::build_scene(width as f64, height as f64);

        self.surface = Surface::new(width, height);
        self.image = Some(image);
        self.path = path;
        self.bubble = bubble;
        self.crop_box = crop_box;
        self.options.line_width = radius;

        self.render(true);
    }

    /// Feed one pointer event to the crop box and the bubble manager, in
    /// that order, and re-render if either asks for it.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        let response = self
            .crop_box
            .handle_pointer(event)
            .merge(self.path.handle_pointer(event));
        if response.redraw {
            self.render(true);
        }
        response
    }

    /// Record where the canvas element sits on screen so client
    /// coordinates can be mapped back to canvas pixels.
    pub fn set_display_bounds(&mut self, bounds: DisplayBounds) {
        self.path.set_display_bounds(bounds);
        self.crop_box.path_mut().set_display_bounds(bounds);
    }

    /// Merge an option update and re-render.
    pub fn set_options(&mut self, update: EditorOptionsUpdate) {
        self.options.merge(&update);
        self.render(true);
    }

    /// Merge a crop box option update and re-render.
    pub fn set_crop_options(&mut self, update: CropOptionsUpdate) {
        self.crop_box.set_options(update);
        self.render(true);
    }

    /// Redraw the full frame, overlay included.
    pub fn render(&mut self, draw_image: bool) {
        self.render_frame(draw_image, true);
    }

    /// Export the crop box region of a clean frame as a PNG data URL.
    ///
    /// Renders once without the overlay (no dots, no crop marks), crops
    /// that frame, then restores the interactive frame before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the crop region is degenerate or the
    /// encoder fails.
    pub fn export_cropped(&mut self) -> Result<String, ExportError> {
        self.render_frame(true, false);
        let url = self.crop_box.cropped_image_url(&self.surface);
        self.render_frame(true, true);
        url
    }

    pub fn path(&self) -> &MovablePoints {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut MovablePoints {
        &mut self.path
    }

    pub fn crop_box(&self) -> &CropBox {
        &self.crop_box
    }

    pub fn crop_box_mut(&mut self) -> &mut CropBox {
        &mut self.crop_box
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn outline(&self) -> &BubbleOutline {
        &self.bubble
    }

    /// Draw one frame: backdrop, bubble, then (optionally) the overlay of
    /// handle dots and crop marks.
    fn render_frame(&mut self, draw_image: bool, with_overlay: bool) {
        let width = self.surface.width() as f64;
        let height = self.surface.height() as f64;
        self.surface.clear();

        if draw_image {
            if let Some(image) = &self.image {
                self.surface.draw_surface(image, 0.0, 0.0, width, height);
            }
        }

        // Reconcile the selection policy with the configured drag mode.
        if self.options.move_all_point_at_once && self.path.target != Target::Select {
            self.path.target = Target::Select;
            self.path.select_all();
        } else if !self.options.move_all_point_at_once && self.path.target == Target::Select {
            self.path.target = Target::Single;
            self.path.deselect_all();
        }

        let style = BubbleStyle {
            bubble_color: self.options.bubble_color.clone(),
            stroke_color: self.options.stroke_color.clone(),
            line_width: self.options.line_width,
            fill_top: self.options.fill_top_with_bubble_color,
            show_dots: self.options.display_points_as_dots && with_overlay,
            dot_radius: self.path.options().point_radius,
        };
        self.bubble.draw(&self.path, &mut self.surface, &style);

        if with_overlay {
            self.crop_box.set_enable_crop(self.options.enable_crop);
            self.crop_box.draw(&mut self.surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export;
    use crate::surface::Color;

    #[test]
    fn test_initial_state() {
        let editor = Editor::new(600, 600);

        assert_eq!(editor.path().len(), 5);
        assert_eq!(editor.crop_box().path().len(), 8);
        // The first render reconciled the selection policy.
        assert_eq!(editor.path().target, Target::Single);
        assert!(editor.path().focused_ids().is_empty());
        // Handle sizes derived from the canvas.
        assert_eq!(editor.path().options().point_radius, 15.0);
        assert_eq!(editor.options().line_width, 15.0);
        assert_eq!(editor.crop_box().options().side_length, 75.0);
        assert_eq!(editor.crop_box().options().side_width, 15.0);
        // Cropping starts enabled, so the first frame already shows a live
        // crop overlay; its top-left corner mark lands on (0, 0).
        assert!(editor.options().enable_crop);
        assert!(editor.crop_box().options().show_box);
        assert_eq!(editor.surface().pixel(0, 0), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn test_bubble_point_drag() {
        let mut editor = Editor::new(600, 600);

        // The tip starts at (300, 100); radius 15 so a press at distance 8
        // hits it.
        let response = editor.handle_pointer(PointerEvent::Down {
            x: 300.0,
            y: 108.0,
            pointer_id: 7,
        });
        assert!(response.redraw);
        assert!(response.focus_changed);
        assert_eq!(response.capture, Some(7));

        editor.handle_pointer(PointerEvent::Move { x: 320.0, y: 158.0 });
        let tip = editor.outline().point_ids()[2];
        assert_eq!(editor.path().point(tip).unwrap().array(), [320.0, 150.0]);

        editor.handle_pointer(PointerEvent::Up { pointer_id: 7 });
        assert!(editor.path().focused_ids().is_empty());
    }

    #[test]
    fn test_move_all_drags_every_point() {
        let mut editor = Editor::new(600, 600);
        editor.set_options(EditorOptionsUpdate {
            move_all_point_at_once: Some(true),
            ..Default::default()
        });

        // The render inside set_options switched policy and focused all.
        assert_eq!(editor.path().target, Target::Select);
        assert_eq!(editor.path().focused_ids().len(), 5);

        // Press empty space and drag; every bubble point translates.
        editor.handle_pointer(PointerEvent::Down {
            x: 450.0,
            y: 400.0,
            pointer_id: 1,
        });
        editor.handle_pointer(PointerEvent::Move { x: 460.0, y: 425.0 });

        let ids = *editor.outline().point_ids();
        assert_eq!(editor.path().point(ids[0]).unwrap().array(), [110.0, 25.0]);
        assert_eq!(editor.path().point(ids[2]).unwrap().array(), [310.0, 125.0]);
        assert_eq!(editor.path().point(ids[4]).unwrap().array(), [510.0, 25.0]);
    }

    #[test]
    fn test_enable_crop_gates_crop_handles() {
        let mut editor = Editor::new(600, 600);
        editor.set_options(EditorOptionsUpdate {
            enable_crop: Some(false),
            ..Default::default()
        });
        assert!(!editor.crop_box().options().show_box);

        editor.handle_pointer(PointerEvent::Down {
            x: 0.0,
            y: 0.0,
            pointer_id: 1,
        });
        assert!(!editor.crop_box().is_cropping());
        editor.handle_pointer(PointerEvent::Up { pointer_id: 1 });

        editor.set_options(EditorOptionsUpdate {
            enable_crop: Some(true),
            ..Default::default()
        });
        assert!(editor.crop_box().options().show_box);

        editor.handle_pointer(PointerEvent::Down {
            x: 0.0,
            y: 0.0,
            pointer_id: 1,
        });
        assert!(editor.crop_box().is_cropping());
    }

    #[test]
    fn test_export_cropped_dimensions() {
        let mut editor = Editor::new(200, 200);

        // Cropping is on by default; drag the bottom-right handle inward.
        editor.handle_pointer(PointerEvent::Down {
            x: 200.0,
            y: 200.0,
            pointer_id: 1,
        });
        editor.handle_pointer(PointerEvent::Move { x: 150.0, y: 130.0 });
        editor.handle_pointer(PointerEvent::Up { pointer_id: 1 });

        let url = editor.export_cropped().unwrap();
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();

        assert_eq!(decoded.width(), 150);
        assert_eq!(decoded.height(), 130);
    }

    #[test]
    fn test_export_restores_overlay_frame() {
        let mut editor = Editor::new(100, 100);
        // The default crop overlay marks the top-left corner.
        assert_eq!(editor.surface().pixel(0, 0), Some(Color::rgb(0, 0, 0)));

        editor.export_cropped().unwrap();

        assert_eq!(editor.surface().pixel(0, 0), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn test_set_image_rebuilds_scene() {
        let mut editor = Editor::new(100, 100);
        let mut image = Surface::new(300, 200);
        image.fill_rect(0.0, 0.0, 300.0, 200.0, Color::rgb(10, 20, 30));

        editor.set_image(image);

        assert_eq!(editor.surface().width(), 300);
        assert_eq!(editor.surface().height(), 200);
        // Handle radius follows the smaller dimension.
        assert_eq!(editor.path().options().point_radius, 5.0);
        // The bubble was laid out for the new canvas.
        let a = editor.outline().point_ids()[0];
        assert_eq!(editor.path().point(a).unwrap().array(), [50.0, 0.0]);
        // The backdrop shows through below the bubble.
        assert_eq!(editor.surface().pixel(250, 180), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_load_image_png() {
        let mut editor = Editor::new(50, 50);
        let mut source = Surface::new(80, 60);
        source.fill_rect(0.0, 0.0, 80.0, 60.0, Color::rgb(5, 200, 90));
        let bytes = export::encode_png(&source).unwrap();

        editor.load_image(&bytes).unwrap();

        assert_eq!(editor.surface().width(), 80);
        assert_eq!(editor.surface().height(), 60);
        assert_eq!(editor.surface().pixel(70, 50), Some(Color::rgb(5, 200, 90)));
    }

    #[test]
    fn test_load_image_failure_keeps_state() {
        let mut editor = Editor::new(50, 50);

        let result = editor.load_image(&[0xde, 0xad, 0xbe, 0xef]);

        assert!(result.is_err());
        assert_eq!(editor.surface().width(), 50);
        assert_eq!(editor.path().len(), 5);
    }

    #[test]
    fn test_set_crop_options_forwards() {
        let mut editor = Editor::new(100, 100);

        editor.set_crop_options(CropOptionsUpdate {
            box_color: Some("#ff0000".to_string()),
            ..Default::default()
        });

        assert_eq!(editor.crop_box().options().box_color, "#ff0000");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
