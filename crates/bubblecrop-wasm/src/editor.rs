//! Editor WASM bindings.
//!
//! This module exposes the core [`Editor`] to JavaScript as
//! [`BubbleEditor`]. The host owns the `<canvas>` and the event listeners;
//! the editor owns all state and rendering. Each pointer method returns the
//! response object telling the host what to do next (redraw, re-read the
//! focused points, capture or release the pointer).
//!
//! # Example
//!
//! ```typescript
//! import { BubbleEditor } from '@bubblecrop/wasm';
//!
//! const editor = new BubbleEditor(canvas.width, canvas.height);
//!
//! canvas.addEventListener('pointerdown', (e) => {
//!   const r = editor.pointer_down(e.clientX, e.clientY, e.pointerId);
//!   if (r.capture !== undefined) canvas.setPointerCapture(r.capture);
//!   if (r.redraw) paint();
//! });
//! ```

use bubblecrop_core::cropbox::CropOptionsUpdate;
use bubblecrop_core::{
    DisplayBounds, Editor, EditorOptionsUpdate, PointerEvent, PointerResponse,
};
use wasm_bindgen::prelude::*;

use crate::types::JsFrame;

/// One focused point, as handed to JavaScript.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct JsFocusedPoint {
    id: String,
    x: f64,
    y: f64,
}

/// Serialize a pointer response for the host.
fn response_to_js(response: PointerResponse) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The speech-bubble editor wrapper for JavaScript.
#[wasm_bindgen]
pub struct BubbleEditor {
    inner: Editor,
}

#[wasm_bindgen]
impl BubbleEditor {
    /// Create an editor for an empty canvas of the given pixel size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> BubbleEditor {
        BubbleEditor {
            inner: Editor::new(width, height),
        }
    }

    /// Decode an uploaded file and adopt it as the backdrop.
    ///
    /// The canvas size follows the image, so the host should re-read
    /// `width` and `height` afterwards.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw file bytes as a `Uint8Array`
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a recognized image format or
    /// the file is corrupted.
    ///
    /// # Example
    ///
    /// ```typescript
    /// const bytes = new Uint8Array(await file.arrayBuffer());
    /// editor.load_image(bytes);
    /// canvas.width = editor.width;
    /// canvas.height = editor.height;
    /// ```
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner
            .load_image(bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the canvas width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.surface().width()
    }

    /// Get the canvas height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.surface().height()
    }

    /// Snapshot the current frame for `putImageData`.
    pub fn frame(&self) -> JsFrame {
        JsFrame::from_surface(self.inner.surface())
    }

    /// Re-render the current frame.
    pub fn redraw(&mut self) {
        self.inner.render(true);
    }

    /// Record where the canvas element sits on screen.
    ///
    /// Call this with `canvas.getBoundingClientRect()` whenever the layout
    /// changes, so client coordinates map correctly onto canvas pixels
    /// under CSS scaling.
    pub fn set_display_bounds(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.inner.set_display_bounds(DisplayBounds {
            left,
            top,
            width,
            height,
        });
    }

    /// Feed a `pointerdown` event.
    ///
    /// # Returns
    ///
    /// A response object: `{ redraw, focusChanged, capture?, release? }`.
    pub fn pointer_down(&mut self, x: f64, y: f64, pointer_id: i32) -> Result<JsValue, JsValue> {
        let response = self.inner.handle_pointer(PointerEvent::Down { x, y, pointer_id });
        response_to_js(response)
    }

    /// Feed a `pointermove` event.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let response = self.inner.handle_pointer(PointerEvent::Move { x, y });
        response_to_js(response)
    }

    /// Feed a `pointerup` event.
    pub fn pointer_up(&mut self, pointer_id: i32) -> Result<JsValue, JsValue> {
        let response = self.inner.handle_pointer(PointerEvent::Up { pointer_id });
        response_to_js(response)
    }

    /// Feed a `pointerleave` event. Ends the gesture exactly like
    /// `pointer_up`.
    pub fn pointer_leave(&mut self, pointer_id: i32) -> Result<JsValue, JsValue> {
        let response = self.inner.handle_pointer(PointerEvent::Leave { pointer_id });
        response_to_js(response)
    }

    /// Merge a partial editor options object and re-render.
    ///
    /// Unset fields keep their value.
    ///
    /// # Example
    ///
    /// ```typescript
    /// editor.set_options({ enableCrop: true, bubbleColor: '#fff8dc' });
    /// ```
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let update: EditorOptionsUpdate =
            serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_options(update);
        Ok(())
    }

    /// Merge a partial crop box options object and re-render.
    pub fn set_crop_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let update: CropOptionsUpdate =
            serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_crop_options(update);
        Ok(())
    }

    /// Current editor options as a plain object.
    pub fn options(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.options())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The focused points with their canvas positions, as
    /// `{ id, x, y }` objects.
    ///
    /// Re-read this whenever a pointer response has `focusChanged` set.
    pub fn focused_points(&self) -> Result<JsValue, JsValue> {
        let points: Vec<JsFocusedPoint> = self
            .inner
            .path()
            .focused_points()
            .iter()
            .map(|(id, p)| JsFocusedPoint {
                id: id.to_string(),
                x: p.x,
                y: p.y,
            })
            .collect();
        serde_wasm_bindgen::to_value(&points).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Export the crop box region as a PNG data URL.
    ///
    /// The exported frame has no handle dots and no crop marks; the
    /// interactive frame is restored before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error when the crop region is degenerate or encoding
    /// fails.
    ///
    /// # Example
    ///
    /// ```typescript
    /// const link = document.createElement('a');
    /// link.href = editor.cropped_image_url();
    /// link.download = 'bubble.png';
    /// link.click();
    /// ```
    pub fn cropped_image_url(&mut self) -> Result<String, JsValue> {
        self.inner
            .export_cropped()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
