//! WASM-compatible wrapper types for frame data.
//!
//! This module provides the JavaScript-friendly frame type that carries
//! rendered RGBA pixels from the editor's surface to a `<canvas>`.

use bubblecrop_core::Surface;
use wasm_bindgen::prelude::*;

/// A rendered frame for JavaScript.
///
/// Wraps one snapshot of the editor's RGBA surface. The usual consumer is
/// `CanvasRenderingContext2D.putImageData`:
///
/// ```typescript
/// const frame = editor.frame();
/// const image = new ImageData(frame.data(), frame.width, frame.height);
/// ctx.putImageData(image, 0, 0);
/// ```
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `data()` and `pixels()` copy it
/// into JavaScript memory; the wrapper itself is released by wasm-bindgen's
/// finalizer (or an explicit `free()`).
#[wasm_bindgen]
pub struct JsFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsFrame {
    /// Get the frame width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the frame height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// RGBA pixel data as a `Uint8ClampedArray`, ready for `ImageData`.
    ///
    /// This copies the pixels into JavaScript memory.
    pub fn data(&self) -> js_sys::Uint8ClampedArray {
        js_sys::Uint8ClampedArray::from(self.pixels.as_slice())
    }

    /// RGBA pixel data as a plain `Uint8Array` copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsFrame {
    /// Snapshot a core surface into a frame.
    pub(crate) fn from_surface(surface: &Surface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            pixels: surface.pixels().to_vec(),
        }
    }
}
