//! Bubblecrop WASM - WebAssembly bindings for Bubblecrop
//!
//! This crate exposes the bubblecrop-core editor to JavaScript/TypeScript
//! applications. The editor renders into its own RGBA buffer; the host
//! copies each frame into a `<canvas>` via `ImageData` and feeds pointer
//! events back in.
//!
//! # Module Structure
//!
//! - `editor` - The editor binding (pointer events, options, export)
//! - `types` - WASM-compatible wrapper types for frame data
//!
//! # Usage
//!
//! ```typescript
//! import init, { BubbleEditor } from '@bubblecrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new BubbleEditor(canvas.width, canvas.height);
//! canvas.addEventListener('pointerdown', (e) => {
//!   editor.pointer_down(e.clientX, e.clientY, e.pointerId);
//!   const frame = editor.frame();
//!   ctx.putImageData(new ImageData(frame.data(), frame.width, frame.height), 0, 0);
//! });
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod types;

// Re-export public types
pub use editor::BubbleEditor;
pub use types::JsFrame;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&format!("bubblecrop wasm {} ready", version()).into());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
