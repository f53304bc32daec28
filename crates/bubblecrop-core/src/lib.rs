//! Bubblecrop Core - Speech-bubble editor library
//!
//! This crate provides the core functionality for Bubblecrop: draggable
//! point management, the speech-bubble outline, the crop box, software
//! rasterization, and image decode/export. It has no DOM dependencies;
//! the WASM bindings crate adapts it to the browser.

pub mod bubble;
pub mod cropbox;
pub mod decode;
pub mod editor;
pub mod export;
pub mod movable;
pub mod point;
pub mod surface;

pub use editor::{Editor, EditorOptions, EditorOptionsUpdate};
pub use movable::{DisplayBounds, MovablePoints, PointerEvent, PointerResponse, Target};
pub use point::{Point, PointId};
pub use surface::{Color, Surface};
