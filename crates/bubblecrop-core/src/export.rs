//! Cropped-region PNG export.
//!
//! The export path copies a pixel rectangle out of a [`Surface`], encodes
//! it as a lossless RGBA PNG, and wraps the bytes in a
//! `data:image/png;base64,...` URL the host can hand straight to an anchor
//! download or an `<img>` element.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::surface::Surface;

/// Errors that can occur during export.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// The crop region rounds to an empty or inverted rectangle.
    #[error("Invalid crop dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Copy the pixel region at `(x, y)` with the given size into a new surface.
///
/// Coordinates are rounded to the pixel grid. Parts of the region outside
/// the source stay transparent; the copy itself is 1:1, no resampling.
///
/// # Errors
///
/// Returns [`ExportError::InvalidDimensions`] when the size rounds to zero
/// or negative in either dimension.
pub fn crop_region(
    surface: &Surface,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<Surface, ExportError> {
    let out_width = width.round() as i64;
    let out_height = height.round() as i64;
    if out_width <= 0 || out_height <= 0 {
        return Err(ExportError::InvalidDimensions {
            width: out_width,
            height: out_height,
        });
    }

    let x0 = x.round() as i64;
    let y0 = y.round() as i64;
    let src = surface.pixels();
    let src_width = surface.width() as i64;
    let src_height = surface.height() as i64;

    let mut output = vec![0u8; (out_width * out_height * 4) as usize];

    // Copy row by row, skipping pixels that fall outside the source
    for row in 0..out_height {
        let src_y = y0 + row;
        if src_y < 0 || src_y >= src_height {
            continue;
        }
        for col in 0..out_width {
            let src_x = x0 + col;
            if src_x < 0 || src_x >= src_width {
                continue;
            }
            let src_idx = ((src_y * src_width + src_x) * 4) as usize;
            let dst_idx = ((row * out_width + col) * 4) as usize;
            output[dst_idx..dst_idx + 4].copy_from_slice(&src[src_idx..src_idx + 4]);
        }
    }

    Ok(Surface::from_rgba(out_width as u32, out_height as u32, output))
}

/// Encode a surface as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::InvalidDimensions`] for an empty surface and
/// [`ExportError::EncodingFailed`] when the encoder reports a problem.
pub fn encode_png(surface: &Surface) -> Result<Vec<u8>, ExportError> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(ExportError::InvalidDimensions {
            width: surface.width() as i64,
            height: surface.height() as i64,
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut buffer);
    encoder
        .write_image(
            surface.pixels(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Wrap PNG bytes in a base64 data URL.
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Crop, encode, and wrap in one call.
pub fn cropped_png_url(
    surface: &Surface,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<String, ExportError> {
    let region = crop_region(surface, x, y, width, height)?;
    let bytes = encode_png(&region)?;
    Ok(png_data_url(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Color;

    /// A surface where each pixel's red channel encodes its position.
    fn test_surface(width: u32, height: u32) -> Surface {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((y * width + x) % 256) as u8);
                pixels.push(0);
                pixels.push(0);
                pixels.push(255);
            }
        }
        Surface::from_rgba(width, height, pixels)
    }

    #[test]
    fn test_crop_region_dimensions_and_content() {
        let src = test_surface(10, 10);
        let out = crop_region(&src, 2.0, 3.0, 4.0, 5.0).unwrap();

        assert_eq!(out.width(), 4);
        assert_eq!(out.height(), 5);
        // First output pixel comes from (2, 3): value 3 * 10 + 2 = 32.
        assert_eq!(out.pixel(0, 0).unwrap().r, 32);
    }

    #[test]
    fn test_crop_region_outside_stays_transparent() {
        let src = test_surface(10, 10);
        let out = crop_region(&src, 5.0, 5.0, 10.0, 10.0).unwrap();

        assert_eq!(out.width(), 10);
        assert_eq!(out.pixel(0, 0).unwrap().r, 55);
        // Beyond the source's bottom-right corner: transparent.
        assert_eq!(out.pixel(6, 6), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_crop_region_negative_origin() {
        let src = test_surface(10, 10);
        let out = crop_region(&src, -2.0, -2.0, 4.0, 4.0).unwrap();

        assert_eq!(out.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
        // (2, 2) in the output is (0, 0) in the source.
        assert_eq!(out.pixel(2, 2).unwrap().r, 0);
        assert_eq!(out.pixel(2, 2).unwrap().a, 255);
    }

    #[test]
    fn test_crop_region_rejects_empty() {
        let src = test_surface(10, 10);

        let err = crop_region(&src, 0.0, 0.0, 0.0, 5.0).unwrap_err();
        assert_eq!(
            err,
            ExportError::InvalidDimensions {
                width: 0,
                height: 5
            }
        );

        assert!(crop_region(&src, 0.0, 0.0, -3.0, 5.0).is_err());
    }

    #[test]
    fn test_encode_png_signature() {
        let src = test_surface(8, 8);
        let bytes = encode_png(&src).unwrap();

        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_encode_png_rejects_empty_surface() {
        let empty = Surface::new(0, 0);
        assert!(matches!(
            encode_png(&empty),
            Err(ExportError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_png_round_trips_through_decoder() {
        let src = test_surface(50, 30);
        let bytes = encode_png(&src).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (50, 30));
        assert_eq!(decoded.into_raw(), src.pixels());
    }

    #[test]
    fn test_data_url_prefix_and_payload() {
        let bytes = vec![1u8, 2, 3, 4];
        let url = png_data_url(&bytes);

        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[test]
    fn test_cropped_png_url_end_to_end() {
        let src = test_surface(100, 100);
        let url = cropped_png_url(&src, 10.0, 10.0, 50.0, 30.0).unwrap();

        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();

        assert_eq!(decoded.width(), 50);
        assert_eq!(decoded.height(), 30);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
