//! Image decoding with EXIF orientation handling.
//!
//! Uploaded files arrive as raw bytes from a file input or a drop event.
//! [`decode_image`] sniffs the container format, decodes the image into
//! RGBA, applies the EXIF orientation tag (phone photos are routinely
//! stored rotated), and hands back a [`Surface`] ready for the editor.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use thiserror::Error;

use crate::surface::Surface;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Decode an uploaded image from bytes, applying EXIF orientation
/// correction.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes (PNG, JPEG, or anything the format sniffer
///   recognizes)
///
/// # Returns
///
/// A [`Surface`] with RGBA pixel data and correct orientation applied.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognized
/// image format.
/// Returns `DecodeError::CorruptedFile` if the file is recognized but
/// cannot be decoded.
pub fn decode_image(bytes: &[u8]) -> Result<Surface, DecodeError> {
    // Extract EXIF orientation before decoding; the tag lives in the
    // container, not the pixel data.
    let orientation = extract_orientation(bytes);

    let cursor = Cursor::new(bytes);
    let reader = ImageReader::new(cursor)
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented_img = apply_orientation(img, orientation);

    let rgba_img = oriented_img.into_rgba8();
    let (width, height) = rgba_img.dimensions();
    Ok(Surface::from_rgba(width, height, rgba_img.into_raw()))
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or the
/// orientation cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => {
            if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                if let Some(value) = field.value.get_uint(0) {
                    return Orientation::from(value);
                }
            }
            Orientation::Normal
        }
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export;
    use crate::surface::Color;

    /// Encode a small gradient to JPEG in memory.
    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 40) as u8, 128])
        });
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 90);
        encoder.encode_image(&img).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png_round_trip() {
        let mut surface = Surface::new(6, 4);
        surface.fill_rect(0.0, 0.0, 3.0, 4.0, Color::rgb(200, 10, 30));
        let bytes = export::encode_png(&surface).unwrap();

        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.width(), 6);
        assert_eq!(decoded.height(), 4);
        assert_eq!(decoded.pixels(), surface.pixels());
    }

    #[test]
    fn test_decode_jpeg_dimensions() {
        let bytes = jpeg_bytes(5, 3);

        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.width(), 5);
        assert_eq!(decoded.height(), 3);
        // 4 bytes per pixel after RGBA conversion.
        assert_eq!(decoded.pixels().len(), 5 * 3 * 4);
    }

    #[test]
    fn test_decode_unrecognized_bytes() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        let result = decode_image(&[]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let surface = Surface::new(8, 8);
        let bytes = export::encode_png(&surface).unwrap();

        // Keep the signature so the sniffer says PNG, then cut the rest.
        let result = decode_image(&bytes[0..20]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_extraction_no_exif() {
        let bytes = jpeg_bytes(2, 2);
        assert_eq!(extract_orientation(&bytes), Orientation::Normal);
    }

    #[test]
    fn test_orientation_extraction_invalid_data() {
        assert_eq!(extract_orientation(&[0x00, 0x01, 0x02]), Orientation::Normal);
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal); // Invalid defaults to Normal
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps_dims() {
        let pixels = vec![
            255, 0, 0, 255, // Red (left)
            0, 255, 0, 255, // Green (right)
        ];
        let rgba_img = image::RgbaImage::from_raw(2, 1, pixels).unwrap();
        let img = DynamicImage::ImageRgba8(rgba_img);

        let result = apply_orientation(img, Orientation::Rotate90CW);

        assert_eq!(result.width(), 1);
        assert_eq!(result.height(), 2);
    }

    #[test]
    fn test_apply_orientation_rotate180_reverses() {
        let pixels = vec![
            255, 0, 0, 255, // Red (left)
            0, 255, 0, 255, // Green (right)
        ];
        let rgba_img = image::RgbaImage::from_raw(2, 1, pixels).unwrap();
        let img = DynamicImage::ImageRgba8(rgba_img);

        let result = apply_orientation(img, Orientation::Rotate180).into_rgba8();

        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]); // Green
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]); // Red
    }
}
