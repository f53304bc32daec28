//! RGBA8 raster surface.
//!
//! The drawing model mirrors the subset of the 2D canvas API the editor
//! actually uses: rectangle fills with source-over blending, circle dots,
//! thick polylines, even-odd polygon fills, and a scaled image blit. The
//! buffer is row-major RGBA, `width * height * 4` bytes, and starts fully
//! transparent like a fresh canvas element.
//!
//! Coordinates are `f64` and get rounded to the pixel grid at the edges of
//! each primitive; everything is clipped to the surface, so out-of-bounds
//! drawing is safe and simply discarded.

use serde::{Deserialize, Serialize};

/// An RGBA color, straight-alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from all four components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// The same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse a `#rrggbb` string into an opaque color, best effort.
    ///
    /// The first character is dropped unconditionally (the `#`), then hex
    /// digit pairs are folded case-insensitively. Non-hex characters and
    /// missing characters count as zero, so malformed input degrades to a
    /// garbage color instead of an error.
    pub fn from_hex(hex: &str) -> Self {
        fn nibble(c: Option<char>) -> u8 {
            c.and_then(|c| c.to_digit(16)).unwrap_or(0) as u8
        }

        let mut chars = hex.chars().skip(1);
        let mut channel = || {
            let hi = nibble(chars.next());
            let lo = nibble(chars.next());
            hi * 16 + lo
        };

        let r = channel();
        let g = channel();
        let b = channel();
        Self { r, g, b, a: 255 }
    }
}

/// A row-major RGBA8 pixel buffer with clipped drawing primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Wrap an existing RGBA buffer. `pixels` must hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel data must be width * height * 4 bytes"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// The color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some(Color::rgba(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Fill an axis-aligned rectangle with source-over blending.
    ///
    /// Negative sizes extend in the negative direction (the rectangle is
    /// normalized first); the fill is clipped to the surface.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };

        let x0 = (x.round() as i64).max(0);
        let y0 = (y.round() as i64).max(0);
        let x1 = ((x + width).round() as i64).min(self.width as i64);
        let y1 = ((y + height).round() as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        if color.a == 255 {
            // Opaque fast path: overwrite whole rows
            for py in y0..y1 {
                let row = (py as usize) * (self.width as usize);
                for px in x0..x1 {
                    let i = (row + px as usize) * 4;
                    self.pixels[i] = color.r;
                    self.pixels[i + 1] = color.g;
                    self.pixels[i + 2] = color.b;
                    self.pixels[i + 3] = 255;
                }
            }
        } else {
            for py in y0..y1 {
                for px in x0..x1 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Fill a circle centered at `(cx, cy)`.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }
        let x0 = ((cx - radius).floor() as i64).max(0);
        let y0 = ((cy - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64 + 1).min(self.width as i64);
        let y1 = ((cy + radius).ceil() as i64 + 1).min(self.height as i64);
        let r_sq = radius * radius;

        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at the pixel center
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r_sq {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Stroke an open polyline by stamping round caps along each segment.
    ///
    /// Overlapping stamps blend twice, so translucent stroke colors darken
    /// at the joins; the editor strokes opaquely.
    pub fn stroke_polyline(&mut self, path: &[(f64, f64)], width: f64, color: Color) {
        if path.len() < 2 || width <= 0.0 {
            return;
        }
        let radius = width / 2.0;
        let step = (radius / 2.0).max(0.5);

        for pair in path.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
            let count = (len / step).ceil() as usize;
            for i in 0..=count {
                let t = if count == 0 { 0.0 } else { i as f64 / count as f64 };
                self.fill_circle(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, radius, color);
            }
        }
    }

    /// Fill a closed polygon using even-odd scanline coverage. The path is
    /// closed implicitly from the last vertex back to the first.
    pub fn fill_polygon(&mut self, path: &[(f64, f64)], color: Color) {
        if path.len() < 3 {
            return;
        }

        let min_y = path.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = path.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let y0 = (min_y.floor() as i64).max(0);
        let y1 = (max_y.ceil() as i64 + 1).min(self.height as i64);

        let mut crossings: Vec<f64> = Vec::new();
        for py in y0..y1 {
            let sy = py as f64 + 0.5;
            crossings.clear();

            for (i, &(ax, ay)) in path.iter().enumerate() {
                let (bx, by) = path[(i + 1) % path.len()];
                if (ay <= sy) != (by <= sy) {
                    crossings.push(ax + (sy - ay) * (bx - ax) / (by - ay));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let start = ((span[0] - 0.5).ceil() as i64).max(0);
                let end = ((span[1] - 0.5).floor() as i64).min(self.width as i64 - 1);
                for px in start..=end {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Draw `src` scaled into the rectangle at `(x, y)` with the given size,
    /// compositing source-over. Resampling is bilinear.
    pub fn draw_surface(&mut self, src: &Surface, x: f64, y: f64, width: f64, height: f64) {
        let dw = width.round() as i64;
        let dh = height.round() as i64;
        if dw <= 0 || dh <= 0 || src.width == 0 || src.height == 0 {
            return;
        }

        let scaled;
        let source = if dw == src.width as i64 && dh == src.height as i64 {
            src
        } else {
            let Some(buffer) =
                image::RgbaImage::from_raw(src.width, src.height, src.pixels.clone())
            else {
                return;
            };
            let resized = image::imageops::resize(
                &buffer,
                dw as u32,
                dh as u32,
                image::imageops::FilterType::Triangle,
            );
            scaled = Surface::from_rgba(dw as u32, dh as u32, resized.into_raw());
            &scaled
        };

        let dx = x.round() as i64;
        let dy = y.round() as i64;
        for row in 0..dh {
            for col in 0..dw {
                let i = ((row as usize) * (source.width as usize) + (col as usize)) * 4;
                let color = Color::rgba(
                    source.pixels[i],
                    source.pixels[i + 1],
                    source.pixels[i + 2],
                    source.pixels[i + 3],
                );
                self.blend_pixel(dx + col, dy + row, color);
            }
        }
    }

    /// Source-over blend of `color` onto `(x, y)`, ignoring out-of-bounds
    /// coordinates.
    fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;

        let sa = color.a as u32;
        if sa == 255 {
            self.pixels[i] = color.r;
            self.pixels[i + 1] = color.g;
            self.pixels[i + 2] = color.b;
            self.pixels[i + 3] = 255;
            return;
        }
        if sa == 0 {
            return;
        }

        let da = self.pixels[i + 3] as u32;
        let da_inv = da * (255 - sa) / 255;
        let out_a = sa + da_inv;
        if out_a == 0 {
            return;
        }

        let blend = |src: u8, dst: u8| -> u8 {
            ((src as u32 * sa + dst as u32 * da_inv) / out_a) as u8
        };
        self.pixels[i] = blend(color.r, self.pixels[i]);
        self.pixels[i + 1] = blend(color.g, self.pixels[i + 1]);
        self.pixels[i + 2] = blend(color.b, self.pixels[i + 2]);
        self.pixels[i + 3] = out_a as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_transparent() {
        let s = Surface::new(4, 3);

        assert_eq!(s.width(), 4);
        assert_eq!(s.height(), 3);
        assert_eq!(s.pixels().len(), 4 * 3 * 4);
        assert!(s.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_hex_lower_and_upper() {
        assert_eq!(Color::from_hex("#ff8000"), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("#FF8000"), Color::rgb(255, 128, 0));
    }

    #[test]
    fn test_from_hex_garbage_degrades_to_zero() {
        assert_eq!(Color::from_hex("#zzzzzz"), Color::rgb(0, 0, 0));
        // A lone half-channel still folds: 'f' becomes the high nibble.
        assert_eq!(Color::from_hex("#f"), Color::rgb(240, 0, 0));
        assert_eq!(Color::from_hex(""), Color::rgb(0, 0, 0));
    }

    #[test]
    fn test_with_alpha() {
        let c = Color::rgb(10, 20, 30).with_alpha(127);
        assert_eq!(c, Color::rgba(10, 20, 30, 127));
    }

    #[test]
    fn test_fill_rect_covers_expected_pixels() {
        let mut s = Surface::new(10, 10);
        s.fill_rect(2.0, 3.0, 4.0, 2.0, Color::rgb(255, 0, 0));

        assert_eq!(s.pixel(2, 3), Some(Color::rgb(255, 0, 0)));
        assert_eq!(s.pixel(5, 4), Some(Color::rgb(255, 0, 0)));
        assert_eq!(s.pixel(6, 3), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(s.pixel(2, 5), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_fill_rect_clips_to_surface() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(-100.0, -100.0, 1000.0, 1000.0, Color::rgb(1, 2, 3));

        assert!(s.pixels().chunks(4).all(|p| p == [1, 2, 3, 255]));
    }

    #[test]
    fn test_fill_rect_normalizes_negative_sizes() {
        let mut s = Surface::new(10, 10);
        s.fill_rect(5.0, 5.0, -3.0, -3.0, Color::rgb(9, 9, 9));

        assert_eq!(s.pixel(2, 2), Some(Color::rgb(9, 9, 9)));
        assert_eq!(s.pixel(4, 4), Some(Color::rgb(9, 9, 9)));
        assert_eq!(s.pixel(5, 5), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_fill_rect_blends_translucent_over_opaque() {
        let mut s = Surface::new(2, 1);
        s.fill_rect(0.0, 0.0, 2.0, 1.0, Color::rgb(0, 0, 0));
        s.fill_rect(0.0, 0.0, 2.0, 1.0, Color::rgba(255, 255, 255, 127));

        let p = s.pixel(0, 0).unwrap();
        assert_eq!(p.a, 255);
        // Roughly half gray; integer blending rounds down.
        assert!((120..=130).contains(&p.r), "got {}", p.r);
    }

    #[test]
    fn test_translucent_fill_over_transparent_keeps_color() {
        let mut s = Surface::new(1, 1);
        s.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(200, 10, 10, 127));

        let p = s.pixel(0, 0).unwrap();
        assert_eq!(p.a, 127);
        assert_eq!(p.r, 200);
    }

    #[test]
    fn test_fill_circle() {
        let mut s = Surface::new(20, 20);
        s.fill_circle(10.0, 10.0, 5.0, Color::rgb(0, 255, 0));

        assert_eq!(s.pixel(10, 10), Some(Color::rgb(0, 255, 0)));
        assert_eq!(s.pixel(13, 10), Some(Color::rgb(0, 255, 0)));
        assert_eq!(s.pixel(17, 10), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(s.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_fill_circle_clips() {
        let mut s = Surface::new(4, 4);
        s.fill_circle(0.0, 0.0, 100.0, Color::rgb(5, 5, 5));
        assert!(s.pixels().chunks(4).all(|p| p == [5, 5, 5, 255]));
    }

    #[test]
    fn test_stroke_polyline_covers_segment() {
        let mut s = Surface::new(20, 10);
        s.stroke_polyline(&[(2.0, 5.0), (18.0, 5.0)], 2.0, Color::rgb(0, 0, 255));

        assert_eq!(s.pixel(10, 5), Some(Color::rgb(0, 0, 255)));
        assert_eq!(s.pixel(10, 0), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_fill_polygon_triangle() {
        let mut s = Surface::new(20, 20);
        s.fill_polygon(
            &[(2.0, 18.0), (18.0, 18.0), (10.0, 2.0)],
            Color::rgb(200, 100, 50),
        );

        // Centroid is inside, corners of the surface are outside.
        assert_eq!(s.pixel(10, 12), Some(Color::rgb(200, 100, 50)));
        assert_eq!(s.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(s.pixel(19, 0), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_fill_polygon_closes_implicitly() {
        let mut s = Surface::new(10, 10);
        // An open square outline as input; the fill closes it.
        s.fill_polygon(
            &[(1.0, 1.0), (9.0, 1.0), (9.0, 9.0), (1.0, 9.0)],
            Color::rgb(7, 7, 7),
        );

        assert_eq!(s.pixel(5, 5), Some(Color::rgb(7, 7, 7)));
    }

    #[test]
    fn test_fill_polygon_degenerate_input() {
        let mut s = Surface::new(10, 10);
        s.fill_polygon(&[(1.0, 1.0), (2.0, 2.0)], Color::rgb(1, 1, 1));
        assert!(s.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_surface_one_to_one() {
        let mut src = Surface::new(2, 2);
        src.fill_rect(0.0, 0.0, 2.0, 2.0, Color::rgb(10, 20, 30));

        let mut dst = Surface::new(4, 4);
        dst.draw_surface(&src, 1.0, 1.0, 2.0, 2.0);

        assert_eq!(dst.pixel(1, 1), Some(Color::rgb(10, 20, 30)));
        assert_eq!(dst.pixel(2, 2), Some(Color::rgb(10, 20, 30)));
        assert_eq!(dst.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(dst.pixel(3, 3), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_draw_surface_scales_up() {
        let mut src = Surface::new(2, 2);
        src.fill_rect(0.0, 0.0, 2.0, 2.0, Color::rgb(100, 100, 100));

        let mut dst = Surface::new(8, 8);
        dst.draw_surface(&src, 0.0, 0.0, 8.0, 8.0);

        assert_eq!(dst.pixel(0, 0), Some(Color::rgb(100, 100, 100)));
        assert_eq!(dst.pixel(7, 7), Some(Color::rgb(100, 100, 100)));
    }

    #[test]
    fn test_draw_surface_clips_at_edges() {
        let mut src = Surface::new(4, 4);
        src.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(50, 50, 50));

        let mut dst = Surface::new(4, 4);
        dst.draw_surface(&src, 2.0, 2.0, 4.0, 4.0);

        assert_eq!(dst.pixel(1, 1), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(dst.pixel(3, 3), Some(Color::rgb(50, 50, 50)));
    }

    #[test]
    fn test_clear() {
        let mut s = Surface::new(3, 3);
        s.fill_rect(0.0, 0.0, 3.0, 3.0, Color::rgb(1, 1, 1));
        s.clear();
        assert!(s.pixels().iter().all(|&b| b == 0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
