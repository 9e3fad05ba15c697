//! Brand watermark compositing.
//!
//! Draws a semi-transparent play glyph in the center of the frame and a
//! smaller mark in the lower-right corner, blending in place.

use image::{Rgba, RgbaImage};

const BRAND_COLOR: [u8; 3] = [255, 255, 255];
/// Corner mark renders fainter than the center glyph.
const CORNER_ALPHA_SCALE: f32 = 0.6;

/// Overlay the brand glyph and corner mark onto the frame.
///
/// `opacity` is the center glyph alpha in `[0, 1]`.
pub fn composite(frame: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let min_dim = width.min(height);

    // Centered play triangle, roughly a quarter of the short side.
    let size = (min_dim / 4).max(4) as i32;
    let cx = width as i32 / 2;
    let cy = height as i32 / 2;
    draw_play_glyph(frame, cx, cy, size, opacity);

    // Corner mark: a small solid bar inset from the lower-right corner.
    let bar_w = (min_dim / 8).max(2);
    let bar_h = (min_dim / 32).max(1);
    let margin = (min_dim / 20).max(2);
    let x0 = width.saturating_sub(bar_w + margin);
    let y0 = height.saturating_sub(bar_h + margin);
    draw_bar(frame, x0, y0, bar_w, bar_h, opacity * CORNER_ALPHA_SCALE);
}

fn draw_play_glyph(frame: &mut RgbaImage, cx: i32, cy: i32, size: i32, alpha: f32) {
    // Right-pointing triangle centered on (cx, cy).
    let a = (cx - size / 3, cy - size / 2);
    let b = (cx - size / 3, cy + size / 2);
    let c = (cx + 2 * size / 3, cy);

    let (width, height) = frame.dimensions();
    let min_x = a.0.min(c.0).max(0);
    let max_x = a.0.max(c.0).min(width as i32 - 1);
    let min_y = a.1.min(b.1).max(0);
    let max_y = a.1.max(b.1).min(height as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_triangle((x, y), a, b, c) {
                blend(frame.get_pixel_mut(x as u32, y as u32), alpha);
            }
        }
    }
}

fn draw_bar(frame: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, alpha: f32) {
    let (width, height) = frame.dimensions();
    for y in y0..(y0 + h).min(height) {
        for x in x0..(x0 + w).min(width) {
            blend(frame.get_pixel_mut(x, y), alpha);
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, alpha: f32) {
    for (channel, brand) in pixel.0.iter_mut().take(3).zip(BRAND_COLOR) {
        let blended = *channel as f32 * (1.0 - alpha) + brand as f32 * alpha;
        *channel = blended.round() as u8;
    }
}

fn point_in_triangle(p: (i32, i32), a: (i32, i32), b: (i32, i32), c: (i32, i32)) -> bool {
    let sign = |p1: (i32, i32), p2: (i32, i32), p3: (i32, i32)| -> i64 {
        (p1.0 - p3.0) as i64 * (p2.1 - p3.1) as i64 - (p2.0 - p3.0) as i64 * (p1.1 - p3.1) as i64
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0 || d2 < 0 || d3 < 0;
    let has_pos = d1 > 0 || d2 > 0 || d3 > 0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_center_glyph_lightens_center_pixel() {
        let mut frame = black_frame(200, 100);
        composite(&mut frame, 0.5);
        let center = frame.get_pixel(100, 50);
        assert!(center.0[0] > 0);
    }

    #[test]
    fn test_corner_mark_drawn_near_lower_right() {
        let mut frame = black_frame(200, 100);
        composite(&mut frame, 0.5);
        // Inside the corner bar: short side 100, margin 5, bar 12x3.
        let corner = frame.get_pixel(190, 93);
        assert!(corner.0[0] > 0);
    }

    #[test]
    fn test_edges_left_untouched() {
        let mut frame = black_frame(200, 100);
        composite(&mut frame, 0.5);
        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(frame.get_pixel(199, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_dimensions_preserved_and_zero_opacity_is_noop() {
        let mut frame = black_frame(64, 48);
        composite(&mut frame, 0.0);
        assert_eq!(frame.dimensions(), (64, 48));
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_tiny_frame_does_not_panic() {
        let mut frame = black_frame(2, 2);
        composite(&mut frame, 0.8);
    }
}
