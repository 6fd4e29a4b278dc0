//! Alpha compositing of overlay images onto frames, plus the flat
//! decorations (phase border, "you lost" banner) drawn over them

use image::{Rgb, RgbImage, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Blend `overlay` onto `background` with its top-left corner at `(x, y)`.
///
/// Placements that would not fit entirely inside the background are skipped
/// and the background is left untouched; there is no partial clipping.
/// Returns whether the overlay was drawn.
pub fn composite(background: &mut RgbImage, overlay: &RgbaImage, x: i64, y: i64) -> bool {
    if !fits(background, overlay, x, y) {
        return false;
    }

    let (x, y) = (x as u32, y as u32);
    for (ox, oy, px) in overlay.enumerate_pixels() {
        let alpha = px[3] as f32 / 255.0;
        if alpha == 0.0 {
            continue;
        }
        let bg = background.get_pixel_mut(x + ox, y + oy);
        *bg = blend(*bg, [px[0], px[1], px[2]], alpha);
    }
    true
}

/// Blend `overlay` so that its centre lands on `(cx, cy)`
pub fn composite_centered(background: &mut RgbImage, overlay: &RgbaImage, cx: i64, cy: i64) -> bool {
    let x = cx - (overlay.width() / 2) as i64;
    let y = cy - (overlay.height() / 2) as i64;
    composite(background, overlay, x, y)
}

fn fits(background: &RgbImage, overlay: &RgbaImage, x: i64, y: i64) -> bool {
    x >= 0
        && y >= 0
        && x + overlay.width() as i64 <= background.width() as i64
        && y + overlay.height() as i64 <= background.height() as i64
}

fn blend(bg: Rgb<u8>, fg: [u8; 3], alpha: f32) -> Rgb<u8> {
    let mix = |f: u8, b: u8| (alpha * f as f32 + (1.0 - alpha) * b as f32).round().clamp(0.0, 255.0) as u8;
    Rgb([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2])])
}

/// Paint a solid border of `thickness` pixels inside the frame edges
pub fn draw_border(frame: &mut RgbImage, color: Rgb<u8>, thickness: u32) {
    let (w, h) = frame.dimensions();
    if thickness == 0 || w == 0 || h == 0 {
        return;
    }
    let t = thickness.min(w).min(h);
    draw_filled_rect_mut(frame, Rect::at(0, 0).of_size(w, t), color);
    draw_filled_rect_mut(frame, Rect::at(0, (h - t) as i32).of_size(w, t), color);
    draw_filled_rect_mut(frame, Rect::at(0, 0).of_size(t, h), color);
    draw_filled_rect_mut(frame, Rect::at((w - t) as i32, 0).of_size(t, h), color);
}

/// Full-width banner centred on row `center_y`, clipped to the frame
pub fn draw_banner(frame: &mut RgbImage, center_y: i32, height: u32, color: Rgb<u8>) {
    if height == 0 || frame.width() == 0 {
        return;
    }
    let top = center_y - (height / 2) as i32;
    draw_filled_rect_mut(frame, Rect::at(0, top).of_size(frame.width(), height), color);
}
