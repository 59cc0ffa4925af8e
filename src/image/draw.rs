//! Minimal raster drawing for annotated debug output.

use crate::geometry::{Point, Rect};
use crate::image::Frame;

/// Box outline color.
pub const GREEN: [u8; 3] = [0, 255, 0];
/// Circle and arrow color.
pub const RED: [u8; 3] = [255, 0, 0];
/// Anchor region outline color.
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Draws a rectangle outline whose stroke grows inwards from `rect`.
///
/// Only the part of the outline inside the frame is visited.
pub fn draw_rect(frame: &mut Frame, rect: Rect, color: [u8; 3], thickness: i32) {
    if rect.width <= 0 || rect.height <= 0 {
        return;
    }
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    let (x1, y1) = (x0 + rect.width as i64 - 1, y0 + rect.height as i64 - 1);
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let xs = x0.max(0)..=x1.min(w - 1);
    let ys = y0.max(0)..=y1.min(h - 1);
    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            frame.put_pixel(x as i32, y as i32, color);
        }
    };
    for t in 0..thickness.max(1) as i64 {
        for x in xs.clone() {
            put(x, y0 + t);
            put(x, y1 - t);
        }
        for y in ys.clone() {
            put(x0 + t, y);
            put(x1 - t, y);
        }
    }
}

/// Draws a ring of the given stroke thickness centered on `radius`.
pub fn draw_circle(frame: &mut Frame, center: Point, radius: i32, color: [u8; 3], thickness: i32) {
    let half = thickness.max(1) as f64 * 0.5;
    let r_outer = radius as f64 + half;
    let r_inner = (radius as f64 - half).max(0.0);
    let (outer_sq, inner_sq) = (r_outer * r_outer, r_inner * r_inner);
    let reach = r_outer.ceil() as i32;
    for y in (center.y - reach)..=(center.y + reach) {
        for x in (center.x - reach)..=(center.x + reach) {
            let dx = (x - center.x) as f64;
            let dy = (y - center.y) as f64;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq <= outer_sq && dist_sq >= inner_sq {
                frame.put_pixel(x, y, color);
            }
        }
    }
}

/// Draws a thick line with Bresenham stepping and square brushes.
pub fn draw_line(frame: &mut Frame, from: Point, to: Point, color: [u8; 3], thickness: i32) {
    let half = (thickness.max(1) - 1) / 2;
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        for by in -half..=half {
            for bx in -half..=half {
                frame.put_pixel(x + bx, y + by, color);
            }
        }
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draws a line with a two-stroke arrow head at `to`.
pub fn draw_arrow(frame: &mut Frame, from: Point, to: Point, color: [u8; 3], thickness: i32) {
    draw_line(frame, from, to, color, thickness);
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return;
    }
    let tip = (len * 0.1).max(3.0);
    let angle = dy.atan2(dx);
    for side in [-1.0f64, 1.0] {
        let a = angle + std::f64::consts::PI + side * std::f64::consts::FRAC_PI_6;
        let head = Point::new(
            (to.x as f64 + tip * a.cos()).round() as i32,
            (to.y as f64 + tip * a.sin()).round() as i32,
        );
        draw_line(frame, to, head, color, thickness);
    }
}

/// Height of a glyph cell in font pixels.
pub const GLYPH_HEIGHT: i32 = 7;
/// Horizontal advance per character in font pixels.
pub const GLYPH_ADVANCE: i32 = 6;

/// 5x7 bitmap rows, bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 7]> {
    Some(match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        _ => return None,
    })
}

/// Draws `text` with its bottom-left corner at `origin`, each font pixel a
/// `scale`-sized square.
///
/// Covers digits, `-.,:` and the letters of `BOXES`; other characters
/// advance without drawing.
pub fn draw_text(frame: &mut Frame, origin: Point, text: &str, color: [u8; 3], scale: i32) {
    let scale = scale.max(1);
    let top = origin.y.saturating_sub(GLYPH_HEIGHT * scale);
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let left = origin
            .x
            .saturating_add((i as i32).saturating_mul(GLYPH_ADVANCE * scale));
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let (x, y) = (left + col * scale, top + row as i32 * scale);
                for by in 0..scale {
                    for bx in 0..scale {
                        frame.put_pixel(x + bx, y + by, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{draw_circle, draw_line, draw_rect, draw_text, GLYPH_ADVANCE, GREEN};
    use crate::geometry::{Point, Rect};
    use crate::image::{Frame, PixelLayout};

    fn blank(width: usize, height: usize) -> Frame {
        Frame::new(vec![0; width * height * 3], width, height, PixelLayout::Rgb).unwrap()
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * frame.width() + x) * 3;
        [frame.data()[idx], frame.data()[idx + 1], frame.data()[idx + 2]]
    }

    #[test]
    fn huge_rect_is_clipped_to_the_frame() {
        let mut frame = blank(6, 4);
        draw_rect(&mut frame, Rect::new(-3, 1, i32::MAX, i32::MAX), GREEN, 1);
        assert_eq!(pixel(&frame, 0, 1), GREEN);
        assert_eq!(pixel(&frame, 5, 1), GREEN);
        assert_eq!(pixel(&frame, 2, 2), [0, 0, 0]);
    }

    #[test]
    fn rect_outline_leaves_interior_untouched() {
        let mut frame = blank(10, 10);
        draw_rect(&mut frame, Rect::new(2, 2, 5, 5), GREEN, 1);
        assert_eq!(pixel(&frame, 2, 2), GREEN);
        assert_eq!(pixel(&frame, 6, 6), GREEN);
        assert_eq!(pixel(&frame, 4, 4), [0, 0, 0]);
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = blank(10, 10);
        draw_line(&mut frame, Point::new(1, 1), Point::new(8, 5), GREEN, 1);
        assert_eq!(pixel(&frame, 1, 1), GREEN);
        assert_eq!(pixel(&frame, 8, 5), GREEN);
    }

    #[test]
    fn circle_clips_at_frame_border() {
        let mut frame = blank(8, 8);
        draw_circle(&mut frame, Point::new(0, 0), 5, GREEN, 1);
        assert_eq!(pixel(&frame, 5, 0), GREEN);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn text_is_drawn_above_its_origin() {
        let mut frame = blank(20, 10);
        draw_text(&mut frame, Point::new(0, 8), "1-", GREEN, 1);
        // '1': top row is the single center pixel, bottom row spans three.
        assert_eq!(pixel(&frame, 2, 1), GREEN);
        assert_eq!(pixel(&frame, 0, 1), [0, 0, 0]);
        assert_eq!(pixel(&frame, 1, 7), GREEN);
        assert_eq!(pixel(&frame, 3, 7), GREEN);
        assert_eq!(pixel(&frame, 2, 8), [0, 0, 0]);
        // '-' sits in the middle row of the second cell.
        let left = GLYPH_ADVANCE as usize;
        assert!((left..left + 5).all(|x| pixel(&frame, x, 4) == GREEN));
        assert_eq!(pixel(&frame, left, 3), [0, 0, 0]);
    }

    #[test]
    fn text_scale_enlarges_font_pixels() {
        let mut frame = blank(16, 16);
        draw_text(&mut frame, Point::new(0, 14), ".", GREEN, 2);
        // '.' occupies columns 1..=2 of rows 5..=6, doubled.
        for (x, y) in [(2, 10), (5, 10), (2, 13), (5, 13)] {
            assert_eq!(pixel(&frame, x, y), GREEN, "({x}, {y})");
        }
        assert_eq!(pixel(&frame, 1, 10), [0, 0, 0]);
        assert_eq!(pixel(&frame, 6, 13), [0, 0, 0]);
    }
}
