use crate::config::InspectionConfig;
use crate::geometry::Point;
use crate::image::draw::{draw_arrow, draw_circle, draw_rect, draw_text, BLUE, GREEN, RED};
use crate::image::Frame;
use crate::inspect::InspectionResult;

const BOX_LABEL_SCALE: i32 = 2;
const ALIGNMENT_SCALE: i32 = 1;

/// Annotated RGB copy of `source`.
///
/// Anchor regions are outlined in blue, assigned blobs in green with a
/// `Boxes: <id>` label on their top-left corner; detected circles and the
/// first-to-second arrow are drawn in red, and the `dx,dy,dtheta` of a
/// region is written in blue at its first circle.
pub fn render(source: &Frame, cfg: &InspectionConfig, result: &InspectionResult) -> Frame {
    let mut out = source.to_rgb();
    for region in cfg.regions.values() {
        draw_rect(&mut out, region.rect, BLUE, 2);
    }
    for (id, slot) in result.slots.iter().enumerate() {
        if let Some(blob) = &slot.blob {
            draw_rect(&mut out, blob.bbox, GREEN, 3);
            let corner = Point::new(blob.bbox.x, blob.bbox.y);
            draw_text(&mut out, corner, &format!("Boxes: {id}"), GREEN, BOX_LABEL_SCALE);
        }
        if let Some(pair) = &slot.pair {
            for circle in [pair.first, pair.second] {
                draw_circle(&mut out, circle.center, circle.radius, RED, 2);
            }
            draw_arrow(&mut out, pair.first.center, pair.second.center, RED, 2);
            if let Some(alignment) = &slot.alignment {
                let text = alignment.to_string();
                draw_text(&mut out, pair.first.center, &text, BLUE, ALIGNMENT_SCALE);
            }
        }
    }
    out
}
