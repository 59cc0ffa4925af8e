//! Border following on binary masks.
//!
//! Borders come from `imageproc::contours`, a Suzuki–Abe topological border
//! follower: every border is labeled outer or hole and linked to the border
//! that encloses it. Retrieval modes then select borders and shape the
//! hierarchy, and the approximation mode thins each point chain.

use crate::config::{ApproximationMode, RetrievalMode};
use crate::geometry::{Point, Rect};
use crate::image::ImageView;
use imageproc::contours::{self, BorderType};

mod approx;

pub use approx::Curvature;

/// One extracted border.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    /// Border points after approximation, in traversal order.
    pub points: Vec<Point>,
    /// Bounding box of the full border, inclusive pixel extents.
    pub bbox: Rect,
    /// True for a border between a hole and its enclosing component.
    pub is_hole: bool,
    /// Index of the enclosing contour in the returned list, if reported.
    pub parent: Option<usize>,
}

/// Extracts contours from a mask where every non-zero pixel is foreground.
///
/// Contours are returned in raster discovery order.
pub fn find_contours(
    mask: ImageView<'_, u8>,
    retrieval: RetrievalMode,
    approximation: ApproximationMode,
) -> Vec<Contour> {
    let raw = contours::find_contours_with_threshold::<i32>(&mask.to_gray_image(), 0);

    let keep: Vec<usize> = match retrieval {
        RetrievalMode::External => raw
            .iter()
            .enumerate()
            .filter(|(_, c)| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|(i, _)| i)
            .collect(),
        _ => (0..raw.len()).collect(),
    };
    let mut out_index = vec![None; raw.len()];
    for (out, &i) in keep.iter().enumerate() {
        out_index[i] = Some(out);
    }
    let to_out = |parent: Option<usize>| parent.and_then(|p| out_index.get(p).copied().flatten());

    keep.iter()
        .map(|&i| {
            let border = &raw[i];
            let is_hole = border.border_type == BorderType::Hole;
            let parent = match retrieval {
                RetrievalMode::External | RetrievalMode::List => None,
                RetrievalMode::CComp if is_hole => to_out(border.parent),
                RetrievalMode::CComp => None,
                RetrievalMode::Tree => to_out(border.parent),
            };
            let chain: Vec<Point> = border.points.iter().map(|p| Point::new(p.x, p.y)).collect();
            Contour {
                bbox: Rect::bounding(&chain).unwrap_or_default(),
                points: approximate(&chain, approximation),
                is_hole,
                parent,
            }
        })
        .collect()
}

fn approximate(chain: &[Point], mode: ApproximationMode) -> Vec<Point> {
    match mode {
        ApproximationMode::None => chain.to_vec(),
        ApproximationMode::Simple => approx::simple(chain),
        ApproximationMode::Tc89L1 => approx::teh_chin(chain, Curvature::L1),
        ApproximationMode::Tc89Kcos => approx::teh_chin(chain, Curvature::KCos),
    }
}

#[cfg(test)]
mod tests {
    use super::find_contours;
    use crate::config::{ApproximationMode, RetrievalMode};
    use crate::geometry::{Point, Rect};
    use crate::image::OwnedImage;

    fn paint(img: &mut OwnedImage, rect: Rect, value: u8) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                img.set(x as usize, y as usize, value);
            }
        }
    }

    fn ring_with_dot() -> OwnedImage {
        let mut img = OwnedImage::filled(20, 20, 0).unwrap();
        paint(&mut img, Rect::new(2, 2, 16, 16), 255);
        paint(&mut img, Rect::new(5, 5, 10, 10), 0);
        paint(&mut img, Rect::new(9, 9, 2, 2), 255);
        img
    }

    #[test]
    fn filled_square_has_one_border_with_four_corners() {
        let mut img = OwnedImage::filled(5, 5, 0).unwrap();
        paint(&mut img, Rect::new(1, 1, 3, 3), 255);
        let contours = find_contours(img.view(), RetrievalMode::External, ApproximationMode::Simple);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.bbox, Rect::new(1, 1, 3, 3));
        assert!(!c.is_hole);
        let mut corners = c.points.clone();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![
                Point::new(1, 1),
                Point::new(3, 1),
                Point::new(1, 3),
                Point::new(3, 3)
            ]
        );
    }

    #[test]
    fn no_approximation_keeps_every_border_pixel() {
        let mut img = OwnedImage::filled(5, 5, 0).unwrap();
        paint(&mut img, Rect::new(1, 1, 3, 3), 255);
        let contours = find_contours(img.view(), RetrievalMode::List, ApproximationMode::None);
        assert_eq!(contours[0].points.len(), 8);
    }

    #[test]
    fn single_pixel_is_a_one_point_contour() {
        let mut img = OwnedImage::filled(3, 3, 0).unwrap();
        img.set(1, 1, 255);
        let contours = find_contours(img.view(), RetrievalMode::Tree, ApproximationMode::None);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point::new(1, 1)]);
        assert_eq!(contours[0].bbox, Rect::new(1, 1, 1, 1));
    }

    #[test]
    fn foreground_touching_the_image_edge_is_traced() {
        let img = OwnedImage::filled(4, 3, 255).unwrap();
        let contours = find_contours(img.view(), RetrievalMode::External, ApproximationMode::Simple);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bbox, Rect::new(0, 0, 4, 3));
    }

    #[test]
    fn external_reports_only_top_level_outer_borders() {
        let img = ring_with_dot();
        let contours = find_contours(img.view(), RetrievalMode::External, ApproximationMode::Simple);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bbox, Rect::new(2, 2, 16, 16));
        assert_eq!(contours[0].parent, None);
    }

    #[test]
    fn tree_links_hole_and_nested_component() {
        let img = ring_with_dot();
        let contours = find_contours(img.view(), RetrievalMode::Tree, ApproximationMode::Simple);
        assert_eq!(contours.len(), 3);
        assert!(!contours[0].is_hole);
        assert!(contours[1].is_hole);
        assert_eq!(contours[1].bbox, Rect::new(4, 4, 12, 12));
        assert_eq!(contours[1].parent, Some(0));
        assert!(!contours[2].is_hole);
        assert_eq!(contours[2].bbox, Rect::new(9, 9, 2, 2));
        assert_eq!(contours[2].parent, Some(1));
    }

    #[test]
    fn ccomp_keeps_two_levels() {
        let img = ring_with_dot();
        let contours = find_contours(img.view(), RetrievalMode::CComp, ApproximationMode::Simple);
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[1].parent, Some(0));
        assert_eq!(contours[2].parent, None);
        let list = find_contours(img.view(), RetrievalMode::List, ApproximationMode::Simple);
        assert!(list.iter().all(|c| c.parent.is_none()));
    }

    #[test]
    fn contours_come_in_raster_order() {
        let mut img = OwnedImage::filled(30, 10, 0).unwrap();
        paint(&mut img, Rect::new(20, 2, 4, 4), 255);
        paint(&mut img, Rect::new(2, 3, 4, 4), 255);
        let contours = find_contours(img.view(), RetrievalMode::External, ApproximationMode::None);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bbox.x, 20);
        assert_eq!(contours[1].bbox.x, 2);
    }

    #[test]
    fn teh_chin_keeps_square_corner() {
        let mut img = OwnedImage::filled(14, 14, 0).unwrap();
        paint(&mut img, Rect::new(2, 2, 10, 10), 255);
        let full = find_contours(img.view(), RetrievalMode::External, ApproximationMode::None);
        for mode in [ApproximationMode::Tc89Kcos, ApproximationMode::Tc89L1] {
            let contours = find_contours(img.view(), RetrievalMode::External, mode);
            let pts = &contours[0].points;
            assert!(!pts.is_empty());
            assert!(pts.len() <= full[0].points.len());
            assert!(pts.iter().all(|p| full[0].points.contains(p)));
            assert!(pts.contains(&Point::new(2, 2)), "{mode:?}");
        }
    }
}
