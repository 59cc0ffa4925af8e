use markalign::align::pose;
use markalign::blob::{accepts, assign_region};
use markalign::config::{AnchorRegion, DetectionConfig};
use markalign::filter::normalize_odd;
use markalign::{align, ImageView, InspectionConfig, MarkAlignError, Point, Rect};
use std::collections::BTreeMap;

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        MarkAlignError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, MarkAlignError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_reads_through_stride() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();

    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!(roi.stride(), 4);
    assert_eq!(roi.row(1).unwrap(), &[9u8, 10u8]);
    assert!(view.roi(3, 3, 2, 2).is_err());
}

#[test]
fn kernel_sizes_are_forced_odd() {
    assert_eq!(normalize_odd(4), 5);
    assert_eq!(normalize_odd(5), 5);
    assert_eq!(normalize_odd(0), 1);
}

#[test]
fn area_filter_is_inclusive_on_both_bounds() {
    let detection = DetectionConfig {
        area_min: 100.0,
        area_max: 400.0,
        max_aspect_skew: 5.0,
    };
    assert!(accepts(&Rect::new(0, 0, 10, 10), &detection));
    assert!(accepts(&Rect::new(0, 0, 20, 20), &detection));
    assert!(!accepts(&Rect::new(0, 0, 21, 20), &detection));
    assert!(!accepts(&Rect::new(0, 0, 9, 10), &detection));
    // skew of exactly the limit is rejected
    assert!(!accepts(&Rect::new(0, 0, 15, 10), &detection));
}

#[test]
fn region_assignment_prefers_lowest_id_on_shared_edge() {
    let mut regions = BTreeMap::new();
    regions.insert(
        1,
        AnchorRegion {
            label: "right".into(),
            rect: Rect::new(100, 0, 100, 100),
        },
    );
    regions.insert(
        0,
        AnchorRegion {
            label: "left".into(),
            rect: Rect::new(0, 0, 100, 100),
        },
    );
    assert_eq!(assign_region(Point::new(100, 50), &regions), Some(0));
    assert_eq!(assign_region(Point::new(101, 50), &regions), Some(1));
    assert_eq!(assign_region(Point::new(250, 50), &regions), None);
}

#[test]
fn rotation_wraps_across_the_half_turn() {
    let origin = pose((0, 0), (-10, -1));
    let current = pose((0, 0), (-10, 1));
    let a = align(&origin, Some(&current)).unwrap();
    assert!((a.dtheta + 11.4212).abs() < 1e-3);
    assert_eq!(a.to_string(), "0,0,-11.42");
    let back = align(&current, Some(&origin)).unwrap();
    assert_eq!(back.to_string(), "0,0,11.42");
}

#[test]
fn default_config_round_trips_through_json() {
    let cfg = InspectionConfig::default();
    let text = cfg.to_json_pretty().unwrap();
    assert_eq!(InspectionConfig::from_json_str(&text).unwrap(), cfg);
}
