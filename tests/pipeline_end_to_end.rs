use markalign::align::pose;
use markalign::circles::select_pair;
use markalign::config::{
    AdaptiveMethod, AnchorRegion, ApproximationMode, BlurConfig, BlurKind, ContourConfig,
    DetectionConfig, GridConfig, HoughConfig, HoughMethod, MorphOp, MorphologyConfig,
    RetrievalMode, ThresholdConfig, ThresholdKind,
};
use markalign::{
    align, teach_origins, Circle, Frame, InspectOptions, InspectionConfig,
    Inspector, OwnedImage, Point, Rect,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const WIDTH: usize = 240;
const HEIGHT: usize = 120;
const BACKGROUND: u8 = 200;
const PLATE: u8 = 40;
const MARK: u8 = 230;

fn circle(x: i32, y: i32, radius: i32) -> Circle {
    Circle {
        center: Point::new(x, y),
        radius,
    }
}

/// Paints dark plates on a bright background with bright disks of radius 10.
fn paint(width: usize, height: usize, plates: &[Rect], marks: &[(i32, i32)]) -> Frame {
    let img = OwnedImage::from_fn(width, height, |x, y| {
        let p = Point::new(x as i32, y as i32);
        let on_plate = plates
            .iter()
            .any(|r| p.x >= r.x && p.x < r.x + r.width && p.y >= r.y && p.y < r.y + r.height);
        if !on_plate {
            return BACKGROUND;
        }
        let on_mark = marks.iter().any(|&(cx, cy)| {
            let (dx, dy) = (p.x - cx, p.y - cy);
            dx * dx + dy * dy <= 100
        });
        if on_mark {
            MARK
        } else {
            PLATE
        }
    })
    .unwrap();
    Frame::from_gray(img)
}

/// Two dark 80x80 plates; the left one carries two bright marks.
fn scene(sx: i32, sy: i32) -> Frame {
    let plates = [Rect::new(20 + sx, 20 + sy, 80, 80), Rect::new(140 + sx, 20 + sy, 80, 80)];
    let marks = [(50 + sx, 60 + sy), (80 + sx, 60 + sy)];
    paint(WIDTH, HEIGHT, &plates, &marks)
}

/// 2x2 grid of plates; the top-right plate carries a single mark.
fn grid_scene(sx: i32, sy: i32) -> Frame {
    let mut plates = Vec::new();
    let mut marks = Vec::new();
    for row in 0..2 {
        for col in 0..2 {
            let (x, y) = (20 + 120 * col + sx, 20 + 120 * row + sy);
            plates.push(Rect::new(x, y, 80, 80));
            marks.push((x + 30, y + 40));
            if (row, col) != (0, 1) {
                marks.push((x + 60, y + 40));
            }
        }
    }
    paint(240, 240, &plates, &marks)
}

fn grid_config() -> InspectionConfig {
    let mut cfg = scene_config();
    cfg.grid = GridConfig {
        rows: 2,
        columns: 2,
    };
    cfg.regions.clear();
    for id in 0..4 {
        let (row, col) = ((id / 2) as i32, (id % 2) as i32);
        cfg.regions.insert(
            id,
            AnchorRegion {
                label: format!("plate-{id}"),
                rect: Rect::new(120 * col, 120 * row, 120, 120),
            },
        );
    }
    cfg
}

fn scene_config() -> InspectionConfig {
    let mut cfg = InspectionConfig {
        blur: BlurConfig {
            kind: BlurKind::Average,
            ksize: 1,
        },
        threshold: ThresholdConfig {
            adaptive: AdaptiveMethod::Mean,
            kind: ThresholdKind::BinaryInverted,
            block_size: 151,
            c: 5,
        },
        morphological: MorphologyConfig {
            op: MorphOp::Dilate,
            kernel_size: 1,
            iterations: 1,
        },
        contour: ContourConfig {
            retrieval_mode: RetrievalMode::External,
            approximation_mode: ApproximationMode::Simple,
        },
        detection: DetectionConfig {
            area_min: 5000.0,
            area_max: 8000.0,
            max_aspect_skew: 5.0,
        },
        grid: GridConfig {
            rows: 1,
            columns: 2,
        },
        hough: HoughConfig {
            blur: BlurKind::Gaussian,
            ksize: 3,
            method: HoughMethod::Gradient,
            dp: 1.0,
            min_dist: 15.0,
            param1: 100.0,
            param2: 40.0,
            min_radius: 6,
            max_radius: 14,
        },
        ..InspectionConfig::default()
    };
    cfg.regions.insert(
        0,
        AnchorRegion {
            label: "left".to_string(),
            rect: Rect::new(0, 0, 120, 120),
        },
    );
    cfg.regions.insert(
        1,
        AnchorRegion {
            label: "right".to_string(),
            rect: Rect::new(120, 0, 120, 120),
        },
    );
    cfg
}

#[test]
fn constructed_pair_aligned_with_its_origin() {
    let circles = [circle(10, 10, 5), circle(30, 10, 5)];
    let pair = select_pair(&circles, 20, 20).unwrap();
    assert_eq!(pair.first.center, Point::new(10, 10));
    let origin = pose((10, 10), (20, 0));
    let alignment = align(&origin, Some(&pair.pose())).unwrap();
    assert_eq!(alignment.to_string(), "0,0,0.00");
}

#[test]
fn constructed_pair_reports_shift() {
    let circles = [circle(15, 10, 5), circle(35, 10, 5)];
    let pair = select_pair(&circles, 30, 20).unwrap();
    let origin = pose((10, 10), (20, 0));
    let alignment = align(&origin, Some(&pair.pose())).unwrap();
    assert_eq!((alignment.dx, alignment.dy), (5, 0));
    assert_eq!(alignment.to_string(), "5,0,0.00");
}

#[test]
fn scene_blobs_land_in_their_regions() {
    let cfg = Arc::new(scene_config());
    let result = Inspector::new(cfg).inspect(Arc::new(scene(0, 0))).unwrap();
    let left = result.slot(0).unwrap().blob.as_ref().unwrap();
    let right = result.slot(1).unwrap().blob.as_ref().unwrap();
    assert_eq!(left.bbox, Rect::new(20, 20, 80, 80));
    assert_eq!(right.bbox, Rect::new(140, 20, 80, 80));
    assert!(result.slot(0).unwrap().pair.is_some());
    assert!(result.slot(1).unwrap().pair.is_none());
    assert!(result.annotated.is_some());
}

#[test]
fn taught_scene_reports_exact_shift() {
    let mut cfg = scene_config();
    let origins = teach_origins(Arc::new(scene(0, 0)), Arc::new(cfg.clone())).unwrap();
    assert_eq!(origins.keys().copied().collect::<Vec<_>>(), vec![0]);
    cfg.origins = origins;

    let inspector = Inspector::new(Arc::new(cfg)).with_options(InspectOptions {
        parallel: false,
        render: false,
    });
    let same = inspector.inspect(Arc::new(scene(0, 0))).unwrap();
    assert_eq!(same.message, "0,0,0.00_None");

    let shifted = inspector.inspect(Arc::new(scene(5, 0))).unwrap();
    assert_eq!(shifted.message, "5,0,0.00_None");
    assert!(shifted.annotated.is_none());
}

#[test]
fn random_shifts_are_recovered_exactly() {
    let mut cfg = scene_config();
    cfg.origins = teach_origins(Arc::new(scene(0, 0)), Arc::new(cfg.clone())).unwrap();
    let inspector = Inspector::new(Arc::new(cfg)).with_options(InspectOptions {
        parallel: false,
        render: false,
    });

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..6 {
        let sx = rng.random_range(-15..=15);
        let sy = rng.random_range(-10..=10);
        let result = inspector.inspect(Arc::new(scene(sx, sy))).unwrap();
        assert_eq!(result.message, format!("{sx},{sy},0.00_None"));
    }
}

#[test]
fn grid_with_a_lone_mark_reports_none_for_that_region() {
    let mut cfg = grid_config();
    let origins = teach_origins(Arc::new(grid_scene(0, 0)), Arc::new(cfg.clone())).unwrap();
    assert_eq!(origins.keys().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
    cfg.origins = origins;
    // An origin alone cannot make a single mark align.
    cfg.origins.insert(1, pose((170, 60), (30, 0)));

    let inspector = Inspector::new(Arc::new(cfg)).with_options(InspectOptions {
        parallel: false,
        render: false,
    });
    let same = inspector.inspect(Arc::new(grid_scene(0, 0))).unwrap();
    assert!(same.slot(1).unwrap().blob.is_some());
    assert!(same.slot(1).unwrap().pair.is_none());
    assert_eq!(same.message, "0,0,0.00_None_0,0,0.00_0,0,0.00");

    let shifted = inspector.inspect(Arc::new(grid_scene(5, 0))).unwrap();
    assert_eq!(shifted.message, "5,0,0.00_None_5,0,0.00_5,0,0.00");

    let diagonal = inspector.inspect(Arc::new(grid_scene(-4, 3))).unwrap();
    assert_eq!(diagonal.message, "-4,3,0.00_None_-4,3,0.00_-4,3,0.00");
}
