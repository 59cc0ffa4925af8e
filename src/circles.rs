//! Circle pair detection inside one region of a frame.

use crate::align::MarkerPose;
use crate::config::{BlurConfig, HoughConfig};
use crate::filter::apply_blur;
use crate::geometry::{Point, Rect};
use crate::hough::{detect_circles, Circle};
use crate::image::Frame;
use crate::util::MarkAlignResult;
use serde::{Deserialize, Serialize};

/// Two circles marking position and direction of a part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CirclePair {
    /// Circle closest to the middle of the searched area.
    pub first: Circle,
    /// Circle closest to `first`.
    pub second: Circle,
}

impl CirclePair {
    /// Pose anchored at the first center, pointing at the second.
    pub fn pose(&self) -> MarkerPose {
        MarkerPose {
            center: self.first.center,
            direction: self.first.center.to(self.second.center),
        }
    }

    /// Shifts both circles by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        let shift = |c: Circle| Circle {
            center: c.center.offset(dx, dy),
            radius: c.radius,
        };
        Self {
            first: shift(self.first),
            second: shift(self.second),
        }
    }
}

/// Picks the pair from circles detected in a `width x height` area.
///
/// `first` is the circle nearest the area center `(width / 2, height / 2)`,
/// `second` the remaining circle nearest `first`. Earlier circles win ties.
pub fn select_pair(circles: &[Circle], width: i32, height: i32) -> Option<CirclePair> {
    if circles.len() < 2 {
        return None;
    }
    let middle = Point::new(width / 2, height / 2);
    let first_idx = nearest(circles, middle, None)?;
    let first = circles[first_idx];
    let second_idx = nearest(circles, first.center, Some(first_idx))?;
    Some(CirclePair {
        first,
        second: circles[second_idx],
    })
}

fn nearest(circles: &[Circle], target: Point, skip: Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in circles.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        let d = c.center.distance(target);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Detects a circle pair inside `area`, in frame coordinates.
///
/// The area is clamped to the frame; an empty intersection or fewer than two
/// circles yield `Ok(None)`.
pub fn find_circle_pair(
    frame: &Frame,
    area: Rect,
    cfg: &HoughConfig,
) -> MarkAlignResult<Option<CirclePair>> {
    let Some((crop, used)) = frame.crop(area) else {
        return Ok(None);
    };
    let gray = crop.to_gray();
    let blur = BlurConfig {
        kind: cfg.blur,
        ksize: cfg.ksize,
    };
    let smooth = apply_blur(gray.view(), &blur)?;
    let circles = detect_circles(smooth.view(), cfg)?;
    let pair = select_pair(&circles, used.width, used.height);
    Ok(pair.map(|p| p.translate(used.x, used.y)))
}
