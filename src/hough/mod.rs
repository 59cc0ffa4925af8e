//! Gradient Hough circle transform.
//!
//! Edge pixels vote for centers along their gradient direction, both ways, at
//! every radius in the configured range. The accumulator is smoothed to find
//! maxima; each maximum is scored by the votes in its 3x3 neighborhood and
//! placed at their centroid. Every accepted center gets the radius best
//! supported by the edge pixels around it.

use crate::config::{HoughConfig, HoughMethod};
use crate::filter::FloatImage;
use crate::geometry::Point;
use crate::image::ImageView;
use crate::trace::trace_event;
use crate::util::{MarkAlignError, MarkAlignResult};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

mod canny;

pub use canny::{canny, sobel, EdgeMap};

/// Sigma of the accumulator smoothing used to locate maxima.
const ACCUMULATOR_SIGMA: f32 = 1.0;

/// Detected circle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: i32,
}

/// Accumulator maximum before radius estimation.
#[derive(Clone, Copy, Debug)]
struct Peak {
    bx: usize,
    by: usize,
    /// Votes in the 3x3 neighborhood of the bin.
    votes: u32,
    /// Vote centroid of the neighborhood, in pixels.
    cx: f64,
    cy: f64,
}

/// Detects circles in a gray plane.
///
/// Only the gradient methods are circle transforms; the other identifiers
/// fail with [`MarkAlignError::UnsupportedHoughMethod`]. `dp` below 1 is
/// treated as 1.
pub fn detect_circles(img: ImageView<'_, u8>, cfg: &HoughConfig) -> MarkAlignResult<Vec<Circle>> {
    match cfg.method {
        HoughMethod::Gradient | HoughMethod::GradientAlt => {}
        other => return Err(MarkAlignError::UnsupportedHoughMethod(other.name())),
    }
    if cfg.dp.is_nan() || cfg.dp.is_infinite() {
        return Err(MarkAlignError::InvalidParameter {
            name: "dp",
            reason: format!("must be finite, got {}", cfg.dp),
        });
    }
    let dp = cfg.dp.max(1.0);

    let (width, height) = (img.width(), img.height());
    let min_r = cfg.min_radius.max(1);
    let diagonal = (width as f64).hypot(height as f64).ceil() as i32;
    let max_r = if cfg.max_radius <= 0 {
        width.max(height) as i32
    } else {
        cfg.max_radius.min(diagonal)
    };
    if max_r < min_r {
        return Ok(Vec::new());
    }

    let edges = canny(img, cfg.param1 * 0.5, cfg.param1);
    let points: Vec<(f64, f64)> = edges
        .edge_points()
        .map(|(x, y)| (x as f64, y as f64))
        .collect();
    let acc = Accumulator::vote(&edges, dp, min_r, max_r);

    let circles = match cfg.method {
        HoughMethod::GradientAlt => {
            let mut scored: Vec<(f64, Peak, i32)> = acc
                .peaks(2)?
                .into_iter()
                .filter_map(|peak| {
                    let (radius, support) = fit_radius(&points, peak.cx, peak.cy, min_r, max_r)?;
                    let score = support as f64 / (2.0 * std::f64::consts::PI * radius as f64);
                    (score >= cfg.param2).then_some((score, peak, radius))
                })
                .collect();
            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| peak_cmp_desc(&a.1, &b.1))
            });
            let mut accepted: Vec<(f64, f64, Circle)> = Vec::new();
            for (_, peak, radius) in scored {
                if too_close(&accepted, peak.cx, peak.cy, cfg.min_dist) {
                    continue;
                }
                accepted.push((peak.cx, peak.cy, circle_at(peak.cx, peak.cy, radius)));
            }
            accepted.into_iter().map(|(_, _, c)| c).collect()
        }
        _ => {
            let threshold = cfg.param2.max(0.0);
            let mut peaks: Vec<Peak> = acc
                .peaks(0)?
                .into_iter()
                .filter(|p| p.votes as f64 > threshold)
                .collect();
            peaks.sort_by(peak_cmp_desc);
            let mut accepted: Vec<(f64, f64, Circle)> = Vec::new();
            for peak in peaks {
                if too_close(&accepted, peak.cx, peak.cy, cfg.min_dist) {
                    continue;
                }
                if let Some((radius, _)) = fit_radius(&points, peak.cx, peak.cy, min_r, max_r) {
                    accepted.push((peak.cx, peak.cy, circle_at(peak.cx, peak.cy, radius)));
                }
            }
            accepted.into_iter().map(|(_, _, c)| c).collect::<Vec<_>>()
        }
    };

    trace_event!("hough", edges = points.len(), circles = circles.len());
    Ok(circles)
}

/// Descending votes, then raster order of the accumulator bin.
fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then_with(|| a.by.cmp(&b.by))
        .then_with(|| a.bx.cmp(&b.bx))
}

fn too_close(accepted: &[(f64, f64, Circle)], cx: f64, cy: f64, min_dist: f64) -> bool {
    accepted
        .iter()
        .any(|&(ax, ay, _)| crate::util::math::distance(ax, ay, cx, cy) < min_dist)
}

fn circle_at(cx: f64, cy: f64, radius: i32) -> Circle {
    Circle {
        center: Point::new(cx.round() as i32, cy.round() as i32),
        radius,
    }
}

/// Integer radius with the most edge pixels at that rounded distance.
///
/// Ties go to the smaller radius. Returns `None` without support.
fn best_radius(points: &[(f64, f64)], cx: f64, cy: f64, min_r: i32, max_r: i32) -> Option<(i32, u32)> {
    let span = (max_r - min_r + 1) as usize;
    let mut hist = vec![0u32; span];
    for &(x, y) in points {
        let r = crate::util::math::distance(x, y, cx, cy).round() as i64;
        if r >= min_r as i64 && r <= max_r as i64 {
            hist[(r - min_r as i64) as usize] += 1;
        }
    }
    let (offset, &count) = hist
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &u32)>, (i, c)| match best {
            Some((_, bc)) if *bc >= *c => best,
            _ => Some((i, c)),
        })?;
    (count > 0).then_some((min_r + offset as i32, count))
}

/// Best radius refined to the mean distance of the edge pixels within one
/// pixel of it, clamped to the radius range.
///
/// Returns the refined radius and the number of those edge pixels.
fn fit_radius(points: &[(f64, f64)], cx: f64, cy: f64, min_r: i32, max_r: i32) -> Option<(i32, u32)> {
    let (coarse, _) = best_radius(points, cx, cy, min_r, max_r)?;
    let (sum, count) = points
        .iter()
        .map(|&(x, y)| crate::util::math::distance(x, y, cx, cy))
        .filter(|d| (d - coarse as f64).abs() <= 1.0)
        .fold((0.0f64, 0u32), |(s, n), d| (s + d, n + 1));
    if count == 0 {
        return Some((coarse, 0));
    }
    let radius = ((sum / count as f64).round() as i32).clamp(min_r, max_r);
    Some((radius, count))
}

/// Center-vote accumulator at resolution `1 / dp`.
struct Accumulator {
    width: usize,
    height: usize,
    dp: f64,
    votes: Vec<u32>,
}

impl Accumulator {
    fn vote(edges: &EdgeMap, dp: f64, min_r: i32, max_r: i32) -> Self {
        let width = (edges.width() as f64 / dp).ceil() as usize + 1;
        let height = (edges.height() as f64 / dp).ceil() as usize + 1;
        let mut votes = vec![0u32; width * height];

        for (x, y) in edges.edge_points() {
            let (gx, gy) = edges.gradient(x, y);
            let norm = ((gx * gx + gy * gy) as f64).sqrt();
            if norm == 0.0 {
                continue;
            }
            let (vx, vy) = (gx as f64 / norm, gy as f64 / norm);
            for sign in [1.0f64, -1.0] {
                let mut last = None;
                for r in min_r..=max_r {
                    let cx = x as f64 + sign * r as f64 * vx;
                    let cy = y as f64 + sign * r as f64 * vy;
                    let bx = (cx / dp).round();
                    let by = (cy / dp).round();
                    if bx < 0.0 || by < 0.0 || bx >= width as f64 || by >= height as f64 {
                        break;
                    }
                    let bin = by as usize * width + bx as usize;
                    if last == Some(bin) {
                        continue;
                    }
                    last = Some(bin);
                    votes[bin] += 1;
                }
            }
        }

        Self {
            width,
            height,
            dp,
            votes,
        }
    }

    /// Smoothed copy of the votes.
    fn smoothed(&self) -> MarkAlignResult<Vec<f32>> {
        let raw: Vec<f32> = self.votes.iter().map(|&v| v as f32).collect();
        let img = FloatImage::from_raw(self.width as u32, self.height as u32, raw).ok_or(
            MarkAlignError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        Ok(gaussian_blur_f32(&img, ACCUMULATOR_SIGMA).into_raw())
    }

    /// Sum and centroid of the raw votes in the 3x3 neighborhood of a bin.
    fn neighborhood(&self, bx: usize, by: usize) -> (u32, f64, f64) {
        let (mut total, mut sx, mut sy) = (0u32, 0.0f64, 0.0f64);
        for y in by - 1..=by + 1 {
            for x in bx - 1..=bx + 1 {
                let v = self.votes[y * self.width + x];
                total += v;
                sx += v as f64 * x as f64;
                sy += v as f64 * y as f64;
            }
        }
        if total == 0 {
            return (0, bx as f64 * self.dp, by as f64 * self.dp);
        }
        let n = total as f64;
        (total, sx / n * self.dp, sy / n * self.dp)
    }

    /// Interior bins that are maxima of the smoothed accumulator and whose
    /// neighborhood holds more than `min_votes` votes.
    ///
    /// Equal smoothed values are resolved in favor of the earlier bin in
    /// raster order.
    fn peaks(&self, min_votes: u32) -> MarkAlignResult<Vec<Peak>> {
        let w = self.width;
        let mut out = Vec::new();
        if w < 3 || self.height < 3 {
            return Ok(out);
        }
        let smooth = self.smoothed()?;
        for by in 1..self.height - 1 {
            for bx in 1..w - 1 {
                let idx = by * w + bx;
                let v = smooth[idx];
                if v <= 0.0 {
                    continue;
                }
                let is_max = [idx - w - 1, idx - w, idx - w + 1, idx - 1]
                    .iter()
                    .all(|&n| v > smooth[n])
                    && [idx + 1, idx + w - 1, idx + w, idx + w + 1]
                        .iter()
                        .all(|&n| v >= smooth[n]);
                if !is_max {
                    continue;
                }
                let (votes, cx, cy) = self.neighborhood(bx, by);
                if votes > min_votes {
                    out.push(Peak {
                        bx,
                        by,
                        votes,
                        cx,
                        cy,
                    });
                }
            }
        }
        Ok(out)
    }
}
