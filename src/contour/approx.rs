//! Chain approximation: run compression and Teh–Chin dominant points.

use crate::geometry::Point;

/// Curvature measure for dominant point detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curvature {
    /// `|a + b|_1 / (|a|_1 + |b|_1)` of the two arms.
    L1,
    /// `1 + cos` of the angle between the two arms.
    KCos,
}

/// Drops points lying inside straight horizontal, vertical or diagonal runs.
pub(crate) fn simple(chain: &[Point]) -> Vec<Point> {
    let n = chain.len();
    if n < 3 {
        return chain.to_vec();
    }
    let step = |a: Point, b: Point| (b.x - a.x, b.y - a.y);
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            step(prev, chain[i]) != step(chain[i], next)
        })
        .map(|i| chain[i])
        .collect();
    if kept.is_empty() {
        vec![chain[0]]
    } else {
        kept
    }
}

/// Teh–Chin dominant points on a closed chain.
///
/// Each point gets a region of support that grows while the chord keeps
/// lengthening and the relative deviation keeps rising; points that are not a
/// curvature maximum within half their support are dropped. Falls back to
/// [`simple`] when nothing survives.
pub(crate) fn teh_chin(chain: &[Point], measure: Curvature) -> Vec<Point> {
    let n = chain.len();
    if n < 5 {
        return simple(chain);
    }
    let at = |i: isize| chain[i.rem_euclid(n as isize) as usize];
    let max_k = (n - 1) / 2;

    let mut support = vec![1usize; n];
    let mut curvature = vec![0.0f64; n];
    for i in 0..n {
        let ii = i as isize;
        let mut k = 1usize;
        while k < max_k {
            let ki = k as isize;
            let (l0, d0) = chord(at(ii - ki), at(ii + ki), chain[i]);
            let (l1, d1) = chord(at(ii - ki - 1), at(ii + ki + 1), chain[i]);
            if l0 >= l1 || (d0 > 0.0 && d0 / l0 >= d1 / l1) {
                break;
            }
            k += 1;
        }
        support[i] = k;
        let ki = k as isize;
        curvature[i] = bend(at(ii - ki), chain[i], at(ii + ki), measure);
    }

    let wrap = |i: isize| i.rem_euclid(n as isize) as usize;
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let c = curvature[i];
            if c <= 1e-9 {
                return false;
            }
            let reach = (support[i] / 2) as isize;
            let ii = i as isize;
            (1..=reach).all(|off| c > curvature[wrap(ii - off)] && c >= curvature[wrap(ii + off)])
        })
        .map(|i| chain[i])
        .collect();

    if kept.is_empty() {
        simple(chain)
    } else {
        kept
    }
}

/// Chord length between `a` and `b`, and the distance of `p` from that chord.
fn chord(a: Point, b: Point, p: Point) -> (f64, f64) {
    let (cx, cy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (px, py) = ((p.x - a.x) as f64, (p.y - a.y) as f64);
    let len = (cx * cx + cy * cy).sqrt();
    if len == 0.0 {
        return (0.0, (px * px + py * py).sqrt());
    }
    (len, (cx * py - cy * px).abs() / len)
}

fn bend(prev: Point, p: Point, next: Point, measure: Curvature) -> f64 {
    let (ax, ay) = ((prev.x - p.x) as f64, (prev.y - p.y) as f64);
    let (bx, by) = ((next.x - p.x) as f64, (next.y - p.y) as f64);
    match measure {
        Curvature::KCos => {
            let na = (ax * ax + ay * ay).sqrt();
            let nb = (bx * bx + by * by).sqrt();
            if na == 0.0 || nb == 0.0 {
                return 0.0;
            }
            1.0 + (ax * bx + ay * by) / (na * nb)
        }
        Curvature::L1 => {
            let norm = ax.abs() + ay.abs() + bx.abs() + by.abs();
            if norm == 0.0 {
                return 0.0;
            }
            ((ax + bx).abs() + (ay + by).abs()) / norm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{bend, simple, teh_chin, Curvature};
    use crate::geometry::Point;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn simple_collapses_straight_runs() {
        let chain = pts(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)]);
        assert_eq!(simple(&chain), pts(&[(0, 0), (0, 2), (2, 2), (2, 0)]));
    }

    #[test]
    fn short_chains_pass_through() {
        let chain = pts(&[(3, 3), (4, 3)]);
        assert_eq!(simple(&chain), chain);
        assert_eq!(teh_chin(&chain, Curvature::KCos), chain);
    }

    #[test]
    fn bend_is_zero_on_straight_lines() {
        let (a, p, b) = (Point::new(0, 0), Point::new(2, 0), Point::new(4, 0));
        assert!(bend(a, p, b, Curvature::KCos).abs() < 1e-12);
        assert!(bend(a, p, b, Curvature::L1).abs() < 1e-12);
        let corner = bend(Point::new(2, 0), Point::new(0, 0), Point::new(0, 2), Curvature::KCos);
        assert!((corner - 1.0).abs() < 1e-12);
    }
}
