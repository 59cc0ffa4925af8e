//! Integer pixel geometry shared by the configuration and the pipeline.

use serde::{Deserialize, Serialize};

/// Pixel coordinate. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the vector from `self` to `other`.
    pub fn to(self, other: Point) -> Vector {
        Vector::new(other.x - self.x, other.y - self.y)
    }

    /// Translates the point by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        crate::util::math::distance(
            self.x as f64,
            self.y as f64,
            other.x as f64,
            other.y as f64,
        )
    }
}

impl From<[i32; 2]> for Point {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Point> for [i32; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

/// Integer displacement. Serialized as `[dx, dy]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Vector {
    pub dx: i32,
    pub dy: i32,
}

impl Vector {
    /// Creates a vector.
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Direction angle in degrees, `atan2(dy, dx)`.
    pub fn heading_deg(self) -> f64 {
        crate::util::math::heading_deg(self.dx as f64, self.dy as f64)
    }
}

impl From<[i32; 2]> for Vector {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Vector> for [i32; 2] {
    fn from(value: Vector) -> Self {
        [value.dx, value.dy]
    }
}

/// Axis-aligned rectangle `(x, y, width, height)`. Serialized as `[x, y, w, h]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `width * height` as a float, the blob area measure.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Center with integer division, `(x + w / 2, y + h / 2)`, saturating at
    /// the `i32` range.
    pub fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// Closed-interval containment: both edges count as inside.
    pub fn contains(&self, p: Point) -> bool {
        let (x, y, px, py) = (self.x as i64, self.y as i64, p.x as i64, p.y as i64);
        x <= px && px <= x + self.width as i64 && y <= py && py <= y + self.height as i64
    }

    /// Intersection with the `width x height` image area, or `None` when empty.
    pub fn clamp_to(&self, width: usize, height: usize) -> Option<Rect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x.saturating_add(self.width)).min(width as i32);
        let y1 = (self.y.saturating_add(self.height)).min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Bounding box of a point set with inclusive pixel extents.
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}

impl From<[i32; 4]> for Rect {
    fn from(value: [i32; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(value: Rect) -> Self {
        [value.x, value.y, value.width, value.height]
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect};

    #[test]
    fn contains_uses_closed_intervals() {
        let rect = Rect::new(10, 20, 30, 40);
        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(40, 60)));
        assert!(!rect.contains(Point::new(41, 60)));
        assert!(!rect.contains(Point::new(9, 30)));
    }

    #[test]
    fn bounding_uses_inclusive_extents() {
        let rect = Rect::bounding(&[Point::new(2, 3), Point::new(5, 3), Point::new(4, 7)]).unwrap();
        assert_eq!(rect, Rect::new(2, 3, 4, 5));
        assert_eq!(Rect::bounding(&[Point::new(1, 1)]).unwrap(), Rect::new(1, 1, 1, 1));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn clamp_to_trims_to_image() {
        let rect = Rect::new(-5, 10, 20, 100);
        assert_eq!(rect.clamp_to(50, 40), Some(Rect::new(0, 10, 15, 30)));
        assert_eq!(Rect::new(60, 0, 5, 5).clamp_to(50, 40), None);
    }

    #[test]
    fn extreme_boxes_do_not_overflow() {
        let rect = Rect::new(i32::MAX - 1, i32::MIN, i32::MAX, i32::MAX);
        assert!(rect.contains(Point::new(i32::MAX, -1)));
        assert!(!rect.contains(Point::new(0, 0)));
        assert_eq!(rect.center(), Point::new(i32::MAX, i32::MIN + i32::MAX / 2));
        assert_eq!(rect.clamp_to(100, 100), None);
        let wide = Rect::new(-10, -10, i32::MAX, i32::MAX);
        assert_eq!(wide.clamp_to(64, 48), Some(Rect::new(0, 0, 64, 48)));
    }

    #[test]
    fn rect_serializes_as_array() {
        let json = serde_json::to_string(&Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "[1,2,3,4]");
    }
}
