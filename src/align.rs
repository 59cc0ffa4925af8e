//! Position and rotation offset between a taught and a current pose.

use crate::geometry::{Point, Vector};
use crate::util::math::wrap_deg;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token used in the summary message for a region without a result.
pub const NONE_TOKEN: &str = "None";
/// Separator between region tokens in the summary message.
pub const TOKEN_SEPARATOR: &str = "_";

/// Anchor point plus direction vector, taught or measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPose {
    pub center: Point,
    #[serde(rename = "vector", alias = "direction")]
    pub direction: Vector,
}

impl MarkerPose {
    /// Direction angle in degrees.
    pub fn heading_deg(&self) -> f64 {
        self.direction.heading_deg()
    }
}

/// Offset of the current pose relative to the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub dx: i32,
    pub dy: i32,
    /// Rotation in degrees within `(-180, 180]`.
    pub dtheta: f64,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // -0.0 would print as "-0.00"
        let dtheta = if self.dtheta == 0.0 { 0.0 } else { self.dtheta };
        write!(f, "{},{},{:.2}", self.dx, self.dy, dtheta)
    }
}

/// Compares a current pose against its origin. Absent when `current` is.
pub fn align(origin: &MarkerPose, current: Option<&MarkerPose>) -> Option<Alignment> {
    let current = current?;
    Some(Alignment {
        dx: current.center.x - origin.center.x,
        dy: current.center.y - origin.center.y,
        dtheta: wrap_deg(current.heading_deg() - origin.heading_deg()),
    })
}

/// Joins one token per region: `"dx,dy,dtheta"` or `"None"`.
pub fn format_message<'a, I>(alignments: I) -> String
where
    I: IntoIterator<Item = Option<&'a Alignment>>,
{
    alignments
        .into_iter()
        .map(|a| a.map_or_else(|| NONE_TOKEN.to_string(), Alignment::to_string))
        .collect::<Vec<_>>()
        .join(TOKEN_SEPARATOR)
}

/// Builds a pose from coordinate tuples.
pub fn pose(center: (i32, i32), direction: (i32, i32)) -> MarkerPose {
    MarkerPose {
        center: Point::new(center.0, center.1),
        direction: Vector::new(direction.0, direction.1),
    }
}

#[cfg(test)]
mod tests {
    use super::{align, format_message, pose, Alignment};

    #[test]
    fn identical_pose_has_zero_offset() {
        let origin = pose((10, 10), (20, 0));
        let a = align(&origin, Some(&origin)).unwrap();
        assert_eq!(a.to_string(), "0,0,0.00");
    }

    #[test]
    fn translation_only() {
        let origin = pose((10, 10), (20, 0));
        let a = align(&origin, Some(&pose((15, 10), (20, 0)))).unwrap();
        assert_eq!((a.dx, a.dy), (5, 0));
        assert_eq!(a.to_string(), "5,0,0.00");
    }

    #[test]
    fn rotation_wraps_across_the_seam() {
        // origin heading ~ +175, current heading ~ -175
        let origin = pose((0, 0), (-1000, 87));
        let current = pose((0, 0), (-1000, -87));
        let a = align(&origin, Some(&current)).unwrap();
        assert!(a.dtheta > 0.0 && a.dtheta < 20.0, "{}", a.dtheta);
        let back = align(&current, Some(&origin)).unwrap();
        assert!(back.dtheta < 0.0 && back.dtheta > -20.0, "{}", back.dtheta);
    }

    #[test]
    fn quarter_turn() {
        let origin = pose((5, 5), (10, 0));
        let a = align(&origin, Some(&pose((5, 5), (0, 10)))).unwrap();
        assert_eq!(a.to_string(), "0,0,90.00");
    }

    #[test]
    fn absent_current_gives_absent_alignment() {
        assert!(align(&pose((0, 0), (1, 0)), None).is_none());
    }

    #[test]
    fn message_joins_tokens_in_order() {
        let a = Alignment {
            dx: 1,
            dy: -2,
            dtheta: -0.004,
        };
        assert_eq!(format_message([Some(&a), None]), "1,-2,-0.00_None");
        let none: [Option<&Alignment>; 3] = [None, None, None];
        assert_eq!(format_message(none), "None_None_None");
    }
}
