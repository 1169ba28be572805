//! Bounding box to polygon conversion.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A pixel coordinate that keeps the numeric kind it was read with.
///
/// Integers stay integers and floats stay floats so that a converted polygon
/// serialises back with exactly the precision of the source annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    /// Integral pixel position.
    Int(i64),
    /// Fractional pixel position.
    Float(f64),
}

impl Coordinate {
    /// Returns the coordinate as a float for ordering comparisons.
    pub fn as_f64(self) -> f64 {
        match self {
            Coordinate::Int(value) => value as f64,
            Coordinate::Float(value) => value,
        }
    }
}

impl From<i64> for Coordinate {
    fn from(value: i64) -> Self {
        Coordinate::Int(value)
    }
}

impl From<i32> for Coordinate {
    fn from(value: i32) -> Self {
        Coordinate::Int(i64::from(value))
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Coordinate::Float(value)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Int(value) => write!(f, "{value}"),
            Coordinate::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Axis aligned box `(x_left, y_top, x_right, y_bottom)` in image coordinates.
///
/// Serialised as a four element array, the layout used by annotation files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[Coordinate; 4]", into = "[Coordinate; 4]")]
pub struct BoundingBox {
    /// Left edge.
    pub x_left: Coordinate,
    /// Top edge (y grows downward).
    pub y_top: Coordinate,
    /// Right edge.
    pub x_right: Coordinate,
    /// Bottom edge.
    pub y_bottom: Coordinate,
}

impl BoundingBox {
    /// Creates a box, rejecting inverted edges. Zero area boxes are accepted.
    pub fn new(
        x_left: impl Into<Coordinate>,
        y_top: impl Into<Coordinate>,
        x_right: impl Into<Coordinate>,
        y_bottom: impl Into<Coordinate>,
    ) -> Result<Self, String> {
        let bbox = Self {
            x_left: x_left.into(),
            y_top: y_top.into(),
            x_right: x_right.into(),
            y_bottom: y_bottom.into(),
        };
        if bbox.x_left.as_f64() > bbox.x_right.as_f64() {
            return Err(format!(
                "x_left {} exceeds x_right {}",
                bbox.x_left, bbox.x_right
            ));
        }
        if bbox.y_top.as_f64() > bbox.y_bottom.as_f64() {
            return Err(format!(
                "y_top {} exceeds y_bottom {}",
                bbox.y_top, bbox.y_bottom
            ));
        }
        Ok(bbox)
    }
}

impl TryFrom<[Coordinate; 4]> for BoundingBox {
    type Error = String;

    fn try_from(raw: [Coordinate; 4]) -> Result<Self, Self::Error> {
        let [x_left, y_top, x_right, y_bottom] = raw;
        BoundingBox::new(x_left, y_top, x_right, y_bottom)
    }
}

impl From<BoundingBox> for [Coordinate; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x_left, bbox.y_top, bbox.x_right, bbox.y_bottom]
    }
}

/// A polygon vertex, serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub Coordinate, pub Coordinate);

impl Point {
    /// Horizontal component.
    pub fn x(&self) -> Coordinate {
        self.0
    }

    /// Vertical component.
    pub fn y(&self) -> Coordinate {
        self.1
    }
}

/// Four vertices ordered top-left, top-right, bottom-right, bottom-left.
///
/// Renderers rely on this clockwise order, so it is fixed by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polygon(pub [Point; 4]);

impl Polygon {
    /// Returns the vertices in their fixed order.
    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// Recovers the enclosing box by taking min/max over the vertices.
    pub fn bounds(&self) -> BoundingBox {
        let pick = |select: fn(&Point) -> Coordinate, take_max: bool| {
            self.0.iter().map(select).fold(select(&self.0[0]), |acc, c| {
                let better = if take_max {
                    c.as_f64() > acc.as_f64()
                } else {
                    c.as_f64() < acc.as_f64()
                };
                if better {
                    c
                } else {
                    acc
                }
            })
        };
        BoundingBox {
            x_left: pick(Point::x, false),
            y_top: pick(Point::y, false),
            x_right: pick(Point::x, true),
            y_bottom: pick(Point::y, true),
        }
    }
}

/// Converts a bounding box into its four point polygon.
pub fn box_to_polygon(bbox: &BoundingBox) -> Polygon {
    Polygon([
        Point(bbox.x_left, bbox.y_top),
        Point(bbox.x_right, bbox.y_top),
        Point(bbox.x_right, bbox.y_bottom),
        Point(bbox.x_left, bbox.y_bottom),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_is_clockwise_from_top_left() {
        let bbox = BoundingBox::new(1, 2, 9, 8).unwrap();
        let poly = box_to_polygon(&bbox);
        let json = serde_json::to_string(&poly).unwrap();
        assert_eq!(json, "[[1,2],[9,2],[9,8],[1,8]]");
    }

    #[test]
    fn degenerate_box_keeps_duplicate_points() {
        let bbox = BoundingBox::new(4, 4, 4, 7).unwrap();
        let poly = box_to_polygon(&bbox);
        assert_eq!(poly.points()[0], poly.points()[1]);
        assert_eq!(poly.bounds(), bbox);
    }

    #[test]
    fn float_coordinates_are_not_rounded() {
        let bbox: BoundingBox = serde_json::from_str("[0.5, 1.25, 3, 4.75]").unwrap();
        let json = serde_json::to_string(&box_to_polygon(&bbox)).unwrap();
        assert_eq!(json, "[[0.5,1.25],[3,1.25],[3,4.75],[0.5,4.75]]");
    }

    #[test]
    fn inverted_box_is_rejected() {
        let err = serde_json::from_str::<BoundingBox>("[9, 2, 1, 8]").unwrap_err();
        assert!(err.to_string().contains("x_left"));
        assert!(BoundingBox::new(0, 5, 1, 4).is_err());
    }
}
