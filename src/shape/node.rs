use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of floats one node occupies in the flat editor encoding.
pub const NODE_FLOATS: usize = 7;

/// A position on the curve plane.
///
/// `x` is the normalized position within the cycle, `y` the envelope value in
/// the units of the stage's method (dB, Hz, semitones, ...).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/*
| type             | handles                                   |
| ---------------- | ----------------------------------------- |
| End              | none, x pinned to 0 or 1                  |
| Point            | none (hard corner)                        |
| AutoSmooth       | derived from both neighbours              |
| SymmetricSmooth  | handle2 = -handle1                        |
| Smooth           | collinear, opposite, independent lengths  |
| Corner           | independent                               |
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    End,
    #[default]
    Point,
    AutoSmooth,
    SymmetricSmooth,
    Smooth,
    Corner,
}

impl NodeType {
    pub fn code(self) -> u8 {
        match self {
            NodeType::End => 0,
            NodeType::Point => 1,
            NodeType::AutoSmooth => 2,
            NodeType::SymmetricSmooth => 3,
            NodeType::Smooth => 4,
            NodeType::Corner => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeType::End),
            1 => Some(NodeType::Point),
            2 => Some(NodeType::AutoSmooth),
            3 => Some(NodeType::SymmetricSmooth),
            4 => Some(NodeType::Smooth),
            5 => Some(NodeType::Corner),
            _ => None,
        }
    }
}

/// One control point of a shape with its two Bezier handles.
///
/// Handles are offsets relative to `point`: `handle1` points left (towards the
/// previous node), `handle2` points right.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Node {
    pub node_type: NodeType,
    pub point: Point,
    pub handle1: Point,
    pub handle2: Point,
}

impl Node {
    pub fn new(node_type: NodeType, point: Point, handle1: Point, handle2: Point) -> Self {
        Self {
            node_type,
            point,
            handle1,
            handle2,
        }
    }

    /// Handle-less node of the given type.
    pub fn at(node_type: NodeType, x: f64, y: f64) -> Self {
        Self::new(node_type, Point::new(x, y), Point::ZERO, Point::ZERO)
    }

    pub fn end(x: f64, y: f64) -> Self {
        Self::at(NodeType::End, x, y)
    }

    /// True when the point and both handles are finite.
    pub fn is_finite(&self) -> bool {
        [self.point, self.handle1, self.handle2]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Encode as `(type, x, y, h1x, h1y, h2x, h2y)`.
    pub fn to_floats(&self) -> [f32; NODE_FLOATS] {
        [
            self.node_type.code() as f32,
            self.point.x as f32,
            self.point.y as f32,
            self.handle1.x as f32,
            self.handle1.y as f32,
            self.handle2.x as f32,
            self.handle2.y as f32,
        ]
    }

    /// Decode the flat editor encoding. Returns `None` for an unknown type code
    /// or a non-finite coordinate.
    pub fn from_floats(values: &[f32; NODE_FLOATS]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) || values[0] < 0.0 {
            return None;
        }
        let node_type = NodeType::from_code(values[0].round() as u8)?;
        let p = |i: usize| Point::new(values[i] as f64, values[i + 1] as f64);

        Some(Self::new(node_type, p(1), p(3), p(5)))
    }
}
