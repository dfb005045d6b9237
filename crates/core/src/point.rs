//! 2D vector math
//!
//! Plain value types shared by the coordinate transform, the path generators
//! and the content-stream emitter. Points carry no unit; callers decide whether
//! a value is in canvas pixels or PDF points.

use serde::{Deserialize, Serialize};

/// Added to vector lengths before dividing by them so that resizing a
/// zero-length vector yields zero instead of NaN.
const LENGTH_EPSILON: f64 = 0.00001;

/// A point or free vector in 2D space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin (0, 0)
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Length of this point seen as a vector from the origin
    ///
    /// Slightly overestimates the true length so it can safely be used as a
    /// divisor when normalizing.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt() + LENGTH_EPSILON
    }

    /// Angle in radians between this vector and another one
    pub fn angle(&self, other: &Point) -> f64 {
        let dot = self.x * other.x + self.y * other.y;
        (dot / (self.length() * other.length())).clamp(-1.0, 1.0).acos()
    }

    /// Normal vector (not normalized) of the segment from `self` to `other`
    pub fn segment_normal(&self, other: &Point) -> Point {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        Point::new(-dy, dx)
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    /// Scale this vector so that its length becomes `new_length`
    pub fn resize(&self, new_length: f64) -> Point {
        self.scale(new_length / self.length())
    }

    /// Rotate `theta` radians counter-clockwise around the origin
    pub fn rotate(&self, theta: f64) -> Point {
        let (sin, cos) = theta.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1)
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            (1.0 - t) * self.x + t * other.x,
            (1.0 - t) * self.y + t * other.y,
        )
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.lerp(other, 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 2D affine transformation in PDF matrix order `[a b c d e f]`
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, which is exactly the
/// operand layout of the `cm` content-stream operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { e: dx, f: dy, ..Self::IDENTITY }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Counter-clockwise rotation around the origin
    pub fn rotate(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// Rotation around `pivot`: translate to the pivot, rotate, translate back
    pub fn rotate_about(pivot: Point, theta: f64) -> Self {
        Self::translate(-pivot.x, -pivot.y)
            .then(&Self::rotate(theta))
            .then(&Self::translate(pivot.x, pivot.y))
    }

    /// Compose: apply `self` first, then `next`
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}
