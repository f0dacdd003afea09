//! Geometric primitives for diagram items.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis aligned bounding box
//! - [`Matrix`] - A 2D affine transform
//!
//! # Coordinate System
//!
//! Plume uses the same coordinate system as SVG and Cairo:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! # Matrix convention
//!
//! [`Matrix`] follows the Cairo layout `(xx, yx, xy, yy, x0, y0)`. A point is
//! mapped as:
//!
//! ```text
//!   x' = xx * x + xy * y + x0
//!   y' = yx * x + yy * y + y0
//! ```
//!
//! `a.multiply(&b)` yields the transform that applies `a` first and `b`
//! second. `translate`, `scale` and `rotate` modify a matrix in place so
//! that the new operation is applied *before* the existing transform, again
//! matching Cairo. This is what makes an item's translation act inside its
//! parent's coordinate frame.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D point.
///
/// # Examples
///
/// ```
/// # use plume_core::geometry::Point;
/// let p = Point::new(10.0, 20.0).add_point(Point::new(5.0, 5.0));
/// assert_eq!(p.x(), 15.0);
/// assert_eq!(p.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Represents the dimensions of an item with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f64 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns the center point of a box of this size anchored at the origin
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// An axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    /// Creates bounds spanning the two corner points, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Returns the smallest bounds containing every point, or `None` for an
    /// empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_corners(first, first), |bounds, point| {
            bounds.union(Self::from_corners(point, point))
        }))
    }

    /// Returns the smallest bounds containing both bounds.
    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn expand(self, amount: f64) -> Self {
        Self {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    pub fn min_point(self) -> Point {
        self.min
    }

    pub fn max_point(self) -> Point {
        self.max
    }

    pub fn width(self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A 2D affine transform in Cairo layout.
///
/// Serialized as the six-number array `[xx, yx, xy, yy, x0, y0]`.
///
/// # Examples
///
/// ```
/// # use plume_core::geometry::{Matrix, Point};
/// let mut parent = Matrix::identity();
/// parent.scale(2.0, 2.0);
///
/// let mut local = Matrix::identity();
/// local.translate(5.0, 5.0);
///
/// // The child's translation is scaled by its parent.
/// let i2c = local.multiply(&parent);
/// assert_eq!(i2c.transform_point(Point::default()), Point::new(10.0, 10.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Matrix {
    xx: f64,
    yx: f64,
    xy: f64,
    yy: f64,
    x0: f64,
    y0: f64,
}

impl Matrix {
    /// Creates a matrix from its Cairo components.
    pub fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Returns `true` if this is exactly the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Returns the components as `(xx, yx, xy, yy, x0, y0)`.
    pub fn to_tuple(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.xx, self.yx, self.xy, self.yy, self.x0, self.y0)
    }

    /// Returns the transform applying `self` first and `other` second.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            xx: self.xx * other.xx + self.yx * other.xy,
            yx: self.xx * other.yx + self.yx * other.yy,
            xy: self.xy * other.xx + self.yy * other.xy,
            yy: self.xy * other.yx + self.yy * other.yy,
            x0: self.x0 * other.xx + self.y0 * other.xy + other.x0,
            y0: self.x0 * other.yx + self.y0 * other.yy + other.y0,
        }
    }

    /// Prepends a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        *self = Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty).multiply(self);
        self
    }

    /// Prepends a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        *self = Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0).multiply(self);
        self
    }

    /// Prepends a rotation by `radians`.
    pub fn rotate(&mut self, radians: f64) -> &mut Self {
        let (sin, cos) = radians.sin_cos();
        *self = Matrix::new(cos, sin, -sin, cos, 0.0, 0.0).multiply(self);
        self
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.xx * self.yy - self.yx * self.xy;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Matrix {
            xx: self.yy / det,
            yx: -self.yx / det,
            xy: -self.xy / det,
            yy: self.xx / det,
            x0: (self.xy * self.y0 - self.yy * self.x0) / det,
            y0: (self.yx * self.x0 - self.xx * self.y0) / det,
        })
    }

    /// Maps a point through this transform.
    pub fn transform_point(&self, point: Point) -> Point {
        Point::new(
            self.xx * point.x + self.xy * point.y + self.x0,
            self.yx * point.x + self.yy * point.y + self.y0,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 6]> for Matrix {
    fn from([xx, yx, xy, yy, x0, y0]: [f64; 6]) -> Self {
        Self::new(xx, yx, xy, yy, x0, y0)
    }
}

impl From<Matrix> for [f64; 6] {
    fn from(m: Matrix) -> Self {
        [m.xx, m.yx, m.xy, m.yy, m.x0, m.y0]
    }
}

/// Formats the matrix as an SVG `matrix(...)` transform function.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({} {} {} {} {} {})",
            self.xx, self.yx, self.xy, self.yy, self.x0, self.y0
        )
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn assert_matrix_eq(actual: Matrix, expected: Matrix) {
        let a: [f64; 6] = actual.into();
        let e: [f64; 6] = expected.into();
        for (a, e) in a.iter().zip(e.iter()) {
            assert_approx_eq!(f64, *a, *e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_translate_then_read_tuple() {
        let mut m = Matrix::identity();
        m.translate(1.0, 1.0);

        assert_eq!(m.to_tuple(), (1.0, 0.0, 0.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_scale_after_translate_keeps_offset() {
        // Cairo semantics: the scale applies before the existing translation.
        let mut m = Matrix::identity();
        m.translate(10.0, 0.0);
        m.scale(2.0, 2.0);

        assert_eq!(m.to_tuple(), (2.0, 0.0, 0.0, 2.0, 10.0, 0.0));
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn test_multiply_composes_in_parent_frame() {
        let mut parent = Matrix::identity();
        parent.scale(2.0, 2.0);
        let mut local = Matrix::identity();
        local.translate(5.0, 3.0);

        let i2c = local.multiply(&parent);

        assert_eq!(i2c.to_tuple(), (2.0, 0.0, 0.0, 2.0, 10.0, 6.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut m = Matrix::identity();
        m.rotate(std::f64::consts::FRAC_PI_2);

        let p = m.transform_point(Point::new(1.0, 0.0));
        assert_approx_eq!(f64, p.x(), 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, p.y(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_singular() {
        let m = Matrix::new(0.0, 0.0, 0.0, 0.0, 3.0, 4.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn test_display_svg_transform() {
        let m = Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 5.5);
        assert_eq!(m.to_string(), "matrix(2 0 0 2 10 5.5)");
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = Bounds::from_points([
            Point::new(5.0, 1.0),
            Point::new(-2.0, 8.0),
            Point::new(3.0, 3.0),
        ])
        .expect("non-empty");

        assert_eq!(bounds.min_point(), Point::new(-2.0, 1.0));
        assert_eq!(bounds.max_point(), Point::new(5.0, 8.0));
        assert_approx_eq!(f64, bounds.width(), 7.0);
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    fn matrix_strategy() -> impl Strategy<Value = Matrix> {
        (
            0.5f64..4.0,
            -3.0f64..3.0,
            -100.0f64..100.0,
            -100.0f64..100.0,
            0.5f64..4.0,
        )
            .prop_map(|(s, angle, tx, ty, sy)| {
                let mut m = Matrix::identity();
                m.translate(tx, ty).rotate(angle).scale(s, sy);
                m
            })
    }

    proptest! {
        #[test]
        fn prop_inverse_round_trips(m in matrix_strategy()) {
            let inverse = m.invert().expect("scales are non-zero");
            assert_matrix_eq(m.multiply(&inverse), Matrix::identity());
        }

        #[test]
        fn prop_multiply_is_associative(a in matrix_strategy(), b in matrix_strategy(), c in matrix_strategy()) {
            assert_matrix_eq(a.multiply(&b).multiply(&c), a.multiply(&b.multiply(&c)));
        }

        #[test]
        fn prop_multiply_matches_sequential_mapping(a in matrix_strategy(), b in matrix_strategy(), x in -50.0f64..50.0, y in -50.0f64..50.0) {
            let p = Point::new(x, y);
            let direct = a.multiply(&b).transform_point(p);
            let stepwise = b.transform_point(a.transform_point(p));
            prop_assert!((direct.x() - stepwise.x()).abs() < 1e-6);
            prop_assert!((direct.y() - stepwise.y()).abs() < 1e-6);
        }
    }
}
