//! Type definitions shared by the geometry code.

use nalgebra::{Matrix3, Point2, Vector2};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;

/// Returns `true` when both coordinates are finite.
#[inline]
pub fn is_finite_point(p: &Pt2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Euclidean distance between two points, in pixels.
#[inline]
pub fn pixel_distance(a: &Pt2, b: &Pt2) -> Real {
    nalgebra::distance(a, b)
}
