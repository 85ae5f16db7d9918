//! Homography projection and row-major conversions.
//!
//! Homographies are plain [`Mat3`] values. External collaborators usually hand
//! them over as 9 reals in row-major order; the helpers here convert between
//! the two representations.

use crate::{Mat3, Pt2, Real};
use thiserror::Error;

/// Magnitude of the homogeneous scale below which a projection is degenerate.
pub const DEGENERATE_SCALE_EPS: Real = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum HomographyError {
    #[error("homography needs 9 row-major entries, got {0}")]
    WrongEntryCount(usize),
}

/// Build a homography from `[h00, h01, h02, h10, h11, h12, h20, h21, h22]`.
pub fn mat3_from_row_major(h: &[Real; 9]) -> Mat3 {
    Mat3::from_row_slice(h)
}

/// Build a homography from a row-major slice, checking its length.
pub fn mat3_from_slice(h: &[Real]) -> Result<Mat3, HomographyError> {
    if h.len() != 9 {
        return Err(HomographyError::WrongEntryCount(h.len()));
    }
    Ok(Mat3::from_row_slice(h))
}

/// Build a homography from nested rows (`h[row][col]`).
pub fn mat3_from_rows(h: &[[Real; 3]; 3]) -> Mat3 {
    Mat3::from_row_slice(&[
        h[0][0], h[0][1], h[0][2], h[1][0], h[1][1], h[1][2], h[2][0], h[2][1], h[2][2],
    ])
}

/// Flatten a homography into row-major order.
pub fn mat3_to_row_major(h: &Mat3) -> [Real; 9] {
    [
        h[(0, 0)],
        h[(0, 1)],
        h[(0, 2)],
        h[(1, 0)],
        h[(1, 1)],
        h[(1, 2)],
        h[(2, 0)],
        h[(2, 1)],
        h[(2, 2)],
    ]
}

/// Map `p` through the projective transform `h`.
///
/// Computes `X = h00 x + h01 y + h02`, `Y = h10 x + h11 y + h12`,
/// `Z = h20 x + h21 y + h22` and returns `(X / Z, Y / Z)`.
///
/// When `|Z| < 1e-12` the projection is degenerate and the point
/// `(+inf, +inf)` is returned instead of dividing. Use
/// [`crate::is_finite_point`] to detect it.
pub fn project_point(h: &Mat3, p: &Pt2) -> Pt2 {
    let x = h[(0, 0)] * p.x + h[(0, 1)] * p.y + h[(0, 2)];
    let y = h[(1, 0)] * p.x + h[(1, 1)] * p.y + h[(1, 2)];
    let z = h[(2, 0)] * p.x + h[(2, 1)] * p.y + h[(2, 2)];

    if z.abs() < DEGENERATE_SCALE_EPS {
        return Pt2::new(Real::INFINITY, Real::INFINITY);
    }
    Pt2::new(x / z, y / z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_finite_point;

    #[test]
    fn identity_keeps_point() {
        let p = project_point(&Mat3::identity(), &Pt2::new(12.5, -3.0));
        assert_eq!(p, Pt2::new(12.5, -3.0));
    }

    #[test]
    fn projective_divide_matches_analytic() {
        let h = mat3_from_row_major(&[1.1, 0.02, 5.0, -0.03, 0.95, -7.0, 1e-4, -2e-4, 1.0]);
        let (x, y) = (320.0, 240.0);
        let z = 1e-4 * x - 2e-4 * y + 1.0;
        let ex = (1.1 * x + 0.02 * y + 5.0) / z;
        let ey = (-0.03 * x + 0.95 * y - 7.0) / z;

        let p = project_point(&h, &Pt2::new(x, y));
        assert!((p.x - ex).abs() < 1e-9, "x: {} vs {}", p.x, ex);
        assert!((p.y - ey).abs() < 1e-9, "y: {} vs {}", p.y, ey);
    }

    #[test]
    fn zero_scale_is_non_finite() {
        // Third row vanishes at x = 10.
        let h = mat3_from_row_major(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.1, 0.0, -1.0]);
        let p = project_point(&h, &Pt2::new(10.0, 4.0));
        assert!(!is_finite_point(&p));
    }

    #[test]
    fn tiny_but_nonzero_scale_still_divides() {
        let h = mat3_from_row_major(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1e-11]);
        let p = project_point(&h, &Pt2::new(1.0, 1.0));
        assert!(is_finite_point(&p));
        assert!((p.x - 1e11).abs() < 1.0);
    }

    #[test]
    fn row_major_roundtrip() {
        let entries = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let h = mat3_from_row_major(&entries);
        assert_eq!(h[(0, 2)], 3.0);
        assert_eq!(h[(2, 0)], 7.0);
        assert_eq!(mat3_to_row_major(&h), entries);

        let rows = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert_eq!(mat3_from_rows(&rows), h);
    }

    #[test]
    fn slice_with_wrong_length_is_rejected() {
        assert_eq!(
            mat3_from_slice(&[1.0; 8]),
            Err(HomographyError::WrongEntryCount(8))
        );
        assert!(mat3_from_slice(&[0.0; 9]).is_ok());
    }
}
