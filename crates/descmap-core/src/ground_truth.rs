//! Single ground-truth resolution via homography projection.
//!
//! A query keypoint of view A is projected into view B; the nearest detected
//! keypoint of view B is its ground truth when it lies within the pixel
//! tolerance. At most one relevant item exists per query.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{is_finite_point, pixel_distance, project_point, Mat3, Pt2, Real};

/// Default pixel tolerance (`τ`) for accepting a candidate as ground truth.
pub const DEFAULT_TOLERANCE_PX: Real = 3.0;
/// Default half-extent of the fast-reject window around the origin.
pub const DEFAULT_BOUND_MAGNITUDE: Real = 2000.0;

/// Region a projected query must land in before candidates are scanned.
///
/// Projections outside the region resolve to "no ground truth" without a
/// nearest-neighbour search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionBounds {
    /// Never reject.
    Unbounded,
    /// Reject when `|x| > magnitude` or `|y| > magnitude`.
    Symmetric { magnitude: Real },
    /// Reject outside the closed rectangle.
    Rect {
        min_x: Real,
        min_y: Real,
        max_x: Real,
        max_y: Real,
    },
}

impl Default for ProjectionBounds {
    fn default() -> Self {
        Self::Symmetric {
            magnitude: DEFAULT_BOUND_MAGNITUDE,
        }
    }
}

impl ProjectionBounds {
    /// Bounds covering a `width × height` target image grown by `margin` pixels.
    pub fn for_image(width: u32, height: u32, margin: Real) -> Self {
        let margin = margin.abs();
        Self::Rect {
            min_x: -margin,
            min_y: -margin,
            max_x: width as Real + margin,
            max_y: height as Real + margin,
        }
    }

    /// Whether `p` lies inside the bounds (boundary included).
    pub fn contains(&self, p: &Pt2) -> bool {
        match *self {
            ProjectionBounds::Unbounded => true,
            ProjectionBounds::Symmetric { magnitude } => {
                (-magnitude..=magnitude).contains(&p.x) && (-magnitude..=magnitude).contains(&p.y)
            }
            ProjectionBounds::Rect {
                min_x,
                min_y,
                max_x,
                max_y,
            } => (min_x..=max_x).contains(&p.x) && (min_y..=max_y).contains(&p.y),
        }
    }
}

/// Parameters of the ground-truth resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum reprojection error (pixels) for a candidate to count as ground truth.
    pub tolerance_px: Real,
    /// Fast-reject region for projected queries.
    #[serde(default)]
    pub bounds: ProjectionBounds,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tolerance_px: DEFAULT_TOLERANCE_PX,
            bounds: ProjectionBounds::default(),
        }
    }
}

impl ResolverConfig {
    /// Same tolerance, different fast-reject region.
    pub fn with_bounds(self, bounds: ProjectionBounds) -> Self {
        Self { bounds, ..self }
    }
}

/// Index and pixel distance of the candidate closest to `target`.
///
/// Ties keep the first candidate in input order. Candidates at a NaN or
/// infinite distance are never selected. Returns `None` for an empty list.
pub fn nearest_candidate(target: &Pt2, candidates: &[Pt2]) -> Option<(usize, Real)> {
    let mut best_idx = None;
    let mut best_distance = Real::INFINITY;

    for (idx, candidate) in candidates.iter().enumerate() {
        let distance = pixel_distance(target, candidate);
        if distance < best_distance {
            best_distance = distance;
            best_idx = Some(idx);
        }
    }

    best_idx.map(|idx| (idx, best_distance))
}

/// Find the single relevant keypoint of view B for `query_a`.
///
/// Projects `query_a` through `h_a_to_b`; returns the index of the nearest
/// candidate when it lies within `config.tolerance_px`, and `None` when the
/// projection is degenerate, falls outside `config.bounds`, or no candidate is
/// close enough.
pub fn resolve_ground_truth(
    query_a: &Pt2,
    h_a_to_b: &Mat3,
    candidates_b: &[Pt2],
    config: &ResolverConfig,
) -> Option<usize> {
    let projected = project_point(h_a_to_b, query_a);
    if !is_finite_point(&projected) {
        trace!("degenerate projection for query ({}, {})", query_a.x, query_a.y);
        return None;
    }

    if !config.bounds.contains(&projected) {
        trace!(
            "projection ({:.1}, {:.1}) outside fast-reject bounds",
            projected.x,
            projected.y
        );
        return None;
    }

    let (idx, distance) = nearest_candidate(&projected, candidates_b)?;
    (distance <= config.tolerance_px).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat3_from_row_major;

    fn translation(tx: Real, ty: Real) -> Mat3 {
        mat3_from_row_major(&[1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0])
    }

    #[test]
    fn identity_picks_coincident_candidate() {
        let candidates = vec![Pt2::new(10.0, 10.0), Pt2::new(50.0, 50.0)];
        let gt = resolve_ground_truth(
            &Pt2::new(10.0, 10.0),
            &Mat3::identity(),
            &candidates,
            &ResolverConfig::default(),
        );
        assert_eq!(gt, Some(0));
    }

    #[test]
    fn translation_is_applied_before_search() {
        let candidates = vec![Pt2::new(10.0, 10.0), Pt2::new(31.0, 4.5)];
        let gt = resolve_ground_truth(
            &Pt2::new(10.0, 10.0),
            &translation(20.0, -5.0),
            &candidates,
            &ResolverConfig::default(),
        );
        assert_eq!(gt, Some(1));
    }

    #[test]
    fn tolerance_is_inclusive() {
        let candidates = vec![Pt2::new(13.0, 10.0)];
        let cfg = ResolverConfig::default();
        assert_eq!(
            resolve_ground_truth(&Pt2::new(10.0, 10.0), &Mat3::identity(), &candidates, &cfg),
            Some(0)
        );

        let far = vec![Pt2::new(13.01, 10.0)];
        assert_eq!(
            resolve_ground_truth(&Pt2::new(10.0, 10.0), &Mat3::identity(), &far, &cfg),
            None
        );
    }

    #[test]
    fn empty_candidates_resolve_to_none() {
        let gt = resolve_ground_truth(
            &Pt2::new(1.0, 1.0),
            &Mat3::identity(),
            &[],
            &ResolverConfig::default(),
        );
        assert_eq!(gt, None);
    }

    #[test]
    fn far_projection_is_rejected_without_scan() {
        // A candidate sits exactly on the projection, but the bound wins.
        let candidates = vec![Pt2::new(5000.0, 5000.0)];
        let gt = resolve_ground_truth(
            &Pt2::new(0.0, 0.0),
            &translation(5000.0, 5000.0),
            &candidates,
            &ResolverConfig::default(),
        );
        assert_eq!(gt, None);

        let unbounded = ResolverConfig::default().with_bounds(ProjectionBounds::Unbounded);
        let gt = resolve_ground_truth(
            &Pt2::new(0.0, 0.0),
            &translation(5000.0, 5000.0),
            &candidates,
            &unbounded,
        );
        assert_eq!(gt, Some(0));
    }

    #[test]
    fn degenerate_homography_resolves_to_none() {
        let h = mat3_from_row_major(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let candidates = vec![Pt2::new(0.0, 0.0)];
        let gt = resolve_ground_truth(
            &Pt2::new(3.0, 4.0),
            &h,
            &candidates,
            &ResolverConfig::default().with_bounds(ProjectionBounds::Unbounded),
        );
        assert_eq!(gt, None);
    }

    #[test]
    fn equidistant_candidates_keep_first() {
        let candidates = vec![
            Pt2::new(40.0, 40.0),
            Pt2::new(11.0, 10.0),
            Pt2::new(9.0, 10.0),
        ];
        assert_eq!(
            nearest_candidate(&Pt2::new(10.0, 10.0), &candidates),
            Some((1, 1.0))
        );
    }

    #[test]
    fn nan_candidates_are_skipped() {
        let candidates = vec![Pt2::new(Real::NAN, 0.0), Pt2::new(1.0, 0.0)];
        assert_eq!(
            nearest_candidate(&Pt2::new(0.0, 0.0), &candidates),
            Some((1, 1.0))
        );
    }

    #[test]
    fn image_bounds_include_margin() {
        let bounds = ProjectionBounds::for_image(640, 480, 3.0);
        assert!(bounds.contains(&Pt2::new(-3.0, 0.0)));
        assert!(bounds.contains(&Pt2::new(643.0, 483.0)));
        assert!(!bounds.contains(&Pt2::new(643.5, 10.0)));
        assert!(!bounds.contains(&Pt2::new(10.0, -3.5)));
    }

    #[test]
    fn symmetric_bound_is_closed() {
        let bounds = ProjectionBounds::default();
        assert!(bounds.contains(&Pt2::new(2000.0, -2000.0)));
        assert!(!bounds.contains(&Pt2::new(2000.1, 0.0)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ResolverConfig {
            tolerance_px: 2.5,
            bounds: ProjectionBounds::for_image(800, 600, 2.5),
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"type\":\"rect\""));
        let restored: ResolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cfg);
    }

    #[test]
    fn config_defaults_bounds_when_missing() {
        let cfg: ResolverConfig = serde_json::from_str(r#"{"tolerance_px": 1.5}"#).unwrap();
        assert_eq!(cfg.bounds, ProjectionBounds::default());
        assert_eq!(cfg.tolerance_px, 1.5);
    }
}
