//! Deterministic synthetic image pairs.
//!
//! Query points of view A are mapped into view B through a known homography,
//! jittered, and mixed with random distractor keypoints. Everything is driven
//! by an explicit seed so tests stay reproducible.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{is_finite_point, project_point, Mat3, Pt2, Real};

/// Parameters for [`jittered_pair`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticPairOptions {
    /// Maximum absolute per-axis jitter (pixels) added to projected queries.
    pub jitter_px: Real,
    /// Number of random keypoints added to view B.
    pub distractors: usize,
    /// View B size used to place distractors.
    pub image_size: [u32; 2],
    /// Random-number generator seed.
    pub seed: u64,
}

impl Default for SyntheticPairOptions {
    fn default() -> Self {
        Self {
            jitter_px: 0.5,
            distractors: 0,
            image_size: [640, 480],
            seed: 7,
        }
    }
}

/// Keypoints of view B generated from queries of view A.
#[derive(Debug, Clone)]
pub struct SyntheticPair {
    /// Candidate keypoints of view B (shuffled).
    pub candidates: Vec<Pt2>,
    /// For each query, the candidate index it was projected to (if finite).
    pub planted: Vec<Option<usize>>,
}

/// Generate a planar grid of 2D points with `nx * ny` points.
///
/// Points are ordered deterministically in row-major order (Y major) and
/// start at `origin`.
pub fn grid_points_2d(nx: usize, ny: usize, spacing: Real, origin: Pt2) -> Vec<Pt2> {
    let mut points = Vec::with_capacity(nx.saturating_mul(ny));
    for j in 0..ny {
        for i in 0..nx {
            points.push(Pt2::new(
                origin.x + i as Real * spacing,
                origin.y + j as Real * spacing,
            ));
        }
    }
    points
}

/// Build view-B keypoints by projecting `queries` through `h_a_to_b`.
///
/// Each finite projection receives uniform jitter in `[-jitter_px, jitter_px]`
/// per axis. Distractors are drawn uniformly over the image and may land
/// closer to a projection than its planted keypoint.
pub fn jittered_pair(
    queries: &[Pt2],
    h_a_to_b: &Mat3,
    opts: &SyntheticPairOptions,
) -> SyntheticPair {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let jitter = opts.jitter_px.abs();

    let mut tagged: Vec<(Pt2, Option<usize>)> =
        Vec::with_capacity(queries.len() + opts.distractors);

    for (query_idx, query) in queries.iter().enumerate() {
        let projected = project_point(h_a_to_b, query);
        if !is_finite_point(&projected) {
            continue;
        }
        let dx = rng.random_range(-jitter..=jitter);
        let dy = rng.random_range(-jitter..=jitter);
        tagged.push((Pt2::new(projected.x + dx, projected.y + dy), Some(query_idx)));
    }

    let [width, height] = opts.image_size;
    for _ in 0..opts.distractors {
        let x = rng.random_range(0.0..=width as Real);
        let y = rng.random_range(0.0..=height as Real);
        tagged.push((Pt2::new(x, y), None));
    }

    tagged.shuffle(&mut rng);

    let mut planted = vec![None; queries.len()];
    let mut candidates = Vec::with_capacity(tagged.len());
    for (candidate_idx, (point, source)) in tagged.into_iter().enumerate() {
        if let Some(query_idx) = source {
            planted[query_idx] = Some(candidate_idx);
        }
        candidates.push(point);
    }

    SyntheticPair {
        candidates,
        planted,
    }
}
