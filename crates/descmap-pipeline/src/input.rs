//! Serializable evaluation inputs.
//!
//! A scene is a reference image (view A) compared against several target
//! images (view B). Keypoints, descriptors and their distances are produced
//! upstream; this module only carries and validates them.

use anyhow::{ensure, Context, Result};
use descmap_core::{mat3_from_rows, Mat3, Pt2, Real};
use serde::{Deserialize, Serialize};

/// One reference/target image pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePairInput {
    /// Label of the target image (e.g. `"1-3"`).
    #[serde(default)]
    pub name: String,
    /// Homography mapping view A to view B, `h[row][col]`.
    pub homography: [[Real; 3]; 3],
    /// Target image `[width, height]`, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<[u32; 2]>,
    /// Query keypoints in view A.
    pub queries: Vec<[Real; 2]>,
    /// Candidate keypoints in view B.
    pub candidates: Vec<[Real; 2]>,
    /// Descriptor distances, one row per query and one entry per candidate.
    ///
    /// A `null` row marks an unusable query descriptor (the query is excluded);
    /// a `null` entry marks an unusable candidate descriptor (ranked last).
    pub distances: Vec<Option<Vec<Option<Real>>>>,
    /// Matches reported by the upstream matcher for the legacy precision.
    #[serde(default)]
    pub matches: usize,
    /// Correct matches among `matches`.
    #[serde(default)]
    pub correct_matches: usize,
}

impl ImagePairInput {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.homography.iter().flatten().all(|v| v.is_finite()),
            "homography has non-finite entries"
        );
        ensure!(
            self.distances.len() == self.queries.len(),
            "distance rows must match query count: {} vs {}",
            self.distances.len(),
            self.queries.len()
        );
        for (idx, row) in self.distances.iter().enumerate() {
            if let Some(row) = row {
                ensure!(
                    row.len() == self.candidates.len(),
                    "distance row {} has {} entries, expected {}",
                    idx,
                    row.len(),
                    self.candidates.len()
                );
            }
        }
        ensure!(
            self.correct_matches <= self.matches,
            "correct matches exceed matches: {} > {}",
            self.correct_matches,
            self.matches
        );
        Ok(())
    }

    pub fn homography(&self) -> Mat3 {
        mat3_from_rows(&self.homography)
    }

    pub fn query_points(&self) -> Vec<Pt2> {
        self.queries.iter().map(|p| Pt2::new(p[0], p[1])).collect()
    }

    pub fn candidate_points(&self) -> Vec<Pt2> {
        self.candidates.iter().map(|p| Pt2::new(p[0], p[1])).collect()
    }
}

/// All image pairs of one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneInput {
    /// Scene name (e.g. `"v_wall"`).
    pub name: String,
    pub pairs: Vec<ImagePairInput>,
}

impl SceneInput {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.is_empty(), "scene name must not be empty");
        for (idx, pair) in self.pairs.iter().enumerate() {
            pair.validate()
                .with_context(|| format!("pair {} ({:?})", idx, pair.name))?;
        }
        Ok(())
    }
}

/// A full evaluation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub scenes: Vec<SceneInput>,
}
