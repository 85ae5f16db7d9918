//! Evaluation configuration.

use std::path::Path;

use anyhow::{ensure, Result};
use descmap_core::{ProjectionBounds, Real, ResolverConfig};
use descmap_metrics::TiePolicy;
use serde::{Deserialize, Serialize};

use crate::load_json_file;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Pixel tolerance and fast-reject bounds of the ground-truth resolver.
    pub resolver: ResolverConfig,
    /// Rank assigned to a ground truth tied with other candidates.
    pub tie_policy: TiePolicy,
    /// When set, pairs that carry their target image size are fast-rejected
    /// against that image grown by this margin instead of `resolver.bounds`.
    pub image_margin_px: Option<Real>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            tie_policy: TiePolicy::MidRank,
            image_margin_px: None,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        let tol = self.resolver.tolerance_px;
        ensure!(
            tol.is_finite() && tol >= 0.0,
            "tolerance_px must be finite and non-negative, got {}",
            tol
        );
        if let Some(margin) = self.image_margin_px {
            ensure!(
                margin.is_finite() && margin >= 0.0,
                "image_margin_px must be finite and non-negative, got {}",
                margin
            );
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: EvalConfig = load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolver settings for a pair whose target image is `image_size` (if known).
    pub fn resolver_for(&self, image_size: Option<[u32; 2]>) -> ResolverConfig {
        match (self.image_margin_px, image_size) {
            (Some(margin), Some([width, height])) => self
                .resolver
                .with_bounds(ProjectionBounds::for_image(width, height, margin)),
            _ => self.resolver,
        }
    }
}
