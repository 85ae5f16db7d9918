//! High-level entry crate for the `descmap` toolbox.
//!
//! `descmap` measures how well keypoint descriptors recover known point
//! correspondences between two views of a planar scene related by a
//! homography. For every query keypoint of view A the projected position in
//! view B decides which candidate (if any) is the single correct match; the
//! descriptor distances to all candidates then give its rank and average
//! precision. Per-query results are accumulated per scene, merged across
//! workers, and summarised as micro/macro mAP, precision@K and recall@K.
//!
//! ## Scene-level evaluation
//!
//! ```no_run
//! use descmap::pipeline::{evaluate_scenes, load_json_file, EvalConfig, EvaluationInput};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input: EvaluationInput = load_json_file("distances.json")?;
//! let config = EvalConfig::from_json_file("eval.json")?;
//! let stats = evaluate_scenes(&input.scenes, &config)?;
//! println!("mAP micro {:.4}, P@1 {:.4}", stats.map_micro, stats.precision_at_1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Building blocks
//!
//! ```
//! use descmap::core::{Mat3, Pt2, ResolverConfig};
//! use descmap::metrics::{evaluate_query, MetricsAccumulator, TiePolicy};
//!
//! let outcome = evaluate_query(
//!     &Pt2::new(10.0, 10.0),
//!     &Mat3::identity(),
//!     &[Pt2::new(10.0, 10.0), Pt2::new(50.0, 50.0)],
//!     &[0.1, 9.0],
//!     &ResolverConfig::default(),
//!     TiePolicy::MidRank,
//! )
//! .unwrap();
//!
//! let mut acc = MetricsAccumulator::new();
//! acc.add_query_outcome("i_dome", outcome);
//! assert_eq!(acc.finalize().map_micro, 1.0);
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: Math types, homography projection, ground-truth resolution
//! - **[`metrics`]**: AP engine, accumulator, statistics, reducer
//! - **[`pipeline`]**: Serializable inputs, configuration, multi-scene driver
//! - **[`prelude`]**: Convenient re-exports for common use cases

/// Math types, homography projection and ground-truth resolution.
pub mod core {
    pub use descmap_core::*;
}

/// Single-GT average precision and mergeable metric accumulation.
pub mod metrics {
    pub use descmap_metrics::*;
}

/// Serializable inputs, configuration and the multi-scene evaluation driver.
pub mod pipeline {
    pub use descmap_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use descmap::prelude::*;` to get started quickly.
pub mod prelude {
    pub use descmap_core::{project_point, resolve_ground_truth, Mat3, Pt2, Real, ResolverConfig};
    pub use descmap_metrics::{
        aggregate, compute_ap, evaluate_query, MetricsAccumulator, QueryOutcome, Statistics,
        TiePolicy,
    };
    pub use descmap_pipeline::{evaluate_scenes, EvalConfig, ImagePairInput, SceneInput};
}
