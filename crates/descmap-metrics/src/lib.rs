//! Retrieval metrics for descriptor evaluation under a single ground-truth policy.
//!
//! Per query, the geometric ground truth (see [`descmap_core::resolve_ground_truth`])
//! and the descriptor distances to every candidate give a [`QueryOutcome`]. Outcomes
//! are recorded per scene in a [`MetricsAccumulator`]; accumulators built by
//! independent workers are merged with [`aggregate`] and summarised as
//! [`Statistics`].
//!
//! ```
//! use descmap_metrics::{compute_ap, MetricsAccumulator, TiePolicy};
//!
//! let outcome = compute_ap(Some(0), &[5.0, 1.0, 2.0], TiePolicy::MidRank);
//! assert_eq!(outcome.rank(), Some(3));
//!
//! let mut acc = MetricsAccumulator::new();
//! acc.add_query_outcome("v_wall", outcome);
//! let stats = acc.finalize();
//! assert!((stats.map_micro - 1.0 / 3.0).abs() < 1e-12);
//! ```

/// Query AP engine.
pub mod ap;
/// Per-scene raw observations and their merge.
pub mod accumulator;
/// Final statistics derived from raw observations.
pub mod statistics;
/// Fold of per-worker accumulators.
pub mod reducer;

pub use accumulator::*;
pub use ap::*;
pub use reducer::*;
pub use statistics::*;
