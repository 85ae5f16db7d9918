//! Summary statistics derived from a [`MetricsAccumulator`].
//!
//! Every value is recomputed from the raw observations. Sums run over
//! value-sorted copies, so the result does not depend on the order in which
//! observations were recorded or accumulators were merged.

use std::collections::BTreeMap;

use descmap_core::Real;
use serde::{Deserialize, Serialize};

use crate::{MetricsAccumulator, SceneObservations};

/// Cut-offs reported as `precision_at_K` / `recall_at_K`.
pub const REPORTED_K: [usize; 3] = [1, 5, 10];

pub(crate) fn ordered_sum(values: impl IntoIterator<Item = Real>) -> Real {
    let mut values: Vec<Real> = values.into_iter().collect();
    values.sort_by(Real::total_cmp);
    values.iter().sum()
}

/// Mean of `values`, 0 when empty.
pub(crate) fn ordered_mean(values: impl IntoIterator<Item = Real>) -> Real {
    let values: Vec<Real> = values.into_iter().collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len();
    ordered_sum(values) / n as Real
}

fn ratio(numerator: Real, denominator: usize) -> Real {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as Real
    }
}

/// Share of `ranks` within each of [`REPORTED_K`].
fn hit_rates(ranks: impl IntoIterator<Item = usize>) -> [Real; 3] {
    let mut total = 0usize;
    let mut hits = [0usize; 3];
    for rank in ranks {
        total += 1;
        for (hit, k) in hits.iter_mut().zip(REPORTED_K) {
            if rank <= k {
                *hit += 1;
            }
        }
    }
    hits.map(|h| ratio(h as Real, total))
}

/// Per-scene breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneStatistics {
    pub mean_legacy_precision: Real,
    /// Mean AP over processed queries.
    pub map: Real,
    /// Mean AP with excluded queries counted as 0.
    pub map_including_excluded: Real,
    pub precision_at_1: Real,
    pub precision_at_5: Real,
    pub precision_at_10: Real,
    pub matches: usize,
    pub keypoints: usize,
    pub images: usize,
    pub queries_processed: usize,
    pub queries_excluded: usize,
}

impl SceneStatistics {
    pub fn from_observations(obs: &SceneObservations) -> Self {
        let queries_processed = obs.processed_count();
        let ap_sum = ordered_sum(obs.processed_aps());
        let [precision_at_1, precision_at_5, precision_at_10] = hit_rates(obs.processed_ranks());

        Self {
            mean_legacy_precision: ordered_mean(obs.legacy_precisions.iter().copied()),
            map: ratio(ap_sum, queries_processed),
            map_including_excluded: ratio(ap_sum, obs.outcomes.len()),
            precision_at_1,
            precision_at_5,
            precision_at_10,
            matches: obs.matches,
            keypoints: obs.keypoints,
            images: obs.images,
            queries_processed,
            queries_excluded: obs.excluded_count(),
        }
    }
}

/// Final report of a run (or partial run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean of all legacy per-image precisions.
    pub mean_legacy_precision: Real,
    /// Mean over scenes of each scene's mean legacy precision.
    pub macro_legacy_precision_by_scene: Real,
    /// Mean AP over processed queries.
    pub map_micro: Real,
    /// Mean over scenes of each scene's mean AP (scenes with processed queries).
    pub map_macro_by_scene: Real,
    /// Like `map_micro`, excluded queries counted with AP = 0.
    pub map_micro_including_excluded: Real,
    /// Like `map_macro_by_scene` (same scenes), excluded queries counted with AP = 0.
    pub map_macro_by_scene_including_excluded: Real,
    pub precision_at_1: Real,
    pub precision_at_5: Real,
    pub precision_at_10: Real,
    pub recall_at_1: Real,
    pub recall_at_5: Real,
    pub recall_at_10: Real,
    pub total_matches: usize,
    pub total_keypoints: usize,
    pub total_images: usize,
    pub total_queries_processed: usize,
    pub total_queries_excluded: usize,
    pub per_scene: BTreeMap<String, SceneStatistics>,
    pub processing_time_ms: Real,
    pub success: bool,
    pub error_message: String,
}

impl Statistics {
    /// Compute every statistic from the raw observations of `acc`.
    pub fn from_accumulator(acc: &MetricsAccumulator) -> Self {
        let mut per_scene = BTreeMap::new();
        let mut legacy_scene_means = Vec::new();
        let mut map_scene_means = Vec::new();
        let mut map_scene_means_including = Vec::new();

        for (name, obs) in acc.scenes() {
            let scene = SceneStatistics::from_observations(obs);
            if !obs.legacy_precisions.is_empty() {
                legacy_scene_means.push(scene.mean_legacy_precision);
            }
            // Scenes without a processed query take part in neither macro mean.
            if scene.queries_processed > 0 {
                map_scene_means.push(scene.map);
                map_scene_means_including.push(scene.map_including_excluded);
            }
            per_scene.insert(name.clone(), scene);
        }

        let scenes = acc.scenes().values();
        let total_queries_processed = acc.queries_processed();
        let total_queries_excluded = acc.queries_excluded();
        let ap_sum = ordered_sum(scenes.clone().flat_map(|obs| obs.processed_aps()));
        let [precision_at_1, precision_at_5, precision_at_10] =
            hit_rates(scenes.clone().flat_map(|obs| obs.processed_ranks()));

        Self {
            mean_legacy_precision: ordered_mean(
                scenes
                    .clone()
                    .flat_map(|obs| obs.legacy_precisions.iter().copied()),
            ),
            macro_legacy_precision_by_scene: ordered_mean(legacy_scene_means),
            map_micro: ratio(ap_sum, total_queries_processed),
            map_macro_by_scene: ordered_mean(map_scene_means),
            map_micro_including_excluded: ratio(
                ap_sum,
                total_queries_processed + total_queries_excluded,
            ),
            map_macro_by_scene_including_excluded: ordered_mean(map_scene_means_including),
            precision_at_1,
            precision_at_5,
            precision_at_10,
            // One relevant item per query: recall@K is precision@K.
            recall_at_1: precision_at_1,
            recall_at_5: precision_at_5,
            recall_at_10: precision_at_10,
            total_matches: scenes.clone().map(|obs| obs.matches).sum(),
            total_keypoints: scenes.clone().map(|obs| obs.keypoints).sum(),
            total_images: scenes.map(|obs| obs.images).sum(),
            total_queries_processed,
            total_queries_excluded,
            per_scene,
            processing_time_ms: acc.processing_time_ms,
            success: acc.success,
            error_message: acc.error_message.clone(),
        }
    }

    /// Total number of evaluated queries.
    pub fn total_queries(&self) -> usize {
        self.total_queries_processed + self.total_queries_excluded
    }
}
