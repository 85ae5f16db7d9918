//! Raw, mergeable evaluation observations.
//!
//! A [`MetricsAccumulator`] is owned by one worker (typically one scene) and
//! only grows: observations are appended or another accumulator is merged in.
//! Summary values are never stored here; [`MetricsAccumulator::finalize`]
//! recomputes them from scratch each time.

use std::collections::BTreeMap;

use descmap_core::Real;
use serde::{Deserialize, Serialize};

use crate::{QueryOutcome, Statistics};

/// Everything recorded for one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneObservations {
    /// Legacy per-image precision values (compatibility series).
    pub legacy_precisions: Vec<Real>,
    /// Matches reported with the legacy image results.
    pub matches: usize,
    /// Keypoints reported with the legacy image results.
    pub keypoints: usize,
    /// Number of image results recorded.
    pub images: usize,
    /// One entry per evaluated query, in insertion order.
    pub outcomes: Vec<QueryOutcome>,
}

impl SceneObservations {
    /// AP of every processed query.
    pub fn processed_aps(&self) -> impl Iterator<Item = Real> + '_ {
        self.outcomes.iter().filter_map(QueryOutcome::ap)
    }

    /// Rank of every processed query.
    pub fn processed_ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.outcomes.iter().filter_map(QueryOutcome::rank)
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn excluded_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }

    fn merge(&mut self, other: &SceneObservations) {
        self.legacy_precisions
            .extend_from_slice(&other.legacy_precisions);
        self.matches += other.matches;
        self.keypoints += other.keypoints;
        self.images += other.images;
        self.outcomes.extend_from_slice(&other.outcomes);
    }
}

/// Distribution of ground-truth ranks over recorded queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankHistogram {
    /// `counts[r - 1]` is the number of queries ranked `r`.
    pub counts: Vec<usize>,
    /// Processed queries ranked outside `1..=max_rank` (including a malformed rank 0).
    pub beyond: usize,
    /// Queries without a ground truth.
    pub excluded: usize,
}

/// Mergeable store of per-scene observations plus worker status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsAccumulator {
    scenes: BTreeMap<String, SceneObservations>,
    /// `false` once any contributing worker failed.
    pub success: bool,
    /// Failure messages joined with `"; "`.
    pub error_message: String,
    /// Wall time of the run, set by the reducer.
    pub processing_time_ms: Real,
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAccumulator {
    /// Empty, successful accumulator.
    pub fn new() -> Self {
        Self {
            scenes: BTreeMap::new(),
            success: true,
            error_message: String::new(),
            processing_time_ms: 0.0,
        }
    }

    /// Empty accumulator marking a failed unit of work.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// Mark this accumulator as failed, keeping what was recorded so far.
    pub fn record_failure(&mut self, message: &str) {
        self.success = false;
        self.append_error(message);
    }

    fn append_error(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        if !self.error_message.is_empty() {
            self.error_message.push_str("; ");
        }
        self.error_message.push_str(message);
    }

    fn scene_mut(&mut self, scene: &str) -> &mut SceneObservations {
        self.scenes.entry(scene.to_owned()).or_default()
    }

    /// Record a legacy per-image precision together with its raw counts.
    pub fn add_image_result(
        &mut self,
        scene: &str,
        legacy_precision: Real,
        match_count: usize,
        keypoint_count: usize,
    ) {
        let obs = self.scene_mut(scene);
        obs.legacy_precisions.push(legacy_precision);
        obs.matches += match_count;
        obs.keypoints += keypoint_count;
        obs.images += 1;
    }

    /// Record the outcome of one query.
    pub fn add_query_outcome(&mut self, scene: &str, outcome: QueryOutcome) {
        self.scene_mut(scene).outcomes.push(outcome);
    }

    /// Fold `other` into `self`.
    ///
    /// Observation lists are concatenated and counts summed; `success` is the
    /// logical AND and non-empty error messages are joined with `"; "`.
    /// `processing_time_ms` is left untouched.
    pub fn merge(&mut self, other: &MetricsAccumulator) {
        self.success &= other.success;
        self.append_error(&other.error_message);

        for (scene, obs) in &other.scenes {
            match self.scenes.get_mut(scene) {
                Some(dst) => dst.merge(obs),
                None => {
                    self.scenes.insert(scene.clone(), obs.clone());
                }
            }
        }
    }

    /// Summary statistics over everything recorded so far.
    ///
    /// Pure: repeated calls on an unchanged accumulator give identical results.
    pub fn finalize(&self) -> Statistics {
        Statistics::from_accumulator(self)
    }

    /// All scenes, keyed by name.
    pub fn scenes(&self) -> &BTreeMap<String, SceneObservations> {
        &self.scenes
    }

    pub fn scene(&self, scene: &str) -> Option<&SceneObservations> {
        self.scenes.get(scene)
    }

    /// Names of scenes with at least one image result, sorted.
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes
            .iter()
            .filter(|(_, obs)| !obs.legacy_precisions.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Mean legacy precision of one scene, if it has image results.
    pub fn scene_legacy_precision(&self, scene: &str) -> Option<Real> {
        let obs = self.scenes.get(scene)?;
        if obs.legacy_precisions.is_empty() {
            return None;
        }
        Some(crate::statistics::ordered_mean(
            obs.legacy_precisions.iter().copied(),
        ))
    }

    /// Number of queries with a ground truth.
    pub fn queries_processed(&self) -> usize {
        self.scenes.values().map(SceneObservations::processed_count).sum()
    }

    /// Number of queries without a ground truth.
    pub fn queries_excluded(&self) -> usize {
        self.scenes.values().map(SceneObservations::excluded_count).sum()
    }

    /// Fraction of processed queries whose ground truth ranks within the top `k`.
    ///
    /// Returns 0 when no query was processed.
    pub fn precision_at(&self, k: usize) -> Real {
        let mut processed = 0usize;
        let mut hits = 0usize;
        for rank in self.scenes.values().flat_map(|obs| obs.processed_ranks()) {
            processed += 1;
            if rank <= k {
                hits += 1;
            }
        }
        if processed == 0 {
            return 0.0;
        }
        hits as Real / processed as Real
    }

    /// Recall within the top `k`; identical to [`Self::precision_at`] with one
    /// relevant item per query.
    pub fn recall_at(&self, k: usize) -> Real {
        self.precision_at(k)
    }

    /// Rank distribution for ranks `1..=max_rank`.
    pub fn rank_histogram(&self, max_rank: usize) -> RankHistogram {
        let mut hist = RankHistogram {
            counts: vec![0; max_rank],
            ..Default::default()
        };
        for outcome in self.scenes.values().flat_map(|obs| obs.outcomes.iter()) {
            match outcome.rank() {
                Some(rank @ 1..) if rank <= max_rank => hist.counts[rank - 1] += 1,
                Some(_) => hist.beyond += 1,
                None => hist.excluded += 1,
            }
        }
        hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accumulator_is_empty_and_successful() {
        let acc = MetricsAccumulator::new();
        assert!(acc.success);
        assert!(acc.error_message.is_empty());
        assert!(acc.scenes().is_empty());
        assert_eq!(acc.queries_processed(), 0);
    }

    #[test]
    fn image_results_count_images_explicitly() {
        let mut acc = MetricsAccumulator::new();
        acc.add_image_result("i_dome", 0.5, 10, 100);
        acc.add_image_result("i_dome", 1.0, 0, 80);
        acc.add_image_result("v_wall", 0.25, 4, 50);

        let dome = acc.scene("i_dome").unwrap();
        assert_eq!(dome.images, 2);
        assert_eq!(dome.matches, 10);
        assert_eq!(dome.keypoints, 180);
        assert_eq!(acc.scene_names(), vec!["i_dome", "v_wall"]);
        assert_eq!(acc.scene_legacy_precision("i_dome"), Some(0.75));
        assert_eq!(acc.scene_legacy_precision("missing"), None);
    }

    #[test]
    fn query_only_scenes_have_no_legacy_name() {
        let mut acc = MetricsAccumulator::new();
        acc.add_query_outcome("v_wall", QueryOutcome::Excluded);
        assert!(acc.scene_names().is_empty());
        assert_eq!(acc.scene_legacy_precision("v_wall"), None);
        assert_eq!(acc.queries_excluded(), 1);
    }

    #[test]
    fn precision_at_k_ignores_excluded_queries() {
        let mut acc = MetricsAccumulator::new();
        for rank in [1, 3, 1, 5, 2, 10, 1] {
            acc.add_query_outcome("s", QueryOutcome::at_rank(rank));
        }
        acc.add_query_outcome("s", QueryOutcome::Excluded);

        assert!((acc.precision_at(1) - 3.0 / 7.0).abs() < 1e-15);
        assert!((acc.precision_at(5) - 6.0 / 7.0).abs() < 1e-15);
        assert_eq!(acc.precision_at(10), 1.0);
        assert_eq!(acc.recall_at(5), acc.precision_at(5));
    }

    #[test]
    fn precision_at_k_without_processed_queries_is_zero() {
        let mut acc = MetricsAccumulator::new();
        acc.add_query_outcome("s", QueryOutcome::Excluded);
        assert_eq!(acc.precision_at(1), 0.0);
    }

    #[test]
    fn merge_joins_failures() {
        let mut acc = MetricsAccumulator::new();
        acc.merge(&MetricsAccumulator::failed("scene a: unreadable"));
        acc.merge(&MetricsAccumulator::new());
        acc.merge(&MetricsAccumulator::failed("scene b: no homography"));

        assert!(!acc.success);
        assert_eq!(acc.error_message, "scene a: unreadable; scene b: no homography");
    }

    #[test]
    fn merge_keeps_numbers_of_failed_siblings() {
        let mut ok = MetricsAccumulator::new();
        ok.add_query_outcome("a", QueryOutcome::at_rank(2));

        let mut partial = MetricsAccumulator::new();
        partial.add_query_outcome("b", QueryOutcome::at_rank(1));
        partial.record_failure("b: descriptor extraction failed");

        ok.merge(&partial);
        assert!(!ok.success);
        assert_eq!(ok.queries_processed(), 2);
    }

    #[test]
    fn merge_concatenates_shared_scenes() {
        let mut a = MetricsAccumulator::new();
        a.add_image_result("s", 0.5, 2, 20);
        a.add_query_outcome("s", QueryOutcome::at_rank(1));

        let mut b = MetricsAccumulator::new();
        b.add_image_result("s", 0.7, 3, 30);
        b.add_query_outcome("s", QueryOutcome::Excluded);
        b.add_query_outcome("t", QueryOutcome::at_rank(4));

        a.merge(&b);
        let s = a.scene("s").unwrap();
        assert_eq!(s.legacy_precisions, vec![0.5, 0.7]);
        assert_eq!(s.matches, 5);
        assert_eq!(s.keypoints, 50);
        assert_eq!(s.images, 2);
        assert_eq!(s.outcomes.len(), 2);
        assert_eq!(a.scenes().len(), 2);
    }

    #[test]
    fn merge_ignores_processing_time() {
        let mut a = MetricsAccumulator::new();
        a.processing_time_ms = 12.0;
        let mut b = MetricsAccumulator::new();
        b.processing_time_ms = 30.0;
        a.merge(&b);
        assert_eq!(a.processing_time_ms, 12.0);
    }

    #[test]
    fn rank_histogram_buckets() {
        let mut acc = MetricsAccumulator::new();
        for rank in [1, 1, 2, 12] {
            acc.add_query_outcome("s", QueryOutcome::at_rank(rank));
        }
        acc.add_query_outcome("s", QueryOutcome::Excluded);

        let hist = acc.rank_histogram(3);
        assert_eq!(hist.counts, vec![2, 1, 0]);
        assert_eq!(hist.beyond, 1);
        assert_eq!(hist.excluded, 1);
    }

    #[test]
    fn rank_histogram_counts_zero_rank_as_out_of_range() {
        let mut acc = MetricsAccumulator::new();
        acc.add_query_outcome("s", QueryOutcome::Processed { ap: 1.0, rank: 0 });
        acc.add_query_outcome("s", QueryOutcome::at_rank(1));

        let hist = acc.rank_histogram(3);
        assert_eq!(hist.counts, vec![1, 0, 0]);
        assert_eq!(hist.beyond, 1);
        assert_eq!(acc.rank_histogram(0).beyond, 2);
    }

    #[test]
    fn accumulator_serde_roundtrip() {
        let mut acc = MetricsAccumulator::new();
        acc.add_image_result("s", 0.5, 2, 20);
        acc.add_query_outcome("s", QueryOutcome::at_rank(3));
        acc.add_query_outcome("s", QueryOutcome::Excluded);

        let json = serde_json::to_string(&acc).unwrap();
        let restored: MetricsAccumulator = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, acc);
    }
}
