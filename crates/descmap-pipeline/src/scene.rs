//! Per-scene worker.

use anyhow::Result;
use descmap_core::Real;
use descmap_metrics::{evaluate_query, legacy_precision, MetricsAccumulator, QueryOutcome};
use log::{debug, warn};

use crate::{EvalConfig, ImagePairInput, SceneInput};

/// Evaluate every query of one image pair into `acc`.
///
/// Unusable candidate descriptors (`null`) rank as `+inf`; an unusable query
/// descriptor excludes the query. One legacy image result is recorded per pair.
/// An invalid pair is rejected before anything is recorded.
pub fn evaluate_pair(
    acc: &mut MetricsAccumulator,
    scene: &str,
    pair: &ImagePairInput,
    config: &EvalConfig,
) -> Result<()> {
    pair.validate()?;
    let h = pair.homography();
    let resolver = config.resolver_for(pair.image_size);
    let candidates = pair.candidate_points();

    let mut row = Vec::with_capacity(candidates.len());
    for (query, distances) in pair.query_points().iter().zip(&pair.distances) {
        let outcome = match distances {
            None => QueryOutcome::Excluded,
            Some(distances) => {
                row.clear();
                row.extend(distances.iter().map(|d| d.unwrap_or(Real::INFINITY)));
                evaluate_query(query, &h, &candidates, &row, &resolver, config.tie_policy)?
            }
        };
        acc.add_query_outcome(scene, outcome);
    }

    acc.add_image_result(
        scene,
        legacy_precision(pair.correct_matches, pair.matches),
        pair.matches,
        candidates.len(),
    );
    Ok(())
}

fn try_evaluate_scene(scene: &SceneInput, config: &EvalConfig) -> Result<MetricsAccumulator> {
    scene.validate()?;

    let mut acc = MetricsAccumulator::new();
    for pair in &scene.pairs {
        evaluate_pair(&mut acc, &scene.name, pair, config)?;
    }
    Ok(acc)
}

/// Evaluate one scene into its own accumulator.
///
/// Invalid input does not abort the run: the scene yields a failed, empty
/// accumulator whose message names the scene.
pub fn evaluate_scene(scene: &SceneInput, config: &EvalConfig) -> MetricsAccumulator {
    match try_evaluate_scene(scene, config) {
        Ok(acc) => {
            if let Some(obs) = acc.scene(&scene.name) {
                debug!(
                    "scene {}: {} pairs, {} queries processed, {} excluded",
                    scene.name,
                    obs.images,
                    obs.processed_count(),
                    obs.excluded_count()
                );
            }
            acc
        }
        Err(err) => {
            warn!("scene {} failed: {:#}", scene.name, err);
            MetricsAccumulator::failed(format!("{}: {:#}", scene.name, err))
        }
    }
}
