//! Scene-level evaluation of descriptor matching against homography ground truth.
//!
//! Inputs are scenes of image pairs whose keypoints and descriptor distances
//! were computed upstream. Each scene is evaluated by an independent worker on
//! the rayon pool into its own [`MetricsAccumulator`]; the accumulators are then
//! reduced into one [`Statistics`] report.
//!
//! ```no_run
//! use descmap_pipeline::{evaluate_scenes, load_json_file, EvalConfig, EvaluationInput};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input: EvaluationInput = load_json_file("hpatches_distances.json")?;
//! let stats = evaluate_scenes(&input.scenes, &EvalConfig::default())?;
//! println!("mAP (micro): {:.4}", stats.map_micro);
//! # Ok(())
//! # }
//! ```

use std::{fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use descmap_metrics::{aggregate, MetricsAccumulator, Statistics};
use log::debug;
use rayon::prelude::*;
use serde::de::DeserializeOwned;

mod config;
mod input;
mod scene;

pub use config::EvalConfig;
pub use input::{EvaluationInput, ImagePairInput, SceneInput};
pub use scene::{evaluate_pair, evaluate_scene};

/// Read and parse a JSON file.
pub fn load_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

/// Evaluate all scenes concurrently, one worker per scene.
///
/// Fails only on an invalid `config`; invalid scenes are reported through
/// `success` / `error_message` of the returned statistics.
pub fn evaluate_scenes(scenes: &[SceneInput], config: &EvalConfig) -> Result<Statistics> {
    config.validate()?;
    let start = Instant::now();

    let workers: Vec<MetricsAccumulator> = scenes
        .par_iter()
        .map(|scene| evaluate_scene(scene, config))
        .collect();

    let stats = aggregate(&workers, start.elapsed());
    debug!(
        "evaluated {} scenes in {:.1} ms: mAP micro {:.4}, macro {:.4}",
        scenes.len(),
        stats.processing_time_ms,
        stats.map_micro,
        stats.map_macro_by_scene
    );
    Ok(stats)
}
