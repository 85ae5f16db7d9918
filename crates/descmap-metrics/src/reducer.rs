//! Reduction of per-worker accumulators into one report.

use std::time::Duration;

use log::{debug, warn};

use crate::{MetricsAccumulator, Statistics};

/// Ranks shown in the debug rank distribution.
const HISTOGRAM_RANKS: usize = 10;

/// Merge all `workers` into a fresh accumulator.
///
/// Numeric results do not depend on the order of `workers`; only the order of
/// joined error messages does.
pub fn merge_all<'a, I>(workers: I) -> MetricsAccumulator
where
    I: IntoIterator<Item = &'a MetricsAccumulator>,
{
    let mut overall = MetricsAccumulator::new();
    for worker in workers {
        overall.merge(worker);
    }
    overall
}

/// Merge all `workers`, record `elapsed` as the run time and finalize.
pub fn aggregate<'a, I>(workers: I, elapsed: Duration) -> Statistics
where
    I: IntoIterator<Item = &'a MetricsAccumulator>,
{
    let mut overall = merge_all(workers);
    overall.processing_time_ms = elapsed.as_secs_f64() * 1e3;

    let hist = overall.rank_histogram(HISTOGRAM_RANKS);
    debug!(
        "rank distribution: ranks 1-{} {:?}, beyond {}, excluded {}",
        HISTOGRAM_RANKS, hist.counts, hist.beyond, hist.excluded
    );
    if !overall.success {
        warn!("evaluation finished with failures: {}", overall.error_message);
    }

    overall.finalize()
}
