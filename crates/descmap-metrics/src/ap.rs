//! Average precision of a single query with at most one relevant item.
//!
//! With exactly one relevant candidate, AP collapses to the precision at the
//! rank of that candidate, `AP = 1 / rank`. Only the rank of one known index is
//! needed, so a single linear scan over the distances replaces a full sort.

use descmap_core::{resolve_ground_truth, Mat3, Pt2, Real, ResolverConfig};
use log::warn;
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// How candidates at exactly the ground-truth distance shift its rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Ties never push the ground truth down: `rank = 1 + better`.
    Optimistic,
    /// Ties share the middle rank: `rank = 1 + better + ceil(tied / 2)`.
    #[default]
    MidRank,
    /// Every tie ranks ahead: `rank = 1 + better + tied`.
    Pessimistic,
}

impl TiePolicy {
    /// 1-based rank of the ground truth given the number of strictly better and
    /// exactly tied competitors.
    pub fn rank(self, better: usize, tied: usize) -> usize {
        let tie_shift = match self {
            TiePolicy::Optimistic => 0,
            TiePolicy::MidRank => tied.div_ceil(2),
            TiePolicy::Pessimistic => tied,
        };
        1 + better + tie_shift
    }
}

/// Result of evaluating one query.
///
/// Build processed outcomes with [`QueryOutcome::at_rank`] or
/// [`QueryOutcome::try_processed`]; deserialization rejects a rank of 0 and an
/// `ap` that is not `1 / rank`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A ground truth exists; `rank >= 1` and `ap == 1 / rank`.
    Processed { ap: Real, rank: usize },
    /// No candidate lies within tolerance of the projected query.
    Excluded,
}

impl QueryOutcome {
    /// Outcome for a ground truth found at `rank` (1-based).
    pub fn at_rank(rank: usize) -> Self {
        let rank = rank.max(1);
        QueryOutcome::Processed {
            ap: 1.0 / rank as Real,
            rank,
        }
    }

    /// Processed outcome from stored values, checking `rank >= 1` and `ap == 1 / rank`.
    pub fn try_processed(ap: Real, rank: usize) -> Result<Self, OutcomeError> {
        if rank == 0 {
            return Err(OutcomeError::ZeroRank);
        }
        let outcome = Self::at_rank(rank);
        if outcome.ap() != Some(ap) {
            return Err(OutcomeError::InconsistentAp { ap, rank });
        }
        Ok(outcome)
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, QueryOutcome::Processed { .. })
    }

    pub fn ap(&self) -> Option<Real> {
        match *self {
            QueryOutcome::Processed { ap, .. } => Some(ap),
            QueryOutcome::Excluded => None,
        }
    }

    pub fn rank(&self) -> Option<usize> {
        match *self {
            QueryOutcome::Processed { rank, .. } => Some(rank),
            QueryOutcome::Excluded => None,
        }
    }

    /// Number of relevant items: 1 when processed, 0 when excluded.
    pub fn total_relevant(&self) -> usize {
        usize::from(self.is_processed())
    }
}

impl<'de> Deserialize<'de> for QueryOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        enum Record {
            Processed { ap: Real, rank: usize },
            Excluded,
        }

        match Record::deserialize(deserializer)? {
            Record::Processed { ap, rank } => {
                QueryOutcome::try_processed(ap, rank).map_err(de::Error::custom)
            }
            Record::Excluded => Ok(QueryOutcome::Excluded),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OutcomeError {
    #[error("rank must be at least 1")]
    ZeroRank,
    #[error("ap {ap} is not 1 / rank for rank {rank}")]
    InconsistentAp { ap: Real, rank: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum QueryInputError {
    #[error("distance count {distances} does not match candidate count {candidates}")]
    LengthMismatch { distances: usize, candidates: usize },
}

#[inline]
fn ranking_distance(d: Real) -> Real {
    if d.is_nan() {
        Real::INFINITY
    } else {
        d
    }
}

/// Rank the ground truth among `distances` and derive its AP.
///
/// `distances[i]` is the descriptor distance from the query to candidate `i`;
/// unusable descriptors must be mapped to `+inf` by the caller (NaN is treated
/// the same way). Returns [`QueryOutcome::Excluded`] when there is no ground
/// truth or when `ground_truth` does not index into `distances`.
pub fn compute_ap(
    ground_truth: Option<usize>,
    distances: &[Real],
    policy: TiePolicy,
) -> QueryOutcome {
    let Some(gt_idx) = ground_truth else {
        return QueryOutcome::Excluded;
    };
    let Some(&gt_distance) = distances.get(gt_idx) else {
        warn!(
            "ground-truth index {} out of range for {} distances",
            gt_idx,
            distances.len()
        );
        return QueryOutcome::Excluded;
    };
    let gt_distance = ranking_distance(gt_distance);

    let mut better = 0usize;
    let mut tied = 0usize;
    for (idx, &d) in distances.iter().enumerate() {
        if idx == gt_idx {
            continue;
        }
        let d = ranking_distance(d);
        if d < gt_distance {
            better += 1;
        } else if d == gt_distance {
            tied += 1;
        }
    }

    QueryOutcome::at_rank(policy.rank(better, tied))
}

/// Resolve the ground truth of `query_a` and rank it among `distances`.
///
/// `distances` must be parallel to `candidates_b`.
pub fn evaluate_query(
    query_a: &Pt2,
    h_a_to_b: &Mat3,
    candidates_b: &[Pt2],
    distances: &[Real],
    resolver: &ResolverConfig,
    policy: TiePolicy,
) -> Result<QueryOutcome, QueryInputError> {
    if distances.len() != candidates_b.len() {
        return Err(QueryInputError::LengthMismatch {
            distances: distances.len(),
            candidates: candidates_b.len(),
        });
    }
    let ground_truth = resolve_ground_truth(query_a, h_a_to_b, candidates_b, resolver);
    Ok(compute_ap(ground_truth, distances, policy))
}

/// Fraction of correct matches for the legacy per-image precision series.
///
/// Returns 0 when there are no matches.
pub fn legacy_precision(correct_matches: usize, total_matches: usize) -> Real {
    if total_matches == 0 {
        return 0.0;
    }
    correct_matches as Real / total_matches as Real
}
