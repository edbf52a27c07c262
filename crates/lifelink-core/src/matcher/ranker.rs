//! Final ordering of scored candidates.

use std::cmp::Ordering;

use crate::models::ScoredCandidate;

/// Default number of results returned to callers.
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Sort by score descending, then distance ascending, then donor id, and keep the top `limit`.
pub fn rank(mut scored: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.distance_meters
                    .partial_cmp(&b.distance_meters)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(limit);
    scored
}
