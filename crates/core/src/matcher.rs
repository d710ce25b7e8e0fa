//! Nearest-neighbour matching of a query embedding against enrolled
//! customers.
//!
//! Matching is an exact brute-force linear scan, O(N * D) per query.

use crate::types::UnitVector;

/// The closest candidate found by [`find_best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct Match<K> {
    /// Identifier of the matched candidate.
    pub id: K,
    /// Cosine distance to the query. Lower values indicate higher similarity.
    pub distance: f64,
}

/// Cosine distance between two unit vectors.
///
/// Returns a value in `[0, 2]` where 0 means identical direction and 2
/// means opposite direction. Both inputs are unit length, so the distance is
/// `1 - dot(a, b)`; the result is clamped to absorb floating point drift.
#[must_use]
pub fn cosine_distance(a: &UnitVector, b: &UnitVector) -> f64 {
    (1.0 - a.dot(b)).clamp(0.0, 2.0)
}

/// Find the candidate closest to `query`.
///
/// Candidates are scanned in the order given. Only a strictly smaller
/// distance replaces the current best, so on ties the first candidate wins.
/// Returns `None` when there are no candidates.
pub fn find_best_match<'a, K, I>(query: &UnitVector, candidates: I) -> Option<Match<K>>
where
    K: Clone + 'a,
    I: IntoIterator<Item = (&'a K, &'a UnitVector)>,
{
    let mut best: Option<Match<K>> = None;

    for (id, candidate) in candidates {
        let distance = cosine_distance(query, candidate);
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(Match {
                id: id.clone(),
                distance,
            });
        }
    }

    best
}
