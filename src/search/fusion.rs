//! Fusion of the semantic and structured candidate sets.
//!
//! The structured filter acts as a hard gate: when any structural
//! constraint is present, only listings that satisfy it can appear in
//! the output. Semantic similarity then ranks the survivors. Listings
//! that pass the filter but fall outside the top semantic candidates
//! are appended with a fallback score strictly below every scored
//! survivor, so semantic evidence always ranks first.

use std::collections::HashSet;

use crate::search::{MatchSource, SearchHit};
use crate::types::ListingId;
use crate::vector::Similarity;

/// Margin below the weakest scored survivor assigned to filter-only
/// results. Keeps their relative order stable under id tie-break.
pub const FILTER_ONLY_EPSILON: f32 = 1e-3;

/// Merge semantic candidates with the structured filter's match set.
///
/// `semantic` is the index's top-k, already sorted by similarity.
/// `filter_ids` is every listing satisfying the structured constraints.
/// `filter_is_trivial` signals a pure free-text query: no gating, the
/// semantic ranking passes through as-is.
///
/// Output is deduplicated by listing, sorted score descending with
/// listing ID ascending as tie-break, and truncated to `limit`.
pub fn fuse(
    semantic: &[(ListingId, Similarity)],
    filter_ids: &[ListingId],
    filter_is_trivial: bool,
    limit: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = if filter_is_trivial {
        semantic
            .iter()
            .map(|&(listing_id, sim)| SearchHit {
                listing_id,
                score: sim.get(),
                source: MatchSource::Semantic,
            })
            .collect()
    } else {
        let gate: HashSet<ListingId> = filter_ids.iter().copied().collect();

        let mut scored: Vec<SearchHit> = semantic
            .iter()
            .filter(|(id, _)| gate.contains(id))
            .map(|&(listing_id, sim)| SearchHit {
                listing_id,
                score: sim.get(),
                source: MatchSource::Both,
            })
            .collect();

        let fallback = scored
            .iter()
            .map(|h| h.score)
            .fold(f32::NAN, f32::min);
        let fallback = if fallback.is_nan() {
            0.0
        } else {
            fallback - FILTER_ONLY_EPSILON
        };

        let seen: HashSet<ListingId> = scored.iter().map(|h| h.listing_id).collect();
        scored.extend(
            filter_ids
                .iter()
                .filter(|id| !seen.contains(id))
                .map(|&listing_id| SearchHit {
                    listing_id,
                    score: fallback,
                    source: MatchSource::Filter,
                }),
        );
        scored
    };

    hits.sort_unstable_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.listing_id.cmp(&b.listing_id))
    });
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ListingId {
        ListingId::new(n).unwrap()
    }

    fn sim(v: f32) -> Similarity {
        Similarity::new(v).unwrap()
    }

    #[test]
    fn trivial_filter_passes_semantic_through() {
        let semantic = vec![(id(3), sim(0.9)), (id(1), sim(0.7)), (id(2), sim(0.5))];
        let hits = fuse(&semantic, &[id(1), id(2), id(3), id(4)], true, 10);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].listing_id, id(3));
        assert!(hits.iter().all(|h| h.source == MatchSource::Semantic));
        // id(4) never appears: no gating means no filter-only entries.
        assert!(hits.iter().all(|h| h.listing_id != id(4)));
    }

    #[test]
    fn hard_gate_excludes_semantic_nonmatches() {
        let semantic = vec![(id(5), sim(0.95)), (id(2), sim(0.6))];
        let hits = fuse(&semantic, &[id(2)], false, 10);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].listing_id, id(2));
        assert_eq!(hits[0].source, MatchSource::Both);
    }

    #[test]
    fn filter_only_scores_below_weakest_survivor() {
        let semantic = vec![(id(1), sim(0.8)), (id(2), sim(0.3))];
        let hits = fuse(&semantic, &[id(1), id(2), id(7), id(9)], false, 10);

        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].listing_id, id(1));
        assert_eq!(hits[1].listing_id, id(2));
        // Filter-only entries share one score just under 0.3, so the
        // id tie-break orders them.
        assert_eq!(hits[2].listing_id, id(7));
        assert_eq!(hits[3].listing_id, id(9));
        assert!(hits[2].score < hits[1].score);
        assert_eq!(hits[2].score, hits[3].score);
        assert_eq!(hits[2].source, MatchSource::Filter);
    }

    #[test]
    fn no_semantic_survivors_uses_zero_base() {
        let semantic = vec![(id(1), sim(0.9))];
        let hits = fuse(&semantic, &[id(4), id(2)], false, 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].listing_id, id(2));
        assert_eq!(hits[1].listing_id, id(4));
        assert_eq!(hits[0].score, 0.0);
    }

    #[test]
    fn each_listing_appears_once() {
        let semantic = vec![(id(1), sim(0.9)), (id(2), sim(0.8))];
        let hits = fuse(&semantic, &[id(1), id(2), id(3)], false, 10);

        let mut ids: Vec<_> = hits.iter().map(|h| h.listing_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), hits.len());
    }

    #[test]
    fn truncates_to_limit() {
        let semantic: Vec<_> = (1..=8)
            .map(|n| (id(n), sim(1.0 - n as f32 * 0.05)))
            .collect();
        let hits = fuse(&semantic, &[], true, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].listing_id, id(1));
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        assert!(fuse(&[], &[], false, 10).is_empty());
        assert!(fuse(&[], &[], true, 10).is_empty());
    }
}
