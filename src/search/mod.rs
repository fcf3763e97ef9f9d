//! Hybrid search core: fusion of semantic and structured candidates,
//! and the orchestrator that sequences a request end to end.

mod fusion;
mod orchestrator;

pub use fusion::{FILTER_ONLY_EPSILON, fuse};
pub use orchestrator::{EngineStats, SearchEngine};

use serde::Serialize;

use crate::types::{Listing, ListingId};

/// Where a result came from in the hybrid pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Top semantic candidate; no structural filter was in play.
    Semantic,
    /// Satisfied the structured filter but was not among the top
    /// semantic candidates.
    Filter,
    /// Satisfied the filter and ranked among the top semantic
    /// candidates.
    Both,
}

/// One ranked result, pre-join: just the ID, score, and provenance.
///
/// Ordering is score descending, ties broken by listing ID ascending
/// for determinism. Scores are comparable within one response but not
/// bounded to [0, 1] after fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub listing_id: ListingId,
    pub score: f32,
    pub source: MatchSource,
}

/// A hit joined back to its full listing record.
#[derive(Debug, Clone, Serialize)]
pub struct RankedListing {
    pub listing: Listing,
    pub score: f32,
    pub source: MatchSource,
}

/// Outcome status, surfaced to adapters instead of errors for the
/// non-fatal cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Results found, full hybrid pipeline ran.
    Ok,
    /// Query was empty or blank; nothing to search for.
    EmptyQuery,
    /// Embedding encoder was unavailable; results are filter-only,
    /// ranked by the fallback criterion (price ascending).
    Degraded,
    /// Valid query, no matching listings. Not a failure.
    NoResults,
}

/// Adapter-facing response: ranked listings plus how the request went.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<RankedListing>,
    pub status: SearchStatus,
}

impl SearchOutcome {
    pub(crate) fn empty(status: SearchStatus) -> Self {
        Self {
            results: Vec::new(),
            status,
        }
    }

    /// True when the semantic arm was skipped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status == SearchStatus::Degraded
    }
}
