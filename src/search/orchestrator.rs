//! Request orchestration for hybrid search.
//!
//! One search runs two arms concurrently: the semantic arm encodes the
//! query and probes the vector index, the structured arm extracts
//! constraints and evaluates them against the store. Their outputs are
//! fused, joined back to full listing records, and wrapped in an
//! outcome status. Encoder failure is absorbed here: after one retry
//! the request degrades to filter-only results instead of failing.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{SearchError, SearchOpResult, StoreError};
use crate::query::{self, QueryFilter};
use crate::search::{MatchSource, RankedListing, SearchHit, SearchOutcome, SearchStatus, fuse};
use crate::store::ListingStore;
use crate::types::{Listing, ListingId};
use crate::vector::{EmbeddingGenerator, Similarity, VectorIndex, listing_text};

/// Store-level listing counts, partitioned by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_listings: usize,
    pub rent_listings: usize,
    pub sale_listings: usize,
}

/// The hybrid search engine: shared, cheaply cloneable context over
/// the store, the vector index, and the embedding encoder.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn ListingStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingGenerator>,
    settings: Arc<Settings>,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn ListingStore>,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingGenerator>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            settings,
        }
    }

    /// Runs one hybrid search.
    ///
    /// `limit` caps the result count; pass `None` to use the configured
    /// default. Blank queries and queries matching nothing both come
    /// back as `Ok` with an explanatory status; the only `Err` cases
    /// are store unavailability and internal index faults.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> SearchOpResult<SearchOutcome> {
        let limit = limit.unwrap_or(self.settings.search.default_limit).max(1);

        let query = query.trim();
        if query.is_empty() {
            debug!("blank query, returning empty outcome");
            return Ok(SearchOutcome::empty(SearchStatus::EmptyQuery));
        }

        let filter = query::extract(query);
        debug!(?filter, "extracted constraints");

        let semantic_arm = self.semantic_candidates(&filter);
        let filter_arm = self.filter_matches(&filter);
        let (semantic, filter_ids) = tokio::join!(semantic_arm, filter_arm);
        let filter_ids = filter_ids?;

        let Some(semantic) = semantic else {
            return self.degraded_outcome(filter_ids, limit);
        };

        let hits = fuse(&semantic, &filter_ids, filter.is_trivial(), limit);
        let results = self.join_listings(&hits)?;
        let status = if results.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Ok
        };
        Ok(SearchOutcome { results, status })
    }

    /// Semantic arm: encode the query text, probe the index.
    ///
    /// Returns `None` when the encoder is unavailable after a retry;
    /// the caller degrades rather than failing the request.
    async fn semantic_candidates(
        &self,
        filter: &QueryFilter,
    ) -> Option<Vec<(ListingId, Similarity)>> {
        let vector = self.encode_with_retry(&filter.semantic_text).await?;
        let top_k = self.settings.semantic_search.top_k.max(1);
        match self
            .index
            .query_filtered(&vector, top_k, filter.listing_type)
        {
            Ok(candidates) => Some(candidates),
            Err(error) => {
                warn!(%error, "vector index query failed, degrading to filter-only");
                None
            }
        }
    }

    async fn encode_with_retry(&self, text: &str) -> Option<Vec<f32>> {
        let budget = Duration::from_millis(self.settings.semantic_search.encode_timeout_ms);

        for attempt in 1..=2u32 {
            let embedder = Arc::clone(&self.embedder);
            let text = text.to_string();
            let task = tokio::task::spawn_blocking(move || embedder.embed(&text));

            match tokio::time::timeout(budget, task).await {
                Ok(Ok(Ok(vector))) => return Some(vector),
                Ok(Ok(Err(error))) => {
                    warn!(%error, attempt, "query encoding failed");
                }
                Ok(Err(join_error)) => {
                    warn!(%join_error, attempt, "encoding task panicked");
                }
                Err(_) => {
                    warn!(attempt, timeout_ms = budget.as_millis() as u64, "query encoding timed out");
                }
            }
        }
        None
    }

    /// Structured arm: evaluate the extracted constraints.
    async fn filter_matches(&self, filter: &QueryFilter) -> SearchOpResult<Vec<ListingId>> {
        let store = Arc::clone(&self.store);
        let filter = filter.clone();
        let ids = tokio::task::spawn_blocking(move || store.evaluate(&filter))
            .await
            .map_err(|e| {
                SearchError::Store(StoreError::Unavailable {
                    reason: format!("filter evaluation task failed: {e}"),
                })
            })??;
        Ok(ids)
    }

    /// Filter-only ranking used when the encoder is down: price
    /// ascending, listings without a price last, ID as final tie-break.
    fn degraded_outcome(
        &self,
        filter_ids: Vec<ListingId>,
        limit: usize,
    ) -> SearchOpResult<SearchOutcome> {
        info!(
            matches = filter_ids.len(),
            "encoder unavailable, serving filter-only results"
        );

        let mut listings = Vec::with_capacity(filter_ids.len());
        for id in filter_ids {
            if let Some(listing) = self.store.get(id)? {
                listings.push(listing);
            }
        }

        listings.sort_by(|a, b| {
            let key = |l: &Listing| match l.price {
                Some(p) => (0u8, p),
                None => (1u8, 0.0),
            };
            let (ka, pa) = key(a);
            let (kb, pb) = key(b);
            ka.cmp(&kb)
                .then_with(|| pa.total_cmp(&pb))
                .then_with(|| a.id.cmp(&b.id))
        });
        listings.truncate(limit);

        let results: Vec<RankedListing> = listings
            .into_iter()
            .map(|listing| RankedListing {
                listing,
                score: 0.0,
                source: MatchSource::Filter,
            })
            .collect();

        let status = if results.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Degraded
        };
        Ok(SearchOutcome { results, status })
    }

    /// Joins ranked hits back to their listing records. A hit whose
    /// listing has vanished from the store is dropped with a warning;
    /// the index is eventually consistent with the store, not
    /// authoritative.
    fn join_listings(&self, hits: &[SearchHit]) -> SearchOpResult<Vec<RankedListing>> {
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.store.get(hit.listing_id)? {
                Some(listing) => results.push(RankedListing {
                    listing,
                    score: hit.score,
                    source: hit.source,
                }),
                None => {
                    warn!(
                        listing_id = %hit.listing_id,
                        "index entry has no store record, dropping from results"
                    );
                }
            }
        }
        Ok(results)
    }

    /// Ingests one listing: stores the record and, when it carries any
    /// text, indexes its embedding. Returns true if it was embedded.
    pub fn ingest(&self, listing: Listing) -> SearchOpResult<bool> {
        let id = listing.id;
        let listing_type = listing.listing_type;
        let embeddable = listing.has_text_content();
        let text = embeddable.then(|| listing_text(&listing));

        self.store.insert(listing)?;

        let Some(text) = text else {
            debug!(listing_id = %id, "listing has no text, stored without embedding");
            return Ok(false);
        };

        let vector = self
            .embedder
            .embed(&text)
            .map_err(|e| SearchError::EncodingUnavailable {
                reason: e.to_string(),
            })?;
        self.index.upsert(id, vector, listing_type)?;
        Ok(true)
    }

    /// Batch ingestion: one store insert per listing, one batched
    /// embedding call for all embeddable ones. Returns how many were
    /// embedded.
    pub fn ingest_batch(&self, listings: Vec<Listing>) -> SearchOpResult<usize> {
        let mut to_embed = Vec::new();
        for listing in listings {
            let id = listing.id;
            let listing_type = listing.listing_type;
            let text = listing.has_text_content().then(|| listing_text(&listing));
            self.store.insert(listing)?;
            if let Some(text) = text {
                to_embed.push((id, listing_type, text));
            }
        }

        if to_embed.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = to_embed.iter().map(|(_, _, t)| t.as_str()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| SearchError::EncodingUnavailable {
                reason: e.to_string(),
            })?;

        let mut embedded = 0;
        for ((id, listing_type, _), vector) in to_embed.into_iter().zip(vectors) {
            self.index.upsert(id, vector, listing_type)?;
            embedded += 1;
        }
        info!(embedded, "indexed listing embeddings");
        Ok(embedded)
    }

    /// Removes a listing from both the store and the index.
    pub fn remove(&self, id: ListingId) -> SearchOpResult<Option<Listing>> {
        let removed = self.store.remove(id)?;
        self.index.remove(id);
        Ok(removed)
    }

    /// Store-level counts. The store is authoritative; a drifted index
    /// is logged but does not fail the call.
    pub fn stats(&self) -> SearchOpResult<EngineStats> {
        let total = self.store.count(None)?;
        let rent = self.store.count(Some(crate::types::ListingType::Rent))?;
        let sale = self.store.count(Some(crate::types::ListingType::Sale))?;

        let index = self.index.stats();
        if index.total > total {
            warn!(
                store_total = total,
                index_total = index.total,
                "vector index holds more entries than the store"
            );
        }

        Ok(EngineStats {
            total_listings: total,
            rent_listings: rent,
            sale_listings: sale,
        })
    }

    /// Backing store handle, for adapters that need direct reads.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ListingStore> {
        &self.store
    }

    /// Effective settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
