//! In-memory listing store over DashMap.
//!
//! The reference implementation of [`ListingStore`]: clone-shareable,
//! safe for concurrent readers and writers. Filter evaluation is a
//! scan; a production store would back the hot predicates (city, price,
//! type) with indexes, which is its concern, not the engine's.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::StoreResult;
use crate::query::QueryFilter;
use crate::store::{ListingStore, matches_filter};
use crate::types::{Listing, ListingId, ListingType};

#[derive(Clone, Debug, Default)]
pub struct MemoryListingStore {
    listings: Arc<DashMap<ListingId, Listing>>,
}

impl MemoryListingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk insert for ingestion and tests.
    pub fn insert_batch(&self, listings: impl IntoIterator<Item = Listing>) {
        for listing in listings {
            self.listings.insert(listing.id, listing);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl ListingStore for MemoryListingStore {
    fn get(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.listings.get(&id).map(|entry| entry.clone()))
    }

    fn insert(&self, listing: Listing) -> StoreResult<()> {
        self.listings.insert(listing.id, listing);
        Ok(())
    }

    fn remove(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.listings.remove(&id).map(|(_, listing)| listing))
    }

    fn evaluate(&self, filter: &QueryFilter) -> StoreResult<Vec<ListingId>> {
        let mut ids: Vec<ListingId> = self
            .listings
            .iter()
            .filter(|entry| matches_filter(entry.value(), filter))
            .map(|entry| *entry.key())
            .collect();
        // Deterministic order regardless of shard iteration.
        ids.sort_unstable();
        Ok(ids)
    }

    fn count(&self, listing_type: Option<ListingType>) -> StoreResult<usize> {
        Ok(match listing_type {
            None => self.listings.len(),
            Some(required) => self
                .listings
                .iter()
                .filter(|entry| entry.value().listing_type == required)
                .count(),
        })
    }

    fn all(&self) -> StoreResult<Vec<Listing>> {
        Ok(self.listings.iter().map(|entry| entry.clone()).collect())
    }
}
