//! Concurrent in-memory vector index for listing embeddings.
//!
//! Exact brute-force cosine retrieval, parallelized with rayon. At the
//! scale this engine targets (tens of thousands of listings) an exact
//! scan stays well under interactive latency and sidesteps ANN recall
//! tuning; the index API leaves room to swap the scan for an ANN
//! structure later without touching callers.

use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::types::{ListingId, ListingType};
use crate::vector::{Similarity, VectorDimension, VectorError, dot, normalize};

/// One embedding record: the normalized vector plus the listing type,
/// denormalized for partitioned stats and type post-filtering.
#[derive(Debug)]
struct Entry {
    vector: Vec<f32>,
    listing_type: ListingType,
}

/// Entry counts reported by [`VectorIndex::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total: usize,
    pub rent: usize,
    pub sale: usize,
}

/// Thread-safe vector index keyed by listing ID.
///
/// Entries are wrapped in `Arc` and replaced wholesale on upsert, so a
/// concurrent reader either sees the previous vector or the new one,
/// never a partial write. Upserts to different IDs land in different
/// DashMap shards and do not serialize against each other.
#[derive(Debug)]
pub struct VectorIndex {
    entries: DashMap<ListingId, Arc<Entry>>,
    dimension: VectorDimension,
}

impl VectorIndex {
    /// Creates an empty index for vectors of the given dimension.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            entries: DashMap::new(),
            dimension,
        }
    }

    /// Inserts or replaces the embedding for a listing.
    ///
    /// The vector is L2-normalized on the way in. Re-running an
    /// identical upsert leaves the index state unchanged.
    pub fn upsert(
        &self,
        id: ListingId,
        mut vector: Vec<f32>,
        listing_type: ListingType,
    ) -> Result<(), VectorError> {
        self.dimension.validate_vector(&vector)?;
        normalize(&mut vector);
        self.entries.insert(
            id,
            Arc::new(Entry {
                vector,
                listing_type,
            }),
        );
        Ok(())
    }

    /// Removes a listing's embedding. Returns true if it was present.
    pub fn remove(&self, id: ListingId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// True if the listing has a current embedding record.
    #[must_use]
    pub fn contains(&self, id: ListingId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the `k` nearest listings by cosine similarity,
    /// descending; ties broken by listing ID ascending.
    ///
    /// Returns at most `k` entries, fewer if the index holds fewer
    /// vectors. `k` must be positive.
    pub fn query(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(ListingId, Similarity)>, VectorError> {
        self.query_filtered(query, k, None)
    }

    /// Like [`query`](Self::query), optionally restricted to one
    /// listing type.
    pub fn query_filtered(
        &self,
        query: &[f32],
        k: usize,
        listing_type: Option<ListingType>,
    ) -> Result<Vec<(ListingId, Similarity)>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidK(0));
        }
        self.dimension.validate_vector(query)?;

        let mut normalized;
        let query = {
            normalized = query.to_vec();
            normalize(&mut normalized);
            normalized.as_slice()
        };

        // Snapshot the Arcs so the scan runs without holding shard locks.
        let snapshot: Vec<(ListingId, Arc<Entry>)> = self
            .entries
            .iter()
            .filter(|e| listing_type.is_none_or(|t| e.value().listing_type == t))
            .map(|e| (*e.key(), Arc::clone(e.value())))
            .collect();

        let mut candidates: Vec<(ListingId, Similarity)> = snapshot
            .par_iter()
            .filter_map(|(id, entry)| {
                let similarity = dot(query, &entry.vector);
                Similarity::new(similarity).ok().map(|s| (*id, s))
            })
            .collect();

        candidates.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        candidates.truncate(k);

        Ok(candidates)
    }

    /// Entry counts, total and partitioned by listing type.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let mut rent = 0;
        let mut sale = 0;
        for entry in self.entries.iter() {
            match entry.value().listing_type {
                ListingType::Rent => rent += 1,
                ListingType::Sale => sale += 1,
            }
        }
        IndexStats {
            total: rent + sale,
            rent,
            sale,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension this index accepts.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_axes(n: usize) -> VectorIndex {
        // Unit vectors along distinct axes: orthogonal to each other,
        // so similarity against any single axis is unambiguous.
        let dim = VectorDimension::new(16).unwrap();
        let index = VectorIndex::new(dim);
        for i in 0..n {
            let mut v = vec![0.0; 16];
            v[i % 16] = 1.0;
            let listing_type = if i % 2 == 0 {
                ListingType::Rent
            } else {
                ListingType::Sale
            };
            index
                .upsert(ListingId::new_unchecked(i as u32 + 1), v, listing_type)
                .unwrap();
        }
        index
    }

    #[test]
    fn test_query_returns_at_most_k_sorted() {
        let index = index_with_axes(10);
        let mut query = vec![0.0; 16];
        query[0] = 1.0;
        query[1] = 0.5;

        let results = index.query(&query, 4).unwrap();
        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1, "similarities must be non-increasing");
        }
        // Axis 0 vector is the unique top hit.
        assert_eq!(results[0].0, ListingId::new_unchecked(1));
    }

    #[test]
    fn test_ties_broken_by_id_ascending() {
        let dim = VectorDimension::new(4).unwrap();
        let index = VectorIndex::new(dim);
        for id in [7u32, 3, 5] {
            index
                .upsert(
                    ListingId::new_unchecked(id),
                    vec![1.0, 0.0, 0.0, 0.0],
                    ListingType::Sale,
                )
                .unwrap();
        }

        let results = index.query(&[1.0, 0.0, 0.0, 0.0], 3).unwrap();
        let ids: Vec<u32> = results.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let dim = VectorDimension::new(4).unwrap();
        let index = VectorIndex::new(dim);
        let id = ListingId::new_unchecked(1);

        index
            .upsert(id, vec![0.0, 1.0, 0.0, 0.0], ListingType::Rent)
            .unwrap();
        let before = index.query(&[0.0, 1.0, 0.0, 0.0], 5).unwrap();

        index
            .upsert(id, vec![0.0, 1.0, 0.0, 0.0], ListingType::Rent)
            .unwrap();
        let after = index.query(&[0.0, 1.0, 0.0, 0.0], 5).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_and_stats() {
        let index = index_with_axes(6);
        assert_eq!(
            index.stats(),
            IndexStats {
                total: 6,
                rent: 3,
                sale: 3
            }
        );

        assert!(index.remove(ListingId::new_unchecked(1)));
        assert!(!index.remove(ListingId::new_unchecked(1)));
        assert_eq!(index.stats().total, 5);
        assert_eq!(index.stats().rent, 2);
    }

    #[test]
    fn test_type_filtered_query() {
        let index = index_with_axes(8);
        let mut query = vec![0.0; 16];
        query[0] = 1.0;

        let rent_only = index
            .query_filtered(&query, 8, Some(ListingType::Rent))
            .unwrap();
        assert_eq!(rent_only.len(), 4);
        for (id, _) in rent_only {
            assert_eq!(id.get() % 2, 1, "even offsets were inserted as rent");
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let index = index_with_axes(3);
        assert!(matches!(
            index.query(&vec![0.0; 16], 0),
            Err(VectorError::InvalidK(0))
        ));
        assert!(matches!(
            index.query(&vec![0.0; 8], 5),
            Err(VectorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_index_query() {
        let index = VectorIndex::new(VectorDimension::new(8).unwrap());
        let results = index.query(&vec![1.0; 8], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_concurrent_upsert_and_query() {
        use std::thread;

        let index = Arc::new(VectorIndex::new(VectorDimension::new(8).unwrap()));
        let writer = Arc::clone(&index);

        let handle = thread::spawn(move || {
            for i in 1..=200u32 {
                let mut v = vec![0.0; 8];
                v[(i % 8) as usize] = 1.0;
                writer
                    .upsert(ListingId::new_unchecked(i), v, ListingType::Rent)
                    .unwrap();
            }
        });

        for _ in 0..50 {
            let results = index.query(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 5);
            assert!(results.is_ok());
        }

        handle.join().unwrap();
        assert_eq!(index.len(), 200);
    }
}
