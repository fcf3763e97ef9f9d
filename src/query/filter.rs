//! Structured query filter derived from free-text input.

use serde::Serialize;

use crate::types::{Amenity, ListingType};

/// Partial structured filter extracted from one query. Transient, never
/// persisted. Unset fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryFilter {
    pub city: Option<String>,
    /// Disjunctive: a listing in any of these districts qualifies.
    pub districts: Vec<String>,
    /// Inclusive bounds, PLN.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Inclusive bounds.
    pub min_rooms: Option<u32>,
    pub max_rooms: Option<u32>,
    pub listing_type: Option<ListingType>,
    /// Conjunctive: every listed amenity must be present.
    pub required_amenities: Vec<Amenity>,
    /// Residual phrase fed to the embedding encoder. May equal the full
    /// original query when nothing structural was stripped.
    pub semantic_text: String,
}

impl QueryFilter {
    /// True when no structural constraint is set.
    ///
    /// A trivial filter means the search is pure free-text: the hybrid
    /// ranker applies no hard gate and semantic candidates pass through
    /// unfiltered.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.city.is_none()
            && self.districts.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rooms.is_none()
            && self.max_rooms.is_none()
            && self.listing_type.is_none()
            && self.required_amenities.is_empty()
    }

    /// Requires an exact room count (the common "2-pokojowe" case).
    pub fn set_exact_rooms(&mut self, rooms: u32) {
        self.min_rooms = Some(rooms);
        self.max_rooms = Some(rooms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_filter() {
        let mut filter = QueryFilter {
            semantic_text: "blisko centrum".to_string(),
            ..Default::default()
        };
        assert!(filter.is_trivial());

        filter.max_price = Some(850_000.0);
        assert!(!filter.is_trivial());
    }

    #[test]
    fn test_exact_rooms() {
        let mut filter = QueryFilter::default();
        filter.set_exact_rooms(2);
        assert_eq!(filter.min_rooms, Some(2));
        assert_eq!(filter.max_rooms, Some(2));
        assert!(!filter.is_trivial());
    }
}
