//! Backing store boundary for listing records.
//!
//! The engine treats the store as an external collaborator: listings
//! are owned by it, the core only reads them (ingestion aside). The
//! trait mirrors the handful of operations the search path needs —
//! point lookup, filter evaluation, counts — so a database-backed
//! implementation can slot in behind the same seam the in-memory one
//! occupies.

mod memory;

pub use memory::MemoryListingStore;

use crate::error::StoreResult;
use crate::query::{QueryFilter, fold_diacritics};
use crate::types::{Listing, ListingId, ListingType};

/// Read/write access to the listing store.
///
/// Every operation can fail with `StoreError::Unavailable`; that
/// failure is fatal to the enclosing search request.
pub trait ListingStore: Send + Sync {
    /// Point lookup by ID.
    fn get(&self, id: ListingId) -> StoreResult<Option<Listing>>;

    /// Inserts or replaces a listing (ingestion path).
    fn insert(&self, listing: Listing) -> StoreResult<()>;

    /// Removes a listing, returning it if present.
    fn remove(&self, id: ListingId) -> StoreResult<Option<Listing>>;

    /// IDs of all listings satisfying every specified constraint of
    /// `filter`. Unconstrained fields are wildcards.
    fn evaluate(&self, filter: &QueryFilter) -> StoreResult<Vec<ListingId>>;

    /// Listing count, optionally restricted to one type.
    fn count(&self, listing_type: Option<ListingType>) -> StoreResult<usize>;

    /// All listings. Used by the ingestion path to (re)build the vector
    /// index; not part of the per-request surface.
    fn all(&self) -> StoreResult<Vec<Listing>>;
}

/// Filter semantics shared by store implementations.
///
/// Numeric ranges are inclusive at both ends. An unknown attribute on a
/// listing fails any constraint referencing it: a listing with no
/// recorded price never matches "do 850000". Amenity requirements are
/// conjunctive, district mentions disjunctive. City and district
/// matching is case- and diacritics-insensitive substring, so scraped
/// spelling variants still match.
#[must_use]
pub fn matches_filter(listing: &Listing, filter: &QueryFilter) -> bool {
    if let Some(required) = filter.listing_type
        && listing.listing_type != required
    {
        return false;
    }

    if let Some(city) = filter.city.as_deref()
        && !fold_diacritics(&listing.city).contains(&fold_diacritics(city))
    {
        return false;
    }

    if !filter.districts.is_empty() {
        let Some(district) = listing.district.as_deref() else {
            return false;
        };
        let folded = fold_diacritics(district);
        if !filter
            .districts
            .iter()
            .any(|d| folded.contains(&fold_diacritics(d)))
        {
            return false;
        }
    }

    if filter.min_price.is_some() || filter.max_price.is_some() {
        let Some(price) = listing.price else {
            return false;
        };
        if filter.min_price.is_some_and(|min| price < min)
            || filter.max_price.is_some_and(|max| price > max)
        {
            return false;
        }
    }

    if filter.min_rooms.is_some() || filter.max_rooms.is_some() {
        let Some(rooms) = listing.room_count else {
            return false;
        };
        if filter.min_rooms.is_some_and(|min| rooms < min)
            || filter.max_rooms.is_some_and(|max| rooms > max)
        {
            return false;
        }
    }

    filter
        .required_amenities
        .iter()
        .all(|&amenity| listing.amenity(amenity) == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Amenity;

    fn listing() -> Listing {
        Listing {
            id: ListingId::new_unchecked(1),
            listing_type: ListingType::Sale,
            title: "Mieszkanie 2-pokojowe z balkonem".to_string(),
            description: String::new(),
            city: "Warszawa".to_string(),
            district: Some("Mokotów".to_string()),
            price: Some(820_000.0),
            room_count: Some(2),
            space_sm: Some(47.5),
            build_year: Some(2015),
            czynsz: None,
            has_balcony: Some(true),
            has_garage: Some(false),
            has_parking: None,
            has_elevator: Some(true),
            has_air_conditioning: None,
            furnished: None,
            pets_allowed: None,
            features_by_category: None,
            link: "/oferta/1".to_string(),
        }
    }

    #[test]
    fn test_unconstrained_fields_are_wildcards() {
        assert!(matches_filter(&listing(), &QueryFilter::default()));
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let mut filter = QueryFilter {
            max_price: Some(820_000.0),
            ..Default::default()
        };
        assert!(matches_filter(&listing(), &filter));

        filter.max_price = Some(819_999.0);
        assert!(!matches_filter(&listing(), &filter));

        filter.max_price = None;
        filter.min_price = Some(820_000.0);
        assert!(matches_filter(&listing(), &filter));
    }

    #[test]
    fn test_unknown_attribute_fails_numeric_constraint() {
        let mut no_price = listing();
        no_price.price = None;
        let filter = QueryFilter {
            max_price: Some(1_000_000.0),
            ..Default::default()
        };
        assert!(!matches_filter(&no_price, &filter));
    }

    #[test]
    fn test_city_match_is_diacritics_insensitive() {
        let mut l = listing();
        l.city = "Kraków".to_string();
        let filter = QueryFilter {
            city: Some("krakow".to_string()),
            ..Default::default()
        };
        assert!(matches_filter(&l, &filter));
    }

    #[test]
    fn test_districts_are_disjunctive() {
        let filter = QueryFilter {
            districts: vec!["Wola".to_string(), "Mokotów".to_string()],
            ..Default::default()
        };
        assert!(matches_filter(&listing(), &filter));

        let mut no_district = listing();
        no_district.district = None;
        assert!(!matches_filter(&no_district, &filter));
    }

    #[test]
    fn test_amenities_are_conjunctive() {
        let mut filter = QueryFilter {
            required_amenities: vec![Amenity::Balcony, Amenity::Elevator],
            ..Default::default()
        };
        assert!(matches_filter(&listing(), &filter));

        filter.required_amenities.push(Amenity::Garage);
        assert!(!matches_filter(&listing(), &filter));

        // Unknown amenity never satisfies a requirement.
        filter.required_amenities = vec![Amenity::Parking];
        assert!(!matches_filter(&listing(), &filter));
    }

    #[test]
    fn test_listing_type_constraint() {
        let filter = QueryFilter {
            listing_type: Some(ListingType::Rent),
            ..Default::default()
        };
        assert!(!matches_filter(&listing(), &filter));
    }
}
