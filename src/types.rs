//! Core domain types for the listing search engine.
//!
//! Follows the project's type-safety guidelines: IDs are newtypes over
//! `NonZeroU32` so an uninitialized zero can never masquerade as a real
//! listing, and "unknown" attribute values are `Option`s, never sentinel
//! strings.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::NonZeroU32;

/// Type-safe wrapper for listing IDs.
///
/// Uses `NonZeroU32` internally for space optimization and to ensure
/// listing IDs are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(NonZeroU32);

impl ListingId {
    /// Creates a new `ListingId` from a non-zero u32.
    ///
    /// Returns `None` if the provided ID is zero.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Creates a new `ListingId`, panicking if zero.
    ///
    /// # Panics
    /// Panics if `id` is zero. Use `new()` for fallible construction.
    #[must_use]
    pub fn new_unchecked(id: u32) -> Self {
        Self(NonZeroU32::new(id).expect("ListingId cannot be zero"))
    }

    /// Derives a stable ID from the listing's external URL.
    ///
    /// Source records carry no numeric key; the scraper keyed documents
    /// by a hash of the link, and this reproduces that stability.
    #[must_use]
    pub fn from_link(link: &str) -> Self {
        let digest = Sha256::digest(link.as_bytes());
        let raw = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        // Zero is reserved; fold it onto 1.
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::new(1).unwrap()))
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a listing is offered for rent or for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rent => write!(f, "rent"),
            Self::Sale => write!(f, "sale"),
        }
    }
}

/// Boolean amenity flags a query can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Balcony,
    Garage,
    Parking,
    Elevator,
    AirConditioning,
    Furnished,
    PetsAllowed,
}

impl Amenity {
    pub const ALL: [Amenity; 7] = [
        Amenity::Balcony,
        Amenity::Garage,
        Amenity::Parking,
        Amenity::Elevator,
        Amenity::AirConditioning,
        Amenity::Furnished,
        Amenity::PetsAllowed,
    ];
}

/// A single real-estate advertisement, immutable once ingested.
///
/// Attribute fields are `Option` because scraped records are frequently
/// incomplete; `None` means unknown, which is distinct from any real
/// value when filters are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub listing_type: ListingType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    /// Price in PLN. Monthly rate for rent listings, total for sale.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub room_count: Option<u32>,
    /// Floor area in square meters.
    #[serde(default)]
    pub space_sm: Option<f32>,
    #[serde(default)]
    pub build_year: Option<u32>,
    /// Monthly service charge (rent listings only).
    #[serde(default)]
    pub czynsz: Option<f64>,
    #[serde(default)]
    pub has_balcony: Option<bool>,
    #[serde(default)]
    pub has_garage: Option<bool>,
    #[serde(default)]
    pub has_parking: Option<bool>,
    #[serde(default)]
    pub has_elevator: Option<bool>,
    #[serde(default)]
    pub has_air_conditioning: Option<bool>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub pets_allowed: Option<bool>,
    /// Free-text feature dump from the source portal, embedded alongside
    /// the description.
    #[serde(default)]
    pub features_by_category: Option<String>,
    pub link: String,
}

impl Listing {
    /// Fetches the amenity flag corresponding to `amenity`.
    #[must_use]
    pub fn amenity(&self, amenity: Amenity) -> Option<bool> {
        match amenity {
            Amenity::Balcony => self.has_balcony,
            Amenity::Garage => self.has_garage,
            Amenity::Parking => self.has_parking,
            Amenity::Elevator => self.has_elevator,
            Amenity::AirConditioning => self.has_air_conditioning,
            Amenity::Furnished => self.furnished,
            Amenity::PetsAllowed => self.pets_allowed,
        }
    }

    /// True when the record carries any text worth embedding.
    #[must_use]
    pub fn has_text_content(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.description.trim().is_empty()
            || self
                .features_by_category
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty())
    }
}
