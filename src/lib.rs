//! Hybrid structured + semantic search over Polish real-estate
//! listings.
//!
//! A query like "dwupokojowe mieszkanie w Warszawie do 800 tys z
//! balkonem" is split into two coordinated sub-queries: structured
//! constraints (city, price cap, room count, amenities) extracted from
//! the text act as a hard filter, and the query text itself ranks the
//! survivors by embedding similarity. The [`search::SearchEngine`]
//! orchestrates both arms and fuses their results; MCP and HTTP
//! adapters in [`mcp`] expose the engine to clients.

pub mod config;
pub mod error;
pub mod mcp;
pub mod query;
pub mod search;
pub mod store;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{SearchError, SearchOpResult, StoreError, StoreResult};
pub use query::QueryFilter;
pub use search::{
    EngineStats, MatchSource, RankedListing, SearchEngine, SearchOutcome, SearchStatus,
};
pub use store::{ListingStore, MemoryListingStore};
pub use types::{Amenity, Listing, ListingId, ListingType};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, VectorError, VectorIndex};
