//! Vector retrieval for listing search.
//!
//! Stores one embedding per listing and answers nearest-neighbor
//! queries by cosine similarity. Embedding generation sits behind the
//! [`EmbeddingGenerator`] trait so the orchestrator can run against
//! fastembed in production and a deterministic embedder in tests.

mod embedding;
mod index;
mod types;

pub use embedding::{
    BagOfWordsEmbedder, EmbeddingGenerator, FastEmbedGenerator, listing_text, models_dir,
};
pub use index::{IndexStats, VectorIndex};
pub use types::{
    Similarity, VECTOR_DIMENSION_384, VectorDimension, VectorError, dot, normalize,
};
