//! Embedding generation for listing search.
//!
//! Provides the trait and implementations for turning listing text and
//! query phrases into dense vectors. Production uses fastembed with the
//! AllMiniLML6V2 model; a deterministic bag-of-words embedder is
//! available for tests and offline runs.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::Listing;
use crate::vector::{VECTOR_DIMENSION_384, VectorDimension, VectorError, normalize};

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe and deterministic for identical
/// input and model version. Empty or very short text must still produce
/// a valid vector rather than fail.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per input.
    ///
    /// Returned vectors are L2-normalized so cosine similarity reduces
    /// to a dot product.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Generate a single embedding.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().ok_or_else(|| {
            VectorError::EmbeddingFailed("embedder returned no vector for input".to_string())
        })
    }

    /// Dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Directory where downloaded embedding models are cached.
pub fn models_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mieszko")
        .join("models")
}

/// FastEmbed implementation using the AllMiniLML6V2 model.
///
/// Produces 384-dimensional embeddings. The model handles Polish
/// listing text acceptably and runs fully locally, so queries never
/// leave the process.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
}

impl FastEmbedGenerator {
    /// Create a new FastEmbed generator.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new() -> Result<Self, VectorError> {
        Self::init(false)
    }

    /// Create a new generator with progress display during model download.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new_with_progress() -> Result<Self, VectorError> {
        Self::init(true)
    }

    fn init(show_progress: bool) -> Result<Self, VectorError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(models_dir())
                .with_show_download_progress(show_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        Ok(Self {
            model: Mutex::new(model),
            dimension: VectorDimension::dimension_384(),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // fastembed expects owned strings for its embed call.
        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let mut embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(text_strings, None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in embeddings.iter_mut() {
            if embedding.len() != VECTOR_DIMENSION_384 {
                return Err(VectorError::DimensionMismatch {
                    expected: VECTOR_DIMENSION_384,
                    actual: embedding.len(),
                });
            }
            normalize(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Deterministic bag-of-words embedder.
///
/// Hashes whitespace-separated tokens into dimension buckets, so
/// similarity reflects token overlap. No model download, fully
/// reproducible; used by the test suite and useful for offline smoke
/// runs. Not a substitute for a real model in production ranking.
pub struct BagOfWordsEmbedder {
    dimension: VectorDimension,
}

impl Default for BagOfWordsEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl BagOfWordsEmbedder {
    /// Standard 384-dimensional embedder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::dimension_384(),
        }
    }

    /// Embedder with a custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: VectorDimension) -> Self {
        Self { dimension }
    }

    fn bucket(&self, token: &str) -> usize {
        // FNV-1a, stable across runs and platforms.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        (hash % self.dimension.get() as u64) as usize
    }
}

impl EmbeddingGenerator for BagOfWordsEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let dim = self.dimension.get();
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let mut embedding = vec![0.0f32; dim];
            let mut tokens = 0usize;
            for token in text.split_whitespace() {
                let token: String = token
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(|c| c.to_lowercase())
                    .collect();
                if token.is_empty() {
                    continue;
                }
                embedding[self.bucket(&token)] += 1.0;
                tokens += 1;
            }
            // Empty text still gets a valid, non-degenerate vector.
            if tokens == 0 {
                embedding[0] = 1.0;
            }
            normalize(&mut embedding);
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Builds the text that represents a listing in the vector index.
///
/// Combines title, description, the portal's feature dump, and location
/// context into one document. Listings without any of these should be
/// skipped by the caller (`Listing::has_text_content`).
#[must_use]
pub fn listing_text(listing: &Listing) -> String {
    let mut parts = Vec::new();

    if !listing.title.trim().is_empty() {
        parts.push(format!("Tytuł: {}", listing.title.trim()));
    }
    if !listing.description.trim().is_empty() {
        parts.push(format!("Opis: {}", listing.description.trim()));
    }
    if let Some(features) = listing
        .features_by_category
        .as_deref()
        .filter(|f| !f.trim().is_empty())
    {
        parts.push(format!("Cechy: {}", features.trim()));
    }

    let mut location = vec![listing.city.as_str()];
    if let Some(district) = listing.district.as_deref() {
        location.push(district);
    }
    parts.push(format!("Lokalizacja: {}", location.join(", ")));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListingId, ListingType};

    fn listing(title: &str, description: &str) -> Listing {
        Listing {
            id: ListingId::new_unchecked(1),
            listing_type: ListingType::Sale,
            title: title.to_string(),
            description: description.to_string(),
            city: "Warszawa".to_string(),
            district: Some("Mokotów".to_string()),
            price: Some(700_000.0),
            room_count: Some(2),
            space_sm: Some(48.0),
            build_year: None,
            czynsz: None,
            has_balcony: Some(true),
            has_garage: None,
            has_parking: None,
            has_elevator: None,
            has_air_conditioning: None,
            furnished: None,
            pets_allowed: None,
            features_by_category: Some("balkon, winda".to_string()),
            link: "/oferta/1".to_string(),
        }
    }

    #[test]
    fn test_bag_of_words_is_deterministic_and_normalized() {
        let embedder = BagOfWordsEmbedder::new();
        let a = embedder.embed("mieszkanie z balkonem").unwrap();
        let b = embedder.embed("mieszkanie z balkonem").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), VECTOR_DIMENSION_384);

        let magnitude: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bag_of_words_overlap_scores_higher() {
        let embedder = BagOfWordsEmbedder::new();
        let query = embedder.embed("balkon garaż").unwrap();
        let with_amenities = embedder
            .embed("przestronne mieszkanie balkon garaż piwnica")
            .unwrap();
        let without = embedder.embed("przestronne mieszkanie piwnica").unwrap();

        let sim_with = crate::vector::dot(&query, &with_amenities);
        let sim_without = crate::vector::dot(&query, &without);
        assert!(sim_with > sim_without);
    }

    #[test]
    fn test_empty_text_yields_valid_vector() {
        let embedder = BagOfWordsEmbedder::new();
        let v = embedder.embed("").unwrap();
        let magnitude: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_listing_text_includes_location_context() {
        let text = listing_text(&listing(
            "Mieszkanie 2-pokojowe",
            "Jasne mieszkanie z balkonem",
        ));
        assert!(text.contains("Tytuł: Mieszkanie 2-pokojowe"));
        assert!(text.contains("Opis: Jasne mieszkanie z balkonem"));
        assert!(text.contains("Cechy: balkon, winda"));
        assert!(text.contains("Lokalizacja: Warszawa, Mokotów"));
    }
}
