//! Type-safe wrappers and error types for the vector index.

use thiserror::Error;

/// Embedding dimension of the AllMiniLML6V2 model.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Type-safe wrapper for vector dimensions.
///
/// Validated at construction so dimension mismatches surface at the
/// boundary instead of deep inside a dot product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Standard 384-dimensional embedding.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Cosine similarity between two L2-normalized vectors, in [-1, 1].
///
/// Carries a total order (NaN is rejected at construction) so candidate
/// lists can be sorted without `partial_cmp` unwraps scattered around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity(f32);

impl Similarity {
    /// Creates a new `Similarity` with validation.
    ///
    /// Returns an error if the value is NaN or outside [-1, 1] beyond
    /// float rounding slack.
    pub fn new(value: f32) -> Result<Self, VectorError> {
        if value.is_nan() {
            return Err(VectorError::InvalidSimilarity {
                value,
                reason: "Similarity cannot be NaN",
            });
        }
        if !(-1.001..=1.001).contains(&value) {
            return Err(VectorError::InvalidSimilarity {
                value,
                reason: "Cosine similarity must be in range [-1, 1]",
            });
        }
        Ok(Self(value.clamp(-1.0, 1.0)))
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Eq for Similarity {}

impl PartialOrd for Similarity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Similarity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .expect("Similarity values are never NaN")
    }
}

/// Errors that can occur during vector operations.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid similarity value: {value}\nReason: {reason}")]
    InvalidSimilarity { value: f32, reason: &'static str },

    #[error("Invalid candidate count k={0}\nSuggestion: k must be a positive integer")]
    InvalidK(usize),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),
}

/// L2-normalizes a vector in place.
///
/// Zero vectors are left untouched rather than divided by zero; a
/// degenerate embedding then simply scores 0 against everything.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Dot product of two equal-length vectors.
///
/// With both sides L2-normalized this is the cosine similarity.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_validation() {
        let dim = VectorDimension::new(384).unwrap();
        assert_eq!(dim.get(), 384);
        assert_eq!(VectorDimension::dimension_384().get(), 384);
        assert!(VectorDimension::new(0).is_err());

        assert!(dim.validate_vector(&vec![0.1; 384]).is_ok());
        assert!(dim.validate_vector(&vec![0.1; 100]).is_err());
    }

    #[test]
    fn test_similarity_validation() {
        assert_eq!(Similarity::new(0.5).unwrap().get(), 0.5);
        assert_eq!(Similarity::new(-1.0).unwrap().get(), -1.0);
        assert!(Similarity::new(f32::NAN).is_err());
        assert!(Similarity::new(1.5).is_err());
    }

    #[test]
    fn test_similarity_ordering() {
        let mut scores = vec![
            Similarity::new(0.2).unwrap(),
            Similarity::new(0.9).unwrap(),
            Similarity::new(-0.4).unwrap(),
        ];
        scores.sort();
        assert_eq!(scores[0].get(), -0.4);
        assert_eq!(scores[2].get(), 0.9);
    }

    #[test]
    fn test_normalize_and_dot() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);

        // Zero vector stays zero.
        let mut z = vec![0.0, 0.0];
        normalize(&mut z);
        assert_eq!(z, vec![0.0, 0.0]);
    }
}
