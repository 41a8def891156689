//! Text embedding service seam.
//!
//! The router and the reference memory store only see the [`Embedder`] trait;
//! [`HttpEmbedder`] talks to an Ollama or OpenAI-compatible endpoint.

pub mod http;

pub use http::{EmbeddingApi, HttpEmbedder, HttpEmbedderConfig};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Backend unreachable or refused the request
    #[error("Embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Backend answered but the vector is unusable
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Maps text to a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Reject empty or non-finite vectors, and vectors whose dimension differs
/// from `expected_dim` when one is known.
pub fn validate_embedding(
    vector: &[f32],
    expected_dim: Option<usize>,
) -> Result<(), EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::MalformedResponse("empty vector".into()));
    }
    if let Some(dim) = expected_dim {
        if vector.len() != dim {
            return Err(EmbeddingError::MalformedResponse(format!(
                "expected dimension {}, got {}",
                dim,
                vector.len()
            )));
        }
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::MalformedResponse(
            "non-finite component".into(),
        ));
    }
    Ok(())
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched dimensions, zero-norm inputs or a non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}
