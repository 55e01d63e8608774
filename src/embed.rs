//! Embedding providers.
//!
//! The comparison core never computes embeddings itself. It talks to an
//! [`Embedder`], which maps an ordered batch of chunk texts to one vector per
//! text. Providers are injected into the [`Comparator`](crate::Comparator),
//! so tests can swap in a deterministic stub and servers can share one loaded
//! model across concurrent comparisons.
//!
//! ## Providers
//!
//! | Model id | Backend | Notes |
//! |----------|---------|-------|
//! | `hashing` | [`HashingEmbedder`] | Signed feature hashing of words. No download. |
//! | `fastembed[:name]` | `FastEmbedder` | ONNX sentence embeddings (feature `fastembed`). |
//!
//! The hashing provider captures lexical overlap only: two chunks that share
//! no words land near 0, identical chunks land at exactly 1. That is enough
//! for alignment of near-duplicate documents and for testing; use a neural
//! provider when paraphrases should match.

use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, Result};

/// Default embedding dimension, matching the MiniLM/BGE-small family.
pub const DEFAULT_DIMENSION: usize = 384;

/// Model id of the built-in [`HashingEmbedder`].
pub const HASHING_MODEL_ID: &str = "hashing";

/// Maps chunk texts to fixed-dimension vectors.
///
/// Implementations must:
/// - return exactly one vector per input text, in input order
/// - return vectors of [`dimension`](Embedder::dimension) length
/// - be deterministic for a given model identity
///
/// `Send + Sync` is required because one provider may serve several
/// comparisons at once; the core does not serialize access.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingUnavailable`] if the backend fails.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Identity of the underlying model.
    fn model_id(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Deterministic bag-of-words embedder using the signed hashing trick.
///
/// Each lowercased word is hashed (FNV-1a) to a bucket and a sign. Signed
/// buckets make collisions between unrelated words cancel in expectation, so
/// documents with disjoint vocabularies score close to 0.
///
/// ```rust
/// use docalign::{Embedder, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(64);
/// let vectors = embedder.embed(&["the cat sat", "the cat sat"]).unwrap();
/// assert_eq!(vectors[0], vectors[1]);
/// assert_eq!(vectors[0].len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder with `dimension` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `dimension == 0`.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be > 0");
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.unicode_words() {
            let hash = fnv1a(word.to_lowercase().as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        HASHING_MODEL_ID
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Build the provider named by `model_id`.
///
/// `dimension` applies to providers whose width is configurable; neural
/// models report their own.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] for an unknown id, a zero
/// dimension, or a `fastembed` id when the feature is disabled, and
/// [`Error::EmbeddingUnavailable`] if a model fails to load.
pub fn embedder_for(model_id: &str, dimension: usize) -> Result<Arc<dyn Embedder>> {
    if model_id == HASHING_MODEL_ID {
        if dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "embedding_dimension must be > 0".to_string(),
            ));
        }
        return Ok(Arc::new(HashingEmbedder::new(dimension)));
    }

    if model_id == "fastembed" || model_id.starts_with("fastembed:") {
        #[cfg(feature = "fastembed")]
        {
            let name = model_id.strip_prefix("fastembed:").unwrap_or_default();
            return Ok(Arc::new(crate::neural::FastEmbedder::new(name)?));
        }

        #[cfg(not(feature = "fastembed"))]
        {
            return Err(Error::InvalidConfiguration(format!(
                "model '{model_id}' requires the 'fastembed' feature"
            )));
        }
    }

    Err(Error::InvalidConfiguration(format!(
        "unknown embedding model '{model_id}'"
    )))
}
