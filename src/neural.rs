//! Sentence embeddings via fastembed (ONNX Runtime).
//!
//! Requires the `fastembed` feature. The first construction downloads model
//! weights into fastembed's cache directory.
//!
//! | Name | Model | Dimension |
//! |------|-------|-----------|
//! | `bge-small-en-v1.5` (default) | BAAI/bge-small-en-v1.5 | 384 |
//! | `all-minilm-l6-v2` | sentence-transformers/all-MiniLM-L6-v2 | 384 |
//! | `paraphrase-multilingual-minilm-l12-v2` | paraphrase-multilingual-MiniLM-L12-v2 | 384 |
//! | `bge-base-en-v1.5` | BAAI/bge-base-en-v1.5 | 768 |

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{Embedder, Error, Result};

/// Neural embedder backed by a fastembed model.
///
/// ```rust,ignore
/// use docalign::{Embedder, FastEmbedder};
///
/// let embedder = FastEmbedder::new("all-minilm-l6-v2")?;
/// let vectors = embedder.embed(&["contract terms", "agreement clauses"])?;
/// assert_eq!(vectors[0].len(), 384);
/// ```
pub struct FastEmbedder {
    model: TextEmbedding,
    model_id: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the named model. An empty name selects `bge-small-en-v1.5`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an unsupported name and
    /// [`Error::EmbeddingUnavailable`] if the model fails to load.
    pub fn new(name: &str) -> Result<Self> {
        let (model, canonical, dimension) = resolve(name)?;

        tracing::info!(model = canonical, "loading fastembed model");
        let model = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        Ok(Self {
            model,
            model_id: format!("fastembed:{canonical}"),
            dimension,
        })
    }
}

fn resolve(name: &str) -> Result<(EmbeddingModel, &'static str, usize)> {
    match name.to_ascii_lowercase().as_str() {
        "" | "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, "bge-small-en-v1.5", 384)),
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, "all-minilm-l6-v2", 384)),
        "paraphrase-multilingual-minilm-l12-v2" => Ok((
            EmbeddingModel::ParaphraseMLMiniLML12V2,
            "paraphrase-multilingual-minilm-l12-v2",
            384,
        )),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, "bge-base-en-v1.5", 768)),
        other => Err(Error::InvalidConfiguration(format!(
            "unsupported fastembed model '{other}'"
        ))),
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_names() {
        assert_eq!(resolve("").unwrap().1, "bge-small-en-v1.5");
        assert_eq!(resolve("All-MiniLM-L6-v2").unwrap().2, 384);
        assert_eq!(resolve("bge-base-en-v1.5").unwrap().2, 768);
        assert!(resolve("gpt-embeddings").is_err());
    }

    #[test]
    #[ignore] // Requires fastembed model download
    fn test_paraphrases_align() {
        let embedder = FastEmbedder::new("all-minilm-l6-v2").unwrap();
        let v = embedder
            .embed(&[
                "The contract ends on the last day of the year.",
                "The agreement terminates on December 31st.",
                "Penguins live in the southern hemisphere.",
            ])
            .unwrap();
        let close = crate::similarity::cosine_similarity(&v[0], &v[1]);
        let far = crate::similarity::cosine_similarity(&v[0], &v[2]);
        assert!(close > far);
    }
}
