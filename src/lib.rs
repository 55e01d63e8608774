//! # docalign
//!
//! Pairwise document comparison, centered on semantic chunk alignment.
//!
//! ## The Problem
//!
//! Two versions of a contract, two reports on the same project, a policy and
//! its translation: you want to know how they differ. A line diff answers
//! only for near-identical texts. Once paragraphs move, get reworded, or
//! change length, every line differs and the diff says nothing useful.
//!
//! What you actually want:
//!
//! - How close are these documents overall?
//! - Which passages of A line up with which passages of B?
//! - What does each document say that the other does not?
//!
//! ## Semantic Chunk Alignment
//!
//! ```text
//! text A ─ chunk ─ embed ─┐                          ┌─ overall similarity
//!                         ├─ similarity matrix (1×) ─┼─ ranked pairs
//! text B ─ chunk ─ embed ─┘                          └─ unique chunks
//! ```
//!
//! 1. **Chunk**: split each document into overlapping word windows
//!    (default 512 words, quarter overlap). See [`WordWindowChunker`].
//! 2. **Embed**: map every chunk to a vector with an injected [`Embedder`].
//! 3. **Matrix**: cosine similarity of every A chunk with every B chunk,
//!    computed once. See [`SimilarityMatrix`].
//! 4. **Reduce**:
//!    - overall similarity: cosine of the two centroid embeddings
//!    - ranked pairs: cells above 0.7, best first, top 10
//!    - unique chunks: chunks whose best match is below 0.5
//!
//! ## Other Lenses
//!
//! | Lens | Module | Question |
//! |------|--------|----------|
//! | Basic | [`basic_comparison`] | Which lines changed? |
//! | Lexical | [`LexicalAnalyzer`] | Do they use the same distinctive terms? |
//! | Semantic | [`Comparator`] | Which passages align, which are new? |
//! | Structural | [`structural_similarity`] | Do their outlines match? |
//!
//! [`Analyzer`] runs any subset of them over one pair.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use docalign::{Comparator, CompareConfig, HashingEmbedder};
//!
//! let config = CompareConfig::new().with_window_size(12);
//! let comparator = Comparator::new(Arc::new(HashingEmbedder::default()), config).unwrap();
//!
//! let shared = "Payment is due within thirty days of the invoice date unless otherwise agreed in writing.";
//! let a = format!("{shared} Late payments accrue interest at two percent per month on the balance.");
//! let b = format!("{shared} Either party may terminate with ninety days written notice to the other.");
//!
//! let result = comparator.compare(&a, &b).unwrap();
//! assert!(result.similar_pairs[0].similarity > 0.95);
//! ```
//!
//! ## Neural Embeddings (requires `fastembed` feature)
//!
//! ```rust,ignore
//! use docalign::{Comparator, CompareConfig};
//!
//! let config = CompareConfig::new().with_embedding_model("fastembed:all-minilm-l6-v2");
//! let comparator = Comparator::from_config(config)?;
//! ```
//!
//! ## Performance Considerations
//!
//! | Stage | Cost |
//! |-------|------|
//! | Chunking | O(n) |
//! | Embedding | provider-bound, both documents in parallel |
//! | Matrix | O(\|A\| × \|B\| × d) |
//! | Reductions | O(\|A\| × \|B\|) |
//!
//! Where n = document length in words and d = embedding dimension. Enable the
//! `parallel` feature to build matrix rows with rayon.

mod chunk;
mod compare;
mod config;
mod diff;
mod embed;
mod error;
mod lexical;
mod pairs;
mod report;
mod score;
mod similarity;
mod structure;
mod unique;
mod window;

#[cfg(feature = "fastembed")]
mod neural;

pub use chunk::{Chunk, Side};
pub use compare::{CancelToken, Comparator, Comparison, ComparisonResult};
pub use config::{CompareConfig, ENV_PREFIX};
pub use diff::{basic_comparison, LineDiff, MatchingBlock};
pub use embed::{embedder_for, Embedder, HashingEmbedder, DEFAULT_DIMENSION, HASHING_MODEL_ID};
pub use error::{Error, Result};
pub use lexical::{LexicalAnalyzer, LexicalComparison, StopWords};
pub use pairs::{PairRanker, SimilarChunkPair};
pub use report::{read_document, Analysis, Analyzer, DocumentReport};
pub use score::overall_similarity;
pub use similarity::{cosine_similarity, mean_vector, SimilarityMatrix};
pub use structure::{structural_similarity, DocumentStructure, StructureItem};
pub use unique::{find_unique, UniqueChunks};
pub use window::WordWindowChunker;

#[cfg(feature = "fastembed")]
pub use neural::FastEmbedder;

/// A strategy for splitting a document into chunks.
///
/// ```rust
/// use docalign::{Chunk, Chunker, Side, WordWindowChunker};
///
/// fn chunk_both(chunker: &dyn Chunker, a: &str, b: &str) -> (Vec<Chunk>, Vec<Chunk>) {
///     (chunker.chunk(a, Side::A), chunker.chunk(b, Side::B))
/// }
///
/// let chunker = WordWindowChunker::new(64).unwrap();
/// let (a, b) = chunk_both(&chunker, "", "");
/// assert!(a.is_empty() && b.is_empty());
/// ```
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks tagged with `side`.
    fn chunk(&self, text: &str, side: Side) -> Vec<Chunk>;

    /// Estimate the number of chunks for a document of `word_count` words.
    ///
    /// Useful for pre-allocation. May be approximate.
    fn estimate_chunks(&self, word_count: usize) -> usize {
        // Conservative default
        (word_count / 100).max(1)
    }
}

/// Compare two documents with the default configuration and the built-in
/// [`HashingEmbedder`].
///
/// # Errors
///
/// See [`Comparator::compare`].
pub fn compare(text_a: &str, text_b: &str) -> Result<ComparisonResult> {
    Comparator::from_config(CompareConfig::default())?.compare(text_a, text_b)
}
