//! Ranking of aligned chunk pairs.
//!
//! Every cell of the similarity matrix above the pair threshold is a
//! candidate alignment. Candidates are sorted by similarity, highest first,
//! and the list is cut to `top_n`.
//!
//! ## Ordering
//!
//! The sort is stable over row-major enumeration, so equal similarities keep
//! A-index ascending, then B-index ascending. Identical inputs therefore
//! always rank identically, which matters when a document repeats a passage
//! and several cells tie at 1.0.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::similarity::SimilarityMatrix;

/// Default similarity a pair must exceed to be reported.
pub const DEFAULT_PAIR_THRESHOLD: f32 = 0.7;

/// Default number of pairs kept.
pub const DEFAULT_TOP_N_PAIRS: usize = 10;

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_CHARS: usize = 100;

/// Two chunks, one from each document, that align.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarChunkPair {
    /// Leading characters of the A chunk.
    pub chunk_a_excerpt: String,
    /// Leading characters of the B chunk.
    pub chunk_b_excerpt: String,
    /// Cosine similarity of the two chunks.
    pub similarity: f32,
    /// Index of the A chunk, for looking up its full text.
    pub index_a: usize,
    /// Index of the B chunk, for looking up its full text.
    pub index_b: usize,
}

/// Extracts the strongest alignments from a similarity matrix.
///
/// ```rust
/// use docalign::{Chunk, PairRanker, Side, SimilarityMatrix};
///
/// let a = vec![Chunk::new("alpha", 0, Side::A, 0, 1)];
/// let b = vec![Chunk::new("alpha", 0, Side::B, 0, 1), Chunk::new("omega", 1, Side::B, 1, 2)];
/// let m = SimilarityMatrix::build(&[vec![1.0, 0.0]], &[vec![1.0, 0.0], vec![0.0, 1.0]]);
///
/// let pairs = PairRanker::default().rank(&a, &b, &m);
/// assert_eq!(pairs.len(), 1);
/// assert_eq!((pairs[0].index_a, pairs[0].index_b), (0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct PairRanker {
    threshold: f32,
    top_n: usize,
    excerpt_chars: usize,
}

impl PairRanker {
    /// Create a ranker keeping at most `top_n` pairs strictly above `threshold`.
    #[must_use]
    pub fn new(threshold: f32, top_n: usize) -> Self {
        Self {
            threshold,
            top_n,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    /// Set the excerpt length in characters.
    #[must_use]
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Rank the pairs of `chunks_a` × `chunks_b` using `matrix`.
    ///
    /// # Panics
    ///
    /// Panics if the matrix shape does not match the chunk counts.
    #[must_use]
    pub fn rank(
        &self,
        chunks_a: &[Chunk],
        chunks_b: &[Chunk],
        matrix: &SimilarityMatrix,
    ) -> Vec<SimilarChunkPair> {
        assert_eq!(matrix.rows(), chunks_a.len(), "matrix rows != chunks in A");
        assert_eq!(matrix.cols(), chunks_b.len(), "matrix cols != chunks in B");

        let mut kept: Vec<(usize, usize, f32)> = matrix
            .cells()
            .filter(|&(_, _, similarity)| similarity > self.threshold)
            .collect();

        // stable: ties keep row-major order
        kept.sort_by(by_similarity_desc);
        kept.truncate(self.top_n);

        kept.into_iter()
            .map(|(i, j, similarity)| SimilarChunkPair {
                chunk_a_excerpt: chunks_a[i].excerpt(self.excerpt_chars),
                chunk_b_excerpt: chunks_b[j].excerpt(self.excerpt_chars),
                similarity,
                index_a: i,
                index_b: j,
            })
            .collect()
    }
}

/// Descending by similarity. `0.0` and `-0.0` compare equal so the stable
/// sort keeps them in enumeration order.
fn by_similarity_desc(x: &(usize, usize, f32), y: &(usize, usize, f32)) -> Ordering {
    y.2.partial_cmp(&x.2).unwrap_or(Ordering::Equal)
}

impl Default for PairRanker {
    fn default() -> Self {
        Self::new(DEFAULT_PAIR_THRESHOLD, DEFAULT_TOP_N_PAIRS)
    }
}
