//! Detection of chunks with no counterpart.
//!
//! A chunk of A is unique when its best match anywhere in B, the row
//! maximum, falls strictly below the uniqueness threshold. Chunks of B use
//! the column maximum.
//!
//! ## Two Thresholds
//!
//! ```text
//! 0.0            0.5            0.7            1.0
//!  |--- unique ---|-- deadband --|--- paired ---|
//! ```
//!
//! The uniqueness threshold (0.5) sits below the pair threshold (0.7). A
//! chunk whose best match lands in between is neither reported as aligned
//! nor as unique: it is "not clearly duplicated" without being "clearly
//! new" content.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::similarity::SimilarityMatrix;

/// Default best-match similarity below which a chunk is unique.
pub const DEFAULT_UNIQUENESS_THRESHOLD: f32 = 0.5;

/// Default number of unique chunks shown per document.
pub const DEFAULT_UNIQUE_DISPLAY_LIMIT: usize = 5;

/// Chunk texts with no adequate match on the other side, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueChunks {
    /// Chunks of A with no counterpart in B.
    pub doc_a: Vec<String>,
    /// Chunks of B with no counterpart in A.
    pub doc_b: Vec<String>,
}

impl UniqueChunks {
    /// Keep only the first `limit` entries of each side.
    #[must_use]
    pub fn truncated(mut self, limit: usize) -> Self {
        self.doc_a.truncate(limit);
        self.doc_b.truncate(limit);
        self
    }

    /// Whether neither document has unique content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_a.is_empty() && self.doc_b.is_empty()
    }
}

/// Find the chunks of each document whose best match is below `threshold`.
///
/// When the other document has no chunks at all, every chunk is unique.
///
/// # Panics
///
/// Panics if the matrix shape does not match the chunk counts.
///
/// ```rust
/// use docalign::{find_unique, Chunk, Side, SimilarityMatrix};
///
/// let a = vec![Chunk::new("shared", 0, Side::A, 0, 1), Chunk::new("only in a", 1, Side::A, 1, 2)];
/// let b = vec![Chunk::new("shared", 0, Side::B, 0, 1)];
/// let m = SimilarityMatrix::build(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[vec![1.0, 0.0]]);
///
/// let unique = find_unique(&a, &b, &m, 0.5);
/// assert_eq!(unique.doc_a, vec!["only in a".to_string()]);
/// assert!(unique.doc_b.is_empty());
/// ```
#[must_use]
pub fn find_unique(
    chunks_a: &[Chunk],
    chunks_b: &[Chunk],
    matrix: &SimilarityMatrix,
    threshold: f32,
) -> UniqueChunks {
    assert_eq!(matrix.rows(), chunks_a.len(), "matrix rows != chunks in A");
    assert_eq!(matrix.cols(), chunks_b.len(), "matrix cols != chunks in B");

    let is_unique = |best: Option<f32>| best.map_or(true, |s| s < threshold);

    let doc_a = chunks_a
        .iter()
        .enumerate()
        .filter(|&(i, _)| is_unique(matrix.row_max(i)))
        .map(|(_, c)| c.text.clone())
        .collect();

    let doc_b = chunks_b
        .iter()
        .enumerate()
        .filter(|&(j, _)| is_unique(matrix.col_max(j)))
        .map(|(_, c)| c.text.clone())
        .collect();

    UniqueChunks { doc_a, doc_b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Side;

    fn chunks(side: Side, n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk::new(format!("{side}{i}"), i, side, i, i + 1))
            .collect()
    }

    #[test]
    fn test_symmetric_detection() {
        // a0 ~ b0, a1 and b1 unrelated to everything
        let ea = vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]];
        let eb = vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 0.0]];
        let m = SimilarityMatrix::build(&ea, &eb);

        let unique = find_unique(&chunks(Side::A, 2), &chunks(Side::B, 2), &m, 0.5);
        assert_eq!(unique.doc_a, vec!["A1"]);
        assert_eq!(unique.doc_b, vec!["B1"]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // cos(60°) = 0.5
        let ea = vec![vec![1.0, 0.0]];
        let eb = vec![vec![0.5, 3.0_f32.sqrt() / 2.0]];
        let m = SimilarityMatrix::build(&ea, &eb);
        let s = m.get(0, 0);

        let unique = find_unique(&chunks(Side::A, 1), &chunks(Side::B, 1), &m, s);
        assert!(unique.is_empty());

        let unique = find_unique(&chunks(Side::A, 1), &chunks(Side::B, 1), &m, s + 1e-3);
        assert_eq!(unique.doc_a.len(), 1);
    }

    #[test]
    fn test_deadband_is_neither() {
        // similarity ~0.6: below pair threshold, above uniqueness threshold
        let ea = vec![vec![1.0, 0.0]];
        let eb = vec![vec![0.6, 0.8]];
        let m = SimilarityMatrix::build(&ea, &eb);
        let unique = find_unique(&chunks(Side::A, 1), &chunks(Side::B, 1), &m, 0.5);
        assert!(unique.is_empty());
    }

    #[test]
    fn test_order_preserved_and_truncated() {
        let ea: Vec<Vec<f32>> = (0..8).map(|_| vec![0.0, 1.0]).collect();
        let eb = vec![vec![1.0, 0.0]];
        let m = SimilarityMatrix::build(&ea, &eb);

        let unique = find_unique(&chunks(Side::A, 8), &chunks(Side::B, 1), &m, 0.5);
        assert_eq!(unique.doc_a.len(), 8);
        assert_eq!(unique.doc_a[0], "A0");
        assert_eq!(unique.doc_a[7], "A7");

        let shown = unique.truncated(5);
        assert_eq!(shown.doc_a, vec!["A0", "A1", "A2", "A3", "A4"]);
        assert_eq!(shown.doc_b, vec!["B0"]);
    }

    #[test]
    fn test_empty_other_side_means_all_unique() {
        let m = SimilarityMatrix::build(&[vec![1.0], vec![1.0]], &[]);
        let unique = find_unique(&chunks(Side::A, 2), &[], &m, 0.5);
        assert_eq!(unique.doc_a.len(), 2);
    }
}
