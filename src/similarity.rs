//! Pairwise chunk similarity.
//!
//! ## The Matrix
//!
//! Every chunk of document A is compared with every chunk of document B:
//!
//! ```text
//!              B0     B1     B2
//!        A0 [ 0.91   0.12   0.05 ]
//!        A1 [ 0.08   0.97   0.33 ]
//!        A2 [ 0.02   0.41   0.10 ]   <- row max 0.41: A2 has no close match
//!                                      ^ column max 0.33: B2 has none either
//! ```
//!
//! The matrix is built once per comparison and shared by the pair ranker and
//! the unique-chunk detector. Rows are document A, columns document B.
//!
//! ## Cost
//!
//! O(|A| × |B| × d) for d-dimensional embeddings. With the default 512-word
//! windows a 100-page document yields on the order of 100 chunks, so the
//! matrix stays in the tens of thousands of cells.

/// Cosine similarity between two vectors.
///
/// Returns 0 when either vector has zero norm instead of dividing by zero.
/// Vectors of unequal length are compared over their common prefix.
///
/// ```rust
/// use docalign::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
/// ```
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Element-wise mean of a set of vectors.
///
/// Returns `None` for an empty set, where the mean is undefined.
#[must_use]
pub fn mean_vector(embeddings: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = embeddings.first()?;
    let mut result = vec![0.0f32; first.len()];
    let count = embeddings.len() as f32;

    for emb in embeddings {
        for (acc, &v) in result.iter_mut().zip(emb.iter()) {
            *acc += v;
        }
    }

    for v in &mut result {
        *v /= count;
    }

    Some(result)
}

/// Dense `|A| × |B|` matrix of cosine similarities, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build the matrix for `embeddings_a` (rows) against `embeddings_b` (columns).
    #[must_use]
    pub fn build(embeddings_a: &[Vec<f32>], embeddings_b: &[Vec<f32>]) -> Self {
        let rows = embeddings_a.len();
        let cols = embeddings_b.len();

        // Norms are computed once per vector instead of once per cell.
        let norms_b: Vec<f32> = embeddings_b.iter().map(|v| norm(v)).collect();
        let row = |a: &Vec<f32>| -> Vec<f32> {
            let norm_a = norm(a);
            embeddings_b
                .iter()
                .zip(norms_b.iter())
                .map(|(b, &norm_b)| {
                    if norm_a > 0.0 && norm_b > 0.0 {
                        dot(a, b) / (norm_a * norm_b)
                    } else {
                        0.0
                    }
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let data: Vec<f32> = {
            use rayon::prelude::*;
            embeddings_a.par_iter().flat_map_iter(row).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let data: Vec<f32> = embeddings_a.iter().flat_map(row).collect();

        Self { rows, cols, data }
    }

    /// Number of rows (chunks in document A).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (chunks in document B).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Similarity of A-chunk `i` and B-chunk `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of range");
        self.data[i * self.cols + j]
    }

    /// All similarities of A-chunk `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Best match for A-chunk `i` anywhere in B, or `None` if B is empty.
    #[must_use]
    pub fn row_max(&self, i: usize) -> Option<f32> {
        self.row(i).iter().copied().reduce(f32::max)
    }

    /// Best match for B-chunk `j` anywhere in A, or `None` if A is empty.
    #[must_use]
    pub fn col_max(&self, j: usize) -> Option<f32> {
        (0..self.rows).map(|i| self.get(i, j)).reduce(f32::max)
    }

    /// Iterate `(i, j, similarity)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .map(move |(k, &s)| (k / cols, k % cols, s))
    }

    /// The matrix with the roles of A and B swapped.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.get(i, j));
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
