//! Whole-document similarity.
//!
//! The aggregate score compares document centroids: the mean of each
//! document's chunk embeddings, then the cosine of the two means.
//!
//! ```text
//! A: [a0, a1, a2]  ->  mean(A) ─┐
//!                               ├─ cosine -> overall similarity
//! B: [b0, b1]      ->  mean(B) ─┘
//! ```
//!
//! This is deliberately not derived from the similarity matrix. The matrix
//! answers "which passages line up"; the centroid answers "are these
//! documents about the same thing overall". Two documents can share one
//! verbatim paragraph and still have distant centroids.

use crate::chunk::Side;
use crate::similarity::{cosine_similarity, mean_vector};
use crate::{Error, Result};

/// Cosine similarity of the two documents' mean embeddings.
///
/// # Errors
///
/// Returns [`Error::EmptyDocument`] if either side has no embeddings,
/// since the mean of an empty set is undefined.
///
/// ```rust
/// use docalign::overall_similarity;
///
/// let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
/// let b = vec![vec![1.0, 1.0]];
/// assert!((overall_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);
/// ```
pub fn overall_similarity(embeddings_a: &[Vec<f32>], embeddings_b: &[Vec<f32>]) -> Result<f32> {
    let mean_a = mean_vector(embeddings_a).ok_or(Error::EmptyDocument { side: Side::A })?;
    let mean_b = mean_vector(embeddings_b).ok_or(Error::EmptyDocument { side: Side::B })?;
    Ok(cosine_similarity(&mean_a, &mean_b))
}
