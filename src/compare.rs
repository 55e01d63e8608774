//! The comparison pipeline.
//!
//! ```text
//! text A ─ chunk ─ embed ─┐                          ┌─ overall similarity
//!                         ├─ similarity matrix (1×) ─┼─ ranked pairs
//! text B ─ chunk ─ embed ─┘                          └─ unique chunks
//! ```
//!
//! The two embedding calls are independent and run on their own threads;
//! the matrix waits for both. Everything after the matrix is a cheap
//! reduction over it.
//!
//! A comparison either succeeds completely or returns one error. There is no
//! partial result: if the embedding provider fails or times out, the whole
//! comparison fails rather than quietly dropping semantic analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, Side};
use crate::config::CompareConfig;
use crate::embed::{embedder_for, Embedder};
use crate::pairs::{PairRanker, SimilarChunkPair};
use crate::score::overall_similarity;
use crate::similarity::SimilarityMatrix;
use crate::unique::{find_unique, UniqueChunks};
use crate::window::WordWindowChunker;
use crate::{Chunker, Error, Result};

/// How often a waiting comparison checks its cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// The outcome of comparing two documents.
///
/// Flat and serializable: floats, counts, strings, and bounded lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Cosine similarity of the two documents' centroid embeddings.
    pub overall_similarity: f32,
    /// Number of chunks document A produced.
    pub chunk_count_a: usize,
    /// Number of chunks document B produced.
    pub chunk_count_b: usize,
    /// Strongest alignments, highest similarity first.
    pub similar_pairs: Vec<SimilarChunkPair>,
    /// First unique chunks of A, in document order.
    pub unique_chunks_a: Vec<String>,
    /// First unique chunks of B, in document order.
    pub unique_chunks_b: Vec<String>,
}

/// A comparison together with the intermediate state it was derived from.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// The bounded, caller-facing result.
    pub result: ComparisonResult,
    /// Every unique chunk, without the display limit.
    pub unique: UniqueChunks,
    /// The chunk-by-chunk similarity matrix (rows A, columns B).
    pub matrix: SimilarityMatrix,
    /// Chunks of document A.
    pub chunks_a: Vec<Chunk>,
    /// Chunks of document B.
    pub chunks_b: Vec<Chunk>,
}

/// Cooperative cancellation flag, checked between pipeline stages.
///
/// Clones share the same flag.
///
/// ```rust
/// use docalign::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn checkpoint(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            tracing::debug!(stage, "comparison cancelled");
            Err(Error::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}

/// Compares document pairs with an injected embedding provider.
///
/// A `Comparator` holds no per-request state; one instance can serve many
/// comparisons, concurrently if the provider allows it.
///
/// ```rust
/// use std::sync::Arc;
/// use docalign::{Comparator, CompareConfig, HashingEmbedder};
///
/// let config = CompareConfig::new().with_window_size(16);
/// let comparator = Comparator::new(Arc::new(HashingEmbedder::default()), config).unwrap();
///
/// let text = "Ownership is a set of rules that govern how a Rust program manages memory. \
///             All programs have to manage the way they use a computer's memory while running.";
/// let result = comparator.compare(text, text).unwrap();
/// assert!((result.overall_similarity - 1.0).abs() < 1e-5);
/// assert!(result.unique_chunks_a.is_empty());
/// ```
#[derive(Clone)]
pub struct Comparator {
    embedder: Arc<dyn Embedder>,
    config: CompareConfig,
    timeout: Option<Duration>,
}

impl Comparator {
    /// Create a comparator around `embedder`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `config` does not validate.
    pub fn new(embedder: Arc<dyn Embedder>, config: CompareConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.embedding_timeout();
        Ok(Self {
            embedder,
            config,
            timeout,
        })
    }

    /// Create a comparator with the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a bad config or unknown
    /// model, or [`Error::EmbeddingUnavailable`] if the model fails to load.
    pub fn from_config(config: CompareConfig) -> Result<Self> {
        config.validate()?;
        let embedder = embedder_for(&config.embedding_model, config.embedding_dimension)?;
        Self::new(embedder, config)
    }

    /// Override the embedding deadline; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// The injected embedding provider.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Compare two documents.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDocument`] if either text yields no chunks
    /// - [`Error::EmbeddingUnavailable`] if the provider fails or returns
    ///   malformed output
    /// - [`Error::EmbeddingTimeout`] if the provider misses the deadline
    pub fn compare(&self, text_a: &str, text_b: &str) -> Result<ComparisonResult> {
        self.compare_with_cancel(text_a, text_b, &CancelToken::new())
    }

    /// Compare two documents, stopping early if `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`compare`](Self::compare), plus [`Error::Cancelled`].
    pub fn compare_with_cancel(
        &self,
        text_a: &str,
        text_b: &str,
        cancel: &CancelToken,
    ) -> Result<ComparisonResult> {
        self.compare_full(text_a, text_b, cancel).map(|c| c.result)
    }

    /// The similarity matrix of two documents (rows A, columns B).
    ///
    /// # Errors
    ///
    /// As [`compare`](Self::compare).
    pub fn similarity_matrix(&self, text_a: &str, text_b: &str) -> Result<SimilarityMatrix> {
        self.compare_full(text_a, text_b, &CancelToken::new())
            .map(|c| c.matrix)
    }

    /// Compare two documents and keep every intermediate product.
    ///
    /// # Errors
    ///
    /// As [`compare_with_cancel`](Self::compare_with_cancel).
    pub fn compare_full(
        &self,
        text_a: &str,
        text_b: &str,
        cancel: &CancelToken,
    ) -> Result<Comparison> {
        let span = tracing::info_span!(
            "compare",
            model = self.embedder.model_id(),
            window = self.config.window_size
        );
        let _guard = span.enter();
        let started = Instant::now();

        cancel.checkpoint("chunking")?;
        let chunker = WordWindowChunker::new(self.config.window_size)?
            .with_min_chars(self.config.min_chunk_chars);
        let chunks_a = chunker.chunk(text_a, Side::A);
        let chunks_b = chunker.chunk(text_b, Side::B);
        tracing::debug!(
            chunks_a = chunks_a.len(),
            chunks_b = chunks_b.len(),
            "chunked documents"
        );
        if chunks_a.is_empty() {
            return Err(Error::EmptyDocument { side: Side::A });
        }
        if chunks_b.is_empty() {
            return Err(Error::EmptyDocument { side: Side::B });
        }

        cancel.checkpoint("embedding")?;
        let (embeddings_a, embeddings_b) = self.embed_pair(&chunks_a, &chunks_b, cancel)?;
        check_dimensions(&embeddings_a, &embeddings_b)?;
        check_finite(Side::A, &embeddings_a)?;
        check_finite(Side::B, &embeddings_b)?;

        cancel.checkpoint("similarity matrix")?;
        let matrix = SimilarityMatrix::build(&embeddings_a, &embeddings_b);

        cancel.checkpoint("scoring")?;
        let overall = overall_similarity(&embeddings_a, &embeddings_b)?;
        let similar_pairs = PairRanker::new(
            self.config.pair_similarity_threshold,
            self.config.top_n_pairs,
        )
        .with_excerpt_chars(self.config.excerpt_chars)
        .rank(&chunks_a, &chunks_b, &matrix);
        let unique = find_unique(
            &chunks_a,
            &chunks_b,
            &matrix,
            self.config.uniqueness_threshold,
        );

        let shown = unique
            .clone()
            .truncated(self.config.unique_chunk_display_limit);
        let result = ComparisonResult {
            overall_similarity: overall,
            chunk_count_a: chunks_a.len(),
            chunk_count_b: chunks_b.len(),
            similar_pairs,
            unique_chunks_a: shown.doc_a,
            unique_chunks_b: shown.doc_b,
        };

        tracing::info!(
            overall = result.overall_similarity,
            pairs = result.similar_pairs.len(),
            unique_a = unique.doc_a.len(),
            unique_b = unique.doc_b.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "comparison complete"
        );

        Ok(Comparison {
            result,
            unique,
            matrix,
            chunks_a,
            chunks_b,
        })
    }

    /// Embed both chunk sets concurrently and join on the results.
    fn embed_pair(
        &self,
        chunks_a: &[Chunk],
        chunks_b: &[Chunk],
        cancel: &CancelToken,
    ) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>)> {
        let (tx, rx) = crossbeam_channel::bounded::<(Side, Result<Vec<Vec<f32>>>)>(2);

        for (side, chunks) in [(Side::A, chunks_a), (Side::B, chunks_b)] {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embedder = Arc::clone(&self.embedder);
            let tx = tx.clone();
            thread::Builder::new()
                .name(format!("docalign-embed-{side}"))
                .spawn(move || {
                    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                    let embedded = embedder.embed(&refs);
                    // the receiver is gone if the comparison already failed
                    let _ = tx.send((side, embedded));
                })
                .map_err(|e| {
                    Error::EmbeddingUnavailable(format!("failed to spawn embedding worker: {e}"))
                })?;
        }
        drop(tx);

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut embeddings_a = None;
        let mut embeddings_b = None;

        while embeddings_a.is_none() || embeddings_b.is_none() {
            cancel.checkpoint("embedding")?;

            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(self.timed_out());
                    }
                    remaining.min(CANCEL_POLL)
                }
                None => CANCEL_POLL,
            };

            match rx.recv_timeout(wait) {
                Ok((side, embedded)) => {
                    let embedded = embedded.map_err(|e| {
                        tracing::warn!(%side, error = %e, "embedding provider failed");
                        if matches!(e, Error::EmbeddingUnavailable(_)) {
                            e
                        } else {
                            Error::EmbeddingUnavailable(e.to_string())
                        }
                    })?;
                    let expected = match side {
                        Side::A => chunks_a.len(),
                        Side::B => chunks_b.len(),
                    };
                    check_count(side, &embedded, expected)?;
                    match side {
                        Side::A => embeddings_a = Some(embedded),
                        Side::B => embeddings_b = Some(embedded),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("embedding worker exited without a result");
                    return Err(Error::EmbeddingUnavailable(
                        "embedding worker exited without a result".to_string(),
                    ));
                }
            }
        }

        match (embeddings_a, embeddings_b) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(Error::EmbeddingUnavailable(
                "embedding results missing".to_string(),
            )),
        }
    }

    fn timed_out(&self) -> Error {
        let timeout = self.timeout.unwrap_or_default();
        tracing::warn!(?timeout, "embedding provider timed out");
        Error::EmbeddingTimeout(timeout)
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("model", &self.embedder.model_id())
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn check_count(side: Side, embeddings: &[Vec<f32>], expected: usize) -> Result<()> {
    if embeddings.len() == expected {
        Ok(())
    } else {
        Err(Error::EmbeddingUnavailable(format!(
            "provider returned {} embeddings for {expected} chunks of document {side}",
            embeddings.len()
        )))
    }
}

fn check_dimensions(embeddings_a: &[Vec<f32>], embeddings_b: &[Vec<f32>]) -> Result<()> {
    let dim = embeddings_a.first().map(Vec::len).unwrap_or_default();
    if dim == 0 {
        return Err(Error::EmbeddingUnavailable(
            "provider returned zero-length embeddings".to_string(),
        ));
    }
    let consistent = embeddings_a
        .iter()
        .chain(embeddings_b.iter())
        .all(|v| v.len() == dim);
    if consistent {
        Ok(())
    } else {
        Err(Error::EmbeddingUnavailable(format!(
            "provider returned embeddings of mixed dimension (expected {dim})"
        )))
    }
}

/// NaN or infinite components would poison every norm and cosine they touch.
fn check_finite(side: Side, embeddings: &[Vec<f32>]) -> Result<()> {
    match embeddings
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        None => Ok(()),
        Some(chunk) => {
            tracing::warn!(%side, chunk, "provider returned non-finite embedding");
            Err(Error::EmbeddingUnavailable(format!(
                "provider returned a non-finite embedding for chunk {chunk} of document {side}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;

    fn comparator(window: usize) -> Comparator {
        Comparator::new(
            Arc::new(HashingEmbedder::default()),
            CompareConfig::new().with_window_size(window),
        )
        .unwrap()
    }

    const TEXT: &str = "The borrow checker enforces that references never outlive the data \
        they point to, and that mutable references are exclusive for their whole lifetime.";

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let err = Comparator::new(
            Arc::new(HashingEmbedder::default()),
            CompareConfig::new().with_window_size(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_document_sides() {
        let c = comparator(16);
        assert!(matches!(
            c.compare("too short", TEXT),
            Err(Error::EmptyDocument { side: Side::A })
        ));
        assert!(matches!(
            c.compare(TEXT, "   "),
            Err(Error::EmptyDocument { side: Side::B })
        ));
    }

    #[test]
    fn test_pre_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let err = comparator(16)
            .compare_with_cancel(TEXT, TEXT, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { stage: "chunking" }));
    }

    #[test]
    fn test_full_keeps_unbounded_unique() {
        let c = Comparator::new(
            Arc::new(HashingEmbedder::new(2048)),
            CompareConfig::new()
                .with_window_size(12)
                .with_unique_display_limit(1),
        )
        .unwrap();
        let other = "Photosynthesis converts sunlight water and carbon dioxide into glucose \
            and oxygen inside chloroplasts found in green plant leaves everywhere.";
        let full = c.compare_full(TEXT, other, &CancelToken::new()).unwrap();

        assert!(full.unique.doc_a.len() > 1);
        assert_eq!(full.result.unique_chunks_a.len(), 1);
        assert_eq!(full.result.unique_chunks_a[0], full.unique.doc_a[0]);
        assert_eq!(full.matrix.rows(), full.chunks_a.len());
        assert_eq!(full.matrix.cols(), full.chunks_b.len());
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(&[vec![1.0]], &[vec![1.0]]).is_ok());
        assert!(check_dimensions(&[vec![]], &[vec![]]).is_err());
        assert!(check_dimensions(&[vec![1.0]], &[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_check_finite() {
        assert!(check_finite(Side::A, &[vec![0.5, -0.5], vec![0.0, 0.0]]).is_ok());
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = check_finite(Side::B, &[vec![1.0, 0.0], vec![0.0, bad]]).unwrap_err();
            assert!(
                matches!(err, Error::EmbeddingUnavailable(ref m) if m.contains("chunk 1 of document B")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_result_serializes_flat() {
        let result = comparator(16).compare(TEXT, TEXT).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["overall_similarity"].is_number());
        assert_eq!(json["chunk_count_a"], json["chunk_count_b"]);
        assert!(json["similar_pairs"].is_array());
    }
}
