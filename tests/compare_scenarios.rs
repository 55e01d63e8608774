//! End-to-end comparison scenarios.
//!
//! Every test injects its own embedding provider, so nothing here needs a
//! model download.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use docalign::{
    CancelToken, Comparator, CompareConfig, Embedder, Error, HashingEmbedder, Result, Side,
};

// =============================================================================
// Fixtures
// =============================================================================

/// `n` distinct words sharing a prefix: "left0 left1 left2 ..."
fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn comparator(window: usize) -> Comparator {
    Comparator::new(
        Arc::new(HashingEmbedder::new(4096)),
        CompareConfig::new()
            .with_window_size(window)
            .with_top_n_pairs(100),
    )
    .unwrap()
}

/// Provider that always fails.
struct DownEmbedder;

impl Embedder for DownEmbedder {
    fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(Error::EmbeddingUnavailable("connection refused".to_string()))
    }
    fn dimension(&self) -> usize {
        8
    }
    fn model_id(&self) -> &str {
        "down"
    }
}

/// Provider that drops the last vector.
struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0; 8]; texts.len().saturating_sub(1)])
    }
    fn dimension(&self) -> usize {
        8
    }
    fn model_id(&self) -> &str {
        "short"
    }
}

/// Provider whose vector width depends on the text.
struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![1.0; 4 + t.len() % 3]).collect())
    }
    fn dimension(&self) -> usize {
        4
    }
    fn model_id(&self) -> &str {
        "ragged"
    }
}

/// Provider that emits vectors with one poisoned component.
struct NonFiniteEmbedder(f32);

impl Embedder for NonFiniteEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|_| {
                let mut v = vec![0.5; 8];
                v[3] = self.0;
                v
            })
            .collect())
    }
    fn dimension(&self) -> usize {
        8
    }
    fn model_id(&self) -> &str {
        "non-finite"
    }
}

/// Provider that panics.
struct PanicEmbedder;

impl Embedder for PanicEmbedder {
    fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        panic!("model crashed");
    }
    fn dimension(&self) -> usize {
        8
    }
    fn model_id(&self) -> &str {
        "panic"
    }
}

/// Hashing provider that sleeps first and counts calls.
struct SlowEmbedder {
    delay: Duration,
    calls: AtomicUsize,
    inner: HashingEmbedder,
}

impl SlowEmbedder {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            inner: HashingEmbedder::default(),
        }
    }
}

impl Embedder for SlowEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.embed(texts)
    }
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
    fn model_id(&self) -> &str {
        "slow"
    }
}

fn with_provider(embedder: Arc<dyn Embedder>) -> Comparator {
    Comparator::new(embedder, CompareConfig::new().with_window_size(20)).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn identical_documents_align_with_themselves() {
    let text = words("term", 90);
    let full = comparator(20)
        .compare_full(&text, &text, &CancelToken::new())
        .unwrap();
    let result = &full.result;

    assert!((result.overall_similarity - 1.0).abs() < 1e-5);
    assert!(result.unique_chunks_a.is_empty());
    assert!(result.unique_chunks_b.is_empty());
    assert_eq!(result.chunk_count_a, result.chunk_count_b);

    for i in 0..result.chunk_count_a {
        let self_pair = result
            .similar_pairs
            .iter()
            .find(|p| p.index_a == i && p.index_b == i)
            .unwrap_or_else(|| panic!("chunk {i} not paired with itself"));
        assert!((self_pair.similarity - 1.0).abs() < 1e-5);
    }
}

#[test]
fn disjoint_documents_share_nothing() {
    let a = words("left", 100);
    let b = words("right", 100);
    let full = comparator(20)
        .compare_full(&a, &b, &CancelToken::new())
        .unwrap();
    let result = &full.result;

    assert!(result.overall_similarity.abs() < 0.3, "{}", result.overall_similarity);
    assert!(result.similar_pairs.is_empty());

    let expected_a: Vec<String> = full.chunks_a.iter().take(5).map(|c| c.text.clone()).collect();
    let expected_b: Vec<String> = full.chunks_b.iter().take(5).map(|c| c.text.clone()).collect();
    assert_eq!(result.unique_chunks_a, expected_a);
    assert_eq!(result.unique_chunks_b, expected_b);
    assert_eq!(full.unique.doc_a.len(), full.chunks_a.len());
}

#[test]
fn partial_overlap_pairs_shared_and_isolates_the_rest() {
    let p1 = words("shared", 60);
    let a = format!("{p1} {}", words("left", 60));
    let b = format!("{p1} {}", words("right", 60));

    let full = comparator(20)
        .compare_full(&a, &b, &CancelToken::new())
        .unwrap();
    let result = &full.result;

    assert!(result.similar_pairs[0].similarity >= 0.95);
    assert!(result
        .similar_pairs
        .iter()
        .filter(|p| p.similarity >= 0.95)
        .all(|p| p.chunk_a_excerpt.starts_with("shared")));

    assert!(!full.unique.doc_a.is_empty());
    assert!(!full.unique.doc_b.is_empty());
    assert!(full.unique.doc_a.iter().all(|t| t.contains("left")));
    assert!(full.unique.doc_b.iter().all(|t| t.contains("right")));
    assert!(full.unique.doc_a.iter().all(|t| !t.contains("right")));
}

#[test]
fn comparison_is_deterministic() {
    let a = format!("{} {}", words("alpha", 70), words("beta", 30));
    let b = format!("{} {}", words("beta", 40), words("gamma", 50));
    let c = comparator(16);

    let first = c.compare(&a, &b).unwrap();
    for _ in 0..3 {
        assert_eq!(c.compare(&a, &b).unwrap(), first);
    }
}

#[test]
fn matrix_transposes_under_swap() {
    let a = format!("{} {}", words("alpha", 50), words("beta", 30));
    let b = format!("{} {}", words("beta", 30), words("gamma", 45));
    let c = comparator(16);

    let ab = c.similarity_matrix(&a, &b).unwrap();
    let ba = c.similarity_matrix(&b, &a).unwrap();
    assert_eq!(ab.transpose(), ba);
}

#[test]
fn short_document_is_empty() {
    let long = words("term", 80);
    let c = comparator(20);

    assert!(matches!(
        c.compare("A tiny note.", &long),
        Err(Error::EmptyDocument { side: Side::A })
    ));
    assert!(matches!(
        c.compare(&long, ""),
        Err(Error::EmptyDocument { side: Side::B })
    ));
}

// =============================================================================
// Provider failures
// =============================================================================

#[test]
fn unavailable_provider_fails_the_comparison() {
    let text = words("term", 60);
    let err = with_provider(Arc::new(DownEmbedder))
        .compare(&text, &text)
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(ref m) if m.contains("refused")));
    assert!(!err.is_client_error());
}

#[test]
fn mismatched_count_is_unavailable() {
    let text = words("term", 60);
    let err = with_provider(Arc::new(ShortEmbedder))
        .compare(&text, &text)
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
}

#[test]
fn mismatched_dimension_is_unavailable() {
    let a = words("a", 60);
    let b = words("bb", 60);
    let err = with_provider(Arc::new(RaggedEmbedder))
        .compare(&a, &b)
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)), "{err}");
}

#[test]
fn non_finite_embeddings_are_unavailable() {
    let text = words("term", 60);
    for poison in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let result = with_provider(Arc::new(NonFiniteEmbedder(poison))).compare(&text, &text);
        assert!(
            matches!(result, Err(Error::EmbeddingUnavailable(ref m)) if m.contains("non-finite")),
            "{poison}: {result:?}"
        );
    }
}

#[test]
fn panicking_provider_is_unavailable() {
    let text = words("term", 60);
    let err = with_provider(Arc::new(PanicEmbedder))
        .compare(&text, &text)
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
}

#[test]
fn slow_provider_times_out() {
    let text = words("term", 60);
    let c = with_provider(Arc::new(SlowEmbedder::new(Duration::from_secs(2))))
        .with_timeout(Some(Duration::from_millis(100)));

    let started = Instant::now();
    let err = c.compare(&text, &text).unwrap_err();
    assert!(matches!(err, Error::EmbeddingTimeout(t) if t == Duration::from_millis(100)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn cancellation_interrupts_embedding() {
    let text = words("term", 60);
    let c = with_provider(Arc::new(SlowEmbedder::new(Duration::from_secs(2))));
    let token = CancelToken::new();

    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        })
    };

    let started = Instant::now();
    let err = c.compare_with_cancel(&text, &text, &token).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, Error::Cancelled { stage: "embedding" }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn shared_provider_serves_concurrent_comparisons() {
    let provider = Arc::new(SlowEmbedder::new(Duration::from_millis(10)));
    let c = with_provider(provider.clone());
    let text = words("term", 60);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| c.compare(&text, &text).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    // two embedding calls per comparison, one per document
    assert_eq!(provider.calls.load(Ordering::SeqCst), 8);
}

#[test]
fn invalid_configuration_fails_fast() {
    let err = Comparator::new(
        Arc::new(DownEmbedder),
        CompareConfig::new().with_uniqueness_threshold(2.0),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
    assert!(err.is_client_error());
}

#[test]
fn free_function_uses_defaults() {
    let text = words("clause", 700);
    let result = docalign::compare(&text, &text).unwrap();
    // 700 words at window 512, stride 384: windows at 0 and 384
    assert_eq!(result.chunk_count_a, 2);
    assert!(result.similar_pairs.len() <= 10);
}
