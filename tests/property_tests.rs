//! Property-based tests for chunking and alignment.
//!
//! These tests verify that the pipeline maintains key invariants:
//! - Coverage: word windows cover every word when nothing is filtered
//! - Monotonicity: raising a threshold never adds pairs or uniques
//! - Symmetry: swapping the documents transposes the matrix
//! - Determinism: same inputs, same result

use std::sync::Arc;

use proptest::prelude::*;
use docalign::{
    find_unique, Chunk, Chunker, Comparator, CompareConfig, HashingEmbedder, PairRanker, Side,
    SimilarityMatrix, WordWindowChunker,
};

// =============================================================================
// Test Generators
// =============================================================================

/// Whitespace-separated words drawn from a small vocabulary, so documents
/// overlap often.
fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "lease", "tenant", "rent", "deposit", "notice", "repairs", "landlord", "term",
            "payment", "interest", "premises", "schedule",
        ]),
        0..200,
    )
    .prop_map(|words| words.join(" "))
}

fn embeddings(rows: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), rows)
}

fn chunks(side: Side, n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| Chunk::new(format!("{side} chunk {i}"), i, side, i, i + 1))
        .collect()
}

// =============================================================================
// Chunking
// =============================================================================

proptest! {
    #[test]
    fn windows_cover_every_word(
        words in prop::collection::vec("[a-z]{1,8}", 0..300),
        window in 1usize..40,
    ) {
        let text = words.join(" ");
        let chunker = WordWindowChunker::new(window).unwrap().with_min_chars(0);
        let chunks = chunker.chunk(&text, Side::A);

        let mut covered = vec![false; words.len()];
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index, i);
            prop_assert!(chunk.word_count() <= window);
            prop_assert_eq!(&chunk.text, &words[chunk.words()].join(" "));
            for w in chunk.words() {
                covered[w] = true;
            }
        }
        prop_assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn windows_start_on_stride(text in document(), window in 1usize..64) {
        let chunker = WordWindowChunker::new(window).unwrap().with_min_chars(0);
        let stride = chunker.stride();
        prop_assert!(stride >= 1);
        for chunk in chunker.chunk(&text, Side::B) {
            prop_assert_eq!(chunk.word_start % stride, 0);
            prop_assert_eq!(chunk.side, Side::B);
        }
    }

    #[test]
    fn kept_chunks_exceed_min_chars(text in document(), window in 1usize..64) {
        let chunker = WordWindowChunker::new(window).unwrap();
        for chunk in chunker.chunk(&text, Side::A) {
            prop_assert!(chunk.text.chars().count() > 50);
        }
    }
}

// =============================================================================
// Thresholds
// =============================================================================

proptest! {
    #[test]
    fn higher_pair_threshold_never_adds_pairs(
        a in embeddings(1..8),
        b in embeddings(1..8),
        low in -1.0f32..1.0,
        delta in 0.0f32..1.0,
    ) {
        let matrix = SimilarityMatrix::build(&a, &b);
        let (ca, cb) = (chunks(Side::A, a.len()), chunks(Side::B, b.len()));

        let loose = PairRanker::new(low, usize::MAX).rank(&ca, &cb, &matrix);
        let strict = PairRanker::new(low + delta, usize::MAX).rank(&ca, &cb, &matrix);
        prop_assert!(strict.len() <= loose.len());

        for pair in &loose {
            prop_assert!(pair.similarity > low);
        }
        for w in loose.windows(2) {
            prop_assert!(w[0].similarity >= w[1].similarity);
        }
    }

    #[test]
    fn higher_uniqueness_threshold_never_removes_uniques(
        a in embeddings(1..8),
        b in embeddings(1..8),
        low in -1.0f32..1.0,
        delta in 0.0f32..1.0,
    ) {
        let matrix = SimilarityMatrix::build(&a, &b);
        let (ca, cb) = (chunks(Side::A, a.len()), chunks(Side::B, b.len()));

        let few = find_unique(&ca, &cb, &matrix, low);
        let more = find_unique(&ca, &cb, &matrix, low + delta);
        prop_assert!(few.doc_a.len() <= more.doc_a.len());
        prop_assert!(few.doc_b.len() <= more.doc_b.len());
    }

    #[test]
    fn top_n_truncates_the_full_ranking(
        a in embeddings(1..8),
        b in embeddings(1..8),
        top_n in 0usize..10,
    ) {
        let matrix = SimilarityMatrix::build(&a, &b);
        let (ca, cb) = (chunks(Side::A, a.len()), chunks(Side::B, b.len()));

        let all = PairRanker::new(0.0, usize::MAX).rank(&ca, &cb, &matrix);
        let top = PairRanker::new(0.0, top_n).rank(&ca, &cb, &matrix);
        prop_assert_eq!(top.len(), all.len().min(top_n));
        prop_assert_eq!(&top[..], &all[..top.len()]);
    }
}

// =============================================================================
// Symmetry and Determinism
// =============================================================================

proptest! {
    #[test]
    fn matrix_transposes_under_swap(a in embeddings(0..8), b in embeddings(0..8)) {
        let ab = SimilarityMatrix::build(&a, &b);
        let ba = SimilarityMatrix::build(&b, &a);
        prop_assert_eq!(ab.transpose(), ba);
    }

    #[test]
    fn matrix_cells_are_bounded(a in embeddings(1..8), b in embeddings(1..8)) {
        let m = SimilarityMatrix::build(&a, &b);
        for (_, _, s) in m.cells() {
            prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&s));
        }
    }

    #[test]
    fn comparison_is_deterministic(a in document(), b in document()) {
        let comparator = Comparator::new(
            Arc::new(HashingEmbedder::default()),
            CompareConfig::new().with_window_size(24),
        )
        .unwrap();

        let first = comparator.compare(&a, &b);
        let second = comparator.compare(&a, &b);
        match (first, second) {
            (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
            (Err(x), Err(y)) => prop_assert_eq!(x.to_string(), y.to_string()),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }
}
