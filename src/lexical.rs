//! Lexical importance via TF-IDF.
//!
//! Where the semantic core asks "do these passages mean the same thing",
//! TF-IDF asks "do these documents use the same distinctive vocabulary".
//!
//! ## Weighting
//!
//! With two documents, n = 2 and each term's document frequency is 1 or 2:
//!
//! ```text
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = count(t, d) × idf(t)
//! vector(d) = w(·, d) / ‖w(·, d)‖
//! ```
//!
//! A term found in only one document gets idf ≈ 1.41, a shared term gets
//! exactly 1, so the top terms of each document lean toward what sets it
//! apart.
//!
//! ## Terms
//!
//! Unicode words of at least two characters, lowercased, minus stop words,
//! expanded to n-grams (1..=3 by default). The vocabulary is capped at the
//! most frequent `max_features` terms across both documents.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::similarity::cosine_similarity;

/// Built-in stop-word lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    /// Keep every word.
    None,
    /// Common English function words.
    English,
    /// Common Spanish function words.
    #[default]
    Spanish,
}

impl StopWords {
    fn words(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::English => ENGLISH_STOP_WORDS,
            Self::Spanish => SPANISH_STOP_WORDS,
        }
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "if", "in", "into", "is", "it", "its", "may", "more", "must", "no",
    "not", "of", "on", "or", "other", "our", "shall", "she", "should", "so", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to",
    "under", "up", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would",
    "you", "your",
];

const SPANISH_STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "ante", "como", "con", "contra", "cual", "cuando", "de", "del", "desde",
    "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en", "entre", "era", "es", "esa",
    "ese", "eso", "esta", "este", "esto", "fue", "ha", "hay", "la", "las", "le", "les", "lo",
    "los", "mas", "más", "me", "mi", "muy", "ni", "no", "nos", "o", "para", "pero", "por",
    "porque", "que", "qué", "se", "ser", "si", "sí", "sin", "sobre", "son", "su", "sus",
    "también", "te", "tiene", "todo", "un", "una", "uno", "unos", "y", "ya",
];

/// TF-IDF comparison of two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalComparison {
    /// Cosine similarity of the two TF-IDF vectors.
    pub cosine_similarity: f32,
    /// Highest-weighted terms of A, best first.
    pub top_terms_a: Vec<String>,
    /// Highest-weighted terms of B, best first.
    pub top_terms_b: Vec<String>,
    /// Top terms of A that are not top terms of B.
    pub unique_terms_a: Vec<String>,
    /// Top terms of B that are not top terms of A.
    pub unique_terms_b: Vec<String>,
}

/// TF-IDF analyzer for document pairs.
///
/// ```rust
/// use docalign::{LexicalAnalyzer, StopWords};
///
/// let analyzer = LexicalAnalyzer::new().with_stop_words(StopWords::English);
/// let cmp = analyzer.compare(
///     "The tenant pays rent monthly to the landlord.",
///     "The landlord repairs the roof of the building.",
/// );
/// assert!(cmp.cosine_similarity > 0.0 && cmp.cosine_similarity < 1.0);
/// assert!(cmp.unique_terms_a.contains(&"tenant".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct LexicalAnalyzer {
    max_features: usize,
    ngram_range: (usize, usize),
    top_n: usize,
    stop_words: HashSet<&'static str>,
}

impl LexicalAnalyzer {
    /// Analyzer with 1000 features, 1..=3-grams, 20 top terms, Spanish stop words.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_features: 1000,
            ngram_range: (1, 3),
            top_n: 20,
            stop_words: StopWords::default().words().iter().copied().collect(),
        }
    }

    /// Cap the vocabulary size.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the n-gram range, inclusive. A zero lower bound is treated as 1.
    #[must_use]
    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        let min = min.max(1);
        self.ngram_range = (min, max.max(min));
        self
    }

    /// Set how many top terms are reported per document.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Choose the stop-word list.
    #[must_use]
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words.words().iter().copied().collect();
        self
    }

    /// Compare two documents.
    ///
    /// If neither document contains a usable term the similarity is 0 and
    /// every term list is empty.
    #[must_use]
    pub fn compare(&self, text_a: &str, text_b: &str) -> LexicalComparison {
        let counts_a = self.term_counts(text_a);
        let counts_b = self.term_counts(text_b);

        let vocabulary = self.vocabulary(&counts_a, &counts_b);
        if vocabulary.is_empty() {
            tracing::debug!("empty TF-IDF vocabulary");
            return LexicalComparison {
                cosine_similarity: 0.0,
                top_terms_a: vec![],
                top_terms_b: vec![],
                unique_terms_a: vec![],
                unique_terms_b: vec![],
            };
        }

        let weights_a = weigh(&vocabulary, &counts_a, &counts_b);
        let weights_b = weigh(&vocabulary, &counts_b, &counts_a);

        let top_terms_a = self.top_terms(&vocabulary, &weights_a);
        let top_terms_b = self.top_terms(&vocabulary, &weights_b);
        let unique_terms_a = difference(&top_terms_a, &top_terms_b);
        let unique_terms_b = difference(&top_terms_b, &top_terms_a);

        LexicalComparison {
            cosine_similarity: cosine_similarity(&weights_a, &weights_b),
            top_terms_a,
            top_terms_b,
            unique_terms_a,
            unique_terms_b,
        }
    }

    fn term_counts(&self, text: &str) -> BTreeMap<String, usize> {
        let tokens: Vec<String> = text
            .unicode_words()
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() >= 2 && !self.stop_words.contains(w.as_str()))
            .collect();

        let mut counts = BTreeMap::new();
        let (min, max) = self.ngram_range;
        for n in min..=max {
            for gram in tokens.windows(n) {
                *counts.entry(gram.join(" ")).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Most frequent terms across both documents, ties alphabetical.
    fn vocabulary(
        &self,
        counts_a: &BTreeMap<String, usize>,
        counts_b: &BTreeMap<String, usize>,
    ) -> Vec<String> {
        let mut corpus: BTreeMap<&str, usize> = BTreeMap::new();
        for (term, &count) in counts_a.iter().chain(counts_b.iter()) {
            *corpus.entry(term.as_str()).or_insert(0) += count;
        }

        let mut ranked: Vec<(&str, usize)> = corpus.into_iter().collect();
        // BTreeMap order is alphabetical, and the sort is stable
        ranked.sort_by(|x, y| y.1.cmp(&x.1));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        vocabulary
    }

    fn top_terms(&self, vocabulary: &[String], weights: &[f32]) -> Vec<String> {
        let mut ranked: Vec<(usize, f32)> = weights
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, w)| w > 0.0)
            .collect();
        ranked.sort_by(|x, y| y.1.total_cmp(&x.1));
        ranked
            .into_iter()
            .take(self.top_n)
            .map(|(i, _)| vocabulary[i].clone())
            .collect()
    }
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// L2-normalized TF-IDF weights of `counts` over `vocabulary`.
fn weigh(
    vocabulary: &[String],
    counts: &BTreeMap<String, usize>,
    other: &BTreeMap<String, usize>,
) -> Vec<f32> {
    const DOCS: f32 = 2.0;

    let mut weights: Vec<f32> = vocabulary
        .iter()
        .map(|term| {
            let tf = counts.get(term).copied().unwrap_or(0) as f32;
            let df = usize::from(counts.contains_key(term)) + usize::from(other.contains_key(term));
            let idf = ((1.0 + DOCS) / (1.0 + df as f32)).ln() + 1.0;
            tf * idf
        })
        .collect();

    let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for w in &mut weights {
            *w /= norm;
        }
    }
    weights
}

fn difference(terms: &[String], other: &[String]) -> Vec<String> {
    let other: HashSet<&str> = other.iter().map(String::as_str).collect();
    terms
        .iter()
        .filter(|t| !other.contains(t.as_str()))
        .cloned()
        .collect()
}
