//! Comparison configuration.
//!
//! All the policy knobs of a comparison live here: window width, the two
//! thresholds, how much of the result is shown, and which embedding model
//! to use. Defaults reproduce the behavior of the reference system:
//!
//! | Field | Default |
//! |-------|---------|
//! | `window_size` | 512 words |
//! | `min_chunk_chars` | 50 |
//! | `pair_similarity_threshold` | 0.7 |
//! | `uniqueness_threshold` | 0.5 |
//! | `top_n_pairs` | 10 |
//! | `unique_chunk_display_limit` | 5 |
//! | `excerpt_chars` | 100 |
//! | `embedding_model` | `hashing` |
//! | `embedding_dimension` | 384 |
//! | `embedding_timeout_ms` | 300000 (5 minutes) |
//!
//! ## Sources
//!
//! A config is built in code with the `with_*` methods, parsed from TOML,
//! or loaded from a file, and can then take `DOCALIGN_*` environment
//! overrides:
//!
//! ```toml
//! window_size = 256
//! pair_similarity_threshold = 0.8
//! embedding_model = "fastembed:all-minilm-l6-v2"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embed::{DEFAULT_DIMENSION, HASHING_MODEL_ID};
use crate::pairs::{DEFAULT_EXCERPT_CHARS, DEFAULT_PAIR_THRESHOLD, DEFAULT_TOP_N_PAIRS};
use crate::unique::{DEFAULT_UNIQUENESS_THRESHOLD, DEFAULT_UNIQUE_DISPLAY_LIMIT};
use crate::window::{DEFAULT_MIN_CHUNK_CHARS, DEFAULT_WINDOW_SIZE};
use crate::{Error, Result};

/// Prefix of environment variables read by [`CompareConfig::apply_env`].
pub const ENV_PREFIX: &str = "DOCALIGN_";

/// Settings for one pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Chunk width in words.
    pub window_size: usize,
    /// Chunks of this many characters or fewer are dropped.
    pub min_chunk_chars: usize,
    /// Similarity a chunk pair must exceed to be reported.
    pub pair_similarity_threshold: f32,
    /// Best-match similarity below which a chunk is unique.
    pub uniqueness_threshold: f32,
    /// Maximum number of pairs reported.
    pub top_n_pairs: usize,
    /// Maximum number of unique chunks reported per document.
    pub unique_chunk_display_limit: usize,
    /// Excerpt length of reported pairs, in characters.
    pub excerpt_chars: usize,
    /// Embedding provider identity, e.g. `hashing` or `fastembed:bge-small-en-v1.5`.
    pub embedding_model: String,
    /// Vector width for providers with a configurable dimension.
    pub embedding_dimension: usize,
    /// Deadline for the embedding stage in milliseconds; `None` waits forever.
    pub embedding_timeout_ms: Option<u64>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            pair_similarity_threshold: DEFAULT_PAIR_THRESHOLD,
            uniqueness_threshold: DEFAULT_UNIQUENESS_THRESHOLD,
            top_n_pairs: DEFAULT_TOP_N_PAIRS,
            unique_chunk_display_limit: DEFAULT_UNIQUE_DISPLAY_LIMIT,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            embedding_model: HASHING_MODEL_ID.to_string(),
            embedding_dimension: DEFAULT_DIMENSION,
            embedding_timeout_ms: Some(300_000),
        }
    }
}

impl CompareConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk width in words.
    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the minimum chunk length in characters.
    #[must_use]
    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Set the pair similarity threshold.
    #[must_use]
    pub fn with_pair_threshold(mut self, threshold: f32) -> Self {
        self.pair_similarity_threshold = threshold;
        self
    }

    /// Set the uniqueness threshold.
    #[must_use]
    pub fn with_uniqueness_threshold(mut self, threshold: f32) -> Self {
        self.uniqueness_threshold = threshold;
        self
    }

    /// Set the number of pairs reported.
    #[must_use]
    pub fn with_top_n_pairs(mut self, top_n: usize) -> Self {
        self.top_n_pairs = top_n;
        self
    }

    /// Set the number of unique chunks reported per document.
    #[must_use]
    pub fn with_unique_display_limit(mut self, limit: usize) -> Self {
        self.unique_chunk_display_limit = limit;
        self
    }

    /// Set the excerpt length.
    #[must_use]
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Set the embedding model identity.
    #[must_use]
    pub fn with_embedding_model<S: Into<String>>(mut self, model: S) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the embedding dimension.
    #[must_use]
    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = dimension;
        self
    }

    /// Set or clear the embedding deadline, kept at millisecond resolution.
    ///
    /// A deadline under one millisecond stores as 0 and fails validation.
    #[must_use]
    pub fn with_embedding_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.embedding_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The embedding deadline as a [`Duration`].
    #[must_use]
    pub fn embedding_timeout(&self) -> Option<Duration> {
        self.embedding_timeout_ms.map(Duration::from_millis)
    }

    /// Check every field before any work begins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a zero window, a
    /// threshold that is not finite or outside [-1, 1], or an empty model id.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfiguration(
                "window_size must be > 0".to_string(),
            ));
        }
        check_threshold("pair_similarity_threshold", self.pair_similarity_threshold)?;
        check_threshold("uniqueness_threshold", self.uniqueness_threshold)?;
        if self.embedding_model.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "embedding_model must not be empty".to_string(),
            ));
        }
        if self.embedding_timeout_ms == Some(0) {
            return Err(Error::InvalidConfiguration(
                "embedding_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a TOML document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TOML is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded comparison config");
        Ok(config)
    }

    /// Apply `DOCALIGN_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an unparsable value.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = var("WINDOW_SIZE") {
            self.window_size = parse_var("WINDOW_SIZE", &v)?;
        }
        if let Some(v) = var("PAIR_THRESHOLD") {
            self.pair_similarity_threshold = parse_var("PAIR_THRESHOLD", &v)?;
        }
        if let Some(v) = var("UNIQUE_THRESHOLD") {
            self.uniqueness_threshold = parse_var("UNIQUE_THRESHOLD", &v)?;
        }
        if let Some(v) = var("TOP_N") {
            self.top_n_pairs = parse_var("TOP_N", &v)?;
        }
        if let Some(v) = var("MODEL") {
            self.embedding_model = v;
        }
        Ok(self)
    }
}

fn check_threshold(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "{name} must be within [-1, 1], got {value}"
        )))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{ENV_PREFIX}{key}={value:?}: {e}")))
}
