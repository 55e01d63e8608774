//! Word-window chunking with quarter overlap.
//!
//! Documents are split into windows of whole words. Adjacent windows share a
//! quarter of their width so that a passage straddling a boundary still
//! appears intact in at least one chunk.
//!
//! ## How It Works
//!
//! ```text
//! window_size = 8, overlap = 8 / 4 = 2, stride = 6
//!
//! Words:    0 1 2 3 4 5 6 7 8 9 10 11 12 13
//!
//! Window 0: 0 1 2 3 4 5 6 7
//! Window 1:             6 7 8 9 10 11 12 13
//! Window 2:                         12 13      <- final window may be shorter
//! ```
//!
//! Every window is joined with single spaces. A window whose text is not
//! longer than the minimum character floor (default 50) is dropped rather
//! than padded; in practice only a short trailing window is ever dropped.
//!
//! ## Why Words, Not Bytes?
//!
//! Embedding models tokenize on word pieces. A window of N words maps to a
//! predictable token budget, and never splits a word in half.
//!
//! ## Stride
//!
//! `overlap = window_size / 4` (integer division), so for every
//! `window_size >= 1` the stride `window_size - overlap` is at least 1.
//! A zero window is rejected up front with
//! [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration).

use crate::chunk::{Chunk, Side};
use crate::{Chunker, Error, Result};

/// Default chunk width in words.
pub const DEFAULT_WINDOW_SIZE: usize = 512;

/// Default minimum chunk length in characters (exclusive).
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;

/// Word-window chunker.
///
/// ## Example
///
/// ```rust
/// use docalign::{Chunker, Side, WordWindowChunker};
///
/// let chunker = WordWindowChunker::new(8).unwrap().with_min_chars(0);
/// let text = "one two three four five six seven eight nine ten";
/// let chunks = chunker.chunk(text, Side::A);
///
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].words(), 0..8);
/// assert_eq!(chunks[1].words(), 6..10); // stride = 8 - 8/4
/// ```
#[derive(Debug, Clone)]
pub struct WordWindowChunker {
    window_size: usize,
    min_chars: usize,
}

impl WordWindowChunker {
    /// Create a chunker with `window_size` words per chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `window_size == 0`.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidConfiguration(
                "window_size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            window_size,
            min_chars: DEFAULT_MIN_CHUNK_CHARS,
        })
    }

    /// Set the character floor; chunks of `min_chars` characters or fewer are dropped.
    #[must_use]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Words per window.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Words shared by adjacent windows.
    #[must_use]
    pub fn overlap(&self) -> usize {
        self.window_size / 4
    }

    /// The step between window starts.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.window_size - self.overlap()
    }
}

impl Default for WordWindowChunker {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_chars: DEFAULT_MIN_CHUNK_CHARS,
        }
    }
}

impl Chunker for WordWindowChunker {
    fn chunk(&self, text: &str, side: Side) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return vec![];
        }

        let stride = self.stride();
        let mut chunks = Vec::with_capacity(self.estimate_chunks(words.len()));

        for start in (0..words.len()).step_by(stride) {
            let end = (start + self.window_size).min(words.len());
            let joined = words[start..end].join(" ");

            if joined.chars().count() > self.min_chars {
                let index = chunks.len();
                chunks.push(Chunk::new(joined, index, side, start, end));
            }
        }

        chunks
    }

    fn estimate_chunks(&self, word_count: usize) -> usize {
        word_count.div_ceil(self.stride())
    }
}
