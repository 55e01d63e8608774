//! The Chunk type: a window of a document's words, ready to embed.

use serde::{Deserialize, Serialize};

/// Which side of a pairwise comparison a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The first document.
    A,
    /// The second document.
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// A window of words from one document.
///
/// ## Word Offsets
///
/// `word_start` and `word_end` index into the document's whitespace-split
/// word sequence, not into bytes. Adjacent chunks overlap:
///
/// ```text
/// window = 8, overlap = 2, stride = 6
///
/// Words:   w0 w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 w11 w12
/// Chunk 0: [0..8)
/// Chunk 1:                   [6..13)
///                            ^^^^^ overlap region [6..8)
/// ```
///
/// `index` is the emission order among the chunks that survived the
/// length filter, so it stays dense even when a trailing window is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The window's words joined with single spaces.
    pub text: String,
    /// Zero-based position in this document's chunk sequence.
    pub index: usize,
    /// Document this chunk belongs to.
    pub side: Side,
    /// First word of the window.
    pub word_start: usize,
    /// One past the last word of the window.
    pub word_end: usize,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        index: usize,
        side: Side,
        word_start: usize,
        word_end: usize,
    ) -> Self {
        Self {
            text: text.into(),
            index,
            side,
            word_start,
            word_end,
        }
    }

    /// Number of words in the window.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.word_end - self.word_start
    }

    /// The word span of this chunk in the original document.
    #[must_use]
    pub fn words(&self) -> std::ops::Range<usize> {
        self.word_start..self.word_end
    }

    /// The first `max_chars` characters, with `...` appended when cut.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt(&self.text, max_chars)
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ side: {}, index: {}, words: {}..{}, len: {} }}",
            self.side,
            self.index,
            self.word_start,
            self.word_end,
            self.text.len()
        )
    }
}

/// Truncate to `max_chars` characters, marking the cut with `...`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
