//! Literal line diff.
//!
//! The cheapest lens: what changed, line by line, and how much of the raw
//! character stream the two documents share.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, DiffOp, TextDiff};

/// Lines of context around each hunk of the unified diff.
const CONTEXT_LINES: usize = 3;

/// Character diffs of long documents fall back to an approximate answer after this.
const CHAR_DIFF_TIMEOUT: Duration = Duration::from_secs(5);

/// A run of characters present in both documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingBlock {
    /// Character offset in document A.
    pub a_index: usize,
    /// Character offset in document B.
    pub b_index: usize,
    /// Run length in characters.
    pub len: usize,
}

/// Line-level differences between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDiff {
    /// `2·M / T` over characters, where M is the matched character count
    /// and T the total length of both documents.
    pub similarity_ratio: f32,
    /// Unified diff, one entry per line without trailing newlines.
    pub diff_lines: Vec<String>,
    /// Character runs common to both documents, in order.
    pub matching_blocks: Vec<MatchingBlock>,
    /// Lines present only in B.
    pub added_lines: usize,
    /// Lines present only in A.
    pub removed_lines: usize,
}

/// Diff two documents line by line.
///
/// ```rust
/// use docalign::basic_comparison;
///
/// let diff = basic_comparison("alpha\nbeta\n", "alpha\ngamma\n");
/// assert_eq!(diff.added_lines, 1);
/// assert_eq!(diff.removed_lines, 1);
/// assert!(diff.diff_lines.iter().any(|l| l == "+gamma"));
/// ```
#[must_use]
pub fn basic_comparison(text_a: &str, text_b: &str) -> LineDiff {
    let lines = TextDiff::from_lines(text_a, text_b);

    let mut added_lines = 0;
    let mut removed_lines = 0;
    for change in lines.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added_lines += 1,
            ChangeTag::Delete => removed_lines += 1,
            ChangeTag::Equal => {}
        }
    }

    let diff_lines = lines
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header("a", "b")
        .to_string()
        .lines()
        .map(str::to_string)
        .collect();

    let chars = TextDiff::configure()
        .timeout(CHAR_DIFF_TIMEOUT)
        .diff_chars(text_a, text_b);
    let matching_blocks = chars
        .ops()
        .iter()
        .filter_map(|op| match *op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => Some(MatchingBlock {
                a_index: old_index,
                b_index: new_index,
                len,
            }),
            _ => None,
        })
        .collect();

    LineDiff {
        similarity_ratio: chars.ratio(),
        diff_lines,
        matching_blocks,
        added_lines,
        removed_lines,
    }
}
