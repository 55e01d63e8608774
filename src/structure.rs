//! Document structure: titles, numbered sections, list items.
//!
//! Text extraction is someone else's job. Given the plain text of each page,
//! this module recognizes layout cues line by line and compares the
//! resulting outlines of two documents.
//!
//! ## Recognized Lines
//!
//! | Kind | Examples |
//! |------|----------|
//! | Title | `INTRODUCTION`, `CHAPTER IV`, `CAPÍTULO 2`, `SECCIÓN III` |
//! | Section | `1. Scope`, `2.3 Terms`, `4.1.2 Notice`, `a) first`, `(3) third` |
//! | List item | `• item`, `- item`, `* item`, `→ item`, `✓ item` |
//! | Contents | any line containing `....` or `----` |
//!
//! A line can fall into several kinds; `1. SCOPE` is only a section because
//! titles must be letters and whitespace only.
//!
//! ## Similarity
//!
//! ```text
//! titles    sequence ratio        weight 0.3
//! sections  sequence ratio        weight 0.5
//! lists     1 - |density_a - density_b|   weight 0.2
//! ```
//!
//! Only components present in both documents count, and the result is the
//! weighted mean of those that do.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, get_diff_ratio, Algorithm};

const TITLE_WEIGHT: f32 = 0.3;
const SECTION_WEIGHT: f32 = 0.5;
const LIST_WEIGHT: f32 = 0.2;

/// One recognized line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureItem {
    /// The trimmed line.
    pub text: String,
    /// Zero-based page number.
    pub page: usize,
    /// Zero-based line number within the page.
    pub line: usize,
    /// Nesting depth for numbered sections (count of `.`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
}

/// The outline of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Upper-case headings and chapter/section titles.
    pub titles: Vec<StructureItem>,
    /// Numbered sections.
    pub sections: Vec<StructureItem>,
    /// Bulleted list items.
    pub lists: Vec<StructureItem>,
    /// Table-of-contents lines.
    pub toc: Vec<StructureItem>,
}

struct Patterns {
    titles: Vec<Regex>,
    sections: Vec<Regex>,
    lists: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |sources: &[&str]| -> Vec<Regex> {
            sources
                .iter()
                .map(|p| Regex::new(p).expect("structure patterns are valid"))
                .collect()
        };
        Patterns {
            titles: compile(&[
                r"^[A-Z\s]+$",
                r"^CAPÍTULO\s+[IVX\d]+",
                r"^SECCIÓN\s+[IVX\d]+",
                r"^CHAPTER\s+[IVX\d]+",
            ]),
            sections: compile(&[
                r"^\d+\.\s+",
                r"^\d+\.\d+\s+",
                r"^\d+\.\d+\.\d+\s+",
                r"^[a-zA-Z]\)\s+",
                r"^\(\d+\)\s+",
            ]),
            lists: compile(&[r"^[•\-\*→✓]\s+"]),
        }
    })
}

impl DocumentStructure {
    /// Scan the text of each page in order.
    ///
    /// ```rust
    /// use docalign::DocumentStructure;
    ///
    /// let s = DocumentStructure::from_pages(&["INTRODUCTION\n1. Scope\n- first point"]);
    /// assert_eq!(s.titles.len(), 1);
    /// assert_eq!(s.sections[0].level, Some(1));
    /// assert_eq!(s.lists[0].text, "- first point");
    /// ```
    #[must_use]
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let mut structure = Self::default();
        for (page, text) in pages.iter().enumerate() {
            structure.scan_page(text.as_ref(), page);
        }
        structure
    }

    /// Scan a whole document whose pages are separated by form feeds.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let pages: Vec<&str> = text.split('\u{c}').collect();
        Self::from_pages(&pages)
    }

    fn scan_page(&mut self, text: &str, page: usize) {
        let patterns = patterns();
        for (line, raw) in text.split('\n').enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let item = |level| StructureItem {
                text: trimmed.to_string(),
                page,
                line,
                level,
            };

            if patterns.titles.iter().any(|re| re.is_match(trimmed)) {
                self.titles.push(item(None));
            }
            if patterns.sections.iter().any(|re| re.is_match(trimmed)) {
                self.sections.push(item(Some(trimmed.matches('.').count())));
            }
            if patterns.lists.iter().any(|re| re.is_match(trimmed)) {
                self.lists.push(item(None));
            }
            if trimmed.contains("....") || trimmed.contains("----") {
                self.toc.push(item(None));
            }
        }
    }

    /// Whether nothing was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
            && self.sections.is_empty()
            && self.lists.is_empty()
            && self.toc.is_empty()
    }

    fn list_density(&self) -> f32 {
        self.lists.len() as f32 / (self.titles.len() + self.sections.len()).max(1) as f32
    }
}

/// Weighted similarity of two document outlines in [0, 1].
///
/// Returns 0 when no component is present in both documents.
#[must_use]
pub fn structural_similarity(a: &DocumentStructure, b: &DocumentStructure) -> f32 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    if !a.titles.is_empty() && !b.titles.is_empty() {
        score += sequence_similarity(&a.titles, &b.titles) * TITLE_WEIGHT;
        total_weight += TITLE_WEIGHT;
    }

    if !a.sections.is_empty() && !b.sections.is_empty() {
        score += sequence_similarity(&a.sections, &b.sections) * SECTION_WEIGHT;
        total_weight += SECTION_WEIGHT;
    }

    if !a.lists.is_empty() && !b.lists.is_empty() {
        let list_similarity = 1.0 - (a.list_density() - b.list_density()).abs();
        score += list_similarity * LIST_WEIGHT;
        total_weight += LIST_WEIGHT;
    }

    if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    }
}

/// `2·M / T` over item texts.
fn sequence_similarity(a: &[StructureItem], b: &[StructureItem]) -> f32 {
    let a: Vec<&str> = a.iter().map(|i| i.text.as_str()).collect();
    let b: Vec<&str> = b.iter().map(|i| i.text.as_str()).collect();
    let ops = capture_diff_slices(Algorithm::Myers, &a, &b);
    get_diff_ratio(&ops, a.len(), b.len())
}
