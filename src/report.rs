//! Running several analyses over one document pair.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::compare::{CancelToken, Comparator, ComparisonResult};
use crate::diff::{basic_comparison, LineDiff};
use crate::lexical::{LexicalAnalyzer, LexicalComparison};
use crate::structure::{structural_similarity, DocumentStructure};
use crate::{Error, Result};

/// One lens through which two documents can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analysis {
    /// Line diff and character ratio.
    Basic,
    /// TF-IDF vocabulary comparison.
    Lexical,
    /// Embedding-based chunk alignment.
    Semantic,
    /// Outline comparison.
    Structural,
}

impl Analysis {
    /// Every analysis, in report order.
    pub const ALL: [Self; 4] = [Self::Basic, Self::Lexical, Self::Semantic, Self::Structural];
}

impl FromStr for Analysis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "lexical" | "tfidf" => Ok(Self::Lexical),
            "semantic" => Ok(Self::Semantic),
            "structural" | "structure" => Ok(Self::Structural),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown analysis '{other}'"
            ))),
        }
    }
}

/// Read a plain-text document from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] naming `path` if the file cannot be read as UTF-8.
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Results of every requested analysis; skipped analyses are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Line diff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<LineDiff>,
    /// TF-IDF comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical: Option<LexicalComparison>,
    /// Semantic chunk alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<ComparisonResult>,
    /// Structural similarity in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural: Option<f32>,
    /// Wall-clock time of the whole report.
    pub elapsed_ms: u64,
}

/// Runs a chosen set of analyses over document pairs.
///
/// ```rust
/// use docalign::{Analysis, Analyzer};
///
/// let analyzer = Analyzer::new(None, [Analysis::Basic, Analysis::Structural]).unwrap();
/// let report = analyzer.run("1. Scope\n", "1. Scope\n2. Fees\n").unwrap();
/// assert_eq!(report.basic.unwrap().added_lines, 1);
/// assert!(report.semantic.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    comparator: Option<Comparator>,
    lexical: LexicalAnalyzer,
    analyses: BTreeSet<Analysis>,
}

impl Analyzer {
    /// Create an analyzer for `analyses`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if semantic analysis is
    /// requested without a comparator.
    pub fn new(
        comparator: Option<Comparator>,
        analyses: impl IntoIterator<Item = Analysis>,
    ) -> Result<Self> {
        let analyses: BTreeSet<Analysis> = analyses.into_iter().collect();
        if analyses.contains(&Analysis::Semantic) && comparator.is_none() {
            return Err(Error::InvalidConfiguration(
                "semantic analysis requires an embedding provider".to_string(),
            ));
        }
        Ok(Self {
            comparator,
            lexical: LexicalAnalyzer::default(),
            analyses,
        })
    }

    /// Replace the TF-IDF settings.
    #[must_use]
    pub fn with_lexical(mut self, lexical: LexicalAnalyzer) -> Self {
        self.lexical = lexical;
        self
    }

    /// Run every requested analysis.
    ///
    /// # Errors
    ///
    /// Propagates semantic comparison errors; the other analyses cannot fail.
    pub fn run(&self, text_a: &str, text_b: &str) -> Result<DocumentReport> {
        self.run_with_cancel(text_a, text_b, &CancelToken::new())
    }

    /// Run every requested analysis, honoring `cancel` in the semantic stage.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`Error::Cancelled`].
    pub fn run_with_cancel(
        &self,
        text_a: &str,
        text_b: &str,
        cancel: &CancelToken,
    ) -> Result<DocumentReport> {
        let started = Instant::now();
        let wants = |a: Analysis| self.analyses.contains(&a);

        let basic = wants(Analysis::Basic).then(|| basic_comparison(text_a, text_b));
        let lexical = wants(Analysis::Lexical).then(|| self.lexical.compare(text_a, text_b));

        let semantic = match (&self.comparator, wants(Analysis::Semantic)) {
            (Some(comparator), true) => {
                Some(comparator.compare_with_cancel(text_a, text_b, cancel)?)
            }
            _ => None,
        };

        let structural = wants(Analysis::Structural).then(|| {
            structural_similarity(
                &DocumentStructure::from_text(text_a),
                &DocumentStructure::from_text(text_b),
            )
        });

        Ok(DocumentReport {
            basic,
            lexical,
            semantic,
            structural,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
