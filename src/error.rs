//! Error types for docalign.

use std::path::PathBuf;
use std::time::Duration;

use crate::chunk::Side;

/// Errors that can occur while comparing documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of range.
    ///
    /// Raised before any chunking work begins.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A document produced zero usable chunks.
    #[error("document {side} produced no chunks longer than the minimum length")]
    EmptyDocument {
        /// Which document came up empty.
        side: Side,
    },

    /// The embedding provider failed or returned malformed output.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The embedding provider did not answer within the deadline.
    #[error("embedding provider timed out after {0:?}")]
    EmbeddingTimeout(Duration),

    /// The comparison was cancelled at a stage boundary.
    #[error("comparison cancelled before {stage}")]
    Cancelled {
        /// The stage that was about to run.
        stage: &'static str,
    },

    /// A configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// An input document could not be read.
    #[error("failed to read document {}: {source}", path.display())]
    Io {
        /// The document that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The report could not be written.
    #[error("failed to write report: {0}")]
    Output(String),
}

impl Error {
    /// Whether the caller, rather than the system, caused this error.
    ///
    /// An HTTP boundary would answer these with a 4xx status.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::EmptyDocument { .. } | Self::Config(_)
        )
    }
}

/// Result type for docalign operations.
pub type Result<T> = std::result::Result<T, Error>;
