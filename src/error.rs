//! Error types for the redaction audit library.
//!
//! The taxonomy separates failures by blast radius: a `DocumentUnreadable`
//! excludes one file from a scan, a `PageUnreadable` degrades one page to
//! empty primitive lists, and a `RenderFailure` skips one output document.
//! None of them abort a batch run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for audit and recovery operations.
pub type UnredactResult<T> = Result<T, UnredactError>;

/// Error type for all scan, recovery, and rendering operations.
#[derive(Debug, Error)]
pub enum UnredactError {
    /// Error reading or writing a file.
    #[error("IO error for path '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The source document could not be opened or parsed at all.
    #[error("unreadable document '{}': {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    /// One page of an otherwise-good document failed to decode.
    #[error("unreadable page {page}: {reason}")]
    PageUnreadable { page: usize, reason: String },

    /// Output composition failed for one file.
    #[error("render failed for '{}': {reason}", path.display())]
    RenderFailure { path: PathBuf, reason: String },

    /// Invalid configuration or parameters.
    #[error("invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },
}

impl UnredactError {
    /// Wraps a backend error at document scope.
    pub fn document(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::DocumentUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Wraps a backend error at page scope.
    pub fn page(page: usize, err: impl std::fmt::Display) -> Self {
        Self::PageUnreadable {
            page,
            reason: err.to_string(),
        }
    }

    /// Wraps a composition error at file scope.
    pub fn render(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::RenderFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_display() {
        let err = UnredactError::page(3, "bad content stream");
        assert_eq!(err.to_string(), "unreadable page 3: bad content stream");

        let err = UnredactError::document(Path::new("a.pdf"), "not a PDF");
        assert_eq!(err.to_string(), "unreadable document 'a.pdf': not a PDF");
    }
}
