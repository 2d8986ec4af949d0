//! Error types for the preflight library

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: the document could not be opened at all
///
/// Anything short of this is absorbed into the report's warnings
/// (see [`SignalIssue`]).
#[derive(Error, Debug)]
pub enum Error {
    /// PDF could not be parsed
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Report could not be serialized
    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

/// A recoverable failure of one analysis sub-step
///
/// The affected signal degrades to `Unknown` (or an empty list) and the issue
/// is recorded as a warning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalIssue {
    /// A category of the object model could not be read
    #[error("{signal} unavailable: {reason}")]
    Unavailable { signal: String, reason: String },

    /// XMP or ICC text could not be parsed; treated as absent
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// The sub-step exceeded its time budget
    #[error("{signal} timed out after {} ms", .limit.as_millis())]
    TimedOut { signal: String, limit: Duration },
}

impl SignalIssue {
    /// Shorthand for [`SignalIssue::Unavailable`]
    pub fn unavailable(signal: impl Into<String>, reason: impl ToString) -> Self {
        SignalIssue::Unavailable {
            signal: signal.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_message_reports_millis() {
        let issue = SignalIssue::TimedOut {
            signal: "image 12 samples".to_string(),
            limit: Duration::from_millis(250),
        };
        assert_eq!(issue.to_string(), "image 12 samples timed out after 250 ms");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = Error::FileNotFound(PathBuf::from("missing.pdf"));
        assert_eq!(err.to_string(), "File not found: missing.pdf");
    }
}
