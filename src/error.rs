//! Error types for the minedown library.
//!
//! A single fatal error enum covers the whole pipeline: a conversion either
//! completes or fails as a unit (the cleaning stages are pure text transforms
//! that cannot half-fail, so there is no partial-success error shape).
//!
//! Background workers never propagate these across the event channel as
//! values; a failure is flattened into one terminal
//! [`crate::progress::ConversionEvent::Error`] carrying the rendered message,
//! preserving the single-writer/no-throw-across-boundary contract. The
//! [`MinedownError::Worker`] variant re-wraps such a message on the consumer
//! side.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the minedown library.
#[derive(Debug, Error)]
pub enum MinedownError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Every extraction backend failed or none applied to the input.
    #[error(
        "No text could be extracted from '{path}'.\n{attempts}\n\
         Install poppler-utils (pdftotext) or inject a custom extractor."
    )]
    ExtractionFailed { path: PathBuf, attempts: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write the Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Selection errors ──────────────────────────────────────────────────
    /// An approved-phrase index or similar caller selection was invalid.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Worker errors ─────────────────────────────────────────────────────
    /// A background conversion worker reported a terminal error.
    #[error("{0}")]
    Worker(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failed_lists_attempts() {
        let e = MinedownError::ExtractionFailed {
            path: PathBuf::from("doc.pdf"),
            attempts: "  • pdftotext: not found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("doc.pdf"), "got: {msg}");
        assert!(msg.contains("pdftotext: not found"), "got: {msg}");
        assert!(msg.contains("poppler-utils"), "got: {msg}");
    }

    #[test]
    fn output_write_failed_display() {
        let e = MinedownError::OutputWriteFailed {
            path: PathBuf::from("/out/doc.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/out/doc.md"));
    }

    #[test]
    fn invalid_selection_display() {
        let e = MinedownError::InvalidSelection("candidate index 9 out of range (1-4)".into());
        assert!(e.to_string().contains("index 9"));
    }

    #[test]
    fn worker_error_is_transparent() {
        let e = MinedownError::Worker("extraction exploded".into());
        assert_eq!(e.to_string(), "extraction exploded");
    }
}
