//! Error types for the PDF watermark library

use std::path::PathBuf;
use thiserror::Error;

use crate::layout::Point;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF watermark library
#[derive(Error, Debug)]
pub enum Error {
    /// Color string is not `#rrggbb`
    #[error("Invalid color format: {0:?} (expected 6 hex digits, e.g. #FF0000)")]
    InvalidColorFormat(String),

    /// A watermark spec failed validation
    #[error("Invalid watermark: {0}")]
    InvalidWatermarkSpec(String),

    /// Source document could not be read
    #[error("Failed to read PDF: {0}")]
    DocumentRead(String),

    /// Result document could not be serialized or written
    #[error("Failed to write PDF: {0}")]
    DocumentWrite(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

/// Coarse classification of an [`Error`] for callers that report failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something we refuse to process
    BadInput,
    /// Processing failed on otherwise acceptable input
    Processing,
}

impl Error {
    pub(crate) fn read(reason: impl std::fmt::Display) -> Self {
        Error::DocumentRead(reason.to_string())
    }

    pub(crate) fn write(reason: impl std::fmt::Display) -> Self {
        Error::DocumentWrite(reason.to_string())
    }

    pub(crate) fn invalid_spec(index: usize, reason: impl std::fmt::Display) -> Self {
        Error::InvalidWatermarkSpec(format!("watermark {}: {}", index + 1, reason))
    }

    /// Whether this error was caused by the caller's input
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidColorFormat(_)
            | Error::InvalidWatermarkSpec(_)
            | Error::DocumentRead(_)
            | Error::FileNotFound(_) => ErrorKind::BadInput,
            Error::DocumentWrite(_) => ErrorKind::Processing,
        }
    }
}

/// Non-fatal notice: a position string could not be resolved and the
/// watermark was placed at the page center instead
#[derive(Error, Debug, Clone, PartialEq)]
#[error("watermark {}: position {position:?} not recognized, using page center ({}, {})", .index + 1, .point.x, .point.y)]
pub struct PositionFallbackUsed {
    /// Index of the spec in the watermark list
    pub index: usize,
    /// The position string as supplied
    pub position: String,
    /// Where the watermark was placed
    pub point: Point,
}
