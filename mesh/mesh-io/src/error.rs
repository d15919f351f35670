//! Error types for mesh I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during mesh I/O.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Unrecognized file extension.
    #[error("unknown file format: .{extension}")]
    UnknownFormat {
        /// The unrecognized extension.
        extension: String,
    },

    /// Parse error.
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// What was invalid.
        message: String,
    },

    /// Binary STL truncated mid-triangle.
    #[error("truncated STL: expected {expected} triangles, got {got}")]
    TruncatedStl {
        /// Declared triangle count.
        expected: u32,
        /// Triangles actually present.
        got: u32,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Selection file was not a JSON array of non-negative integers.
    #[error("invalid selection file: {message}")]
    InvalidSelection {
        /// What was invalid.
        message: String,
    },
}

impl IoError {
    /// Create an `InvalidContent` error.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}
