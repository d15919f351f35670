//! Error types for iso-surface extraction.

use thiserror::Error;

/// Result type for iso-surface operations.
pub type IsoResult<T> = Result<T, IsoError>;

/// Errors that can occur during surface extraction.
#[derive(Debug, Error)]
pub enum IsoError {
    /// Cube size is zero, negative, or not finite.
    #[error("invalid cube size: {0}")]
    InvalidCubeSize(f64),

    /// The extraction domain is empty.
    #[error("extraction bounds are empty")]
    EmptyBounds,

    /// The sampling lattice would be absurdly large.
    #[error("lattice of {points} points exceeds the {limit}-point limit; increase the cube size")]
    LatticeTooLarge {
        /// Points the request would allocate.
        points: usize,
        /// Hard cap.
        limit: usize,
    },
}
