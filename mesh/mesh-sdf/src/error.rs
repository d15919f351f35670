//! Error types for SDF construction.

use thiserror::Error;

/// Result type for SDF operations.
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors that can occur while building a signed distance grid.
///
/// All variants are input errors detected before any sampling starts.
#[derive(Debug, Error)]
pub enum SdfError {
    /// Mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// Cell size is zero, negative, or not finite.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// The requested grid would be absurdly large.
    #[error("grid of {cells} cells exceeds the {limit}-cell limit; increase the cell size")]
    GridTooLarge {
        /// Cells the request would allocate.
        cells: usize,
        /// Hard cap.
        limit: usize,
    },
}
