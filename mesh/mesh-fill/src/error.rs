//! Error types for hole filling.

use thiserror::Error;

/// Result type for fill operations.
pub type FillResult<T> = Result<T, FillError>;

/// Errors that can occur while filling a hole.
#[derive(Debug, Error)]
pub enum FillError {
    /// A loop references a vertex outside the mesh.
    #[error("loop references vertex {index} but the mesh has {vertex_count} vertices")]
    InvalidLoopVertex {
        /// The out-of-range index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The target edge length is zero, negative, or not finite.
    #[error("invalid target edge length: {0}")]
    InvalidEdgeLength(f64),
}
