//! Error types for mesh repair operations.

use thiserror::Error;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh repair.
///
/// Repair itself is infallible; these cover precondition failures of the
/// surrounding pipeline (e.g. handing an empty mesh to a stage that needs
/// geometry).
#[derive(Debug, Error)]
pub enum RepairError {
    /// Mesh has no vertices or faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex {
        /// The out-of-range index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },
}
