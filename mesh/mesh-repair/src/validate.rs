//! Mesh validation and health reporting.

use mesh_types::Mesh;

use crate::adjacency::MeshAdjacency;

/// Report of mesh validation results.
#[derive(Debug, Clone, Default)]
pub struct MeshReport {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of faces.
    pub face_count: usize,
    /// Total number of distinct edges.
    pub edge_count: usize,
    /// Edges with only one adjacent face.
    pub boundary_edge_count: usize,
    /// Edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,
    /// Faces with near-zero area.
    pub degenerate_face_count: usize,
    /// Whether the mesh has no boundary edges.
    pub is_watertight: bool,
    /// Whether every edge borders at most two faces.
    pub is_manifold: bool,
}

impl MeshReport {
    /// Check if the mesh is clean enough for reliable signed-distance
    /// sampling.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.is_watertight && self.is_manifold && self.degenerate_face_count == 0
    }

    /// Check if the mesh has any recorded issues.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.boundary_edge_count > 0
            || self.non_manifold_edge_count > 0
            || self.degenerate_face_count > 0
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} verts, {} faces, {} edges ({} boundary, {} non-manifold, {} degenerate)",
            self.vertex_count,
            self.face_count,
            self.edge_count,
            self.boundary_edge_count,
            self.non_manifold_edge_count,
            self.degenerate_face_count,
        )
    }
}

/// Validate a mesh and return a report of any issues.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, Point3};
/// use mesh_repair::validate_mesh;
///
/// let cube = unit_cube(Point3::origin(), 1.0);
/// let report = validate_mesh(&cube);
/// assert!(report.is_watertight);
/// assert!(report.is_manifold);
/// ```
#[must_use]
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let degenerate_face_count = mesh
        .triangles()
        .filter(|t| t.is_degenerate(1e-12))
        .count();

    MeshReport {
        vertex_count: mesh.vertices.len(),
        face_count: mesh.faces.len(),
        edge_count: adjacency.edge_count(),
        boundary_edge_count: adjacency.boundary_edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        degenerate_face_count,
        is_watertight: adjacency.is_watertight(),
        is_manifold: adjacency.is_manifold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, Point3};

    #[test]
    fn cube_is_solid() {
        let report = validate_mesh(&unit_cube(Point3::origin(), 1.0));
        assert!(report.is_solid());
        assert_eq!(report.edge_count, 18);
        assert_eq!(report.boundary_edge_count, 0);
    }

    #[test]
    fn open_triangle_reports_boundary() {
        let mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.boundary_edge_count, 3);
        assert!(!report.is_watertight);
        assert!(report.has_issues());
    }

    #[test]
    fn degenerate_counted() {
        let mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.degenerate_face_count, 1);
    }

    #[test]
    fn report_display() {
        let report = validate_mesh(&unit_cube(Point3::origin(), 1.0));
        let text = format!("{report}");
        assert!(text.contains("8 verts"));
        assert!(text.contains("12 faces"));
    }
}
