//! Smoothed cap construction for a boundary loop.

use hashbrown::HashMap;
use mesh_types::{Mesh, Point3, Vector3};
use tracing::{debug, warn};

use crate::error::{FillError, FillResult};
use crate::loops::EdgeLoop;

/// Smoothed hole filler.
///
/// Caps one boundary loop with concentric rings of new vertices spaced at
/// roughly the target edge length, relaxes the interior toward a smooth
/// surface, and optionally displaces it along a direction vector to form a
/// bubble or dimple instead of a flat patch.
#[derive(Debug, Clone)]
pub struct SmoothedFill {
    /// Approximate spacing of the new interior vertices.
    pub target_edge_length: f64,
    /// Laplacian relaxation passes over the interior (boundary fixed).
    pub smooth_iterations: usize,
    /// Displacement direction; a zero vector disables displacement.
    pub offset_direction: Vector3<f64>,
    /// Displacement distance along `offset_direction`.
    pub offset_distance: f64,
}

impl Default for SmoothedFill {
    fn default() -> Self {
        Self {
            target_edge_length: 0.5,
            smooth_iterations: 3,
            offset_direction: Vector3::zeros(),
            offset_distance: 1.0,
        }
    }
}

impl SmoothedFill {
    /// Set the target edge length.
    #[must_use]
    pub const fn with_target_edge_length(mut self, length: f64) -> Self {
        self.target_edge_length = length;
        self
    }

    /// Set the displacement vector and distance.
    #[must_use]
    pub fn with_displacement(mut self, direction: Vector3<f64>, distance: f64) -> Self {
        self.offset_direction = direction;
        self.offset_distance = distance;
        self
    }

    /// Cap `boundary` and stitch the cap onto `mesh`.
    ///
    /// A loop with fewer than three vertices yields an empty report and no
    /// mesh change. Cap winding follows the loop order, so a loop traced
    /// from the removed faces' winding stitches consistently.
    ///
    /// # Errors
    ///
    /// [`FillError::InvalidLoopVertex`] if the loop names a vertex the
    /// mesh does not have, [`FillError::InvalidEdgeLength`] for a bad
    /// target edge length. The mesh is untouched in both cases.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn fill(&self, mesh: &mut Mesh, boundary: &EdgeLoop) -> FillResult<FillReport> {
        if self.target_edge_length <= 0.0 || !self.target_edge_length.is_finite() {
            return Err(FillError::InvalidEdgeLength(self.target_edge_length));
        }
        if !boundary.is_valid() {
            warn!(
                edges = boundary.edge_count(),
                "degenerate boundary loop, skipping fill"
            );
            return Ok(FillReport::default());
        }
        for &v in &boundary.vertices {
            if v as usize >= mesh.vertices.len() {
                return Err(FillError::InvalidLoopVertex {
                    index: v,
                    vertex_count: mesh.vertices.len(),
                });
            }
        }

        let n = boundary.vertices.len();
        let rim: Vec<Point3<f64>> = boundary
            .vertices
            .iter()
            .map(|&v| mesh.vertices[v as usize])
            .collect();

        let centroid = {
            let sum = rim
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.coords);
            Point3::from(sum / n as f64)
        };
        let mean_radius =
            rim.iter().map(|p| (p - centroid).norm()).sum::<f64>() / n as f64;

        // Radial segment count sets interior vertex spacing; one segment
        // degenerates to a plain fan onto the centroid apex.
        let segments = ((mean_radius / self.target_edge_length).round() as usize).max(1);

        let first_new = mesh.vertices.len() as u32;
        let mut new_vertices: Vec<Point3<f64>> = Vec::new();
        // Fractional depth into the hole per new vertex (1.0 at the apex)
        let mut depth: Vec<f64> = Vec::new();

        // Ring q (q = 1..segments-1) keeps the rim's vertex count; every
        // ring vertex sits on its rim-to-centroid segment, so the patch
        // stays inside any star-shaped hole.
        for q in 1..segments {
            let t = q as f64 / segments as f64;
            for p in &rim {
                new_vertices.push(*p + (centroid - *p) * t);
                depth.push(t);
            }
        }
        let apex_index = first_new + new_vertices.len() as u32;
        new_vertices.push(centroid);
        depth.push(1.0);

        // Triangulate: ring strips, then the apex fan.
        let ring_vertex = |ring: usize, i: usize| -> u32 {
            if ring == 0 {
                boundary.vertices[i % n]
            } else {
                first_new + ((ring - 1) * n + (i % n)) as u32
            }
        };

        let mut new_faces: Vec<[u32; 3]> = Vec::new();
        for ring in 1..segments {
            for i in 0..n {
                let outer_a = ring_vertex(ring - 1, i);
                let outer_b = ring_vertex(ring - 1, i + 1);
                let inner_a = ring_vertex(ring, i);
                let inner_b = ring_vertex(ring, i + 1);
                new_faces.push([outer_a, outer_b, inner_b]);
                new_faces.push([outer_a, inner_b, inner_a]);
            }
        }
        let last_ring = segments - 1;
        for i in 0..n {
            new_faces.push([ring_vertex(last_ring, i), ring_vertex(last_ring, i + 1), apex_index]);
        }

        // Laplacian relaxation of the interior against its cap neighbors;
        // rim vertices are fixed.
        if self.smooth_iterations > 0 && !new_vertices.is_empty() {
            let mut neighbors: HashMap<u32, Vec<u32>> = HashMap::new();
            for face in &new_faces {
                for i in 0..3 {
                    let (a, b) = (face[i], face[(i + 1) % 3]);
                    neighbors.entry(a).or_default().push(b);
                    neighbors.entry(b).or_default().push(a);
                }
            }
            let position = |idx: u32, new_vertices: &[Point3<f64>]| -> Point3<f64> {
                if idx >= first_new {
                    new_vertices[(idx - first_new) as usize]
                } else {
                    mesh.vertices[idx as usize]
                }
            };

            for _ in 0..self.smooth_iterations {
                let mut relaxed = new_vertices.clone();
                for (local, target) in relaxed.iter_mut().enumerate() {
                    let global = first_new + local as u32;
                    let Some(adj) = neighbors.get(&global) else {
                        continue;
                    };
                    let sum = adj
                        .iter()
                        .fold(Vector3::zeros(), |acc, &v| acc + position(v, &new_vertices).coords);
                    *target = Point3::from(sum / adj.len() as f64);
                }
                new_vertices = relaxed;
            }
        }

        // Depth-weighted displacement: zero at the rim, full at the apex.
        let dir_norm = self.offset_direction.norm();
        if dir_norm > f64::EPSILON && self.offset_distance != 0.0 {
            let dir = self.offset_direction / dir_norm;
            for (p, &t) in new_vertices.iter_mut().zip(&depth) {
                *p += dir * (self.offset_distance * t);
            }
        }

        let report = FillReport {
            vertices_added: new_vertices.len(),
            faces_added: new_faces.len(),
        };
        mesh.vertices.extend(new_vertices);
        mesh.faces.extend(new_faces);

        debug!(
            loop_edges = n,
            vertices = report.vertices_added,
            faces = report.faces_added,
            "hole filled"
        );
        Ok(report)
    }
}

/// What a [`SmoothedFill::fill`] call added to the mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillReport {
    /// Interior vertices appended.
    pub vertices_added: usize,
    /// Cap faces appended.
    pub faces_added: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_repair::MeshAdjacency;
    use mesh_types::{unit_cube, Point3};

    /// Cube with its two top faces removed, plus the loop bounding the
    /// hole in removed-face winding order.
    fn open_cube() -> (Mesh, EdgeLoop) {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.remove_faces(&[2, 3]);
        (
            cube,
            EdgeLoop {
                vertices: vec![4, 5, 6, 7],
            },
        )
    }

    #[test]
    fn degenerate_loop_is_noop() {
        let (mut mesh, _) = open_cube();
        let faces_before = mesh.face_count();
        let report = SmoothedFill::default()
            .fill(&mut mesh, &EdgeLoop { vertices: vec![4, 5] })
            .unwrap();
        assert_eq!(report.faces_added, 0);
        assert_eq!(mesh.face_count(), faces_before);
    }

    #[test]
    fn invalid_vertex_rejected() {
        let (mut mesh, _) = open_cube();
        let result = SmoothedFill::default().fill(
            &mut mesh,
            &EdgeLoop {
                vertices: vec![4, 5, 99],
            },
        );
        assert!(matches!(result, Err(FillError::InvalidLoopVertex { .. })));
    }

    #[test]
    fn bad_edge_length_rejected() {
        let (mut mesh, hole) = open_cube();
        let filler = SmoothedFill::default().with_target_edge_length(0.0);
        assert!(matches!(
            filler.fill(&mut mesh, &hole),
            Err(FillError::InvalidEdgeLength(_))
        ));
    }

    #[test]
    fn fill_closes_the_cube() {
        let (mut mesh, hole) = open_cube();
        let report = SmoothedFill::default().fill(&mut mesh, &hole).unwrap();
        assert!(report.faces_added >= 4);

        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert_eq!(adjacency.boundary_edge_count(), 0);
        assert!(adjacency.is_manifold());
    }

    #[test]
    fn flat_fill_keeps_volume() {
        let (mut mesh, hole) = open_cube();
        SmoothedFill::default().fill(&mut mesh, &hole).unwrap();
        // Flat cap restores the original cube volume, and matching winding
        // keeps it positive
        assert!((mesh.signed_volume() - 1.0).abs() < 0.05);
    }

    #[test]
    fn fine_target_adds_interior_rings() {
        let (mut mesh, hole) = open_cube();
        let report = SmoothedFill::default()
            .with_target_edge_length(0.2)
            .fill(&mut mesh, &hole)
            .unwrap();
        // Several rings of four vertices plus the apex
        assert!(report.vertices_added > 5);
        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert_eq!(adjacency.boundary_edge_count(), 0);
    }

    #[test]
    fn displacement_raises_the_cap() {
        let (mut mesh, hole) = open_cube();
        SmoothedFill::default()
            .with_target_edge_length(0.2)
            .with_displacement(Vector3::new(0.0, 0.0, 1.0), 0.5)
            .fill(&mut mesh, &hole)
            .unwrap();

        let top = mesh
            .vertices
            .iter()
            .map(|v| v.z)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((top - 1.5).abs() < 0.05, "apex should rise by the offset");
        // Bubble cap adds volume
        assert!(mesh.signed_volume() > 1.0);
    }

    #[test]
    fn rim_vertices_never_move() {
        let (mut mesh, hole) = open_cube();
        let rim_before: Vec<Point3<f64>> = hole
            .vertices
            .iter()
            .map(|&v| mesh.vertices[v as usize])
            .collect();
        SmoothedFill::default()
            .with_displacement(Vector3::new(0.0, 0.0, 1.0), 2.0)
            .fill(&mut mesh, &hole)
            .unwrap();
        for (&v, before) in hole.vertices.iter().zip(&rim_before) {
            assert_eq!(mesh.vertices[v as usize], *before);
        }
    }
}
