//! Boundary loops of a face selection.

use hashbrown::{HashMap, HashSet};
use mesh_types::Mesh;
use tracing::{debug, warn};

/// An ordered, cyclic sequence of vertex indices bounding a hole.
///
/// The order follows the winding of the selected faces the loop was traced
/// from, so a cap built in the same order stitches consistently onto the
/// surviving mesh.
#[derive(Debug, Clone)]
pub struct EdgeLoop {
    /// Loop vertices in cyclic order; the edge from the last back to the
    /// first closes the loop.
    pub vertices: Vec<u32>,
}

impl EdgeLoop {
    /// Number of edges (equals the number of vertices).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// A loop needs at least three edges to bound any area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }
}

/// Compute the boundary loops of a face selection.
///
/// A directed edge of a selected face is a boundary edge when no other
/// selected face traverses it in reverse. Boundary edges are chained
/// tip-to-tail into closed loops; a selection with unselected islands
/// inside it yields one loop per island in addition to the outer loop.
///
/// Out-of-range or duplicate selection indices are ignored with a warning.
/// Open chains (possible on non-manifold input) are dropped, not returned.
#[must_use]
pub fn selection_boundary_loops(mesh: &Mesh, selection: &[usize]) -> Vec<EdgeLoop> {
    let mut selected: HashSet<usize> = HashSet::with_capacity(selection.len());
    for &idx in selection {
        if idx < mesh.faces.len() {
            selected.insert(idx);
        } else {
            warn!(face = idx, "selection index out of range, ignoring");
        }
    }
    if selected.is_empty() {
        return Vec::new();
    }

    // Directed edges of the selected region
    let mut directed: HashSet<(u32, u32)> = HashSet::new();
    for &face_idx in &selected {
        let face = mesh.faces[face_idx];
        for i in 0..3 {
            directed.insert((face[i], face[(i + 1) % 3]));
        }
    }

    // Boundary = directed edges whose reverse is not in the region
    let mut successors: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut boundary_count = 0usize;
    for &(a, b) in &directed {
        if !directed.contains(&(b, a)) {
            successors.entry(a).or_default().push(b);
            boundary_count += 1;
        }
    }
    debug!(edges = boundary_count, "selection boundary edges");

    // Chain boundary edges tip-to-tail into closed loops
    let mut loops = Vec::new();
    let starts: Vec<u32> = successors.keys().copied().collect();
    for start in starts {
        loop {
            let Some(first) = successors.get_mut(&start).and_then(Vec::pop) else {
                break;
            };
            let mut loop_vertices = vec![start, first];
            let mut current = first;
            let closed = loop {
                if current == start {
                    loop_vertices.pop(); // drop the repeated start
                    break true;
                }
                match successors.get_mut(&current).and_then(Vec::pop) {
                    Some(next) => {
                        loop_vertices.push(next);
                        current = next;
                    }
                    None => break false,
                }
            };

            if closed && loop_vertices.len() >= 3 {
                loops.push(EdgeLoop {
                    vertices: loop_vertices,
                });
            } else if !closed {
                warn!(
                    start,
                    length = loop_vertices.len(),
                    "open boundary chain dropped"
                );
            }
        }
    }

    debug!(loops = loops.len(), "boundary loops traced");
    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, Point3};

    /// Flat strip of 4 triangles sharing a fan around vertex 0.
    fn quad_patch() -> Mesh {
        // 2x2 grid of quads would be overkill; two quads split into 4 tris
        Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
            ],
            vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]],
        )
    }

    #[test]
    fn empty_selection_no_loops() {
        let mesh = quad_patch();
        assert!(selection_boundary_loops(&mesh, &[]).is_empty());
    }

    #[test]
    fn out_of_range_ignored() {
        let mesh = quad_patch();
        assert!(selection_boundary_loops(&mesh, &[99]).is_empty());
    }

    #[test]
    fn single_face_loop() {
        let mesh = quad_patch();
        let loops = selection_boundary_loops(&mesh, &[0]);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].edge_count(), 3);
    }

    #[test]
    fn two_adjacent_faces_share_no_interior_edge() {
        let mesh = quad_patch();
        let loops = selection_boundary_loops(&mesh, &[0, 1]);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].edge_count(), 4);
    }

    #[test]
    fn loop_follows_selected_winding() {
        let mesh = unit_cube(Point3::origin(), 1.0);
        // Top faces [4, 5, 6] and [4, 6, 7]
        let loops = selection_boundary_loops(&mesh, &[2, 3]);
        assert_eq!(loops.len(), 1);
        let lv = &loops[0].vertices;
        assert_eq!(lv.len(), 4);

        // The cycle must be 4 -> 5 -> 6 -> 7 (in some rotation)
        let start = lv.iter().position(|&v| v == 4).unwrap();
        let rotated: Vec<u32> = (0..4).map(|i| lv[(start + i) % 4]).collect();
        assert_eq!(rotated, vec![4, 5, 6, 7]);
    }

    #[test]
    fn island_yields_second_loop() {
        // A 3x3 grid of quads with the middle quad unselected leaves an
        // outer rim loop plus an island loop around the hole.
        let n = 3usize;
        let mut mesh = Mesh::new();
        for j in 0..=n {
            for i in 0..=n {
                #[allow(clippy::cast_precision_loss)]
                mesh.vertices
                    .push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let stride = (n + 1) as u32;
        let mut quad_of_face = Vec::new();
        for j in 0..n as u32 {
            for i in 0..n as u32 {
                let a = i + j * stride;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                mesh.faces.push([a, b, d]);
                mesh.faces.push([a, d, c]);
                quad_of_face.push((i, j));
                quad_of_face.push((i, j));
            }
        }

        let selection: Vec<usize> = (0..mesh.faces.len())
            .filter(|&f| quad_of_face[f] != (1, 1))
            .collect();
        let loops = selection_boundary_loops(&mesh, &selection);
        assert_eq!(loops.len(), 2);
        let mut sizes: Vec<usize> = loops.iter().map(EdgeLoop::edge_count).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 12]);
    }

    #[test]
    fn loop_validity() {
        assert!(EdgeLoop {
            vertices: vec![0, 1, 2]
        }
        .is_valid());
        assert!(!EdgeLoop {
            vertices: vec![0, 1]
        }
        .is_valid());
    }
}
