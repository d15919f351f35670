//! Winding consistency per connected component.
//!
//! Signed-distance sign and hole-fill stitching both require that adjacent
//! triangles traverse their shared edge in opposite directions. This module
//! propagates a single winding across each connected component and turns
//! closed components outward.

use hashbrown::HashSet;
use mesh_types::Mesh;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::adjacency::{ordered_edge, MeshAdjacency};

/// Counts from an [`orient_components`] run.
#[derive(Debug, Clone, Default)]
pub struct OrientationSummary {
    /// Connected components visited.
    pub components: usize,
    /// Faces whose winding was reversed.
    pub faces_flipped: usize,
    /// Closed components flipped whole because they faced inward.
    pub components_inverted: usize,
}

/// Assign a consistent winding to every connected component.
///
/// BFS from an arbitrary seed face per component; a neighbor that traverses
/// the shared edge in the same direction as its parent is flipped. After
/// propagation, a closed component with negative signed volume is flipped
/// whole so its normals face outward. Components are independent — no
/// winding relationship is established *between* them.
///
/// Runs before hole filling (loops inherit face winding) and again after
/// (cap triangles need orientation consistent with their loop).
pub fn orient_components(mesh: &mut Mesh) -> OrientationSummary {
    if mesh.faces.is_empty() {
        return OrientationSummary::default();
    }

    let adjacency = MeshAdjacency::build(&mesh.faces);
    let face_count = mesh.faces.len();

    let mut visited = vec![false; face_count];
    let mut flip: Vec<bool> = vec![false; face_count];
    let mut summary = OrientationSummary::default();

    for seed in 0..face_count {
        if visited[seed] {
            continue;
        }
        summary.components += 1;

        let mut component: Vec<u32> = Vec::new();
        let mut queue: VecDeque<u32> = VecDeque::new();
        #[allow(clippy::cast_possible_truncation)]
        queue.push_back(seed as u32);
        visited[seed] = true;

        while let Some(face_idx) = queue.pop_front() {
            component.push(face_idx);
            let face = mesh.faces[face_idx as usize];

            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                for &neighbor in adjacency.faces_for_edge(a, b) {
                    if neighbor == face_idx || visited[neighbor as usize] {
                        continue;
                    }
                    visited[neighbor as usize] = true;

                    // The parent traverses the edge a -> b (in stored order).
                    // A consistent neighbor traverses b -> a; same direction
                    // means one of the two is wound backwards.
                    let same_direction = edge_direction(
                        &mesh.faces[neighbor as usize],
                        a,
                        b,
                    )
                    .unwrap_or(false);

                    flip[neighbor as usize] = if flip[face_idx as usize] {
                        !same_direction
                    } else {
                        same_direction
                    };

                    queue.push_back(neighbor);
                }
            }
        }

        // Apply the propagated flips for this component before measuring
        // its volume.
        for &face_idx in &component {
            if flip[face_idx as usize] {
                mesh.faces[face_idx as usize].swap(1, 2);
                summary.faces_flipped += 1;
            }
        }

        if component_is_closed(&adjacency, mesh, &component)
            && component_signed_volume(mesh, &component) < 0.0
        {
            for &face_idx in &component {
                mesh.faces[face_idx as usize].swap(1, 2);
            }
            summary.components_inverted += 1;
        }
    }

    if summary.faces_flipped > 0 || summary.components_inverted > 0 {
        info!(
            components = summary.components,
            flipped = summary.faces_flipped,
            inverted = summary.components_inverted,
            "orientation fixed"
        );
    } else {
        debug!(components = summary.components, "orientation already consistent");
    }

    summary
}

/// Does `face` traverse the edge in the direction `a -> b`?
///
/// `Some(true)` for same direction, `Some(false)` for opposite, `None` if
/// the face does not contain the edge.
fn edge_direction(face: &[u32; 3], a: u32, b: u32) -> Option<bool> {
    for i in 0..3 {
        let (v0, v1) = (face[i], face[(i + 1) % 3]);
        if v0 == a && v1 == b {
            return Some(true);
        }
        if v0 == b && v1 == a {
            return Some(false);
        }
    }
    None
}

/// All edges of the component's faces border exactly two faces.
fn component_is_closed(adjacency: &MeshAdjacency, mesh: &Mesh, component: &[u32]) -> bool {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    for &face_idx in component {
        let face = mesh.faces[face_idx as usize];
        for i in 0..3 {
            let edge = ordered_edge(face[i], face[(i + 1) % 3]);
            if seen.insert(edge) && adjacency.faces_for_edge(edge.0, edge.1).len() != 2 {
                return false;
            }
        }
    }
    true
}

fn component_signed_volume(mesh: &Mesh, component: &[u32]) -> f64 {
    let mut volume = 0.0;
    for &face_idx in component {
        let [i0, i1, i2] = mesh.faces[face_idx as usize];
        let v0 = mesh.vertices[i0 as usize].coords;
        let v1 = mesh.vertices[i1 as usize].coords;
        let v2 = mesh.vertices[i2 as usize].coords;
        volume += v0.dot(&v1.cross(&v2));
    }
    volume / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, Point3};

    /// Every adjacent face pair must traverse its shared edge in opposite
    /// directions.
    fn assert_consistent(mesh: &Mesh) {
        let adjacency = MeshAdjacency::build(&mesh.faces);
        for face in &mesh.faces {
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                for &neighbor in adjacency.faces_for_edge(a, b) {
                    let other = &mesh.faces[neighbor as usize];
                    if other == face {
                        continue;
                    }
                    if let Some(dir) = edge_direction(other, a, b) {
                        assert!(!dir, "adjacent faces agree on edge direction");
                    }
                }
            }
        }
    }

    #[test]
    fn consistent_cube_untouched() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        let summary = orient_components(&mut cube);
        assert_eq!(summary.components, 1);
        assert_eq!(summary.faces_flipped + summary.components_inverted, 0);
        assert_consistent(&cube);
    }

    #[test]
    fn fixes_single_flipped_face() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.faces[4].swap(1, 2);

        orient_components(&mut cube);
        assert_consistent(&cube);
        assert!(cube.signed_volume() > 0.0);
    }

    #[test]
    fn inverts_inside_out_component() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.flip_all_faces();

        let summary = orient_components(&mut cube);
        assert_eq!(summary.components_inverted, 1);
        assert!(cube.signed_volume() > 0.0);
        assert_consistent(&cube);
    }

    #[test]
    fn disjoint_components_fixed_independently() {
        let mut mesh = unit_cube(Point3::origin(), 1.0);
        let mut second = unit_cube(Point3::new(5.0, 0.0, 0.0), 1.0);
        second.faces[7].swap(1, 2);
        mesh.append(&second);

        let summary = orient_components(&mut mesh);
        assert_eq!(summary.components, 2);
        assert_consistent(&mesh);
    }

    #[test]
    fn open_sheet_gets_consistent_winding() {
        // Two triangles sharing edge (0, 1), second wound backwards
        let mut mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, -1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        orient_components(&mut mesh);
        assert_consistent(&mesh);
    }

    #[test]
    fn empty_mesh_is_noop() {
        let mut mesh = Mesh::new();
        let summary = orient_components(&mut mesh);
        assert_eq!(summary.components, 0);
    }
}
