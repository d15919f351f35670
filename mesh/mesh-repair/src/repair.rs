//! The repair pipeline: make a mesh safe for volumetric sampling.

use hashbrown::{HashMap, HashSet};
use mesh_types::{Mesh, Point3};
use tracing::{debug, warn};

use crate::adjacency::MeshAdjacency;

/// Configuration for [`repair_mesh`].
///
/// Thresholds are in mesh units.
///
/// # Example
///
/// ```
/// use mesh_repair::RepairParams;
///
/// let params = RepairParams::default().with_weld_epsilon(0.01);
/// ```
#[derive(Debug, Clone)]
pub struct RepairParams {
    /// Distance below which vertices are merged into one.
    /// Default: `1e-6`.
    pub weld_epsilon: f64,

    /// Triangles with area below this are removed.
    /// Default: `1e-9`.
    pub degenerate_area_threshold: f64,

    /// Detach the extra faces of edges shared by more than two triangles.
    /// Default: `true`.
    pub split_non_manifold: bool,

    /// Drop vertices no face references after the other steps.
    /// Default: `true`.
    pub remove_unreferenced: bool,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-6,
            degenerate_area_threshold: 1e-9,
            split_non_manifold: true,
            remove_unreferenced: true,
        }
    }
}

impl RepairParams {
    /// Set the vertex welding distance.
    #[must_use]
    pub const fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the degenerate-triangle area threshold.
    #[must_use]
    pub const fn with_degenerate_area_threshold(mut self, threshold: f64) -> Self {
        self.degenerate_area_threshold = threshold;
        self
    }

    /// Enable or disable non-manifold edge splitting.
    #[must_use]
    pub const fn with_split_non_manifold(mut self, split: bool) -> Self {
        self.split_non_manifold = split;
        self
    }
}

/// Remove triangles with area below `area_threshold`.
///
/// Returns the number of triangles removed.
pub fn remove_degenerate_triangles(mesh: &mut Mesh, area_threshold: f64) -> usize {
    let original = mesh.faces.len();
    let vertices = std::mem::take(&mut mesh.vertices);

    mesh.faces.retain(|face| {
        let v0 = vertices[face[0] as usize];
        let v1 = vertices[face[1] as usize];
        let v2 = vertices[face[2] as usize];
        let area = (v1 - v0).cross(&(v2 - v0)).norm() * 0.5;
        area >= area_threshold
    });

    mesh.vertices = vertices;
    original - mesh.faces.len()
}

/// Merge vertices closer than `epsilon` using a spatial hash.
///
/// Faces collapsed to a line or point by the merge are removed. Returns the
/// number of vertices merged away.
#[allow(clippy::cast_possible_truncation)]
// Vertex indices are u32 by the mesh invariant
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f64) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;
    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, pos) in mesh.vertices.iter().enumerate() {
        buckets
            .entry(hash_cell(pos, cell_size))
            .or_default()
            .push(idx as u32);
    }

    // First pass: pick the lowest-index representative within epsilon.
    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut merged = 0usize;

    for (idx, pos) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if remap[idx as usize] != idx {
            continue;
        }
        let cell = hash_cell(pos, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = buckets.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                    else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other as usize] != other {
                            continue;
                        }
                        if (pos - mesh.vertices[other as usize]).norm() < epsilon {
                            remap[other as usize] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    // Collapse remap chains.
    for i in 0..remap.len() {
        let mut target = remap[i];
        while remap[target as usize] != target {
            target = remap[target as usize];
        }
        remap[i] = target;
    }

    for face in &mut mesh.faces {
        for idx in face.iter_mut() {
            *idx = remap[*idx as usize];
        }
    }
    mesh.faces
        .retain(|&[a, b, c]| a != b && b != c && a != c);

    merged
}

#[inline]
fn hash_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Remove faces that repeat an existing face's vertex set, in any rotation
/// or winding.
///
/// Returns the number of duplicates removed.
pub fn remove_duplicate_faces(mesh: &mut Mesh) -> usize {
    let original = mesh.faces.len();
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(original);

    mesh.faces.retain(|face| {
        let fwd = rotate_min_first(*face);
        let rev = rotate_min_first([face[0], face[2], face[1]]);
        if seen.contains(&fwd) || seen.contains(&rev) {
            false
        } else {
            seen.insert(fwd);
            true
        }
    });

    original - mesh.faces.len()
}

/// Rotate a face so its smallest vertex index comes first.
fn rotate_min_first(face: [u32; 3]) -> [u32; 3] {
    let start = if face[0] <= face[1] && face[0] <= face[2] {
        0
    } else if face[1] <= face[2] {
        1
    } else {
        2
    };
    [face[start], face[(start + 1) % 3], face[(start + 2) % 3]]
}

/// Detach the extra faces of non-manifold edges.
///
/// For an edge bordered by more than two faces, the first two keep the
/// shared vertices; every further face gets its own duplicated copies of
/// the edge's endpoints, separating the surplus sheets. The duplicates are
/// geometrically coincident, so downstream distance sampling is unaffected.
///
/// Returns the number of edges split.
#[allow(clippy::cast_possible_truncation)]
pub fn split_non_manifold_edges(mesh: &mut Mesh) -> usize {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let mut split = 0usize;

    // (face, old vertex) pairs to remap onto fresh duplicates
    let mut rewrites: Vec<(u32, u32)> = Vec::new();
    for (edge, faces) in adjacency.edges() {
        if faces.len() <= 2 {
            continue;
        }
        split += 1;
        for &face_idx in &faces[2..] {
            rewrites.push((face_idx, edge.0));
            rewrites.push((face_idx, edge.1));
        }
    }

    if split == 0 {
        return 0;
    }
    warn!(edges = split, "splitting non-manifold edges");

    for (face_idx, old_vertex) in rewrites {
        let duplicate = mesh.vertices.len() as u32;
        mesh.vertices.push(mesh.vertices[old_vertex as usize]);
        let face = &mut mesh.faces[face_idx as usize];
        for idx in face.iter_mut() {
            if *idx == old_vertex {
                *idx = duplicate;
            }
        }
    }

    split
}

/// Drop vertices no face references and compact the vertex array.
///
/// Returns the number of vertices removed.
#[allow(clippy::cast_possible_truncation)]
pub fn remove_unreferenced_vertices(mesh: &mut Mesh) -> usize {
    let original = mesh.vertices.len();

    let mut referenced = vec![false; original];
    for face in &mesh.faces {
        for &idx in face {
            referenced[idx as usize] = true;
        }
    }
    if referenced.iter().all(|&r| r) {
        return 0;
    }

    let mut remap = vec![u32::MAX; original];
    let mut compacted = Vec::with_capacity(original);
    for (old_idx, &used) in referenced.iter().enumerate() {
        if used {
            remap[old_idx] = compacted.len() as u32;
            compacted.push(mesh.vertices[old_idx]);
        }
    }

    for face in &mut mesh.faces {
        for idx in face.iter_mut() {
            *idx = remap[*idx as usize];
        }
    }

    let removed = original - compacted.len();
    mesh.vertices = compacted;
    removed
}

/// Run the full repair pipeline.
///
/// Order: degenerate removal → welding → duplicate faces → non-manifold
/// splitting → unreferenced vertices. Re-applying to an already repaired
/// mesh is a no-op.
#[must_use]
pub fn repair_mesh(mesh: &mut Mesh, params: &RepairParams) -> RepairSummary {
    let initial_vertices = mesh.vertices.len();
    let initial_faces = mesh.faces.len();

    let degenerates_removed =
        remove_degenerate_triangles(mesh, params.degenerate_area_threshold);
    let vertices_welded = weld_vertices(mesh, params.weld_epsilon);
    let duplicates_removed = remove_duplicate_faces(mesh);
    let edges_split = if params.split_non_manifold {
        split_non_manifold_edges(mesh)
    } else {
        0
    };
    let unreferenced_removed = if params.remove_unreferenced {
        remove_unreferenced_vertices(mesh)
    } else {
        0
    };

    let summary = RepairSummary {
        initial_vertices,
        initial_faces,
        final_vertices: mesh.vertices.len(),
        final_faces: mesh.faces.len(),
        vertices_welded,
        degenerates_removed,
        duplicates_removed,
        edges_split,
        unreferenced_removed,
    };
    debug!(%summary, "repair pass complete");
    summary
}

/// Per-step counts from a [`repair_mesh`] run.
#[derive(Debug, Clone, Default)]
pub struct RepairSummary {
    /// Vertices before repair.
    pub initial_vertices: usize,
    /// Faces before repair.
    pub initial_faces: usize,
    /// Vertices after repair.
    pub final_vertices: usize,
    /// Faces after repair.
    pub final_faces: usize,
    /// Vertices merged by welding.
    pub vertices_welded: usize,
    /// Degenerate triangles removed.
    pub degenerates_removed: usize,
    /// Duplicate faces removed.
    pub duplicates_removed: usize,
    /// Non-manifold edges split.
    pub edges_split: usize,
    /// Unreferenced vertices removed.
    pub unreferenced_removed: usize,
}

impl RepairSummary {
    /// Check if any repairs were performed.
    #[must_use]
    pub const fn had_changes(&self) -> bool {
        self.vertices_welded > 0
            || self.degenerates_removed > 0
            || self.duplicates_removed > 0
            || self.edges_split > 0
            || self.unreferenced_removed > 0
    }
}

impl std::fmt::Display for RepairSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "repair: {} verts ({} welded, {} unreferenced), {} faces ({} degenerate, {} duplicate), {} edges split",
            self.final_vertices,
            self.vertices_welded,
            self.unreferenced_removed,
            self.final_faces,
            self.degenerates_removed,
            self.duplicates_removed,
            self.edges_split,
        )
    }
}
