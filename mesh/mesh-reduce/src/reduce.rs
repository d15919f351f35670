//! Edge-collapse reduction.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use mesh_types::{Mesh, Point3};
use tracing::{debug, info};

use crate::quadric::Quadric;

/// What the reducer drives toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReduceTarget {
    /// Collapse until at most this many triangles remain.
    TriangleCount(usize),
    /// Collapse until at most this fraction of the original triangles
    /// remain.
    Ratio(f64),
    /// Collapse every edge shorter than this length. The count target for
    /// iso-surfaced meshes, where the goal is removing voxel-scale
    /// triangles rather than hitting a count.
    EdgeLength(f64),
}

/// Parameters for [`reduce_mesh`].
#[derive(Debug, Clone)]
pub struct ReduceParams {
    /// Stopping criterion.
    pub target: ReduceTarget,
    /// Never collapse edges touching a mesh boundary. Default: `true`.
    pub preserve_boundary: bool,
}

impl ReduceParams {
    /// Reduce to a triangle count.
    #[must_use]
    pub const fn target_triangles(count: usize) -> Self {
        Self {
            target: ReduceTarget::TriangleCount(count),
            preserve_boundary: true,
        }
    }

    /// Reduce to a fraction of the original triangle count.
    #[must_use]
    pub fn target_ratio(ratio: f64) -> Self {
        Self {
            target: ReduceTarget::Ratio(ratio.clamp(0.0, 1.0)),
            preserve_boundary: true,
        }
    }

    /// Collapse all edges shorter than `length`.
    #[must_use]
    pub const fn max_edge_length(length: f64) -> Self {
        Self {
            target: ReduceTarget::EdgeLength(length),
            preserve_boundary: true,
        }
    }

    /// Set boundary preservation.
    #[must_use]
    pub const fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }
}

/// Result of a reduction run.
#[derive(Debug, Clone)]
pub struct ReduceOutcome {
    /// The reduced mesh.
    pub mesh: Mesh,
    /// Triangles before reduction.
    pub original_triangles: usize,
    /// Triangles after reduction.
    pub final_triangles: usize,
    /// Edge collapses performed.
    pub collapses_performed: usize,
    /// Collapses rejected by the manifold or boundary guards.
    pub collapses_rejected: usize,
}

impl ReduceOutcome {
    /// `final / original`, 1.0 for an empty input.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }
}

impl std::fmt::Display for ReduceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reduce: {} -> {} triangles ({:.1}% kept, {} collapses, {} rejected)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_ratio() * 100.0,
            self.collapses_performed,
            self.collapses_rejected,
        )
    }
}

/// A candidate collapse in the priority queue.
#[derive(Debug, Clone)]
struct Collapse {
    v1: u32,
    v2: u32,
    cost: f64,
    optimal: [f64; 3],
}

impl PartialEq for Collapse {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for Collapse {}
impl PartialOrd for Collapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Collapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the heap pops the cheapest collapse first
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

/// Simplify a mesh by iterative edge collapse.
///
/// Collapses are ordered by quadric error; the merged vertex lands at the
/// quadric-optimal point (edge midpoint when the system is singular).
/// Collapses that would pinch the surface into a non-manifold fan are
/// rejected, so the target is not always reached exactly. Triangle count
/// never increases.
#[must_use]
#[allow(clippy::too_many_lines, clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn reduce_mesh(mesh: &Mesh, params: &ReduceParams) -> ReduceOutcome {
    let original_triangles = mesh.faces.len();
    if original_triangles == 0 {
        return ReduceOutcome {
            mesh: mesh.clone(),
            original_triangles: 0,
            final_triangles: 0,
            collapses_performed: 0,
            collapses_rejected: 0,
        };
    }

    let (count_target, length_limit) = match params.target {
        ReduceTarget::TriangleCount(n) => (n, None),
        ReduceTarget::Ratio(r) => ((original_triangles as f64 * r).ceil() as usize, None),
        ReduceTarget::EdgeLength(l) => (0, Some(l)),
    };

    if length_limit.is_none() && original_triangles <= count_target {
        return ReduceOutcome {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            collapses_rejected: 0,
        };
    }

    info!(
        triangles = original_triangles,
        target = ?params.target,
        "starting reduction"
    );

    let mut vertices: Vec<Option<Point3<f64>>> =
        mesh.vertices.iter().copied().map(Some).collect();
    let mut faces: Vec<Option<[u32; 3]>> = mesh.faces.iter().copied().map(Some).collect();
    let mut active_faces = original_triangles;

    let mut quadrics = vertex_quadrics(mesh);
    let boundary_vertices = find_boundary_vertices(&mesh.faces);

    let mut heap: BinaryHeap<Collapse> = BinaryHeap::new();
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    for face in &mesh.faces {
        for i in 0..3 {
            let (v1, v2) = (face[i], face[(i + 1) % 3]);
            let key = ordered(v1, v2);
            if !seen.insert(key) {
                continue;
            }
            if let Some(c) = candidate(
                v1,
                v2,
                &vertices,
                &quadrics,
                &boundary_vertices,
                params,
                length_limit,
            ) {
                heap.push(c);
            }
        }
    }

    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut performed = 0usize;
    let mut rejected = 0usize;

    while active_faces > count_target {
        let Some(collapse) = heap.pop() else {
            break;
        };

        let v1 = resolve(collapse.v1, &remap);
        let v2 = resolve(collapse.v2, &remap);
        if v1 == v2 || vertices[v1 as usize].is_none() || vertices[v2 as usize].is_none() {
            continue;
        }

        // Positions move as collapses happen; re-check the length gate
        // against the live geometry.
        if let Some(limit) = length_limit {
            let (Some(p1), Some(p2)) = (vertices[v1 as usize], vertices[v2 as usize]) else {
                continue;
            };
            if (p1 - p2).norm() >= limit {
                continue;
            }
        }

        if params.preserve_boundary
            && (boundary_vertices.contains(&v1) || boundary_vertices.contains(&v2))
        {
            rejected += 1;
            continue;
        }

        if !collapse_keeps_manifold(&vertices, &faces, v1, v2) {
            rejected += 1;
            continue;
        }

        // Merge v2 into v1 at the optimal position.
        vertices[v1 as usize] =
            Some(Point3::new(collapse.optimal[0], collapse.optimal[1], collapse.optimal[2]));
        let q2 = quadrics[v2 as usize];
        quadrics[v1 as usize].add(&q2);
        vertices[v2 as usize] = None;
        remap.insert(v2, v1);

        for slot in &mut faces {
            let Some(face) = slot else { continue };
            let mut touched = false;
            for idx in face.iter_mut() {
                let actual = resolve(*idx, &remap);
                if *idx != actual {
                    *idx = actual;
                    touched = true;
                }
            }
            if touched && (face[0] == face[1] || face[1] == face[2] || face[0] == face[2]) {
                *slot = None;
                active_faces -= 1;
            }
        }

        performed += 1;

        // Fresh candidates around the merged vertex
        let mut neighbors: HashSet<u32> = HashSet::new();
        for face in faces.iter().flatten() {
            if face.contains(&v1) {
                for &vi in face {
                    if vi != v1 && vertices[vi as usize].is_some() {
                        neighbors.insert(vi);
                    }
                }
            }
        }
        for &v2 in &neighbors {
            if let Some(c) = candidate(
                v1,
                v2,
                &vertices,
                &quadrics,
                &boundary_vertices,
                params,
                length_limit,
            ) {
                heap.push(c);
            }
        }
    }

    let reduced = compact(&vertices, &faces);
    let outcome = ReduceOutcome {
        mesh: reduced,
        original_triangles,
        final_triangles: active_faces,
        collapses_performed: performed,
        collapses_rejected: rejected,
    };
    debug!(%outcome, "reduction finished");
    outcome
}

#[inline]
const fn ordered(v1: u32, v2: u32) -> (u32, u32) {
    if v1 < v2 {
        (v1, v2)
    } else {
        (v2, v1)
    }
}

fn resolve(mut v: u32, remap: &HashMap<u32, u32>) -> u32 {
    while let Some(&next) = remap.get(&v) {
        v = next;
    }
    v
}

/// Build a collapse candidate for the live edge `(v1, v2)`, or `None` when
/// a gate (boundary, length limit, dead vertex) excludes it.
fn candidate(
    v1: u32,
    v2: u32,
    vertices: &[Option<Point3<f64>>],
    quadrics: &[Quadric],
    boundary_vertices: &HashSet<u32>,
    params: &ReduceParams,
    length_limit: Option<f64>,
) -> Option<Collapse> {
    let p1 = vertices[v1 as usize]?;
    let p2 = vertices[v2 as usize]?;

    if let Some(limit) = length_limit {
        if (p1 - p2).norm() >= limit {
            return None;
        }
    }
    if params.preserve_boundary
        && (boundary_vertices.contains(&v1) || boundary_vertices.contains(&v2))
    {
        return None;
    }

    let mut combined = quadrics[v1 as usize];
    combined.add(&quadrics[v2 as usize]);

    let midpoint = [
        (p1.x + p2.x) * 0.5,
        (p1.y + p2.y) * 0.5,
        (p1.z + p2.z) * 0.5,
    ];
    let optimal = combined.optimal_point().unwrap_or(midpoint);
    let cost = combined.evaluate(optimal[0], optimal[1], optimal[2]);

    Some(Collapse {
        v1,
        v2,
        cost,
        optimal,
    })
}

/// Accumulate each face's plane quadric onto the face's vertices.
fn vertex_quadrics(mesh: &Mesh) -> Vec<Quadric> {
    let mut quadrics = vec![Quadric::default(); mesh.vertices.len()];
    for face in &mesh.faces {
        let v0 = mesh.vertices[face[0] as usize];
        let v1 = mesh.vertices[face[1] as usize];
        let v2 = mesh.vertices[face[2] as usize];
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        if len < 1e-12 {
            continue;
        }
        let n = n / len;
        let d = -n.dot(&v0.coords);
        let q = Quadric::from_plane(n.x, n.y, n.z, d);
        for &vi in face {
            quadrics[vi as usize].add(&q);
        }
    }
    quadrics
}

fn find_boundary_vertices(faces: &[[u32; 3]]) -> HashSet<u32> {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();
    for face in faces {
        for i in 0..3 {
            *edge_counts
                .entry(ordered(face[i], face[(i + 1) % 3]))
                .or_insert(0) += 1;
        }
    }
    let mut boundary = HashSet::new();
    for (&(a, b), &count) in &edge_counts {
        if count == 1 {
            boundary.insert(a);
            boundary.insert(b);
        }
    }
    boundary
}

/// Collapsing is safe only when the edge's endpoints share at most the two
/// opposite vertices of its incident triangles; more shared neighbors mean
/// the collapse would pinch the surface.
fn collapse_keeps_manifold(
    vertices: &[Option<Point3<f64>>],
    faces: &[Option<[u32; 3]>],
    v1: u32,
    v2: u32,
) -> bool {
    let mut n1: HashSet<u32> = HashSet::new();
    let mut n2: HashSet<u32> = HashSet::new();
    for face in faces.iter().flatten() {
        let has1 = face.contains(&v1);
        let has2 = face.contains(&v2);
        for &vi in face {
            if vi == v1 || vi == v2 || vertices[vi as usize].is_none() {
                continue;
            }
            if has1 {
                n1.insert(vi);
            }
            if has2 {
                n2.insert(vi);
            }
        }
    }
    n1.intersection(&n2).count() <= 2
}

#[allow(clippy::cast_possible_truncation)]
fn compact(vertices: &[Option<Point3<f64>>], faces: &[Option<[u32; 3]>]) -> Mesh {
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut out = Mesh::new();
    for (old, v) in vertices.iter().enumerate() {
        if let Some(p) = v {
            remap.insert(old as u32, out.vertices.len() as u32);
            out.vertices.push(*p);
        }
    }
    for face in faces.iter().flatten() {
        if let (Some(&a), Some(&b), Some(&c)) = (
            remap.get(&face[0]),
            remap.get(&face[1]),
            remap.get(&face[2]),
        ) {
            out.faces.push([a, b, c]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    /// A flat square tessellated into an n x n grid of quads (2n² faces).
    fn grid_plane(n: usize, spacing: f64) -> Mesh {
        let mut mesh = Mesh::new();
        for j in 0..=n {
            for i in 0..=n {
                #[allow(clippy::cast_precision_loss)]
                mesh.vertices
                    .push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }
        let stride = (n + 1) as u32;
        for j in 0..n as u32 {
            for i in 0..n as u32 {
                let a = i + j * stride;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                mesh.faces.push([a, b, d]);
                mesh.faces.push([a, d, c]);
            }
        }
        mesh
    }

    #[test]
    fn empty_mesh_passthrough() {
        let outcome = reduce_mesh(&Mesh::new(), &ReduceParams::target_ratio(0.5));
        assert_eq!(outcome.final_triangles, 0);
        assert_eq!(outcome.collapses_performed, 0);
    }

    #[test]
    fn already_below_target() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let outcome = reduce_mesh(&cube, &ReduceParams::target_triangles(100));
        assert_eq!(outcome.final_triangles, 12);
        assert_eq!(outcome.collapses_performed, 0);
    }

    #[test]
    fn count_never_increases() {
        let plane = grid_plane(6, 0.25);
        let before = plane.face_count();
        let outcome = reduce_mesh(&plane, &ReduceParams::target_ratio(0.4));
        assert!(outcome.final_triangles <= before);
        assert_eq!(outcome.mesh.face_count(), outcome.final_triangles);
    }

    #[test]
    fn edge_length_mode_coarsens_interior() {
        let plane = grid_plane(8, 0.25);
        let before = plane.face_count();
        let outcome =
            reduce_mesh(&plane, &ReduceParams::max_edge_length(0.6));
        assert!(outcome.final_triangles < before);
        assert!(outcome.collapses_performed > 0);
    }

    #[test]
    fn boundary_preserved_by_default() {
        let plane = grid_plane(4, 0.25);
        let before = plane.bounds();
        let outcome = reduce_mesh(&plane, &ReduceParams::max_edge_length(10.0));
        let after = outcome.mesh.bounds();
        // The outer rim may not move
        assert!((before.min.x - after.min.x).abs() < 1e-9);
        assert!((before.max.y - after.max.y).abs() < 1e-9);
    }

    #[test]
    fn closed_mesh_stays_closed() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let outcome = reduce_mesh(&cube, &ReduceParams::target_ratio(0.5));
        // Whatever was collapsed, every edge still borders exactly two
        // faces
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for face in &outcome.mesh.faces {
            for i in 0..3 {
                *counts
                    .entry(ordered(face[i], face[(i + 1) % 3]))
                    .or_insert(0) += 1;
            }
        }
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn outcome_display() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let outcome = reduce_mesh(&cube, &ReduceParams::target_triangles(100));
        let text = format!("{outcome}");
        assert!(text.contains("12"));
    }
}
