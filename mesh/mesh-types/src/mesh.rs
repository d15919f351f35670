//! Indexed triangle mesh.

use crate::{Aabb, Triangle};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Vertices and faces are stored separately, with faces referencing
/// vertices by index. This is the structure every stage of the pipeline
/// consumes and produces: loaders build it, repair and hole filling mutate
/// it in place, surface extraction emits a fresh one.
///
/// # Winding Order
///
/// Faces use counter-clockwise (CCW) winding when viewed from outside, so
/// normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use mesh_types::{Mesh, Point3};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
/// mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
/// mesh.vertices.push(Point3::new(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles).
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no renderable geometry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Get a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face index is out of bounds.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        self.faces.get(face_index).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize],
            v1: self.vertices[i1 as usize],
            v2: self.vertices[i2 as usize],
        })
    }

    /// Iterate over all triangles with resolved vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize],
            v1: self.vertices[i1 as usize],
            v2: self.vertices[i2 as usize],
        })
    }

    /// Compute the axis-aligned bounding box.
    ///
    /// Returns an empty box for a mesh with no vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    /// Append another mesh, shifting its face indices past this mesh's
    /// vertices.
    ///
    /// Multi-mesh input files are collapsed into one mesh this way before
    /// the pipeline runs.
    #[allow(clippy::cast_possible_truncation)]
    // Indices are u32; meshes beyond 4B vertices are unsupported by design
    pub fn append(&mut self, other: &Self) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Remove the faces named by `selection` (indices into `faces`).
    ///
    /// Out-of-range and repeated indices are ignored. Vertices are left in
    /// place; callers that care run unreferenced-vertex removal afterwards.
    pub fn remove_faces(&mut self, selection: &[usize]) {
        if selection.is_empty() {
            return;
        }
        let mut doomed = vec![false; self.faces.len()];
        for &idx in selection {
            if let Some(flag) = doomed.get_mut(idx) {
                *flag = true;
            }
        }
        let mut keep = doomed.iter().map(|d| !d);
        self.faces.retain(|_| keep.next().unwrap_or(true));
    }

    /// Reverse the winding of a single face.
    #[inline]
    pub fn flip_face(&mut self, face_index: usize) {
        if let Some(face) = self.faces.get_mut(face_index) {
            face.swap(1, 2);
        }
    }

    /// Reverse the winding of every face.
    pub fn flip_all_faces(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }

    /// Translate every vertex by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Compute the signed volume of the mesh via the divergence theorem.
    ///
    /// Positive for a closed mesh with outward-facing normals, negative for
    /// an inside-out mesh, near zero (and meaningless) for open meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for &[i0, i1, i2] in &self.faces {
            let v0 = self.vertices[i0 as usize].coords;
            let v1 = self.vertices[i1 as usize].coords;
            let v2 = self.vertices[i2 as usize].coords;
            volume += v0.dot(&v1.cross(&v2));
        }
        volume / 6.0
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }
}

/// An axis-aligned unit cube from `min` spanning `size` on every axis.
///
/// CCW winding viewed from outside. Handy test fixture for the SDF and
/// boolean stages.
#[must_use]
pub fn unit_cube(min: Point3<f64>, size: f64) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 12);
    let s = size;
    for &(dx, dy, dz) in &[
        (0.0, 0.0, 0.0),
        (s, 0.0, 0.0),
        (s, s, 0.0),
        (0.0, s, 0.0),
        (0.0, 0.0, s),
        (s, 0.0, s),
        (s, s, s),
        (0.0, s, s),
    ] {
        mesh.vertices
            .push(Point3::new(min.x + dx, min.y + dy, min.z + dz));
    }

    // Two triangles per cube face
    mesh.faces.push([0, 2, 1]); // bottom, -Z
    mesh.faces.push([0, 3, 2]);
    mesh.faces.push([4, 5, 6]); // top, +Z
    mesh.faces.push([4, 6, 7]);
    mesh.faces.push([0, 1, 5]); // front, -Y
    mesh.faces.push([0, 5, 4]);
    mesh.faces.push([3, 7, 6]); // back, +Y
    mesh.faces.push([3, 6, 2]);
    mesh.faces.push([0, 4, 7]); // left, -X
    mesh.faces.push([0, 7, 3]);
    mesh.faces.push([1, 2, 6]); // right, +X
    mesh.faces.push([1, 6, 5]);

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mesh() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_empty());
    }

    #[test]
    fn vertices_without_faces_is_empty() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Point3::origin());
        assert!(mesh.is_empty());
    }

    #[test]
    fn cube_volume_and_area() {
        let cube = unit_cube(Point3::origin(), 1.0);
        assert!((cube.signed_volume() - 1.0).abs() < 1e-10);
        assert!((cube.surface_area() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn flipped_cube_has_negative_volume() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.flip_all_faces();
        assert!(cube.signed_volume() < 0.0);
    }

    #[test]
    fn cube_bounds() {
        let cube = unit_cube(Point3::new(-0.5, -0.5, -0.5), 1.0);
        let b = cube.bounds();
        assert!((b.min.x - (-0.5)).abs() < f64::EPSILON);
        assert!((b.max.z - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn append_shifts_indices() {
        let mut a = unit_cube(Point3::origin(), 1.0);
        let b = unit_cube(Point3::new(2.0, 0.0, 0.0), 1.0);
        a.append(&b);
        assert_eq!(a.vertex_count(), 16);
        assert_eq!(a.face_count(), 24);
        assert_eq!(a.faces[12], [8, 10, 9]);
    }

    #[test]
    fn remove_faces_ignores_bad_indices() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.remove_faces(&[0, 1, 1, 99]);
        assert_eq!(cube.face_count(), 10);
    }

    #[test]
    fn remove_faces_empty_selection() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.remove_faces(&[]);
        assert_eq!(cube.face_count(), 12);
    }

    #[test]
    fn translate_moves_bounds() {
        let mut cube = unit_cube(Point3::origin(), 1.0);
        cube.translate(Vector3::new(1.0, 2.0, 3.0));
        let b = cube.bounds();
        assert!((b.min.x - 1.0).abs() < 1e-12);
        assert!((b.min.y - 2.0).abs() < 1e-12);
        assert!((b.min.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn triangle_resolution() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let tri = cube.triangle(0);
        assert!(tri.is_some());
        assert!(cube.triangle(12).is_none());
        assert_eq!(cube.triangles().count(), 12);
    }
}
