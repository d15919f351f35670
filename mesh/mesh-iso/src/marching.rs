//! Marching cubes iso-surface extraction.

use hashbrown::HashMap;
use mesh_types::{Aabb, Mesh, Point3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{IsoError, IsoResult};
use crate::implicit::Implicit;
use crate::tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};

/// Hard cap on lattice allocation.
const MAX_LATTICE_POINTS: usize = 300_000_000;

/// How the crossing point on an active cube edge is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMode {
    /// One linear interpolation of the corner values.
    SingleLerp,
    /// Iterative lerp/bisection refinement, re-evaluating the implicit at
    /// each candidate. Slower, noticeably more accurate on curved fields.
    LerpSteps,
}

/// Marching cubes extractor.
///
/// Samples an [`Implicit`] on a regular lattice over `bounds` and emits a
/// triangle mesh approximating the zero level set. Crossing vertices are
/// shared between adjacent cubes through a lattice-edge map, so a closed
/// field extracts to a watertight mesh.
///
/// Corner classification treats a value of exactly zero as *outside*; both
/// cubes sharing a lattice point read the same sample, so adjacent cubes
/// can never disagree about a tie.
#[derive(Debug, Clone)]
pub struct MarchingCubes {
    /// Extraction domain.
    pub bounds: Aabb,
    /// Edge length of one sampling cube.
    pub cube_size: f64,
    /// Root-finding mode for crossing points.
    pub root_mode: RootMode,
    /// Refinement iterations used by [`RootMode::LerpSteps`].
    pub root_steps: usize,
}

impl MarchingCubes {
    /// Extractor over `bounds` with the given cube size, single-lerp
    /// roots.
    #[must_use]
    pub const fn new(bounds: Aabb, cube_size: f64) -> Self {
        Self {
            bounds,
            cube_size,
            root_mode: RootMode::SingleLerp,
            root_steps: 5,
        }
    }

    /// Switch to iterative root refinement with the given step count.
    #[must_use]
    pub const fn with_root_refinement(mut self, steps: usize) -> Self {
        self.root_mode = RootMode::LerpSteps;
        self.root_steps = steps;
        self
    }

    /// Extract the zero level set of `f` as a triangle mesh.
    ///
    /// The whole corner lattice is evaluated in parallel; cube emission is
    /// a single sequential writer so vertex deduplication stays
    /// deterministic. A field with no zero crossing inside the domain
    /// yields an empty mesh.
    ///
    /// # Errors
    ///
    /// [`IsoError::InvalidCubeSize`], [`IsoError::EmptyBounds`], or
    /// [`IsoError::LatticeTooLarge`] before any sampling happens.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn extract(&self, f: &Implicit<'_>) -> IsoResult<Mesh> {
        if self.cube_size <= 0.0 || !self.cube_size.is_finite() {
            return Err(IsoError::InvalidCubeSize(self.cube_size));
        }
        if self.bounds.is_empty() {
            return Err(IsoError::EmptyBounds);
        }

        let size = self.bounds.size();
        let cube = self.cube_size;
        let ncx = ((size.x / cube).ceil() as usize).max(1);
        let ncy = ((size.y / cube).ceil() as usize).max(1);
        let ncz = ((size.z / cube).ceil() as usize).max(1);
        let (nx, ny, nz) = (ncx + 1, ncy + 1, ncz + 1);

        let points = nx * ny * nz;
        if points > MAX_LATTICE_POINTS {
            return Err(IsoError::LatticeTooLarge {
                points,
                limit: MAX_LATTICE_POINTS,
            });
        }

        let origin = self.bounds.min;
        let position = |i: usize, j: usize, k: usize| {
            Point3::new(
                origin.x + i as f64 * cube,
                origin.y + j as f64 * cube,
                origin.z + k as f64 * cube,
            )
        };

        // Corner lattice, evaluated in parallel. Cubes only read from it.
        let values: Vec<f64> = (0..points)
            .into_par_iter()
            .map(|idx| {
                let i = idx % nx;
                let j = (idx / nx) % ny;
                let k = idx / (nx * ny);
                f.value(position(i, j, k))
            })
            .collect();

        let mut mesh = Mesh::new();
        let mut edge_vertices: HashMap<(usize, usize, usize, u8), u32> = HashMap::new();

        for ck in 0..ncz {
            for cj in 0..ncy {
                for ci in 0..ncx {
                    let mut corner_values = [0.0f64; 8];
                    let mut config = 0usize;
                    for (c, offset) in CORNER_OFFSETS.iter().enumerate() {
                        let (i, j, k) = (ci + offset[0], cj + offset[1], ck + offset[2]);
                        let v = values[i + j * nx + k * nx * ny];
                        corner_values[c] = v;
                        if v < 0.0 {
                            config |= 1 << c;
                        }
                    }

                    let mask = EDGE_TABLE[config];
                    if mask == 0 {
                        continue;
                    }

                    let mut cube_edge_vertex = [0u32; 12];
                    for (edge, corners) in EDGE_CONNECTIONS.iter().enumerate() {
                        if mask & (1 << edge) == 0 {
                            continue;
                        }
                        let a = CORNER_OFFSETS[corners[0]];
                        let b = CORNER_OFFSETS[corners[1]];
                        let la = (ci + a[0], cj + a[1], ck + a[2]);
                        let lb = (ci + b[0], cj + b[1], ck + b[2]);
                        let key = lattice_edge_key(la, lb);

                        let index = *edge_vertices.entry(key).or_insert_with(|| {
                            let p = self.locate_root(
                                f,
                                position(la.0, la.1, la.2),
                                position(lb.0, lb.1, lb.2),
                                corner_values[corners[0]],
                                corner_values[corners[1]],
                            );
                            let idx = mesh.vertices.len() as u32;
                            mesh.vertices.push(p);
                            idx
                        });
                        cube_edge_vertex[edge] = index;
                    }

                    let row = &TRI_TABLE[config];
                    let mut t = 0;
                    while row[t] >= 0 {
                        // Table fans face the interior with our sign
                        // convention; reverse for outward CCW winding.
                        mesh.faces.push([
                            cube_edge_vertex[row[t] as usize],
                            cube_edge_vertex[row[t + 2] as usize],
                            cube_edge_vertex[row[t + 1] as usize],
                        ]);
                        t += 3;
                    }
                }
            }
        }

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "marching cubes extraction complete"
        );
        Ok(mesh)
    }

    /// Locate the zero crossing between two lattice points of opposite
    /// sign.
    fn locate_root(
        &self,
        f: &Implicit<'_>,
        pa: Point3<f64>,
        pb: Point3<f64>,
        va: f64,
        vb: f64,
    ) -> Point3<f64> {
        match self.root_mode {
            RootMode::SingleLerp => lerp(pa, pb, crossing_fraction(va, vb)),
            RootMode::LerpSteps => {
                let (mut a, mut va) = (pa, va);
                let (mut b, mut vb) = (pb, vb);
                for _ in 0..self.root_steps {
                    let mid = lerp(a, b, crossing_fraction(va, vb));
                    let vm = f.value(mid);
                    if (vm < 0.0) == (va < 0.0) {
                        a = mid;
                        va = vm;
                    } else {
                        b = mid;
                        vb = vm;
                    }
                }
                lerp(a, b, crossing_fraction(va, vb))
            }
        }
    }
}

/// Interpolation fraction of the zero crossing, clamped and safe against
/// equal endpoint values.
#[inline]
fn crossing_fraction(va: f64, vb: f64) -> f64 {
    let denom = va - vb;
    if denom.abs() < f64::EPSILON {
        0.5
    } else {
        (va / denom).clamp(0.0, 1.0)
    }
}

#[inline]
fn lerp(a: Point3<f64>, b: Point3<f64>, t: f64) -> Point3<f64> {
    a + (b - a) * t
}

/// Canonical key of a lattice edge: its lower endpoint plus the axis it
/// runs along.
#[inline]
fn lattice_edge_key(
    a: (usize, usize, usize),
    b: (usize, usize, usize),
) -> (usize, usize, usize, u8) {
    let low = (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2));
    let axis = if a.0 != b.0 {
        0
    } else if a.1 != b.1 {
        1
    } else {
        2
    };
    (low.0, low.1, low.2, axis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_repair::MeshAdjacency;
    use mesh_sdf::{build_sdf, SdfBuildParams, SdfGrid};
    use mesh_types::unit_cube;

    fn cube_grid() -> SdfGrid {
        let cube = unit_cube(Point3::origin(), 1.0);
        build_sdf(&cube, &SdfBuildParams::with_cell_size(0.0625)).unwrap()
    }

    #[test]
    fn rejects_bad_cube_size() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);
        let mc = MarchingCubes::new(f.bounds(), 0.0);
        assert!(matches!(mc.extract(&f), Err(IsoError::InvalidCubeSize(_))));
    }

    #[test]
    fn rejects_empty_bounds() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);
        let mc = MarchingCubes::new(Aabb::empty(), 0.1);
        assert!(matches!(mc.extract(&f), Err(IsoError::EmptyBounds)));
    }

    #[test]
    fn extracted_cube_is_watertight() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);
        let mc = MarchingCubes::new(f.bounds(), 0.0625);
        let mesh = mc.extract(&f).unwrap();

        assert!(!mesh.is_empty());
        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert_eq!(adjacency.boundary_edge_count(), 0);
        assert!(adjacency.is_manifold());
    }

    #[test]
    fn extracted_cube_faces_outward() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);
        let mc = MarchingCubes::new(f.bounds(), 0.0625);
        let mesh = mc.extract(&f).unwrap();

        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 0.15);
    }

    #[test]
    fn extracted_bounds_match_source() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);
        let mc = MarchingCubes::new(f.bounds(), 0.0625);
        let mesh = mc.extract(&f).unwrap();

        let b = mesh.bounds();
        assert_relative_eq!(b.min.x, 0.0, epsilon = 0.07);
        assert_relative_eq!(b.max.z, 1.0, epsilon = 0.07);
    }

    #[test]
    fn field_without_crossing_extracts_nothing() {
        let grid = cube_grid();
        // Shrink the cube past its own half-width: everything positive
        let f = Implicit::offset(Implicit::grid(&grid), -2.0);
        let mc = MarchingCubes::new(Implicit::grid(&grid).bounds(), 0.0625);
        let mesh = mc.extract(&f).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn root_refinement_lands_closer_to_zero() {
        let grid = cube_grid();
        let f = Implicit::grid(&grid);

        let coarse = MarchingCubes::new(f.bounds(), 0.11); // misaligned with faces
        let refined = coarse.clone().with_root_refinement(5);

        let worst = |mesh: &Mesh| {
            mesh.vertices
                .iter()
                .map(|v| f.value(*v).abs())
                .fold(0.0f64, f64::max)
        };

        let plain = coarse.extract(&f).unwrap();
        let sharp = refined.extract(&f).unwrap();
        assert!(worst(&sharp) <= worst(&plain) + 1e-9);
    }

    #[test]
    fn union_of_two_cubes_is_one_shell() {
        let a = unit_cube(Point3::origin(), 1.0);
        let b = unit_cube(Point3::new(0.5, 0.0, 0.0), 1.0);
        let ga = build_sdf(&a, &SdfBuildParams::with_cell_size(0.0625)).unwrap();
        let gb = build_sdf(&b, &SdfBuildParams::with_cell_size(0.0625)).unwrap();

        let u = Implicit::union(Implicit::grid(&ga), Implicit::grid(&gb));
        let mc = MarchingCubes::new(u.bounds(), 0.0625);
        let mesh = mc.extract(&u).unwrap();

        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert_eq!(adjacency.boundary_edge_count(), 0);
        // Two unit cubes overlapping by half: volume 1.5
        assert_relative_eq!(mesh.signed_volume(), 1.5, epsilon = 0.2);
    }
}
