//! Dense 3D grid of signed distance values.

use mesh_types::Aabb;
use nalgebra::Point3;

/// A dense grid of signed distances sampled on a regular lattice.
///
/// Values are stored x-fastest (`x + y * nx + z * nx * ny`). Lattice point
/// `(i, j, k)` sits at `origin + (i, j, k) * cell_size`. The grid owns its
/// buffer; implicit-function wrappers borrow it rather than copying, since
/// grids can be large.
#[derive(Debug, Clone)]
pub struct SdfGrid {
    values: Vec<f64>,
    dims: (usize, usize, usize),
    origin: Point3<f64>,
    cell_size: f64,
}

impl SdfGrid {
    /// Create a grid filled with `fill`.
    #[must_use]
    pub fn new(dims: (usize, usize, usize), origin: Point3<f64>, cell_size: f64, fill: f64) -> Self {
        let (nx, ny, nz) = dims;
        Self {
            values: vec![fill; nx * ny * nz],
            dims,
            origin,
            cell_size,
        }
    }

    /// Grid dimensions (lattice points per axis).
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    /// Minimum lattice corner in world space.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Lattice spacing.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World-space region covered by the lattice.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let (nx, ny, nz) = self.dims;
        #[allow(clippy::cast_precision_loss)]
        let max = Point3::new(
            self.origin.x + (nx.saturating_sub(1)) as f64 * self.cell_size,
            self.origin.y + (ny.saturating_sub(1)) as f64 * self.cell_size,
            self.origin.z + (nz.saturating_sub(1)) as f64 * self.cell_size,
        );
        Aabb::new(self.origin, max)
    }

    /// Value at lattice coordinates, clamped to the grid boundary.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        let (nx, ny, nz) = self.dims;
        let i = i.min(nx - 1);
        let j = j.min(ny - 1);
        let k = k.min(nz - 1);
        self.values[i + j * nx + k * nx * ny]
    }

    /// Set the value at lattice coordinates. Out-of-range writes are
    /// ignored.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let (nx, ny, nz) = self.dims;
        if i < nx && j < ny && k < nz {
            self.values[i + j * nx + k * nx * ny] = value;
        }
    }

    /// World position of a lattice point.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + i as f64 * self.cell_size,
            self.origin.y + j as f64 * self.cell_size,
            self.origin.z + k as f64 * self.cell_size,
        )
    }

    /// Trilinearly interpolated value at a world-space point.
    ///
    /// Points outside the lattice clamp to the boundary sample, so far-away
    /// queries return the (large positive) rim distance rather than
    /// extrapolating.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn trilinear(&self, p: Point3<f64>) -> f64 {
        let (nx, ny, nz) = self.dims;
        let gx = ((p.x - self.origin.x) / self.cell_size).clamp(0.0, (nx - 1) as f64);
        let gy = ((p.y - self.origin.y) / self.cell_size).clamp(0.0, (ny - 1) as f64);
        let gz = ((p.z - self.origin.z) / self.cell_size).clamp(0.0, (nz - 1) as f64);

        let i0 = (gx.floor() as usize).min(nx - 1);
        let j0 = (gy.floor() as usize).min(ny - 1);
        let k0 = (gz.floor() as usize).min(nz - 1);
        let i1 = (i0 + 1).min(nx - 1);
        let j1 = (j0 + 1).min(ny - 1);
        let k1 = (k0 + 1).min(nz - 1);

        let fx = gx - i0 as f64;
        let fy = gy - j0 as f64;
        let fz = gz - k0 as f64;

        let c000 = self.get(i0, j0, k0);
        let c100 = self.get(i1, j0, k0);
        let c010 = self.get(i0, j1, k0);
        let c110 = self.get(i1, j1, k0);
        let c001 = self.get(i0, j0, k1);
        let c101 = self.get(i1, j0, k1);
        let c011 = self.get(i0, j1, k1);
        let c111 = self.get(i1, j1, k1);

        let c00 = c000 + (c100 - c000) * fx;
        let c10 = c010 + (c110 - c010) * fx;
        let c01 = c001 + (c101 - c001) * fx;
        let c11 = c011 + (c111 - c011) * fx;

        let c0 = c00 + (c10 - c00) * fy;
        let c1 = c01 + (c11 - c01) * fy;

        c0 + (c1 - c0) * fz
    }

    /// Raw value buffer, x-fastest.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable z-slabs of `depth` layers each, for parallel disjoint
    /// writes.
    pub(crate) fn slabs_mut(&mut self, depth: usize) -> impl Iterator<Item = &mut [f64]> {
        let (nx, ny, _) = self.dims;
        self.values.chunks_mut(nx * ny * depth)
    }

    /// Mutable access to the raw buffer.
    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_grid() -> SdfGrid {
        SdfGrid::new((4, 4, 4), Point3::origin(), 0.5, 0.0)
    }

    #[test]
    fn get_set_roundtrip() {
        let mut grid = small_grid();
        grid.set(1, 2, 3, 42.0);
        assert_relative_eq!(grid.get(1, 2, 3), 42.0);
    }

    #[test]
    fn out_of_range_set_ignored() {
        let mut grid = small_grid();
        grid.set(10, 10, 10, 1.0);
        assert_relative_eq!(grid.get(3, 3, 3), 0.0);
    }

    #[test]
    fn position_of_lattice_point() {
        let grid = SdfGrid::new((4, 4, 4), Point3::new(-1.0, -1.0, -1.0), 0.5, 0.0);
        let p = grid.position(2, 2, 2);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bounds_span_lattice() {
        let grid = small_grid();
        let b = grid.bounds();
        assert_relative_eq!(b.max.x, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn trilinear_interpolates_between_samples() {
        let mut grid = SdfGrid::new((2, 2, 2), Point3::origin(), 1.0, 0.0);
        grid.set(1, 0, 0, 1.0);
        grid.set(1, 1, 0, 1.0);
        grid.set(1, 0, 1, 1.0);
        grid.set(1, 1, 1, 1.0);

        // Value should be x
        assert_relative_eq!(grid.trilinear(Point3::new(0.25, 0.5, 0.5)), 0.25, epsilon = 1e-12);
        assert_relative_eq!(grid.trilinear(Point3::new(0.75, 0.1, 0.9)), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn trilinear_clamps_outside() {
        let mut grid = SdfGrid::new((2, 2, 2), Point3::origin(), 1.0, 3.0);
        grid.set(0, 0, 0, 5.0);
        let far = grid.trilinear(Point3::new(-10.0, -10.0, -10.0));
        assert_relative_eq!(far, 5.0);
    }
}
