//! Implicit function expression tree.

use mesh_sdf::SdfGrid;
use mesh_types::Aabb;
use nalgebra::Point3;

/// A signed-distance-valued function over 3D points with known spatial
/// bounds.
///
/// Composition forms a directed acyclic expression tree; evaluation is a
/// recursive visit. Leaves borrow their [`SdfGrid`] rather than copying it,
/// and every variant is `Send + Sync`, so one tree can be evaluated from
/// many threads at once.
///
/// Operator semantics (distances negative inside):
///
/// | Variant             | Value              | Bounds                      |
/// |---------------------|--------------------|-----------------------------|
/// | `Grid(g)`           | trilinear sample   | lattice coverage            |
/// | `Union(a, b)`       | `min(a, b)`        | `a ∪ b`                     |
/// | `Intersection(a,b)` | `max(a, b)`        | `a ∪ b` (conservative)      |
/// | `Difference(a, b)`  | `max(a, -b)`       | `a`                         |
/// | `Offset(a, d)`      | `a - d`            | `a` expanded by `abs(d)`    |
///
/// Intersection uses the *union* of the operand boxes: the true overlap can
/// clip valid surface when operand grids disagree near their rims, and a
/// too-large box only costs empty cubes during extraction.
#[derive(Debug, Clone)]
pub enum Implicit<'g> {
    /// Trilinearly interpolated signed distance grid.
    Grid(&'g SdfGrid),
    /// Boolean union of two solids.
    Union(Box<Implicit<'g>>, Box<Implicit<'g>>),
    /// Boolean intersection of two solids.
    Intersection(Box<Implicit<'g>>, Box<Implicit<'g>>),
    /// First solid minus the second.
    Difference(Box<Implicit<'g>>, Box<Implicit<'g>>),
    /// Surface displaced outward by a constant distance.
    Offset {
        /// The solid being offset.
        operand: Box<Implicit<'g>>,
        /// Displacement; positive grows the solid, negative shrinks it.
        distance: f64,
    },
}

impl<'g> Implicit<'g> {
    /// Leaf node over a signed distance grid.
    #[inline]
    #[must_use]
    pub const fn grid(grid: &'g SdfGrid) -> Self {
        Self::Grid(grid)
    }

    /// Union of two operands.
    #[inline]
    #[must_use]
    pub fn union(a: Self, b: Self) -> Self {
        Self::Union(Box::new(a), Box::new(b))
    }

    /// Intersection of two operands.
    #[inline]
    #[must_use]
    pub fn intersection(a: Self, b: Self) -> Self {
        Self::Intersection(Box::new(a), Box::new(b))
    }

    /// `a` minus `b`.
    #[inline]
    #[must_use]
    pub fn difference(a: Self, b: Self) -> Self {
        Self::Difference(Box::new(a), Box::new(b))
    }

    /// `operand` offset by `distance`.
    #[inline]
    #[must_use]
    pub fn offset(operand: Self, distance: f64) -> Self {
        Self::Offset {
            operand: Box::new(operand),
            distance,
        }
    }

    /// Evaluate the signed distance at a point.
    #[must_use]
    pub fn value(&self, p: Point3<f64>) -> f64 {
        match self {
            Self::Grid(grid) => grid.trilinear(p),
            Self::Union(a, b) => a.value(p).min(b.value(p)),
            Self::Intersection(a, b) => a.value(p).max(b.value(p)),
            Self::Difference(a, b) => a.value(p).max(-b.value(p)),
            Self::Offset { operand, distance } => operand.value(p) - distance,
        }
    }

    /// Spatial bounds guaranteed to contain the zero level set.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Grid(grid) => grid.bounds(),
            Self::Union(a, b) | Self::Intersection(a, b) => a.bounds().union(&b.bounds()),
            Self::Difference(a, _) => a.bounds(),
            Self::Offset { operand, distance } => operand.bounds().expanded(distance.abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_sdf::{build_sdf, SdfBuildParams};
    use mesh_types::{unit_cube, Point3, Vector3};

    fn cube_grid(min: Point3<f64>) -> SdfGrid {
        let cube = unit_cube(min, 1.0);
        build_sdf(
            &cube,
            &SdfBuildParams::with_cell_size(0.1)
                .with_expand_bounds(Vector3::new(0.5, 0.5, 0.5)),
        )
        .unwrap()
    }

    fn sample_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for ix in 0..6 {
            for iy in 0..6 {
                for iz in 0..6 {
                    points.push(Point3::new(
                        -0.2 + 0.28 * f64::from(ix),
                        -0.2 + 0.28 * f64::from(iy),
                        -0.2 + 0.28 * f64::from(iz),
                    ));
                }
            }
        }
        points
    }

    #[test]
    fn union_with_self_is_identity() {
        let grid = cube_grid(Point3::origin());
        let a = Implicit::grid(&grid);
        let aa = Implicit::union(Implicit::grid(&grid), Implicit::grid(&grid));
        for p in sample_points() {
            assert_relative_eq!(a.value(p), aa.value(p), epsilon = 1e-12);
        }
    }

    #[test]
    fn intersection_with_self_is_identity() {
        let grid = cube_grid(Point3::origin());
        let a = Implicit::grid(&grid);
        let aa = Implicit::intersection(Implicit::grid(&grid), Implicit::grid(&grid));
        for p in sample_points() {
            assert_relative_eq!(a.value(p), aa.value(p), epsilon = 1e-12);
        }
    }

    #[test]
    fn difference_with_self_is_empty() {
        let grid = cube_grid(Point3::origin());
        let empty = Implicit::difference(Implicit::grid(&grid), Implicit::grid(&grid));
        for p in sample_points() {
            assert!(empty.value(p) >= 0.0, "A \\ A should be empty solid");
        }
    }

    #[test]
    fn union_value_is_min() {
        let ga = cube_grid(Point3::origin());
        let gb = cube_grid(Point3::new(0.5, 0.0, 0.0));
        let u = Implicit::union(Implicit::grid(&ga), Implicit::grid(&gb));
        // A point inside B but outside A belongs to the union
        let p = Point3::new(1.3, 0.5, 0.5);
        assert!(u.value(p) < 0.0);
        assert!(Implicit::grid(&ga).value(p) > 0.0);
    }

    #[test]
    fn difference_carves_overlap() {
        let ga = cube_grid(Point3::origin());
        let gb = cube_grid(Point3::new(0.5, 0.0, 0.0));
        let d = Implicit::difference(Implicit::grid(&ga), Implicit::grid(&gb));
        // Inside A and inside B: removed
        assert!(d.value(Point3::new(0.75, 0.5, 0.5)) >= 0.0);
        // Inside A, outside B: kept
        assert!(d.value(Point3::new(0.2, 0.5, 0.5)) < 0.0);
    }

    #[test]
    fn offset_shifts_the_zero_set() {
        let grid = cube_grid(Point3::origin());
        let grown = Implicit::offset(Implicit::grid(&grid), 0.2);
        // Just outside the original face, inside the grown solid
        assert!(grown.value(Point3::new(1.1, 0.5, 0.5)) < 0.0);
        // The shrunk solid excludes the same point
        let shrunk = Implicit::offset(Implicit::grid(&grid), -0.2);
        assert!(shrunk.value(Point3::new(0.95, 0.5, 0.5)) >= 0.0);
    }

    #[test]
    fn union_bounds_cover_both() {
        let ga = cube_grid(Point3::origin());
        let gb = cube_grid(Point3::new(2.0, 0.0, 0.0));
        let u = Implicit::union(Implicit::grid(&ga), Implicit::grid(&gb));
        let b = u.bounds();
        assert!(b.contains(&Point3::new(0.0, 0.5, 0.5)));
        assert!(b.contains(&Point3::new(3.0, 0.5, 0.5)));
    }

    #[test]
    fn intersection_bounds_are_conservative() {
        // Pinned decision: Intersection reports the union of operand
        // bounds, a superset of any true overlap.
        let ga = cube_grid(Point3::origin());
        let gb = cube_grid(Point3::new(0.5, 0.0, 0.0));
        let a = Implicit::grid(&ga);
        let b = Implicit::grid(&gb);
        let i = Implicit::intersection(a.clone(), b.clone());

        let expected = a.bounds().union(&b.bounds());
        assert_eq!(i.bounds(), expected);
        assert!(i.bounds().contains(&a.bounds().min));
        assert!(i.bounds().contains(&b.bounds().max));
    }

    #[test]
    fn difference_bounds_are_left_operand() {
        let ga = cube_grid(Point3::origin());
        let gb = cube_grid(Point3::new(0.5, 0.0, 0.0));
        let a = Implicit::grid(&ga);
        let d = Implicit::difference(a.clone(), Implicit::grid(&gb));
        assert_eq!(d.bounds(), a.bounds());
    }

    #[test]
    fn offset_bounds_grow_by_distance() {
        let grid = cube_grid(Point3::origin());
        let a = Implicit::grid(&grid);
        let inner = a.bounds();
        let grown = Implicit::offset(a, 0.75);
        let outer = grown.bounds();
        assert_relative_eq!(outer.min.x, inner.min.x - 0.75, epsilon = 1e-12);
        assert_relative_eq!(outer.max.z, inner.max.z + 0.75, epsilon = 1e-12);
        // Strict containment
        assert!(outer.min.x < inner.min.x && outer.max.x > inner.max.x);
    }
}
