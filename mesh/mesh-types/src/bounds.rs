//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (AABB).
///
/// The box is defined by minimum and maximum corner points. An *empty* box
/// has `min > max` on some axis and is the identity element for [`union`].
///
/// [`union`]: Aabb::union
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0)));
/// assert!((aabb.max_extent() - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a new AABB from corners, swapping per-axis so min ≤ max.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Create an empty (inverted) AABB.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create an AABB enclosing an iterator of points.
    ///
    /// Returns an empty AABB if the iterator is empty.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_to_include(p);
        }
        aabb
    }

    /// Check if the AABB is empty (min > max on any axis).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Size along each axis.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the longest edge.
    ///
    /// The voxelization stages derive cell sizes from this.
    #[inline]
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Check if the AABB contains a point (boundary inclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// The enclosing AABB of two boxes. Empty boxes are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// The overlap of two boxes; empty if they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        }
    }

    /// A copy expanded by a uniform margin on all sides.
    ///
    /// Negative margins shrink the box.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point3::new(self.min.x - margin, self.min.y - margin, self.min.z - margin),
            max: Point3::new(self.max.x + margin, self.max.y + margin, self.max.z + margin),
        }
    }

    /// A copy expanded by a per-axis margin on all sides.
    #[must_use]
    pub fn expanded_by(&self, margin: Vector3<f64>) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Grow the AABB in place to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_spans_extremes() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 5.0, 3.0),
            Point3::new(-2.0, 8.0, 1.0),
        ];
        let aabb = Aabb::from_points(points.iter());
        assert!((aabb.min.x - (-2.0)).abs() < f64::EPSILON);
        assert!((aabb.max.y - 8.0).abs() < f64::EPSILON);
        assert!((aabb.max.z - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_box() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
    }

    #[test]
    fn contains_boundary() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        assert!(aabb.contains(&Point3::origin()));
        assert!(aabb.contains(&Point3::new(10.0, 10.0, 10.0)));
        assert!(!aabb.contains(&Point3::new(-0.1, 5.0, 5.0)));
    }

    #[test]
    fn union_ignores_empty() {
        let a = Aabb::new(Point3::origin(), Point3::new(5.0, 5.0, 5.0));
        let u = a.union(&Aabb::empty());
        assert_eq!(u, a);
        let u2 = Aabb::empty().union(&a);
        assert_eq!(u2, a);
    }

    #[test]
    fn union_spans_both() {
        let a = Aabb::new(Point3::origin(), Point3::new(5.0, 5.0, 5.0));
        let b = Aabb::new(Point3::new(3.0, 3.0, 3.0), Point3::new(10.0, 10.0, 10.0));
        let u = a.union(&b);
        assert!((u.min.x - 0.0).abs() < f64::EPSILON);
        assert!((u.max.x - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn intersection_of_disjoint_is_empty() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn expanded_margins() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        let e = aabb.expanded(2.0);
        assert!((e.min.x - (-2.0)).abs() < f64::EPSILON);
        assert!((e.max.x - 12.0).abs() < f64::EPSILON);

        let ev = aabb.expanded_by(Vector3::new(1.0, 0.0, 2.0));
        assert!((ev.min.x - (-1.0)).abs() < f64::EPSILON);
        assert!((ev.min.y - 0.0).abs() < f64::EPSILON);
        assert!((ev.max.z - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_extent_picks_longest() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(2.0, 7.0, 4.0));
        assert!((aabb.max_extent() - 7.0).abs() < f64::EPSILON);
    }
}
