//! Boundary loop extraction and smoothed hole filling.
//!
//! The hole-fill half of the pipeline: a face selection names a region to
//! delete, [`selection_boundary_loops`] computes the ordered edge loops
//! bounding that region, and [`SmoothedFill`] caps each loop with a
//! tessellated, relaxed, optionally displaced patch.
//!
//! Each loop fills independently; a degenerate loop is a no-op, never an
//! abort.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, Point3};
//! use mesh_fill::{selection_boundary_loops, SmoothedFill};
//!
//! let mut mesh = unit_cube(Point3::origin(), 1.0);
//! // The two top-face triangles
//! let selection = vec![2usize, 3usize];
//!
//! let loops = selection_boundary_loops(&mesh, &selection);
//! assert_eq!(loops.len(), 1);
//!
//! mesh.remove_faces(&selection);
//! let filler = SmoothedFill::default();
//! let report = filler.fill(&mut mesh, &loops[0]).unwrap();
//! assert!(report.faces_added > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod fill;
mod loops;

pub use error::{FillError, FillResult};
pub use fill::{FillReport, SmoothedFill};
pub use loops::{selection_boundary_loops, EdgeLoop};
