//! Edge-collapse mesh simplification.
//!
//! Iso-surface extraction produces many small, near-coplanar triangles.
//! This crate collapses edges until a target is met — a triangle count, a
//! ratio of the original count, or (the volumetric pipeline's default) a
//! maximum edge length — while guarding against collapses that would break
//! manifoldness. Collapse order and merged vertex placement come from
//! Garland–Heckbert quadric error metrics.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, Point3};
//! use mesh_reduce::{reduce_mesh, ReduceParams};
//!
//! let cube = unit_cube(Point3::origin(), 1.0);
//! let outcome = reduce_mesh(&cube, &ReduceParams::target_ratio(0.5));
//! assert!(outcome.final_triangles <= outcome.original_triangles);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod quadric;
mod reduce;

pub use quadric::Quadric;
pub use reduce::{reduce_mesh, ReduceOutcome, ReduceParams, ReduceTarget};
