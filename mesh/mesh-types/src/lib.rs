//! Core mesh types for the volumetric editing pipeline.
//!
//! This crate provides the foundational types every other crate in the
//! workspace operates on:
//!
//! - [`Mesh`] - An indexed triangle mesh
//! - [`Triangle`] - A concrete triangle with resolved vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Units
//!
//! The library is unit-agnostic. All coordinates are `f64`.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Face winding is **counter-clockwise (CCW) when
//! viewed from outside**; normals point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Mesh, Point3};
//!
//! let mut mesh = Mesh::new();
//! mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(0.5, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod mesh;
mod triangle;

pub use bounds::Aabb;
pub use mesh::{unit_cube, Mesh};
pub use triangle::Triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
