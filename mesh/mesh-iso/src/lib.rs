//! Implicit-function algebra and iso-surface extraction.
//!
//! The volumetric half of the pipeline: signed distance grids become leaf
//! nodes of a small expression tree ([`Implicit`]) composed with
//! union/intersection/difference/offset operators, and [`MarchingCubes`]
//! turns any such tree back into a triangle mesh approximating its zero
//! level set.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, Point3};
//! use mesh_sdf::{build_sdf, SdfBuildParams};
//! use mesh_iso::{Implicit, MarchingCubes};
//!
//! let cube = unit_cube(Point3::origin(), 1.0);
//! let grid = build_sdf(&cube, &SdfBuildParams::with_cell_size(0.1)).unwrap();
//!
//! let solid = Implicit::grid(&grid);
//! let shrunk = Implicit::offset(solid, -0.1);
//!
//! let mc = MarchingCubes::new(shrunk.bounds(), 0.1);
//! let surface = mc.extract(&shrunk).unwrap();
//! assert!(!surface.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod implicit;
mod marching;
mod tables;

pub use error::{IsoError, IsoResult};
pub use implicit::Implicit;
pub use marching::{MarchingCubes, RootMode};
