//! Mesh file I/O for the pipeline tools.
//!
//! The narrow collaborator contract of the pipeline: load every mesh a
//! file contains, write a finished mesh back out, and read JSON selection
//! files. Formats:
//!
//! - **STL** (binary and ASCII) - ubiquitous triangle soup
//! - **OBJ** (ASCII) - indexed, preserves shared vertices
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_mesh, save_mesh};
//!
//! let meshes = load_mesh("model.stl").unwrap();
//! save_mesh(&meshes[0], "out.obj", false).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod obj;
mod selection;
mod stl;

pub use error::{IoError, IoResult};
pub use obj::{load_obj, save_obj};
pub use selection::load_selection;
pub use stl::{load_stl, save_stl};

use std::path::Path;

use mesh_types::Mesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// STL, binary or ASCII.
    Stl,
    /// Wavefront OBJ, ASCII.
    Obj,
}

impl MeshFormat {
    /// Detect format from a file extension.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

/// Load every mesh in a file, detecting the format from the extension.
///
/// STL files always hold one mesh; OBJ files yield one mesh per object
/// group.
///
/// # Errors
///
/// Unknown extension, unreadable file, or invalid content.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<Vec<Mesh>> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Stl => load_stl(path).map(|m| vec![m]),
        MeshFormat::Obj => load_obj(path),
    }
}

/// Save a mesh, detecting the format from the extension.
///
/// `binary` selects binary STL; OBJ is always ASCII.
///
/// # Errors
///
/// Unknown extension or a failed write.
pub fn save_mesh<P: AsRef<Path>>(mesh: &Mesh, path: P, binary: bool) -> IoResult<()> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Stl => save_stl(mesh, path, binary),
        MeshFormat::Obj => save_obj(mesh, path),
    }
}

fn format_of(path: &Path) -> IoResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(MeshFormat::from_path("a.stl"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("a.STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("/x/y/a.obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path("a.xyz"), None);
        assert_eq!(MeshFormat::from_path("a"), None);
    }
}
