//! Subcommand implementations and shared pipeline plumbing.

pub mod boolean;
pub mod holefill;
pub mod offset;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mesh_types::Mesh;

/// Load a file and collapse every mesh it contains into one, as the batch
/// pipelines expect.
pub(crate) fn load_combined(path: &Path) -> Result<Mesh> {
    let meshes = mesh_io::load_mesh(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if meshes.is_empty() {
        bail!("{} did not contain any valid meshes", path.display());
    }

    let mut combined = Mesh::new();
    for mesh in &meshes {
        combined.append(mesh);
    }
    if combined.face_count() == 0 {
        bail!("{} does not contain any triangles", path.display());
    }
    Ok(combined)
}

/// Default output path: `<stem>.operated.<ext>` next to the input.
pub(crate) fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("stl");
    input.with_file_name(format!("{stem}.operated.{ext}"))
}

/// Write the finished mesh; called only after the pipeline is complete.
pub(crate) fn write_output(mesh: &Mesh, path: &Path, ascii: bool) -> Result<()> {
    mesh_io::save_mesh(mesh, path, !ascii)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_keeps_extension() {
        let out = default_output(Path::new("/tmp/part.stl"));
        assert_eq!(out, PathBuf::from("/tmp/part.operated.stl"));
    }

    #[test]
    fn default_output_without_extension() {
        let out = default_output(Path::new("part"));
        assert_eq!(out, PathBuf::from("part.operated.stl"));
    }
}
