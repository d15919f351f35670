//! Wavefront OBJ load/save.
//!
//! Only geometry is handled: `v` and `f` records plus `o`/`g` object
//! splits. Texture/normal references in face records (`v/vt/vn`) are
//! parsed past and dropped. Polygonal faces are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use mesh_types::{Mesh, Point3};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Load an OBJ file, returning one mesh per object group.
///
/// Files without `o`/`g` records yield a single mesh. Vertex indices are
/// global per the OBJ spec, so each group's mesh carries only the vertices
/// it references.
///
/// # Errors
///
/// Unreadable file or malformed records.
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<Vec<Mesh>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;
    let reader = BufReader::new(file);

    let mut positions: Vec<Point3<f64>> = Vec::new();
    // (group id, face over global indices)
    let mut faces: Vec<(usize, [u32; 3])> = Vec::new();
    let mut group = 0usize;
    let mut group_used = false;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coord = || -> IoResult<f64> {
                    parts
                        .next()
                        .and_then(|t| t.parse::<f64>().ok())
                        .ok_or_else(|| {
                            IoError::invalid_content(format!(
                                "bad vertex on line {}",
                                line_no + 1
                            ))
                        })
                };
                let x = coord()?;
                let y = coord()?;
                let z = coord()?;
                positions.push(Point3::new(x, y, z));
            }
            Some("f") => {
                let corner_indices: Vec<u32> = parts
                    .map(|token| parse_face_index(token, positions.len(), line_no + 1))
                    .collect::<IoResult<_>>()?;
                if corner_indices.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "face with {} corners on line {}",
                        corner_indices.len(),
                        line_no + 1
                    )));
                }
                // Fan triangulation for polygons
                for i in 1..corner_indices.len() - 1 {
                    faces.push((
                        group,
                        [corner_indices[0], corner_indices[i], corner_indices[i + 1]],
                    ));
                }
                group_used = true;
            }
            Some("o" | "g") => {
                if group_used {
                    group += 1;
                    group_used = false;
                }
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Ok(Vec::new());
    }

    let meshes = split_groups(&positions, &faces, group + 1);
    debug!(meshes = meshes.len(), "loaded OBJ");
    Ok(meshes)
}

/// Parse the vertex index out of `v`, `v/vt`, `v//vn` or `v/vt/vn`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn parse_face_index(token: &str, vertex_count: usize, line: usize) -> IoResult<u32> {
    let first = token.split('/').next().unwrap_or(token);
    let raw: i64 = first
        .parse()
        .map_err(|_| IoError::invalid_content(format!("bad face index on line {line}")))?;

    // Negative indices are relative to the end of the vertex list
    let resolved = if raw < 0 {
        vertex_count as i64 + raw
    } else {
        raw - 1
    };

    if resolved >= 0 && (resolved as usize) < vertex_count {
        Ok(resolved as u32)
    } else {
        Err(IoError::invalid_content(format!(
            "face index {raw} out of range on line {line}"
        )))
    }
}

/// Carve the global vertex list into per-group meshes with compact
/// indices.
#[allow(clippy::cast_possible_truncation)]
fn split_groups(
    positions: &[Point3<f64>],
    faces: &[(usize, [u32; 3])],
    group_count: usize,
) -> Vec<Mesh> {
    let mut meshes = Vec::new();
    for g in 0..group_count {
        let mut remap: Vec<u32> = vec![u32::MAX; positions.len()];
        let mut mesh = Mesh::new();
        for &(face_group, face) in faces {
            if face_group != g {
                continue;
            }
            let mut local = [0u32; 3];
            for (slot, &global) in local.iter_mut().zip(&face) {
                if remap[global as usize] == u32::MAX {
                    remap[global as usize] = mesh.vertices.len() as u32;
                    mesh.vertices.push(positions[global as usize]);
                }
                *slot = remap[global as usize];
            }
            mesh.faces.push(local);
        }
        if !mesh.faces.is_empty() {
            meshes.push(mesh);
        }
    }
    meshes
}

/// Save a mesh as ASCII OBJ.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save_obj<P: AsRef<Path>>(mesh: &Mesh, path: P) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "o mesh")?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in &mesh.faces {
        writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
    }
    writer.flush()?;
    Ok(())
}
