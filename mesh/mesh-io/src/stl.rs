//! STL (stereolithography) load/save.
//!
//! Binary layout: 80-byte header, u32 triangle count, then per triangle a
//! normal, three vertices (f32 each) and a u16 attribute word. ASCII files
//! start with `solid`; some binary exporters write "solid" into the header
//! too, so detection also checks for null bytes.
//!
//! STL stores a triangle soup. The loader welds exactly coincident
//! vertices while reading so downstream adjacency works; near-duplicates
//! are left for the repair stage.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{Mesh, Point3};
use tracing::debug;

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// Load an STL file, auto-detecting ASCII vs binary.
///
/// # Errors
///
/// Unreadable file or malformed content.
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<Mesh> {
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
    let mut reader = BufReader::new(file);

    let mut head = [0u8; HEADER_SIZE + 4];
    let n = read_up_to(&mut reader, &mut head)?;
    if n < 6 {
        return Err(IoError::invalid_content("file too small to be STL"));
    }

    let looks_ascii = String::from_utf8_lossy(&head[..n.min(HEADER_SIZE)])
        .trim_start()
        .starts_with("solid")
        && !head[..n.min(HEADER_SIZE)].contains(&0);

    if looks_ascii {
        let file = File::open(path)?;
        load_ascii(BufReader::new(file))
    } else {
        load_binary(&head[..n], reader)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> IoResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn load_binary<R: Read>(head: &[u8], mut reader: R) -> IoResult<Mesh> {
    if head.len() < HEADER_SIZE + 4 {
        return Err(IoError::invalid_content("binary STL header truncated"));
    }
    let count = u32::from_le_bytes([
        head[HEADER_SIZE],
        head[HEADER_SIZE + 1],
        head[HEADER_SIZE + 2],
        head[HEADER_SIZE + 3],
    ]);

    let mut builder = SoupBuilder::with_capacity(count as usize);
    let mut buf = [0u8; TRIANGLE_SIZE];
    for i in 0..count {
        let n = read_up_to(&mut reader, &mut buf)?;
        if n < TRIANGLE_SIZE {
            return Err(IoError::TruncatedStl {
                expected: count,
                got: i,
            });
        }
        // Skip the 12-byte normal; read the three vertices
        let v0 = read_f32_point(&buf[12..24]);
        let v1 = read_f32_point(&buf[24..36]);
        let v2 = read_f32_point(&buf[36..48]);
        builder.push_triangle(v0, v1, v2);
    }

    let mesh = builder.finish();
    debug!(faces = mesh.face_count(), "loaded binary STL");
    Ok(mesh)
}

fn read_f32_point(buf: &[u8]) -> Point3<f64> {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Point3::new(f64::from(x), f64::from(y), f64::from(z))
}

fn load_ascii<R: BufRead>(reader: R) -> IoResult<Mesh> {
    let mut builder = SoupBuilder::with_capacity(0);
    let mut pending: Vec<Point3<f64>> = Vec::with_capacity(3);

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("vertex") => {
                let mut coord = |axis: &str| -> IoResult<f64> {
                    parts
                        .next()
                        .and_then(|t| t.parse::<f64>().ok())
                        .ok_or_else(|| {
                            IoError::invalid_content(format!("bad vertex {axis} coordinate"))
                        })
                };
                let x = coord("x")?;
                let y = coord("y")?;
                let z = coord("z")?;
                pending.push(Point3::new(x, y, z));
            }
            Some("endfacet") => {
                if pending.len() != 3 {
                    return Err(IoError::invalid_content(format!(
                        "facet with {} vertices",
                        pending.len()
                    )));
                }
                builder.push_triangle(pending[0], pending[1], pending[2]);
                pending.clear();
            }
            _ => {}
        }
    }

    let mesh = builder.finish();
    debug!(faces = mesh.face_count(), "loaded ASCII STL");
    Ok(mesh)
}

/// Indexes soup triangles, welding bit-identical positions.
struct SoupBuilder {
    mesh: Mesh,
    seen: HashMap<[u64; 3], u32>,
}

impl SoupBuilder {
    fn with_capacity(faces: usize) -> Self {
        Self {
            mesh: Mesh::with_capacity(faces / 2 + 3, faces),
            seen: HashMap::with_capacity(faces / 2 + 3),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn index_of(&mut self, p: Point3<f64>) -> u32 {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        *self.seen.entry(key).or_insert_with(|| {
            let idx = self.mesh.vertices.len() as u32;
            self.mesh.vertices.push(p);
            idx
        })
    }

    fn push_triangle(&mut self, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
        let face = [self.index_of(v0), self.index_of(v1), self.index_of(v2)];
        self.mesh.faces.push(face);
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

/// Save a mesh as STL.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn save_stl<P: AsRef<Path>>(mesh: &Mesh, path: P, binary: bool) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    if binary {
        let mut header = [0u8; HEADER_SIZE];
        header[..14].copy_from_slice(b"binary stl out");
        writer.write_all(&header)?;
        writer.write_all(&(mesh.faces.len() as u32).to_le_bytes())?;

        for tri in mesh.triangles() {
            let n = tri.normal().unwrap_or_else(mesh_types::Vector3::zeros);
            write_f32_triple(&mut writer, n.x, n.y, n.z)?;
            for v in [tri.v0, tri.v1, tri.v2] {
                write_f32_triple(&mut writer, v.x, v.y, v.z)?;
            }
            writer.write_all(&0u16.to_le_bytes())?;
        }
    } else {
        writeln!(writer, "solid mesh")?;
        for tri in mesh.triangles() {
            let n = tri.normal().unwrap_or_else(mesh_types::Vector3::zeros);
            writeln!(writer, "  facet normal {} {} {}", n.x, n.y, n.z)?;
            writeln!(writer, "    outer loop")?;
            for v in [tri.v0, tri.v1, tri.v2] {
                writeln!(writer, "      vertex {} {} {}", v.x, v.y, v.z)?;
            }
            writeln!(writer, "    endloop")?;
            writeln!(writer, "  endfacet")?;
        }
        writeln!(writer, "endsolid mesh")?;
    }

    writer.flush()?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn write_f32_triple<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> IoResult<()> {
    writer.write_all(&(x as f32).to_le_bytes())?;
    writer.write_all(&(y as f32).to_le_bytes())?;
    writer.write_all(&(z as f32).to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mesh-io-stl-{name}-{}", std::process::id()))
    }

    #[test]
    fn binary_roundtrip() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let path = temp_path("bin.stl");
        save_stl(&cube, &path, true).unwrap();
        let loaded = load_stl(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.face_count(), 12);
        // Welding restores shared vertices
        assert_eq!(loaded.vertex_count(), 8);
        assert!((loaded.signed_volume() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ascii_roundtrip() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let path = temp_path("ascii.stl");
        save_stl(&cube, &path, false).unwrap();
        let loaded = load_stl(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.face_count(), 12);
        assert_eq!(loaded.vertex_count(), 8);
    }

    #[test]
    fn missing_file() {
        let result = load_stl("/definitely/not/here.stl");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn garbage_rejected() {
        let path = temp_path("garbage.stl");
        std::fs::write(&path, b"abc").unwrap();
        let result = load_stl(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn truncated_binary_rejected() {
        let cube = unit_cube(Point3::origin(), 1.0);
        let path = temp_path("trunc.stl");
        save_stl(&cube, &path, true).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 30]).unwrap();
        let result = load_stl(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(IoError::TruncatedStl { .. })));
    }
}
