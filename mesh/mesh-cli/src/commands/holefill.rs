//! Delete a face selection and cap the resulting holes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use nalgebra::Vector3;
use tracing::warn;

use mesh_fill::{selection_boundary_loops, SmoothedFill};
use mesh_io::load_selection;
use mesh_repair::orient_components;

use super::{default_output, load_combined, write_output};

/// Displacement magnitude applied along the parsed direction vector.
const OFFSET_DISTANCE: f64 = 1.0;

pub fn run(
    input: &Path,
    selection_path: &Path,
    detail: f64,
    displacement: Option<&str>,
    output: Option<&Path>,
    ascii: bool,
) -> Result<()> {
    let selection = load_selection(selection_path)
        .with_context(|| format!("failed to read selection {}", selection_path.display()))?;
    if selection.is_empty() {
        bail!("selection is empty: nothing to delete");
    }

    let offset_direction = match displacement {
        Some(csv) => parse_displacement(csv)?,
        None => Vector3::zeros(),
    };

    let mut mesh = load_combined(input)?;
    println!("triangles: {}", mesh.face_count());
    println!("selected: {}", selection.len());

    // Loops inherit their winding from the faces about to be removed, so
    // orientation must be consistent before tracing them.
    orient_components(&mut mesh);

    let loops = selection_boundary_loops(&mesh, &selection);
    if loops.is_empty() {
        bail!("selection produced no boundary loops");
    }

    mesh.remove_faces(&selection);
    println!("triangles: {} (removed)", mesh.face_count());

    let filler = SmoothedFill {
        target_edge_length: detail,
        smooth_iterations: 3,
        offset_direction,
        offset_distance: OFFSET_DISTANCE,
    };
    let mut filled = 0usize;
    for hole in &loops {
        // One bad loop must not block the others
        match filler.fill(&mut mesh, hole) {
            Ok(report) if report.faces_added > 0 => filled += 1,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unfillable loop"),
        }
    }
    println!("filled: {filled} of {} loops", loops.len());

    // Cap triangles need orientation consistent with their surroundings
    orient_components(&mut mesh);
    println!("triangles: {} (filled)", mesh.face_count());

    let out = output.map_or_else(|| default_output(input), Path::to_path_buf);
    write_output(&mesh, &out, ascii)?;
    println!("{} {}", "wrote".green(), out.display());
    Ok(())
}

/// Parse "x,y,z" into a displacement vector.
fn parse_displacement(csv: &str) -> Result<Vector3<f64>> {
    let parts: Vec<f64> = csv
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid displacement '{csv}'"))?;
    if parts.len() != 3 {
        bail!("displacement must have exactly 3 components, got {}", parts.len());
    }
    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_displacement() {
        let v = parse_displacement("0, 0.5, -1").unwrap();
        assert!((v.y - 0.5).abs() < 1e-12);
        assert!((v.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn parse_rejects_bad_counts() {
        assert!(parse_displacement("1,2").is_err());
        assert!(parse_displacement("1,2,3,4").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_displacement("a,b,c").is_err());
    }
}
