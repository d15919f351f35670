//! Volumetric surface offset.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use nalgebra::Vector3;

use mesh_iso::{Implicit, MarchingCubes};
use mesh_reduce::{reduce_mesh, ReduceParams};
use mesh_repair::{repair_mesh, RepairParams};
use mesh_sdf::{build_sdf, SdfBuildParams};

use super::{default_output, load_combined, write_output};

/// Root refinement steps on each active cube edge; the offset surface is
/// curved between samples, so a single lerp visibly faceted it.
const ROOT_STEPS: usize = 5;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run(
    input: &Path,
    distance: f64,
    detail: u32,
    output: Option<&Path>,
    ascii: bool,
) -> Result<()> {
    let mut mesh = load_combined(input)?;
    println!("triangles: {}", mesh.face_count());

    let repaired = repair_mesh(&mut mesh, &RepairParams::default());
    if repaired.had_changes() {
        println!("{repaired}");
    }
    println!("triangles: {} (repaired)", mesh.face_count());
    println!("distance: {distance}");

    // The grid must reach past the source surface by the offset distance,
    // and the exact band must cover that reach.
    let cell_size = mesh.bounds().max_extent() / f64::from(detail);
    let reach = distance.abs();
    let band_cells = (reach / cell_size) as usize + 1;
    let grid = build_sdf(
        &mesh,
        &SdfBuildParams::with_cell_size(cell_size)
            .with_expand_bounds(Vector3::new(reach, reach, reach))
            .with_exact_band_width(band_cells),
    )
    .context("signed distance voxelization failed")?;

    let iso = Implicit::offset(Implicit::grid(&grid), distance);

    let bounds = iso.bounds();
    let cube_size = bounds.max_extent() / f64::from(detail);
    let mc = MarchingCubes::new(bounds.expanded(3.0 * cube_size), cube_size)
        .with_root_refinement(ROOT_STEPS);
    let extracted = mc.extract(&iso).context("surface extraction failed")?;
    println!("triangles: {} (remeshed)", extracted.face_count());

    let reduced = reduce_mesh(&extracted, &ReduceParams::max_edge_length(2.0 * cube_size));
    println!("triangles: {} (reduced)", reduced.final_triangles);

    let out = output.map_or_else(|| default_output(input), Path::to_path_buf);
    write_output(&reduced.mesh, &out, ascii)?;
    println!("{} {}", "wrote".green(), out.display());
    Ok(())
}
