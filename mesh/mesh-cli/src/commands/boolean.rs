//! Volumetric boolean of two meshes.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use mesh_iso::{Implicit, MarchingCubes};
use mesh_reduce::{reduce_mesh, ReduceParams};
use mesh_repair::{repair_mesh, RepairParams};
use mesh_sdf::{build_sdf, SdfBuildParams, SdfGrid};
use mesh_types::Mesh;

use crate::Operation;

use super::{default_output, load_combined, write_output};

pub fn run(
    input: &Path,
    input2: &Path,
    operation: Operation,
    detail: u32,
    output: Option<&Path>,
    ascii: bool,
) -> Result<()> {
    let mut mesh_a = load_combined(input)?;
    let mut mesh_b = load_combined(input2)?;
    println!(
        "triangles: {}",
        mesh_a.face_count() + mesh_b.face_count()
    );

    let repaired_a = repair_mesh(&mut mesh_a, &RepairParams::default());
    let repaired_b = repair_mesh(&mut mesh_b, &RepairParams::default());
    if repaired_a.had_changes() || repaired_b.had_changes() {
        println!("{repaired_a}");
        println!("{repaired_b}");
    }
    println!(
        "triangles: {} (repaired)",
        mesh_a.face_count() + mesh_b.face_count()
    );

    let grid_a = voxelize(&mesh_a, detail)?;
    let grid_b = voxelize(&mesh_b, detail)?;

    let a = Implicit::grid(&grid_a);
    let b = Implicit::grid(&grid_b);
    let op = match operation {
        Operation::Union => Implicit::union(a, b),
        Operation::Intersection => Implicit::intersection(a, b),
        Operation::Difference => Implicit::difference(a, b),
    };

    // Extraction runs over the union of the input boxes regardless of the
    // operator, padded by a few cubes so the surface never meets the rim.
    let domain = mesh_a.bounds().union(&mesh_b.bounds());
    let cube_size = domain.max_extent() / f64::from(detail);
    let mc = MarchingCubes::new(domain.expanded(3.0 * cube_size), cube_size);
    let extracted = mc.extract(&op).context("surface extraction failed")?;
    println!("triangles: {} (remeshed)", extracted.face_count());

    let reduced = reduce_mesh(&extracted, &ReduceParams::max_edge_length(2.0 * cube_size));
    println!("triangles: {} (reduced)", reduced.final_triangles);

    let out = output.map_or_else(|| default_output(input), Path::to_path_buf);
    write_output(&reduced.mesh, &out, ascii)?;
    println!("{} {}", "wrote".green(), out.display());
    Ok(())
}

fn voxelize(mesh: &Mesh, detail: u32) -> Result<SdfGrid> {
    let cell_size = mesh.bounds().max_extent() / f64::from(detail);
    build_sdf(mesh, &SdfBuildParams::with_cell_size(cell_size))
        .context("signed distance voxelization failed")
}
