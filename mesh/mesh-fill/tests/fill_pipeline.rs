//! End-to-end hole-fill pipeline:
//! orient -> boundary loops -> remove selection -> fill -> orient.

use mesh_fill::{selection_boundary_loops, SmoothedFill};
use mesh_repair::{orient_components, MeshAdjacency};
use mesh_types::{Mesh, Point3};

/// Triangulated disk: a center fan plus one outer ring.
///
/// Returns the mesh and the face indices of the central fan.
fn build_disk() -> (Mesh, Vec<usize>) {
    let n = 8usize;
    let mut mesh = Mesh::new();
    mesh.vertices.push(Point3::origin()); // 0: center

    // Inner ring (radius 0.5): indices 1..=n, outer ring (radius 1.0):
    // indices n+1..=2n
    for &radius in &[0.5f64, 1.0f64] {
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            mesh.vertices.push(Point3::new(
                radius * angle.cos(),
                radius * angle.sin(),
                0.0,
            ));
        }
    }

    let inner = |i: usize| (1 + i % n) as u32;
    let outer = |i: usize| (1 + n + i % n) as u32;

    // Central fan: CCW viewed from +Z
    let mut central = Vec::new();
    for i in 0..n {
        central.push(mesh.faces.len());
        mesh.faces.push([0, inner(i), inner(i + 1)]);
    }
    // Annulus between the rings
    for i in 0..n {
        mesh.faces.push([inner(i), outer(i), outer(i + 1)]);
        mesh.faces.push([inner(i), outer(i + 1), inner(i + 1)]);
    }

    (mesh, central)
}

/// Disk with its central fan selected, filled with zero displacement: the
/// result keeps the outer rim as its only boundary.
#[test]
fn refill_disk_center() {
    let (mut mesh, central) = build_disk();
    let rim_edges_before = MeshAdjacency::build(&mesh.faces).boundary_edge_count();
    assert_eq!(rim_edges_before, 8);

    orient_components(&mut mesh);

    let loops = selection_boundary_loops(&mesh, &central);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].edge_count(), 8);

    mesh.remove_faces(&central);

    let filler = SmoothedFill::default().with_target_edge_length(0.5);
    let report = filler.fill(&mut mesh, &loops[0]).unwrap();
    assert!(report.faces_added > 0);

    orient_components(&mut mesh);

    // The filled region introduces no internal boundary: only the outer
    // rim remains open.
    let adjacency = MeshAdjacency::build(&mesh.faces);
    assert_eq!(adjacency.boundary_edge_count(), rim_edges_before);
    assert!(adjacency.is_manifold());
}

/// A displaced fill bulges the cap out of the disk plane.
#[test]
fn displaced_fill_bulges() {
    let (mut mesh, central) = build_disk();
    orient_components(&mut mesh);
    let loops = selection_boundary_loops(&mesh, &central);
    mesh.remove_faces(&central);

    let filler = SmoothedFill::default()
        .with_target_edge_length(0.2)
        .with_displacement(mesh_types::Vector3::new(0.0, 0.0, 1.0), 0.4);
    filler.fill(&mut mesh, &loops[0]).unwrap();
    orient_components(&mut mesh);

    let top = mesh.vertices.iter().map(|v| v.z).fold(f64::NEG_INFINITY, f64::max);
    assert!((top - 0.4).abs() < 0.05);

    let adjacency = MeshAdjacency::build(&mesh.faces);
    assert_eq!(adjacency.boundary_edge_count(), 8);
}

/// Every loop of a multi-hole selection fills independently.
#[test]
fn disjoint_selections_fill_independently() {
    let (mut mesh, central) = build_disk();

    // Two opposite fan triangles: two separate holes
    let selection = vec![central[0], central[4]];
    orient_components(&mut mesh);
    let loops = selection_boundary_loops(&mesh, &selection);
    assert_eq!(loops.len(), 2);

    mesh.remove_faces(&selection);
    let filler = SmoothedFill::default();
    for hole in &loops {
        filler.fill(&mut mesh, hole).unwrap();
    }
    orient_components(&mut mesh);

    let adjacency = MeshAdjacency::build(&mesh.faces);
    assert_eq!(adjacency.boundary_edge_count(), 8);
}
