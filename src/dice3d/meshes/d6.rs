use bevy::prelude::*;

use super::Polyhedron;

pub fn create_d6() -> Polyhedron {
    let mut vertices = Vec::with_capacity(8);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }

    // Ordered so the default numbering gives -Y=1, +Z=2, +X=3 (and 6, 5, 4 opposite).
    let axes = [Vec3::NEG_Y, Vec3::Z, Vec3::X, Vec3::Y, Vec3::NEG_Z, Vec3::NEG_X];
    let faces = axes
        .iter()
        .map(|axis| {
            (0..vertices.len())
                .filter(|&i| vertices[i].dot(*axis) > 0.5)
                .collect()
        })
        .collect();

    Polyhedron { vertices, faces }
}
