use bevy::prelude::*;

use super::{create_d20, Polyhedron};

/// Regular dodecahedron as the dual of the icosahedron: one vertex per
/// icosahedron face, one pentagon per icosahedron vertex.
pub fn create_d12() -> Polyhedron {
    let icosahedron = create_d20();

    let vertices: Vec<Vec3> = icosahedron
        .faces
        .iter()
        .map(|face| face.iter().map(|&i| icosahedron.vertices[i]).sum::<Vec3>() / 3.0)
        .collect();

    let faces = (0..icosahedron.vertices.len())
        .map(|corner| {
            icosahedron
                .faces
                .iter()
                .enumerate()
                .filter(|(_, face)| face.contains(&corner))
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    Polyhedron { vertices, faces }
}
