use bevy::prelude::*;

use super::{triangle_faces, Polyhedron};

/// Regular octahedron with its corners on the axes.
pub fn create_d8() -> Polyhedron {
    let vertices = vec![
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];
    let faces = triangle_faces(&vertices, std::f32::consts::SQRT_2);

    Polyhedron { vertices, faces }
}
