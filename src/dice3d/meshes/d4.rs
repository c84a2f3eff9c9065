use bevy::prelude::*;

use super::{triangle_faces, Polyhedron};

/// Regular tetrahedron: alternate corners of the cube (±1, ±1, ±1).
pub fn create_d4() -> Polyhedron {
    let vertices = vec![
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];
    let faces = triangle_faces(&vertices, 2.0 * std::f32::consts::SQRT_2);

    Polyhedron { vertices, faces }
}
