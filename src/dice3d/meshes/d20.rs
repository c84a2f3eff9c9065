use bevy::prelude::*;

use super::{triangle_faces, Polyhedron};

/// Regular icosahedron from the three golden rectangles.
pub fn create_d20() -> Polyhedron {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut vertices = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-phi, phi] {
            vertices.push(Vec3::new(0.0, a, b));
            vertices.push(Vec3::new(a, b, 0.0));
            vertices.push(Vec3::new(b, 0.0, a));
        }
    }
    let faces = triangle_faces(&vertices, 2.0);

    Polyhedron { vertices, faces }
}
