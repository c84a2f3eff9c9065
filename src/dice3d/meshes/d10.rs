use bevy::prelude::*;

use super::Polyhedron;

/// Height of the two vertex rings above/below the equator (ring radius 1).
const RING_HEIGHT: f32 = 0.1;

/// Pentagonal trapezohedron: two apexes and two staggered five-vertex rings,
/// giving ten kite faces.
pub fn create_d10() -> Polyhedron {
    let step = std::f32::consts::TAU / 5.0;
    let half = step / 2.0;
    // Apex height at which each kite (apex, ring, opposite ring, ring) is planar.
    let apex = RING_HEIGHT * (1.0 + half.cos()) / (1.0 - half.cos());

    let mut vertices = vec![Vec3::new(0.0, apex, 0.0), Vec3::new(0.0, -apex, 0.0)];
    for i in 0..5 {
        let a = i as f32 * step;
        vertices.push(Vec3::new(a.cos(), RING_HEIGHT, a.sin()));
    }
    for i in 0..5 {
        let a = i as f32 * step + half;
        vertices.push(Vec3::new(a.cos(), -RING_HEIGHT, a.sin()));
    }

    let upper = |i: usize| 2 + i % 5;
    let lower = |i: usize| 7 + i % 5;
    let mut faces = Vec::with_capacity(10);
    for i in 0..5 {
        faces.push(vec![0, upper(i), lower(i), upper(i + 1)]);
        faces.push(vec![1, lower(i), upper(i + 1), lower(i + 1)]);
    }

    Polyhedron { vertices, faces }
}
