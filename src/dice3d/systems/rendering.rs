//! Number label meshes
//!
//! Labels are flat seven-segment numerals in the XY plane facing +Z, one unit
//! tall. `LabelPlacement` from the geometry catalog scales and orients them
//! onto the die faces.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

const HALF_HEIGHT: f32 = 0.5;
const HALF_WIDTH: f32 = 0.28;
const STROKE: f32 = 0.11;
const DIGIT_ADVANCE: f32 = 0.72;
/// Lifts the numeral off the face so it does not z-fight.
const LIFT: f32 = 0.002;

// Segment bits: top, upper right, lower right, bottom, lower left, upper left, middle.
const A: u8 = 1 << 0;
const B: u8 = 1 << 1;
const C: u8 = 1 << 2;
const D: u8 = 1 << 3;
const E: u8 = 1 << 4;
const F: u8 = 1 << 5;
const G: u8 = 1 << 6;

fn segments(digit: u32) -> u8 {
    match digit {
        0 => A | B | C | D | E | F,
        1 => B | C,
        2 => A | B | G | E | D,
        3 => A | B | G | C | D,
        4 => F | G | B | C,
        5 => A | F | G | C | D,
        6 => A | F | G | E | C | D,
        7 => A | B | C,
        8 => A | B | C | D | E | F | G,
        9 => A | B | C | D | F | G,
        _ => G,
    }
}

/// Decimal digits of `value`, most significant first.
pub fn digits_of(value: u32) -> Vec<u32> {
    if value == 0 {
        return vec![0];
    }
    let mut digits = Vec::new();
    let mut rest = value;
    while rest > 0 {
        digits.push(rest % 10);
        rest /= 10;
    }
    digits.reverse();
    digits
}

/// 6 and 9 read the same upside down on a tumbling die; they get a bar underneath.
pub fn needs_underline(value: u32) -> bool {
    value == 6 || value == 9
}

#[derive(Default)]
struct LabelGeometry {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl LabelGeometry {
    fn quad(&mut self, from: Vec2, to: Vec2) {
        let along = to - from;
        let length = along.length();
        if length < 1e-4 {
            return;
        }
        let side = Vec2::new(-along.y, along.x) / length * (STROKE / 2.0);
        let base = self.positions.len() as u32;
        for corner in [from - side, to - side, to + side, from + side] {
            self.positions.push([corner.x, corner.y, LIFT]);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn digit(&mut self, digit: u32, centre_x: f32) {
        let (l, r) = (centre_x - HALF_WIDTH, centre_x + HALF_WIDTH);
        let (top, mid, bottom) = (HALF_HEIGHT, 0.0, -HALF_HEIGHT);
        let mask = segments(digit);
        let strokes = [
            (A, Vec2::new(l, top), Vec2::new(r, top)),
            (B, Vec2::new(r, top), Vec2::new(r, mid)),
            (C, Vec2::new(r, mid), Vec2::new(r, bottom)),
            (D, Vec2::new(l, bottom), Vec2::new(r, bottom)),
            (E, Vec2::new(l, mid), Vec2::new(l, bottom)),
            (F, Vec2::new(l, top), Vec2::new(l, mid)),
            (G, Vec2::new(l, mid), Vec2::new(r, mid)),
        ];
        for (bit, from, to) in strokes {
            if mask & bit != 0 {
                self.quad(from, to);
            }
        }
    }
}

/// Flat numeral mesh for `value`, centred on the origin.
pub fn create_digit_mesh(value: u32) -> Mesh {
    let digits = digits_of(value);
    let mut geometry = LabelGeometry::default();

    let start_x = -((digits.len() - 1) as f32 * DIGIT_ADVANCE) / 2.0;
    for (i, digit) in digits.iter().enumerate() {
        geometry.digit(*digit, start_x + i as f32 * DIGIT_ADVANCE);
    }
    if needs_underline(value) {
        let y = -HALF_HEIGHT - STROKE * 2.0;
        geometry.quad(Vec2::new(-HALF_WIDTH, y), Vec2::new(HALF_WIDTH, y));
    }

    let count = geometry.positions.len();
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, geometry.positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 0.0, 1.0]; count])
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, vec![[0.5, 0.5]; count])
        .with_inserted_indices(Indices::U32(geometry.indices))
}

/// Unlit, double-sided label material.
pub fn label_material(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        unlit: true,
        cull_mode: None,
        alpha_mode: AlphaMode::Opaque,
        ..default()
    }
}
