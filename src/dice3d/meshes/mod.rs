//! Geometry catalog
//!
//! Each die kind is described once as a convex polyhedron (`dN` submodules).
//! From that description the catalog derives everything the rest of the crate
//! reads: scaled hull vertices for tray contact, outward face normals, the value
//! table used to read the result, the canonical resting pose, label placements
//! and the render mesh.

pub mod d10;
pub mod d12;
pub mod d20;
pub mod d4;
pub mod d6;
pub mod d8;

use std::sync::Arc;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::dice3d::types::{D10Labeling, DiceError, DiceType};

pub use d10::create_d10;
pub use d12::create_d12;
pub use d20::create_d20;
pub use d4::create_d4;
pub use d6::create_d6;
pub use d8::create_d8;

/// Unscaled polyhedron: vertices plus faces as vertex-index polygons.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
}

/// One row of the value table: when `normal` (body space) points up, the die
/// shows `value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceValue {
    pub normal: Vec3,
    pub value: u32,
}

/// Where a number label sits on the die, in body space.
#[derive(Clone, Copy, Debug)]
pub struct LabelPlacement {
    pub value: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub struct DieGeometry {
    pub kind: DiceType,
    /// Hull vertices, scaled so the farthest one sits on `bounding_radius`.
    pub vertices: Vec<Vec3>,
    /// Faces wound counter-clockwise seen from outside.
    pub faces: Vec<Vec<usize>>,
    pub face_normals: Vec<Vec3>,
    pub value_table: Vec<FaceValue>,
    pub bounding_radius: f32,
    /// Highest value up, resting flat on the opposite side.
    pub canonical_orientation: Quat,
    pub labels: Vec<LabelPlacement>,
}

impl DieGeometry {
    pub fn new(kind: DiceType, d10_labeling: D10Labeling) -> Self {
        let poly = create_polyhedron(kind);
        let radius = kind.bounding_radius();
        let farthest = poly
            .vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0_f32, f32::max);
        let vertices: Vec<Vec3> = poly
            .vertices
            .iter()
            .map(|v| *v * (radius / farthest))
            .collect();

        let mut faces = poly.faces;
        for face in faces.iter_mut() {
            wind_outward(&vertices, face);
        }
        let face_normals: Vec<Vec3> = faces.iter().map(|f| polygon_normal(&vertices, f)).collect();

        // A d4 lands face down with a vertex up; its readings follow the vertices.
        let reading_normals: Vec<Vec3> = if kind == DiceType::D4 {
            face_normals.iter().map(|n| -*n).collect()
        } else {
            face_normals.clone()
        };
        let values = default_values(kind, &reading_normals, d10_labeling);

        let mut geometry = Self {
            kind,
            vertices,
            faces,
            face_normals,
            value_table: reading_normals
                .into_iter()
                .map(|normal| FaceValue { normal, value: 0 })
                .collect(),
            bounding_radius: radius,
            canonical_orientation: Quat::IDENTITY,
            labels: Vec::new(),
        };
        geometry.assign_values(&values);
        geometry
    }

    /// Copy of this geometry with a different face→value mapping.
    /// `values[i]` is shown when face `i` reads up.
    pub fn with_values(&self, values: &[u32]) -> Result<Self, DiceError> {
        let sides = self.kind.sides() as usize;
        if values.len() != sides {
            return Err(DiceError::InvalidFaceValues {
                kind: self.kind,
                reason: format!("expected {} values, got {}", sides, values.len()),
            });
        }
        let mut seen = values.to_vec();
        seen.sort_unstable();
        if let Some(pair) = seen.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(DiceError::InvalidFaceValues {
                kind: self.kind,
                reason: format!("duplicate value {}", pair[0]),
            });
        }

        let mut geometry = self.clone();
        geometry.assign_values(values);
        Ok(geometry)
    }

    fn assign_values(&mut self, values: &[u32]) {
        for (entry, value) in self.value_table.iter_mut().zip(values) {
            entry.value = *value;
        }
        let top = self
            .value_table
            .iter()
            .max_by_key(|entry| entry.value)
            .map(|entry| entry.normal)
            .unwrap_or(Vec3::Y);
        self.canonical_orientation = Quat::from_rotation_arc(top, Vec3::Y);
        self.labels = self.place_labels();
    }

    pub fn sides(&self) -> usize {
        self.value_table.len()
    }

    /// Farthest extent of the hull along `direction` (body space, unit length).
    pub fn support(&self, direction: Vec3) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.dot(direction))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Height of the centre above the floor when resting in the canonical pose.
    pub fn rest_height(&self) -> f32 {
        self.support(self.canonical_orientation.inverse() * Vec3::NEG_Y)
    }

    fn centroid(&self, face: usize) -> Vec3 {
        let polygon = &self.faces[face];
        polygon.iter().map(|&i| self.vertices[i]).sum::<Vec3>() / polygon.len() as f32
    }

    fn place_labels(&self) -> Vec<LabelPlacement> {
        let scale = label_scale(self.kind);
        let mut labels = Vec::new();

        if self.kind == DiceType::D4 {
            // Three numbers per face, one near each corner; each corner carries
            // the value read when it points up.
            for (face, polygon) in self.faces.iter().enumerate() {
                let normal = self.face_normals[face];
                let centre = self.centroid(face);
                for &corner in polygon {
                    let Some(value) = self.corner_value(corner) else {
                        continue;
                    };
                    let toward = self.vertices[corner] - centre;
                    labels.push(LabelPlacement {
                        value,
                        translation: centre + toward * 0.55 + normal * 0.004,
                        rotation: label_rotation(normal, toward),
                        scale,
                    });
                }
            }
            return labels;
        }

        for (face, entry) in self.value_table.iter().enumerate() {
            let normal = self.face_normals[face];
            let reference = if normal.y.abs() > 0.9 { Vec3::Z } else { Vec3::Y };
            labels.push(LabelPlacement {
                value: entry.value,
                translation: self.centroid(face) + normal * 0.004,
                rotation: label_rotation(normal, reference),
                scale,
            });
        }
        labels
    }

    /// Value of the d4 face that does not touch `corner`.
    fn corner_value(&self, corner: usize) -> Option<u32> {
        self.faces
            .iter()
            .position(|polygon| !polygon.contains(&corner))
            .map(|face| self.value_table[face].value)
    }
}

/// Read-only per-kind geometry shared by every body of that kind.
#[derive(Clone, Debug)]
pub struct GeometryCatalog {
    entries: [Arc<DieGeometry>; 6],
}

impl Default for GeometryCatalog {
    fn default() -> Self {
        Self::new(D10Labeling::default())
    }
}

impl GeometryCatalog {
    pub fn new(d10_labeling: D10Labeling) -> Self {
        Self {
            entries: DiceType::ALL.map(|kind| Arc::new(DieGeometry::new(kind, d10_labeling))),
        }
    }

    pub fn get(&self, kind: DiceType) -> &DieGeometry {
        &self.entries[catalog_index(kind)]
    }

    pub fn geometry(&self, kind: DiceType) -> Arc<DieGeometry> {
        Arc::clone(&self.entries[catalog_index(kind)])
    }

    /// Replace one kind's face→value mapping (e.g. a house d10 convention).
    pub fn with_face_values(mut self, kind: DiceType, values: &[u32]) -> Result<Self, DiceError> {
        let updated = self.get(kind).with_values(values)?;
        self.entries[catalog_index(kind)] = Arc::new(updated);
        Ok(self)
    }
}

fn catalog_index(kind: DiceType) -> usize {
    match kind {
        DiceType::D4 => 0,
        DiceType::D6 => 1,
        DiceType::D8 => 2,
        DiceType::D10 => 3,
        DiceType::D12 => 4,
        DiceType::D20 => 5,
    }
}

pub fn create_polyhedron(kind: DiceType) -> Polyhedron {
    match kind {
        DiceType::D4 => create_d4(),
        DiceType::D6 => create_d6(),
        DiceType::D8 => create_d8(),
        DiceType::D10 => create_d10(),
        DiceType::D12 => create_d12(),
        DiceType::D20 => create_d20(),
    }
}

/// Opposite faces sum to `sides + 1` (d10 zero-based: to 9). The d4 has no
/// opposite faces and is numbered in face order.
fn default_values(kind: DiceType, normals: &[Vec3], d10_labeling: D10Labeling) -> Vec<u32> {
    let sides = kind.sides();
    if kind == DiceType::D4 {
        return (1..=sides).collect();
    }

    let mut values = vec![0_u32; normals.len()];
    let mut next = 1;
    for face in 0..normals.len() {
        if values[face] != 0 {
            continue;
        }
        values[face] = next;
        if let Some(opposite) = normals
            .iter()
            .position(|other| other.dot(normals[face]) < -0.999)
        {
            values[opposite] = sides + 1 - next;
        }
        next += 1;
    }

    if kind == DiceType::D10 && d10_labeling == D10Labeling::ZeroToNine {
        for value in values.iter_mut() {
            *value -= 1;
        }
    }
    values
}

/// All triangles whose three edges have length `edge`.
pub(crate) fn triangle_faces(vertices: &[Vec3], edge: f32) -> Vec<Vec<usize>> {
    let tolerance = edge * 1e-3;
    let adjacent = |a: usize, b: usize| ((vertices[a] - vertices[b]).length() - edge).abs() < tolerance;
    let n = vertices.len();
    let mut faces = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if !adjacent(i, j) {
                continue;
            }
            for k in (j + 1)..n {
                if adjacent(i, k) && adjacent(j, k) {
                    faces.push(vec![i, j, k]);
                }
            }
        }
    }
    faces
}

/// Sort a face's vertices counter-clockwise around its outward direction.
fn wind_outward(vertices: &[Vec3], face: &mut [usize]) {
    let centre = face.iter().map(|&i| vertices[i]).sum::<Vec3>() / face.len() as f32;
    let outward = centre.normalize();
    let u = (vertices[face[0]] - centre).normalize();
    let w = outward.cross(u);
    let angle = |i: usize| {
        let d = vertices[i] - centre;
        d.dot(w).atan2(d.dot(u))
    };
    face.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
}

fn polygon_normal(vertices: &[Vec3], face: &[usize]) -> Vec3 {
    let v0 = vertices[face[0]];
    let normal = (vertices[face[1]] - v0)
        .cross(vertices[face[2]] - v0)
        .normalize();
    let centre = face.iter().map(|&i| vertices[i]).sum::<Vec3>();
    if normal.dot(centre) < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Label frame: +Z along the face normal, +Y toward `up` projected onto the face.
fn label_rotation(normal: Vec3, up: Vec3) -> Quat {
    let y = (up - normal * up.dot(normal)).normalize();
    let x = y.cross(normal);
    Quat::from_mat3(&Mat3::from_cols(x, y, normal))
}

fn label_scale(kind: DiceType) -> f32 {
    match kind {
        DiceType::D4 => 0.09,
        DiceType::D6 => 0.22,
        DiceType::D8 => 0.16,
        DiceType::D10 => 0.13,
        DiceType::D12 => 0.14,
        DiceType::D20 => 0.11,
    }
}

/// Flat-shaded render mesh of the hull.
pub fn create_die_mesh(geometry: &DieGeometry) -> Mesh {
    let mut positions = Vec::new();
    let mut normals = Vec::new();

    for (face, polygon) in geometry.faces.iter().enumerate() {
        let n = geometry.face_normals[face].to_array();
        let v0 = geometry.vertices[polygon[0]];
        for pair in polygon[1..].windows(2) {
            positions.push(v0.to_array());
            positions.push(geometry.vertices[pair[0]].to_array());
            positions.push(geometry.vertices[pair[1]].to_array());
            normals.extend([n, n, n]);
        }
    }

    let num_vertices = positions.len();
    let indices: Vec<u32> = (0..num_vertices as u32).collect();
    let uvs: Vec<[f32; 2]> = positions.iter().map(|_| [0.5, 0.5]).collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}
