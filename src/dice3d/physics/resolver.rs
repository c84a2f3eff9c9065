//! Reads the face value a die shows.

use bevy::prelude::*;

use crate::dice3d::meshes::DieGeometry;

use super::body::DieBody;

/// Index of the value-table entry whose normal points most nearly up.
/// Ties go to the lowest index.
pub fn resolve_face_index(geometry: &DieGeometry, orientation: Quat) -> usize {
    let up = orientation.inverse() * Vec3::Y;
    let mut best_index = 0;
    let mut best_dot = f32::NEG_INFINITY;

    for (index, entry) in geometry.value_table.iter().enumerate() {
        let dot = entry.normal.dot(up);
        if dot > best_dot {
            best_dot = dot;
            best_index = index;
        }
    }

    best_index
}

pub fn resolve_face_value(body: &DieBody) -> u32 {
    let index = resolve_face_index(&body.geometry, body.orientation);
    body.geometry
        .value_table
        .get(index)
        .map(|entry| entry.value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::meshes::GeometryCatalog;
    use crate::dice3d::types::DiceType;

    #[test]
    fn test_each_face_reads_its_value_when_up() {
        let catalog = GeometryCatalog::default();
        for kind in DiceType::ALL {
            let geometry = catalog.geometry(kind);
            for (index, entry) in geometry.value_table.iter().enumerate() {
                let orientation = Quat::from_rotation_arc(entry.normal, Vec3::Y);
                let body = DieBody::new(geometry.clone(), Vec3::ZERO, orientation);
                assert_eq!(resolve_face_index(&geometry, orientation), index);
                assert_eq!(resolve_face_value(&body), entry.value, "{:?}", kind);
            }
        }
    }

    #[test]
    fn test_canonical_pose_reads_highest_value() {
        let catalog = GeometryCatalog::default();
        for kind in DiceType::ALL {
            let geometry = catalog.geometry(kind);
            let body = DieBody::new(geometry.clone(), Vec3::ZERO, geometry.canonical_orientation);
            assert_eq!(resolve_face_value(&body), kind.sides(), "{:?}", kind);
        }
    }

    #[test]
    fn test_d6_identity_reads_six() {
        let catalog = GeometryCatalog::default();
        let body = DieBody::new(catalog.geometry(DiceType::D6), Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(resolve_face_value(&body), 6);

        let tipped = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        // +Z rotates onto +Y.
        let body = DieBody::new(catalog.geometry(DiceType::D6), Vec3::ZERO, tipped.inverse());
        assert_eq!(resolve_face_value(&body), 2);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let catalog = GeometryCatalog::default();
        let geometry = catalog.geometry(DiceType::D6);
        // Balanced on the edge between +Y and +X faces.
        let edge = (Vec3::Y + Vec3::X).normalize();
        let orientation = Quat::from_rotation_arc(edge, Vec3::Y);
        let index = resolve_face_index(&geometry, orientation);
        let candidates: Vec<usize> = geometry
            .value_table
            .iter()
            .enumerate()
            .filter(|(_, e)| e.normal.dot(edge) > 0.7)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(candidates.len(), 2);
        assert_eq!(index, candidates[0]);
    }
}
