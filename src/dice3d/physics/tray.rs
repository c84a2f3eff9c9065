//! The closed tray the dice are thrown into.

use bevy::prelude::*;

/// Half extent of the square floor; walls stand at x, z = ±BOX_HALF_WIDTH.
pub const BOX_HALF_WIDTH: f32 = 2.0;
pub const BOX_FLOOR_Y: f32 = 0.0;
/// Invisible lid that keeps hard throws inside.
pub const BOX_CEILING_Y: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayPlaneKind {
    Floor,
    Wall,
    Ceiling,
}

/// Half-space boundary; `normal` points into the tray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrayPlane {
    pub kind: TrayPlaneKind,
    pub normal: Vec3,
    pub offset: f32,
}

impl TrayPlane {
    pub fn new(kind: TrayPlaneKind, normal: Vec3, offset: f32) -> Self {
        Self {
            kind,
            normal,
            offset,
        }
    }

    /// Signed distance from the plane; positive inside the tray.
    pub fn distance(&self, point: Vec3) -> f32 {
        point.dot(self.normal) - self.offset
    }
}

/// Static collision geometry plus gravity. Never changes during a session.
#[derive(Clone, Debug)]
pub struct Tray {
    pub planes: Vec<TrayPlane>,
    pub gravity: Vec3,
}

impl Default for Tray {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl Tray {
    pub fn new(gravity: Vec3) -> Self {
        let planes = vec![
            TrayPlane::new(TrayPlaneKind::Floor, Vec3::Y, BOX_FLOOR_Y),
            TrayPlane::new(TrayPlaneKind::Ceiling, Vec3::NEG_Y, -BOX_CEILING_Y),
            TrayPlane::new(TrayPlaneKind::Wall, Vec3::X, -BOX_HALF_WIDTH),
            TrayPlane::new(TrayPlaneKind::Wall, Vec3::NEG_X, -BOX_HALF_WIDTH),
            TrayPlane::new(TrayPlaneKind::Wall, Vec3::Z, -BOX_HALF_WIDTH),
            TrayPlane::new(TrayPlaneKind::Wall, Vec3::NEG_Z, -BOX_HALF_WIDTH),
        ];
        Self { planes, gravity }
    }

    pub fn floor_y(&self) -> f32 {
        BOX_FLOOR_Y
    }

    /// Whether a sphere of `radius` at `point` fits entirely inside.
    pub fn contains(&self, point: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| plane.distance(point) >= radius)
    }

    /// Move `point` so a sphere of `radius` around it fits inside the tray.
    pub fn clamp_inside(&self, point: Vec3, radius: f32) -> Vec3 {
        let limit = (BOX_HALF_WIDTH - radius).max(0.0);
        Vec3::new(
            point.x.clamp(-limit, limit),
            point.y.clamp(BOX_FLOOR_Y + radius, (BOX_CEILING_Y - radius).max(BOX_FLOOR_Y + radius)),
            point.z.clamp(-limit, limit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_face_inward() {
        let tray = Tray::default();
        let centre = Vec3::new(0.0, BOX_CEILING_Y / 2.0, 0.0);
        for plane in &tray.planes {
            assert!(plane.distance(centre) > 0.0, "{:?}", plane);
        }
    }

    #[test]
    fn test_clamp_inside() {
        let tray = Tray::default();
        let clamped = tray.clamp_inside(Vec3::new(5.0, -1.0, -5.0), 0.5);
        assert_eq!(clamped, Vec3::new(1.5, 0.5, -1.5));
        assert!(tray.contains(clamped, 0.5));
        assert!(!tray.contains(Vec3::new(1.9, 1.0, 0.0), 0.5));
    }
}
