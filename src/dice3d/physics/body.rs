//! Rigid body state for the dice of one roll.

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use crate::dice3d::meshes::{DieGeometry, GeometryCatalog};
use crate::dice3d::types::{DiceType, ThrowSettings};

use super::tray::{Tray, BOX_HALF_WIDTH};

/// Offset between neighbouring bodies' jitter directions.
const GOLDEN_ANGLE: f32 = 2.399_963;
const SPAWN_JITTER: f32 = 0.03;

#[derive(Clone, Debug)]
pub struct DieBody {
    pub kind: DiceType,
    pub geometry: Arc<DieGeometry>,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub settled: bool,
    /// Seconds spent continuously below the settle thresholds.
    pub settle_timer: f32,
    /// Resting on the floor (or a settled die) during the last sub-step.
    pub in_contact: bool,
    pub inverse_mass: f32,
    pub inverse_inertia: f32,
    /// Grid slot the body was thrown from; used to park it after a numerical blow-up.
    pub home: Vec3,
}

impl DieBody {
    /// Unit mass, inertia of a solid sphere of the bounding radius.
    pub fn new(geometry: Arc<DieGeometry>, position: Vec3, orientation: Quat) -> Self {
        let radius = geometry.bounding_radius;
        Self {
            kind: geometry.kind,
            geometry,
            position,
            orientation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            settled: false,
            settle_timer: 0.0,
            in_contact: false,
            inverse_mass: 1.0,
            inverse_inertia: 1.0 / (0.4 * radius * radius),
            home: position,
        }
    }

    pub fn radius(&self) -> f32 {
        self.geometry.bounding_radius
    }

    /// Hull extent along a world-space direction, measured from the centre.
    pub fn support(&self, direction: Vec3) -> f32 {
        self.geometry.support(self.orientation.inverse() * direction)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.orientation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
    }

    pub fn settle(&mut self) {
        self.settled = true;
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Knocked loose by a neighbour.
    pub fn wake(&mut self) {
        self.settled = false;
        self.settle_timer = 0.0;
    }

    /// Park the body flat on the floor, highest value up, at the free spot
    /// nearest its home slot. `others` are the centres and radii of the
    /// remaining bodies.
    pub fn reset_to_rest(&mut self, tray: &Tray, others: &[(Vec3, f32)]) {
        self.orientation = self.geometry.canonical_orientation;
        let height = tray.floor_y() + self.geometry.rest_height();
        let home = if self.home.is_finite() {
            self.home
        } else {
            Vec3::ZERO
        };
        self.position = free_floor_spot(home, height, self.radius(), others)
            .unwrap_or(Vec3::new(home.x, height, home.z));
        self.settle_timer = 0.0;
        self.in_contact = true;
        self.settle();
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

/// How the dice leave the hand.
#[derive(Clone, Debug, PartialEq)]
pub struct ThrowProfile {
    pub entry_point: Vec3,
    pub spacing: f32,
    pub direction: Vec3,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Radians.
    pub cone_half_angle: f32,
    pub spin: f32,
    pub randomize_orientation: bool,
}

impl Default for ThrowProfile {
    fn default() -> Self {
        Self::from(&ThrowSettings::default())
    }
}

impl From<&ThrowSettings> for ThrowProfile {
    fn from(settings: &ThrowSettings) -> Self {
        Self {
            entry_point: Vec3::from_array(settings.entry_point),
            spacing: settings.spacing,
            direction: Vec3::from_array(settings.direction),
            speed_min: settings.speed_min,
            speed_max: settings.speed_max,
            cone_half_angle: settings.cone_half_angle_degrees.to_radians(),
            spin: settings.spin,
            randomize_orientation: settings.randomize_orientation,
        }
    }
}

impl ThrowProfile {
    /// Release from rest in the canonical pose: no velocity, no spin.
    pub fn drop_in_place(entry_point: Vec3) -> Self {
        Self {
            entry_point,
            spacing: ThrowSettings::default().spacing,
            direction: Vec3::NEG_Y,
            speed_min: 0.0,
            speed_max: 0.0,
            cone_half_angle: 0.0,
            spin: 0.0,
            randomize_orientation: false,
        }
    }

    fn sample_velocity(&self, rng: &mut impl Rng) -> Vec3 {
        let (lo, hi) = if self.speed_min <= self.speed_max {
            (self.speed_min, self.speed_max)
        } else {
            (self.speed_max, self.speed_min)
        };
        let speed = rng.gen_range(lo.max(0.0)..=hi.max(0.0));
        if speed == 0.0 {
            return Vec3::ZERO;
        }

        let axis = self.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        let (a, b) = axis.any_orthonormal_pair();
        let cos_max = self.cone_half_angle.clamp(0.0, std::f32::consts::PI).cos();
        let cos_theta = rng.gen_range(cos_max..=1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = rng.gen_range(0.0..std::f32::consts::TAU);

        (axis * cos_theta + (a * phi.cos() + b * phi.sin()) * sin_theta) * speed
    }

    fn sample_spin(&self, rng: &mut impl Rng) -> Vec3 {
        let spin = self.spin.abs();
        Vec3::new(
            rng.gen_range(-spin..=spin),
            rng.gen_range(-spin..=spin),
            rng.gen_range(-spin..=spin),
        )
    }
}

/// Floor position at `height` for a sphere of `radius`, nearest to `home`,
/// that keeps clear of every body in `others`. `None` when the floor is full.
fn free_floor_spot(home: Vec3, height: f32, radius: f32, others: &[(Vec3, f32)]) -> Option<Vec3> {
    let limit = (BOX_HALF_WIDTH - radius).max(0.0);
    let step = radius.max(0.05);
    let cells = (2.0 * limit / step).floor() as i32;

    let mut candidates = vec![Vec3::new(
        home.x.clamp(-limit, limit),
        height,
        home.z.clamp(-limit, limit),
    )];
    for i in 0..=cells {
        for k in 0..=cells {
            candidates.push(Vec3::new(
                -limit + i as f32 * step,
                height,
                -limit + k as f32 * step,
            ));
        }
    }
    candidates.sort_by(|a, b| {
        a.distance_squared(home.with_y(height))
            .total_cmp(&b.distance_squared(home.with_y(height)))
    });

    candidates.into_iter().find(|spot| {
        others
            .iter()
            .filter(|(centre, _)| centre.is_finite())
            .all(|(centre, other)| spot.distance(*centre) >= radius + other)
    })
}

/// Offset of slot `index` in a centred, roughly square grid of `total` slots.
pub fn calculate_dice_position(index: usize, total: usize, spacing: f32) -> Vec3 {
    let cols = ((total as f32).sqrt().ceil() as usize).max(1);
    let rows = total.div_ceil(cols).max(1);
    let row = index / cols;
    let col = index % cols;

    let start_x = -((cols - 1) as f32 * spacing) / 2.0;
    let start_z = -((rows - 1) as f32 * spacing) / 2.0;

    Vec3::new(start_x + col as f32 * spacing, 0.0, start_z + row as f32 * spacing)
}

/// The bodies of the current roll, in die-list order.
#[derive(Clone, Debug, Default)]
pub struct BodyStore {
    bodies: Vec<DieBody>,
}

impl BodyStore {
    /// Replace the store's contents with one thrown body per kind.
    pub fn create_bodies(
        &mut self,
        kinds: &[DiceType],
        profile: &ThrowProfile,
        catalog: &GeometryCatalog,
        tray: &Tray,
        rng: &mut impl Rng,
    ) {
        self.bodies.clear();
        let total = kinds.len();
        if total == 0 {
            return;
        }

        let widest = kinds
            .iter()
            .map(|kind| kind.bounding_radius())
            .fold(0.0_f32, f32::max);
        // Shrink the grid when it would not fit between the walls.
        let cols = ((total as f32).sqrt().ceil() as usize).max(1);
        let room = 2.0 * (BOX_HALF_WIDTH - widest).max(0.0);
        let spacing = if cols > 1 {
            profile.spacing.min(room / (cols - 1) as f32)
        } else {
            profile.spacing
        };

        for (index, kind) in kinds.iter().enumerate() {
            let geometry = catalog.geometry(*kind);
            let jitter_angle = index as f32 * GOLDEN_ANGLE;
            let jitter = Vec3::new(jitter_angle.cos(), 0.0, jitter_angle.sin()) * SPAWN_JITTER;
            let slot = profile.entry_point + calculate_dice_position(index, total, spacing) + jitter;
            let position = tray.clamp_inside(slot, geometry.bounding_radius);

            let orientation = if profile.randomize_orientation {
                Quat::from_euler(
                    EulerRot::XYZ,
                    rng.gen_range(0.0..std::f32::consts::TAU),
                    rng.gen_range(0.0..std::f32::consts::TAU),
                    rng.gen_range(0.0..std::f32::consts::TAU),
                )
            } else {
                geometry.canonical_orientation
            };

            let mut body = DieBody::new(geometry, position, orientation);
            body.linear_velocity = profile.sample_velocity(rng);
            body.angular_velocity = profile.sample_spin(rng);
            self.bodies.push(body);
        }
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DieBody> {
        self.bodies.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DieBody> {
        self.bodies.iter()
    }

    pub fn as_slice(&self) -> &[DieBody] {
        &self.bodies
    }

    pub fn as_mut_slice(&mut self) -> &mut [DieBody] {
        &mut self.bodies
    }

    pub fn push(&mut self, body: DieBody) {
        self.bodies.push(body);
    }

    pub fn all_settled(&self) -> bool {
        self.bodies.iter().all(|body| body.settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn throw(kinds: &[DiceType], profile: &ThrowProfile) -> BodyStore {
        let mut store = BodyStore::default();
        let mut rng = StdRng::seed_from_u64(11);
        store.create_bodies(kinds, profile, &GeometryCatalog::default(), &Tray::default(), &mut rng);
        store
    }

    #[test]
    fn test_grid_positions_are_centred() {
        let a = calculate_dice_position(0, 4, 1.0);
        let d = calculate_dice_position(3, 4, 1.0);
        assert_eq!(a, Vec3::new(-0.5, 0.0, -0.5));
        assert_eq!(d, Vec3::new(0.5, 0.0, 0.5));
        assert_eq!(calculate_dice_position(0, 1, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_one_body_per_kind_inside_tray() {
        let kinds = [DiceType::D20; 12];
        let store = throw(&kinds, &ThrowProfile::default());
        let tray = Tray::default();
        assert_eq!(store.len(), 12);
        for body in store.iter() {
            assert!(tray.contains(body.position, body.radius() - 1e-4));
        }
    }

    #[test]
    fn test_no_two_bodies_share_a_centre() {
        let kinds = [DiceType::D6; 12];
        let store = throw(&kinds, &ThrowProfile::default());
        let bodies = store.as_slice();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                assert!(bodies[i].position.distance(bodies[j].position) > 1e-3);
            }
        }
    }

    #[test]
    fn test_throw_velocity_within_profile() {
        let profile = ThrowProfile::default();
        let store = throw(&[DiceType::D8; 6], &profile);
        let axis = profile.direction.normalize();
        for body in store.iter() {
            let speed = body.linear_velocity.length();
            assert!(speed >= profile.speed_min - 1e-4 && speed <= profile.speed_max + 1e-4);
            let angle = body.linear_velocity.normalize().dot(axis).clamp(-1.0, 1.0).acos();
            assert!(angle <= profile.cone_half_angle + 1e-3);
            assert!(body.angular_velocity.abs().max_element() <= profile.spin);
        }
    }

    #[test]
    fn test_drop_in_place_is_still() {
        let profile = ThrowProfile::drop_in_place(Vec3::new(0.0, 1.0, 0.0));
        let store = throw(&[DiceType::D6], &profile);
        let body = store.get(0).unwrap();
        assert_eq!(body.linear_velocity, Vec3::ZERO);
        assert_eq!(body.angular_velocity, Vec3::ZERO);
        assert_eq!(body.orientation, body.geometry.canonical_orientation);
    }

    #[test]
    fn test_reset_to_rest_parks_on_floor() {
        let store = throw(&[DiceType::D12], &ThrowProfile::default());
        let mut body = store.get(0).unwrap().clone();
        body.position = Vec3::NAN;
        body.reset_to_rest(&Tray::default(), &[]);
        assert!(body.is_finite());
        assert!(body.settled);
        assert!((body.position.y - body.geometry.rest_height()).abs() < 1e-6);
    }

    #[test]
    fn test_reset_to_rest_avoids_occupied_home() {
        let catalog = GeometryCatalog::default();
        let geometry = catalog.geometry(DiceType::D6);
        let mut body = DieBody::new(geometry.clone(), Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY);
        body.position = Vec3::NAN;

        let blocker = Vec3::new(0.0, geometry.rest_height(), 0.0);
        let others = [(blocker, geometry.bounding_radius)];
        body.reset_to_rest(&Tray::default(), &others);

        assert!(body.is_finite());
        assert!(body.settled);
        assert!(body.position.distance(blocker) >= 2.0 * geometry.bounding_radius);
        let limit = BOX_HALF_WIDTH - body.radius() + 1e-4;
        assert!(body.position.x.abs() <= limit && body.position.z.abs() <= limit);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = throw(&[DiceType::D4, DiceType::D10], &ThrowProfile::default());
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
        assert!(store.all_settled());
    }
}
