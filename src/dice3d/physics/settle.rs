//! Settle detection: a die is done once it has stayed slow for a short window.

use crate::dice3d::types::PhysicsSettings;

use super::body::DieBody;

/// Absorbs float drift when summing fixed sub-steps against the window.
const WINDOW_EPSILON: f32 = 1e-4;

/// Advance one body's settle timer by `dt`. Returns true when the body settles
/// on this call; its velocities are zeroed.
pub fn update_settle(body: &mut DieBody, dt: f32, settings: &PhysicsSettings) -> bool {
    if body.settled {
        return false;
    }

    let slow = body.linear_velocity.length() < settings.settle_linear_speed
        && body.angular_velocity.length() < settings.settle_angular_speed;

    if !slow {
        body.settle_timer = 0.0;
        return false;
    }

    body.settle_timer += dt;
    if body.settle_timer + WINDOW_EPSILON >= settings.settle_window {
        body.settle();
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::meshes::GeometryCatalog;
    use crate::dice3d::types::DiceType;
    use bevy::prelude::*;

    fn body() -> DieBody {
        let catalog = GeometryCatalog::default();
        DieBody::new(catalog.geometry(DiceType::D6), Vec3::ZERO, Quat::IDENTITY)
    }

    #[test]
    fn test_settles_after_window() {
        let settings = PhysicsSettings::default();
        let mut body = body();
        let dt = settings.sub_step;
        let steps = (settings.settle_window / dt).round() as usize;
        for _ in 0..steps - 1 {
            assert!(!update_settle(&mut body, dt, &settings));
        }
        assert!(update_settle(&mut body, dt, &settings));
        assert!(body.settled);
        assert!(!update_settle(&mut body, dt, &settings));
    }

    #[test]
    fn test_motion_resets_timer() {
        let settings = PhysicsSettings::default();
        let mut body = body();
        update_settle(&mut body, 0.2, &settings);
        assert!(body.settle_timer > 0.0);

        body.angular_velocity = Vec3::new(0.0, 1.0, 0.0);
        update_settle(&mut body, 0.2, &settings);
        assert_eq!(body.settle_timer, 0.0);
        assert!(!body.settled);
    }

    #[test]
    fn test_settling_zeroes_velocity() {
        let settings = PhysicsSettings::default();
        let mut body = body();
        body.linear_velocity = Vec3::new(0.01, 0.0, 0.0);
        update_settle(&mut body, settings.settle_window, &settings);
        assert!(body.settled);
        assert_eq!(body.linear_velocity, Vec3::ZERO);
    }
}
