//! Fixed-step integrator and contact handling
//!
//! Each sub-step runs, in order: forces and integration, tray contacts,
//! die-die contacts, settle detection. Impacts are pushed onto the caller's
//! event queue; the stepper keeps nothing but its time accumulator.

use bevy::log::{debug, warn};
use bevy::prelude::*;

use crate::dice3d::types::PhysicsSettings;

use super::body::DieBody;
use super::resolver::resolve_face_index;
use super::settle::update_settle;
use super::tray::Tray;

/// Reading normals this close to vertical need no righting torque.
const ALIGNED_SIN: f32 = 1e-6;
/// Tray contacts whose normal is at least this vertical count as support.
const SUPPORT_NORMAL_Y: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionTarget {
    Tray,
    Die(usize),
}

/// One impact during a sub-step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionEvent {
    pub body: usize,
    pub other: CollisionTarget,
    /// Closing speed along the contact normal, m/s.
    pub impact_speed: f32,
    pub point: Vec3,
}

#[derive(Clone, Debug)]
pub struct PhysicsStepper {
    settings: PhysicsSettings,
    tray: Tray,
    accumulator: f32,
}

impl PhysicsStepper {
    pub fn new(settings: PhysicsSettings, tray: Tray) -> Self {
        Self {
            settings,
            tray,
            accumulator: 0.0,
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Feed one frame's worth of time and run the sub-steps it pays for.
    /// Returns the number of sub-steps taken.
    pub fn advance(
        &mut self,
        bodies: &mut [DieBody],
        frame_dt: f32,
        events: &mut Vec<CollisionEvent>,
    ) -> u32 {
        let sub_step = self.settings.sub_step;
        if !(sub_step > 0.0) {
            return 0;
        }
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let mut steps = 0;
        while self.accumulator >= sub_step && steps < self.settings.max_substeps_per_frame {
            self.step(bodies, events);
            self.accumulator -= sub_step;
            steps += 1;
        }

        if self.accumulator >= sub_step {
            debug!(
                "Dropping {:.3}s of simulation time after {} sub-steps",
                self.accumulator, steps
            );
            self.accumulator = 0.0;
        }
        steps
    }

    /// One fixed sub-step over every body.
    pub fn step(&self, bodies: &mut [DieBody], events: &mut Vec<CollisionEvent>) {
        let dt = self.settings.sub_step;

        for body in bodies.iter_mut().filter(|body| !body.settled) {
            self.integrate(body, dt);
        }

        for (index, body) in bodies.iter_mut().enumerate() {
            if body.settled {
                continue;
            }
            body.in_contact = false;
            self.collide_with_tray(index, body, events);
        }

        self.collide_bodies(bodies, events);

        for index in 0..bodies.len() {
            if bodies[index].settled {
                continue;
            }
            if !bodies[index].is_finite() {
                warn!(
                    "{} #{} hit a non-finite state; parking it at rest",
                    bodies[index].kind.name(),
                    index
                );
                let others: Vec<(Vec3, f32)> = bodies
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .map(|(_, body)| (body.position, body.radius()))
                    .collect();
                bodies[index].reset_to_rest(&self.tray, &others);
                continue;
            }
            update_settle(&mut bodies[index], dt, &self.settings);
        }
    }

    fn integrate(&self, body: &mut DieBody, dt: f32) {
        let s = &self.settings;

        body.linear_velocity += self.tray.gravity * dt;
        body.linear_velocity *= 1.0 / (1.0 + s.linear_damping * dt);

        let mut angular_damping = s.angular_damping;
        if body.in_contact {
            angular_damping += s.contact_angular_damping;
            self.apply_face_alignment(body, dt);
        }
        body.angular_velocity *= 1.0 / (1.0 + angular_damping * dt);

        body.linear_velocity = body.linear_velocity.clamp_length_max(s.max_linear_speed);
        body.angular_velocity = body.angular_velocity.clamp_length_max(s.max_angular_speed);

        body.position += body.linear_velocity * dt;
        let w = body.angular_velocity;
        let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.orientation;
        body.orientation = (body.orientation + spin * (0.5 * dt)).normalize();
    }

    /// Tip a resting die toward the face nearest to up so it cannot balance on
    /// an edge or vertex.
    fn apply_face_alignment(&self, body: &mut DieBody, dt: f32) {
        let index = resolve_face_index(&body.geometry, body.orientation);
        let Some(entry) = body.geometry.value_table.get(index) else {
            return;
        };
        let reading = body.orientation * entry.normal;
        let axis = reading.cross(Vec3::Y);
        let sin = axis.length();
        if sin < ALIGNED_SIN {
            return;
        }
        let angle = sin.atan2(reading.dot(Vec3::Y));
        body.angular_velocity +=
            axis / sin * angle * self.settings.face_alignment_stiffness * dt;
    }

    fn collide_with_tray(&self, index: usize, body: &mut DieBody, events: &mut Vec<CollisionEvent>) {
        let s = &self.settings;
        if !body.is_finite() {
            return;
        }
        let radius = body.radius();

        for plane in &self.tray.planes {
            if plane.distance(body.position) > radius {
                continue;
            }
            let n = plane.normal;
            let reach = body.support(-n);
            let penetration = reach - plane.distance(body.position);
            if penetration <= 0.0 {
                continue;
            }

            body.position += n * penetration;
            if n.y > SUPPORT_NORMAL_Y {
                body.in_contact = true;
            }

            let approach = -body.linear_velocity.dot(n);
            if approach <= 0.0 {
                continue;
            }
            let restitution = if approach < s.resting_speed {
                0.0
            } else {
                s.tray_restitution
            };
            let normal_impulse = (1.0 + restitution) * approach / body.inverse_mass;
            body.linear_velocity += n * normal_impulse * body.inverse_mass;

            let lever = -n * reach;
            apply_friction(body, n, lever, normal_impulse, s.friction);

            events.push(CollisionEvent {
                body: index,
                other: CollisionTarget::Tray,
                impact_speed: approach,
                point: body.position + lever,
            });
        }
    }

    fn collide_bodies(&self, bodies: &mut [DieBody], events: &mut Vec<CollisionEvent>) {
        let s = &self.settings;
        let count = bodies.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let (head, tail) = bodies.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];
                if (a.settled && b.settled) || !a.is_finite() || !b.is_finite() {
                    continue;
                }

                let delta = b.position - a.position;
                let reach = a.radius() + b.radius();
                let distance_sq = delta.length_squared();
                if distance_sq >= reach * reach {
                    continue;
                }
                let distance = distance_sq.sqrt();
                // Points from a toward b.
                let normal = if distance > 1e-6 {
                    delta / distance
                } else {
                    fallback_axis(i, j, count)
                };

                let approach = (a.linear_velocity - b.linear_velocity).dot(normal);
                if a.settled && approach > s.wake_speed {
                    a.wake();
                }
                if b.settled && approach > s.wake_speed {
                    b.wake();
                }

                let inv_a = if a.settled { 0.0 } else { a.inverse_mass };
                let inv_b = if b.settled { 0.0 } else { b.inverse_mass };
                let inv_sum = inv_a + inv_b;
                if inv_sum <= 0.0 {
                    continue;
                }

                let correction = normal * ((reach - distance) / inv_sum);
                a.position -= correction * inv_a;
                b.position += correction * inv_b;

                let mut normal_impulse = 0.0;
                if approach > 0.0 {
                    let restitution = if approach < s.resting_speed {
                        0.0
                    } else {
                        s.die_restitution
                    };
                    normal_impulse = (1.0 + restitution) * approach / inv_sum;
                    a.linear_velocity -= normal * normal_impulse * inv_a;
                    b.linear_velocity += normal * normal_impulse * inv_b;

                    events.push(CollisionEvent {
                        body: i,
                        other: CollisionTarget::Die(j),
                        impact_speed: approach,
                        point: a.position + normal * a.radius(),
                    });
                }

                // A die lying on a settled one is supported like on the floor.
                if a.settled {
                    rest_on(b, normal, normal_impulse, s.friction);
                } else if b.settled {
                    rest_on(a, -normal, normal_impulse, s.friction);
                }
            }
        }
    }
}

/// Contact response for `body` touching a static obstacle; `normal` points
/// from the obstacle toward the body.
fn rest_on(body: &mut DieBody, normal: Vec3, normal_impulse: f32, friction: f32) {
    if normal.y > SUPPORT_NORMAL_Y {
        body.in_contact = true;
    }
    if normal_impulse > 0.0 {
        let lever = -normal * body.radius();
        apply_friction(body, normal, lever, normal_impulse, friction);
    }
}

/// Coulomb friction at the contact point `body.position + lever`, capped so
/// the contact never reverses its slip.
fn apply_friction(body: &mut DieBody, normal: Vec3, lever: Vec3, normal_impulse: f32, friction: f32) {
    let contact_velocity = body.linear_velocity + body.angular_velocity.cross(lever);
    let slip = contact_velocity - normal * contact_velocity.dot(normal);
    let slip_speed = slip.length();
    if slip_speed < 1e-6 {
        return;
    }
    let tangent = slip / slip_speed;
    let arm = lever.cross(tangent);
    let effective = body.inverse_mass + arm.length_squared() * body.inverse_inertia;
    let magnitude = (friction * normal_impulse).min(slip_speed / effective);

    let impulse = -tangent * magnitude;
    body.linear_velocity += impulse * body.inverse_mass;
    body.angular_velocity += lever.cross(impulse) * body.inverse_inertia;
}

/// Horizontal separation axis for two bodies that share a centre.
fn fallback_axis(i: usize, j: usize, count: usize) -> Vec3 {
    let angle = (i * count + j) as f32 * 2.399_963;
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::meshes::GeometryCatalog;
    use crate::dice3d::physics::resolver::resolve_face_value;
    use crate::dice3d::types::DiceType;

    fn stepper() -> PhysicsStepper {
        let settings = PhysicsSettings::default();
        let tray = Tray::new(settings.gravity());
        PhysicsStepper::new(settings, tray)
    }

    fn resting(kind: DiceType, x: f32) -> DieBody {
        let catalog = GeometryCatalog::default();
        let geometry = catalog.geometry(kind);
        let height = geometry.rest_height();
        let orientation = geometry.canonical_orientation;
        DieBody::new(geometry, Vec3::new(x, height, 0.0), orientation)
    }

    #[test]
    fn test_flush_body_settles_within_one_window() {
        let stepper = stepper();
        let mut bodies = vec![resting(DiceType::D8, 0.0)];
        let mut events = Vec::new();
        let window = (stepper.settings().settle_window / stepper.settings().sub_step).ceil() as usize;
        for _ in 0..window + 1 {
            stepper.step(&mut bodies, &mut events);
        }
        assert!(bodies[0].settled);
        assert_eq!(resolve_face_value(&bodies[0]), 8);
    }

    #[test]
    fn test_resting_contact_events_are_slow() {
        let stepper = stepper();
        let mut bodies = vec![resting(DiceType::D6, 0.0)];
        let mut events = Vec::new();
        for _ in 0..10 {
            stepper.step(&mut bodies, &mut events);
        }
        assert!(events.iter().all(|e| e.impact_speed < 0.35));
    }

    #[test]
    fn test_dropped_die_bounces_and_reports_impact() {
        let stepper = stepper();
        let mut body = resting(DiceType::D20, 0.0);
        body.position.y = 1.5;
        let mut bodies = vec![body];
        let mut events = Vec::new();
        for _ in 0..240 {
            stepper.step(&mut bodies, &mut events);
        }
        let hardest = events
            .iter()
            .map(|e| e.impact_speed)
            .fold(0.0_f32, f32::max);
        assert!(hardest > 3.0, "hardest impact {}", hardest);
        assert!(events.iter().all(|e| e.other == CollisionTarget::Tray));
        assert!(bodies[0].position.y > 0.0);
    }

    #[test]
    fn test_orientation_stays_unit_length() {
        let stepper = stepper();
        let mut body = resting(DiceType::D12, 0.0);
        body.position.y = 2.0;
        body.linear_velocity = Vec3::new(3.0, 1.0, -2.0);
        body.angular_velocity = Vec3::new(30.0, -25.0, 12.0);
        let mut bodies = vec![body];
        let mut events = Vec::new();
        for _ in 0..10_000 {
            stepper.step(&mut bodies, &mut events);
            assert!((bodies[0].orientation.length() - 1.0).abs() < 1e-5);
            events.clear();
        }
    }

    #[test]
    fn test_overlapping_dice_separate() {
        let stepper = stepper();
        let mut bodies = vec![resting(DiceType::D6, 0.0), resting(DiceType::D6, 0.0)];
        let mut events = Vec::new();
        for _ in 0..3 {
            stepper.step(&mut bodies, &mut events);
        }
        let gap = bodies[0].position.distance(bodies[1].position);
        assert!(gap >= bodies[0].radius() + bodies[1].radius() - 1e-3, "gap {}", gap);
        assert!(bodies.iter().all(DieBody::is_finite));
    }

    #[test]
    fn test_fast_neighbour_wakes_settled_die() {
        let stepper = stepper();
        let mut still = resting(DiceType::D6, 0.0);
        still.settle();
        let mut mover = resting(DiceType::D6, -0.9);
        mover.linear_velocity = Vec3::new(4.0, 0.0, 0.0);
        let mut bodies = vec![still, mover];
        let mut events = Vec::new();
        stepper.step(&mut bodies, &mut events);
        assert!(!bodies[0].settled);
        for _ in 0..5 {
            stepper.step(&mut bodies, &mut events);
        }
        assert!(events
            .iter()
            .any(|e| matches!(e.other, CollisionTarget::Die(_))));
        assert!(bodies[0].position.x > 0.0);
    }

    #[test]
    fn test_slow_neighbour_does_not_wake_settled_die() {
        let stepper = stepper();
        let mut still = resting(DiceType::D6, 0.0);
        still.settle();
        let mut mover = resting(DiceType::D6, -0.97);
        mover.linear_velocity = Vec3::new(0.3, 0.0, 0.0);
        let mut bodies = vec![still, mover];
        let mut events = Vec::new();
        for _ in 0..20 {
            stepper.step(&mut bodies, &mut events);
        }
        assert!(bodies[0].settled);
        assert_eq!(bodies[0].position.x, 0.0);
    }

    #[test]
    fn test_non_finite_body_is_parked() {
        let stepper = stepper();
        let mut body = resting(DiceType::D10, 0.5);
        body.linear_velocity = Vec3::new(f32::NAN, 0.0, 0.0);
        let mut bodies = vec![body];
        let mut events = Vec::new();
        stepper.step(&mut bodies, &mut events);
        assert!(bodies[0].settled);
        assert!(bodies[0].is_finite());
        assert_eq!(resolve_face_value(&bodies[0]), 10);
    }

    #[test]
    fn test_non_finite_body_is_parked_clear_of_resting_die() {
        let stepper = stepper();
        let mut lost = resting(DiceType::D6, 0.0);
        lost.home = Vec3::new(0.0, 2.0, 0.0);
        lost.linear_velocity = Vec3::NAN;
        let mut still = resting(DiceType::D6, 0.0);
        still.settle();
        let mut bodies = vec![lost, still];
        let mut events = Vec::new();
        for _ in 0..5 {
            stepper.step(&mut bodies, &mut events);
        }
        assert!(bodies.iter().all(|body| body.settled && body.is_finite()));
        let gap = bodies[0].position.distance(bodies[1].position);
        assert!(gap >= bodies[0].radius() + bodies[1].radius() - 1e-4, "gap {}", gap);
        assert_eq!(resolve_face_value(&bodies[0]), 6);
    }

    #[test]
    fn test_advance_caps_substeps() {
        let mut stepper = stepper();
        let mut bodies = vec![resting(DiceType::D4, 0.0)];
        let mut events = Vec::new();
        assert_eq!(stepper.advance(&mut bodies, 1.0, &mut events), 8);
        // Surplus time was dropped, not carried into the next frame.
        assert_eq!(stepper.advance(&mut bodies, 0.0, &mut events), 0);
        assert_eq!(stepper.advance(&mut bodies, 1.0 / 60.0, &mut events), 2);
    }

    #[test]
    fn test_advance_ignores_bad_frame_times() {
        let mut stepper = stepper();
        let mut bodies = vec![resting(DiceType::D4, 0.0)];
        let mut events = Vec::new();
        assert_eq!(stepper.advance(&mut bodies, f32::NAN, &mut events), 0);
        assert_eq!(stepper.advance(&mut bodies, -1.0, &mut events), 0);
    }
}
