//! Roll session controller
//!
//! [`DiceRoller`] owns the simulation. The host hands it the current die list
//! and roll trigger once per frame; it decides when a roll starts over, steps
//! the physics, and commits the result exactly once per session.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dice3d::meshes::GeometryCatalog;
use crate::dice3d::physics::{
    resolve_face_value, BodyStore, CollisionEvent, DieBody, PhysicsStepper, ThrowProfile, Tray,
};
use crate::dice3d::types::{DiceSettings, DiceType, RollResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollPhase {
    /// Bodies placed; shown once at their spawn pose before any physics.
    Spawning,
    Settling,
    Resolved,
}

#[derive(Clone, Debug)]
pub struct RollSession {
    pub id: u64,
    pub trigger: u64,
    pub kinds: Vec<DiceType>,
    pub phase: RollPhase,
    pub store: BodyStore,
    /// Simulated seconds since physics started.
    pub elapsed: f32,
    pub results_committed: bool,
}

/// What the host currently wants rolled.
#[derive(Clone, Copy, Debug)]
pub struct RollInput<'a> {
    pub kinds: &'a [DiceType],
    pub trigger: u64,
}

/// Everything one `update` produced for the bridge.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    pub events: Vec<CollisionEvent>,
    pub result: Option<RollResult>,
    /// A new session replaced the previous one during this update.
    pub new_session: bool,
}

#[derive(Resource)]
pub struct DiceRoller {
    settings: DiceSettings,
    catalog: GeometryCatalog,
    stepper: PhysicsStepper,
    profile: ThrowProfile,
    rng: StdRng,
    session: Option<RollSession>,
    last_trigger: Option<u64>,
    next_session_id: u64,
    last_result: Option<RollResult>,
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self::new(DiceSettings::default())
    }
}

impl DiceRoller {
    pub fn new(settings: DiceSettings) -> Self {
        let tray = Tray::new(settings.physics.gravity());
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog: GeometryCatalog::new(settings.d10_labeling),
            stepper: PhysicsStepper::new(settings.physics.clone(), tray),
            profile: ThrowProfile::from(&settings.throw),
            rng,
            session: None,
            last_trigger: None,
            next_session_id: 1,
            last_result: None,
            settings,
        }
    }

    /// Use a custom catalog (e.g. with house face values). Takes effect from
    /// the next session.
    pub fn with_catalog(mut self, catalog: GeometryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_throw_profile(mut self, profile: ThrowProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn settings(&self) -> &DiceSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &GeometryCatalog {
        &self.catalog
    }

    pub fn tray(&self) -> &Tray {
        self.stepper.tray()
    }

    pub fn phase(&self) -> Option<RollPhase> {
        self.session.as_ref().map(|session| session.phase)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.id)
    }

    pub fn session(&self) -> Option<&RollSession> {
        self.session.as_ref()
    }

    pub fn bodies(&self) -> &[DieBody] {
        self.session
            .as_ref()
            .map(|session| session.store.as_slice())
            .unwrap_or(&[])
    }

    /// Most recent committed result, kept until the next one.
    pub fn last_result(&self) -> Option<&RollResult> {
        self.last_result.as_ref()
    }

    /// Advance by one rendered frame.
    pub fn update(&mut self, input: &RollInput, frame_dt: f32) -> FrameOutput {
        let mut output = FrameOutput::default();

        let trigger_changed = self.last_trigger != Some(input.trigger);
        let kinds_changed = self
            .session
            .as_ref()
            .is_some_and(|session| session.kinds.as_slice() != input.kinds);

        if trigger_changed || kinds_changed || self.session.is_none() {
            self.last_trigger = Some(input.trigger);
            self.start_session(input);
            output.new_session = true;
            if input.kinds.is_empty() {
                output.result = self.commit();
            }
            return output;
        }

        let Some(session) = self.session.as_mut() else {
            return output;
        };

        let phase = session.phase;
        match phase {
            RollPhase::Spawning => {
                session.phase = RollPhase::Settling;
            }
            RollPhase::Settling => {
                let steps = self.stepper.advance(
                    session.store.as_mut_slice(),
                    frame_dt,
                    &mut output.events,
                );
                session.elapsed += steps as f32 * self.settings.physics.sub_step;

                if !session.store.all_settled()
                    && session.elapsed >= self.settings.physics.max_roll_seconds
                {
                    warn!(
                        "Roll {} still moving after {:.1}s; settling in place",
                        session.id, session.elapsed
                    );
                    for body in session.store.as_mut_slice() {
                        body.settle();
                    }
                }

                if session.store.all_settled() {
                    output.result = self.commit();
                }
            }
            RollPhase::Resolved => {}
        }

        output
    }

    fn start_session(&mut self, input: &RollInput) {
        let id = self.next_session_id;
        self.next_session_id += 1;

        if let Some(previous) = &self.session {
            if !previous.results_committed {
                debug!("Discarding unfinished roll {}", previous.id);
            }
        }

        let mut store = BodyStore::default();
        store.create_bodies(
            input.kinds,
            &self.profile,
            &self.catalog,
            self.stepper.tray(),
            &mut self.rng,
        );
        self.stepper.reset();

        info!("Starting roll {} with {} dice", id, store.len());
        self.session = Some(RollSession {
            id,
            trigger: input.trigger,
            kinds: input.kinds.to_vec(),
            phase: RollPhase::Spawning,
            store,
            elapsed: 0.0,
            results_committed: false,
        });
    }

    /// Read every body once and mark the session resolved. No-op if already done.
    fn commit(&mut self) -> Option<RollResult> {
        let session = self.session.as_mut()?;
        if session.results_committed {
            return None;
        }

        let values: Vec<u32> = session.store.iter().map(resolve_face_value).collect();
        session.phase = RollPhase::Resolved;
        session.results_committed = true;

        let result = RollResult {
            session_id: session.id,
            trigger: session.trigger,
            values,
        };
        info!(
            "Roll {} resolved: {:?} (total {})",
            result.session_id,
            result.values,
            result.total()
        );
        self.last_result = Some(result.clone());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn seeded() -> DiceRoller {
        DiceRoller::new(DiceSettings {
            seed: Some(42),
            ..Default::default()
        })
    }

    #[test]
    fn test_first_update_spawns_without_physics() {
        let mut roller = seeded();
        let kinds = [DiceType::D6];
        let input = RollInput { kinds: &kinds, trigger: 0 };
        let out = roller.update(&input, FRAME);
        assert!(out.new_session);
        assert!(out.events.is_empty());
        assert_eq!(roller.phase(), Some(RollPhase::Spawning));

        let spawn = roller.bodies()[0].position;
        roller.update(&input, FRAME);
        assert_eq!(roller.phase(), Some(RollPhase::Settling));
        assert_eq!(roller.bodies()[0].position, spawn);
    }

    #[test]
    fn test_empty_list_resolves_immediately() {
        let mut roller = seeded();
        let out = roller.update(&RollInput { kinds: &[], trigger: 3 }, FRAME);
        assert_eq!(roller.phase(), Some(RollPhase::Resolved));
        let result = out.result.unwrap();
        assert!(result.values.is_empty());
        assert_eq!(result.trigger, 3);
    }

    #[test]
    fn test_material_only_input_does_not_reset() {
        let mut roller = seeded();
        let kinds = [DiceType::D8, DiceType::D8];
        let input = RollInput { kinds: &kinds, trigger: 1 };
        roller.update(&input, FRAME);
        let id = roller.session_id();
        for _ in 0..5 {
            let out = roller.update(&input, FRAME);
            assert!(!out.new_session);
        }
        assert_eq!(roller.session_id(), id);
    }

    #[test]
    fn test_kind_change_restarts_under_same_trigger() {
        let mut roller = seeded();
        roller.update(&RollInput { kinds: &[DiceType::D6], trigger: 9 }, FRAME);
        let first = roller.session_id();
        let out = roller.update(
            &RollInput {
                kinds: &[DiceType::D6, DiceType::D20],
                trigger: 9,
            },
            FRAME,
        );
        assert!(out.new_session);
        assert_ne!(roller.session_id(), first);
        assert_eq!(roller.session().unwrap().trigger, 9);
        assert_eq!(roller.bodies().len(), 2);
    }

    #[test]
    fn test_result_committed_once() {
        let mut roller = seeded();
        let kinds = [DiceType::D4, DiceType::D12];
        let input = RollInput { kinds: &kinds, trigger: 1 };
        let mut results = Vec::new();
        for _ in 0..(12 * 60) {
            if let Some(result) = roller.update(&input, FRAME).result {
                results.push(result);
            }
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].values.len(), 2);
        assert_eq!(roller.last_result(), Some(&results[0]));
    }
}
