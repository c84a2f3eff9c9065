//! Bevy plugin wiring the roller into an app.

use bevy::prelude::*;

use crate::dice3d::session::DiceRoller;
use crate::dice3d::systems::*;
use crate::dice3d::types::*;

/// Ordering handle for hosts that edit [`DiceRollInputs`] in `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiceRollerSystems;

pub struct DiceRollerPlugin {
    pub settings: DiceSettings,
    /// Also spawn camera, lights, tray and results text.
    pub spawn_scene: bool,
}

impl Default for DiceRollerPlugin {
    fn default() -> Self {
        Self {
            settings: DiceSettings::default(),
            spawn_scene: true,
        }
    }
}

impl DiceRollerPlugin {
    pub fn new(settings: DiceSettings) -> Self {
        Self {
            settings,
            ..default()
        }
    }
}

impl Plugin for DiceRollerPlugin {
    fn build(&self, app: &mut App) {
        // A host may insert its own roller (custom catalog or throw profile).
        if !app.world().contains_resource::<DiceRoller>() {
            app.insert_resource(DiceRoller::new(self.settings.clone()));
        }

        app.insert_resource(self.settings.clone())
            .init_resource::<DiceRollInputs>()
            .init_resource::<ThumbnailTargets>()
            .init_resource::<ThumbnailState>()
            .init_resource::<DiceResults>()
            .add_message::<DiceRollCompleted>()
            .add_message::<DieImpact>()
            .add_systems(Startup, (init_dice_render_assets, init_impact_sound))
            .add_systems(
                Update,
                (
                    advance_dice_roller,
                    sync_dice_visuals,
                    apply_dice_materials,
                    highlight_result_labels,
                    play_dice_impact_sfx,
                    refresh_dice_thumbnails,
                    update_results_display,
                )
                    .chain()
                    .in_set(DiceRollerSystems),
            );

        if self.spawn_scene {
            app.add_systems(Startup, setup);
        }
    }
}
