//! Systems module for dice3d
//!
//! Bevy side of the roller, organized into submodules by functionality:
//!
//! - `setup`: Scene initialization (camera, lights, tray, results text)
//! - `dice`: Roller driving, visual sync, materials and results display
//! - `collision_sfx`: Impact sounds
//! - `dice_preview`: Per-die thumbnails rendered to host images
//! - `input`: Keyboard controls used by the demo host
//! - `rendering`: Number mesh generation for dice labels

pub mod collision_sfx;
mod dice;
pub mod dice_preview;
mod input;
pub mod rendering;
mod setup;

// Re-export all public systems
pub use collision_sfx::{
    impact_amplitude, init_impact_sound, plan_impact_sounds, play_dice_impact_sfx,
    DiceImpactSfx, DieImpact, PlannedSound,
};
pub use dice::{
    advance_dice_roller, apply_dice_materials, format_results, highlight_result_labels,
    init_dice_render_assets, needs_material_update, spawn_die_visual, sync_dice_visuals,
    update_results_display, DiceRenderAssets,
};
pub use dice_preview::{
    create_thumbnail_image, plan_thumbnails, refresh_dice_thumbnails, ThumbnailJob,
    ThumbnailState,
};
pub use input::{dice_type_for_key, handle_input, StartingDice, MAX_KEYBOARD_DICE};
pub use setup::setup;
