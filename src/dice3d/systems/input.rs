//! Keyboard controls for the demo host
//!
//! The roller itself only reads [`DiceRollInputs`]; these systems play the part
//! of a host UI by editing it.

use bevy::log::info;
use bevy::prelude::*;

use crate::dice3d::types::*;

/// Die list the demo started with, restored by R.
#[derive(Resource, Clone, Debug)]
pub struct StartingDice(pub Vec<DieConfig>);

/// Upper bound on dice added from the keyboard.
pub const MAX_KEYBOARD_DICE: usize = 12;

const VOLUME_STEP: f32 = 0.1;

/// Die kind bound to a number key (1-6 → d4..d20).
pub fn dice_type_for_key(key: KeyCode) -> Option<DiceType> {
    match key {
        KeyCode::Digit1 => Some(DiceType::D4),
        KeyCode::Digit2 => Some(DiceType::D6),
        KeyCode::Digit3 => Some(DiceType::D8),
        KeyCode::Digit4 => Some(DiceType::D10),
        KeyCode::Digit5 => Some(DiceType::D12),
        KeyCode::Digit6 => Some(DiceType::D20),
        _ => None,
    }
}

pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    starting: Option<Res<StartingDice>>,
    mut inputs: ResMut<DiceRollInputs>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        inputs.request_roll();
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        if let Some(starting) = &starting {
            inputs.configs = starting.0.clone();
            inputs.request_roll();
        }
    }

    for key in keyboard.get_just_pressed() {
        let Some(kind) = dice_type_for_key(*key) else {
            continue;
        };
        if inputs.configs.len() < MAX_KEYBOARD_DICE {
            inputs.configs.push(DieConfig::new(kind));
            info!("Added {}", kind.name());
        }
    }

    if keyboard.just_pressed(KeyCode::Backspace) {
        if let Some(removed) = inputs.configs.pop() {
            info!("Removed {}", removed.kind.name());
        }
    }

    if keyboard.just_pressed(KeyCode::Equal) || keyboard.just_pressed(KeyCode::NumpadAdd) {
        inputs.volume = (inputs.volume() + VOLUME_STEP).min(1.0);
        info!("Volume {:.0}%", inputs.volume * 100.0);
    }
    if keyboard.just_pressed(KeyCode::Minus) || keyboard.just_pressed(KeyCode::NumpadSubtract) {
        inputs.volume = (inputs.volume() - VOLUME_STEP).max(0.0);
        info!("Volume {:.0}%", inputs.volume * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_keys_map_to_dice() {
        assert_eq!(dice_type_for_key(KeyCode::Digit1), Some(DiceType::D4));
        assert_eq!(dice_type_for_key(KeyCode::Digit6), Some(DiceType::D20));
        assert_eq!(dice_type_for_key(KeyCode::Digit7), None);
    }
}
