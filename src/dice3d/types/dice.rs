//! Dice-related types and components
//!
//! This module contains the die kinds, the per-die configuration supplied by the
//! host, the roll inputs/outputs exchanged with it, and the ECS markers used by
//! the render bridge.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::DiceError;

/// All supported dice types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DiceType {
    pub const ALL: [DiceType; 6] = [
        DiceType::D4,
        DiceType::D6,
        DiceType::D8,
        DiceType::D10,
        DiceType::D12,
        DiceType::D20,
    ];

    pub fn sides(&self) -> u32 {
        match self {
            DiceType::D4 => 4,
            DiceType::D6 => 6,
            DiceType::D8 => 8,
            DiceType::D10 => 10,
            DiceType::D12 => 12,
            DiceType::D20 => 20,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiceType::D4 => "D4",
            DiceType::D6 => "D6",
            DiceType::D8 => "D8",
            DiceType::D10 => "D10",
            DiceType::D12 => "D12",
            DiceType::D20 => "D20",
        }
    }

    pub fn color(&self) -> Color {
        // Slightly translucent crystal-like colors
        match self {
            DiceType::D4 => Color::srgba(0.3, 0.4, 0.9, 0.92), // Blue crystal
            DiceType::D6 => Color::srgba(0.1, 0.1, 0.1, 0.95), // Black/smoke crystal
            DiceType::D8 => Color::srgba(0.6, 0.2, 0.8, 0.92), // Purple crystal
            DiceType::D10 => Color::srgba(0.95, 0.95, 0.95, 0.92), // White/clear crystal
            DiceType::D12 => Color::srgba(0.95, 0.5, 0.1, 0.92), // Orange crystal
            DiceType::D20 => Color::srgba(0.95, 0.85, 0.2, 0.92), // Yellow crystal
        }
    }

    pub fn parse(s: &str) -> Option<DiceType> {
        match s.trim().to_lowercase().as_str() {
            "d4" => Some(DiceType::D4),
            "d6" => Some(DiceType::D6),
            "d8" => Some(DiceType::D8),
            "d10" => Some(DiceType::D10),
            "d12" => Some(DiceType::D12),
            "d20" => Some(DiceType::D20),
            _ => None,
        }
    }

    /// Boundary check for hosts that describe dice by side count.
    pub fn from_sides(sides: u32) -> Result<DiceType, DiceError> {
        DiceType::ALL
            .into_iter()
            .find(|kind| kind.sides() == sides)
            .ok_or(DiceError::UnsupportedSides(sides))
    }

    /// Radius of the sphere enclosing every vertex, in world units.
    /// Larger dice are a little bigger, as on a real table.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            DiceType::D4 => 0.50,
            DiceType::D6 => 0.48,
            DiceType::D8 => 0.46,
            DiceType::D10 => 0.47,
            DiceType::D12 => 0.50,
            DiceType::D20 => 0.52,
        }
    }
}

impl std::str::FromStr for DiceType {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceType::parse(s).ok_or_else(|| DiceError::UnknownDiceType(s.to_string()))
    }
}

/// Material part of a die configuration, already clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DieMaterial {
    pub base_color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub text_color: Color,
    pub highlight_text_color: Color,
}

/// One die as configured by the host UI. The core never mutates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DieConfig {
    pub kind: DiceType,
    pub base_color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub text_color: Color,
    pub highlight_text_color: Color,
}

impl DieConfig {
    pub fn new(kind: DiceType) -> Self {
        Self {
            kind,
            base_color: kind.color(),
            roughness: 0.15,
            metalness: 0.1,
            text_color: Color::WHITE,
            highlight_text_color: Color::srgb(1.0, 0.8, 0.1),
        }
    }

    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_surface(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness = roughness;
        self.metalness = metalness;
        self
    }

    /// Material properties with roughness/metalness clamped to [0, 1].
    /// NaN is treated as 0.
    pub fn material(&self) -> DieMaterial {
        DieMaterial {
            base_color: self.base_color,
            roughness: clamp_unit(self.roughness),
            metalness: clamp_unit(self.metalness),
            text_color: self.text_color,
            highlight_text_color: self.highlight_text_color,
        }
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Host-owned roll inputs, read by the simulation each frame.
#[derive(Resource, Clone, Debug)]
pub struct DiceRollInputs {
    pub configs: Vec<DieConfig>,
    /// Opaque counter; any change requests a new roll.
    pub trigger: u64,
    pub volume: f32,
}

impl Default for DiceRollInputs {
    fn default() -> Self {
        Self {
            configs: vec![DieConfig::new(DiceType::D20)],
            trigger: 0,
            volume: 0.8,
        }
    }
}

impl DiceRollInputs {
    pub fn kinds(&self) -> Vec<DiceType> {
        self.configs.iter().map(|c| c.kind).collect()
    }

    pub fn volume(&self) -> f32 {
        clamp_unit(self.volume)
    }

    /// Bump the trigger, which the roller treats as "roll again".
    pub fn request_roll(&mut self) {
        self.trigger = self.trigger.wrapping_add(1);
    }
}

/// Drawable thumbnail targets supplied by the host, indexed like the die list.
#[derive(Resource, Clone, Debug, Default)]
pub struct ThumbnailTargets(pub Vec<Option<Handle<Image>>>);

impl ThumbnailTargets {
    pub fn get(&self, index: usize) -> Option<&Handle<Image>> {
        self.0.get(index).and_then(|target| target.as_ref())
    }
}

/// Values read off one completed roll, in die-list order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RollResult {
    pub session_id: u64,
    pub trigger: u64,
    pub values: Vec<u32>,
}

impl RollResult {
    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// Emitted exactly once per resolved roll session.
#[derive(Message, Clone, Debug)]
pub struct DiceRollCompleted(pub RollResult);

/// Resource storing the results of the last completed roll
#[derive(Resource, Default)]
pub struct DiceResults {
    pub results: Vec<(DiceType, u32)>,
}

/// Drawable mirror of one simulated die.
#[derive(Component)]
pub struct DieVisual {
    pub index: usize,
    pub session_id: u64,
}

/// Material handles owned by one die visual, plus what was last written to them.
#[derive(Component)]
pub struct DieMaterials {
    pub body: Handle<StandardMaterial>,
    pub text: Handle<StandardMaterial>,
    pub highlight: Handle<StandardMaterial>,
    pub applied: Option<DieMaterial>,
}

/// Number label child of a die visual.
#[derive(Component)]
pub struct DieLabel {
    pub value: u32,
}

/// Marker for thumbnail scene entities (camera, light, die).
#[derive(Component)]
pub struct DiceThumbnail;

/// Marker for the tray meshes
#[derive(Component)]
pub struct DiceBox;

#[derive(Component)]
pub struct ResultsText;

#[derive(Component)]
pub struct MainCamera;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_type_sides() {
        assert_eq!(DiceType::D4.sides(), 4);
        assert_eq!(DiceType::D6.sides(), 6);
        assert_eq!(DiceType::D8.sides(), 8);
        assert_eq!(DiceType::D10.sides(), 10);
        assert_eq!(DiceType::D12.sides(), 12);
        assert_eq!(DiceType::D20.sides(), 20);
    }

    #[test]
    fn test_dice_type_from_sides() {
        assert_eq!(DiceType::from_sides(12), Ok(DiceType::D12));
        assert_eq!(DiceType::from_sides(7), Err(DiceError::UnsupportedSides(7)));
        assert_eq!(DiceType::from_sides(100), Err(DiceError::UnsupportedSides(100)));
    }

    #[test]
    fn test_dice_type_from_str() {
        assert_eq!("d8".parse::<DiceType>(), Ok(DiceType::D8));
        assert_eq!(
            "d100".parse::<DiceType>(),
            Err(DiceError::UnknownDiceType("d100".to_string()))
        );
    }

    #[test]
    fn test_material_is_clamped() {
        let config = DieConfig::new(DiceType::D6).with_surface(1.7, -0.2);
        let material = config.material();
        assert_eq!(material.roughness, 1.0);
        assert_eq!(material.metalness, 0.0);

        let config = DieConfig::new(DiceType::D6).with_surface(f32::NAN, 0.4);
        assert_eq!(config.material().roughness, 0.0);
        assert_eq!(config.material().metalness, 0.4);
    }

    #[test]
    fn test_inputs_volume_is_clamped() {
        let mut inputs = DiceRollInputs::default();
        inputs.volume = 3.0;
        assert_eq!(inputs.volume(), 1.0);
        inputs.volume = -1.0;
        assert_eq!(inputs.volume(), 0.0);
    }

    #[test]
    fn test_request_roll_changes_trigger() {
        let mut inputs = DiceRollInputs::default();
        let before = inputs.trigger;
        inputs.request_roll();
        assert_ne!(inputs.trigger, before);
    }

    #[test]
    fn test_thumbnail_target_lookup() {
        let targets = ThumbnailTargets(vec![None, Some(Handle::default())]);
        assert!(targets.get(0).is_none());
        assert!(targets.get(1).is_some());
        assert!(targets.get(5).is_none());
    }
}
