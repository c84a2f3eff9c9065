//! Simulation settings and die-list files
//!
//! Every tunable constant of the roller lives in [`DiceSettings`]. The compiled
//! defaults are what the tests are written against; a RON file can override any
//! subset of them (missing keys keep their defaults).

use bevy::log::{info, warn};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::dice::{DiceType, DieConfig};
use super::error::DiceError;

// ============================================================================
// Physics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Fixed simulation slice in seconds.
    pub sub_step: f32,
    /// Upper bound on sub-steps per rendered frame; leftover time is dropped.
    pub max_substeps_per_frame: u32,
    pub gravity: [f32; 3],

    /// Velocity loss per second, applied to every moving body.
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Extra angular loss per second while resting on something (rolling resistance).
    pub contact_angular_damping: f32,

    pub tray_restitution: f32,
    pub die_restitution: f32,
    pub friction: f32,
    /// Normal approach speed below which contacts do not bounce.
    pub resting_speed: f32,
    /// Pull (1/s^2) that tips a die resting on an edge or vertex onto its nearest face.
    pub face_alignment_stiffness: f32,

    pub max_linear_speed: f32,
    pub max_angular_speed: f32,

    pub settle_linear_speed: f32,
    pub settle_angular_speed: f32,
    /// Seconds both speeds must stay under threshold before a die counts as settled.
    pub settle_window: f32,
    /// Relative approach speed at which a moving die knocks a settled one loose.
    pub wake_speed: f32,
    /// Simulated seconds after which any die still moving is settled in place.
    pub max_roll_seconds: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            sub_step: 1.0 / 120.0,
            max_substeps_per_frame: 8,
            gravity: [0.0, -9.81, 0.0],
            linear_damping: 0.3,
            angular_damping: 0.8,
            contact_angular_damping: 6.0,
            tray_restitution: 0.35,
            die_restitution: 0.4,
            friction: 0.45,
            resting_speed: 0.6,
            face_alignment_stiffness: 60.0,
            max_linear_speed: 15.0,
            max_angular_speed: 40.0,
            settle_linear_speed: 0.06,
            settle_angular_speed: 0.15,
            settle_window: 0.3,
            wake_speed: 0.8,
            max_roll_seconds: 8.0,
        }
    }
}

impl PhysicsSettings {
    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}

// ============================================================================
// Throw
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowSettings {
    /// Centre of the spawn grid, inside the tray.
    pub entry_point: [f32; 3],
    /// Spacing of the spawn grid.
    pub spacing: f32,
    pub direction: [f32; 3],
    pub speed_min: f32,
    pub speed_max: f32,
    pub cone_half_angle_degrees: f32,
    /// Each angular velocity component is drawn from [-spin, spin].
    pub spin: f32,
    pub randomize_orientation: bool,
}

impl Default for ThrowSettings {
    fn default() -> Self {
        Self {
            entry_point: [0.0, 1.9, 0.9],
            spacing: 1.1,
            direction: [0.0, -0.25, -1.0],
            speed_min: 2.0,
            speed_max: 4.0,
            cone_half_angle_degrees: 25.0,
            spin: 8.0,
            randomize_orientation: true,
        }
    }
}

// ============================================================================
// Audio
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Impacts at or above this speed play at full (volume-scaled) amplitude.
    pub reference_impact_speed: f32,
    /// Slower impacts (resting contact) are silent.
    pub min_impact_speed: f32,
    pub max_sounds_per_frame: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            reference_impact_speed: 5.0,
            min_impact_speed: 0.35,
            max_sounds_per_frame: 4,
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

/// Which numbers the ten-sided die carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum D10Labeling {
    #[default]
    OneToTen,
    ZeroToNine,
}

#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceSettings {
    pub physics: PhysicsSettings,
    pub throw: ThrowSettings,
    pub audio: AudioSettings,
    pub d10_labeling: D10Labeling,
    /// Fixed seed for reproducible throws; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl DiceSettings {
    pub fn from_ron_str(text: &str, path: &str) -> Result<Self, DiceError> {
        ron::from_str::<DiceSettings>(text).map_err(|e| DiceError::SettingsParse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &str) -> Result<Self, DiceError> {
        let text = std::fs::read_to_string(path).map_err(|e| DiceError::SettingsIo {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text, path)
    }

    /// Load `path` if given, falling back to compiled defaults on any failure.
    pub fn load_or_default(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded dice settings from {}", path);
                settings
            }
            Err(e) => {
                warn!("{}; using default dice settings", e);
                Self::default()
            }
        }
    }

    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

// ============================================================================
// Die list files
// ============================================================================

/// Serializable form of a [`DieConfig`]; colors are CSS strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieConfigSetting {
    pub kind: DiceType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    #[serde(default = "default_metalness")]
    pub metalness: f32,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_highlight_text_color")]
    pub highlight_text_color: String,
}

fn default_roughness() -> f32 {
    DieConfig::new(DiceType::D6).roughness
}
fn default_metalness() -> f32 {
    DieConfig::new(DiceType::D6).metalness
}
fn default_text_color() -> String {
    "#ffffff".to_string()
}
fn default_highlight_text_color() -> String {
    "#ffcc1a".to_string()
}

impl DieConfigSetting {
    pub fn new(kind: DiceType) -> Self {
        Self {
            kind,
            color: None,
            roughness: default_roughness(),
            metalness: default_metalness(),
            text_color: default_text_color(),
            highlight_text_color: default_highlight_text_color(),
        }
    }

    pub fn to_config(&self) -> Result<DieConfig, DiceError> {
        let mut config = DieConfig::new(self.kind).with_surface(self.roughness, self.metalness);
        if let Some(color) = &self.color {
            config.base_color = parse_color("color", color)?;
        }
        config.text_color = parse_color("text_color", &self.text_color)?;
        config.highlight_text_color =
            parse_color("highlight_text_color", &self.highlight_text_color)?;
        Ok(config)
    }

    pub fn load_list(path: &str) -> Result<Vec<DieConfig>, DiceError> {
        let text = std::fs::read_to_string(path).map_err(|e| DiceError::SettingsIo {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let settings = ron::from_str::<Vec<DieConfigSetting>>(&text).map_err(|e| {
            DiceError::SettingsParse {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;
        settings.iter().map(DieConfigSetting::to_config).collect()
    }
}

/// Parse a CSS color ("#ff8844", "rgb(10 20 30 / 50%)", "hsl(120, 50%, 40%)").
pub fn parse_color(field: &'static str, value: &str) -> Result<Color, DiceError> {
    let parsed = csscolorparser::parse(value).map_err(|_| DiceError::InvalidColor {
        field,
        value: value.to_string(),
    })?;
    let [r, g, b, a] = parsed.to_rgba8();
    Ok(Color::srgba_u8(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let text = "(physics: (settle_window: 0.5), seed: Some(7))";
        let settings = DiceSettings::from_ron_str(text, "inline").unwrap();
        assert_eq!(settings.physics.settle_window, 0.5);
        assert_eq!(settings.physics.sub_step, PhysicsSettings::default().sub_step);
        assert_eq!(settings.throw, ThrowSettings::default());
        assert_eq!(settings.seed, Some(7));
    }

    #[test]
    fn test_settings_ron_round_trip() {
        let mut settings = DiceSettings::default();
        settings.d10_labeling = D10Labeling::ZeroToNine;
        settings.audio.max_sounds_per_frame = 2;
        let text = settings.to_ron_string().unwrap();
        let back = DiceSettings::from_ron_str(&text, "inline").unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_bad_ron_is_a_parse_error() {
        let err = DiceSettings::from_ron_str("(physics: 12)", "bad.ron").unwrap_err();
        assert!(matches!(err, DiceError::SettingsParse { .. }));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = DiceSettings::load_or_default(Some("/definitely/not/here.ron"));
        assert_eq!(settings, DiceSettings::default());
    }

    #[test]
    fn test_die_config_setting_parses_css_colors() {
        let mut setting = DieConfigSetting::new(DiceType::D12);
        setting.color = Some("#ff0000".to_string());
        setting.roughness = 2.0;
        let config = setting.to_config().unwrap();
        assert_eq!(config.kind, DiceType::D12);
        assert_eq!(config.base_color, Color::srgba_u8(255, 0, 0, 255));
        // Stored raw, clamped on use.
        assert_eq!(config.material().roughness, 1.0);
    }

    #[test]
    fn test_die_config_setting_rejects_bad_color() {
        let mut setting = DieConfigSetting::new(DiceType::D4);
        setting.text_color = "not-a-color".to_string();
        assert_eq!(
            setting.to_config(),
            Err(DiceError::InvalidColor {
                field: "text_color",
                value: "not-a-color".to_string()
            })
        );
    }

    #[test]
    fn test_die_list_ron_shape() {
        let text = r##"[(kind: d6), (kind: d20, color: Some("rgb(102, 51, 153)"), metalness: 0.8)]"##;
        let list: Vec<DieConfigSetting> = ron::from_str(text).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].kind, DiceType::D20);
        assert_eq!(list[1].metalness, 0.8);
        assert!(list[1].to_config().is_ok());
    }
}
