//! Error types for configuration boundaries.
//!
//! Nothing in here is raised from inside the simulation loop. Bad input is
//! rejected (or clamped) before a roll starts; numerical trouble during a roll
//! is recovered in place by the stepper.

use thiserror::Error;

use super::dice::DiceType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiceError {
    /// A side count outside {4, 6, 8, 10, 12, 20}.
    #[error("unsupported die with {0} sides (valid: 4, 6, 8, 10, 12, 20)")]
    UnsupportedSides(u32),

    /// A die name that does not parse (e.g. "d100").
    #[error("unknown die type '{0}' (valid: d4, d6, d8, d10, d12, d20)")]
    UnknownDiceType(String),

    /// A color string that is not valid CSS.
    #[error("invalid color for {field}: '{value}'")]
    InvalidColor { field: &'static str, value: String },

    /// A replacement value mapping that is not a bijection over the faces.
    #[error("invalid face values for {}: {reason}", .kind.name())]
    InvalidFaceValues { kind: DiceType, reason: String },

    /// The settings file could not be read.
    #[error("failed to read {path}: {message}")]
    SettingsIo { path: String, message: String },

    /// The settings file was read but is not valid RON for the expected type.
    #[error("failed to parse {path}: {message}")]
    SettingsParse { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_offending_value() {
        let err = DiceError::UnsupportedSides(7);
        assert!(err.to_string().contains("7 sides"));

        let err = DiceError::UnknownDiceType("d100".to_string());
        assert!(err.to_string().contains("d100"));

        let err = DiceError::InvalidFaceValues {
            kind: DiceType::D10,
            reason: "duplicate value 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid face values for D10: duplicate value 3"
        );
    }

    #[test]
    fn test_errors_box_as_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DiceError::InvalidColor {
            field: "text_color",
            value: "nope".to_string(),
        });
        assert_eq!(err.to_string(), "invalid color for text_color: 'nope'");

        let err = DiceError::SettingsIo {
            path: "dice.ron".to_string(),
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "failed to read dice.ron: not found");
    }
}
