//! Type definitions for the physics dice roller
//!
//! This module is organized into submodules:
//! - `dice` - Die kinds, host-facing configuration, roll inputs/outputs, components
//! - `settings` - Tunable simulation settings and die-list files
//! - `error` - Configuration-boundary errors

pub mod dice;
pub mod error;
pub mod settings;

// Re-export all public types for convenient access
pub use dice::*;
pub use error::*;
pub use settings::*;
