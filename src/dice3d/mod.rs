pub mod meshes;
pub mod physics;
pub mod plugin;
pub mod session;
pub mod systems;
pub mod types;

pub use meshes::*;
pub use physics::*;
pub use plugin::*;
pub use session::*;
pub use systems::*;
pub use types::*;
