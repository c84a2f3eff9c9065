//! Small purpose-built rigid body simulation for a handful of dice in a tray.

pub mod body;
pub mod resolver;
pub mod settle;
pub mod stepper;
pub mod tray;

pub use body::{calculate_dice_position, BodyStore, DieBody, ThrowProfile};
pub use resolver::{resolve_face_index, resolve_face_value};
pub use settle::update_settle;
pub use stepper::{CollisionEvent, CollisionTarget, PhysicsStepper};
pub use tray::{Tray, TrayPlane, TrayPlaneKind, BOX_CEILING_Y, BOX_FLOOR_Y, BOX_HALF_WIDTH};
