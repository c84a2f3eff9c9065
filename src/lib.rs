//! Physics Dice
//!
//! Polyhedral dice are thrown into a closed tray, tumble under a small fixed-step
//! simulation, come to rest, and the face each die shows is read back. The Bevy
//! bridge in [`dice3d::systems`] mirrors the simulation into meshes, thumbnails
//! and impact sounds.

pub mod dice3d;
