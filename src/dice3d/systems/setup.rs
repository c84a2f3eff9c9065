//! Scene setup system
//!
//! This module contains the setup function that builds the static scene:
//! camera, lights, the tray walls and floor, and the results text.

use bevy::prelude::*;

use crate::dice3d::physics::{BOX_CEILING_Y, BOX_FLOOR_Y, BOX_HALF_WIDTH};
use crate::dice3d::types::*;

const WALL_THICKNESS: f32 = 0.15;
/// Walls are drawn lower than the physics lid so the dice stay visible.
const WALL_HEIGHT: f32 = 1.5;

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 5.6, 4.2).looking_at(Vec3::new(0.0, 0.0, 0.2), Vec3::Y),
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    // Soft fill from the opposite side
    commands.spawn((
        DirectionalLight {
            illuminance: 2500.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-4.0, 6.0, -3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Crystal/glass material for the tray
    let crystal_mat = materials.add(StandardMaterial {
        base_color: Color::srgba(0.7, 0.85, 0.95, 0.3),
        alpha_mode: AlphaMode::Blend,
        reflectance: 0.8,
        perceptual_roughness: 0.1,
        metallic: 0.0,
        ..default()
    });
    let felt_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.08, 0.22, 0.14),
        perceptual_roughness: 0.95,
        ..default()
    });

    let width = BOX_HALF_WIDTH * 2.0;
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(width, 0.3, width))),
        MeshMaterial3d(felt_mat),
        Transform::from_xyz(0.0, BOX_FLOOR_Y - 0.15, 0.0),
        DiceBox,
    ));

    let height = WALL_HEIGHT.min(BOX_CEILING_Y);
    let offset = BOX_HALF_WIDTH + WALL_THICKNESS / 2.0;
    for (pos, size) in [
        (
            Vec3::new(0.0, height / 2.0, -offset),
            Vec3::new(width + WALL_THICKNESS * 2.0, height, WALL_THICKNESS),
        ),
        (
            Vec3::new(0.0, height / 2.0, offset),
            Vec3::new(width + WALL_THICKNESS * 2.0, height, WALL_THICKNESS),
        ),
        (
            Vec3::new(-offset, height / 2.0, 0.0),
            Vec3::new(WALL_THICKNESS, height, width),
        ),
        (
            Vec3::new(offset, height / 2.0, 0.0),
            Vec3::new(WALL_THICKNESS, height, width),
        ),
    ] {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(crystal_mat.clone()),
            Transform::from_translation(pos),
            DiceBox,
        ));
    }

    commands.spawn((
        Text::new("Press SPACE to roll dice"),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            max_width: Val::Px(350.0),
            ..default()
        },
        ResultsText,
    ));
}
