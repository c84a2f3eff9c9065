//! Die thumbnails
//!
//! Each die in the list can have a host-supplied image. Every die with a target
//! gets a tiny private scene (camera, light, die in its canonical pose) on its
//! own render layer, rendered into that image. The scenes are rebuilt only when
//! the die list or the targets change.

use bevy::camera::visibility::RenderLayers;
use bevy::camera::RenderTarget;
use bevy::log::debug;
use bevy::prelude::*;
use bevy::render::render_resource::{
    Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};

use crate::dice3d::physics::DieBody;
use crate::dice3d::session::DiceRoller;
use crate::dice3d::types::{
    DiceRollInputs, DiceThumbnail, DiceType, DieConfig, DieVisual, ThumbnailTargets,
};

use super::dice::{spawn_die_visual, DiceRenderAssets};

/// Size of a thumbnail render target in pixels
pub const THUMBNAIL_SIZE: u32 = 96;

/// First render layer used by thumbnails (layer 0 is the main scene).
const THUMBNAIL_LAYER_BASE: usize = 8;

/// Thumbnail scenes are parked far below the tray, one slot apart.
const THUMBNAIL_ORIGIN: Vec3 = Vec3::new(0.0, -200.0, 0.0);
const THUMBNAIL_SLOT: f32 = 10.0;

/// One thumbnail to render.
#[derive(Clone, Debug, PartialEq)]
pub struct ThumbnailJob {
    pub index: usize,
    pub kind: DiceType,
    pub target: Handle<Image>,
    pub layer: usize,
}

/// What the current thumbnail scenes were built from.
#[derive(Resource, Default)]
pub struct ThumbnailState {
    kinds: Vec<DiceType>,
    targets: Vec<Option<Handle<Image>>>,
}

/// Jobs for every die that has a target; dice without one are skipped.
pub fn plan_thumbnails(kinds: &[DiceType], targets: &ThumbnailTargets) -> Vec<ThumbnailJob> {
    kinds
        .iter()
        .enumerate()
        .filter_map(|(index, kind)| {
            let Some(target) = targets.get(index) else {
                debug!("No thumbnail target for die {}; skipping", index);
                return None;
            };
            Some(ThumbnailJob {
                index,
                kind: *kind,
                target: target.clone(),
                layer: THUMBNAIL_LAYER_BASE + index,
            })
        })
        .collect()
}

/// Blank image usable as a thumbnail render target.
pub fn create_thumbnail_image(label: &'static str) -> Image {
    let size = Extent3d {
        width: THUMBNAIL_SIZE,
        height: THUMBNAIL_SIZE,
        depth_or_array_layers: 1,
    };

    let mut image = Image {
        texture_descriptor: TextureDescriptor {
            label: Some(label),
            size,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            mip_level_count: 1,
            sample_count: 1,
            usage: TextureUsages::TEXTURE_BINDING
                | TextureUsages::COPY_DST
                | TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        },
        ..default()
    };
    image.resize(size);
    image
}

pub fn refresh_dice_thumbnails(
    mut commands: Commands,
    inputs: Res<DiceRollInputs>,
    targets: Res<ThumbnailTargets>,
    roller: Res<DiceRoller>,
    render_assets: Res<DiceRenderAssets>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut state: ResMut<ThumbnailState>,
    existing: Query<Entity, With<DiceThumbnail>>,
) {
    let kinds = inputs.kinds();
    if state.kinds == kinds && state.targets == targets.0 {
        return;
    }
    state.kinds = kinds.clone();
    state.targets = targets.0.clone();

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    for job in plan_thumbnails(&kinds, &targets) {
        let layer = RenderLayers::layer(job.layer);
        let origin = THUMBNAIL_ORIGIN + Vec3::X * THUMBNAIL_SLOT * job.index as f32;
        let geometry = roller.catalog().geometry(job.kind);
        let camera_distance = geometry.bounding_radius * 3.2;

        commands.spawn((
            Camera3d::default(),
            Camera {
                target: RenderTarget::Image(job.target.clone().into()),
                order: -1 - job.index as isize,
                clear_color: ClearColorConfig::Custom(Color::NONE),
                ..default()
            },
            Transform::from_translation(origin + Vec3::new(0.0, 0.6, 1.0).normalize() * camera_distance)
                .looking_at(origin, Vec3::Y),
            layer.clone(),
            DiceThumbnail,
        ));

        commands.spawn((
            PointLight {
                intensity: 200_000.0,
                range: THUMBNAIL_SLOT / 2.0,
                ..default()
            },
            Transform::from_translation(origin + Vec3::new(1.5, 3.0, 2.0)),
            layer.clone(),
            DiceThumbnail,
        ));

        let config = inputs
            .configs
            .get(job.index)
            .copied()
            .unwrap_or_else(|| DieConfig::new(job.kind));
        let body = DieBody::new(geometry.clone(), origin, geometry.canonical_orientation);
        let die = spawn_die_visual(
            &mut commands,
            &render_assets,
            &mut materials,
            &body,
            &config,
            body.transform(),
            layer,
        );
        // Keeps material edits flowing to the thumbnail; the main-scene sync skips it.
        commands.entity(die).insert((
            DieVisual {
                index: job.index,
                session_id: 0,
            },
            DiceThumbnail,
        ));
    }
}
