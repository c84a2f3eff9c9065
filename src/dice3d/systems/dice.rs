//! Dice simulation bridge systems
//!
//! This module drives the roller once per frame and mirrors its bodies into
//! drawable entities: transforms, per-die materials, result highlighting and
//! the results text.

use std::collections::{BTreeMap, HashMap};

use bevy::camera::visibility::RenderLayers;
use bevy::log::debug;
use bevy::prelude::*;

use crate::dice3d::meshes::create_die_mesh;
use crate::dice3d::physics::{resolve_face_value, DieBody};
use crate::dice3d::session::{DiceRoller, RollInput, RollPhase};
use crate::dice3d::types::*;

use super::collision_sfx::DieImpact;
use super::rendering::{create_digit_mesh, label_material};

/// Shared meshes: one hull per die kind, one numeral per value.
#[derive(Resource, Default)]
pub struct DiceRenderAssets {
    pub die_meshes: HashMap<DiceType, Handle<Mesh>>,
    pub digit_meshes: HashMap<u32, Handle<Mesh>>,
}

impl DiceRenderAssets {
    pub fn die_mesh(&self, kind: DiceType) -> Handle<Mesh> {
        self.die_meshes.get(&kind).cloned().unwrap_or_default()
    }

    pub fn digit_mesh(&self, value: u32) -> Handle<Mesh> {
        self.digit_meshes.get(&value).cloned().unwrap_or_default()
    }
}

pub fn init_dice_render_assets(
    mut commands: Commands,
    roller: Res<DiceRoller>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let mut assets = DiceRenderAssets::default();
    for kind in DiceType::ALL {
        let geometry = roller.catalog().get(kind);
        assets
            .die_meshes
            .insert(kind, meshes.add(create_die_mesh(geometry)));
        for entry in &geometry.value_table {
            assets
                .digit_meshes
                .entry(entry.value)
                .or_insert_with(|| meshes.add(create_digit_mesh(entry.value)));
        }
    }
    commands.insert_resource(assets);
}

/// Run the roller for this frame and publish what it produced.
pub fn advance_dice_roller(
    time: Res<Time>,
    inputs: Res<DiceRollInputs>,
    mut roller: ResMut<DiceRoller>,
    mut dice_results: ResMut<DiceResults>,
    mut impacts: MessageWriter<DieImpact>,
    mut completed: MessageWriter<DiceRollCompleted>,
) {
    let kinds = inputs.kinds();
    let output = roller.update(
        &RollInput {
            kinds: &kinds,
            trigger: inputs.trigger,
        },
        time.delta_secs(),
    );

    if output.new_session {
        dice_results.results.clear();
    }

    for event in &output.events {
        impacts.write(DieImpact {
            speed: event.impact_speed,
            position: event.point,
        });
    }

    if let Some(result) = output.result {
        dice_results.results = kinds
            .iter()
            .copied()
            .zip(result.values.iter().copied())
            .collect();
        completed.write(DiceRollCompleted(result));
    }
}

/// Keep exactly one visual per body of the current session.
pub fn sync_dice_visuals(
    mut commands: Commands,
    roller: Res<DiceRoller>,
    inputs: Res<DiceRollInputs>,
    render_assets: Res<DiceRenderAssets>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut visuals: Query<(Entity, &DieVisual, &mut Transform), Without<DiceThumbnail>>,
) {
    let bodies = roller.bodies();
    let session_id = roller.session_id();

    let stale = visuals
        .iter()
        .any(|(_, visual, _)| Some(visual.session_id) != session_id);
    let count = visuals.iter().count();

    if stale || count != bodies.len() {
        for (entity, _, _) in visuals.iter() {
            commands.entity(entity).despawn();
        }
        let Some(session_id) = session_id else {
            return;
        };
        debug!("Spawning {} die visuals for roll {}", bodies.len(), session_id);
        for (index, body) in bodies.iter().enumerate() {
            let config = inputs
                .configs
                .get(index)
                .copied()
                .unwrap_or_else(|| DieConfig::new(body.kind));
            let die = spawn_die_visual(
                &mut commands,
                &render_assets,
                &mut materials,
                body,
                &config,
                body.transform(),
                RenderLayers::default(),
            );
            commands.entity(die).insert(DieVisual { index, session_id });
        }
        return;
    }

    for (_, visual, mut transform) in visuals.iter_mut() {
        if let Some(body) = bodies.get(visual.index) {
            transform.translation = body.position;
            transform.rotation = body.orientation;
        }
    }
}

/// Spawn a die mesh with its number labels as children, all on `layer`.
/// Returns the die entity.
pub fn spawn_die_visual(
    commands: &mut Commands,
    render_assets: &DiceRenderAssets,
    materials: &mut Assets<StandardMaterial>,
    body: &DieBody,
    config: &DieConfig,
    transform: Transform,
    layer: RenderLayers,
) -> Entity {
    let material = config.material();
    let body_material = materials.add(StandardMaterial {
        base_color: material.base_color,
        alpha_mode: AlphaMode::Blend,
        reflectance: 0.7,
        perceptual_roughness: material.roughness,
        metallic: material.metalness,
        ..default()
    });
    let text = materials.add(label_material(material.text_color));
    let highlight = materials.add(label_material(material.highlight_text_color));

    commands
        .spawn((
            Mesh3d(render_assets.die_mesh(body.kind)),
            MeshMaterial3d(body_material.clone()),
            transform,
            layer.clone(),
            DieMaterials {
                body: body_material,
                text: text.clone(),
                highlight,
                applied: None,
            },
            Name::new(format!("Die ({})", body.kind.name())),
        ))
        .with_children(|parent| {
            for label in &body.geometry.labels {
                parent.spawn((
                    Mesh3d(render_assets.digit_mesh(label.value)),
                    MeshMaterial3d(text.clone()),
                    Transform {
                        translation: label.translation,
                        rotation: label.rotation,
                        scale: Vec3::splat(label.scale),
                    },
                    layer.clone(),
                    DieLabel { value: label.value },
                ));
            }
        })
        .id()
}

/// Whether the material last written to a visual differs from the wanted one.
pub fn needs_material_update(applied: Option<&DieMaterial>, wanted: &DieMaterial) -> bool {
    applied != Some(wanted)
}

/// Push host material edits to the visuals. Never touches physics.
pub fn apply_dice_materials(
    inputs: Res<DiceRollInputs>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut dice: Query<(&DieVisual, &mut DieMaterials)>,
) {
    for (visual, mut die_materials) in dice.iter_mut() {
        let Some(config) = inputs.configs.get(visual.index) else {
            continue;
        };
        let wanted = config.material();
        if !needs_material_update(die_materials.applied.as_ref(), &wanted) {
            continue;
        }

        if let Some(body) = materials.get_mut(&die_materials.body) {
            body.base_color = wanted.base_color;
            body.perceptual_roughness = wanted.roughness;
            body.metallic = wanted.metalness;
        }
        if let Some(text) = materials.get_mut(&die_materials.text) {
            text.base_color = wanted.text_color;
        }
        if let Some(highlight) = materials.get_mut(&die_materials.highlight) {
            highlight.base_color = wanted.highlight_text_color;
        }
        die_materials.applied = Some(wanted);
    }
}

/// Light up the labels of the value each settled die shows.
pub fn highlight_result_labels(
    roller: Res<DiceRoller>,
    dice: Query<(&DieVisual, &DieMaterials, &Children), Without<DiceThumbnail>>,
    mut labels: Query<(&DieLabel, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let bodies = roller.bodies();
    for (visual, die_materials, children) in dice.iter() {
        let shown = bodies
            .get(visual.index)
            .filter(|body| body.settled)
            .map(resolve_face_value);

        for child in children.iter() {
            let Ok((label, mut material)) = labels.get_mut(child) else {
                continue;
            };
            let wanted = if Some(label.value) == shown {
                &die_materials.highlight
            } else {
                &die_materials.text
            };
            if material.0 != *wanted {
                material.0 = wanted.clone();
            }
        }
    }
}

/// Results overlay text for the current state.
pub fn format_results(phase: Option<RollPhase>, results: &[(DiceType, u32)]) -> String {
    match phase {
        None => return String::from("Press SPACE to roll dice"),
        Some(RollPhase::Spawning) | Some(RollPhase::Settling) => return String::from("Rolling..."),
        Some(RollPhase::Resolved) => {}
    }
    if results.is_empty() {
        return String::from("No dice\n\nPress 1-6 to add a die");
    }

    // Group by die type, smallest die first
    let mut grouped: BTreeMap<u32, (DiceType, Vec<u32>)> = BTreeMap::new();
    for (kind, value) in results {
        grouped
            .entry(kind.sides())
            .or_insert_with(|| (*kind, Vec::new()))
            .1
            .push(*value);
    }

    let mut text = String::from("Results:\n");
    let mut total = 0;
    for (kind, values) in grouped.values() {
        let sum: u32 = values.iter().sum();
        total += sum;
        if values.len() == 1 {
            text.push_str(&format!("{}: {}\n", kind.name(), values[0]));
        } else {
            let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            text.push_str(&format!(
                "{}x{}: {} = {}\n",
                values.len(),
                kind.name(),
                parts.join(" + "),
                sum
            ));
        }
    }
    text.push_str(&format!("\nTOTAL: {}\n\nPress SPACE to roll again", total));
    text
}

pub fn update_results_display(
    roller: Res<DiceRoller>,
    dice_results: Res<DiceResults>,
    mut text_query: Query<&mut Text, With<ResultsText>>,
) {
    let message = format_results(roller.phase(), &dice_results.results);
    for mut text in text_query.iter_mut() {
        if text.0 != message {
            text.0 = message.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_update_only_on_change() {
        let config = DieConfig::new(DiceType::D6);
        let wanted = config.material();
        assert!(needs_material_update(None, &wanted));
        assert!(!needs_material_update(Some(&wanted), &wanted));

        let recolored = config.with_base_color(Color::srgb(0.2, 0.9, 0.2)).material();
        assert!(needs_material_update(Some(&wanted), &recolored));

        // Clamping makes out-of-range edits that land on the same value a no-op.
        let a = config.with_surface(1.5, 0.1).material();
        let b = config.with_surface(2.5, 0.1).material();
        assert!(!needs_material_update(Some(&a), &b));
    }

    #[test]
    fn test_format_results_groups_by_kind() {
        let results = vec![
            (DiceType::D20, 17),
            (DiceType::D6, 3),
            (DiceType::D6, 5),
        ];
        let text = format_results(Some(RollPhase::Resolved), &results);
        assert!(text.starts_with("Results:\nD6"));
        assert!(text.contains("2xD6: 3 + 5 = 8"));
        assert!(text.contains("D20: 17"));
        assert!(text.contains("TOTAL: 25"));
    }

    #[test]
    fn test_format_results_while_rolling() {
        assert_eq!(format_results(Some(RollPhase::Settling), &[]), "Rolling...");
        assert!(format_results(Some(RollPhase::Resolved), &[]).starts_with("No dice"));
    }
}
