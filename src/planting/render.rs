//! Spawns and despawns the rendered entity + collider for a garden record.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::physics::PhysicsWorld;
use crate::shared::*;
use super::transitions::{mature_footprint, seed_footprint};

const SEED_COLOR: Color = Color::srgb(0.55, 0.36, 0.18);
const PLANT_COLOR: Color = Color::srgb(0.22, 0.66, 0.30);

/// Marks the entity currently drawing a planted record.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlantVisual {
    pub key: PlotKey,
    pub form: PlantForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantHandle {
    pub entity: Entity,
    pub collider: ColliderId,
}

/// The live handle for every garden record.
#[derive(Resource, Debug, Default)]
pub struct PlantEntities {
    pub handles: HashMap<PlotKey, PlantHandle>,
}

impl PlantEntities {
    /// Drops the handle for `key`, despawning its entity and collider.
    pub fn discard(&mut self, key: &PlotKey, commands: &mut Commands, physics: &mut PhysicsWorld) {
        if let Some(handle) = self.handles.remove(key) {
            commands.entity(handle.entity).despawn_recursive();
            physics.remove_body(handle.collider);
        }
    }
}

/// Seeds belong to the past; mature plants to the present.
fn form_tag(form: PlantForm) -> TimelineTag {
    match form {
        PlantForm::Seed => TimelineTag::PastOnly,
        PlantForm::Mature => TimelineTag::PresentOnly,
    }
}

/// Spawns the entity for `plant` in its current form, replacing any
/// previous handle under the same key.
pub fn spawn_representation(
    commands: &mut Commands,
    physics: &mut PhysicsWorld,
    entities: &mut PlantEntities,
    key: PlotKey,
    plant: &PlantedEntity,
    mode: TimeMode,
) -> Entity {
    entities.discard(&key, commands, physics);

    let (footprint, sprite) = match plant.form {
        PlantForm::Seed => (
            seed_footprint(plant.position),
            Sprite {
                color: SEED_COLOR,
                custom_size: Some(Vec2::ONE),
                ..default()
            },
        ),
        PlantForm::Mature => {
            let height = plant.assigned_height.unwrap_or(MIN_PLANT_HEIGHT);
            let footprint = mature_footprint(plant.position, height);
            (
                footprint,
                Sprite {
                    color: PLANT_COLOR,
                    custom_size: Some(footprint.size()),
                    ..default()
                },
            )
        }
    };

    let collider = physics.add_body(ColliderKind::Plant, footprint);
    let tag = form_tag(plant.form);
    let center = footprint.center();
    let entity = commands
        .spawn((
            sprite,
            Transform::from_xyz(center.x, center.y, PLANT_Z),
            tag.visibility(mode),
            tag,
            PlantVisual {
                key,
                form: plant.form,
            },
            BodyCollider(collider),
            SessionEntity,
        ))
        .id();

    entities.handles.insert(key, PlantHandle { entity, collider });
    entity
}
