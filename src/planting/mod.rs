//! Planting domain plugin for Timebloom.
//!
//! Provides:
//! - Seed placement with ground, obstacle, clearance and lateral checks
//! - Per-plot height caps and lazily assigned mature heights
//! - Passed / grown tracking for every planted record
//! - Seed ↔ mature swaps on every time switch, with growth animation and sway
//! - Clearing of unpassed seeds when returning to the past

pub mod growth;
pub mod passing;
pub mod placement;
pub mod render;
pub mod transitions;

use bevy::prelude::*;

use crate::physics::PhysicsWorld;
use crate::shared::*;

pub use placement::{attempt_plant, validate_placement, PlacementRejection, PlantingError};
pub use render::{PlantEntities, PlantHandle, PlantVisual};

pub struct PlantingPlugin;

impl Plugin for PlantingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Garden>();
        app.init_resource::<PlantEntities>();
        app.init_resource::<GrowthCounter>();
        app.init_resource::<PlantingAction>();

        app.add_systems(OnEnter(GameState::Loading), reset_planting);
        app.add_systems(
            Update,
            (
                tick_planting_action,
                handle_plant_requests,
                track_passed_plants,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
        app.add_systems(
            Update,
            respond_to_time_switch
                .in_set(TimelineSet::Respond)
                .run_if(in_state(GameState::Playing)),
        );
        // Animations keep running behind the end screens.
        app.add_systems(Update, (growth::animate_growth, growth::sway_plants));
    }
}

fn reset_planting(
    mut garden: ResMut<Garden>,
    mut entities: ResMut<PlantEntities>,
    mut action: ResMut<PlantingAction>,
) {
    garden.plants.clear();
    entities.handles.clear();
    *action = PlantingAction::default();
}

pub fn tick_planting_action(time: Res<Time>, mut action: ResMut<PlantingAction>) {
    action.timer.tick(time.delta());
}

/// Turns each plant request into a planting attempt in front of the player.
pub fn handle_plant_requests(
    mut commands: Commands,
    mut requests: EventReader<PlantRequestEvent>,
    mut planted: EventWriter<SeedPlantedEvent>,
    config: Res<GameConfig>,
    timeline: Res<Timeline>,
    counter: Res<GrowthCounter>,
    mut action: ResMut<PlantingAction>,
    mut garden: ResMut<Garden>,
    mut physics: ResMut<PhysicsWorld>,
    mut entities: ResMut<PlantEntities>,
    player: Query<(&Transform, &PlayerMotion), With<Player>>,
) {
    for _ in requests.read() {
        let Ok((transform, motion)) = player.get_single() else {
            warn!("[Planting] Plant requested with no player in the world");
            continue;
        };

        let result = attempt_plant(
            &mut garden,
            &*physics,
            transform.translation.truncate(),
            motion.facing,
            timeline.mode,
            counter.is_growing(),
            &config,
        );

        match result {
            Ok(position) => {
                let key = PlotKey::from_position(position);
                if let Some(plant) = garden.plants.get(&key) {
                    render::spawn_representation(
                        &mut commands,
                        &mut physics,
                        &mut entities,
                        key,
                        plant,
                        timeline.mode,
                    );
                    info!(
                        "[Planting] Seed planted at ({:.1}, {:.1}), max height {}",
                        position.x, position.y, plant.max_safe_height
                    );
                }
                action.start(config.plant_action_seconds);
                planted.send(SeedPlantedEvent { position });
            }
            Err(PlantingError::Rejected(reason)) => {
                info!("[Planting] Cannot plant here: {}", reason);
            }
            Err(err) => {
                debug!("[Planting] Plant request ignored: {}", err);
            }
        }
    }
}

pub fn track_passed_plants(
    config: Res<GameConfig>,
    physics: Res<PhysicsWorld>,
    mut garden: ResMut<Garden>,
    player: Query<&Transform, With<Player>>,
) {
    let Ok(transform) = player.get_single() else {
        return;
    };
    for key in passing::update_passed_status(&mut garden, &*physics, transform.translation.x, &config) {
        debug!("[Planting] Plot {:?} passed", key);
    }
}

/// Swaps every record's representation after a time switch.
pub fn respond_to_time_switch(
    mut commands: Commands,
    mut switches: EventReader<TimeModeChangedEvent>,
    config: Res<GameConfig>,
    counter: Res<GrowthCounter>,
    mut garden: ResMut<Garden>,
    mut physics: ResMut<PhysicsWorld>,
    mut entities: ResMut<PlantEntities>,
    player: Query<(Entity, &Transform), With<Player>>,
) {
    for change in switches.read() {
        let player = player.get_single().ok();
        match change.to {
            TimeMode::Past => {
                let reverted = transitions::transition_to_seed(&mut garden);
                for key in &reverted {
                    if let Some(plant) = garden.plants.get(key) {
                        render::spawn_representation(&mut commands, &mut physics, &mut entities, *key, plant, change.to);
                    }
                }

                let player_x = player.map_or(f32::NEG_INFINITY, |(_, tf)| tf.translation.x);
                let cleared = transitions::clear_unpassed(&mut garden, &*physics, player_x);
                for key in &cleared {
                    entities.discard(key, &mut commands, &mut physics);
                }
                info!(
                    "[Planting] Back to seeds: {} reverted, {} cleared",
                    reverted.len(),
                    cleared.len()
                );
            }
            TimeMode::Present => {
                let feet = player.map(|(_, tf)| tf.translation.truncate() - Vec2::Y * PLAYER_SIZE.y / 2.0);
                let orders = transitions::transition_to_mature(&mut garden, feet, &mut rand::thread_rng());
                for order in &orders {
                    let Some(plant) = garden.plants.get(&order.key) else {
                        continue;
                    };
                    let entity = render::spawn_representation(
                        &mut commands,
                        &mut physics,
                        &mut entities,
                        order.key,
                        plant,
                        change.to,
                    );
                    let rider = if order.rider { player.map(|(e, _)| e) } else { None };
                    commands.entity(entity).insert(growth::GrowthAnimation::new(
                        counter.begin(),
                        order.footprint,
                        config.growth_duration,
                        rider,
                    ));
                }
                info!("[Planting] {} plant(s) growing", orders.len());
            }
        }
    }
}
