//! Marks plants the player has walked beyond.

use bevy::prelude::*;

use crate::shared::*;

/// Flags every unpassed plant the player is now far enough right of.
/// Returns the plots that flipped this call.
///
/// With ground ahead within `pass_probe_distance`, the player has to clear
/// that ground's near face by `pass_margin`; on open stretches, the plant
/// itself by `pass_fallback_margin`.
pub fn update_passed_status(
    garden: &mut Garden,
    world: &impl SpatialQuery,
    player_x: f32,
    config: &GameConfig,
) -> Vec<PlotKey> {
    let mut flipped = Vec::new();
    for (key, plant) in garden.plants.iter_mut() {
        if plant.passed {
            continue;
        }
        let threshold = match world.raycast(
            plant.position,
            Vec2::X,
            config.pass_probe_distance,
            LayerMask::GROUND,
        ) {
            Some(hit) => hit.point.x + config.pass_margin,
            None => plant.position.x + config.pass_fallback_margin,
        };
        if player_x > threshold && plant.mark_passed() {
            flipped.push(*key);
        }
    }
    flipped
}
