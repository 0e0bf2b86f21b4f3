//! Seed ↔ mature form changes and the clearing pass that follows a switch
//! back to the past.
//!
//! These functions only rewrite the garden records. Swapping the rendered
//! entity and its collider is left to the caller, driven by the returned
//! plot keys.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;
use super::placement::floating_platform_edges_above;

/// Horizontal reach of the "standing on the seed" test.
const SEED_RIDER_REACH: f32 = 1.0;
/// Feet may sit this far below a top surface and still count as standing on it.
const RIDER_BELOW_TOP: f32 = 0.1;
/// ...or this far above it.
const RIDER_ABOVE_TOP: f32 = 0.2;
/// A passed seed under a floating platform is cleared anyway when the player
/// is this close to either platform edge.
const FLOATING_EDGE_CLEAR_DISTANCE: f32 = 1.0;

/// The seed's collider: a unit square centred on the planted position.
pub fn seed_footprint(position: Vec2) -> Rect {
    Rect::from_center_size(position, Vec2::ONE)
}

/// The mature collider: one unit wide, `height` tall, its bottom edge on the
/// seed's bottom edge.
pub fn mature_footprint(position: Vec2, height: u8) -> Rect {
    let base = seed_footprint(position).min.y;
    Rect::new(
        position.x - 0.5,
        base,
        position.x + 0.5,
        base + height as f32,
    )
}

fn within_top_band(feet_y: f32, top: f32) -> bool {
    feet_y >= top - RIDER_BELOW_TOP && feet_y <= top + RIDER_ABOVE_TOP
}

/// One seed that just became a plant and needs its growth played.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthOrder {
    pub key: PlotKey,
    pub height: u8,
    pub footprint: Rect,
    /// The player was standing on it when the switch happened.
    pub rider: bool,
}

/// Turns every seed into its mature form. Heights are assigned on the first
/// growth only; later growths reuse them.
pub fn transition_to_mature(
    garden: &mut Garden,
    player_feet: Option<Vec2>,
    rng: &mut impl Rng,
) -> Vec<GrowthOrder> {
    let mut orders = Vec::new();
    for (key, plant) in garden.plants.iter_mut() {
        if plant.form != PlantForm::Seed {
            continue;
        }
        let height = plant.assign_height_with(|max| rng.gen_range(MIN_PLANT_HEIGHT..=max));

        let seed = seed_footprint(plant.position);
        let footprint = mature_footprint(plant.position, height);
        let rider = player_feet.is_some_and(|feet| {
            let on_seed = (feet.x - plant.position.x).abs() <= SEED_RIDER_REACH
                && within_top_band(feet.y, seed.max.y);
            let on_plant = feet.x >= footprint.min.x
                && feet.x <= footprint.max.x
                && within_top_band(feet.y, footprint.max.y);
            on_seed || on_plant
        });

        plant.form = PlantForm::Mature;
        plant.grown = true;
        orders.push(GrowthOrder {
            key: *key,
            height,
            footprint,
            rider,
        });
    }
    orders
}

/// Turns every mature plant back into a seed at its original position.
pub fn transition_to_seed(garden: &mut Garden) -> Vec<PlotKey> {
    let mut reverted = Vec::new();
    for (key, plant) in garden.plants.iter_mut() {
        if plant.form == PlantForm::Mature {
            plant.form = PlantForm::Seed;
            reverted.push(*key);
        }
    }
    reverted
}

/// Removes every plant the player has not passed yet, plus passed ones
/// sitting under a floating platform whose edge the player is now next to.
pub fn clear_unpassed(garden: &mut Garden, world: &impl SpatialQuery, player_x: f32) -> Vec<PlotKey> {
    let doomed: Vec<PlotKey> = garden
        .plants
        .iter()
        .filter(|(_, plant)| {
            if !plant.passed {
                return true;
            }
            floating_platform_edges_above(world, plant.position).is_some_and(|(left, right)| {
                (player_x - left).abs() <= FLOATING_EDGE_CLEAR_DISTANCE
                    || (player_x - right).abs() <= FLOATING_EDGE_CLEAR_DISTANCE
            })
        })
        .map(|(key, _)| *key)
        .collect();

    for key in &doomed {
        garden.plants.remove(key);
    }
    doomed
}
