//! Terrain domain plugin for Timebloom.
//!
//! Provides:
//! - Deterministic chunk generation (bedrock floor + two platforms per chunk)
//! - A sliding window of realized chunks following the main camera
//! - A one-way boundary at the chunk visible when the session starts
//! - Past and present tilesets for every realized chunk

pub mod chunks;
pub mod generator;
mod streaming;

use bevy::prelude::*;
use crate::shared::*;

pub use chunks::{ChunkWindow, WindowDelta};
pub use generator::{generate_chunk, Cell, ChunkBlueprint, OccupancyGrid, PlatformBlueprint, TerrainParams};
pub use streaming::{ChunkRecord, RealizedChunks, TerrainTile};

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChunkWindow>();
        app.init_resource::<RealizedChunks>();
        app.init_resource::<WorldBoundary>();

        app.add_systems(OnEnter(GameState::Loading), streaming::reset_terrain);
        app.add_systems(OnEnter(GameState::Playing), streaming::initialize_terrain);
        app.add_systems(
            Update,
            (
                streaming::initialize_terrain.run_if(
                    streaming::terrain_uninitialized.and(any_with_component::<MainCamera>),
                ),
                streaming::stream_chunks,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
    }
}
