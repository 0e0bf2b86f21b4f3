//! Realizes chunk blueprints into tiles and colliders, and clears them again.

use bevy::prelude::*;
use rand::Rng;
use std::collections::HashMap;

use crate::physics::PhysicsWorld;
use crate::shared::*;
use super::chunks::{ChunkWindow, WindowDelta};
use super::generator::{generate_chunk, ChunkBlueprint, TerrainParams};

const PAST_SOIL: Color = Color::srgb(0.42, 0.40, 0.38);
const PAST_TOP: Color = Color::srgb(0.52, 0.50, 0.44);
const PRESENT_SOIL: Color = Color::srgb(0.45, 0.32, 0.20);
const PRESENT_TOP: Color = Color::srgb(0.30, 0.62, 0.28);

/// Upper bound (exclusive) of a randomly drawn session seed.
const SESSION_SEED_RANGE: u32 = 10_000;
/// Offset of the boundary wall from the left boundary chunk's start column.
const BOUNDARY_WALL_OFFSET: f32 = 8.0;

#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainTile {
    pub chunk: i32,
}

/// Everything a realized chunk put into the world.
#[derive(Debug, Clone, Default)]
pub struct ChunkRecord {
    pub cells: Vec<IVec2>,
    pub tiles: Vec<Entity>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct RealizedChunks {
    pub chunks: HashMap<i32, ChunkRecord>,
}

pub fn reset_terrain(
    mut window: ResMut<ChunkWindow>,
    mut realized: ResMut<RealizedChunks>,
    mut boundary: ResMut<WorldBoundary>,
) {
    *window = ChunkWindow::default();
    realized.chunks.clear();
    *boundary = WorldBoundary::default();
}

/// True until a session's first window has been realized.
pub fn terrain_uninitialized(window: Res<ChunkWindow>) -> bool {
    window.last_center.is_none()
}

/// Fixes the left boundary and seed for the session and realizes the first
/// window. Runs on entering Playing, and again each frame afterwards while a
/// late main camera is still missing.
pub fn initialize_terrain(
    mut commands: Commands,
    config: Res<GameConfig>,
    timeline: Res<Timeline>,
    camera: Query<(&Transform, Option<&OrthographicProjection>), With<MainCamera>>,
    mut physics: ResMut<PhysicsWorld>,
    mut window: ResMut<ChunkWindow>,
    mut realized: ResMut<RealizedChunks>,
    mut boundary: ResMut<WorldBoundary>,
) {
    let Ok((transform, projection)) = camera.get_single() else {
        debug!("[Terrain] No main camera yet; waiting to realize the first window");
        return;
    };

    let chunk_width = config.chunk_width as f32;
    let view_width = projection
        .map(|p| p.area.width())
        .filter(|w| *w > 0.0)
        .unwrap_or(config.view_width);
    let camera_x = transform.translation.x;

    let left_boundary = slice_index(camera_x - view_width / 2.0, chunk_width);
    let start_chunk = slice_index(camera_x, chunk_width);
    let seed = config
        .global_seed
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..SESSION_SEED_RANGE));

    physics.set_bedrock_height(config.ground_height);
    *window = ChunkWindow::new(
        left_boundary,
        start_chunk,
        seed,
        config.chunks_ahead,
        config.chunks_behind,
    );
    info!(
        "[Terrain] Session seed {}, left boundary chunk {}, start chunk {}",
        seed, left_boundary, start_chunk
    );

    let wall_x = left_boundary as f32 * chunk_width + BOUNDARY_WALL_OFFSET;
    physics.add_body(
        ColliderKind::Obstacle,
        Rect::new(wall_x - 1.0, 0.0, wall_x, config.chunk_height as f32),
    );
    boundary.wall_x = Some(wall_x);
    info!("[Terrain] Left boundary wall at x = {}", wall_x);

    let delta = window.recenter(start_chunk);
    apply_window_delta(
        &mut commands,
        &mut physics,
        &mut realized,
        &window,
        &config,
        timeline.mode,
        delta,
    );
}

/// Follows the main camera and keeps the realized window in step with it.
pub fn stream_chunks(
    mut commands: Commands,
    config: Res<GameConfig>,
    timeline: Res<Timeline>,
    camera: Query<&Transform, With<MainCamera>>,
    mut physics: ResMut<PhysicsWorld>,
    mut window: ResMut<ChunkWindow>,
    mut realized: ResMut<RealizedChunks>,
) {
    if window.last_center.is_none() {
        return;
    }
    let Ok(transform) = camera.get_single() else {
        return;
    };

    let delta = window.on_reference_point_moved(transform.translation.x, config.chunk_width as f32);
    if delta.is_empty() {
        return;
    }
    apply_window_delta(
        &mut commands,
        &mut physics,
        &mut realized,
        &window,
        &config,
        timeline.mode,
        delta,
    );
}

fn apply_window_delta(
    commands: &mut Commands,
    physics: &mut PhysicsWorld,
    realized: &mut RealizedChunks,
    window: &ChunkWindow,
    config: &GameConfig,
    mode: TimeMode,
    delta: WindowDelta,
) {
    let mut cleared = Vec::new();
    for index in delta.evict {
        let Some(record) = realized.chunks.remove(&index) else {
            continue;
        };
        for tile in record.tiles {
            commands.entity(tile).despawn();
        }
        cleared.extend(record.cells);
        debug!("[Terrain] Evicted chunk {}", index);
    }
    if !cleared.is_empty() {
        physics.remove_cells(cleared);
    }

    let params = TerrainParams::from_config(config, window.start_chunk);
    let mut solid = Vec::new();
    for index in delta.generate {
        let blueprint = generate_chunk(index, window.global_seed, &params);
        let cells: Vec<IVec2> = blueprint.world_cells().collect();
        let tiles = spawn_chunk_tiles(commands, &blueprint, mode);
        solid.extend(cells.iter().copied());
        realized.chunks.insert(index, ChunkRecord { cells, tiles });
        debug!("[Terrain] Generated chunk {}", index);
    }
    if !solid.is_empty() {
        physics.insert_cells(solid);
    }
}

/// Spawns one past tile and one present tile per ground cell.
fn spawn_chunk_tiles(commands: &mut Commands, blueprint: &ChunkBlueprint, mode: TimeMode) -> Vec<Entity> {
    let mut tiles = Vec::new();
    for local in blueprint.grid.ground_cells() {
        let exposed = !blueprint.grid.is_ground(local.x, local.y + 1);
        let world = Vec2::new((blueprint.start_x + local.x) as f32, local.y as f32) + Vec2::splat(0.5);

        for (tag, soil, top) in [
            (TimelineTag::PastOnly, PAST_SOIL, PAST_TOP),
            (TimelineTag::PresentOnly, PRESENT_SOIL, PRESENT_TOP),
        ] {
            let color = if exposed { top } else { soil };
            let entity = commands
                .spawn((
                    Sprite {
                        color,
                        custom_size: Some(Vec2::ONE),
                        ..default()
                    },
                    Transform::from_xyz(world.x, world.y, TERRAIN_Z),
                    tag.visibility(mode),
                    tag,
                    TerrainTile {
                        chunk: blueprint.index,
                    },
                    SessionEntity,
                ))
                .id();
            tiles.push(entity);
        }
    }
    tiles
}
