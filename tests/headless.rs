//! Headless integration tests for Timebloom.
//!
//! These tests exercise the game's ECS logic without a window or GPU.
//! They use Bevy's `MinimalPlugins` to tick the app, register only the
//! domain plugins a scenario needs (skipping player input, HUD and data
//! loading), and drive the camera and player by hand.
//!
//! Run with: `cargo test --test headless`

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use timebloom::physics::{PhysicsPlugin, PhysicsWorld};
use timebloom::planting::{PlantEntities, PlantingPlugin};
use timebloom::shared::*;
use timebloom::sustenance::SustenancePlugin;
use timebloom::terrain::{ChunkWindow, RealizedChunks, TerrainPlugin, TerrainTile};
use timebloom::timeline::TimelinePlugin;

// ─────────────────────────────────────────────────────────────────────────────
// Test App Builder
// ─────────────────────────────────────────────────────────────────────────────

fn test_config() -> GameConfig {
    GameConfig {
        global_seed: Some(42),
        chunks_ahead: 0,
        chunks_behind: 1,
        ..default()
    }
}

/// Builds a minimal Bevy app with the shared state, events and config
/// registered and a main camera over the spawn column. Every frame advances
/// time by a fixed quarter second.
fn build_test_app(config: GameConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(250)));

    // ── Game State ───────────────────────────────────────────────────────
    app.init_state::<GameState>();

    // ── Shared Resources ─────────────────────────────────────────────────
    app.insert_resource(config);

    // ── Shared Events (mirrors main.rs) ──────────────────────────────────
    app.add_event::<PlantRequestEvent>()
        .add_event::<SeedPlantedEvent>()
        .add_event::<TimeToggleRequestEvent>()
        .add_event::<TimeModeChangedEvent>()
        .add_event::<RestartRequestEvent>();

    app.world_mut().spawn((
        MainCamera,
        Transform::from_xyz(PLAYER_SPAWN_X, CAMERA_Y, 0.0),
    ));

    app
}

/// Transitions the test app to Playing state and ticks once to process it.
fn enter_playing_state(app: &mut App) {
    app.update(); // settle Loading
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Playing);
    app.update(); // process state transition
}

fn move_camera(app: &mut App, x: f32) {
    let world = app.world_mut();
    let mut query = world.query_filtered::<&mut Transform, With<MainCamera>>();
    for mut tf in query.iter_mut(world) {
        tf.translation.x = x;
    }
}

fn current_state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

fn active_chunks(app: &App) -> Vec<i32> {
    app.world().resource::<ChunkWindow>().active.iter().copied().collect()
}

fn spawn_test_player(app: &mut App, position: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Player,
            PlayerMotion::default(),
            Transform::from_xyz(position.x, position.y, PLAYER_Z),
        ))
        .id()
}

fn toggle_time(app: &mut App) {
    app.world_mut().send_event(TimeToggleRequestEvent);
    app.update();
}

// ─────────────────────────────────────────────────────────────────────────────
// Terrain streaming
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_chunk_window_follows_camera_and_evicts() {
    let mut app = build_test_app(test_config());
    app.add_plugins((PhysicsPlugin, TerrainPlugin, TimelinePlugin));
    enter_playing_state(&mut app);

    // View 20 wide centred on 4.5: boundary chunk -1, start chunk 0.
    assert_eq!(active_chunks(&app), vec![-1, 0]);

    move_camera(&mut app, 20.0);
    app.update();
    assert_eq!(active_chunks(&app), vec![0, 1]);

    move_camera(&mut app, 40.0);
    app.update();
    assert_eq!(active_chunks(&app), vec![1, 2]);

    move_camera(&mut app, 20.0);
    app.update();
    assert_eq!(active_chunks(&app), vec![0, 1]);

    // Realized records and physics cells stay in step with the window.
    let realized = app.world().resource::<RealizedChunks>();
    let mut keys: Vec<i32> = realized.chunks.keys().copied().collect();
    keys.sort();
    assert_eq!(keys, vec![0, 1]);
    let cell_total: usize = realized.chunks.values().map(|r| r.cells.len()).sum();
    assert_eq!(app.world().resource::<PhysicsWorld>().solid_cell_count(), cell_total);

    // Two tiles (past and present) per solid cell.
    let tiles = app
        .world_mut()
        .query::<&TerrainTile>()
        .iter(app.world())
        .count();
    assert_eq!(tiles, cell_total * 2);
}

#[test]
fn test_boundary_wall_is_placed_once() {
    let mut app = build_test_app(test_config());
    app.add_plugins((PhysicsPlugin, TerrainPlugin, TimelinePlugin));
    enter_playing_state(&mut app);

    assert_eq!(app.world().resource::<WorldBoundary>().wall_x, Some(-8.0));
    assert_eq!(app.world().resource::<PhysicsWorld>().body_count(), 1);
}

#[test]
fn test_terrain_waits_for_a_late_camera() {
    let mut app = build_test_app(test_config());
    app.add_plugins((PhysicsPlugin, TerrainPlugin, TimelinePlugin));
    let cameras: Vec<Entity> = app
        .world_mut()
        .query_filtered::<Entity, With<MainCamera>>()
        .iter(app.world())
        .collect();
    for camera in cameras {
        app.world_mut().despawn(camera);
    }
    enter_playing_state(&mut app);
    app.update();
    assert!(active_chunks(&app).is_empty());
    assert_eq!(app.world().resource::<WorldBoundary>().wall_x, None);

    app.world_mut().spawn((
        MainCamera,
        Transform::from_xyz(PLAYER_SPAWN_X, CAMERA_Y, 0.0),
    ));
    app.update();
    assert_eq!(active_chunks(&app), vec![-1, 0]);
    assert_eq!(app.world().resource::<WorldBoundary>().wall_x, Some(-8.0));

    // Realized once; later frames only stream.
    app.update();
    assert_eq!(app.world().resource::<PhysicsWorld>().body_count(), 1);
    move_camera(&mut app, 20.0);
    app.update();
    assert_eq!(active_chunks(&app), vec![0, 1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Sustenance
// ─────────────────────────────────────────────────────────────────────────────

fn sustenance_config() -> GameConfig {
    GameConfig {
        sustenance_start_region: 1,
        win_region: 5,
        ..test_config()
    }
}

#[test]
fn test_sustenance_runs_dry_after_fifty_seconds() {
    let mut app = build_test_app(sustenance_config());
    app.add_plugins((PhysicsPlugin, PlantingPlugin, TimelinePlugin, SustenancePlugin));
    enter_playing_state(&mut app);

    // Still paused in region 0.
    for _ in 0..8 {
        app.update();
    }
    assert_eq!(app.world().resource::<Sustenance>().current, 5.0);

    move_camera(&mut app, 20.0);
    for _ in 0..190 {
        app.update();
    }
    assert_eq!(current_state(&app), GameState::Playing);

    for _ in 0..30 {
        app.update();
    }
    assert_eq!(current_state(&app), GameState::GameOver);
    let sustenance = app.world().resource::<Sustenance>();
    assert_eq!(sustenance.current, 0.0);
    assert!(sustenance.is_game_over());
}

#[test]
fn test_sustenance_decays_at_once_when_starting_past_start_region() {
    let config = GameConfig {
        sustenance_start_region: 0,
        ..sustenance_config()
    };
    let mut app = build_test_app(config);
    app.add_plugins((PhysicsPlugin, PlantingPlugin, TimelinePlugin, SustenancePlugin));
    enter_playing_state(&mut app);
    assert!(!app.world().resource::<Sustenance>().paused);

    // The camera never leaves region 0.
    for _ in 0..4 {
        app.update();
    }
    let sustenance = app.world().resource::<Sustenance>();
    assert_eq!(sustenance.region, 0);
    assert!(sustenance.current < 5.0);
}

#[test]
fn test_reaching_win_region_wins() {
    let mut app = build_test_app(sustenance_config());
    app.add_plugins((PhysicsPlugin, PlantingPlugin, TimelinePlugin, SustenancePlugin));
    enter_playing_state(&mut app);

    move_camera(&mut app, 20.0);
    app.update();
    move_camera(&mut app, 5.0 * 16.0 + 1.0);
    app.update();
    app.update();

    assert_eq!(current_state(&app), GameState::Won);
    assert!(app.world().resource::<Sustenance>().has_won());
}

#[test]
fn test_sustenance_stays_inactive_without_garden() {
    let mut app = build_test_app(sustenance_config());
    app.add_plugins((TimelinePlugin, SustenancePlugin));
    enter_playing_state(&mut app);

    move_camera(&mut app, 20.0);
    for _ in 0..20 {
        app.update();
    }
    let sustenance = app.world().resource::<Sustenance>();
    assert!(!sustenance.active);
    assert_eq!(sustenance.current, 5.0);
    assert_eq!(current_state(&app), GameState::Playing);
}

// ─────────────────────────────────────────────────────────────────────────────
// Planting and the timeline
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_plant_grow_and_toggle_guard() {
    let config = GameConfig {
        growth_duration: 2.0,
        ..test_config()
    };
    let mut app = build_test_app(config);
    app.add_plugins((PhysicsPlugin, TerrainPlugin, TimelinePlugin, PlantingPlugin));
    enter_playing_state(&mut app);
    spawn_test_player(&mut app, Vec2::new(8.5, 3.5));

    // Planting is refused in the present.
    app.world_mut().send_event(PlantRequestEvent);
    app.update();
    assert!(app.world().resource::<Garden>().is_empty());

    toggle_time(&mut app);
    assert_eq!(app.world().resource::<Timeline>().mode, TimeMode::Past);

    app.world_mut().send_event(PlantRequestEvent);
    app.update();
    let garden = app.world().resource::<Garden>();
    assert_eq!(garden.len(), 1);
    let seed = garden.get(Vec2::new(9.5, 3.5)).cloned();
    assert_eq!(seed.as_ref().map(|p| p.max_safe_height), Some(3));
    assert!(app.world().resource::<PlantingAction>().is_active());

    // Toggle refused while the planting action runs.
    toggle_time(&mut app);
    assert_eq!(app.world().resource::<Timeline>().mode, TimeMode::Past);

    app.update();
    app.update();
    toggle_time(&mut app);
    assert_eq!(app.world().resource::<Timeline>().mode, TimeMode::Present);
    app.update();
    assert!(app.world().resource::<GrowthCounter>().is_growing());

    // Frozen until the growth animation finishes.
    toggle_time(&mut app);
    assert_eq!(app.world().resource::<Timeline>().mode, TimeMode::Present);

    for _ in 0..12 {
        app.update();
    }
    assert!(!app.world().resource::<GrowthCounter>().is_growing());

    // The mature plant stands on the ground with its assigned height.
    let garden = app.world().resource::<Garden>();
    let plant = garden.get(Vec2::new(9.5, 3.5)).cloned();
    let height = plant.as_ref().and_then(|p| p.assigned_height).unwrap_or(0);
    assert!((MIN_PLANT_HEIGHT..=3).contains(&height));

    let key = PlotKey::from_position(Vec2::new(9.5, 3.5));
    let collider = app
        .world()
        .resource::<PlantEntities>()
        .handles
        .get(&key)
        .map(|h| h.collider);
    let bounds = collider.and_then(|c| app.world().resource::<PhysicsWorld>().collider_bounds(c));
    let bounds = bounds.unwrap_or_default();
    assert!((bounds.min.y - 3.0).abs() < 1e-4);
    assert!((bounds.height() - height as f32).abs() < 1e-4);
}

#[test]
fn test_unpassed_seed_cleared_on_return_to_past() {
    let mut app = build_test_app(test_config());
    app.add_plugins((PhysicsPlugin, TerrainPlugin, TimelinePlugin, PlantingPlugin));
    enter_playing_state(&mut app);
    let player = spawn_test_player(&mut app, Vec2::new(8.5, 3.5));

    toggle_time(&mut app);
    app.world_mut().send_event(PlantRequestEvent);
    app.update();
    assert_eq!(app.world().resource::<Garden>().len(), 1);

    // Walk back left of the seed before it was ever passed.
    app.world_mut()
        .entity_mut(player)
        .insert(Transform::from_xyz(2.0, 3.5, PLAYER_Z));
    app.update();
    app.update();
    toggle_time(&mut app);
    for _ in 0..4 {
        app.update();
    }
    toggle_time(&mut app);

    assert_eq!(app.world().resource::<Timeline>().mode, TimeMode::Past);
    assert!(app.world().resource::<Garden>().is_empty());
    assert!(app.world().resource::<PlantEntities>().handles.is_empty());
}
