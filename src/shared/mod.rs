//! Shared components, resources, events, and states for Timebloom.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly; the physics world is
//! the one piece of infrastructure they share.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Won,
    GameOver,
}

/// Ordering for the time toggle: the switch is decided first, then every
/// domain that reacts to the new mode runs in the same frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineSet {
    Switch,
    Respond,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const SCREEN_WIDTH: f32 = 960.0;
pub const SCREEN_HEIGHT: f32 = 640.0;

pub const TERRAIN_Z: f32 = 0.0;
/// Planted entities are always drawn above the tilemap.
pub const PLANT_Z: f32 = 10.0;
pub const PLAYER_Z: f32 = 20.0;

/// Player collider size in world units.
pub const PLAYER_SIZE: Vec2 = Vec2::new(0.8, 1.0);
/// Player spawn column; the camera starts centred on it.
pub const PLAYER_SPAWN_X: f32 = 4.5;
/// World units visible vertically; the width follows the window aspect.
pub const VIEW_HEIGHT: f32 = 12.0;
/// The camera only scrolls horizontally, at this height.
pub const CAMERA_Y: f32 = 6.0;

/// Index of the fixed-width horizontal slice containing `x`.
/// Used for both chunks and sustenance regions.
pub fn slice_index(x: f32, width: f32) -> i32 {
    (x / width).floor() as i32
}

// ═══════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════

/// Every tunable, read once when a session loads and constant afterwards.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // Terrain
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub ground_height: i32,
    /// Chunks `0..safe_chunk_count` never get platforms.
    pub safe_chunk_count: i32,
    pub chunks_ahead: i32,
    pub chunks_behind: i32,
    /// `None` draws a fresh seed every session.
    pub global_seed: Option<u32>,
    /// Fallback camera view width in world units when no projection is available.
    pub view_width: f32,

    // Sustenance
    pub max_sustenance: f32,
    pub sustenance_decay_rate: f32,
    pub sustenance_bonus: f32,
    pub region_width: f32,
    /// Decay stays paused until the reference point first reaches this region.
    pub sustenance_start_region: i32,
    pub win_region: i32,

    // Planting
    pub plant_check_distance: f32,
    pub side_check_distance: f32,
    pub player_min_distance: f32,
    pub pass_probe_distance: f32,
    pub pass_margin: f32,
    pub pass_fallback_margin: f32,
    pub growth_duration: f32,
    pub plant_action_seconds: f32,

    // Player
    pub move_speed: f32,
    pub jump_force: f32,
    pub max_jump_time: f32,
    pub jump_cancel_multiplier: f32,
    pub gravity: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            chunk_width: 16,
            chunk_height: 20,
            ground_height: 3,
            safe_chunk_count: 6,
            chunks_ahead: 1,
            chunks_behind: 1,
            global_seed: None,
            view_width: 20.0,

            max_sustenance: 5.0,
            sustenance_decay_rate: 0.1,
            sustenance_bonus: 1.0,
            region_width: 16.0,
            sustenance_start_region: 3,
            win_region: 20,

            plant_check_distance: 1.5,
            side_check_distance: 1.0,
            player_min_distance: 0.75,
            pass_probe_distance: 5.0,
            pass_margin: 1.0,
            pass_fallback_margin: 3.0,
            growth_duration: 0.5,
            plant_action_seconds: 0.3,

            move_speed: 5.0,
            jump_force: 7.0,
            max_jump_time: 0.3,
            jump_cancel_multiplier: 0.5,
            gravity: 20.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SPATIAL QUERIES
// ═══════════════════════════════════════════════════════════════════════

/// Bit set of collision layers a query is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u8);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const GROUND: LayerMask = LayerMask(1 << 0);
    pub const OBSTACLE: LayerMask = LayerMask(1 << 1);
    pub const PLANT: LayerMask = LayerMask(1 << 2);
    pub const PLAYER: LayerMask = LayerMask(1 << 3);
    pub const ALL: LayerMask = LayerMask(0b1111);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn without(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 & !other.0)
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColliderId {
    /// A connected body of solid terrain cells.
    Terrain(u32),
    /// A free-standing box: player, plant, wall.
    Body(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    /// Terrain connected to bedrock.
    Ground,
    /// Terrain with no path down to bedrock.
    FloatingPlatform,
    Obstacle,
    Plant,
    Player,
}

impl ColliderKind {
    pub fn layer(self) -> LayerMask {
        match self {
            ColliderKind::Ground | ColliderKind::FloatingPlatform => LayerMask::GROUND,
            ColliderKind::Obstacle => LayerMask::OBSTACLE,
            ColliderKind::Plant => LayerMask::PLANT,
            ColliderKind::Player => LayerMask::PLAYER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
    pub collider: ColliderId,
    pub kind: ColliderKind,
}

/// Read-only view of the 2D collision world. Gameplay logic never mutates
/// the world through this trait.
pub trait SpatialQuery {
    /// Nearest hit along the ray. A ray starting inside (or on the edge of)
    /// a collider hits it at distance 0.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask)
        -> Option<RayHit>;

    /// Every collider on `mask` touching the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<ColliderId>;

    /// World-space bounds of a collider, if it still exists.
    fn collider_bounds(&self, id: ColliderId) -> Option<Rect>;
}

/// Left edge of the playable world, fixed when a session's terrain is laid out.
#[derive(Resource, Debug, Clone, Default)]
pub struct WorldBoundary {
    pub wall_x: Option<f32>,
}

// ═══════════════════════════════════════════════════════════════════════
// TIMELINE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeMode {
    Past,
    #[default]
    Present,
}

impl TimeMode {
    pub fn toggled(self) -> Self {
        match self {
            TimeMode::Past => TimeMode::Present,
            TimeMode::Present => TimeMode::Past,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Timeline {
    pub mode: TimeMode,
}

impl Timeline {
    pub fn is_past(&self) -> bool {
        self.mode == TimeMode::Past
    }
}

/// Render elements that only exist in one of the two timelines.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineTag {
    PastOnly,
    PresentOnly,
}

impl TimelineTag {
    pub fn visible_in(self, mode: TimeMode) -> bool {
        match self {
            TimelineTag::PastOnly => mode == TimeMode::Past,
            TimelineTag::PresentOnly => mode == TimeMode::Present,
        }
    }

    pub fn visibility(self, mode: TimeMode) -> Visibility {
        if self.visible_in(mode) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        }
    }
}

/// Number of growth animations currently in flight.
///
/// Each animation holds a [`GrowthTicket`]; dropping the ticket (animation
/// finished, or its entity despawned) releases the slot. While any ticket is
/// alive the world is frozen for the player: no movement, planting, or
/// time switching.
#[derive(Resource, Debug, Clone, Default)]
pub struct GrowthCounter(Arc<AtomicUsize>);

impl GrowthCounter {
    pub fn begin(&self) -> GrowthTicket {
        self.0.fetch_add(1, Ordering::SeqCst);
        GrowthTicket(Arc::clone(&self.0))
    }

    pub fn in_flight(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_growing(&self) -> bool {
        self.in_flight() > 0
    }
}

#[derive(Debug)]
pub struct GrowthTicket(Arc<AtomicUsize>);

impl Drop for GrowthTicket {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Short lock-out after a successful plant, during which the time toggle is refused.
#[derive(Resource, Debug, Clone)]
pub struct PlantingAction {
    pub timer: Timer,
}

impl Default for PlantingAction {
    fn default() -> Self {
        let mut timer = Timer::from_seconds(0.3, TimerMode::Once);
        timer.tick(timer.duration());
        Self { timer }
    }
}

impl PlantingAction {
    pub fn start(&mut self, seconds: f32) {
        self.timer = Timer::from_seconds(seconds, TimerMode::Once);
    }

    pub fn is_active(&self) -> bool {
        !self.timer.finished()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GARDEN: planted seeds and plants
// ═══════════════════════════════════════════════════════════════════════

/// World position quantized to 1/1000 of a unit. Two plantings resolve to the
/// same plot exactly when their keys match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlotKey(pub i32, pub i32);

impl PlotKey {
    pub fn from_position(pos: Vec2) -> Self {
        PlotKey((pos.x * 1000.0).round() as i32, (pos.y * 1000.0).round() as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantForm {
    Seed,
    Mature,
}

pub const MIN_PLANT_HEIGHT: u8 = 1;
pub const MAX_PLANT_HEIGHT: u8 = 3;

/// One planted seed through its whole lifecycle. The ECS entity that draws it
/// is swapped on every form change; this record is the identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantedEntity {
    pub position: Vec2,
    pub max_safe_height: u8,
    pub assigned_height: Option<u8>,
    pub form: PlantForm,
    pub passed: bool,
    pub grown: bool,
}

impl PlantedEntity {
    pub fn seed(position: Vec2, max_safe_height: u8) -> Self {
        Self {
            position,
            max_safe_height: max_safe_height.clamp(MIN_PLANT_HEIGHT, MAX_PLANT_HEIGHT),
            assigned_height: None,
            form: PlantForm::Seed,
            passed: false,
            grown: false,
        }
    }

    /// Assigns the mature height once; later calls keep the first value.
    pub fn assign_height_with(&mut self, pick: impl FnOnce(u8) -> u8) -> u8 {
        if let Some(height) = self.assigned_height {
            return height;
        }
        let height = pick(self.max_safe_height).clamp(MIN_PLANT_HEIGHT, self.max_safe_height);
        self.assigned_height = Some(height);
        height
    }

    /// Returns true only on the call that flips the flag.
    pub fn mark_passed(&mut self) -> bool {
        if self.passed {
            return false;
        }
        self.passed = true;
        true
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Garden {
    pub plants: BTreeMap<PlotKey, PlantedEntity>,
}

impl Garden {
    pub fn is_occupied(&self, position: Vec2) -> bool {
        self.plants.contains_key(&PlotKey::from_position(position))
    }

    pub fn get(&self, position: Vec2) -> Option<&PlantedEntity> {
        self.plants.get(&PlotKey::from_position(position))
    }

    pub fn passed_entities(&self) -> impl Iterator<Item = &PlantedEntity> {
        self.plants.values().filter(|p| p.passed)
    }

    pub fn grown_entities(&self) -> impl Iterator<Item = &PlantedEntity> {
        self.plants.values().filter(|p| p.grown)
    }

    pub fn every_passed_has_grown(&self) -> bool {
        self.passed_entities().all(|p| p.grown)
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SUSTENANCE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Won,
    Starved,
}

#[derive(Resource, Debug, Clone)]
pub struct Sustenance {
    pub current: f32,
    pub max: f32,
    /// Decay is suppressed until the start region is reached.
    pub paused: bool,
    pub outcome: Option<Outcome>,
    /// Region the reference point occupied on the previous tick.
    pub region: i32,
    pub planted_regions: HashSet<i32>,
    pub bonus_regions: HashSet<i32>,
    pub last_bonus_region: Option<i32>,
    pub elapsed_seconds: f32,
    /// False when a required collaborator was missing at activation.
    pub active: bool,
}

impl Default for Sustenance {
    fn default() -> Self {
        Self::new(GameConfig::default().max_sustenance)
    }
}

impl Sustenance {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            paused: true,
            outcome: None,
            region: 0,
            planted_regions: HashSet::new(),
            bonus_regions: HashSet::new(),
            last_bonus_region: None,
            elapsed_seconds: 0.0,
            active: true,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome == Some(Outcome::Starved)
    }

    pub fn has_won(&self) -> bool {
        self.outcome == Some(Outcome::Won)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component, Debug, Clone, Default)]
pub struct Player;

#[derive(Component, Debug, Clone)]
pub struct PlayerMotion {
    /// +1 facing right, -1 facing left.
    pub facing: f32,
    pub velocity: Vec2,
    pub grounded: bool,
    pub jumping: bool,
    pub jump_time_left: f32,
}

impl Default for PlayerMotion {
    fn default() -> Self {
        Self {
            facing: 1.0,
            velocity: Vec2::ZERO,
            grounded: false,
            jumping: false,
            jump_time_left: 0.0,
        }
    }
}

/// Collider registered for this entity in the physics world.
#[derive(Component, Debug, Clone, Copy)]
pub struct BodyCollider(pub ColliderId);

/// The camera whose position drives chunk streaming and region tracking.
#[derive(Component, Debug, Clone, Default)]
pub struct MainCamera;

/// Despawned wholesale when a session restarts.
#[derive(Component, Debug, Clone, Default)]
pub struct SessionEntity;

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Player asked to plant in front of them.
#[derive(Event, Debug, Clone)]
pub struct PlantRequestEvent;

/// A seed was successfully planted.
#[derive(Event, Debug, Clone)]
pub struct SeedPlantedEvent {
    pub position: Vec2,
}

/// Player asked to flip between past and present.
#[derive(Event, Debug, Clone)]
pub struct TimeToggleRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct TimeModeChangedEvent {
    pub from: TimeMode,
    pub to: TimeMode,
}

/// Player asked to start over from an end screen.
#[derive(Event, Debug, Clone)]
pub struct RestartRequestEvent;

// ═══════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════

/// A domain could not find something it needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCollaborator {
    pub component: &'static str,
    pub collaborator: &'static str,
}

impl fmt::Display for MissingCollaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cannot activate: required collaborator {} is missing",
            self.component, self.collaborator
        )
    }
}

impl std::error::Error for MissingCollaborator {}

/// Turns an optional collaborator into a hard requirement.
pub fn require<T>(
    found: Option<T>,
    component: &'static str,
    collaborator: &'static str,
) -> Result<T, MissingCollaborator> {
    found.ok_or(MissingCollaborator {
        component,
        collaborator,
    })
}
