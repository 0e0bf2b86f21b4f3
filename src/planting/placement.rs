//! Where a seed may go, and how tall it may ever grow there.

use bevy::prelude::*;
use std::fmt;

use crate::shared::*;

/// Radius of the footprint overlap test around the candidate centre.
const FOOTPRINT_RADIUS: f32 = 0.2;
/// Horizontal offset of the two ground-support probes from the centre.
const SUPPORT_PROBE_INSET: f32 = 0.4;
const SUPPORT_PROBE_LENGTH: f32 = 0.1;
/// Half the seed's footprint width; ground this close sideways blocks it.
const SEED_HALF_SIZE: f32 = 0.5;
/// Hits nearer than this are inside the seed's own cell.
const MIN_CLEARANCE: f32 = 0.5;
/// How far up to look for a platform sitting right on top of the seed.
const PLATFORM_ABOVE_PROBE: f32 = 0.5;
/// Candidates this close to a floating platform's edge never grow past 1.
const FLOATING_EDGE_MARGIN: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementRejection {
    AlreadyOccupied,
    TooCloseToPlayer,
    Obstructed,
    UnsupportedGround,
    NoSafeHeight,
    LateralBlock,
}

impl fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PlacementRejection::AlreadyOccupied => "a seed is already planted there",
            PlacementRejection::TooCloseToPlayer => "too close to the player",
            PlacementRejection::Obstructed => "something is already in the way",
            PlacementRejection::UnsupportedGround => "no ground under both edges",
            PlacementRejection::NoSafeHeight => "no room to grow",
            PlacementRejection::LateralBlock => "blocked at the side",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for PlacementRejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantingError {
    NotPastMode,
    WorldFrozen,
    NoGroundBelowPlayer,
    Rejected(PlacementRejection),
}

impl fmt::Display for PlantingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantingError::NotPastMode => f.write_str("planting is only possible in the past"),
            PlantingError::WorldFrozen => f.write_str("a plant is still growing"),
            PlantingError::NoGroundBelowPlayer => f.write_str("no ground below the player"),
            PlantingError::Rejected(reason) => write!(f, "placement rejected: {reason}"),
        }
    }
}

impl std::error::Error for PlantingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlantingError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<PlacementRejection> for PlantingError {
    fn from(reason: PlacementRejection) -> Self {
        PlantingError::Rejected(reason)
    }
}

/// Checks a candidate seed centre and returns its maximum safe height.
pub fn validate_placement(
    garden: &Garden,
    world: &impl SpatialQuery,
    candidate: Vec2,
    player: Vec2,
    config: &GameConfig,
) -> Result<u8, PlacementRejection> {
    if garden.is_occupied(candidate) {
        return Err(PlacementRejection::AlreadyOccupied);
    }

    if candidate.distance(player) < config.player_min_distance {
        return Err(PlacementRejection::TooCloseToPlayer);
    }

    let solid = LayerMask::ALL.without(LayerMask::PLAYER);
    if !world.overlap_circle(candidate, FOOTPRINT_RADIUS, solid).is_empty() {
        return Err(PlacementRejection::Obstructed);
    }

    let bottom = candidate.y - SEED_HALF_SIZE;
    for dx in [-SUPPORT_PROBE_INSET, SUPPORT_PROBE_INSET] {
        let origin = Vec2::new(candidate.x + dx, bottom);
        if world
            .raycast(origin, Vec2::NEG_Y, SUPPORT_PROBE_LENGTH, LayerMask::GROUND)
            .is_none()
        {
            return Err(PlacementRejection::UnsupportedGround);
        }
    }

    let mut max_safe = max_safe_height(world, candidate)?;

    for dir in [Vec2::NEG_X, Vec2::X] {
        if world.raycast(candidate, dir, SEED_HALF_SIZE, LayerMask::GROUND).is_some() {
            return Err(PlacementRejection::LateralBlock);
        }
        // Only obstacles count here, neighbouring plants never block.
        if world
            .raycast(candidate, dir, config.side_check_distance, LayerMask::OBSTACLE)
            .is_some()
        {
            return Err(PlacementRejection::LateralBlock);
        }
    }

    if let Some((left, right)) = floating_platform_edges_above(world, candidate) {
        let near_edge = (candidate.x - left).abs() <= FLOATING_EDGE_MARGIN
            || (candidate.x - right).abs() <= FLOATING_EDGE_MARGIN;
        if near_edge {
            max_safe = max_safe.min(MIN_PLANT_HEIGHT);
        }
    }

    Ok(max_safe)
}

/// Probes upward 1, 2 and 3 units. The first blocked height `h` caps the
/// result at `h - 1`, floored at 1.
fn max_safe_height(world: &impl SpatialQuery, candidate: Vec2) -> Result<u8, PlacementRejection> {
    let mask = LayerMask::ALL.without(LayerMask::PLAYER);
    for height in MIN_PLANT_HEIGHT..=MAX_PLANT_HEIGHT {
        let Some(hit) = world.raycast(candidate, Vec2::Y, height as f32, mask) else {
            continue;
        };
        if hit.distance < MIN_CLEARANCE {
            return Err(PlacementRejection::NoSafeHeight);
        }
        return Ok((height - 1).max(MIN_PLANT_HEIGHT));
    }
    Ok(MAX_PLANT_HEIGHT)
}

/// Left and right edges of a floating platform directly above `position`.
pub fn floating_platform_edges_above(world: &impl SpatialQuery, position: Vec2) -> Option<(f32, f32)> {
    let hit = world.raycast(position, Vec2::Y, PLATFORM_ABOVE_PROBE, LayerMask::GROUND)?;
    if hit.kind != ColliderKind::FloatingPlatform {
        return None;
    }
    let bounds = world.collider_bounds(hit.collider)?;
    Some((bounds.min.x, bounds.max.x))
}

/// Candidate seed centre in front of the player: one unit ahead, resting on
/// the ground found straight below.
pub fn planting_spot(
    world: &impl SpatialQuery,
    player: Vec2,
    facing: f32,
    config: &GameConfig,
) -> Result<Vec2, PlantingError> {
    let hit = world
        .raycast(player, Vec2::NEG_Y, config.plant_check_distance, LayerMask::GROUND)
        .ok_or(PlantingError::NoGroundBelowPlayer)?;
    let facing = if facing < 0.0 { -1.0 } else { 1.0 };
    Ok(Vec2::new(hit.point.x + facing, hit.point.y + SEED_HALF_SIZE))
}

/// Full planting attempt. On success the seed is recorded in the garden and
/// its centre returned; on failure nothing is touched.
pub fn attempt_plant(
    garden: &mut Garden,
    world: &impl SpatialQuery,
    player: Vec2,
    facing: f32,
    mode: TimeMode,
    growing: bool,
    config: &GameConfig,
) -> Result<Vec2, PlantingError> {
    if mode != TimeMode::Past {
        return Err(PlantingError::NotPastMode);
    }
    if growing {
        return Err(PlantingError::WorldFrozen);
    }

    let candidate = planting_spot(world, player, facing, config)?;
    let max_safe = validate_placement(garden, world, candidate, player, config)?;

    garden.plants.insert(
        PlotKey::from_position(candidate),
        PlantedEntity::seed(candidate, max_safe),
    );
    Ok(candidate)
}
