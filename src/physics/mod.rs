//! Physics domain: the 2D collision world every spatial query runs against.
//!
//! Terrain is stored as solid unit cells grouped into connected bodies, the
//! way a merged tilemap collider would see them. Everything else (player,
//! plants, the boundary wall) is a free axis-aligned box.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::shared::*;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsWorld>()
            .add_systems(OnEnter(GameState::Loading), reset_physics_world);
    }
}

fn reset_physics_world(mut world: ResMut<PhysicsWorld>) {
    *world = PhysicsWorld::default();
}

#[derive(Debug, Clone, Copy)]
struct TerrainBody {
    bounds: Rect,
    anchored: bool,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    bounds: Rect,
    kind: ColliderKind,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct PhysicsWorld {
    /// Cells below this row are bedrock; terrain touching them is anchored.
    bedrock_height: i32,
    /// Solid cell → terrain body label.
    cells: HashMap<IVec2, u32>,
    terrain: Vec<TerrainBody>,
    bodies: HashMap<u32, Body>,
    next_body: u32,
}

impl PhysicsWorld {
    pub fn new(bedrock_height: i32) -> Self {
        Self {
            bedrock_height,
            ..default()
        }
    }

    pub fn set_bedrock_height(&mut self, bedrock_height: i32) {
        self.bedrock_height = bedrock_height;
        self.relabel_terrain();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Terrain
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_cells(&mut self, cells: impl IntoIterator<Item = IVec2>) {
        for cell in cells {
            self.cells.insert(cell, 0);
        }
        self.relabel_terrain();
    }

    pub fn remove_cells(&mut self, cells: impl IntoIterator<Item = IVec2>) {
        for cell in cells {
            self.cells.remove(&cell);
        }
        self.relabel_terrain();
    }

    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn solid_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Flood-fills solid cells into connected bodies.
    fn relabel_terrain(&mut self) {
        self.terrain.clear();
        let mut seen: HashSet<IVec2> = HashSet::with_capacity(self.cells.len());
        let mut starts: Vec<IVec2> = self.cells.keys().copied().collect();
        starts.sort_by_key(|c| (c.x, c.y));

        let mut labels: Vec<(IVec2, u32)> = Vec::with_capacity(self.cells.len());
        for start in starts {
            if !seen.insert(start) {
                continue;
            }
            let label = self.terrain.len() as u32;
            let mut min = start;
            let mut max = start;
            let mut anchored = false;
            let mut queue = VecDeque::from([start]);
            while let Some(cell) = queue.pop_front() {
                labels.push((cell, label));
                min = min.min(cell);
                max = max.max(cell);
                anchored |= cell.y < self.bedrock_height;
                for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
                    let next = cell + step;
                    if self.cells.contains_key(&next) && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            self.terrain.push(TerrainBody {
                bounds: Rect::new(
                    min.x as f32,
                    min.y as f32,
                    (max.x + 1) as f32,
                    (max.y + 1) as f32,
                ),
                anchored,
            });
        }
        for (cell, label) in labels {
            self.cells.insert(cell, label);
        }
    }

    fn terrain_kind(&self, label: u32) -> ColliderKind {
        match self.terrain.get(label as usize) {
            Some(body) if !body.anchored => ColliderKind::FloatingPlatform,
            _ => ColliderKind::Ground,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bodies
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_body(&mut self, kind: ColliderKind, bounds: Rect) -> ColliderId {
        let id = self.next_body;
        self.next_body += 1;
        self.bodies.insert(id, Body { bounds, kind });
        ColliderId::Body(id)
    }

    pub fn move_body(&mut self, id: ColliderId, bounds: Rect) {
        if let ColliderId::Body(id) = id {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.bounds = bounds;
            }
        }
    }

    pub fn remove_body(&mut self, id: ColliderId) {
        if let ColliderId::Body(id) = id {
            self.bodies.remove(&id);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Bounds of every solid piece strictly overlapping `rect` (touching edges
    /// do not count). Terrain is reported per cell so callers can resolve
    /// against the nearest face.
    pub fn overlapping(&self, rect: Rect, mask: LayerMask, ignore: Option<ColliderId>) -> Vec<Rect> {
        let mut out = Vec::new();
        if mask.intersects(LayerMask::GROUND) {
            for y in rect.min.y.floor() as i32..=rect.max.y.floor() as i32 {
                for x in rect.min.x.floor() as i32..=rect.max.x.floor() as i32 {
                    let cell = IVec2::new(x, y);
                    if !self.cells.contains_key(&cell) {
                        continue;
                    }
                    let cell_rect = cell_rect(cell);
                    if strictly_overlaps(rect, cell_rect) {
                        out.push(cell_rect);
                    }
                }
            }
        }
        for (&id, body) in &self.bodies {
            if ignore == Some(ColliderId::Body(id)) || !mask.intersects(body.kind.layer()) {
                continue;
            }
            if strictly_overlaps(rect, body.bounds) {
                out.push(body.bounds);
            }
        }
        out
    }
}

impl SpatialQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        let end = origin + dir * max_distance;
        let mut best: Option<RayHit> = None;
        let mut consider = |hit: RayHit| {
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        };

        if mask.intersects(LayerMask::GROUND) {
            let lo = origin.min(end);
            let hi = origin.max(end);
            for y in (lo.y.floor() as i32 - 1)..=hi.y.floor() as i32 {
                for x in (lo.x.floor() as i32 - 1)..=hi.x.floor() as i32 {
                    let cell = IVec2::new(x, y);
                    let Some(&label) = self.cells.get(&cell) else {
                        continue;
                    };
                    if let Some((t, normal)) = ray_box(origin, dir, max_distance, cell_rect(cell)) {
                        consider(RayHit {
                            point: origin + dir * t,
                            normal,
                            distance: t,
                            collider: ColliderId::Terrain(label),
                            kind: self.terrain_kind(label),
                        });
                    }
                }
            }
        }

        for (&id, body) in &self.bodies {
            if !mask.intersects(body.kind.layer()) {
                continue;
            }
            if let Some((t, normal)) = ray_box(origin, dir, max_distance, body.bounds) {
                consider(RayHit {
                    point: origin + dir * t,
                    normal,
                    distance: t,
                    collider: ColliderId::Body(id),
                    kind: body.kind,
                });
            }
        }

        best
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<ColliderId> {
        let mut found = Vec::new();
        if mask.intersects(LayerMask::GROUND) {
            let lo = center - Vec2::splat(radius);
            let hi = center + Vec2::splat(radius);
            for y in (lo.y.floor() as i32 - 1)..=hi.y.floor() as i32 {
                for x in (lo.x.floor() as i32 - 1)..=hi.x.floor() as i32 {
                    let cell = IVec2::new(x, y);
                    let Some(&label) = self.cells.get(&cell) else {
                        continue;
                    };
                    let id = ColliderId::Terrain(label);
                    if circle_touches(center, radius, cell_rect(cell)) && !found.contains(&id) {
                        found.push(id);
                    }
                }
            }
        }
        for (&id, body) in &self.bodies {
            if mask.intersects(body.kind.layer()) && circle_touches(center, radius, body.bounds) {
                found.push(ColliderId::Body(id));
            }
        }
        found
    }

    fn collider_bounds(&self, id: ColliderId) -> Option<Rect> {
        match id {
            ColliderId::Terrain(label) => self.terrain.get(label as usize).map(|b| b.bounds),
            ColliderId::Body(id) => self.bodies.get(&id).map(|b| b.bounds),
        }
    }
}

fn cell_rect(cell: IVec2) -> Rect {
    Rect::new(
        cell.x as f32,
        cell.y as f32,
        (cell.x + 1) as f32,
        (cell.y + 1) as f32,
    )
}

fn strictly_overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

fn circle_touches(center: Vec2, radius: f32, rect: Rect) -> bool {
    let closest = center.clamp(rect.min, rect.max);
    closest.distance_squared(center) <= radius * radius
}

/// Slab test. Returns the entry distance and surface normal, or distance 0
/// when the ray starts inside or on the boundary of the box.
fn ray_box(origin: Vec2, dir: Vec2, max_distance: f32, rect: Rect) -> Option<(f32, Vec2)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (rect.min[axis], rect.max[axis]);
        if d.abs() < 1e-6 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut t1, mut t2) = ((lo - o) / d, (hi - o) / d);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = Vec2::ZERO;
            normal[axis] = -d.signum();
        }
        t_exit = t_exit.min(t2);
    }

    if t_enter > t_exit || t_exit <= 0.0 {
        return None;
    }
    if t_enter <= 0.0 {
        return Some((0.0, -dir));
    }
    if t_enter > max_distance {
        return None;
    }
    Some((t_enter, normal))
}
