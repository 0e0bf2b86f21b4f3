//! Procedural chunk generation.
//!
//! Every chunk is a `width × height` occupancy grid: a flat bedrock floor
//! plus two platforms stamped from a random stream seeded by the chunk's
//! start column and the session seed. The same inputs always rebuild the
//! same grid, so an evicted chunk comes back exactly as it left.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::shared::GameConfig;

/// Platform widths are drawn from this table (3 is twice as likely).
const PLATFORM_WIDTHS: [i32; 3] = [2, 3, 3];
const PLATFORMS_PER_CHUNK: usize = 2;
/// Minimum empty columns between successive platforms.
const PLATFORM_GAP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Ground,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Cell::Empty; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Out-of-bounds reads are `Empty`.
    pub fn get(&self, x: i32, y: i32) -> Cell {
        self.index(x, y).map_or(Cell::Empty, |i| self.cells[i])
    }

    pub fn is_ground(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Cell::Ground
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Fills the rectangle, silently dropping the parts outside the grid.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        for py in y..y + height {
            for px in x..x + width {
                self.set(px, py, Cell::Ground);
            }
        }
    }

    pub fn ground_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Ground).count()
    }

    /// Local coordinates of every ground cell, row-major.
    pub fn ground_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width)
                .filter(move |&x| self.is_ground(x, y))
                .map(move |x| IVec2::new(x, y))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformBlueprint {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub floating: bool,
    pub tower: bool,
}

/// A generated chunk before it is realized into tiles and colliders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBlueprint {
    pub index: i32,
    pub start_x: i32,
    pub grid: OccupancyGrid,
    pub platforms: Vec<PlatformBlueprint>,
}

impl ChunkBlueprint {
    /// World-space cell coordinates of every ground cell.
    pub fn world_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        let offset = IVec2::new(self.start_x, 0);
        self.grid.ground_cells().map(move |c| c + offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainParams {
    pub width: i32,
    pub height: i32,
    pub ground_height: i32,
    /// Chunks `0..safe_chunk_count` are platform-free.
    pub safe_chunk_count: i32,
    /// The chunk the player starts in is always platform-free.
    pub start_chunk: i32,
}

impl TerrainParams {
    pub fn from_config(config: &GameConfig, start_chunk: i32) -> Self {
        Self {
            width: config.chunk_width,
            height: config.chunk_height,
            ground_height: config.ground_height,
            safe_chunk_count: config.safe_chunk_count,
            start_chunk,
        }
    }

    pub fn is_safe_chunk(&self, index: i32) -> bool {
        (0..self.safe_chunk_count).contains(&index) || index == self.start_chunk
    }
}

/// Deterministically generate chunk `index` for the given session seed.
pub fn generate_chunk(index: i32, global_seed: u32, params: &TerrainParams) -> ChunkBlueprint {
    let start_x = index * params.width;
    let mut grid = OccupancyGrid::new(params.width, params.height);

    // Bedrock
    grid.fill_rect(0, 0, params.width, params.ground_height);

    let platforms = if params.is_safe_chunk(index) {
        debug!("[Terrain] Chunk {} - no platforms (safe zone)", index);
        Vec::new()
    } else {
        let seed = (start_x as i64 + global_seed as i64) as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        stamp_platforms(&mut grid, &mut rng, index, params)
    };

    ChunkBlueprint {
        index,
        start_x,
        grid,
        platforms,
    }
}

/// Uniform integer in `[lo, hi)`, or `lo` when the range is empty.
fn range(rng: &mut StdRng, lo: i32, hi: i32) -> i32 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

fn stamp_platforms(
    grid: &mut OccupancyGrid,
    rng: &mut StdRng,
    index: i32,
    params: &TerrainParams,
) -> Vec<PlatformBlueprint> {
    let w = params.width;
    let g = params.ground_height;

    let mut heights = [range(rng, 2, 4), range(rng, 3, 6)];
    let tower = range(rng, 0, PLATFORMS_PER_CHUNK as i32) as usize;
    heights[tower] = range(rng, 5, 8);

    let mut widths = [0; PLATFORMS_PER_CHUNK];
    let mut xs = [0; PLATFORMS_PER_CHUNK];
    widths[0] = PLATFORM_WIDTHS[rng.gen_range(0..PLATFORM_WIDTHS.len())];
    xs[0] = range(rng, 0, w / 5);
    widths[1] = PLATFORM_WIDTHS[rng.gen_range(0..PLATFORM_WIDTHS.len())];
    let min_x = xs[0] + widths[0] + PLATFORM_GAP;
    xs[1] = range(rng, min_x, (2 * w / 3).min(w - widths[1]));

    let ys = [range(rng, g + 3, g + 6), range(rng, g + 2, g + 5)];
    let floating = range(rng, 0, PLATFORMS_PER_CHUNK as i32) as usize;

    let mut placed = Vec::with_capacity(PLATFORMS_PER_CHUNK);
    for i in 0..PLATFORMS_PER_CHUNK {
        let x = xs[i];
        let y = if i == floating { ys[i] } else { g };
        let mut width = widths[i];
        let mut height = heights[i];

        if x + width > w {
            width = w - x;
        }
        if width < 1 {
            debug!("[Terrain] Chunk {} - platform {} skipped, no room horizontally", index, i + 1);
            continue;
        }
        if y + height >= params.height {
            height = params.height - y - 1;
        }
        if height < 1 {
            debug!("[Terrain] Chunk {} - platform {} skipped, no room vertically", index, i + 1);
            continue;
        }

        grid.fill_rect(x, y, width, height);
        placed.push(PlatformBlueprint {
            x,
            y,
            width,
            height,
            floating: i == floating,
            tower: i == tower,
        });
    }

    debug!("[Terrain] Chunk {} - {} platform(s) placed", index, placed.len());
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TerrainParams {
        TerrainParams {
            width: 16,
            height: 20,
            ground_height: 3,
            safe_chunk_count: 6,
            start_chunk: 0,
        }
    }

    #[test]
    fn same_inputs_give_identical_grids() {
        let p = params();
        for index in [-3, 6, 7, 42, 1000] {
            assert_eq!(generate_chunk(index, 1234, &p), generate_chunk(index, 1234, &p));
        }
    }

    #[test]
    fn bedrock_rows_are_always_solid() {
        let p = params();
        for index in -5..40 {
            let chunk = generate_chunk(index, 77, &p);
            for x in 0..p.width {
                for y in 0..p.ground_height {
                    assert!(chunk.grid.is_ground(x, y), "chunk {index} missing bedrock at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn safe_chunks_and_start_chunk_are_flat() {
        let p = TerrainParams {
            start_chunk: 11,
            ..params()
        };
        for index in (0..6).chain([11]) {
            let chunk = generate_chunk(index, 5, &p);
            assert!(chunk.platforms.is_empty());
            assert_eq!(chunk.grid.ground_count(), (p.width * p.ground_height) as usize);
        }
    }

    #[test]
    fn platforms_respect_gap_bounds_and_floating_rule() {
        let p = params();
        for seed in 0..50u32 {
            for index in 6..30 {
                let chunk = generate_chunk(index, seed, &p);
                assert!(chunk.platforms.len() <= 2);
                assert!(chunk.platforms.iter().filter(|pl| pl.floating).count() <= 1);
                for pl in &chunk.platforms {
                    assert!(pl.width >= 1 && pl.height >= 1);
                    assert!(pl.x >= 0 && pl.x + pl.width <= p.width);
                    assert!(pl.y + pl.height < p.height);
                    if !pl.floating {
                        assert_eq!(pl.y, p.ground_height);
                    } else {
                        assert!(pl.y > p.ground_height);
                    }
                }
                if let [a, b] = chunk.platforms.as_slice() {
                    assert!(b.x >= a.x + a.width + 2, "gap too small in chunk {index} seed {seed}");
                    assert_eq!(chunk.platforms.iter().filter(|pl| pl.floating).count(), 1);
                }
            }
        }
    }

    #[test]
    fn short_chunks_clip_platform_height() {
        let p = TerrainParams {
            height: 6,
            ..params()
        };
        for index in 6..40 {
            let chunk = generate_chunk(index, 9, &p);
            for pl in &chunk.platforms {
                assert!(pl.height >= 1);
                assert!(pl.y + pl.height <= p.height - 1);
            }
        }
    }

    #[test]
    fn world_cells_are_offset_by_chunk_start() {
        let chunk = generate_chunk(-2, 3, &params());
        assert_eq!(chunk.start_x, -32);
        assert!(chunk.world_cells().all(|c| (-32..-16).contains(&c.x)));
        assert_eq!(chunk.world_cells().count(), chunk.grid.ground_count());
    }

    #[test]
    fn seed_changes_layout_somewhere() {
        let p = params();
        let differs = (6..30).any(|i| generate_chunk(i, 1, &p) != generate_chunk(i, 2, &p));
        assert!(differs);
    }
}
