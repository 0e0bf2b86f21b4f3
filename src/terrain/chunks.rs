//! The window of realized chunks around the reference point.

use bevy::prelude::*;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::shared::slice_index;

/// Chunks to realize and chunks to clear, produced by one window move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowDelta {
    pub generate: Vec<i32>,
    pub evict: Vec<i32>,
}

impl WindowDelta {
    pub fn is_empty(&self) -> bool {
        self.generate.is_empty() && self.evict.is_empty()
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ChunkWindow {
    pub active: BTreeSet<i32>,
    /// Chunk visible at the left edge of the view when the session started.
    pub left_boundary: i32,
    pub start_chunk: i32,
    pub global_seed: u32,
    /// Set once the reference point has moved strictly past the boundary.
    pub backward_unlocked: bool,
    pub last_center: Option<i32>,
    pub ahead: i32,
    pub behind: i32,
}

impl ChunkWindow {
    pub fn new(left_boundary: i32, start_chunk: i32, global_seed: u32, ahead: i32, behind: i32) -> Self {
        Self {
            active: BTreeSet::new(),
            left_boundary,
            start_chunk,
            global_seed,
            backward_unlocked: false,
            last_center: None,
            ahead: ahead.max(0),
            behind: behind.max(0),
        }
    }

    /// Desired window for a given center chunk. Empty if the center sits
    /// left of the boundary by more than the look-ahead.
    pub fn desired_range(&self, center: i32) -> RangeInclusive<i32> {
        let min = if self.backward_unlocked {
            (center - self.behind).max(self.left_boundary)
        } else {
            self.left_boundary
        };
        min..=center + self.ahead
    }

    pub fn on_reference_point_moved(&mut self, x: f32, chunk_width: f32) -> WindowDelta {
        self.recenter(slice_index(x, chunk_width))
    }

    /// Moves the window to `center`. Calling twice with the same center
    /// returns an empty delta the second time.
    pub fn recenter(&mut self, center: i32) -> WindowDelta {
        if self.last_center == Some(center) {
            return WindowDelta::default();
        }
        self.last_center = Some(center);

        if center > self.left_boundary && !self.backward_unlocked {
            self.backward_unlocked = true;
            debug!("[Terrain] Backward generation unlocked at chunk {}", center);
        }

        let desired = self.desired_range(center);
        let evict: Vec<i32> = self
            .active
            .iter()
            .copied()
            .filter(|i| !desired.contains(i))
            .collect();
        for index in &evict {
            self.active.remove(index);
        }

        let generate: Vec<i32> = desired.filter(|i| self.active.insert(*i)).collect();

        WindowDelta { generate, evict }
    }

    pub fn is_active(&self, index: i32) -> bool {
        self.active.contains(&index)
    }
}
