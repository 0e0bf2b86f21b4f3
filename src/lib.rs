//! Timebloom library crate. Re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can drive terrain, planting, timeline and sustenance systems without
//! needing a window or GPU.

pub mod shared;
pub mod physics;
pub mod terrain;
pub mod planting;
pub mod timeline;
pub mod sustenance;
pub mod player;
pub mod ui;
pub mod data;
