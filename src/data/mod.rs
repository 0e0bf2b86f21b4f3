//! Data layer. Loads the game configuration at the start of every session.
//!
//! This plugin runs in OnEnter(GameState::Loading): it clears whatever the
//! previous session left in the world, reads `assets/config/game.ron` into
//! the `GameConfig` resource, then transitions into GameState::Playing.
//!
//! Every other domain reads `GameConfig` once GameState has advanced past
//! Loading and treats it as constant for the rest of the session.

use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use crate::shared::*;

pub const CONFIG_PATH: &str = "assets/config/game.ron";

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfig>();
        app.add_systems(
            OnEnter(GameState::Loading),
            (despawn_session_entities, load_game_config).chain(),
        );
    }
}

fn despawn_session_entities(mut commands: Commands, leftovers: Query<Entity, With<SessionEntity>>) {
    let mut count = 0;
    for entity in &leftovers {
        commands.entity(entity).despawn_recursive();
        count += 1;
    }
    if count > 0 {
        info!("[Data] Cleared {} entities from the previous session", count);
    }
}

fn load_game_config(mut commands: Commands, mut next_state: ResMut<NextState<GameState>>) {
    let config = match read_config() {
        Ok(config) => {
            info!("[Data] Loaded configuration from {}", CONFIG_PATH);
            config
        }
        Err(err) => {
            warn!("[Data] {}. Using built-in defaults.", err);
            GameConfig::default()
        }
    };
    debug!(
        "[Data] chunk {}x{}, win region {}, seed {:?}",
        config.chunk_width, config.chunk_height, config.win_region, config.global_seed
    );
    commands.insert_resource(config);
    next_state.set(GameState::Playing);
}

/// Parses a RON config. Missing fields take their defaults.
pub fn parse_config(text: &str) -> Result<GameConfig, String> {
    let config: GameConfig =
        ron::from_str(text).map_err(|e| format!("Config parse failed: {}", e))?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects values the terrain and sustenance logic cannot work with.
fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.chunk_width < 1 || config.chunk_height < 1 {
        return Err(format!(
            "Chunk size {}x{} must be positive",
            config.chunk_width, config.chunk_height
        ));
    }
    if config.ground_height < 1 || config.ground_height >= config.chunk_height {
        return Err(format!(
            "Ground height {} must lie inside the chunk height {}",
            config.ground_height, config.chunk_height
        ));
    }
    if config.region_width <= 0.0 {
        return Err(format!("Region width {} must be positive", config.region_width));
    }
    if config.max_sustenance <= 0.0 {
        return Err(format!("Max sustenance {} must be positive", config.max_sustenance));
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn read_config() -> Result<GameConfig, String> {
    let path = Path::new(CONFIG_PATH);
    if !path.exists() {
        return Err(format!("{} not found", path.display()));
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    parse_config(&text)
}

#[cfg(target_arch = "wasm32")]
fn read_config() -> Result<GameConfig, String> {
    parse_config(include_str!("../../assets/config/game.ron"))
}
