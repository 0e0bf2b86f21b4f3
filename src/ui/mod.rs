mod end_screen;
mod hud;

use bevy::prelude::*;
use crate::shared::*;

pub use end_screen::format_elapsed;
pub use hud::mask_alpha;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // ─── HUD, visible during Playing state ───
        app.add_systems(OnEnter(GameState::Playing), hud::spawn_hud);
        app.add_systems(OnExit(GameState::Playing), hud::despawn_hud);
        app.add_systems(
            Update,
            (hud::update_sustenance_bar, hud::update_mask_icon)
                .run_if(in_state(GameState::Playing)),
        );

        // ─── END SCREENS ───
        app.add_systems(OnEnter(GameState::Won), end_screen::spawn_win_screen);
        app.add_systems(OnEnter(GameState::GameOver), end_screen::spawn_game_over_screen);
        app.add_systems(OnExit(GameState::Won), end_screen::despawn_end_screen);
        app.add_systems(OnExit(GameState::GameOver), end_screen::despawn_end_screen);
        app.add_systems(
            Update,
            (end_screen::end_screen_input, end_screen::handle_restart_requests)
                .chain()
                .run_if(in_state(GameState::Won).or(in_state(GameState::GameOver))),
        );
    }
}
