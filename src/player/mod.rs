mod camera;
mod controls;
pub mod movement;
mod spawn;

use bevy::prelude::*;
use crate::shared::*;

pub use movement::{player_rect, step_player, MoveInput};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        // -- Back to the start column whenever a session loads --
        app.add_systems(OnEnter(GameState::Loading), camera::reset_camera);

        // -- Spawn player when we enter Playing --
        app.add_systems(OnEnter(GameState::Playing), spawn::spawn_player);

        // -- Systems that run every frame while Playing --
        app.add_systems(
            Update,
            (
                controls::send_action_requests.before(TimelineSet::Switch),
                movement::player_movement,
                camera::camera_follow_player.after(movement::player_movement),
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}
