use bevy::prelude::*;

use crate::physics::PhysicsWorld;
use crate::shared::*;
use super::movement::player_rect;

const PLAYER_COLOR: Color = Color::srgb(0.95, 0.85, 0.35);

/// Spawn the player standing on bedrock at the start column.
/// Runs once on `OnEnter(GameState::Playing)`.
pub fn spawn_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut physics: ResMut<PhysicsWorld>,
    existing: Query<Entity, With<Player>>,
) {
    // Guard: don't double-spawn if a stale player survived the reset.
    if !existing.is_empty() {
        return;
    }

    let position = Vec2::new(PLAYER_SPAWN_X, config.ground_height as f32 + PLAYER_SIZE.y / 2.0);
    let collider = physics.add_body(ColliderKind::Player, player_rect(position));

    commands.spawn((
        Player,
        PlayerMotion::default(),
        BodyCollider(collider),
        Sprite {
            color: PLAYER_COLOR,
            custom_size: Some(PLAYER_SIZE),
            ..default()
        },
        Transform::from_xyz(position.x, position.y, PLAYER_Z),
        Visibility::default(),
        SessionEntity,
    ));
    info!("[Player] Spawned at ({:.1}, {:.1})", position.x, position.y);
}
