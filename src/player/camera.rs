use bevy::prelude::*;
use crate::shared::*;

const FOLLOW_SPEED: f32 = 6.0;
/// Beyond this distance the camera jumps straight to its target.
const SNAP_DISTANCE: f32 = 6.0;

/// Horizontal camera target: the player, but never so far left that the
/// viewport shows past the boundary wall.
pub fn camera_target_x(player_x: f32, wall_x: Option<f32>, half_view_width: f32) -> f32 {
    match wall_x {
        Some(wall) => player_x.max(wall + half_view_width),
        None => player_x,
    }
}

/// Smoothly follow the player horizontally; height stays fixed.
pub fn camera_follow_player(
    time: Res<Time>,
    boundary: Res<WorldBoundary>,
    config: Res<GameConfig>,
    player_query: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    mut camera_query: Query<
        (&mut Transform, Option<&OrthographicProjection>),
        (With<MainCamera>, Without<Player>),
    >,
) {
    let Ok(player_tf) = player_query.get_single() else {
        return;
    };
    let Ok((mut cam_tf, projection)) = camera_query.get_single_mut() else {
        return;
    };

    let half_view = projection
        .map(|p| p.area.width() / 2.0 * cam_tf.scale.x)
        .filter(|w| *w > 0.0)
        .unwrap_or(config.view_width / 2.0);
    let target_x = camera_target_x(player_tf.translation.x, boundary.wall_x, half_view);

    let dx = target_x - cam_tf.translation.x;
    cam_tf.translation.x = if dx.abs() > SNAP_DISTANCE {
        target_x
    } else {
        let t = (FOLLOW_SPEED * time.delta_secs()).min(1.0);
        cam_tf.translation.x + dx * t
    };
    cam_tf.translation.y = CAMERA_Y;
}

/// New sessions start with the camera over the spawn column so the terrain
/// window is laid out around the player.
pub fn reset_camera(mut camera_query: Query<&mut Transform, With<MainCamera>>) {
    for mut tf in &mut camera_query {
        tf.translation.x = PLAYER_SPAWN_X;
        tf.translation.y = CAMERA_Y;
    }
}
