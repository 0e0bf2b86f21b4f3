use bevy::prelude::*;

use crate::physics::PhysicsWorld;
use crate::shared::*;

/// Shrinks the collision box on the axis not being resolved, so resting
/// contact on one axis never registers as a hit on the other.
const SKIN: f32 = 0.01;

/// One frame of player intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveInput {
    /// -1 left, +1 right, 0 idle.
    pub axis: f32,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub jump_released: bool,
}

pub fn player_rect(center: Vec2) -> Rect {
    Rect::from_center_size(center, PLAYER_SIZE)
}

/// Advances the player by `dt`: input, variable-height jump, gravity, then
/// axis-separated collision against the physics world.
pub fn step_player(
    position: Vec2,
    motion: &mut PlayerMotion,
    input: &MoveInput,
    dt: f32,
    world: &PhysicsWorld,
    own_collider: Option<ColliderId>,
    config: &GameConfig,
) -> Vec2 {
    let axis = input.axis.clamp(-1.0, 1.0);
    if axis != 0.0 {
        motion.facing = axis.signum();
    }
    motion.velocity.x = axis * config.move_speed;

    if input.jump_pressed && motion.grounded {
        motion.velocity.y = config.jump_force;
        motion.jumping = true;
        motion.jump_time_left = config.max_jump_time;
        motion.grounded = false;
    }
    if input.jump_held && motion.jumping {
        if motion.jump_time_left > 0.0 {
            motion.velocity.y = config.jump_force;
            motion.jump_time_left -= dt;
        } else {
            motion.jumping = false;
        }
    }
    if input.jump_released {
        motion.jumping = false;
        if motion.velocity.y > 0.0 {
            motion.velocity.y *= config.jump_cancel_multiplier;
        }
    }

    motion.velocity.y -= config.gravity * dt;

    let solid = LayerMask::GROUND | LayerMask::OBSTACLE | LayerMask::PLANT;
    let half = PLAYER_SIZE / 2.0;
    let mut pos = position;

    // Horizontal
    pos.x += motion.velocity.x * dt;
    let probe = Rect::from_center_size(pos, PLAYER_SIZE - Vec2::new(0.0, SKIN * 2.0));
    for hit in world.overlapping(probe, solid, own_collider) {
        if motion.velocity.x > 0.0 {
            pos.x = pos.x.min(hit.min.x - half.x);
        } else if motion.velocity.x < 0.0 {
            pos.x = pos.x.max(hit.max.x + half.x);
        }
    }

    // Vertical
    pos.y += motion.velocity.y * dt;
    motion.grounded = false;
    let probe = Rect::from_center_size(pos, PLAYER_SIZE - Vec2::new(SKIN * 2.0, 0.0));
    let hits = world.overlapping(probe, solid, own_collider);
    if !hits.is_empty() {
        if motion.velocity.y <= 0.0 {
            pos.y = hits.iter().fold(pos.y, |y, hit| y.max(hit.max.y + half.y));
            motion.grounded = true;
        } else {
            pos.y = hits.iter().fold(pos.y, |y, hit| y.min(hit.min.y - half.y));
            motion.jumping = false;
        }
        motion.velocity.y = 0.0;
    }

    pos
}

/// Core movement system. Frozen while any plant is growing; the growth
/// animation owns the player's position then.
pub fn player_movement(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<GameConfig>,
    counter: Res<GrowthCounter>,
    mut physics: ResMut<PhysicsWorld>,
    mut query: Query<(&mut Transform, &mut PlayerMotion, &BodyCollider), With<Player>>,
) {
    let Ok((mut transform, mut motion, collider)) = query.get_single_mut() else {
        return;
    };

    if counter.is_growing() {
        motion.velocity = Vec2::ZERO;
        motion.jumping = false;
    } else {
        let mut axis = 0.0;
        if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
            axis -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
            axis += 1.0;
        }
        let input = MoveInput {
            axis,
            jump_pressed: keyboard.just_pressed(KeyCode::Space),
            jump_held: keyboard.pressed(KeyCode::Space),
            jump_released: keyboard.just_released(KeyCode::Space),
        };

        let next = step_player(
            transform.translation.truncate(),
            &mut motion,
            &input,
            time.delta_secs(),
            &physics,
            Some(collider.0),
            &config,
        );
        transform.translation.x = next.x;
        transform.translation.y = next.y;
        transform.scale.x = motion.facing;
    }

    physics.move_body(collider.0, player_rect(transform.translation.truncate()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(3);
        world.insert_cells((0..20).flat_map(|x| (0..3).map(move |y| IVec2::new(x, y))));
        world
    }

    fn settle(world: &PhysicsWorld, pos: Vec2, motion: &mut PlayerMotion, input: MoveInput, frames: usize) -> Vec2 {
        let cfg = GameConfig::default();
        (0..frames).fold(pos, |p, _| step_player(p, motion, &input, 1.0 / 60.0, world, None, &cfg))
    }

    #[test]
    fn falls_and_lands_on_ground() {
        let world = floor();
        let mut motion = PlayerMotion::default();
        let pos = settle(&world, Vec2::new(5.0, 6.0), &mut motion, MoveInput::default(), 120);
        assert!((pos.y - 3.5).abs() < 1e-4);
        assert!(motion.grounded);
    }

    #[test]
    fn walks_without_snagging_on_the_floor() {
        let world = floor();
        let mut motion = PlayerMotion::default();
        let start = settle(&world, Vec2::new(5.0, 3.5), &mut motion, MoveInput::default(), 5);
        let input = MoveInput {
            axis: 1.0,
            ..default()
        };
        let pos = settle(&world, start, &mut motion, input, 60);
        assert!((pos.x - 10.0).abs() < 0.05);
        assert!((pos.y - 3.5).abs() < 1e-4);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let mut world = floor();
        world.insert_cells([IVec2::new(8, 3), IVec2::new(8, 4)]);
        let mut motion = PlayerMotion::default();
        let input = MoveInput {
            axis: 1.0,
            ..default()
        };
        let pos = settle(&world, Vec2::new(5.0, 3.5), &mut motion, input, 120);
        assert!((pos.x - 7.6).abs() < 1e-4);
    }

    #[test]
    fn facing_follows_last_direction() {
        let world = floor();
        let mut motion = PlayerMotion::default();
        let left = MoveInput {
            axis: -1.0,
            ..default()
        };
        settle(&world, Vec2::new(5.0, 3.5), &mut motion, left, 1);
        settle(&world, Vec2::new(5.0, 3.5), &mut motion, MoveInput::default(), 1);
        assert_eq!(motion.facing, -1.0);
    }

    #[test]
    fn released_jump_is_lower_than_held_jump() {
        let world = floor();
        let peak = |hold_frames: usize| {
            let mut motion = PlayerMotion::default();
            let mut pos = settle(&world, Vec2::new(5.0, 3.5), &mut motion, MoveInput::default(), 2);
            let mut best = pos.y;
            for frame in 0..90 {
                let input = MoveInput {
                    jump_pressed: frame == 0,
                    jump_held: frame < hold_frames,
                    jump_released: frame == hold_frames,
                    ..default()
                };
                pos = settle(&world, pos, &mut motion, input, 1);
                best = best.max(pos.y);
            }
            best
        };
        assert!(peak(3) < peak(30));
        assert!(peak(3) > 3.5);
    }
}
