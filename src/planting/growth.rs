//! Growth animation and the idle sway that follows it.

use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::shared::*;

/// Share of the animation during which a rider is carried up.
pub const RIDER_FOLLOW_FRACTION: f32 = 0.7;
const START_SCALE: f32 = 0.5;
const STRETCH_AMPLITUDE: f32 = 0.1;
const SQUASH_AMPLITUDE: f32 = 0.05;
const SWAY_AMPLITUDE: f32 = 0.08;
const SWAY_SPEED: f32 = 2.0;

pub fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Scale and vertical offset of a growing plant at `progress` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthFrame {
    pub scale: Vec2,
    /// Added to the resting centre so the bottom edge stays put.
    pub offset_y: f32,
}

pub fn growth_frame(progress: f32, height: f32) -> GrowthFrame {
    let p = progress.clamp(0.0, 1.0);
    let base = START_SCALE + (1.0 - START_SCALE) * ease_out_bounce(p);
    let wobble = (p * TAU).sin();
    let stretch_y = base + wobble * STRETCH_AMPLITUDE;
    let squash_x = base - wobble * SQUASH_AMPLITUDE;
    GrowthFrame {
        scale: Vec2::new(squash_x, stretch_y),
        offset_y: (stretch_y - 1.0) * height / 2.0,
    }
}

/// Vertical stretch of a grown plant `elapsed` seconds into its sway.
pub fn sway_stretch(elapsed: f32) -> f32 {
    1.0 + (elapsed * SWAY_SPEED).sin() * SWAY_AMPLITUDE
}

/// An in-flight growth. Holds the world freeze for as long as it exists.
#[derive(Component, Debug)]
pub struct GrowthAnimation {
    pub elapsed: f32,
    pub duration: f32,
    pub height: f32,
    /// Resting centre of the mature footprint.
    pub anchor: Vec2,
    pub rider: Option<Entity>,
    rider_hold: Option<Vec3>,
    _ticket: GrowthTicket,
}

impl GrowthAnimation {
    pub fn new(ticket: GrowthTicket, footprint: Rect, duration: f32, rider: Option<Entity>) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
            height: footprint.height(),
            anchor: footprint.center(),
            rider,
            rider_hold: None,
            _ticket: ticket,
        }
    }

    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Component, Debug, Clone)]
pub struct Sway {
    pub elapsed: f32,
    pub height: f32,
    pub anchor: Vec2,
}

pub fn animate_growth(
    mut commands: Commands,
    time: Res<Time>,
    mut growing: Query<(Entity, &mut Transform, &mut GrowthAnimation), Without<Player>>,
    mut riders: Query<&mut Transform, With<Player>>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, mut anim) in &mut growing {
        anim.elapsed += dt;
        let progress = anim.progress();
        let frame = growth_frame(progress, anim.height);

        transform.scale = frame.scale.extend(1.0);
        transform.translation.x = anim.anchor.x;
        transform.translation.y = anim.anchor.y + frame.offset_y;

        if let Some(rider) = anim.rider {
            if let Ok(mut rider_tf) = riders.get_mut(rider) {
                if progress <= RIDER_FOLLOW_FRACTION {
                    let top = anim.anchor.y - anim.height / 2.0 + frame.scale.y * anim.height;
                    rider_tf.translation.x = anim.anchor.x;
                    rider_tf.translation.y = top + PLAYER_SIZE.y / 2.0;
                    anim.rider_hold = Some(rider_tf.translation);
                } else if let Some(hold) = anim.rider_hold {
                    rider_tf.translation = hold;
                }
            }
        }

        if anim.is_finished() {
            transform.scale = Vec3::ONE;
            transform.translation.x = anim.anchor.x;
            transform.translation.y = anim.anchor.y;
            let sway = Sway {
                elapsed: 0.0,
                height: anim.height,
                anchor: anim.anchor,
            };
            commands.entity(entity).remove::<GrowthAnimation>().insert(sway);
        }
    }
}

pub fn sway_plants(time: Res<Time>, mut plants: Query<(&mut Transform, &mut Sway)>) {
    let dt = time.delta_secs();
    for (mut transform, mut sway) in &mut plants {
        sway.elapsed += dt;
        let stretch = sway_stretch(sway.elapsed);
        transform.scale = Vec3::new(1.0, stretch, 1.0);
        transform.translation.y = sway.anchor.y + (stretch - 1.0) * sway.height / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    /// Ticks 0.1 s per frame. Sway runs first so the frame a growth finishes
    /// shows the snapped rest pose.
    fn growth_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
        app.init_resource::<GrowthCounter>();
        app.add_systems(Update, (sway_plants, animate_growth).chain());
        app
    }

    #[test]
    fn bounce_easing_hits_both_ends() {
        assert_eq!(ease_out_bounce(0.0), 0.0);
        assert!((ease_out_bounce(1.0) - 1.0).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ease_out_bounce(0.5)));
    }

    #[test]
    fn growth_starts_at_half_and_ends_at_full_scale() {
        let start = growth_frame(0.0, 3.0);
        assert!((start.scale.y - 0.5).abs() < 1e-5);
        assert!((start.offset_y + 0.75).abs() < 1e-5);

        let end = growth_frame(1.0, 3.0);
        assert!((end.scale - Vec2::ONE).length() < 1e-4);
        assert!(end.offset_y.abs() < 1e-4);
    }

    #[test]
    fn bottom_edge_stays_anchored() {
        let height = 2.0;
        let anchor_y = 3.5;
        for i in 0..=20 {
            let frame = growth_frame(i as f32 / 20.0, height);
            let bottom = anchor_y + frame.offset_y - frame.scale.y * height / 2.0;
            assert!((bottom - (anchor_y - height / 2.0)).abs() < 1e-4);
        }
    }

    #[test]
    fn sway_oscillates_around_rest() {
        assert_eq!(sway_stretch(0.0), 1.0);
        for i in 0..100 {
            let s = sway_stretch(i as f32 * 0.1);
            assert!((0.92 - 1e-5..=1.08 + 1e-5).contains(&s));
        }
    }

    #[test]
    fn dropping_the_animation_releases_the_freeze() {
        let counter = GrowthCounter::default();
        let anim = GrowthAnimation::new(counter.begin(), Rect::new(0.0, 2.5, 1.0, 4.5), 0.5, None);
        assert!(counter.is_growing());
        assert_eq!(anim.anchor, Vec2::new(0.5, 3.5));
        drop(anim);
        assert!(!counter.is_growing());
    }

    #[test]
    fn rider_is_carried_then_held_and_plant_settles_into_sway() {
        let mut app = growth_app();
        let counter = app.world().resource::<GrowthCounter>().clone();
        let rider = app
            .world_mut()
            .spawn((Player, Transform::from_xyz(9.5, 3.5, PLAYER_Z)))
            .id();
        let footprint = Rect::new(9.0, 3.0, 10.0, 6.0);
        let plant = app
            .world_mut()
            .spawn((
                Transform::from_xyz(9.5, 4.5, 0.0),
                GrowthAnimation::new(counter.begin(), footprint, 1.0, Some(rider)),
            ))
            .id();
        assert!(counter.is_growing());

        let rider_y = |app: &App| app.world().get::<Transform>(rider).map(|t| t.translation.y);
        let mut carried = Vec::new();
        let mut held = Vec::new();
        for _ in 0..30 {
            app.update();
            let Some(progress) = app.world().get::<GrowthAnimation>(plant).map(|a| a.progress()) else {
                break;
            };
            let y = rider_y(&app).unwrap_or_default();
            if progress <= RIDER_FOLLOW_FRACTION {
                carried.push(y);
            } else {
                held.push(y);
            }
        }

        // Carried up from the half-grown top while the plant stretches.
        let first = carried.first().copied().unwrap_or_default();
        let last = carried.last().copied().unwrap_or_default();
        assert!(first >= 4.5 + PLAYER_SIZE.y / 2.0 - 1e-4);
        assert!(last > first);
        assert!(!held.is_empty());
        assert!(held.iter().all(|&y| y == last));
        assert_eq!(rider_y(&app), Some(last));

        // Snapped to rest and handed over to the sway.
        let world = app.world();
        assert!(world.get::<GrowthAnimation>(plant).is_none());
        let transform = world.get::<Transform>(plant).copied().unwrap_or_default();
        assert_eq!(transform.scale, Vec3::ONE);
        assert_eq!(transform.translation.truncate(), Vec2::new(9.5, 4.5));
        assert_eq!(world.get::<Sway>(plant).map(|s| s.elapsed), Some(0.0));
        assert!(!counter.is_growing());

        app.update();
        let world = app.world();
        let sway = world.get::<Sway>(plant).cloned();
        let elapsed = sway.map(|s| s.elapsed).unwrap_or_default();
        assert!(elapsed > 0.0);
        let scale_y = world.get::<Transform>(plant).map(|t| t.scale.y);
        assert_eq!(scale_y, Some(sway_stretch(elapsed)));
    }

    #[test]
    fn despawning_mid_growth_releases_the_freeze() {
        let mut app = growth_app();
        let counter = app.world().resource::<GrowthCounter>().clone();
        let plant = app
            .world_mut()
            .spawn((
                Transform::default(),
                GrowthAnimation::new(counter.begin(), Rect::new(0.0, 3.0, 1.0, 5.0), 1.0, None),
            ))
            .id();

        for _ in 0..3 {
            app.update();
        }
        assert_eq!(counter.in_flight(), 1);
        assert!(app.world().get::<Sway>(plant).is_none());

        assert!(app.world_mut().despawn(plant));
        assert_eq!(counter.in_flight(), 0);
        app.update();
        assert!(!counter.is_growing());
    }
}
