//! Sustenance domain plugin for Timebloom.
//!
//! Sustenance drains steadily once the reference point reaches the start
//! region. Crossing into a new region can top it up by one bonus, but only
//! if the player planted in the region just left, the world is in the
//! present, and every passed plant has grown at least once. Running dry ends
//! the session; reaching the win region ends it the other way.

use bevy::prelude::*;

use crate::shared::*;

/// The pool counts as empty once less than this share of a frame's decay is
/// left. Decay is subtracted once per frame, so the running total drifts and
/// can sit a hair above zero on the frame it should have run out; at 144 Hz
/// the leftover after fifty seconds is about 1e-4.
const EMPTY_STEP_FRACTION: f32 = 0.5;

pub struct SustenancePlugin;

impl Plugin for SustenancePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Sustenance>();

        app.add_systems(OnEnter(GameState::Playing), activate_sustenance);
        app.add_systems(
            Update,
            (record_plantings, update_sustenance, resolve_outcome)
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// What a single tick changed, for callers that care.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub entered_region: Option<i32>,
    pub unpaused: bool,
    pub bonus: Option<i32>,
    pub outcome: Option<Outcome>,
}

/// True when crossing from `left` into `entered` earns a bonus.
pub fn bonus_earned(
    sustenance: &Sustenance,
    left: i32,
    entered: i32,
    mode: TimeMode,
    garden: &Garden,
) -> bool {
    sustenance.planted_regions.contains(&left)
        && mode == TimeMode::Present
        && garden.every_passed_has_grown()
        && !sustenance.bonus_regions.contains(&entered)
}

/// Advances sustenance by `dt` seconds with the reference point at
/// `reference_x`. Decay starts on the first tick spent at or past the start
/// region, crossing or not. Region crossings (and with them the win check)
/// are evaluated before decay.
pub fn tick_sustenance(
    sustenance: &mut Sustenance,
    dt: f32,
    reference_x: f32,
    mode: TimeMode,
    garden: &Garden,
    config: &GameConfig,
) -> TickReport {
    let mut report = TickReport::default();
    if !sustenance.active || sustenance.outcome.is_some() {
        return report;
    }
    sustenance.elapsed_seconds += dt;

    let region = slice_index(reference_x, config.region_width);
    if sustenance.paused && region >= config.sustenance_start_region {
        sustenance.paused = false;
        report.unpaused = true;
    }

    if region != sustenance.region {
        let left = sustenance.region;
        sustenance.region = region;
        report.entered_region = Some(region);

        if region >= config.win_region {
            sustenance.outcome = Some(Outcome::Won);
            report.outcome = sustenance.outcome;
            return report;
        }

        if bonus_earned(sustenance, left, region, mode, garden) {
            sustenance.current = (sustenance.current + config.sustenance_bonus).min(sustenance.max);
            sustenance.bonus_regions.insert(region);
            sustenance.last_bonus_region = Some(region);
            report.bonus = Some(region);
        }
    }

    if !sustenance.paused {
        let step = config.sustenance_decay_rate * dt;
        sustenance.current = (sustenance.current - step).max(0.0);
        if sustenance.current <= step * EMPTY_STEP_FRACTION {
            sustenance.current = 0.0;
            sustenance.outcome = Some(Outcome::Starved);
            report.outcome = sustenance.outcome;
        }
    }
    report
}

/// Fresh sustenance for a new session. Refuses to run without its
/// collaborators.
pub fn activate_sustenance(
    mut commands: Commands,
    config: Res<GameConfig>,
    garden: Option<Res<Garden>>,
    camera: Query<&Transform, With<MainCamera>>,
) {
    let mut sustenance = Sustenance::new(config.max_sustenance);

    let wiring = require(garden, "Sustenance", "Garden")
        .and_then(|_| require(camera.get_single().ok(), "Sustenance", "MainCamera"));
    match wiring {
        Ok(camera) => {
            sustenance.region = slice_index(camera.translation.x, config.region_width);
            sustenance.paused = sustenance.region < config.sustenance_start_region;
            if sustenance.paused {
                info!(
                    "[Sustenance] Active at {:.1}/{:.1}, paused until region {}",
                    sustenance.current, sustenance.max, config.sustenance_start_region
                );
            } else {
                info!(
                    "[Sustenance] Active at {:.1}/{:.1}, decaying from region {}",
                    sustenance.current, sustenance.max, sustenance.region
                );
            }
        }
        Err(err) => {
            error!("[Sustenance] {}", err);
            sustenance.active = false;
        }
    }
    commands.insert_resource(sustenance);
}

/// Remembers which regions the player planted in.
pub fn record_plantings(
    mut planted: EventReader<SeedPlantedEvent>,
    config: Res<GameConfig>,
    mut sustenance: ResMut<Sustenance>,
    camera: Query<&Transform, With<MainCamera>>,
) {
    for _ in planted.read() {
        let region = camera
            .get_single()
            .map(|tf| slice_index(tf.translation.x, config.region_width))
            .unwrap_or(sustenance.region);
        if sustenance.planted_regions.insert(region) {
            debug!("[Sustenance] Planting recorded in region {}", region);
        }
    }
}

pub fn update_sustenance(
    time: Res<Time>,
    config: Res<GameConfig>,
    timeline: Res<Timeline>,
    garden: Option<Res<Garden>>,
    mut sustenance: ResMut<Sustenance>,
    camera: Query<&Transform, With<MainCamera>>,
) {
    let (Some(garden), Ok(camera)) = (garden, camera.get_single()) else {
        return;
    };
    let report = tick_sustenance(
        &mut sustenance,
        time.delta_secs(),
        camera.translation.x,
        timeline.mode,
        &garden,
        &config,
    );

    if let Some(region) = report.entered_region {
        debug!("[Sustenance] Entered region {}", region);
    }
    if report.unpaused {
        info!("[Sustenance] Decay started");
    }
    if let Some(region) = report.bonus {
        info!(
            "[Sustenance] +{} for region {} ({:.1}/{:.1})",
            config.sustenance_bonus, region, sustenance.current, sustenance.max
        );
    }
}

/// Moves the session to its end screen once an outcome is reached.
pub fn resolve_outcome(sustenance: Res<Sustenance>, mut next_state: ResMut<NextState<GameState>>) {
    match sustenance.outcome {
        Some(Outcome::Won) => {
            info!("[Sustenance] Win region reached after {:.2}s", sustenance.elapsed_seconds);
            next_state.set(GameState::Won);
        }
        Some(Outcome::Starved) => {
            info!("[Sustenance] Sustenance depleted - game over");
            next_state.set(GameState::GameOver);
        }
        None => {}
    }
}
