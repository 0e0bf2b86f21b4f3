//! Timeline domain plugin for Timebloom.
//!
//! Owns the past/present switch. A toggle is refused while a plant is growing
//! or a planting action is still running; an accepted toggle is announced as
//! a `TimeModeChangedEvent` that the other domains answer in the same frame.

use bevy::prelude::*;
use std::fmt;

use crate::shared::*;

pub const PAST_CLEAR_COLOR: Color = Color::srgb(0.5, 0.5, 0.5);
pub const PRESENT_CLEAR_COLOR: Color = Color::srgb(0.3, 0.5, 0.8);

pub struct TimelinePlugin;

impl Plugin for TimelinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Timeline>();
        app.configure_sets(Update, (TimelineSet::Switch, TimelineSet::Respond).chain());

        app.add_systems(OnEnter(GameState::Loading), reset_timeline);
        app.add_systems(
            Update,
            handle_toggle_requests
                .in_set(TimelineSet::Switch)
                .run_if(in_state(GameState::Playing)),
        );
        app.add_systems(
            Update,
            apply_timeline_visuals
                .in_set(TimelineSet::Respond)
                .run_if(resource_changed::<Timeline>),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRefused {
    GrowthInProgress,
    PlantingInProgress,
}

impl fmt::Display for ToggleRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleRefused::GrowthInProgress => f.write_str("a plant is still growing"),
            ToggleRefused::PlantingInProgress => f.write_str("still planting"),
        }
    }
}

impl std::error::Error for ToggleRefused {}

/// Flips the mode unless a guard is up. Returns the new mode.
pub fn request_toggle(
    timeline: &mut Timeline,
    growing: bool,
    planting: bool,
) -> Result<TimeMode, ToggleRefused> {
    if growing {
        return Err(ToggleRefused::GrowthInProgress);
    }
    if planting {
        return Err(ToggleRefused::PlantingInProgress);
    }
    timeline.mode = timeline.mode.toggled();
    Ok(timeline.mode)
}

fn reset_timeline(mut timeline: ResMut<Timeline>) {
    *timeline = Timeline::default();
}

pub fn handle_toggle_requests(
    mut requests: EventReader<TimeToggleRequestEvent>,
    mut changed: EventWriter<TimeModeChangedEvent>,
    mut timeline: ResMut<Timeline>,
    counter: Res<GrowthCounter>,
    action: Res<PlantingAction>,
) {
    // Several presses in one frame still count as one toggle.
    if requests.read().count() == 0 {
        return;
    }
    let from = timeline.mode;
    match request_toggle(&mut timeline, counter.is_growing(), action.is_active()) {
        Ok(to) => {
            info!("[Timeline] {:?} -> {:?}", from, to);
            changed.send(TimeModeChangedEvent { from, to });
        }
        Err(reason) => {
            debug!("[Timeline] Toggle refused: {}", reason);
        }
    }
}

pub fn clear_color_for(mode: TimeMode) -> Color {
    match mode {
        TimeMode::Past => PAST_CLEAR_COLOR,
        TimeMode::Present => PRESENT_CLEAR_COLOR,
    }
}

/// Shows the elements tagged for the current mode and tints the background.
pub fn apply_timeline_visuals(
    timeline: Res<Timeline>,
    mut clear_color: Option<ResMut<ClearColor>>,
    mut tagged: Query<(&TimelineTag, &mut Visibility)>,
) {
    let mode = timeline.mode;
    for (tag, mut visibility) in &mut tagged {
        let wanted = tag.visibility(mode);
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
    if let Some(clear_color) = clear_color.as_mut() {
        clear_color.0 = clear_color_for(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_present_and_flips() {
        let mut timeline = Timeline::default();
        assert_eq!(timeline.mode, TimeMode::Present);
        assert_eq!(request_toggle(&mut timeline, false, false), Ok(TimeMode::Past));
        assert_eq!(request_toggle(&mut timeline, false, false), Ok(TimeMode::Present));
    }

    #[test]
    fn growth_blocks_toggle() {
        let mut timeline = Timeline::default();
        assert_eq!(
            request_toggle(&mut timeline, true, false),
            Err(ToggleRefused::GrowthInProgress)
        );
        assert_eq!(timeline.mode, TimeMode::Present);
    }

    #[test]
    fn planting_action_blocks_toggle() {
        let mut timeline = Timeline { mode: TimeMode::Past };
        assert_eq!(
            request_toggle(&mut timeline, false, true),
            Err(ToggleRefused::PlantingInProgress)
        );
        assert!(timeline.is_past());
    }

    #[test]
    fn each_mode_has_its_own_tint() {
        assert_ne!(clear_color_for(TimeMode::Past), clear_color_for(TimeMode::Present));
    }
}
