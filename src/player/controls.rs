use bevy::prelude::*;
use crate::shared::*;

/// Turns the action keys into requests for the planting and timeline domains.
/// Q plants in front of the player, E flips the timeline.
pub fn send_action_requests(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut plant_writer: EventWriter<PlantRequestEvent>,
    mut toggle_writer: EventWriter<TimeToggleRequestEvent>,
) {
    if keyboard.just_pressed(KeyCode::KeyQ) {
        plant_writer.send(PlantRequestEvent);
    }
    if keyboard.just_pressed(KeyCode::KeyE) {
        toggle_writer.send(TimeToggleRequestEvent);
    }
}
