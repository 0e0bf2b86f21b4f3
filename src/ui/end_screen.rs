use bevy::prelude::*;
use crate::shared::*;

#[derive(Component)]
pub struct EndScreenRoot;

/// Elapsed run time as `m:ss:cc` (minutes, seconds, hundredths).
pub fn format_elapsed(seconds: f32) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).floor() as u64;
    let minutes = total_cs / 6000;
    let secs = (total_cs / 100) % 60;
    let centis = total_cs % 100;
    format!("{}:{:02}:{:02}", minutes, secs, centis)
}

pub fn spawn_win_screen(commands: Commands, sustenance: Res<Sustenance>) {
    let time = format_elapsed(sustenance.elapsed_seconds);
    spawn_end_screen(
        commands,
        "You made it through",
        &format!("Time {}", time),
        Color::srgba(0.05, 0.15, 0.05, 0.85),
    );
}

pub fn spawn_game_over_screen(commands: Commands) {
    spawn_end_screen(
        commands,
        "Out of sustenance",
        "The journey ends here",
        Color::srgba(0.15, 0.03, 0.03, 0.85),
    );
}

fn spawn_end_screen(mut commands: Commands, title: &str, detail: &str, backdrop: Color) {
    commands
        .spawn((
            EndScreenRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(backdrop),
            GlobalZIndex(50),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(title),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                Text::new(detail),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.8)),
            ));
            parent.spawn((
                Text::new("Press Enter to play again"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.6)),
            ));
        });
}

pub fn despawn_end_screen(mut commands: Commands, query: Query<Entity, With<EndScreenRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn end_screen_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut restart_writer: EventWriter<RestartRequestEvent>,
) {
    if keyboard.just_pressed(KeyCode::Enter) {
        restart_writer.send(RestartRequestEvent);
    }
}

/// Sends the session back through Loading, which clears and rebuilds it.
pub fn handle_restart_requests(
    mut events: EventReader<RestartRequestEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.read().count() > 0 {
        info!("[UI] Restarting session");
        next_state.set(GameState::Loading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_formats_as_minutes_seconds_hundredths() {
        assert_eq!(format_elapsed(0.0), "0:00:00");
        assert_eq!(format_elapsed(5.25), "0:05:25");
        assert_eq!(format_elapsed(125.5), "2:05:50");
        assert_eq!(format_elapsed(-1.0), "0:00:00");
    }
}
