use bevy::prelude::*;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS: used to query and update HUD elements
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HudSustenanceBar;

#[derive(Component)]
pub struct HudSustenanceFill;

/// The mask that shows whether the player is in the past.
#[derive(Component)]
pub struct HudMaskIcon;

const MASK_COLOR: (f32, f32, f32) = (0.85, 0.75, 0.95);

/// Icon opacity: fully lit in the past, faded in the present.
pub fn mask_alpha(mode: TimeMode) -> f32 {
    match mode {
        TimeMode::Past => 1.0,
        TimeMode::Present => 0.3,
    }
}

/// Bar colour, green when full through yellow to red when empty.
pub fn sustenance_color(ratio: f32) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    if ratio > 0.5 {
        let t = (ratio - 0.5) * 2.0;
        Color::srgb(0.2 + 0.7 * (1.0 - t), 0.85, 0.3 * t)
    } else {
        let t = ratio * 2.0;
        Color::srgb(0.9, 0.85 * t, 0.1 * t)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN / DESPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_hud(mut commands: Commands, timeline: Res<Timeline>) {
    let (r, g, b) = MASK_COLOR;

    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Px(48.0),
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                padding: UiRect::axes(Val::Px(12.0), Val::Px(6.0)),
                ..default()
            },
            PickingBehavior::IGNORE,
        ))
        .with_children(|top_bar| {
            // Sustenance bar container
            top_bar
                .spawn((
                    HudSustenanceBar,
                    Node {
                        width: Val::Px(180.0),
                        height: Val::Px(16.0),
                        border: UiRect::all(Val::Px(1.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.1, 0.1, 0.1, 0.9)),
                    BorderColor(Color::srgba(0.6, 0.6, 0.6, 0.8)),
                    PickingBehavior::IGNORE,
                ))
                .with_children(|bar| {
                    bar.spawn((
                        HudSustenanceFill,
                        Node {
                            width: Val::Percent(100.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(sustenance_color(1.0)),
                        PickingBehavior::IGNORE,
                    ));
                });

            top_bar.spawn((
                HudMaskIcon,
                Node {
                    width: Val::Px(28.0),
                    height: Val::Px(28.0),
                    border: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(r, g, b, mask_alpha(timeline.mode))),
                BorderColor(Color::srgba(0.2, 0.15, 0.3, 0.8)),
                PickingBehavior::IGNORE,
            ));
        });
}

pub fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATE SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn update_sustenance_bar(
    sustenance: Res<Sustenance>,
    mut query: Query<(&mut Node, &mut BackgroundColor), With<HudSustenanceFill>>,
) {
    if !sustenance.is_changed() {
        return;
    }
    let ratio = sustenance.fraction();
    for (mut node, mut bg) in &mut query {
        node.width = Val::Percent(ratio * 100.0);
        *bg = BackgroundColor(sustenance_color(ratio));
    }
}

pub fn update_mask_icon(
    timeline: Res<Timeline>,
    mut query: Query<&mut BackgroundColor, With<HudMaskIcon>>,
) {
    if !timeline.is_changed() {
        return;
    }
    let (r, g, b) = MASK_COLOR;
    for mut bg in &mut query {
        *bg = BackgroundColor(Color::srgba(r, g, b, mask_alpha(timeline.mode)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_lit_only_in_the_past() {
        assert_eq!(mask_alpha(TimeMode::Past), 1.0);
        assert_eq!(mask_alpha(TimeMode::Present), 0.3);
    }

    #[test]
    fn bar_turns_red_as_it_empties() {
        let full = sustenance_color(1.0).to_srgba();
        let empty = sustenance_color(0.0).to_srgba();
        assert!(full.green > full.red);
        assert!(empty.red > empty.green);
    }
}
