mod shared;
mod physics;
mod terrain;
mod planting;
mod timeline;
mod sustenance;
mod player;
mod ui;
mod data;

use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy::window::{PresentMode, WindowResolution};

use shared::*;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Timebloom".into(),
                        resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        // Game state
        .init_state::<GameState>()
        .insert_resource(ClearColor(timeline::clear_color_for(TimeMode::Present)))
        // Events
        .add_event::<PlantRequestEvent>()
        .add_event::<SeedPlantedEvent>()
        .add_event::<TimeToggleRequestEvent>()
        .add_event::<TimeModeChangedEvent>()
        .add_event::<RestartRequestEvent>()
        // Domain plugins
        .add_plugins(physics::PhysicsPlugin)
        .add_plugins(terrain::TerrainPlugin)
        .add_plugins(planting::PlantingPlugin)
        .add_plugins(timeline::TimelinePlugin)
        .add_plugins(sustenance::SustenancePlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(ui::UiPlugin)
        // Data loading
        .add_plugins(data::DataPlugin)
        // Camera
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_2d()
        },
        Transform::from_xyz(PLAYER_SPAWN_X, CAMERA_Y, 0.0),
        MainCamera,
    ));
}
