use bevy::prelude::*;

mod camera;
mod components;
mod input;
mod lighting;
pub mod panel;
pub mod screenshot;
mod turntable;
mod world;

pub use components::{GarmentPanel, MannequinRoot, PanelRenderOrder};
pub use turntable::Turntable;
pub use world::{StageSettings, resize_window, setup_stage};

/// Camera, studio lights, floor, the mannequin root and its turntable.
pub struct StagePlugin {
    pub idle_sway: f32,
}

impl Default for StagePlugin {
    fn default() -> Self {
        Self { idle_sway: 0.05 }
    }
}

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Turntable::with_amplitude(self.idle_sway))
            .init_resource::<world::StageSettings>()
            .add_systems(
                Startup,
                (
                    world::setup_stage,
                    camera::spawn_camera,
                    lighting::spawn_studio_lights,
                ),
            )
            .add_systems(
                Update,
                (
                    (input::drag_rotation, turntable::apply_turntable).chain(),
                    panel::sync_panel_depth_bias,
                ),
            );
    }
}
