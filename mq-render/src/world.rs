use bevy::prelude::*;

use crate::components::MannequinRoot;

#[derive(Resource)]
pub struct StageSettings {
    pub floor_radius: f32,
    pub floor_color: Color,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            floor_radius: 0.55,
            // Spotlight pool under the mannequin.
            floor_color: Color::srgba(1.0, 0.878, 0.4, 0.85),
        }
    }
}

pub fn setup_stage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<StageSettings>,
) {
    commands.spawn((
        Name::new("MannequinRoot"),
        MannequinRoot,
        Transform::default(),
        GlobalTransform::default(),
        Visibility::Visible,
        InheritedVisibility::default(),
        ViewVisibility::default(),
    ));

    commands.spawn((
        Name::new("StageFloor"),
        Mesh3d(meshes.add(Circle::new(settings.floor_radius).mesh().resolution(64))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: settings.floor_color,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.01, 0.0)
            .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
    ));
}

/// Apply a viewport size to the window. Zero-sized requests (a hidden
/// container) are ignored.
pub fn resize_window(window: &mut Window, width: f32, height: f32) -> bool {
    if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
        return false;
    }
    window.resolution.set(width, height);
    true
}
