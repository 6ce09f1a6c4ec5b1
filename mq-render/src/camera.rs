use bevy::prelude::*;

pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.9, 3.5);
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.9, 0.0);
pub const CAMERA_FOV_DEGREES: f32 = 35.0;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            clear_color: ClearColorConfig::Custom(Color::NONE),
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(CAMERA_POSITION).looking_at(CAMERA_TARGET, Vec3::Y),
    ));
}
