use bevy::prelude::*;

/// Spot lumens per unit of the studio intensity scale below.
const SPOT_LUMENS: f32 = 400_000.0;

#[derive(Debug, Clone, Copy)]
struct StudioSpot {
    name: &'static str,
    color: Color,
    intensity: f32,
    position: Vec3,
    target: Vec3,
    angle: f32,
    penumbra: f32,
    range: f32,
    shadows: bool,
}

const WARM_WHITE: Color = Color::srgb(1.0, 0.961, 0.902);

const STUDIO_SPOTS: [StudioSpot; 4] = [
    StudioSpot {
        name: "center",
        color: Color::WHITE,
        intensity: 1.2,
        position: Vec3::new(0.0, 4.0, 1.0),
        target: Vec3::new(0.0, 0.5, 0.0),
        angle: std::f32::consts::PI / 6.0,
        penumbra: 0.5,
        range: 10.0,
        shadows: true,
    },
    StudioSpot {
        name: "left",
        color: WARM_WHITE,
        intensity: 0.8,
        position: Vec3::new(-2.0, 3.5, 0.5),
        target: Vec3::new(0.0, 0.5, 0.0),
        angle: std::f32::consts::PI / 7.0,
        penumbra: 0.6,
        range: 8.0,
        shadows: false,
    },
    StudioSpot {
        name: "right",
        color: WARM_WHITE,
        intensity: 0.8,
        position: Vec3::new(2.0, 3.5, 0.5),
        target: Vec3::new(0.0, 0.5, 0.0),
        angle: std::f32::consts::PI / 7.0,
        penumbra: 0.6,
        range: 8.0,
        shadows: false,
    },
    // Rim light from behind for silhouette separation.
    StudioSpot {
        name: "rim",
        color: Color::srgb(0.667, 0.8, 1.0),
        intensity: 0.5,
        position: Vec3::new(0.0, 2.5, -2.0),
        target: Vec3::new(0.0, 1.0, 0.0),
        angle: std::f32::consts::PI / 4.0,
        penumbra: 0.8,
        range: 20.0,
        shadows: false,
    },
];

pub fn spawn_studio_lights(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        Name::new("KeyLight"),
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 6_000.0,
            ..default()
        },
        Transform::from_xyz(1.0, 2.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    for spot in STUDIO_SPOTS {
        commands.spawn((
            Name::new(format!("StudioSpot[{}]", spot.name)),
            SpotLight {
                color: spot.color,
                intensity: spot.intensity * SPOT_LUMENS,
                range: spot.range,
                outer_angle: spot.angle,
                inner_angle: spot.angle * (1.0 - spot.penumbra),
                shadows_enabled: spot.shadows,
                ..default()
            },
            Transform::from_translation(spot.position).looking_at(spot.target, Vec3::Y),
        ));
    }
}
