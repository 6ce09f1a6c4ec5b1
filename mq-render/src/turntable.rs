use bevy::prelude::*;

use crate::components::MannequinRoot;

/// Y rotation of the mannequin: a slow idle sway, overridden while the user
/// drags.
#[derive(Resource, Debug, Clone)]
pub struct Turntable {
    /// Sway amplitude in radians.
    pub idle_amplitude: f32,
    /// Sway phase speed in radians per second.
    pub idle_speed: f32,
    pub drag_sensitivity: f32,
    pub drag_limit: f32,
    pub dragging: bool,
    pub angle: f32,
    phase_origin: f32,
}

impl Default for Turntable {
    fn default() -> Self {
        Self {
            idle_amplitude: 0.05,
            idle_speed: 0.5,
            drag_sensitivity: 0.005,
            drag_limit: 0.3,
            dragging: false,
            angle: 0.0,
            phase_origin: 0.0,
        }
    }
}

impl Turntable {
    pub fn with_amplitude(idle_amplitude: f32) -> Self {
        Self {
            idle_amplitude,
            ..default()
        }
    }

    pub fn idle_angle(&self, now: f32) -> f32 {
        ((now - self.phase_origin) * self.idle_speed).sin() * self.idle_amplitude
    }

    pub fn tick(&mut self, now: f32) {
        if !self.dragging {
            self.angle = self.idle_angle(now);
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Horizontal pointer travel in pixels.
    pub fn drag(&mut self, delta_x: f32) {
        if !self.dragging {
            return;
        }
        self.angle = (self.angle + delta_x * self.drag_sensitivity)
            .clamp(-self.drag_limit, self.drag_limit);
    }

    /// Back to the front view; the sway restarts from zero at `now`.
    pub fn reset(&mut self, now: f32) {
        self.angle = 0.0;
        self.dragging = false;
        self.phase_origin = now;
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.angle)
    }
}

pub fn apply_turntable(
    time: Res<Time>,
    mut turntable: ResMut<Turntable>,
    mut roots: Query<&mut Transform, With<MannequinRoot>>,
) {
    turntable.tick(time.elapsed_secs());
    for mut transform in &mut roots {
        transform.rotation = turntable.rotation();
    }
}
