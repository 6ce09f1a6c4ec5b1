use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use crate::turntable::Turntable;

pub fn drag_rotation(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut turntable: ResMut<Turntable>,
) {
    if buttons.just_pressed(MouseButton::Left) {
        turntable.begin_drag();
    }
    if buttons.just_released(MouseButton::Left) {
        turntable.end_drag();
    }

    if !turntable.dragging {
        motion_events.clear();
        return;
    }

    let mut delta_x = 0.0;
    for ev in motion_events.read() {
        delta_x += ev.delta.x;
    }
    if delta_x != 0.0 {
        turntable.drag(delta_x);
    }
}
