use bevy::prelude::*;
use mq_utils::GarmentSlot;

/// Parent of the avatar scene and every garment panel. Rotating it turns the
/// whole outfit.
#[derive(Component)]
pub struct MannequinRoot;

/// Draw priority of a garment panel; higher draws in front.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRenderOrder(pub i32);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GarmentPanel {
    pub slot: GarmentSlot,
}
