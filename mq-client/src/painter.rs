//! Body painting: swap the material of matching avatar meshes for a garment
//! material, keeping the skin material aside so it can be put back.

use bevy::prelude::*;
use mq_utils::{GarmentSlot, MatchPolicy, TargetRegion};
use tracing::{debug, info, warn};

use crate::avatar::classify::mesh_matches;
use crate::avatar::table::MeshTable;
use crate::color::DominantColor;

/// What a painted mesh looks like.
#[derive(Debug, Clone)]
pub enum PaintFinish {
    /// Flat dominant color, no texture.
    Solid(DominantColor),
    /// The garment photo, untinted.
    Hybrid(Handle<Image>),
}

impl PaintFinish {
    pub fn material(&self) -> StandardMaterial {
        match self {
            Self::Solid(color) => StandardMaterial {
                base_color: (*color).into(),
                perceptual_roughness: 0.6,
                metallic: 0.0,
                cull_mode: None,
                double_sided: true,
                ..Default::default()
            },
            Self::Hybrid(texture) => StandardMaterial {
                base_color: Color::WHITE,
                base_color_texture: Some(texture.clone()),
                perceptual_roughness: 0.5,
                metallic: 0.0,
                cull_mode: None,
                double_sided: true,
                ..Default::default()
            },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Solid(_) => "solid",
            Self::Hybrid(_) => "hybrid",
        }
    }
}

/// Meshes painted for one slot, and the garment material they share.
#[derive(Debug, Clone)]
pub struct PaintedSet {
    pub meshes: Vec<Entity>,
    pub material: Handle<StandardMaterial>,
}

pub fn matching_meshes(
    table: &MeshTable,
    target: TargetRegion,
    policy: MatchPolicy,
) -> Vec<Entity> {
    table
        .iter()
        .filter(|(_, mesh)| mesh_matches(&mesh.name, mesh.region, target, policy))
        .map(|(entity, _)| entity)
        .collect()
}

/// Paint every mesh matching `target` with `finish` and tag it with `slot`.
/// `None` when nothing matched; that is logged, not an error.
pub fn paint(
    table: &mut MeshTable,
    materials: &mut Assets<StandardMaterial>,
    slot: GarmentSlot,
    target: TargetRegion,
    policy: MatchPolicy,
    finish: &PaintFinish,
) -> Option<PaintedSet> {
    info!(
        "[body paint/{}] {slot} -> {} region",
        finish.label(),
        target.as_str()
    );
    let targets = matching_meshes(table, target, policy);
    if targets.is_empty() {
        warn!(
            "no mesh matched {} for {slot}; check mesh names for UpperBody/LowerBody",
            target.as_str()
        );
        return None;
    }

    let material = materials.add(finish.material());
    for entity in &targets {
        let Some(mesh) = table.get_mut(*entity) else {
            continue;
        };
        if mesh.original.is_none() {
            mesh.original = Some(mesh.material.clone());
        }
        mesh.clothing = Some(slot);
        debug!("  painted {}", mesh.name);
        table.set_material(*entity, material.clone());
    }
    info!("[body paint] {slot} applied to {} meshes", targets.len());

    Some(PaintedSet {
        meshes: targets,
        material,
    })
}

/// Put the skin material back on every mesh tagged with `slot`, or on every
/// tagged mesh when `slot` is `None`. Returns how many meshes were restored.
pub fn restore(table: &mut MeshTable, slot: Option<GarmentSlot>) -> usize {
    let tagged: Vec<_> = table
        .iter()
        .filter(|(_, mesh)| {
            mesh.original.is_some()
                && mesh.clothing.is_some()
                && (slot.is_none() || mesh.clothing == slot)
        })
        .map(|(entity, _)| entity)
        .collect();

    for entity in &tagged {
        let Some(mesh) = table.get_mut(*entity) else {
            continue;
        };
        mesh.clothing = None;
        if let Some(original) = mesh.original.take() {
            table.set_material(*entity, original);
        }
    }
    tagged.len()
}
