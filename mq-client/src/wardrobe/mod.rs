//! Garment slots. Each slot holds at most one occupant, either a panel
//! floating over the body or a set of painted avatar meshes. A dress is
//! mutually exclusive with top and bottom.
//!
//! Every wear request carries a sequence number handed out by
//! [`Wardrobe::issue`]. A finished request is only installed if it is still
//! the newest for its slot and nothing cleared the slot after it was issued,
//! so late completions can never resurrect a garment that was replaced or
//! removed in the meantime.

use std::collections::HashMap;

use bevy::prelude::*;
use mq_render::panel::{self, PanelSpec};
use mq_render::{GarmentPanel, MannequinRoot, PanelRenderOrder};
use mq_utils::{FitStrategy, GarmentCategory, GarmentSlot, MatchPolicy, PaintMode};
use tracing::{debug, info, warn};

use crate::avatar::table::MeshTable;
use crate::color::DominantColor;
use crate::painter::{self, PaintFinish, PaintedSet};

#[cfg(test)]
mod tests;

/// A decoded garment photo ready to be worn.
#[derive(Debug, Clone)]
pub struct Garment {
    pub category: GarmentCategory,
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color: DominantColor,
}

#[derive(Debug)]
pub struct PanelOccupant {
    pub spec: PanelSpec,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub texture: Handle<Image>,
    /// Set once the panel has been spawned under the mannequin root.
    pub entity: Option<Entity>,
}

#[derive(Debug)]
pub struct PaintedOccupant {
    pub set: PaintedSet,
    pub texture: Option<Handle<Image>>,
}

#[derive(Debug)]
pub enum Occupant {
    Panel(PanelOccupant),
    Painted(PaintedOccupant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearOutcome {
    /// A newer request or a removal superseded this one.
    Stale,
    Panel,
    Painted { meshes: usize },
    /// Paint-only strategy and no mesh matched; the slot stays empty.
    Unmatched,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WearOptions {
    pub strategy: FitStrategy,
    pub paint_mode: PaintMode,
    pub match_policy: MatchPolicy,
}

/// Asset stores the wardrobe builds into and disposes from.
pub struct WearAssets<'a> {
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub images: &'a mut Assets<Image>,
    pub table: &'a mut MeshTable,
}

#[derive(Resource, Debug, Default)]
pub struct Wardrobe {
    slots: HashMap<GarmentSlot, Occupant>,
    next_seq: u64,
    latest: HashMap<GarmentSlot, u64>,
    cleared: HashMap<GarmentSlot, u64>,
    despawn_queue: Vec<Entity>,
}

impl Wardrobe {
    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn mark_cleared(&mut self, slot: GarmentSlot, seq: u64) {
        let cleared = self.cleared.entry(slot).or_default();
        *cleared = (*cleared).max(seq);
    }

    /// Start a wear request for `slot`; any earlier request for it is now
    /// stale.
    pub fn issue(&mut self, slot: GarmentSlot) -> u64 {
        let seq = self.bump();
        self.latest.insert(slot, seq);
        seq
    }

    pub fn accepts(&self, slot: GarmentSlot, seq: u64) -> bool {
        self.latest.get(&slot) == Some(&seq)
            && seq > self.cleared.get(&slot).copied().unwrap_or(0)
    }

    pub fn occupant(&self, slot: GarmentSlot) -> Option<&Occupant> {
        self.slots.get(&slot)
    }

    pub fn is_occupied(&self, slot: GarmentSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn occupied_slots(&self) -> Vec<GarmentSlot> {
        GarmentSlot::ALL
            .into_iter()
            .filter(|slot| self.is_occupied(*slot))
            .collect()
    }

    /// Install a finished request. Conflicting slots and the target slot are
    /// emptied first.
    pub fn wear(
        &mut self,
        garment: Garment,
        seq: u64,
        options: WearOptions,
        assets: &mut WearAssets,
    ) -> WearOutcome {
        let slot = garment.category.slot();
        if !self.accepts(slot, seq) {
            debug!("dropping stale {slot} garment (request {seq})");
            return WearOutcome::Stale;
        }

        for conflict in slot.conflicts() {
            if self.clear_slot(*conflict, assets) {
                info!("{slot} replaces {conflict}");
            }
            self.mark_cleared(*conflict, seq);
        }
        self.clear_slot(slot, assets);

        let target = garment.category.target_region();
        // Shoes have no body region of their own; they are always a panel.
        let paint = slot != GarmentSlot::Shoes
            && match options.strategy {
                FitStrategy::Panel => false,
                FitStrategy::Paint => true,
                FitStrategy::Auto => {
                    !painter::matching_meshes(&*assets.table, target, options.match_policy)
                        .is_empty()
                }
            };

        if paint {
            let texture = match options.paint_mode {
                PaintMode::Solid => None,
                PaintMode::Hybrid => Some(assets.images.add(panel::garment_image(
                    garment.rgba,
                    garment.width,
                    garment.height,
                ))),
            };
            let finish = match &texture {
                Some(texture) => PaintFinish::Hybrid(texture.clone()),
                None => PaintFinish::Solid(garment.color),
            };
            let Some(set) = painter::paint(
                assets.table,
                assets.materials,
                slot,
                target,
                options.match_policy,
                &finish,
            ) else {
                if let Some(texture) = texture {
                    assets.images.remove(texture.id());
                }
                return WearOutcome::Unmatched;
            };
            let meshes = set.meshes.len();
            self.slots
                .insert(slot, Occupant::Painted(PaintedOccupant { set, texture }));
            return WearOutcome::Painted { meshes };
        }

        let multiplier =
            panel::size_multiplier(panel::aspect_ratio(garment.width, garment.height));
        let spec = PanelSpec::for_slot(slot, multiplier);
        let mesh = assets.meshes.add(spec.build_mesh());
        let texture = assets.images.add(panel::garment_image(
            garment.rgba,
            garment.width,
            garment.height,
        ));
        let material = assets.materials.add(panel::panel_material(texture.clone()));
        info!(
            "[{slot} panel] {}x{} photo, size x{multiplier:.2}, render order {}",
            garment.width, garment.height, spec.render_order
        );
        self.slots.insert(
            slot,
            Occupant::Panel(PanelOccupant {
                spec,
                mesh,
                material,
                texture,
                entity: None,
            }),
        );
        WearOutcome::Panel
    }

    /// Empty `slot`. Removing top or bottom while only a dress is worn takes
    /// the dress off. Returns whether anything was removed.
    pub fn remove(&mut self, slot: GarmentSlot, assets: &mut WearAssets) -> bool {
        let target = if slot.aliased_by_dress()
            && !self.is_occupied(slot)
            && self.is_occupied(GarmentSlot::Dress)
        {
            GarmentSlot::Dress
        } else {
            slot
        };
        let seq = self.bump();
        self.mark_cleared(slot, seq);
        self.mark_cleared(target, seq);
        self.clear_slot(target, assets)
    }

    /// Empty every slot. Returns how many were occupied.
    pub fn remove_all(&mut self, assets: &mut WearAssets) -> usize {
        let seq = self.bump();
        let mut removed = 0;
        for slot in GarmentSlot::ALL {
            self.mark_cleared(slot, seq);
            if self.clear_slot(slot, assets) {
                removed += 1;
            }
        }
        removed
    }

    fn clear_slot(&mut self, slot: GarmentSlot, assets: &mut WearAssets) -> bool {
        let Some(occupant) = self.slots.remove(&slot) else {
            return false;
        };
        match occupant {
            Occupant::Panel(panel) => {
                assets.meshes.remove(panel.mesh.id());
                assets.materials.remove(panel.material.id());
                assets.images.remove(panel.texture.id());
                if let Some(entity) = panel.entity {
                    self.despawn_queue.push(entity);
                }
            }
            Occupant::Painted(painted) => {
                let restored = painter::restore(assets.table, Some(slot));
                debug!("{slot}: restored {restored} meshes");
                assets.materials.remove(painted.set.material.id());
                if let Some(texture) = painted.texture {
                    assets.images.remove(texture.id());
                }
            }
        }
        info!("{slot} removed");
        true
    }

    fn needs_sync(&self) -> bool {
        !self.despawn_queue.is_empty()
            || self.slots.values().any(|occupant| {
                matches!(occupant, Occupant::Panel(PanelOccupant { entity: None, .. }))
            })
    }
}

/// Spawns freshly built panels under the mannequin root and despawns the
/// ones whose slot was emptied.
pub fn sync_garment_panels(
    mut commands: Commands,
    mut wardrobe: ResMut<Wardrobe>,
    roots: Query<Entity, With<MannequinRoot>>,
) {
    if !wardrobe.needs_sync() {
        return;
    }
    for entity in std::mem::take(&mut wardrobe.despawn_queue) {
        if let Ok(mut entity) = commands.get_entity(entity) {
            entity.despawn();
        }
    }

    let Ok(root) = roots.single() else {
        warn!("no mannequin root; garment panels not spawned");
        return;
    };
    for (slot, occupant) in wardrobe.slots.iter_mut() {
        let Occupant::Panel(panel) = occupant else {
            continue;
        };
        if panel.entity.is_some() {
            continue;
        }
        let entity = commands
            .spawn((
                Name::new(format!("GarmentPanel[{slot}]")),
                GarmentPanel { slot: *slot },
                PanelRenderOrder(panel.spec.render_order),
                Mesh3d(panel.mesh.clone()),
                MeshMaterial3d(panel.material.clone()),
                panel.spec.transform(),
                ChildOf(root),
            ))
            .id();
        panel.entity = Some(entity);
    }
}
