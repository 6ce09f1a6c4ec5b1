use std::collections::HashMap;

use bevy::prelude::*;
use mq_utils::{BodyRegion, GarmentSlot};

/// Per-mesh state of the avatar, kept beside the scene graph.
#[derive(Debug, Clone)]
pub struct SubMesh {
    pub name: String,
    pub region: BodyRegion,
    pub material: Handle<StandardMaterial>,
    /// Material in place before the first garment was painted on.
    pub original: Option<Handle<StandardMaterial>>,
    /// Slot whose garment is currently painted on this mesh.
    pub clothing: Option<GarmentSlot>,
}

impl SubMesh {
    pub fn new(name: impl Into<String>, material: Handle<StandardMaterial>) -> Self {
        Self {
            name: name.into(),
            region: BodyRegion::Unclassified,
            material,
            original: None,
            clothing: None,
        }
    }

    /// The skin material, whether or not a garment covers it right now.
    pub fn skin_material(&self) -> &Handle<StandardMaterial> {
        self.original.as_ref().unwrap_or(&self.material)
    }
}

/// Side table of the avatar's leaf meshes keyed by entity, in traversal
/// order.
#[derive(Resource, Debug, Default)]
pub struct MeshTable {
    order: Vec<Entity>,
    entries: HashMap<Entity, SubMesh>,
    dirty: Vec<Entity>,
}

impl MeshTable {
    pub fn insert(&mut self, entity: Entity, mesh: SubMesh) {
        if self.entries.insert(entity, mesh).is_none() {
            self.order.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
        self.dirty.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, entity: Entity) -> Option<&SubMesh> {
        self.entries.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut SubMesh> {
        self.entries.get_mut(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &SubMesh)> {
        self.order
            .iter()
            .filter_map(|entity| self.entries.get(entity).map(|mesh| (*entity, mesh)))
    }

    /// Swap the live material of `entity`; the change is picked up by
    /// [`sync_mesh_materials`].
    pub fn set_material(&mut self, entity: Entity, material: Handle<StandardMaterial>) {
        if let Some(mesh) = self.entries.get_mut(&entity) {
            mesh.material = material;
            self.dirty.push(entity);
        }
    }

    pub fn take_dirty(&mut self) -> Vec<(Entity, Handle<StandardMaterial>)> {
        let dirty = std::mem::take(&mut self.dirty);
        let mut out = Vec::with_capacity(dirty.len());
        for entity in dirty {
            if let Some(mesh) = self.entries.get(&entity) {
                out.push((entity, mesh.material.clone()));
            }
        }
        out
    }
}

pub fn sync_mesh_materials(
    mut table: ResMut<MeshTable>,
    mut query: Query<&mut MeshMaterial3d<StandardMaterial>>,
) {
    if table.dirty.is_empty() {
        return;
    }
    for (entity, material) in table.take_dirty() {
        if let Ok(mut current) = query.get_mut(entity) {
            current.0 = material;
        }
    }
}
