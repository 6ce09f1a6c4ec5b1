//! Mannequin model loading. The glTF scene is spawned under the mannequin
//! root; once its instance is ready every leaf mesh is registered in the
//! [`MeshTable`], given its own skin material and classified.

pub mod classify;
pub mod table;

use bevy::asset::LoadState;
use bevy::color::HexColorError;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;
use mq_render::MannequinRoot;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use self::table::{MeshTable, SubMesh};

#[derive(Debug, Error)]
#[error("invalid mannequin color {input:?}: {source}")]
pub struct ColorParseError {
    input: String,
    #[source]
    source: HexColorError,
}

/// Parse `#RRGGBB`, `RRGGBB` and the short forms into a color.
pub fn parse_skin_color(hex: &str) -> Result<Color, ColorParseError> {
    Srgba::hex(hex.trim())
        .map(Color::from)
        .map_err(|source| ColorParseError {
            input: hex.to_string(),
            source,
        })
}

/// Where the avatar comes from and the skin it is given.
#[derive(Resource, Debug, Clone)]
pub struct AvatarSettings {
    pub model_path: String,
    pub skin_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvatarStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Resource, Debug, Default)]
pub struct AvatarLoad {
    pub scene: Option<Handle<Scene>>,
    pub status: AvatarStatus,
}

/// Marks the scene instance holding the avatar.
#[derive(Component)]
pub struct AvatarScene;

pub fn spawn_avatar(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<AvatarSettings>,
    mut load: ResMut<AvatarLoad>,
    roots: Query<Entity, With<MannequinRoot>>,
) {
    let Ok(root) = roots.single() else {
        warn!("no mannequin root in the stage; avatar not loaded");
        return;
    };
    info!("loading mannequin model {}", settings.model_path);
    let scene =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(settings.model_path.clone()));
    commands.spawn((
        Name::new("Avatar"),
        AvatarScene,
        SceneRoot(scene.clone()),
        ChildOf(root),
    ));
    load.scene = Some(scene);
    load.status = AvatarStatus::Loading;
}

/// Logs load progress and the terminal failure. No retry.
pub fn report_avatar_load(
    asset_server: Res<AssetServer>,
    settings: Res<AvatarSettings>,
    mut load: ResMut<AvatarLoad>,
) {
    if load.status != AvatarStatus::Loading {
        return;
    }
    let Some(scene) = load.scene.as_ref() else {
        return;
    };
    match asset_server.load_state(scene.id()) {
        LoadState::Failed(err) => {
            error!("mannequin model {} failed to load: {err}", settings.model_path);
            load.status = AvatarStatus::Failed;
        }
        LoadState::Loaded => debug!("mannequin model loaded, waiting for scene instance"),
        LoadState::Loading | LoadState::NotLoaded => {}
    }
}

pub fn on_avatar_ready(
    trigger: Trigger<SceneInstanceReady>,
    avatars: Query<(), With<AvatarScene>>,
    children: Query<&Children>,
    meshes: Query<(&MeshMaterial3d<StandardMaterial>, Option<&Name>, Option<&ChildOf>)>,
    names: Query<&Name>,
    settings: Res<AvatarSettings>,
    mut table: ResMut<MeshTable>,
    mut load: ResMut<AvatarLoad>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let scene_entity = trigger.target();
    if avatars.get(scene_entity).is_err() {
        return;
    }

    let found = children.iter_descendants(scene_entity).filter_map(|entity| {
        let (material, own, parent) = meshes.get(entity).ok()?;
        let parent_name = parent.and_then(|p| names.get(p.parent()).ok());
        Some((entity, mesh_name(own, parent_name), material.0.clone()))
    });
    let found: Vec<_> = found.collect();

    table.clear();
    let count = register_meshes(&mut table, &mut materials, settings.skin_color, found);
    info!("avatar ready: {count} meshes");
    let classified = classify::classify_table(&mut table);
    info!("classified {classified} avatar meshes");
    load.status = AvatarStatus::Ready;
}

/// A mesh's own name, or its node's name when the mesh entity is unnamed.
pub fn mesh_name(own: Option<&Name>, parent: Option<&Name>) -> String {
    own.filter(|name| !name.as_str().is_empty())
        .or(parent)
        .map(|name| name.as_str().to_string())
        .unwrap_or_default()
}

/// Give each mesh its own copy of its material tinted with `skin` and record
/// it in the table. Returns the number of meshes registered.
pub fn register_meshes(
    table: &mut MeshTable,
    materials: &mut Assets<StandardMaterial>,
    skin: Color,
    found: impl IntoIterator<Item = (Entity, String, Handle<StandardMaterial>)>,
) -> usize {
    let mut count = 0;
    for (entity, name, source) in found {
        let mut material = materials.get(&source).cloned().unwrap_or_default();
        material.base_color = skin;
        let handle = materials.add(material);
        table.insert(entity, SubMesh::new(name, handle.clone()));
        table.set_material(entity, handle);
        count += 1;
    }
    count
}

/// Recolor the skin of every registered mesh, including skin currently
/// hidden under painted clothing. Returns the number of materials changed.
pub fn apply_skin_color(
    table: &MeshTable,
    materials: &mut Assets<StandardMaterial>,
    color: Color,
) -> usize {
    let mut changed = 0;
    for (_, mesh) in table.iter() {
        if let Some(material) = materials.get_mut(mesh.skin_material()) {
            material.base_color = color;
            changed += 1;
        }
    }
    changed
}

pub struct AvatarPlugin {
    pub settings: AvatarSettings,
}

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .init_resource::<MeshTable>()
            .init_resource::<AvatarLoad>()
            .add_systems(Startup, spawn_avatar.after(mq_render::setup_stage))
            .add_systems(Update, (report_avatar_load, table::sync_mesh_materials))
            .add_observer(on_avatar_ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_skin_colors() {
        assert_eq!(
            parse_skin_color("#FFE0BD").unwrap(),
            Color::srgb_u8(0xFF, 0xE0, 0xBD)
        );
        assert_eq!(
            parse_skin_color(" 336699 ").unwrap(),
            Color::srgb_u8(0x33, 0x66, 0x99)
        );
        let err = parse_skin_color("#GGG").unwrap_err();
        assert!(err.to_string().contains("#GGG"));
    }

    #[test]
    fn unnamed_meshes_take_their_node_name() {
        let own = Name::new("UpperBody.0");
        let node = Name::new("Ch_UpperBody");
        let empty = Name::new("");
        assert_eq!(mesh_name(Some(&own), Some(&node)), "UpperBody.0");
        assert_eq!(mesh_name(None, Some(&node)), "Ch_UpperBody");
        assert_eq!(mesh_name(Some(&empty), Some(&node)), "Ch_UpperBody");
        assert_eq!(mesh_name(None, None), "");
    }

    #[test]
    fn registered_meshes_get_private_skin_materials() {
        let mut materials = Assets::<StandardMaterial>::default();
        let shared = materials.add(StandardMaterial {
            perceptual_roughness: 0.3,
            ..Default::default()
        });
        let skin = Color::srgb_u8(0xFF, 0xE0, 0xBD);
        let mut table = MeshTable::default();
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let count = register_meshes(
            &mut table,
            &mut materials,
            skin,
            [
                (a, "UpperBody".to_string(), shared.clone()),
                (b, "LowerBody".to_string(), shared.clone()),
            ],
        );

        assert_eq!(count, 2);
        let (ma, mb) = (
            table.get(a).unwrap().material.clone(),
            table.get(b).unwrap().material.clone(),
        );
        assert_ne!(ma, mb);
        assert_ne!(ma, shared);
        let material = materials.get(&ma).unwrap();
        assert_eq!(material.base_color, skin);
        assert_eq!(material.perceptual_roughness, 0.3);
        assert_eq!(table.take_dirty().len(), 2);
    }

    #[test]
    fn skin_color_reaches_meshes_under_clothing() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut table = MeshTable::default();
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let source = materials.add(StandardMaterial::default());
        register_meshes(
            &mut table,
            &mut materials,
            Color::WHITE,
            [
                (a, "UpperBody".to_string(), source.clone()),
                (b, "LowerBody".to_string(), source),
            ],
        );

        let cloth = materials.add(StandardMaterial::default());
        let skin_a = table.get(a).unwrap().material.clone();
        let covered = table.get_mut(a).unwrap();
        covered.original = Some(skin_a.clone());
        table.set_material(a, cloth.clone());

        let brown = Color::srgb_u8(0x8D, 0x55, 0x24);
        assert_eq!(apply_skin_color(&table, &mut materials, brown), 2);
        assert_eq!(materials.get(&skin_a).unwrap().base_color, brown);
        assert_eq!(materials.get(&cloth).unwrap().base_color, Color::WHITE);
        let skin_b = &table.get(b).unwrap().material;
        assert_eq!(materials.get(skin_b).unwrap().base_color, brown);
    }
}
