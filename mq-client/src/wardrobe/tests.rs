use mq_utils::normalize_category;

use super::*;
use crate::avatar::classify::classify_table;
use crate::avatar::table::SubMesh;

struct Stage {
    meshes: Assets<Mesh>,
    materials: Assets<StandardMaterial>,
    images: Assets<Image>,
    table: MeshTable,
    skin: Handle<StandardMaterial>,
    upper: Entity,
    lower: Entity,
}

impl Stage {
    fn new() -> Self {
        let mut materials = Assets::<StandardMaterial>::default();
        let skin = materials.add(StandardMaterial::default());
        let mut table = MeshTable::default();
        let (upper, lower) = (Entity::from_raw(10), Entity::from_raw(11));
        table.insert(upper, SubMesh::new("Ch_UpperBody", skin.clone()));
        table.insert(lower, SubMesh::new("Ch_LowerBody", skin.clone()));
        table.insert(Entity::from_raw(12), SubMesh::new("Head", skin.clone()));
        classify_table(&mut table);
        Self {
            meshes: Assets::default(),
            materials,
            images: Assets::default(),
            table,
            skin,
            upper,
            lower,
        }
    }

    fn assets(&mut self) -> WearAssets<'_> {
        WearAssets {
            meshes: &mut self.meshes,
            materials: &mut self.materials,
            images: &mut self.images,
            table: &mut self.table,
        }
    }

    fn all_skin(&self) -> bool {
        self.table
            .iter()
            .all(|(_, mesh)| mesh.material == self.skin && mesh.original.is_none())
    }
}

fn garment(category: &str) -> Garment {
    Garment {
        category: normalize_category(category),
        rgba: vec![200, 30, 30, 255].repeat(8 * 12),
        width: 8,
        height: 12,
        color: DominantColor {
            r: 0.8,
            g: 0.1,
            b: 0.1,
        },
    }
}

const PANELS: WearOptions = WearOptions {
    strategy: FitStrategy::Panel,
    paint_mode: PaintMode::Hybrid,
    match_policy: MatchPolicy::NameMarker,
};

const AUTO: WearOptions = WearOptions {
    strategy: FitStrategy::Auto,
    paint_mode: PaintMode::Hybrid,
    match_policy: MatchPolicy::NameMarker,
};

fn wear_now(
    wardrobe: &mut Wardrobe,
    stage: &mut Stage,
    category: &str,
    options: WearOptions,
) -> WearOutcome {
    let garment = garment(category);
    let seq = wardrobe.issue(garment.category.slot());
    wardrobe.wear(garment, seq, options, &mut stage.assets())
}

fn exclusive(wardrobe: &Wardrobe) -> bool {
    !(wardrobe.is_occupied(GarmentSlot::Dress)
        && (wardrobe.is_occupied(GarmentSlot::Top) || wardrobe.is_occupied(GarmentSlot::Bottom)))
}

#[test]
fn dress_and_separates_never_coexist() {
    let categories = ["상의", "하의", "원피스", "신발", "Outer", "skirt"];
    for options in [PANELS, AUTO] {
        for first in categories {
            for second in categories {
                for third in categories {
                    let mut stage = Stage::new();
                    let mut wardrobe = Wardrobe::default();
                    for category in [first, second, third] {
                        let outcome = wear_now(&mut wardrobe, &mut stage, category, options);
                        assert_ne!(outcome, WearOutcome::Stale);
                        assert!(exclusive(&wardrobe), "{first} {second} {third}");
                    }
                    let last = normalize_category(third).slot();
                    assert!(wardrobe.is_occupied(last), "{first} {second} {third}");
                }
            }
        }
    }
}

#[test]
fn panel_ordering_follows_slot() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    for category in ["상의", "하의", "신발"] {
        assert_eq!(
            wear_now(&mut wardrobe, &mut stage, category, PANELS),
            WearOutcome::Panel
        );
    }
    let order = |slot| match wardrobe.occupant(slot) {
        Some(Occupant::Panel(panel)) => panel.spec.render_order,
        other => panic!("expected a panel in {slot}, got {other:?}"),
    };
    assert!(order(GarmentSlot::Top) > order(GarmentSlot::Bottom));
    assert!(order(GarmentSlot::Bottom) > order(GarmentSlot::Shoes));
    assert_eq!(stage.meshes.len(), 3);
    assert_eq!(stage.images.len(), 3);
}

#[test]
fn replacing_a_panel_disposes_the_old_assets() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    wear_now(&mut wardrobe, &mut stage, "Top", PANELS);
    let first = match wardrobe.occupant(GarmentSlot::Top) {
        Some(Occupant::Panel(panel)) => (panel.mesh.id(), panel.material.id(), panel.texture.id()),
        _ => panic!("expected a top panel"),
    };
    let materials_before = stage.materials.len();

    wear_now(&mut wardrobe, &mut stage, "Top", PANELS);
    assert!(stage.meshes.get(first.0).is_none());
    assert!(stage.materials.get(first.1).is_none());
    assert!(stage.images.get(first.2).is_none());
    assert_eq!(stage.meshes.len(), 1);
    assert_eq!(stage.materials.len(), materials_before);
}

#[test]
fn spawned_panels_are_queued_for_despawn() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    wear_now(&mut wardrobe, &mut stage, "신발", PANELS);
    assert!(wardrobe.needs_sync());
    if let Some(Occupant::Panel(panel)) = wardrobe.slots.get_mut(&GarmentSlot::Shoes) {
        panel.entity = Some(Entity::from_raw(77));
    }
    assert!(!wardrobe.needs_sync());

    assert!(wardrobe.remove(GarmentSlot::Shoes, &mut stage.assets()));
    assert_eq!(wardrobe.despawn_queue, vec![Entity::from_raw(77)]);
    assert!(wardrobe.needs_sync());
}

#[test]
fn auto_paints_matching_regions_and_panels_shoes() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "상의", AUTO),
        WearOutcome::Painted { meshes: 1 }
    );
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "신발", AUTO),
        WearOutcome::Panel
    );
    assert_eq!(
        stage.table.get(stage.upper).unwrap().clothing,
        Some(GarmentSlot::Top)
    );
    assert!(stage.table.get(stage.lower).unwrap().clothing.is_none());
}

#[test]
fn paint_strategy_keeps_shoes_off_the_body() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let options = WearOptions {
        strategy: FitStrategy::Paint,
        ..AUTO
    };
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "상의", options),
        WearOutcome::Painted { meshes: 1 }
    );
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "신발", options),
        WearOutcome::Panel
    );
    assert_eq!(
        stage.table.get(stage.upper).unwrap().clothing,
        Some(GarmentSlot::Top)
    );

    assert!(wardrobe.remove(GarmentSlot::Shoes, &mut stage.assets()));
    assert_eq!(wardrobe.occupied_slots(), vec![GarmentSlot::Top]);
    let upper = stage.table.get(stage.upper).unwrap();
    assert_eq!(upper.clothing, Some(GarmentSlot::Top));
    assert_ne!(upper.material, stage.skin);

    assert!(wardrobe.remove(GarmentSlot::Top, &mut stage.assets()));
    assert!(stage.all_skin());
}

#[test]
fn auto_falls_back_to_a_panel_without_markers() {
    let mut stage = Stage::new();
    stage.table.get_mut(stage.lower).unwrap().name = "Legs".to_string();
    let mut wardrobe = Wardrobe::default();
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "하의", AUTO),
        WearOutcome::Panel
    );
}

#[test]
fn paint_only_with_no_match_leaves_the_slot_empty() {
    let mut stage = Stage::new();
    stage.table.get_mut(stage.lower).unwrap().name = "Legs".to_string();
    let mut wardrobe = Wardrobe::default();
    let options = WearOptions {
        strategy: FitStrategy::Paint,
        ..AUTO
    };
    assert_eq!(
        wear_now(&mut wardrobe, &mut stage, "pants", options),
        WearOutcome::Unmatched
    );
    assert!(!wardrobe.is_occupied(GarmentSlot::Bottom));
    assert_eq!(stage.images.len(), 0);
}

#[test]
fn solid_paint_builds_no_texture() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let options = WearOptions {
        paint_mode: PaintMode::Solid,
        ..AUTO
    };
    wear_now(&mut wardrobe, &mut stage, "원피스", options);
    assert_eq!(stage.images.len(), 0);
    match wardrobe.occupant(GarmentSlot::Dress) {
        Some(Occupant::Painted(painted)) => {
            assert!(painted.texture.is_none());
            let material = stage.materials.get(&painted.set.material).unwrap();
            assert_eq!(material.base_color, Color::srgb(0.8, 0.1, 0.1));
        }
        other => panic!("expected a painted dress, got {other:?}"),
    }
}

#[test]
fn removal_restores_skin_by_value_and_is_idempotent() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    wear_now(&mut wardrobe, &mut stage, "상의", AUTO);
    wear_now(&mut wardrobe, &mut stage, "하의", AUTO);
    assert!(!stage.all_skin());
    let painted_materials = stage.materials.len();
    assert_eq!(painted_materials, 3);

    assert!(wardrobe.remove(GarmentSlot::Top, &mut stage.assets()));
    assert_eq!(stage.table.get(stage.upper).unwrap().material, stage.skin);
    assert!(!wardrobe.remove(GarmentSlot::Top, &mut stage.assets()));

    assert_eq!(wardrobe.remove_all(&mut stage.assets()), 1);
    assert_eq!(wardrobe.remove_all(&mut stage.assets()), 0);
    assert!(stage.all_skin());
    assert_eq!(stage.materials.len(), 1);
    assert_eq!(stage.images.len(), 0);
}

#[test]
fn removing_top_under_a_dress_takes_the_dress_off() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    wear_now(&mut wardrobe, &mut stage, "원피스", PANELS);
    assert!(wardrobe.is_occupied(GarmentSlot::Dress));
    assert!(wardrobe.occupant(GarmentSlot::Top).is_none());

    assert!(wardrobe.remove(GarmentSlot::Bottom, &mut stage.assets()));
    assert!(wardrobe.occupied_slots().is_empty());
    assert!(!wardrobe.remove(GarmentSlot::Top, &mut stage.assets()));
}

#[test]
fn wear_then_dress_then_remove_everything() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();

    wear_now(&mut wardrobe, &mut stage, "상의", AUTO);
    assert_eq!(wardrobe.occupied_slots(), vec![GarmentSlot::Top]);

    wear_now(&mut wardrobe, &mut stage, "원피스", AUTO);
    assert_eq!(wardrobe.occupied_slots(), vec![GarmentSlot::Dress]);
    assert_eq!(
        stage.table.get(stage.upper).unwrap().clothing,
        Some(GarmentSlot::Dress)
    );
    assert_eq!(
        stage.table.get(stage.upper).unwrap().original.as_ref(),
        Some(&stage.skin)
    );

    wardrobe.remove_all(&mut stage.assets());
    assert!(wardrobe.occupied_slots().is_empty());
    assert!(stage.all_skin());
}

#[test]
fn older_request_for_the_same_slot_is_stale() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let old = wardrobe.issue(GarmentSlot::Top);
    let new = wardrobe.issue(GarmentSlot::Top);

    let outcome = wardrobe.wear(garment("상의"), new, PANELS, &mut stage.assets());
    assert_eq!(outcome, WearOutcome::Panel);
    let outcome = wardrobe.wear(garment("상의"), old, PANELS, &mut stage.assets());
    assert_eq!(outcome, WearOutcome::Stale);
    assert_eq!(stage.meshes.len(), 1);
}

#[test]
fn completion_after_removal_is_stale() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let seq = wardrobe.issue(GarmentSlot::Bottom);
    wardrobe.remove(GarmentSlot::Bottom, &mut stage.assets());

    let outcome = wardrobe.wear(garment("하의"), seq, PANELS, &mut stage.assets());
    assert_eq!(outcome, WearOutcome::Stale);
    assert!(!wardrobe.is_occupied(GarmentSlot::Bottom));
}

#[test]
fn late_top_does_not_undo_a_newer_dress() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let top = wardrobe.issue(GarmentSlot::Top);
    let dress = wardrobe.issue(GarmentSlot::Dress);

    // Completions arrive in the reverse order of the requests.
    wardrobe.wear(garment("원피스"), dress, AUTO, &mut stage.assets());
    let outcome = wardrobe.wear(garment("상의"), top, AUTO, &mut stage.assets());

    assert_eq!(outcome, WearOutcome::Stale);
    assert_eq!(wardrobe.occupied_slots(), vec![GarmentSlot::Dress]);
}

#[test]
fn newer_top_still_replaces_an_older_dress() {
    let mut stage = Stage::new();
    let mut wardrobe = Wardrobe::default();
    let dress = wardrobe.issue(GarmentSlot::Dress);
    let top = wardrobe.issue(GarmentSlot::Top);

    wardrobe.wear(garment("원피스"), dress, AUTO, &mut stage.assets());
    wardrobe.wear(garment("상의"), top, AUTO, &mut stage.assets());
    assert_eq!(wardrobe.occupied_slots(), vec![GarmentSlot::Top]);
}
