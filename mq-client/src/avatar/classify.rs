use mq_utils::{BodyRegion, MatchPolicy, TargetRegion};
use tracing::info;

use super::table::MeshTable;

const UPPER_MARKERS: [&str; 4] = ["upper", "torso", "chest", "arm"];
const LOWER_MARKERS: [&str; 3] = ["lower", "leg", "pelvis"];

/// Raw-name markers the body painter keys off under [`MatchPolicy::NameMarker`].
pub const UPPER_BODY_MARKER: &str = "UpperBody";
pub const LOWER_BODY_MARKER: &str = "LowerBody";

/// Region of a mesh from its name. Upper markers win over lower ones;
/// unmatched names count as upper body.
pub fn classify_mesh_name(name: &str) -> BodyRegion {
    let lowered = name.to_lowercase();
    if UPPER_MARKERS.iter().any(|m| lowered.contains(m)) {
        BodyRegion::Upper
    } else if LOWER_MARKERS.iter().any(|m| lowered.contains(m)) {
        BodyRegion::Lower
    } else {
        BodyRegion::Upper
    }
}

/// Tag every mesh in the table. Returns the number of meshes classified.
pub fn classify_table(table: &mut MeshTable) -> usize {
    let entities: Vec<_> = table.iter().map(|(entity, _)| entity).collect();
    for (index, entity) in entities.iter().enumerate() {
        let Some(mesh) = table.get_mut(*entity) else {
            continue;
        };
        mesh.region = classify_mesh_name(&mesh.name);
        let label = if mesh.name.is_empty() {
            "(unnamed)"
        } else {
            mesh.name.as_str()
        };
        info!("  [{index}] mesh \"{label}\" -> {}", mesh.region.as_str());
    }
    entities.len()
}

/// Whether a mesh is painted for `target` under `policy`.
pub fn mesh_matches(
    name: &str,
    region: BodyRegion,
    target: TargetRegion,
    policy: MatchPolicy,
) -> bool {
    match policy {
        MatchPolicy::NameMarker => match target {
            TargetRegion::Upper => name.contains(UPPER_BODY_MARKER),
            TargetRegion::Lower => name.contains(LOWER_BODY_MARKER),
            TargetRegion::All => {
                name.contains(UPPER_BODY_MARKER) || name.contains(LOWER_BODY_MARKER)
            }
        },
        MatchPolicy::ClassifiedRegion => target.covers(region),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bevy::prelude::*;
    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::avatar::table::SubMesh;

    #[test]
    fn name_heuristics() {
        assert_eq!(classify_mesh_name("Torso_01"), BodyRegion::Upper);
        assert_eq!(classify_mesh_name("LeftArm"), BodyRegion::Upper);
        assert_eq!(classify_mesh_name("Pelvis"), BodyRegion::Lower);
        assert_eq!(classify_mesh_name("mesh_LEG_r"), BodyRegion::Lower);
        assert_eq!(classify_mesh_name("LowerBody.0"), BodyRegion::Lower);
        assert_eq!(classify_mesh_name("Head"), BodyRegion::Upper);
        assert_eq!(classify_mesh_name(""), BodyRegion::Upper);
    }

    #[test]
    fn upper_marker_wins_over_lower() {
        // "upperleg" contains both an upper and a lower marker.
        assert_eq!(classify_mesh_name("UpperLeg"), BodyRegion::Upper);
    }

    #[test]
    fn classification_is_stable() {
        let mut materials = Assets::<StandardMaterial>::default();
        let skin = materials.add(StandardMaterial::default());
        let mut table = MeshTable::default();
        for (i, name) in ["Chest", "Leg_L", "Hair", ""].iter().enumerate() {
            table.insert(Entity::from_raw(i as u32), SubMesh::new(*name, skin.clone()));
        }

        assert_eq!(classify_table(&mut table), 4);
        let first: Vec<_> = table.iter().map(|(_, m)| m.region).collect();
        classify_table(&mut table);
        let second: Vec<_> = table.iter().map(|(_, m)| m.region).collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            [
                BodyRegion::Upper,
                BodyRegion::Lower,
                BodyRegion::Upper,
                BodyRegion::Upper
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn classification_is_logged_under_the_default_filter() {
        let mut materials = Assets::<StandardMaterial>::default();
        let skin = materials.add(StandardMaterial::default());
        let mut table = MeshTable::default();
        table.insert(Entity::from_raw(1), SubMesh::new("Ch_LowerBody", skin.clone()));
        table.insert(Entity::from_raw(2), SubMesh::new("", skin));

        let output = Captured::default();
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(move || writer.clone())
            .without_time()
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || classify_table(&mut table));

        let logged = String::from_utf8(output.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("[0] mesh \"Ch_LowerBody\" -> lower"), "{logged}");
        assert!(logged.contains("[1] mesh \"(unnamed)\" -> upper"), "{logged}");
    }

    #[test]
    fn name_marker_policy_is_case_sensitive_and_ignores_region() {
        let policy = MatchPolicy::NameMarker;
        assert!(mesh_matches("Ch_UpperBody", BodyRegion::Lower, TargetRegion::Upper, policy));
        assert!(!mesh_matches("upperbody", BodyRegion::Upper, TargetRegion::Upper, policy));
        assert!(mesh_matches("LowerBody.1", BodyRegion::Upper, TargetRegion::All, policy));
        assert!(!mesh_matches("Head", BodyRegion::Upper, TargetRegion::All, policy));
    }

    #[test]
    fn classified_region_policy_uses_tags() {
        let policy = MatchPolicy::ClassifiedRegion;
        assert!(mesh_matches("Head", BodyRegion::Upper, TargetRegion::Upper, policy));
        assert!(!mesh_matches("Head", BodyRegion::Upper, TargetRegion::Lower, policy));
        assert!(mesh_matches("Leg", BodyRegion::Lower, TargetRegion::All, policy));
    }
}
