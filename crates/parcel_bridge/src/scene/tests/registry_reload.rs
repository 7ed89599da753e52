//! Identity-stable reloads and unloads

use super::{debug_registry, eleven_scenes};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reloading_the_same_manifest_keeps_every_scene_object() {
        let mut registry = debug_registry();
        let manifests = eleven_scenes();
        assert_eq!(manifests.len(), 11);

        let report = registry.load_parcel_scenes(&manifests);
        assert_eq!(report.loaded.len(), 11);
        assert_eq!(registry.len(), 11);

        let before: HashMap<String, _> = registry
            .scene_ids()
            .into_iter()
            .filter_map(|id| registry.get(&id).map(|scene| (id, scene)))
            .collect();

        let report = registry.load_parcel_scenes(&manifests);
        assert!(report.loaded.is_empty());
        assert_eq!(report.superseded.len(), 11);
        assert_eq!(registry.len(), 11);

        for (id, scene) in &before {
            let after = registry.get(id).expect("still loaded");
            assert!(Arc::ptr_eq(scene, &after), "scene {id} was replaced");
        }
    }

    #[test]
    fn content_mapping_survives_parsing() {
        let manifests = eleven_scenes();
        let first = &manifests[0];
        assert_eq!(first.scene_id(), "-102,100");
        assert_eq!(
            first.content_url("game.js").as_deref(),
            Some("http://localhost:8080/local-ipfs/contents/Qm-102100game")
        );
    }

    #[test]
    fn unload_scene_empties_it_and_removes_it() {
        let mut registry = debug_registry();
        registry.load_parcel_scenes(&eleven_scenes());
        let scene = registry.get("-100,105").expect("loaded");
        {
            let mut scene = scene.write();
            for id in ["a", "b", "c"] {
                scene.create_entity(id).expect("create");
            }
            scene.set_entity_parent("b", "a").expect("parent");
        }

        assert!(registry.unload_scene("-100,105"));
        assert!(!registry.contains("-100,105"));
        assert_eq!(scene.read().entity_count(), 0);
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn unload_all_resets_the_registry() {
        let mut registry = debug_registry();
        registry.load_parcel_scenes(&eleven_scenes());
        assert_eq!(registry.unload_all_scenes(), 11);
        assert!(registry.is_empty());

        let report = registry.load_parcel_scenes(&eleven_scenes());
        assert_eq!(report.loaded.len(), 11);
    }
}
