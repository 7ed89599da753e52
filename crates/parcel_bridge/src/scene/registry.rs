//! Scene registry
//!
//! Owns every active scene keyed by id, positions them on the world grid and
//! holds the consuming end of each scene's outbound queue. All mutations go
//! through `&mut self`; the host serializes them on its control loop.

use super::error::SceneError;
use super::manifest::SceneManifest;
use super::parcel_scene::ParcelScene;
use super::resources::{RenderResourcePool, SharedResourcePool};
use crate::core::{BridgeConfig, ParcelSettings};
use crate::events::SceneEvent;
use crate::parcel::{FloorHeight, GridPositioner, ParcelCoord};
use crate::protocol::{action_queue, ActionReceiver, SceneAction};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Scene handle shared with the scene's script runner
pub type SharedScene = Arc<RwLock<ParcelScene>>;

struct SceneEntry {
    scene: SharedScene,
    outbound: ActionReceiver,
}

/// What a load call did with each descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Newly created scenes
    pub loaded: Vec<String>,
    /// Ids already present; the existing scene was kept
    pub superseded: Vec<String>,
    /// Descriptors that failed validation
    pub rejected: Vec<String>,
}

/// Registry of active scenes
pub struct SceneRegistry {
    scenes: HashMap<String, SceneEntry>,
    parcel_owners: HashMap<ParcelCoord, String>,
    positioner: GridPositioner,
    settings: ParcelSettings,
    debug: bool,
    resources: SharedResourcePool,
    queue_capacity: usize,
    notifications: Vec<SceneEvent>,
}

impl SceneRegistry {
    /// Empty registry configured from `config`
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            scenes: HashMap::new(),
            parcel_owners: HashMap::new(),
            positioner: GridPositioner::from_settings(&config.parcel, config.debug),
            settings: config.parcel.clone(),
            debug: config.debug,
            resources: RenderResourcePool::shared(),
            queue_capacity: config.transport.scene_queue_capacity,
            notifications: Vec::new(),
        }
    }

    /// Load every descriptor whose id is not registered yet.
    ///
    /// Ids already present keep their existing scene object untouched.
    pub fn load_parcel_scenes(&mut self, manifests: &[SceneManifest]) -> LoadReport {
        let mut report = LoadReport::default();
        for manifest in manifests {
            let id = manifest.scene_id();
            if self.scenes.contains_key(&id) {
                log::debug!("[{id}] already loaded, keeping the existing scene");
                report.superseded.push(id);
                continue;
            }
            if let Err(err) = manifest.validate() {
                log::warn!("[{id}] rejected: {err}");
                report.rejected.push(id);
                continue;
            }
            self.insert_scene(manifest.clone(), false);
            report.loaded.push(id);
        }
        report
    }

    /// Replace descriptor data of registered scenes in place
    pub fn update_parcel_scenes(&mut self, manifests: &[SceneManifest]) -> Vec<String> {
        let mut updated = Vec::new();
        for manifest in manifests {
            let id = manifest.scene_id();
            let Some(entry) = self.scenes.get(&id) else {
                log::warn!("[{id}] update for a scene that is not loaded, skipping");
                continue;
            };
            if let Err(err) = manifest.validate() {
                log::warn!("[{id}] update rejected: {err}");
                continue;
            }
            let scene = Arc::clone(&entry.scene);
            let is_global = scene.read().is_global();
            self.release_parcels(&id);
            scene.write().replace_manifest(manifest.clone(), &self.positioner);
            if !is_global {
                self.claim_parcels(&id, &manifest.parcels);
            }
            log::info!("[{id}] updated");
            updated.push(id);
        }
        updated
    }

    /// Register a global UI scene, or return the one already under `id`
    pub fn create_ui_scene(&mut self, id: &str, base_url: &str) -> SharedScene {
        if let Some(entry) = self.scenes.get(id) {
            log::debug!("[{id}] UI scene already loaded, keeping the existing scene");
            return Arc::clone(&entry.scene);
        }
        let manifest = SceneManifest::new(id, ParcelCoord::new(0, 0)).with_base_url(base_url);
        self.insert_scene(manifest, true)
    }

    fn insert_scene(&mut self, manifest: SceneManifest, is_global: bool) -> SharedScene {
        let (tx, rx) = action_queue(self.queue_capacity);
        let id = manifest.scene_id();
        let parcels = manifest.parcels.clone();
        let mut scene = ParcelScene::new(manifest, is_global, tx, Arc::clone(&self.resources));
        scene.position(&self.positioner);
        let scene = Arc::new(RwLock::new(scene));

        if !is_global {
            self.claim_parcels(&id, &parcels);
        }
        self.scenes.insert(
            id.clone(),
            SceneEntry {
                scene: Arc::clone(&scene),
                outbound: rx,
            },
        );
        log::info!("[{id}] loaded with {} parcels", parcels.len());
        self.notifications.push(SceneEvent::SceneLoaded { scene_id: id });
        scene
    }

    fn claim_parcels(&mut self, id: &str, parcels: &[ParcelCoord]) {
        for parcel in parcels {
            match self.parcel_owners.get(parcel) {
                Some(owner) if owner != id => {
                    log::warn!("[{id}] parcel {parcel} is already owned by '{owner}'");
                }
                _ => {
                    self.parcel_owners.insert(*parcel, id.to_string());
                }
            }
        }
    }

    fn release_parcels(&mut self, id: &str) {
        self.parcel_owners.retain(|_, owner| owner != id);
    }

    /// Unload a scene; in-flight actions for it are discarded
    pub fn unload_scene(&mut self, id: &str) -> bool {
        let Some(entry) = self.scenes.remove(id) else {
            log::debug!("[{id}] unload requested for a scene that is not loaded");
            return false;
        };
        self.release_parcels(id);

        let discarded = entry.outbound.drain().len();
        let removed = {
            let mut scene = entry.scene.write();
            let removed = scene.unload();
            scene.take_notifications();
            removed
        };
        if discarded > 0 {
            log::debug!("[{id}] discarded {discarded} queued actions");
        }
        log::info!("[{id}] unloaded, {removed} entities released");
        self.notifications.push(SceneEvent::SceneUnloaded {
            scene_id: id.to_string(),
        });
        true
    }

    /// Unload every scene, returning how many
    pub fn unload_all_scenes(&mut self) -> usize {
        let ids = self.scene_ids();
        ids.iter().filter(|id| self.unload_scene(id)).count()
    }

    /// Switch between the debug floor and the external floor height
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        self.apply_floor();
    }

    /// External floor height used outside debug mode
    pub fn set_floor_height(&mut self, height: f32) {
        self.settings.floor_height = height;
        self.apply_floor();
    }

    fn apply_floor(&mut self) {
        let floor = if self.debug {
            FloorHeight::Debug(self.settings.debug_floor_height)
        } else {
            FloorHeight::External(self.settings.floor_height)
        };
        self.positioner.set_floor(floor);
    }

    /// Grid positioner used for new scenes
    pub const fn positioner(&self) -> &GridPositioner {
        &self.positioner
    }

    /// Render resources of every scene
    pub const fn resources(&self) -> &SharedResourcePool {
        &self.resources
    }

    /// Scene by id
    pub fn get(&self, id: &str) -> Option<SharedScene> {
        self.scenes.get(id).map(|entry| Arc::clone(&entry.scene))
    }

    /// Id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// No scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Registered ids, sorted
    pub fn scene_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scenes.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Scene that owns a parcel
    pub fn scene_at(&self, parcel: ParcelCoord) -> Option<&str> {
        self.parcel_owners.get(&parcel).map(String::as_str)
    }

    /// Drain each scene's outbound queue, scenes sorted by id
    pub fn drain_outbound(&mut self) -> Vec<(String, Vec<SceneAction>)> {
        self.scene_ids()
            .into_iter()
            .filter_map(|id| {
                let actions = self.scenes.get(&id)?.outbound.drain();
                (!actions.is_empty()).then_some((id, actions))
            })
            .collect()
    }

    /// Forward a renderer load report to the owning scene
    pub fn disposable_loaded(&mut self, scene_id: &str, component_id: &str) -> Result<(), SceneError> {
        let entry = self
            .scenes
            .get(scene_id)
            .ok_or_else(|| SceneError::SceneUnloaded(scene_id.to_string()))?;
        entry.scene.write().disposable_loaded(component_id);
        Ok(())
    }

    /// Registry events followed by each scene's, scenes sorted by id
    pub fn take_notifications(&mut self) -> Vec<SceneEvent> {
        let mut events = std::mem::take(&mut self.notifications);
        for id in self.scene_ids() {
            if let Some(entry) = self.scenes.get(&id) {
                events.extend(entry.scene.write().take_notifications());
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEBUG_FLOOR_HEIGHT;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn manifest(id: &str, x: i32, y: i32) -> SceneManifest {
        SceneManifest::new(id, ParcelCoord::new(x, y)).with_parcels([ParcelCoord::new(x, y)])
    }

    #[test]
    fn load_positions_and_claims_parcels() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        let report = registry.load_parcel_scenes(&[manifest("a", 3, 4), manifest("", -2, 5)]);
        assert_eq!(report.loaded, vec!["a".to_string(), "-2,5".to_string()]);
        assert_eq!(registry.scene_ids(), vec!["-2,5".to_string(), "a".to_string()]);
        assert_eq!(registry.scene_at(ParcelCoord::new(3, 4)), Some("a"));

        let scene = registry.get("a").expect("loaded");
        assert_relative_eq!(scene.read().origin(), Vec3::new(30.0, 0.0, 40.0));
    }

    #[test]
    fn reload_keeps_existing_objects() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        registry.load_parcel_scenes(&[manifest("a", 0, 0)]);
        let first = registry.get("a").expect("loaded");
        let report = registry.load_parcel_scenes(&[manifest("a", 9, 9)]);
        assert_eq!(report.superseded, vec!["a".to_string()]);
        let second = registry.get("a").expect("loaded");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.read().manifest().base_position, ParcelCoord::new(0, 0));
    }

    #[test]
    fn invalid_descriptor_does_not_block_the_rest() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        let bad = manifest("bad", 0, 0).with_parcels([ParcelCoord::new(0, 0), ParcelCoord::new(0, 0)]);
        let report = registry.load_parcel_scenes(&[bad, manifest("good", 1, 1)]);
        assert_eq!(report.rejected, vec!["bad".to_string()]);
        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn update_replaces_descriptor_in_place() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        registry.load_parcel_scenes(&[manifest("a", 0, 0)]);
        let before = registry.get("a").expect("loaded");

        let moved = SceneManifest::new("a", ParcelCoord::new(0, 0))
            .with_parcels([ParcelCoord::new(0, 0), ParcelCoord::new(0, 1)]);
        assert_eq!(registry.update_parcel_scenes(&[moved, manifest("ghost", 5, 5)]), vec!["a".to_string()]);

        let after = registry.get("a").expect("loaded");
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.read().parcel_offsets().len(), 2);
        assert_eq!(registry.scene_at(ParcelCoord::new(0, 1)), Some("a"));
        assert!(!registry.contains("ghost"));
    }

    #[test]
    fn unload_empties_the_scene() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        registry.load_parcel_scenes(&[manifest("a", 0, 0)]);
        let scene = registry.get("a").expect("loaded");
        scene.write().create_entity("e1").expect("create");
        scene.write().create_entity("e2").expect("create");

        assert!(registry.unload_scene("a"));
        assert!(!registry.contains("a"));
        assert_eq!(scene.read().entity_count(), 0);
        assert_eq!(registry.scene_at(ParcelCoord::new(0, 0)), None);
        assert!(!registry.unload_scene("a"));
        assert_eq!(registry.resources().lock().pending_count(), 2);
    }

    #[test]
    fn ui_scene_is_global() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        let ui = registry.create_ui_scene("ui", "https://ui/");
        let again = registry.create_ui_scene("ui", "https://other/");
        assert!(Arc::ptr_eq(&ui, &again));
        assert!(ui.read().is_global());
        assert!(ui.read().parcel_offsets().is_empty());
        assert_eq!(registry.scene_at(ParcelCoord::new(0, 0)), None);
    }

    #[test]
    fn floor_policy_applies_to_new_scenes() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        registry.set_debug(true);
        registry.load_parcel_scenes(&[manifest("debug", 0, 0)]);
        registry.set_debug(false);
        registry.set_floor_height(2.5);
        registry.load_parcel_scenes(&[manifest("external", 1, 0)]);

        let debug = registry.get("debug").expect("loaded");
        let external = registry.get("external").expect("loaded");
        assert_relative_eq!(debug.read().parcel_offsets()[0].y, DEBUG_FLOOR_HEIGHT);
        assert_relative_eq!(external.read().parcel_offsets()[0].y, 2.5);
    }

    #[test]
    fn notifications_cover_load_and_unload() {
        let mut registry = SceneRegistry::new(&BridgeConfig::default());
        registry.load_parcel_scenes(&[manifest("a", 0, 0)]);
        registry.unload_all_scenes();
        assert_eq!(
            registry.take_notifications(),
            vec![
                SceneEvent::SceneLoaded { scene_id: "a".into() },
                SceneEvent::SceneUnloaded { scene_id: "a".into() },
            ]
        );
    }
}
