//! Renderer-side mirror
//!
//! Model of the single-threaded renderer consumer: decodes transport
//! payloads and applies each scene's records in receipt order to its own copy
//! of the entity graph. Scenes must be opened before their records are
//! accepted; records for unknown or closed scenes are discarded.

use crate::host::RendererEvent;
use crate::protocol::{decode_payload, RaycastQuery, SceneAction, SceneRecord, Transport};
use crate::scene::{loads_async, ComponentKind, DisposableTable, EntityGraph, SceneError};
use std::collections::HashMap;

/// Counters over everything received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Records applied
    pub applied: usize,
    /// Records refused by the scene graph
    pub rejected: usize,
    /// Records for scenes that are not open
    pub discarded: usize,
    /// Lines that failed to decode
    pub corrupt: usize,
}

/// Renderer copy of one scene
#[derive(Debug, Default)]
pub struct MirroredScene {
    graph: EntityGraph,
    components: DisposableTable,
    started: bool,
    queries: Vec<RaycastQuery>,
    opened_urls: Vec<String>,
    loading: Vec<String>,
}

impl MirroredScene {
    /// Entity graph as rebuilt from records
    pub const fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Shared components as rebuilt from records
    pub const fn components(&self) -> &DisposableTable {
        &self.components
    }

    /// `SceneStarted` was received
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Ray casts requested so far
    pub fn queries(&self) -> &[RaycastQuery] {
        &self.queries
    }

    /// Links the scene asked to open
    pub fn opened_urls(&self) -> &[String] {
        &self.opened_urls
    }

    fn apply(&mut self, action: SceneAction) -> Result<(), SceneError> {
        match action {
            SceneAction::CreateEntity { entity_id } => {
                self.graph.create_entity(&entity_id)?;
            }
            SceneAction::RemoveEntity { entity_id } => {
                for entity in self.graph.remove_entity(&entity_id)? {
                    self.components.detach_entity(entity.id());
                }
            }
            SceneAction::UpdateEntityComponent {
                entity_id,
                class_id,
                name,
                json,
            } => {
                let kind = ComponentKind::from_wire(class_id, &name);
                self.graph.update_component(&entity_id, &kind, &json)?;
            }
            SceneAction::AttachEntityComponent {
                entity_id,
                component_id,
                ..
            } => {
                if !self.graph.contains(&entity_id) {
                    return Err(SceneError::UnknownEntity(entity_id));
                }
                self.components.attach(&component_id, &entity_id)?;
            }
            SceneAction::ComponentRemoved { entity_id, name } => {
                self.graph
                    .component_removed(&entity_id, &ComponentKind::from_name(&name))?;
            }
            SceneAction::SetEntityParent {
                entity_id,
                parent_id,
            } => {
                self.graph.set_entity_parent(&entity_id, &parent_id)?;
            }
            SceneAction::Query(query) => self.queries.push(query),
            SceneAction::ComponentCreated {
                component_id,
                class_id,
                name,
            } => {
                if self.components.create(&component_id, class_id, &name)? && loads_async(class_id) {
                    self.loading.push(component_id);
                }
            }
            SceneAction::ComponentDisposed { component_id } => {
                self.components.dispose(&component_id)?;
                self.loading.retain(|id| *id != component_id);
            }
            SceneAction::ComponentUpdated { component_id, json } => {
                self.components.update(&component_id, &json)?;
            }
            SceneAction::SceneStarted => self.started = true,
            SceneAction::OpenExternalUrl { url } => self.opened_urls.push(url),
        }
        Ok(())
    }
}

/// Renderer mirror over every open scene
#[derive(Debug, Default)]
pub struct RendererMirror {
    scenes: HashMap<String, MirroredScene>,
    stats: MirrorStats,
}

impl RendererMirror {
    /// Mirror with no open scenes
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting records for a scene
    pub fn open_scene(&mut self, scene_id: &str) {
        self.scenes.entry(scene_id.to_string()).or_default();
    }

    /// Drop a scene; later records for it are discarded
    pub fn close_scene(&mut self, scene_id: &str) -> bool {
        self.scenes.remove(scene_id).is_some()
    }

    /// Scene copy by id
    pub fn scene(&self, scene_id: &str) -> Option<&MirroredScene> {
        self.scenes.get(scene_id)
    }

    /// Counters so far
    pub const fn stats(&self) -> MirrorStats {
        self.stats
    }

    /// Apply one payload: every line in order, corrupt lines skipped
    pub fn receive(&mut self, payload: &[u8]) -> usize {
        let Ok(text) = std::str::from_utf8(payload) else {
            log::warn!("dropping payload that is not UTF-8 ({} bytes)", payload.len());
            self.stats.corrupt += 1;
            return 0;
        };
        let mut applied = 0;
        for decoded in decode_payload(text) {
            match decoded {
                Ok(record) => {
                    if self.apply(record) {
                        applied += 1;
                    }
                }
                Err(err) => {
                    log::warn!("dropping corrupt record: {err}");
                    self.stats.corrupt += 1;
                }
            }
        }
        applied
    }

    /// Drain a transport, applying every payload; returns records applied
    pub fn pump(&mut self, transport: &dyn Transport) -> usize {
        let mut applied = 0;
        while let Some(payload) = transport.try_recv() {
            applied += self.receive(&payload);
        }
        applied
    }

    /// Apply one decoded record
    pub fn apply(&mut self, record: SceneRecord) -> bool {
        let SceneRecord { scene_id, action } = record;
        let Some(scene) = self.scenes.get_mut(&scene_id) else {
            log::debug!("[{scene_id}] discarding {} for a scene that is not open", action.kind());
            self.stats.discarded += 1;
            return false;
        };
        let kind = action.kind();
        match scene.apply(action) {
            Ok(()) => {
                self.stats.applied += 1;
                true
            }
            Err(err) => {
                log::warn!("[{scene_id}] {kind} refused: {err}");
                self.stats.rejected += 1;
                false
            }
        }
    }

    /// Finish every asynchronous load, returning the events to report back
    pub fn complete_loads(&mut self) -> Vec<RendererEvent> {
        let mut ids: Vec<&String> = self.scenes.keys().collect();
        ids.sort_unstable();
        let mut events = Vec::new();
        for id in ids {
            if let Some(scene) = self.scenes.get(id.as_str()) {
                events.extend(scene.loading.iter().map(|component_id| RendererEvent::DisposableLoaded {
                    scene_id: id.clone(),
                    component_id: component_id.clone(),
                }));
            }
        }
        for scene in self.scenes.values_mut() {
            for component_id in std::mem::take(&mut scene.loading) {
                scene.components.complete(&component_id);
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireBatch;
    use crate::scene::{Parent, TEXTURE_CLASS_ID};

    fn payload(scene_id: &str, actions: &[SceneAction]) -> Vec<u8> {
        let mut batch = WireBatch::new(scene_id);
        for action in actions {
            batch.push(action).expect("encode");
        }
        batch.into_bytes()
    }

    fn create(id: &str) -> SceneAction {
        SceneAction::CreateEntity { entity_id: id.into() }
    }

    #[test]
    fn applies_records_in_order() {
        let mut mirror = RendererMirror::new();
        mirror.open_scene("s");
        let applied = mirror.receive(&payload(
            "s",
            &[
                create("a"),
                create("b"),
                SceneAction::SetEntityParent {
                    entity_id: "b".into(),
                    parent_id: "a".into(),
                },
                SceneAction::SceneStarted,
            ],
        ));
        assert_eq!(applied, 4);
        let scene = mirror.scene("s").expect("open");
        assert!(scene.is_started());
        assert_eq!(scene.graph().parent_of("b"), Some(Parent::Entity("a".into())));
    }

    #[test]
    fn unknown_scene_records_are_discarded() {
        let mut mirror = RendererMirror::new();
        assert_eq!(mirror.receive(&payload("gone", &[create("a")])), 0);
        assert_eq!(mirror.stats().discarded, 1);

        mirror.open_scene("s");
        mirror.close_scene("s");
        mirror.receive(&payload("s", &[create("a")]));
        assert_eq!(mirror.stats().discarded, 2);
    }

    #[test]
    fn corrupt_line_is_skipped() {
        let mut mirror = RendererMirror::new();
        mirror.open_scene("s");
        let first = String::from_utf8(payload("s", &[create("a")])).expect("utf8");
        let last = String::from_utf8(payload("s", &[create("c")])).expect("utf8");
        let text = format!("{first}AAAA\n{last}");
        assert_eq!(mirror.receive(text.as_bytes()), 2);
        assert_eq!(mirror.stats().corrupt, 1);
        assert_eq!(mirror.scene("s").map(|s| s.graph().ids()), Some(vec!["a", "c"]));
    }

    #[test]
    fn async_components_complete_on_request() {
        let mut mirror = RendererMirror::new();
        mirror.open_scene("s");
        mirror.receive(&payload(
            "s",
            &[SceneAction::ComponentCreated {
                component_id: "tex".into(),
                class_id: TEXTURE_CLASS_ID,
                name: "texture".into(),
            }],
        ));
        assert_eq!(
            mirror.complete_loads(),
            vec![RendererEvent::DisposableLoaded {
                scene_id: "s".into(),
                component_id: "tex".into(),
            }]
        );
        assert!(mirror.complete_loads().is_empty());
        assert_eq!(mirror.scene("s").map(|s| s.components().pending_count()), Some(0));
    }
}
