//! Parcel scenes
//!
//! A [`ParcelScene`] is the host-side half of one sandboxed scene script. Every
//! intake operation is checked against the record encoder and the scene's
//! [`EntityGraph`] first and only then queued for the renderer, so the
//! outbound queue never carries an action the graph rejected and the graph
//! never holds a change the wire cannot carry.

use super::components::ComponentKind;
use super::disposable::{Completion, DisposableTable};
use super::entity_graph::EntityGraph;
use super::error::SceneError;
use super::lifecycle::{LifecycleState, SceneLifecycle};
use super::manifest::SceneManifest;
use super::resources::SharedResourcePool;
use crate::events::SceneEvent;
use crate::foundation::math::Vec3;
use crate::parcel::GridPositioner;
use crate::protocol::{validate_record, ActionSender, QueueError, RaycastQuery, SceneAction};

/// Where a scene is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenePhase {
    /// Constructed, not yet positioned
    Created,
    /// Positioned and registered
    Active,
    /// Torn down; intake is refused
    Unloaded,
}

/// One scene and everything it owns
#[derive(Debug)]
pub struct ParcelScene {
    id: String,
    manifest: SceneManifest,
    is_global: bool,
    phase: ScenePhase,
    origin: Vec3,
    parcel_offsets: Vec<Vec3>,
    graph: EntityGraph,
    disposables: DisposableTable,
    lifecycle: Option<SceneLifecycle>,
    outbound: ActionSender,
    resources: SharedResourcePool,
    notifications: Vec<SceneEvent>,
}

impl ParcelScene {
    pub(crate) fn new(
        manifest: SceneManifest,
        is_global: bool,
        outbound: ActionSender,
        resources: SharedResourcePool,
    ) -> Self {
        Self {
            id: manifest.scene_id(),
            manifest,
            is_global,
            phase: ScenePhase::Created,
            origin: Vec3::zeros(),
            parcel_offsets: Vec::new(),
            graph: EntityGraph::new(),
            disposables: DisposableTable::new(),
            lifecycle: None,
            outbound,
            resources,
            notifications: Vec::new(),
        }
    }

    /// Compute world placement and activate
    pub(crate) fn position(&mut self, positioner: &GridPositioner) {
        if self.is_global {
            self.origin = Vec3::zeros();
            self.parcel_offsets.clear();
        } else {
            let base = self.manifest.base_position;
            self.origin = positioner.scene_origin(base);
            self.parcel_offsets = positioner.layout(base, &self.manifest.parcels);
        }
        if self.phase == ScenePhase::Created {
            self.phase = ScenePhase::Active;
        }
    }

    /// Swap in new descriptor data and reposition, keeping the graph
    pub(crate) fn replace_manifest(&mut self, manifest: SceneManifest, positioner: &GridPositioner) {
        self.manifest = manifest;
        self.position(positioner);
    }

    /// Scene id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current descriptor
    pub const fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    /// UI scene, not bound to parcels
    pub const fn is_global(&self) -> bool {
        self.is_global
    }

    /// Current phase
    pub const fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// World-space origin of the base parcel
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Offsets of each parcel relative to the base parcel, manifest order
    pub fn parcel_offsets(&self) -> &[Vec3] {
        &self.parcel_offsets
    }

    /// Entity graph
    pub const fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.graph.len()
    }

    /// Shared components
    pub const fn disposables(&self) -> &DisposableTable {
        &self.disposables
    }

    /// Readiness, once the scene has started
    pub fn readiness(&self) -> Option<LifecycleState> {
        self.lifecycle.as_ref().map(SceneLifecycle::state)
    }

    /// Shared components still loading
    pub fn pending_components(&self) -> usize {
        self.disposables.pending_count()
    }

    /// Actions queued and not yet flushed
    pub fn queued_actions(&self) -> usize {
        self.outbound.depth()
    }

    /// Create an entity under the scene root
    pub fn create_entity(&mut self, id: &str) -> Result<(), SceneError> {
        let action = SceneAction::CreateEntity {
            entity_id: id.to_string(),
        };
        self.intake(action, |scene| {
            if !scene.graph.create_entity(id)? {
                log::debug!("[{}] entity '{id}' already exists", scene.id);
                return Ok(false);
            }
            let handle = scene.resources.lock().allocate(&scene.id, id);
            scene.graph.set_resource(id, handle)?;
            Ok(true)
        })
    }

    /// Remove an entity and its descendants, releasing their resources
    pub fn remove_entity(&mut self, id: &str) -> Result<(), SceneError> {
        let action = SceneAction::RemoveEntity {
            entity_id: id.to_string(),
        };
        self.intake(action, |scene| {
            let removed = scene.graph.remove_entity(id)?;
            let mut pool = scene.resources.lock();
            for entity in &removed {
                if let Some(handle) = entity.resource() {
                    pool.release(handle);
                }
                scene.disposables.detach_entity(entity.id());
            }
            if removed.len() > 1 {
                log::debug!(
                    "[{}] removing '{id}' took {} descendants with it",
                    scene.id,
                    removed.len() - 1
                );
            }
            Ok(true)
        })
    }

    /// Reparent an entity (`"0"` is the scene root)
    pub fn set_entity_parent(&mut self, id: &str, parent_id: &str) -> Result<(), SceneError> {
        let action = SceneAction::SetEntityParent {
            entity_id: id.to_string(),
            parent_id: parent_id.to_string(),
        };
        self.intake(action, |scene| {
            scene.graph.set_entity_parent(id, parent_id)?;
            Ok(true)
        })
    }

    /// Create or replace a component by name
    pub fn update_entity_component(&mut self, id: &str, name: &str, json: &str) -> Result<(), SceneError> {
        let kind = ComponentKind::from_name(name);
        let action = SceneAction::UpdateEntityComponent {
            entity_id: id.to_string(),
            class_id: kind.class_id(),
            name: kind.name().to_string(),
            json: json.to_string(),
        };
        self.intake(action, |scene| {
            scene.graph.update_component(id, &kind, json)?;
            Ok(true)
        })
    }

    /// Reset a component to its default
    pub fn component_removed(&mut self, id: &str, name: &str) -> Result<(), SceneError> {
        let kind = ComponentKind::from_name(name);
        let action = SceneAction::ComponentRemoved {
            entity_id: id.to_string(),
            name: kind.name().to_string(),
        };
        self.intake(action, |scene| {
            scene.graph.component_removed(id, &kind)?;
            Ok(true)
        })
    }

    /// Bind a shared component to an entity slot
    pub fn attach_entity_component(
        &mut self,
        entity_id: &str,
        name: &str,
        component_id: &str,
    ) -> Result<(), SceneError> {
        let action = SceneAction::AttachEntityComponent {
            entity_id: entity_id.to_string(),
            name: name.to_string(),
            component_id: component_id.to_string(),
        };
        self.intake(action, |scene| {
            if !scene.graph.contains(entity_id) {
                return Err(SceneError::UnknownEntity(entity_id.to_string()));
            }
            scene.disposables.attach(component_id, entity_id)?;
            Ok(true)
        })
    }

    /// Create a shared component
    pub fn component_created(&mut self, component_id: &str, class_id: u32, name: &str) -> Result<(), SceneError> {
        let action = SceneAction::ComponentCreated {
            component_id: component_id.to_string(),
            class_id,
            name: name.to_string(),
        };
        self.intake(action, |scene| {
            if !scene.disposables.create(component_id, class_id, name)? {
                log::debug!("[{}] component '{component_id}' already exists", scene.id);
                return Ok(false);
            }
            Ok(true)
        })
    }

    /// Replace a shared component's payload
    pub fn component_updated(&mut self, component_id: &str, json: &str) -> Result<(), SceneError> {
        let action = SceneAction::ComponentUpdated {
            component_id: component_id.to_string(),
            json: json.to_string(),
        };
        self.intake(action, |scene| {
            scene.disposables.update(component_id, json)?;
            Ok(true)
        })
    }

    /// Dispose a shared component; a pending one counts as completed
    pub fn component_disposed(&mut self, component_id: &str) -> Result<(), SceneError> {
        let action = SceneAction::ComponentDisposed {
            component_id: component_id.to_string(),
        };
        self.intake(action, |scene| {
            let disposed = scene.disposables.dispose(component_id)?;
            if !disposed.ready {
                scene.refresh_lifecycle();
            }
            Ok(true)
        })
    }

    /// Request a ray cast; an empty id or an invalid ray is refused
    pub fn query(&mut self, query: RaycastQuery) -> Result<(), SceneError> {
        self.intake(SceneAction::Query(query), |_| Ok(true))
    }

    /// Ask the client to open a link
    pub fn open_external_url(&mut self, url: &str) -> Result<(), SceneError> {
        let action = SceneAction::OpenExternalUrl { url: url.to_string() };
        self.intake(action, |_| Ok(true))
    }

    /// Mark the end of the initial message burst and start tracking readiness
    pub fn start(&mut self) -> Result<(), SceneError> {
        self.intake(SceneAction::SceneStarted, |scene| {
            if scene.lifecycle.is_some() {
                log::debug!("[{}] already started", scene.id);
                return Ok(false);
            }
            let lifecycle = SceneLifecycle::new(scene.disposables.pending_count());
            log::debug!(
                "[{}] started, {} components pending",
                scene.id,
                lifecycle.pending()
            );
            let (pending, state) = (lifecycle.pending(), lifecycle.state());
            scene.lifecycle = Some(lifecycle);
            scene.notify_refresh(pending, state, state == LifecycleState::Ready);
            Ok(true)
        })
    }

    /// Renderer finished loading a shared component
    pub fn disposable_loaded(&mut self, component_id: &str) -> Completion {
        let completion = self.disposables.complete(component_id);
        match completion {
            Completion::Completed => self.refresh_lifecycle(),
            Completion::Ignored => {
                log::debug!("[{}] ignoring load report for '{component_id}'", self.id);
            }
        }
        completion
    }

    /// Release everything and refuse further intake; returns entities dropped
    pub(crate) fn unload(&mut self) -> usize {
        if self.phase == ScenePhase::Unloaded {
            return 0;
        }
        self.phase = ScenePhase::Unloaded;
        let removed = self.graph.clear();
        let mut pool = self.resources.lock();
        for handle in removed.iter().filter_map(|e| e.resource()) {
            pool.release(handle);
        }
        self.disposables.clear();
        removed.len()
    }

    pub(crate) fn take_notifications(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.notifications)
    }

    fn refresh_lifecycle(&mut self) {
        let pending = self.disposables.pending_count();
        let Some(lifecycle) = self.lifecycle.as_mut() else {
            return;
        };
        let refresh = lifecycle.refresh(pending);
        if refresh.became_ready {
            log::info!("[{}] ready", self.id);
        }
        self.notify_refresh(refresh.pending, refresh.state, refresh.became_ready);
    }

    fn notify_refresh(&mut self, pending: usize, state: LifecycleState, became_ready: bool) {
        self.notifications.push(SceneEvent::StateRefreshed {
            scene_id: self.id.clone(),
            pending,
            state,
        });
        if became_ready {
            self.notifications.push(SceneEvent::SceneReady {
                scene_id: self.id.clone(),
            });
        }
    }

    fn intake<F>(&mut self, action: SceneAction, op: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut Self) -> Result<bool, SceneError>,
    {
        let result = self.try_intake(action, op);
        if let Err(err) = &result {
            log::warn!("[{}] {err}", self.id);
        }
        result
    }

    /// Refuses before touching the graph when the queue is full or the action
    /// would not encode; `op` returns whether the action goes on the wire.
    fn try_intake<F>(&mut self, action: SceneAction, op: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut Self) -> Result<bool, SceneError>,
    {
        if self.phase == ScenePhase::Unloaded {
            return Err(SceneError::SceneUnloaded(self.id.clone()));
        }
        self.outbound.reserve()?;
        validate_record(&self.id, &action)?;
        if !op(self)? {
            return Ok(());
        }
        let kind = action.kind();
        match self.outbound.try_send(action) {
            Ok(()) => Ok(()),
            Err(QueueError::Disconnected) => {
                log::debug!("[{}] outbound queue closed, dropping {kind}", self.id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
