//! Scene entities
//!
//! Entities live in the graph's arena; parent and child links are arena keys,
//! never owning references.

use super::components::{Component, ComponentKind, TransformComponent};
use super::resources::ResourceHandle;
use std::collections::BTreeMap;

slotmap::new_key_type! {
    /// Arena key of an entity inside one graph
    pub struct EntityKey;
}

/// Parent id that stands for the scene root
pub const ROOT_ENTITY_ID: &str = "0";

/// Link to an entity's parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentLink {
    Root,
    Entity(EntityKey),
}

/// Parent of an entity, by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// Directly under the scene root
    Root,
    /// Under another entity
    Entity(String),
}

/// One entity of a scene
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    pub(crate) parent: ParentLink,
    pub(crate) children: Vec<EntityKey>,
    components: BTreeMap<ComponentKind, Component>,
    resource: Option<ResourceHandle>,
}

impl Entity {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            parent: ParentLink::Root,
            children: Vec::new(),
            components: BTreeMap::new(),
            resource: None,
        }
    }

    /// Id the entity was created with
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Component of a kind, if set
    pub fn component(&self, kind: &ComponentKind) -> Option<&Component> {
        self.components.get(kind)
    }

    /// All components, ordered by kind
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Number of distinct component kinds
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Transform, or identity when none was set
    pub fn transform(&self) -> TransformComponent {
        match self.components.get(&ComponentKind::Transform) {
            Some(Component::Transform(t)) => t.clone(),
            _ => TransformComponent::default(),
        }
    }

    /// Backing render resource
    pub const fn resource(&self) -> Option<ResourceHandle> {
        self.resource
    }

    pub(crate) fn set_component(&mut self, component: Component) {
        self.components.insert(component.kind(), component);
    }

    pub(crate) fn set_resource(&mut self, handle: ResourceHandle) {
        self.resource = Some(handle);
    }
}
