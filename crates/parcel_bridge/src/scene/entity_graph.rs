//! Per-scene entity graph
//!
//! Arena of entities keyed by [`EntityKey`] with an id index. Parent links are
//! keys, so cycle checks are a walk up the key chain before anything is
//! committed. Every operation either applies fully or leaves the graph as it
//! was.

use super::components::{Component, ComponentKind, TransformComponent};
use super::entity::{Entity, EntityKey, Parent, ParentLink, ROOT_ENTITY_ID};
use super::error::SceneError;
use super::resources::ResourceHandle;
use crate::foundation::math::Vec3;
use slotmap::SlotMap;
use std::collections::HashMap;

/// Entity-component graph of one scene
#[derive(Debug, Default)]
pub struct EntityGraph {
    entities: SlotMap<EntityKey, Entity>,
    index: HashMap<String, EntityKey>,
    roots: Vec<EntityKey>,
}

impl EntityGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, id: &str) -> Result<EntityKey, SceneError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))
    }

    /// Create an entity under the root.
    ///
    /// Returns `Ok(false)` when the id already exists; the existing entity is
    /// left untouched.
    pub fn create_entity(&mut self, id: &str) -> Result<bool, SceneError> {
        if id.is_empty() || id == ROOT_ENTITY_ID {
            return Err(SceneError::InvalidEntityId(id.to_string()));
        }
        if self.index.contains_key(id) {
            return Ok(false);
        }
        let key = self.entities.insert(Entity::new(id));
        self.index.insert(id.to_string(), key);
        self.roots.push(key);
        Ok(true)
    }

    /// Remove an entity and all of its descendants.
    ///
    /// The removed entities are returned root first, depth first, so the
    /// caller can release their resources.
    pub fn remove_entity(&mut self, id: &str) -> Result<Vec<Entity>, SceneError> {
        let key = self.key(id)?;
        self.detach(key);

        let mut order = Vec::new();
        let mut stack = vec![key];
        while let Some(next) = stack.pop() {
            if let Some(entity) = self.entities.get(next) {
                stack.extend(entity.children.iter().rev().copied());
                order.push(next);
            }
        }

        let mut removed = Vec::with_capacity(order.len());
        for key in order {
            if let Some(entity) = self.entities.remove(key) {
                self.index.remove(entity.id());
                removed.push(entity);
            }
        }
        Ok(removed)
    }

    fn detach(&mut self, key: EntityKey) {
        let Some(parent) = self.entities.get(key).map(|e| e.parent) else {
            return;
        };
        match parent {
            ParentLink::Root => self.roots.retain(|k| *k != key),
            ParentLink::Entity(parent) => {
                if let Some(parent) = self.entities.get_mut(parent) {
                    parent.children.retain(|k| *k != key);
                }
            }
        }
    }

    fn is_self_or_ancestor(&self, candidate: EntityKey, mut node: EntityKey) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.entities.get(node).map(|e| e.parent) {
                Some(ParentLink::Entity(parent)) => node = parent,
                _ => return false,
            }
        }
    }

    /// Move an entity under `parent_id` (`"0"` for the root)
    pub fn set_entity_parent(&mut self, id: &str, parent_id: &str) -> Result<(), SceneError> {
        let key = self.key(id)?;
        let link = if parent_id == ROOT_ENTITY_ID {
            ParentLink::Root
        } else {
            let parent = self.key(parent_id)?;
            if self.is_self_or_ancestor(key, parent) {
                return Err(SceneError::ParentCycle {
                    entity: id.to_string(),
                    parent: parent_id.to_string(),
                });
            }
            ParentLink::Entity(parent)
        };

        if self.entities.get(key).map(|e| e.parent) == Some(link) {
            return Ok(());
        }
        self.detach(key);
        match link {
            ParentLink::Root => self.roots.push(key),
            ParentLink::Entity(parent) => {
                if let Some(parent) = self.entities.get_mut(parent) {
                    parent.children.push(key);
                }
            }
        }
        if let Some(entity) = self.entities.get_mut(key) {
            entity.parent = link;
        }
        Ok(())
    }

    /// Create or replace a component from its JSON payload
    pub fn update_component(
        &mut self,
        id: &str,
        kind: &ComponentKind,
        json: &str,
    ) -> Result<(), SceneError> {
        let key = self.key(id)?;
        let component = Component::parse(kind, json).map_err(|reason| SceneError::InvalidComponent {
            kind: kind.to_string(),
            target: id.to_string(),
            reason,
        })?;
        if let Some(entity) = self.entities.get_mut(key) {
            entity.set_component(component);
        }
        Ok(())
    }

    /// Reset a component to its kind's default
    pub fn component_removed(&mut self, id: &str, kind: &ComponentKind) -> Result<(), SceneError> {
        let key = self.key(id)?;
        if let Some(entity) = self.entities.get_mut(key) {
            entity.set_component(Component::default_for(kind));
        }
        Ok(())
    }

    /// Record the render resource backing an entity
    pub fn set_resource(&mut self, id: &str, handle: ResourceHandle) -> Result<(), SceneError> {
        let key = self.key(id)?;
        if let Some(entity) = self.entities.get_mut(key) {
            entity.set_resource(handle);
        }
        Ok(())
    }

    /// Remove everything, returning the dropped entities
    pub fn clear(&mut self) -> Vec<Entity> {
        self.index.clear();
        self.roots.clear();
        self.entities.drain().map(|(_, entity)| entity).collect()
    }

    /// Entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).and_then(|key| self.entities.get(*key))
    }

    /// Id is present
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// No entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every entity id, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Parent of an entity
    pub fn parent_of(&self, id: &str) -> Option<Parent> {
        let entity = self.entity(id)?;
        match entity.parent {
            ParentLink::Root => Some(Parent::Root),
            ParentLink::Entity(key) => self
                .entities
                .get(key)
                .map(|parent| Parent::Entity(parent.id().to_string())),
        }
    }

    /// Child ids of an entity, in attach order
    pub fn children_of(&self, id: &str) -> Option<Vec<&str>> {
        let entity = self.entity(id)?;
        Some(
            entity
                .children
                .iter()
                .filter_map(|key| self.entities.get(*key))
                .map(Entity::id)
                .collect(),
        )
    }

    /// Ids directly under the root, in attach order
    pub fn root_ids(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter_map(|key| self.entities.get(*key))
            .map(Entity::id)
            .collect()
    }

    /// Component of an entity
    pub fn component(&self, id: &str, kind: &ComponentKind) -> Option<&Component> {
        self.entity(id)?.component(kind)
    }

    /// Local transform of an entity (identity when unset)
    pub fn transform(&self, id: &str) -> Option<TransformComponent> {
        self.entity(id).map(Entity::transform)
    }

    /// Transform relative to the scene root
    pub fn world_transform(&self, id: &str) -> Option<TransformComponent> {
        let mut chain = Vec::new();
        let mut link = ParentLink::Entity(*self.index.get(id)?);
        while let ParentLink::Entity(key) = link {
            let entity = self.entities.get(key)?;
            chain.push(entity.transform());
            link = entity.parent;
        }
        Some(
            chain
                .iter()
                .rev()
                .fold(TransformComponent::identity(), |acc, local| acc.combine(local)),
        )
    }

    /// Position relative to the scene root
    pub fn world_position(&self, id: &str) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.position)
    }
}
