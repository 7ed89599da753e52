//! Shared (disposable) components
//!
//! Components created once per scene and attached to any number of
//! entities: materials, textures, models, audio clips. Classes that load
//! asynchronously stay pending until the renderer reports them loaded; the
//! pending count is what drives the scene's readiness.

use super::components::ShapeKind;
use super::error::SceneError;
use std::collections::{BTreeMap, BTreeSet};

/// Class id of a texture
pub const TEXTURE_CLASS_ID: u32 = 68;

/// Class id of an audio clip
pub const AUDIO_CLIP_CLASS_ID: u32 = 200;

/// True for classes whose loading completes asynchronously
pub const fn loads_async(class_id: u32) -> bool {
    class_id == ShapeKind::Gltf.class_id()
        || class_id == ShapeKind::Obj.class_id()
        || class_id == TEXTURE_CLASS_ID
        || class_id == AUDIO_CLIP_CLASS_ID
}

/// One shared component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposable {
    /// Component id
    pub id: String,
    /// Class id
    pub class_id: u32,
    /// Component name
    pub name: String,
    /// Latest payload, if any
    pub json: Option<String>,
    /// Finished loading
    pub ready: bool,
    /// Entities this component is attached to
    pub attached: BTreeSet<String>,
}

/// Result of a completion report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A pending component became ready
    Completed,
    /// Component unknown or already ready
    Ignored,
}

/// Shared components of one scene
#[derive(Debug, Default)]
pub struct DisposableTable {
    items: BTreeMap<String, Disposable>,
}

impl DisposableTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a component; `Ok(false)` when the id already exists
    pub fn create(&mut self, id: &str, class_id: u32, name: &str) -> Result<bool, SceneError> {
        if id.is_empty() {
            return Err(SceneError::InvalidRequest("empty component id".into()));
        }
        if self.items.contains_key(id) {
            return Ok(false);
        }
        self.items.insert(
            id.to_string(),
            Disposable {
                id: id.to_string(),
                class_id,
                name: name.to_string(),
                json: None,
                ready: !loads_async(class_id),
                attached: BTreeSet::new(),
            },
        );
        Ok(true)
    }

    /// Replace a component's payload
    pub fn update(&mut self, id: &str, json: &str) -> Result<(), SceneError> {
        let item = self.get_mut(id)?;
        item.json = Some(json.to_string());
        Ok(())
    }

    /// Attach a component to an entity
    pub fn attach(&mut self, id: &str, entity_id: &str) -> Result<(), SceneError> {
        self.get_mut(id)?.attached.insert(entity_id.to_string());
        Ok(())
    }

    /// Forget an entity in every attachment list
    pub fn detach_entity(&mut self, entity_id: &str) {
        for item in self.items.values_mut() {
            item.attached.remove(entity_id);
        }
    }

    /// Dispose a component, returning it
    pub fn dispose(&mut self, id: &str) -> Result<Disposable, SceneError> {
        self.items
            .remove(id)
            .ok_or_else(|| SceneError::UnknownComponent(id.to_string()))
    }

    /// Mark a pending component as loaded
    pub fn complete(&mut self, id: &str) -> Completion {
        match self.items.get_mut(id) {
            Some(item) if !item.ready => {
                item.ready = true;
                Completion::Completed
            }
            _ => Completion::Ignored,
        }
    }

    /// Component by id
    pub fn get(&self, id: &str) -> Option<&Disposable> {
        self.items.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Disposable, SceneError> {
        self.items
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownComponent(id.to_string()))
    }

    /// Components still loading
    pub fn pending_count(&self) -> usize {
        self.items.values().filter(|item| !item.ready).count()
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No components
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
