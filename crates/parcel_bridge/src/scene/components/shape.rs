//! Shape components
//!
//! Primitive shapes carry only visibility and collision flags; model shapes
//! (glTF, OBJ) also name the source file inside the scene's content mapping.

use serde::{Deserialize, Serialize};

/// Built-in shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Unit cube
    Box,
    /// Unit sphere
    Sphere,
    /// Unit plane
    Plane,
    /// Cone
    Cone,
    /// Cylinder
    Cylinder,
    /// glTF model loaded from the scene's contents
    Gltf,
    /// OBJ model loaded from the scene's contents
    Obj,
}

impl ShapeKind {
    /// Every shape kind, in class id order
    pub const ALL: [Self; 7] = [
        Self::Box,
        Self::Sphere,
        Self::Plane,
        Self::Cone,
        Self::Cylinder,
        Self::Gltf,
        Self::Obj,
    ];

    /// Wire class id
    pub const fn class_id(self) -> u32 {
        match self {
            Self::Box => 16,
            Self::Sphere => 17,
            Self::Plane => 18,
            Self::Cone => 19,
            Self::Cylinder => 20,
            Self::Gltf => 54,
            Self::Obj => 55,
        }
    }

    /// Component name used by scene scripts
    pub const fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Plane => "plane",
            Self::Cone => "cone",
            Self::Cylinder => "cylinder",
            Self::Gltf => "gltf",
            Self::Obj => "obj",
        }
    }

    /// Models load asynchronously and need a source file
    pub const fn is_model(self) -> bool {
        matches!(self, Self::Gltf | Self::Obj)
    }
}

/// Shape component data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeComponent {
    /// Which shape
    pub kind: ShapeKind,
    /// Rendered when true
    pub visible: bool,
    /// Takes part in collisions when true
    pub with_collisions: bool,
    /// Model file for glTF/OBJ shapes
    pub src: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShapeJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    with_collisions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
}

impl ShapeComponent {
    /// Default shape of a kind: visible, no collisions, no source
    pub const fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            visible: true,
            with_collisions: false,
            src: None,
        }
    }

    /// Parse the JSON payload for a shape of `kind`
    pub fn from_json(kind: ShapeKind, json: &str) -> Result<Self, String> {
        let raw: ShapeJson = if json.trim().is_empty() {
            ShapeJson::default()
        } else {
            serde_json::from_str(json).map_err(|e| e.to_string())?
        };
        let src = raw.src.filter(|s| !s.is_empty());
        if kind.is_model() && src.is_none() {
            return Err(format!("{} shape requires a src", kind.name()));
        }
        Ok(Self {
            kind,
            visible: raw.visible.unwrap_or(true),
            with_collisions: raw.with_collisions.unwrap_or(false),
            src,
        })
    }

    /// Serialize to the JSON shape accepted by [`Self::from_json`]
    pub fn to_json(&self) -> String {
        let raw = ShapeJson {
            visible: Some(self.visible),
            with_collisions: Some(self.with_collisions),
            src: self.src.clone(),
        };
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_defaults() {
        let shape = ShapeComponent::from_json(ShapeKind::Box, "{}").expect("box");
        assert_eq!(shape, ShapeComponent::new(ShapeKind::Box));
    }

    #[test]
    fn model_requires_source() {
        assert!(ShapeComponent::from_json(ShapeKind::Gltf, "{}").is_err());
        let shape =
            ShapeComponent::from_json(ShapeKind::Gltf, r#"{"src":"models/tree.glb","withCollisions":true}"#)
                .expect("gltf");
        assert_eq!(shape.src.as_deref(), Some("models/tree.glb"));
        assert!(shape.with_collisions);
    }

    #[test]
    fn class_ids_are_distinct() {
        let mut ids: Vec<u32> = ShapeKind::ALL.iter().map(|k| k.class_id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), ShapeKind::ALL.len());
    }
}
