//! Entity components
//!
//! Scene scripts address components by name (or class id on the wire). The
//! names are resolved once, through [`ComponentKind::from_name`] and
//! [`ComponentKind::from_wire`], into a closed set of known kinds plus a
//! generic fallback that keeps the raw payload for the renderer.

mod shape;
mod transform;

pub use shape::{ShapeComponent, ShapeKind};
pub use transform::TransformComponent;

use std::fmt;

/// Class id of the transform component
pub const TRANSFORM_CLASS_ID: u32 = 1;

/// Class id sent for components outside the known table
pub const GENERIC_CLASS_ID: u32 = 0;

/// Component kind, unique per entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// Position, rotation and scale
    Transform,
    /// One of the built-in shapes
    Shape(ShapeKind),
    /// Anything else, passed through by name
    Generic(String),
}

impl ComponentKind {
    /// Resolve a component name
    pub fn from_name(name: &str) -> Self {
        if name == "transform" {
            return Self::Transform;
        }
        ShapeKind::ALL
            .iter()
            .find(|k| k.name() == name)
            .map_or_else(|| Self::Generic(name.to_string()), |k| Self::Shape(*k))
    }

    /// Resolve a wire class id, falling back to the name for unknown ids
    pub fn from_wire(class_id: u32, name: &str) -> Self {
        if class_id == TRANSFORM_CLASS_ID {
            return Self::Transform;
        }
        ShapeKind::ALL
            .iter()
            .find(|k| k.class_id() == class_id)
            .map_or_else(|| Self::from_name(name), |k| Self::Shape(*k))
    }

    /// Wire class id
    pub const fn class_id(&self) -> u32 {
        match self {
            Self::Transform => TRANSFORM_CLASS_ID,
            Self::Shape(kind) => kind.class_id(),
            Self::Generic(_) => GENERIC_CLASS_ID,
        }
    }

    /// Component name
    pub fn name(&self) -> &str {
        match self {
            Self::Transform => "transform",
            Self::Shape(kind) => kind.name(),
            Self::Generic(name) => name,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Component data attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Transform data
    Transform(TransformComponent),
    /// Shape data
    Shape(ShapeComponent),
    /// Unknown kind, raw payload kept verbatim
    Generic {
        /// Component name
        name: String,
        /// Payload as sent by the scene
        payload: String,
    },
}

impl Component {
    /// Parse `json` according to `kind`'s schema
    pub fn parse(kind: &ComponentKind, json: &str) -> Result<Self, String> {
        match kind {
            ComponentKind::Transform => TransformComponent::from_json(json).map(Self::Transform),
            ComponentKind::Shape(shape) => ShapeComponent::from_json(*shape, json).map(Self::Shape),
            ComponentKind::Generic(name) => Ok(Self::Generic {
                name: name.clone(),
                payload: json.to_string(),
            }),
        }
    }

    /// The value a component of `kind` reverts to when removed
    pub fn default_for(kind: &ComponentKind) -> Self {
        match kind {
            ComponentKind::Transform => Self::Transform(TransformComponent::default()),
            ComponentKind::Shape(shape) => Self::Shape(ShapeComponent::new(*shape)),
            ComponentKind::Generic(name) => Self::Generic {
                name: name.clone(),
                payload: String::new(),
            },
        }
    }

    /// Kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Shape(shape) => ComponentKind::Shape(shape.kind),
            Self::Generic { name, .. } => ComponentKind::Generic(name.clone()),
        }
    }

    /// Serialize the component payload
    pub fn to_json(&self) -> String {
        match self {
            Self::Transform(t) => t.to_json(),
            Self::Shape(s) => s.to_json(),
            Self::Generic { payload, .. } => payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table() {
        assert_eq!(ComponentKind::from_name("transform"), ComponentKind::Transform);
        assert_eq!(ComponentKind::from_name("sphere"), ComponentKind::Shape(ShapeKind::Sphere));
        assert_eq!(
            ComponentKind::from_name("billboard"),
            ComponentKind::Generic("billboard".to_string())
        );
    }

    #[test]
    fn wire_table_prefers_class_id() {
        assert_eq!(ComponentKind::from_wire(1, "whatever"), ComponentKind::Transform);
        assert_eq!(ComponentKind::from_wire(20, ""), ComponentKind::Shape(ShapeKind::Cylinder));
        assert_eq!(ComponentKind::from_wire(0, "box"), ComponentKind::Shape(ShapeKind::Box));
        assert_eq!(ComponentKind::from_wire(0, "text").class_id(), GENERIC_CLASS_ID);
    }

    #[test]
    fn generic_payload_is_passed_through() {
        let kind = ComponentKind::from_name("text");
        let component = Component::parse(&kind, r#"{"value":"hi"}"#).expect("generic");
        assert_eq!(component.to_json(), r#"{"value":"hi"}"#);
        assert_eq!(component.kind(), kind);
    }
}
