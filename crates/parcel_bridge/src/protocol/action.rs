//! Typed scene actions
//!
//! One [`SceneAction`] per graph mutation (or side request) a scene makes.
//! Actions are what flows through a scene's outbound queue; the codec turns
//! them into wire records.

use crate::foundation::math::{is_finite_vec3, Vec3};
use std::fmt;

/// Ray cast kinds a scene may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// First entity hit
    HitFirst,
    /// Every entity hit
    HitAll,
    /// First avatar hit
    HitFirstAvatar,
    /// Every avatar hit
    HitAllAvatars,
}

impl QueryType {
    /// Wire code
    pub const fn code(self) -> u8 {
        match self {
            Self::HitFirst => 0,
            Self::HitAll => 1,
            Self::HitFirstAvatar => 2,
            Self::HitAllAvatars => 3,
        }
    }

    /// Decode a wire code
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::HitFirst),
            1 => Some(Self::HitAll),
            2 => Some(Self::HitFirstAvatar),
            3 => Some(Self::HitAllAvatars),
            _ => None,
        }
    }
}

/// Ray in scene space
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction, not necessarily normalized
    pub direction: Vec3,
    /// Maximum distance along the ray
    pub distance: f32,
}

impl Ray {
    /// Create a ray
    pub const fn new(origin: Vec3, direction: Vec3, distance: f32) -> Self {
        Self {
            origin,
            direction,
            distance,
        }
    }

    /// Finite components and a non-negative distance
    pub fn is_valid(&self) -> bool {
        is_finite_vec3(&self.origin)
            && is_finite_vec3(&self.direction)
            && self.distance.is_finite()
            && self.distance >= 0.0
    }
}

/// Ray cast request
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastQuery {
    /// Id the renderer answers with
    pub query_id: String,
    /// What to report
    pub query_type: QueryType,
    /// Ray to cast
    pub ray: Ray,
}

/// Action kind, one per wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// See [`SceneAction::CreateEntity`]
    CreateEntity,
    /// See [`SceneAction::RemoveEntity`]
    RemoveEntity,
    /// See [`SceneAction::UpdateEntityComponent`]
    UpdateEntityComponent,
    /// See [`SceneAction::AttachEntityComponent`]
    AttachEntityComponent,
    /// See [`SceneAction::ComponentRemoved`]
    ComponentRemoved,
    /// See [`SceneAction::SetEntityParent`]
    SetEntityParent,
    /// See [`SceneAction::Query`]
    Query,
    /// See [`SceneAction::ComponentCreated`]
    ComponentCreated,
    /// See [`SceneAction::ComponentDisposed`]
    ComponentDisposed,
    /// See [`SceneAction::ComponentUpdated`]
    ComponentUpdated,
    /// See [`SceneAction::SceneStarted`]
    SceneStarted,
    /// See [`SceneAction::OpenExternalUrl`]
    OpenExternalUrl,
}

impl ActionKind {
    /// Every kind, in wire code order
    pub const ALL: [Self; 12] = [
        Self::CreateEntity,
        Self::RemoveEntity,
        Self::UpdateEntityComponent,
        Self::AttachEntityComponent,
        Self::ComponentRemoved,
        Self::SetEntityParent,
        Self::Query,
        Self::ComponentCreated,
        Self::ComponentDisposed,
        Self::ComponentUpdated,
        Self::SceneStarted,
        Self::OpenExternalUrl,
    ];

    /// Wire code
    pub const fn code(self) -> u8 {
        match self {
            Self::CreateEntity => 1,
            Self::RemoveEntity => 2,
            Self::UpdateEntityComponent => 3,
            Self::AttachEntityComponent => 4,
            Self::ComponentRemoved => 5,
            Self::SetEntityParent => 6,
            Self::Query => 7,
            Self::ComponentCreated => 8,
            Self::ComponentDisposed => 9,
            Self::ComponentUpdated => 10,
            Self::SceneStarted => 11,
            Self::OpenExternalUrl => 12,
        }
    }

    /// Decode a wire code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateEntity => "CreateEntity",
            Self::RemoveEntity => "RemoveEntity",
            Self::UpdateEntityComponent => "UpdateEntityComponent",
            Self::AttachEntityComponent => "AttachEntityComponent",
            Self::ComponentRemoved => "ComponentRemoved",
            Self::SetEntityParent => "SetEntityParent",
            Self::Query => "Query",
            Self::ComponentCreated => "ComponentCreated",
            Self::ComponentDisposed => "ComponentDisposed",
            Self::ComponentUpdated => "ComponentUpdated",
            Self::SceneStarted => "SceneStarted",
            Self::OpenExternalUrl => "OpenExternalUrl",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single scene mutation or request, in the order the scene issued it
#[derive(Debug, Clone, PartialEq)]
pub enum SceneAction {
    /// New entity under the scene root
    CreateEntity {
        /// Entity id
        entity_id: String,
    },
    /// Entity and its descendants removed
    RemoveEntity {
        /// Entity id
        entity_id: String,
    },
    /// Component created or replaced on an entity
    UpdateEntityComponent {
        /// Entity id
        entity_id: String,
        /// Component class id
        class_id: u32,
        /// Component name
        name: String,
        /// JSON payload
        json: String,
    },
    /// Shared component bound to an entity
    AttachEntityComponent {
        /// Entity id
        entity_id: String,
        /// Slot name on the entity
        name: String,
        /// Shared component id
        component_id: String,
    },
    /// Component reset to its default
    ComponentRemoved {
        /// Entity id
        entity_id: String,
        /// Component name
        name: String,
    },
    /// Entity moved under another parent (`"0"` is the root)
    SetEntityParent {
        /// Entity id
        entity_id: String,
        /// New parent id
        parent_id: String,
    },
    /// Ray cast request
    Query(RaycastQuery),
    /// Shared component created
    ComponentCreated {
        /// Shared component id
        component_id: String,
        /// Component class id
        class_id: u32,
        /// Component name
        name: String,
    },
    /// Shared component disposed
    ComponentDisposed {
        /// Shared component id
        component_id: String,
    },
    /// Shared component payload replaced
    ComponentUpdated {
        /// Shared component id
        component_id: String,
        /// JSON payload
        json: String,
    },
    /// End of the scene's initial burst
    SceneStarted,
    /// Ask the client to open a link
    OpenExternalUrl {
        /// Target url
        url: String,
    },
}

impl SceneAction {
    /// Kind of this action
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CreateEntity { .. } => ActionKind::CreateEntity,
            Self::RemoveEntity { .. } => ActionKind::RemoveEntity,
            Self::UpdateEntityComponent { .. } => ActionKind::UpdateEntityComponent,
            Self::AttachEntityComponent { .. } => ActionKind::AttachEntityComponent,
            Self::ComponentRemoved { .. } => ActionKind::ComponentRemoved,
            Self::SetEntityParent { .. } => ActionKind::SetEntityParent,
            Self::Query(_) => ActionKind::Query,
            Self::ComponentCreated { .. } => ActionKind::ComponentCreated,
            Self::ComponentDisposed { .. } => ActionKind::ComponentDisposed,
            Self::ComponentUpdated { .. } => ActionKind::ComponentUpdated,
            Self::SceneStarted => ActionKind::SceneStarted,
            Self::OpenExternalUrl { .. } => ActionKind::OpenExternalUrl,
        }
    }

    /// Entity this action targets, if any
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::CreateEntity { entity_id }
            | Self::RemoveEntity { entity_id }
            | Self::UpdateEntityComponent { entity_id, .. }
            | Self::AttachEntityComponent { entity_id, .. }
            | Self::ComponentRemoved { entity_id, .. }
            | Self::SetEntityParent { entity_id, .. } => Some(entity_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(ActionKind::CreateEntity.code(), 1);
        assert_eq!(ActionKind::Query.code(), 7);
        assert_eq!(ActionKind::OpenExternalUrl.code(), 12);
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ActionKind::from_code(0), None);
        assert_eq!(ActionKind::from_code(13), None);
    }

    #[test]
    fn query_type_codes() {
        for code in 0..4 {
            let ty = QueryType::from_code(code).expect("known code");
            assert_eq!(ty.code(), code);
        }
        assert_eq!(QueryType::from_code(4), None);
    }

    #[test]
    fn ray_validation() {
        let up = Vec3::new(0.0, 1.0, 0.0);
        assert!(Ray::new(Vec3::zeros(), up, 10.0).is_valid());
        assert!(!Ray::new(Vec3::zeros(), up, -1.0).is_valid());
        assert!(!Ray::new(Vec3::new(f32::NAN, 0.0, 0.0), up, 1.0).is_valid());
        assert!(!Ray::new(Vec3::zeros(), up, f32::INFINITY).is_valid());
    }

    #[test]
    fn entity_targets() {
        let action = SceneAction::SetEntityParent {
            entity_id: "e1".into(),
            parent_id: "0".into(),
        };
        assert_eq!(action.entity_id(), Some("e1"));
        assert_eq!(action.kind(), ActionKind::SetEntityParent);
        assert_eq!(SceneAction::SceneStarted.entity_id(), None);
    }
}
