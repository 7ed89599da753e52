//! Scene-local errors

use crate::protocol::{ProtocolError, QueueError};

/// Failure of a single intake operation
///
/// Every variant is recoverable: the operation becomes a no-op and the
/// scene keeps processing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Entity id not present in the scene
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Shared component id not present in the scene
    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    /// Entity id that can never be created
    #[error("invalid entity id '{0}'")]
    InvalidEntityId(String),

    /// Reparent would make an entity its own ancestor
    #[error("parenting '{entity}' under '{parent}' would create a cycle")]
    ParentCycle {
        /// Entity being moved
        entity: String,
        /// Requested parent
        parent: String,
    },

    /// Payload does not match the component's schema
    #[error("invalid {kind} payload for '{target}': {reason}")]
    InvalidComponent {
        /// Component name
        kind: String,
        /// Entity or shared component id
        target: String,
        /// Parse failure
        reason: String,
    },

    /// Request rejected before reaching the queue
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Scene already unloaded
    #[error("scene '{0}' is unloaded")]
    SceneUnloaded(String),

    /// Action would not encode as a wire record
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Outbound queue refused the action
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl SceneError {
    /// Operation referenced an id the scene does not know
    pub const fn is_reference_error(&self) -> bool {
        matches!(self, Self::UnknownEntity(_) | Self::UnknownComponent(_))
    }
}
