//! Parcel scenes
//!
//! Host-side model of every sandboxed scene mirrored to the renderer.
//!
//! ## Architecture
//!
//! ```text
//! Scene script (intake ops)
//!      ↓
//! ParcelScene ── EntityGraph / DisposableTable / SceneLifecycle
//!      ↓  bounded outbound queue
//! SceneRegistry (load / update / unload)
//!      ↓
//! SceneHost flush → Transport → Renderer
//! ```
//!
//! A scene:
//! - Validates each intake operation against its entity graph
//! - Queues accepted operations, in order, for the next host flush
//! - Tracks readiness from its asynchronously loaded shared components
//! - Releases all render resources when unloaded

pub mod components;
mod disposable;
mod entity;
mod entity_graph;
mod error;
mod lifecycle;
mod manifest;
mod parcel_scene;
mod registry;
mod resources;

#[cfg(test)]
mod tests;

pub use components::{Component, ComponentKind, ShapeComponent, ShapeKind, TransformComponent};
pub use disposable::{loads_async, Completion, Disposable, DisposableTable, AUDIO_CLIP_CLASS_ID, TEXTURE_CLASS_ID};
pub use entity::{Entity, EntityKey, Parent, ROOT_ENTITY_ID};
pub use entity_graph::EntityGraph;
pub use error::SceneError;
pub use lifecycle::{LifecycleState, Refresh, SceneLifecycle};
pub use manifest::{parse_manifests, ContentMapping, ManifestError, SceneManifest};
pub use parcel_scene::{ParcelScene, ScenePhase};
pub use registry::{LoadReport, SceneRegistry, SharedScene};
pub use resources::{RenderResourcePool, ResourceHandle, SharedResourcePool};
