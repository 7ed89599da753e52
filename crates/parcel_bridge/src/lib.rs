//! # Parcel Bridge
//!
//! Mirrors independently scripted parcel scenes into a renderer.
//!
//! ## Features
//!
//! - **Entity Graph**: per-scene entity/component arena with cycle-checked parenting
//! - **Scene Lifecycle**: readiness driven by asynchronously loaded components
//! - **Wire Protocol**: ordered, per-scene batches of base64 binary records
//! - **Grid Positioning**: translation-invariant parcel placement
//! - **Scene Registry**: identity-stable load, update and unload
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parcel_bridge::prelude::*;
//!
//! fn main() -> Result<(), HostError> {
//!     let config = BridgeConfig::default();
//!     let mut host = SceneHost::new(&config)?;
//!
//!     let manifests = parse_manifests(r#"[{"id":"plaza","basePosition":{"x":0,"y":0},"parcels":[{"x":0,"y":0}]}]"#)?;
//!     host.submit(HostCommand::LoadParcelScenes(manifests))?;
//!     host.tick();
//!
//!     if let Some(scene) = host.registry().get("plaza") {
//!         scene.write().create_entity("tree")?;
//!     }
//!     host.tick();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod config;
pub mod core;
pub mod foundation;

// Scene model
pub mod parcel;
pub mod scene;

// Renderer plumbing
pub mod events;
pub mod feedback;
pub mod protocol;
pub mod renderer;

mod host;

pub use host::{HostCommand, HostError, HostHandle, RendererEvent, SceneHost, TickReport};

/// Common imports for bridge users
pub mod prelude {
    pub use crate::{
        core::{BridgeConfig, Config, ConfigError},
        events::{EventHandler, EventType, SceneEvent},
        feedback::LoadingFeedback,
        foundation::math::{Quat, Vec3},
        parcel::{GridPositioner, ParcelCoord},
        protocol::{LocalLoopbackTransport, SceneAction, Transport, WireBatch},
        renderer::RendererMirror,
        scene::{
            parse_manifests, LifecycleState, ParcelScene, SceneError, SceneManifest, SceneRegistry,
            SharedScene,
        },
        HostCommand, HostError, RendererEvent, SceneHost,
    };
}
