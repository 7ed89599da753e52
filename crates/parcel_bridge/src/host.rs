//! Scene host
//!
//! Composition root and control loop. Registry mutations arrive as
//! [`HostCommand`]s, renderer feedback as [`RendererEvent`]s; both are only
//! applied inside [`SceneHost::tick`], which then flushes every scene's queue
//! as one batch per scene, reaps released render resources and dispatches
//! the tick's events.

use crate::core::{BridgeConfig, ConfigError};
use crate::events::{EventHandler, EventQueue, EventType, SceneEvent};
use crate::feedback::LoadingFeedback;
use crate::foundation::math::Vec3;
use crate::protocol::{ProtocolError, Transport, TransportError, WireBatch};
use crate::scene::{ManifestError, SceneError, SceneManifest, SceneRegistry};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Host errors
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Manifest could not be parsed
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Scene-local failure surfaced to the caller
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Record could not be encoded or decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The host behind a handle is gone
    #[error("scene host has shut down")]
    HostClosed,
}

/// Registry mutations, applied in submission order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Load scenes not yet registered
    LoadParcelScenes(Vec<SceneManifest>),
    /// Replace descriptor data of registered scenes
    UpdateParcelScenes(Vec<SceneManifest>),
    /// Unload one scene
    UnloadScene(String),
    /// Unload everything
    UnloadAllScenes,
    /// Register a global UI scene
    CreateUiScene {
        /// Scene id
        id: String,
        /// Content base url
        base_url: String,
    },
    /// Toggle the debug floor
    SetDebug(bool),
    /// External floor height
    SetFloorHeight(f32),
}

/// Feedback from the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// A shared component finished loading
    DisposableLoaded {
        /// Owning scene
        scene_id: String,
        /// Shared component id
        component_id: String,
    },
    /// Number of asset downloads in flight changed
    AssetDownloadsChanged {
        /// Downloads in flight
        active: usize,
    },
    /// Renderer started presenting the world
    RenderingActivated,
    /// Renderer stopped presenting the world
    RenderingDeactivated,
    /// Camera position, informational only
    PositionReport {
        /// World position
        position: Vec3,
    },
}

/// Cloneable submission handle for other threads
#[derive(Debug, Clone)]
pub struct HostHandle {
    commands: Sender<HostCommand>,
    renderer: Sender<RendererEvent>,
}

impl HostHandle {
    /// Queue a registry mutation for the next tick
    pub fn submit(&self, command: HostCommand) -> Result<(), HostError> {
        self.commands.send(command).map_err(|_| HostError::HostClosed)
    }

    /// Queue renderer feedback for the next tick
    pub fn report(&self, event: RendererEvent) -> Result<(), HostError> {
        self.renderer.send(event).map_err(|_| HostError::HostClosed)
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Commands applied
    pub commands: usize,
    /// Renderer events applied
    pub renderer_events: usize,
    /// Batches handed to the transport
    pub batches_sent: usize,
    /// Records encoded
    pub records: usize,
    /// Batches waiting for a transport
    pub backlog: usize,
    /// Render resources destroyed
    pub resources_released: usize,
    /// Events dispatched to handlers
    pub events: usize,
}

/// Host control loop
pub struct SceneHost {
    registry: SceneRegistry,
    commands: Receiver<HostCommand>,
    renderer: Receiver<RendererEvent>,
    handle: HostHandle,
    transport: Option<Box<dyn Transport>>,
    backlog: VecDeque<Vec<u8>>,
    backlog_capacity: usize,
    events: EventQueue,
    feedback: Arc<Mutex<LoadingFeedback>>,
}

impl SceneHost {
    /// Create a host; fails on invalid configuration
    pub fn new(config: &BridgeConfig) -> Result<Self, HostError> {
        config.validate()?;
        let (command_tx, command_rx) = mpsc::channel();
        let (renderer_tx, renderer_rx) = mpsc::channel();

        let feedback = Arc::new(Mutex::new(LoadingFeedback::new()));
        let mut events = EventQueue::new();
        for event_type in LoadingFeedback::INTERESTS {
            events.register_handler(event_type, Box::new(Arc::clone(&feedback)));
        }

        Ok(Self {
            registry: SceneRegistry::new(config),
            commands: command_rx,
            renderer: renderer_rx,
            handle: HostHandle {
                commands: command_tx,
                renderer: renderer_tx,
            },
            transport: None,
            backlog: VecDeque::new(),
            backlog_capacity: config.transport.backlog_capacity,
            events,
            feedback,
        })
    }

    /// Submission handle
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Queue a registry mutation for the next tick
    pub fn submit(&self, command: HostCommand) -> Result<(), HostError> {
        self.handle.submit(command)
    }

    /// Queue renderer feedback for the next tick
    pub fn report(&self, event: RendererEvent) -> Result<(), HostError> {
        self.handle.report(event)
    }

    /// Attach the renderer transport; held batches go out on the next tick
    pub fn attach_transport(&mut self, transport: Box<dyn Transport>) {
        log::info!("transport attached, {} batches held", self.backlog.len());
        self.transport = Some(transport);
    }

    /// Detach the transport; later batches are held in the backlog
    pub fn detach_transport(&mut self) -> Option<Box<dyn Transport>> {
        self.transport.take()
    }

    /// Register an extra event handler
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.events.register_handler(event_type, handler);
    }

    /// Scene registry, read-only
    pub const fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Current loading feedback text
    pub fn loading_message(&self) -> Option<String> {
        self.feedback.lock().message().map(str::to_string)
    }

    /// Batches waiting for a transport
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Run one iteration of the control loop
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            commands: self.apply_commands(),
            renderer_events: self.apply_renderer_events(),
            ..TickReport::default()
        };

        let (batches, records) = self.flush();
        report.records = records;
        report.batches_sent = batches;
        report.backlog = self.backlog.len();

        report.resources_released = self.registry.resources().lock().reap();

        for event in self.registry.take_notifications() {
            self.events.send(event);
        }
        report.events = self.events.dispatch();
        report
    }

    fn apply_commands(&mut self) -> usize {
        let mut count = 0;
        while let Ok(command) = self.commands.try_recv() {
            count += 1;
            match command {
                HostCommand::LoadParcelScenes(manifests) => {
                    let report = self.registry.load_parcel_scenes(&manifests);
                    log::debug!(
                        "load: {} new, {} already loaded, {} rejected",
                        report.loaded.len(),
                        report.superseded.len(),
                        report.rejected.len()
                    );
                }
                HostCommand::UpdateParcelScenes(manifests) => {
                    self.registry.update_parcel_scenes(&manifests);
                }
                HostCommand::UnloadScene(id) => {
                    self.registry.unload_scene(&id);
                }
                HostCommand::UnloadAllScenes => {
                    let unloaded = self.registry.unload_all_scenes();
                    log::info!("unloaded all {unloaded} scenes");
                }
                HostCommand::CreateUiScene { id, base_url } => {
                    self.registry.create_ui_scene(&id, &base_url);
                }
                HostCommand::SetDebug(debug) => self.registry.set_debug(debug),
                HostCommand::SetFloorHeight(height) => self.registry.set_floor_height(height),
            }
        }
        count
    }

    fn apply_renderer_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.renderer.try_recv() {
            count += 1;
            match event {
                RendererEvent::DisposableLoaded {
                    scene_id,
                    component_id,
                } => {
                    if self.registry.disposable_loaded(&scene_id, &component_id).is_err() {
                        log::debug!("[{scene_id}] load report after unload, ignoring '{component_id}'");
                    }
                }
                RendererEvent::AssetDownloadsChanged { active } => {
                    self.events.send(SceneEvent::AssetDownloadsChanged { active });
                }
                RendererEvent::RenderingActivated => {
                    log::info!("rendering activated");
                    self.events.send(SceneEvent::RenderingStateChanged { active: true });
                }
                RendererEvent::RenderingDeactivated => {
                    log::info!("rendering deactivated");
                    self.events.send(SceneEvent::RenderingStateChanged { active: false });
                }
                RendererEvent::PositionReport { position } => {
                    log::trace!("position report {position:?}");
                }
            }
        }
        count
    }

    /// Encode each scene's queue into one batch, returning batches sent and
    /// records encoded
    fn flush(&mut self) -> (usize, usize) {
        let mut records = 0;
        for (scene_id, actions) in self.registry.drain_outbound() {
            let mut batch = WireBatch::new(scene_id.as_str());
            for action in &actions {
                if let Err(err) = batch.push(action) {
                    log::error!("[{scene_id}] dropping unencodable {}: {err}", action.kind());
                }
            }
            if batch.is_empty() {
                continue;
            }
            records += batch.len();
            self.hold(batch.into_bytes());
        }
        (self.send_backlog(), records)
    }

    fn hold(&mut self, payload: Vec<u8>) {
        if self.transport.is_none() && self.backlog.is_empty() {
            log::warn!("{}", TransportError::Unavailable);
        }
        self.backlog.push_back(payload);
        while self.backlog.len() > self.backlog_capacity {
            self.backlog.pop_front();
            log::warn!("backlog full, dropped the oldest batch");
        }
    }

    fn send_backlog(&mut self) -> usize {
        let Some(transport) = self.transport.as_ref() else {
            return 0;
        };
        let mut sent = 0;
        let mut lost = false;
        while let Some(payload) = self.backlog.front() {
            match transport.try_send(payload.clone()) {
                Ok(()) => {
                    self.backlog.pop_front();
                    sent += 1;
                }
                Err(TransportError::Full) => {
                    log::debug!("transport full, holding {} batches", self.backlog.len());
                    break;
                }
                Err(err) => {
                    log::warn!("{err}, holding {} batches", self.backlog.len());
                    lost = true;
                    break;
                }
            }
        }
        if lost {
            self.transport = None;
        }
        sent
    }
}
