//! Host event system
//!
//! Key principles:
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)
//! - Queued delivery: events raised during a tick are dispatched at its end

use crate::scene::LifecycleState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A scene entered the registry
    SceneLoaded,
    /// A scene left the registry
    SceneUnloaded,
    /// A scene recomputed its pending count
    StateRefreshed,
    /// A scene reached its terminal readiness state
    SceneReady,
    /// Renderer-side download count changed
    AssetDownloadsChanged,
    /// Renderer started or stopped presenting the world
    RenderingStateChanged,
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// A scene entered the registry
    SceneLoaded {
        /// Scene id
        scene_id: String,
    },
    /// A scene left the registry
    SceneUnloaded {
        /// Scene id
        scene_id: String,
    },
    /// A scene recomputed its pending count
    StateRefreshed {
        /// Scene id
        scene_id: String,
        /// Components still loading
        pending: usize,
        /// State after the refresh
        state: LifecycleState,
    },
    /// A scene reached its terminal readiness state
    SceneReady {
        /// Scene id
        scene_id: String,
    },
    /// Renderer-side download count changed
    AssetDownloadsChanged {
        /// Downloads in flight
        active: usize,
    },
    /// Renderer started (`true`) or stopped presenting the world
    RenderingStateChanged {
        /// New state
        active: bool,
    },
}

impl SceneEvent {
    /// Type used for handler lookup
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::SceneLoaded { .. } => EventType::SceneLoaded,
            Self::SceneUnloaded { .. } => EventType::SceneUnloaded,
            Self::StateRefreshed { .. } => EventType::StateRefreshed,
            Self::SceneReady { .. } => EventType::SceneReady,
            Self::AssetDownloadsChanged { .. } => EventType::AssetDownloadsChanged,
            Self::RenderingStateChanged { .. } => EventType::RenderingStateChanged,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &SceneEvent) -> bool;
}

/// Lets one handler be registered for several types and still be read by
/// whoever holds another clone
impl<H: EventHandler> EventHandler for Arc<Mutex<H>> {
    fn on_event(&mut self, event: &SceneEvent) -> bool {
        self.lock().on_event(event)
    }
}

/// Event queue with registration
/// Follows chain of responsibility pattern
#[derive(Default)]
pub struct EventQueue {
    queue: Vec<SceneEvent>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: SceneEvent) {
        self.queue.push(event);
    }

    /// Events waiting for dispatch
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all queued events in send order, returning how many
    pub fn dispatch(&mut self) -> usize {
        let queued = std::mem::take(&mut self.queue);
        let count = queued.len();
        for event in &queued {
            self.dispatch_event(event);
        }
        count
    }

    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &SceneEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type()) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    break;
                }
            }
        }
    }

    /// Drop queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        received: Vec<SceneEvent>,
        consume: bool,
    }

    impl Recorder {
        fn shared(consume: bool) -> Arc<Mutex<Self>> {
            Arc::new(Mutex::new(Self {
                received: Vec::new(),
                consume,
            }))
        }
    }

    impl EventHandler for Recorder {
        fn on_event(&mut self, event: &SceneEvent) -> bool {
            self.received.push(event.clone());
            self.consume
        }
    }

    fn loaded(id: &str) -> SceneEvent {
        SceneEvent::SceneLoaded {
            scene_id: id.to_string(),
        }
    }

    #[test]
    fn only_registered_types_are_delivered() {
        let mut events = EventQueue::new();
        let recorder = Recorder::shared(false);
        events.register_handler(EventType::SceneLoaded, Box::new(Arc::clone(&recorder)));

        events.send(loaded("a"));
        events.send(SceneEvent::SceneReady {
            scene_id: "a".into(),
        });
        events.send(loaded("b"));
        assert_eq!(events.dispatch(), 3);
        assert_eq!(events.pending(), 0);

        assert_eq!(recorder.lock().received, vec![loaded("a"), loaded("b")]);
    }

    #[test]
    fn consumed_events_stop_forwarding() {
        let mut events = EventQueue::new();
        let first = Recorder::shared(true);
        let second = Recorder::shared(false);
        events.register_handler(EventType::SceneLoaded, Box::new(Arc::clone(&first)));
        events.register_handler(EventType::SceneLoaded, Box::new(Arc::clone(&second)));

        events.send(loaded("a"));
        events.dispatch();

        assert_eq!(first.lock().received.len(), 1);
        assert!(second.lock().received.is_empty());
    }

    #[test]
    fn clear_drops_queued_events() {
        let mut events = EventQueue::new();
        events.send(loaded("a"));
        events.clear();
        assert_eq!(events.dispatch(), 0);
    }
}
