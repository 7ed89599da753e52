//! Per-scene outbound action queue
//!
//! A bounded FIFO between a scene (the only producer) and the host flush.
//! The sender tracks depth so the scene can check for room before it mutates
//! its graph, which keeps the graph and the wire from drifting apart when the
//! queue is full.

use super::action::SceneAction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

/// Outbound queue failures
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue at capacity
    #[error("outbound queue is full ({capacity} actions)")]
    Full {
        /// Queue capacity
        capacity: usize,
    },

    /// Consumer gone (scene unloaded)
    #[error("outbound queue is disconnected")]
    Disconnected,
}

/// Create a bounded action queue
pub fn action_queue(capacity: usize) -> (ActionSender, ActionReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::sync_channel(capacity);
    let depth = Arc::new(AtomicUsize::new(0));
    (
        ActionSender {
            tx,
            depth: Arc::clone(&depth),
            capacity,
        },
        ActionReceiver { rx, depth },
    )
}

/// Producer half, owned by the scene
#[derive(Debug)]
pub struct ActionSender {
    tx: SyncSender<SceneAction>,
    depth: Arc<AtomicUsize>,
    capacity: usize,
}

impl ActionSender {
    /// Fails if one more action would not fit
    pub fn reserve(&self) -> Result<(), QueueError> {
        if self.depth.load(Ordering::Acquire) >= self.capacity {
            Err(QueueError::Full {
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }

    /// Queue an action without blocking
    pub fn try_send(&self, action: SceneAction) -> Result<(), QueueError> {
        match self.tx.try_send(action) {
            Ok(()) => {
                self.depth.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(QueueError::Full {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(QueueError::Disconnected),
        }
    }

    /// Actions queued and not yet drained
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Queue capacity
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer half, owned by the registry
#[derive(Debug)]
pub struct ActionReceiver {
    rx: Receiver<SceneAction>,
    depth: Arc<AtomicUsize>,
}

impl ActionReceiver {
    /// Drain every queued action, in send order
    pub fn drain(&self) -> Vec<SceneAction> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(action) => {
                    self.depth.fetch_sub(1, Ordering::AcqRel);
                    out.push(action);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Actions queued and not yet drained
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(id: &str) -> SceneAction {
        SceneAction::CreateEntity { entity_id: id.into() }
    }

    #[test]
    fn drains_in_send_order() {
        let (tx, rx) = action_queue(8);
        for id in ["a", "b", "c"] {
            tx.try_send(create(id)).expect("room");
        }
        assert_eq!(tx.depth(), 3);
        let drained = rx.drain();
        assert_eq!(drained, vec![create("a"), create("b"), create("c")]);
        assert_eq!(rx.depth(), 0);
    }

    #[test]
    fn full_queue_is_reported_before_sending() {
        let (tx, rx) = action_queue(2);
        tx.try_send(create("a")).expect("room");
        tx.reserve().expect("room for one more");
        tx.try_send(create("b")).expect("room");
        assert_eq!(tx.reserve(), Err(QueueError::Full { capacity: 2 }));
        assert_eq!(tx.try_send(create("c")), Err(QueueError::Full { capacity: 2 }));

        assert_eq!(rx.drain().len(), 2);
        assert!(tx.reserve().is_ok());
    }

    #[test]
    fn dropped_receiver_disconnects() {
        let (tx, rx) = action_queue(2);
        drop(rx);
        assert_eq!(tx.try_send(create("a")), Err(QueueError::Disconnected));
    }
}
