//! Transport abstraction for batch payloads
//!
//! Implementations:
//! - [`LocalLoopbackTransport`]: in-process bounded channel, used by the host
//!   binary and tests to feed a [`crate::renderer::RendererMirror`]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

/// Send failures
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Receiver is not keeping up
    #[error("transport is full")]
    Full,
    /// Receiver is gone
    #[error("transport is disconnected")]
    Disconnected,
    /// No transport attached yet
    #[error("transport is not available")]
    Unavailable,
}

/// Minimal byte transport
pub trait Transport: Send + Sync {
    /// Send without blocking
    fn try_send(&self, bytes: Vec<u8>) -> Result<(), TransportError>;
    /// Receive without blocking
    fn try_recv(&self) -> Option<Vec<u8>>;
    /// Messages waiting on the receiving side
    fn depth(&self) -> usize;
}

/// In-process bounded loopback
///
/// `new` returns the two ends; bytes sent on one end arrive on the other.
pub struct LocalLoopbackTransport {
    tx: SyncSender<Vec<u8>>,
    rx: Mutex<Receiver<Vec<u8>>>,
    outgoing: Arc<AtomicUsize>,
    incoming: Arc<AtomicUsize>,
}

impl LocalLoopbackTransport {
    /// Create a connected pair with `capacity` messages per direction
    pub fn new(capacity: usize) -> (Self, Self) {
        let capacity = capacity.max(1);
        let (tx_a, rx_a) = mpsc::sync_channel(capacity);
        let (tx_b, rx_b) = mpsc::sync_channel(capacity);
        let a_to_b = Arc::new(AtomicUsize::new(0));
        let b_to_a = Arc::new(AtomicUsize::new(0));
        let a = Self {
            tx: tx_a,
            rx: Mutex::new(rx_b),
            outgoing: Arc::clone(&a_to_b),
            incoming: Arc::clone(&b_to_a),
        };
        let b = Self {
            tx: tx_b,
            rx: Mutex::new(rx_a),
            outgoing: b_to_a,
            incoming: a_to_b,
        };
        (a, b)
    }

    /// Drain every message waiting on this end
    pub fn drain(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(bytes) = self.try_recv() {
            out.push(bytes);
        }
        out
    }
}

impl Transport for LocalLoopbackTransport {
    fn try_send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        match self.tx.try_send(bytes) {
            Ok(()) => {
                self.outgoing.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(TransportError::Full),
            Err(TrySendError::Disconnected(_)) => Err(TransportError::Disconnected),
        }
    }

    fn try_recv(&self) -> Option<Vec<u8>> {
        let bytes = self.rx.lock().try_recv().ok()?;
        self.incoming.fetch_sub(1, Ordering::AcqRel);
        Some(bytes)
    }

    fn depth(&self) -> usize {
        self.incoming.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_send_recv() {
        let (a, b) = LocalLoopbackTransport::new(2);
        a.try_send(b"ping".to_vec()).expect("room");
        b.try_send(b"pong".to_vec()).expect("room");
        assert_eq!(b.depth(), 1);
        assert_eq!(b.try_recv(), Some(b"ping".to_vec()));
        assert_eq!(a.try_recv(), Some(b"pong".to_vec()));
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn bounded_and_disconnecting() {
        let (a, b) = LocalLoopbackTransport::new(1);
        a.try_send(vec![1]).expect("room");
        assert_eq!(a.try_send(vec![2]), Err(TransportError::Full));
        assert_eq!(b.drain(), vec![vec![1]]);
        drop(b);
        assert_eq!(a.try_send(vec![3]), Err(TransportError::Disconnected));
    }
}
