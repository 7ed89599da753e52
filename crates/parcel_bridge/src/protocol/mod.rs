//! Scene-to-renderer wire protocol
//!
//! - [`action`]: typed actions a scene emits
//! - [`codec`]: one action to one base64 record line and back
//! - [`queue`]: bounded per-scene outbound FIFO
//! - [`batch`]: per-scene flush payloads
//! - [`transport`]: byte transport to the renderer

pub mod action;
pub mod batch;
pub mod codec;
pub mod queue;
pub mod transport;

pub use action::{ActionKind, QueryType, RaycastQuery, Ray, SceneAction};
pub use batch::{decode_payload, WireBatch};
pub use codec::{
    decode_record, encode_record, validate_record, ProtocolError, SceneRecord, MAX_FIELD_LEN,
    RECORD_VERSION,
};
pub use queue::{action_queue, ActionReceiver, ActionSender, QueueError};
pub use transport::{LocalLoopbackTransport, Transport, TransportError};
