//! Per-scene batches
//!
//! A flush turns everything a scene queued since the last tick into one
//! transport message: one record per line, in append order.

use super::action::SceneAction;
use super::codec::{decode_record, encode_record, ProtocolError, SceneRecord};

/// Encoded records for one scene, in append order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireBatch {
    scene_id: String,
    lines: Vec<String>,
}

impl WireBatch {
    /// Empty batch for a scene
    pub fn new(scene_id: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            lines: Vec::new(),
        }
    }

    /// Encode and append an action; malformed actions are rejected and
    /// leave the batch unchanged
    pub fn push(&mut self, action: &SceneAction) -> Result<(), ProtocolError> {
        let line = encode_record(&self.scene_id, action)?;
        self.lines.push(line);
        Ok(())
    }

    /// Scene this batch belongs to
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// Encoded lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when nothing was appended
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Transport payload: every record followed by `\n`
    pub fn to_payload(&self) -> String {
        let size = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(size);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Payload as bytes for a [`super::Transport`]
    pub fn into_bytes(self) -> Vec<u8> {
        self.to_payload().into_bytes()
    }
}

/// Decode every line of a payload, keeping the order and the failures
pub fn decode_payload(payload: &str) -> Vec<Result<SceneRecord, ProtocolError>> {
    payload
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(decode_record)
        .collect()
}
