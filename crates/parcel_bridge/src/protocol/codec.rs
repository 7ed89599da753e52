//! Record codec
//!
//! A record is one [`SceneAction`] tagged with its scene id, written as
//! little-endian binary and carried as a single base64 line:
//!
//! ```text
//! u8   version (1)
//! str  scene id          u32 byte length + UTF-8
//! u8   action kind code
//! ...  payload fields    str, u32 LE, f32 LE
//! ```
//!
//! Encoding validates its input so a record that leaves this module always
//! decodes; decoding reports every malformation as a [`ProtocolError`].

use super::action::{ActionKind, QueryType, RaycastQuery, Ray, SceneAction};
use crate::foundation::math::Vec3;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Record layout version
pub const RECORD_VERSION: u8 = 1;

/// Longest string field accepted, in bytes
pub const MAX_FIELD_LEN: usize = 1 << 20;

/// Malformed record, on either side of the wire
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A required id or url was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A string field exceeded [`MAX_FIELD_LEN`]
    #[error("{field} is {len} bytes, limit is {MAX_FIELD_LEN}")]
    FieldTooLong {
        /// Field name
        field: &'static str,
        /// Actual length
        len: usize,
    },

    /// Ray with non-finite values or a negative distance
    #[error("query '{0}' has an invalid ray")]
    InvalidRay(String),

    /// Line is not valid base64
    #[error("invalid base64: {0}")]
    Base64(String),

    /// Unsupported layout version
    #[error("unsupported record version {0}")]
    Version(u8),

    /// Unknown action kind code
    #[error("unknown action kind {0}")]
    UnknownKind(u8),

    /// Unknown query type code
    #[error("unknown query type {0}")]
    UnknownQueryType(u8),

    /// Record ended in the middle of a field
    #[error("record truncated while reading {0}")]
    Truncated(&'static str),

    /// String field is not UTF-8
    #[error("{0} is not valid UTF-8")]
    Utf8(&'static str),

    /// Bytes left over after the payload
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}

/// A decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    /// Scene the action belongs to
    pub scene_id: String,
    /// The action
    pub action: SceneAction,
}

/// Writes record fields; a checking writer runs every field check but keeps
/// no bytes.
struct RecordWriter {
    buf: Vec<u8>,
    checking: bool,
}

impl RecordWriter {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            checking: false,
        }
    }

    const fn checking() -> Self {
        Self {
            buf: Vec::new(),
            checking: true,
        }
    }

    fn u8(&mut self, value: u8) {
        if !self.checking {
            self.buf.push(value);
        }
    }

    fn u32(&mut self, value: u32) {
        if !self.checking {
            self.buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    fn f32(&mut self, value: f32) {
        if !self.checking {
            self.buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    fn vec3(&mut self, value: &Vec3) {
        self.f32(value.x);
        self.f32(value.y);
        self.f32(value.z);
    }

    fn str(&mut self, field: &'static str, value: &str) -> Result<(), ProtocolError> {
        let len = value.len();
        if len > MAX_FIELD_LEN {
            return Err(ProtocolError::FieldTooLong { field, len });
        }
        let len = u32::try_from(len).map_err(|_| ProtocolError::FieldTooLong { field, len })?;
        self.u32(len);
        if !self.checking {
            self.buf.extend_from_slice(value.as_bytes());
        }
        Ok(())
    }

    fn id(&mut self, field: &'static str, value: &str) -> Result<(), ProtocolError> {
        if value.is_empty() {
            return Err(ProtocolError::EmptyField(field));
        }
        self.str(field, value)
    }
}

struct RecordReader<'a> {
    inp: &'a [u8],
}

impl<'a> RecordReader<'a> {
    const fn new(inp: &'a [u8]) -> Self {
        Self { inp }
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ProtocolError> {
        if self.inp.len() < N {
            return Err(ProtocolError::Truncated(field));
        }
        let (head, rest) = self.inp.split_at(N);
        self.inp = rest;
        let mut buf = [0u8; N];
        buf.copy_from_slice(head);
        Ok(buf)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        Ok(self.take::<1>(field)?[0])
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.take::<4>(field)?))
    }

    fn f32(&mut self, field: &'static str) -> Result<f32, ProtocolError> {
        Ok(f32::from_le_bytes(self.take::<4>(field)?))
    }

    fn vec3(&mut self, field: &'static str) -> Result<Vec3, ProtocolError> {
        Ok(Vec3::new(self.f32(field)?, self.f32(field)?, self.f32(field)?))
    }

    fn str(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let len = self.u32(field)? as usize;
        if len > MAX_FIELD_LEN {
            return Err(ProtocolError::FieldTooLong { field, len });
        }
        if self.inp.len() < len {
            return Err(ProtocolError::Truncated(field));
        }
        let (head, rest) = self.inp.split_at(len);
        self.inp = rest;
        String::from_utf8(head.to_vec()).map_err(|_| ProtocolError::Utf8(field))
    }

    fn finish(self) -> Result<(), ProtocolError> {
        if self.inp.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::TrailingBytes(self.inp.len()))
        }
    }
}

/// Encode one action for `scene_id` into a base64 line (no newline)
pub fn encode_record(scene_id: &str, action: &SceneAction) -> Result<String, ProtocolError> {
    let mut w = RecordWriter::new();
    write_record(&mut w, scene_id, action)?;
    Ok(STANDARD.encode(&w.buf))
}

/// Run every check [`encode_record`] runs without producing the record
pub fn validate_record(scene_id: &str, action: &SceneAction) -> Result<(), ProtocolError> {
    write_record(&mut RecordWriter::checking(), scene_id, action)
}

fn write_record(w: &mut RecordWriter, scene_id: &str, action: &SceneAction) -> Result<(), ProtocolError> {
    w.u8(RECORD_VERSION);
    w.id("scene id", scene_id)?;
    w.u8(action.kind().code());

    match action {
        SceneAction::CreateEntity { entity_id } | SceneAction::RemoveEntity { entity_id } => {
            w.id("entity id", entity_id)?;
        }
        SceneAction::UpdateEntityComponent {
            entity_id,
            class_id,
            name,
            json,
        } => {
            w.id("entity id", entity_id)?;
            w.u32(*class_id);
            w.id("component name", name)?;
            w.str("json", json)?;
        }
        SceneAction::AttachEntityComponent {
            entity_id,
            name,
            component_id,
        } => {
            w.id("entity id", entity_id)?;
            w.id("component name", name)?;
            w.id("component id", component_id)?;
        }
        SceneAction::ComponentRemoved { entity_id, name } => {
            w.id("entity id", entity_id)?;
            w.id("component name", name)?;
        }
        SceneAction::SetEntityParent {
            entity_id,
            parent_id,
        } => {
            w.id("entity id", entity_id)?;
            w.id("parent id", parent_id)?;
        }
        SceneAction::Query(query) => {
            if !query.ray.is_valid() {
                return Err(ProtocolError::InvalidRay(query.query_id.clone()));
            }
            w.id("query id", &query.query_id)?;
            w.u8(query.query_type.code());
            w.vec3(&query.ray.origin);
            w.vec3(&query.ray.direction);
            w.f32(query.ray.distance);
        }
        SceneAction::ComponentCreated {
            component_id,
            class_id,
            name,
        } => {
            w.id("component id", component_id)?;
            w.u32(*class_id);
            w.str("component name", name)?;
        }
        SceneAction::ComponentDisposed { component_id } => {
            w.id("component id", component_id)?;
        }
        SceneAction::ComponentUpdated { component_id, json } => {
            w.id("component id", component_id)?;
            w.str("json", json)?;
        }
        SceneAction::SceneStarted => {}
        SceneAction::OpenExternalUrl { url } => {
            w.id("url", url)?;
        }
    }
    Ok(())
}

/// Decode one base64 line back into a record
pub fn decode_record(line: &str) -> Result<SceneRecord, ProtocolError> {
    let bytes = STANDARD
        .decode(line.trim_end_matches('\r'))
        .map_err(|e| ProtocolError::Base64(e.to_string()))?;
    let mut r = RecordReader::new(&bytes);

    let version = r.u8("version")?;
    if version != RECORD_VERSION {
        return Err(ProtocolError::Version(version));
    }
    let scene_id = r.str("scene id")?;
    let code = r.u8("action kind")?;
    let kind = ActionKind::from_code(code).ok_or(ProtocolError::UnknownKind(code))?;

    let action = match kind {
        ActionKind::CreateEntity => SceneAction::CreateEntity {
            entity_id: r.str("entity id")?,
        },
        ActionKind::RemoveEntity => SceneAction::RemoveEntity {
            entity_id: r.str("entity id")?,
        },
        ActionKind::UpdateEntityComponent => SceneAction::UpdateEntityComponent {
            entity_id: r.str("entity id")?,
            class_id: r.u32("class id")?,
            name: r.str("component name")?,
            json: r.str("json")?,
        },
        ActionKind::AttachEntityComponent => SceneAction::AttachEntityComponent {
            entity_id: r.str("entity id")?,
            name: r.str("component name")?,
            component_id: r.str("component id")?,
        },
        ActionKind::ComponentRemoved => SceneAction::ComponentRemoved {
            entity_id: r.str("entity id")?,
            name: r.str("component name")?,
        },
        ActionKind::SetEntityParent => SceneAction::SetEntityParent {
            entity_id: r.str("entity id")?,
            parent_id: r.str("parent id")?,
        },
        ActionKind::Query => {
            let query_id = r.str("query id")?;
            let code = r.u8("query type")?;
            let query_type =
                QueryType::from_code(code).ok_or(ProtocolError::UnknownQueryType(code))?;
            let origin = r.vec3("ray origin")?;
            let direction = r.vec3("ray direction")?;
            let distance = r.f32("ray distance")?;
            SceneAction::Query(RaycastQuery {
                query_id,
                query_type,
                ray: Ray::new(origin, direction, distance),
            })
        }
        ActionKind::ComponentCreated => SceneAction::ComponentCreated {
            component_id: r.str("component id")?,
            class_id: r.u32("class id")?,
            name: r.str("component name")?,
        },
        ActionKind::ComponentDisposed => SceneAction::ComponentDisposed {
            component_id: r.str("component id")?,
        },
        ActionKind::ComponentUpdated => SceneAction::ComponentUpdated {
            component_id: r.str("component id")?,
            json: r.str("json")?,
        },
        ActionKind::SceneStarted => SceneAction::SceneStarted,
        ActionKind::OpenExternalUrl => SceneAction::OpenExternalUrl {
            url: r.str("url")?,
        },
    };
    r.finish()?;

    Ok(SceneRecord { scene_id, action })
}
