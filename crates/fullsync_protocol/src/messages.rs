//! Messages transmitted during a full sync.

use fullsync_codec::{from_cbor, to_canonical_cbor, CodecError, CodecResult, Value};
use fullsync_core::{Checksum, Estimate, RecordId};
use serde::{Deserialize, Serialize};

/// A full-sync protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum SyncMessage {
    /// One chunk of a module's ids.
    Chunk(ChunkPayload),
    /// Start marker, sent once before any chunk of a plan.
    Start(FullSyncStart),
    /// End marker, sent once after every module finished.
    End(FullSyncEnd),
    /// A whole named value.
    Snapshot(Snapshot),
}

impl SyncMessage {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            SyncMessage::Chunk(_) => 1,
            SyncMessage::Start(_) => 2,
            SyncMessage::End(_) => 3,
            SyncMessage::Snapshot(_) => 4,
        }
    }

    /// Encodes as `{"type": code, "body": ..}` in canonical CBOR.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let body = match self {
            SyncMessage::Chunk(m) => m.to_value(),
            SyncMessage::Start(m) => m.to_value(),
            SyncMessage::End(m) => m.to_value(),
            SyncMessage::Snapshot(m) => m.to_value()?,
        };
        let envelope = Value::text_map([
            ("type", Value::from(u32::from(self.type_code()))),
            ("body", body),
        ]);
        to_canonical_cbor(&envelope)
    }

    /// Decodes an envelope produced by [`SyncMessage::encode`].
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let envelope = from_cbor(bytes)?;
        let code = u64_field(&envelope, "type")?;
        let body = field(&envelope, "body")?;
        Ok(match code {
            1 => SyncMessage::Chunk(ChunkPayload::from_value(body)?),
            2 => SyncMessage::Start(FullSyncStart::from_value(body)?),
            3 => SyncMessage::End(FullSyncEnd::from_value(body)?),
            4 => SyncMessage::Snapshot(Snapshot::from_value(body)?),
            other => {
                return Err(CodecError::invalid_structure(format!(
                    "unknown message type {other}"
                )))
            }
        })
    }

    /// Number of ids carried, zero for non-chunk messages.
    pub fn id_count(&self) -> usize {
        match self {
            SyncMessage::Chunk(payload) => payload.ids.len(),
            _ => 0,
        }
    }
}

/// One transmitted chunk: the ids plus the cursor they were taken below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Ids, largest first.
    pub ids: Vec<RecordId>,
    /// Cursor before this chunk; the sentinel for a module's first chunk.
    pub previous_cursor: RecordId,
}

impl ChunkPayload {
    /// Creates a payload.
    pub fn new(ids: Vec<RecordId>, previous_cursor: RecordId) -> Self {
        Self {
            ids,
            previous_cursor,
        }
    }

    fn to_value(&self) -> Value {
        Value::text_map([
            (
                "ids",
                Value::Array(self.ids.iter().map(|id| Value::from(id.as_u64())).collect()),
            ),
            ("previous_cursor", Value::from(self.previous_cursor.as_u64())),
        ])
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        let ids = array_field(value, "ids")?
            .iter()
            .map(|v| as_u64(v, "ids").map(RecordId))
            .collect::<CodecResult<_>>()?;
        Ok(Self {
            ids,
            previous_cursor: RecordId(u64_field(value, "previous_cursor")?),
        })
    }
}

/// Expected size of one module, announced in the start marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEstimate {
    /// Module name.
    pub module: String,
    /// Matching records.
    pub records: u64,
    /// Expected chunks.
    pub chunks: u64,
}

impl ModuleEstimate {
    /// Attaches a module name to an estimate.
    pub fn new(module: impl Into<String>, estimate: Estimate) -> Self {
        Self {
            module: module.into(),
            records: estimate.records,
            chunks: estimate.chunks,
        }
    }

    fn to_value(&self) -> Value {
        Value::text_map([
            ("module", Value::from(self.module.as_str())),
            ("records", Value::from(self.records)),
            ("chunks", Value::from(self.chunks)),
        ])
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(Self {
            module: text_field(value, "module")?,
            records: u64_field(value, "records")?,
            chunks: u64_field(value, "chunks")?,
        })
    }
}

/// Ids actually sent for one module, reported in the end marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTotal {
    /// Module name.
    pub module: String,
    /// Ids transmitted.
    pub sent: u64,
}

impl ModuleTotal {
    fn to_value(&self) -> Value {
        Value::text_map([
            ("module", Value::from(self.module.as_str())),
            ("sent", Value::from(self.sent)),
        ])
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(Self {
            module: text_field(value, "module")?,
            sent: u64_field(value, "sent")?,
        })
    }
}

/// Start marker for a multi-module full sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullSyncStart {
    /// Modules in traversal order with their estimates.
    pub modules: Vec<ModuleEstimate>,
    /// Checksum of the per-module configurations in force.
    pub config_checksum: Checksum,
}

impl FullSyncStart {
    fn to_value(&self) -> Value {
        Value::text_map([
            (
                "modules",
                Value::Array(self.modules.iter().map(ModuleEstimate::to_value).collect()),
            ),
            ("config_checksum", Value::from(self.config_checksum.as_u64())),
        ])
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(Self {
            modules: array_field(value, "modules")?
                .iter()
                .map(ModuleEstimate::from_value)
                .collect::<CodecResult<_>>()?,
            config_checksum: Checksum(u64_field(value, "config_checksum")?),
        })
    }
}

/// End marker for a multi-module full sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullSyncEnd {
    /// Modules with the ids they sent.
    pub modules: Vec<ModuleTotal>,
    /// Same checksum as the matching start marker.
    pub config_checksum: Checksum,
}

impl FullSyncEnd {
    fn to_value(&self) -> Value {
        Value::text_map([
            (
                "modules",
                Value::Array(self.modules.iter().map(ModuleTotal::to_value).collect()),
            ),
            ("config_checksum", Value::from(self.config_checksum.as_u64())),
        ])
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(Self {
            modules: array_field(value, "modules")?
                .iter()
                .map(ModuleTotal::from_value)
                .collect::<CodecResult<_>>()?,
            config_checksum: Checksum(u64_field(value, "config_checksum")?),
        })
    }
}

/// A named value sent whole, with the checksum it was sent under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot name.
    pub name: String,
    /// Checksum of `value`.
    pub checksum: Checksum,
    /// The value itself.
    pub value: serde_json::Value,
}

impl Snapshot {
    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::text_map([
            ("name", Value::from(self.name.as_str())),
            ("checksum", Value::from(self.checksum.as_u64())),
            ("value", Value::from_json(&self.value)?),
        ]))
    }

    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(Self {
            name: text_field(value, "name")?,
            checksum: Checksum(u64_field(value, "checksum")?),
            value: field(value, "value")?.to_json()?,
        })
    }
}

fn field<'a>(value: &'a Value, name: &str) -> CodecResult<&'a Value> {
    value
        .get(name)
        .ok_or_else(|| CodecError::invalid_structure(format!("missing {name}")))
}

fn as_u64(value: &Value, name: &str) -> CodecResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| CodecError::invalid_structure(format!("{name} is not an unsigned integer")))
}

fn u64_field(value: &Value, name: &str) -> CodecResult<u64> {
    as_u64(field(value, name)?, name)
}

fn text_field(value: &Value, name: &str) -> CodecResult<String> {
    field(value, name)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| CodecError::invalid_structure(format!("{name} is not text")))
}

fn array_field<'a>(value: &'a Value, name: &str) -> CodecResult<&'a [Value]> {
    field(value, name)?
        .as_array()
        .ok_or_else(|| CodecError::invalid_structure(format!("{name} is not an array")))
}
