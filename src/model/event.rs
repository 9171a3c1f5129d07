//! The emitted event model. Every variant is a plain tagged struct —
//! no shared base classes, per the downstream-event redesign note.

use serde::Serialize;

/// A converted scalar/collection value, the public form of an `ScVal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Void,
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(String),
    I128(String),
    U256(String),
    I256(String),
    Bytes(#[serde(with = "hex_bytes")] Vec<u8>),
    String(String),
    Symbol(String),
    Address(String),
    Vec(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// Contract instance and other value shapes the converter does not
    /// flatten further.
    Other(String),
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }
}

/// Renders a ledger close time (unix seconds) as RFC3339 for downstream
/// consumers, same conversion the teacher applies to `ledger_closed_at`.
mod rfc3339 {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(unix_seconds: &i64, s: S) -> Result<S::Ok, S::Error> {
        let formatted = chrono::DateTime::from_timestamp(*unix_seconds, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        s.serialize_str(&formatted)
    }
}

impl Value {
    /// String form used for pattern matching (§4.6) and JSON display.
    pub fn as_pattern_string(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Void => "void".to_string(),
            Value::U32(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U128(v) | Value::I128(v) | Value::U256(v) | Value::I256(v) => v.clone(),
            Value::Bytes(b) => hex::encode(b),
            Value::String(s) | Value::Symbol(s) | Value::Address(s) => s.clone(),
            Value::Vec(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(Value::as_pattern_string)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Value::Map(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}:{}", k.as_pattern_string(), v.as_pattern_string()))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Value::Other(s) => s.clone(),
        }
    }
}

/// Metadata common to every emitted event.
#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    pub ledger_sequence: u32,
    #[serde(serialize_with = "rfc3339::serialize")]
    pub closed_at: i64,
    pub tx_hash: String,
    pub tx_index: u32,
    pub op_index: u32,
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub archive_restorations: Vec<ArchiveRestoration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Archive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRestoration {
    pub contract_id: String,
    pub key: Value,
    pub restored_at_ledger: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateChangeOp {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    pub contract_id: String,
    pub key: Value,
    pub op: StateChangeOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubCall {
    pub from_contract: String,
    pub to_contract: String,
    pub function: String,
    pub successful: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtlExtension {
    pub contract_id: String,
    pub key: Value,
    pub old_ttl: u32,
    pub new_ttl: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEventOut {
    pub contract_id: Option<String>,
    pub topics: Vec<Value>,
    pub data: Value,
    pub in_successful_contract_call: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractSourceKind {
    SourceAccount,
    Asset,
    Preimage,
}

/// The three emitted event variants, as a tagged sum type.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "variant")]
pub enum EventBody {
    ContractCall {
        contract_id: String,
        invoking_account: String,
        function_name: String,
        arguments: Vec<Value>,
        diagnostic_events: Vec<DiagnosticEventOut>,
        sub_calls: Vec<SubCall>,
        state_changes: Vec<StateChange>,
        ttl_extensions: Vec<TtlExtension>,
    },
    CreateContract {
        contract_id: String,
        creator_account: String,
        source_kind: ContractSourceKind,
        constructor_args: Vec<Value>,
    },
    UploadWasm {
        uploader_account: String,
        wasm_hash: [u8; 32],
        wasm_size: u32,
    },
}

/// Sentinel contract ID used when a created contract's address cannot be
/// derived from the decoded protocol (§4.1 step 6).
pub const PENDING_CONTRACT_ID: &str = "pending";

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(flatten)]
    pub body: EventBody,
}

impl Event {
    /// `(tx_index, op_index)` ordering key mandated by §4.1 and §5.
    pub fn order_key(&self) -> (u32, u32) {
        (self.meta.tx_index, self.meta.op_index)
    }
}
