//! Typed ledger model produced by the Codec Adapter.
//!
//! The Ledger Processor never looks at `stellar_xdr` types directly; it
//! walks these types instead. `ScVal` itself is threaded through unchanged
//! since it is already the ledger's native value representation — the
//! Value Converter's job is turning `ScVal` into the crate's public `Value`.

use stellar_xdr::curr::ScVal;

/// An undecoded ledger as handed over by the upstream source.
#[derive(Debug, Clone)]
pub struct RawLedger {
    pub sequence: u32,
    pub bytes: Vec<u8>,
}

/// A decoded ledger close. Lifetime is one processing pass.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub sequence: u32,
    pub close_time: i64,
    pub protocol_version: u32,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeType {
    V0,
    V1,
    FeeBump,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub index: u32,
    pub hash: String,
    pub envelope_type: EnvelopeType,
    pub source_account: Option<String>,
    pub operations: Vec<Operation>,
    /// `None` when the transaction was not applied (no result recorded).
    pub results: Option<Vec<OperationResult>>,
    pub post_exec_meta: Option<PostExecMeta>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub index: u32,
    pub source_account: Option<String>,
    pub body: OperationBody,
}

#[derive(Debug, Clone)]
pub enum OperationBody {
    InvokeHostFunction(InvokeHostFunctionOp),
    ExtendFootprintTtl(ExtendFootprintTtlOp),
    /// Any other operation kind. Skipped in O(1) by the processor.
    Other,
}

#[derive(Debug, Clone)]
pub struct InvokeHostFunctionOp {
    pub host_function: HostFunction,
}

#[derive(Debug, Clone)]
pub enum HostFunction {
    InvokeContract {
        contract_id: String,
        function_name: Vec<u8>,
        args: Vec<ScVal>,
    },
    CreateContract {
        /// Preimage-derived contract ID, when the deployed protocol exposes it.
        contract_id: Option<String>,
        constructor_args: Vec<ScVal>,
    },
    UploadWasm {
        wasm_size: u32,
        /// Reserved; populated only when the deployed protocol yields a hash.
        wasm_hash: Option<[u8; 32]>,
    },
}

#[derive(Debug, Clone)]
pub struct ExtendFootprintTtlOp {
    pub extend_to: u32,
    /// Contract-data keys named in the operation's read/write footprint.
    pub footprint_keys: Vec<ContractDataKey>,
}

#[derive(Debug, Clone)]
pub struct ContractDataKey {
    pub contract_id: Option<String>,
    pub key: ScVal,
}

/// Per-operation success/failure as recorded in the transaction's result array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    InvokeHostFunction { success: bool },
    Other,
}

/// Soroban-only post-execution metadata for one transaction.
#[derive(Debug, Clone, Default)]
pub struct PostExecMeta {
    pub diagnostic_events: Vec<DiagnosticEvent>,
    pub fee_ext: Option<FeeExt>,
    /// Changes grouped by the operation that produced them.
    pub per_operation_changes: Vec<OperationChanges>,
}

#[derive(Debug, Clone)]
pub struct FeeExt {
    pub total_nonrefundable_fee: i64,
    pub total_refundable_fee: i64,
    pub rent_fee: i64,
}

#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    pub op_index: u32,
    /// May be absent in the decoded protocol; the extractor falls back to
    /// the containing operation's contract ID.
    pub contract_id: Option<String>,
    pub topics: Vec<ScVal>,
    pub data: ScVal,
    pub in_successful_contract_call: bool,
}

#[derive(Debug, Clone)]
pub struct OperationChanges {
    pub op_index: u32,
    pub changes: Vec<LedgerEntryChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntryKind {
    ContractData,
    ContractCode,
    Other,
}

#[derive(Debug, Clone)]
pub struct LedgerEntryChange {
    pub entry_kind: LedgerEntryKind,
    pub pre: Option<LedgerEntryData>,
    pub post: Option<LedgerEntryData>,
    /// Set by the codec when the decoded protocol marks this change as an
    /// archive restoration (a dedicated discriminant, when available).
    pub restored: bool,
}

#[derive(Debug, Clone)]
pub struct LedgerEntryData {
    /// Resolved from the entry's address sum type (`contract` or `account`).
    /// `None` when the decoder could not resolve the address.
    pub contract_id: Option<String>,
    pub key: ScVal,
    pub value: ScVal,
    pub last_modified_ledger_seq: u32,
}

/// Derived change kind per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
    Restored,
}

impl LedgerEntryChange {
    pub fn kind(&self) -> ChangeKind {
        match (&self.pre, &self.post, self.restored) {
            (None, Some(_), true) => ChangeKind::Restored,
            (None, Some(_), false) => ChangeKind::Created,
            (Some(_), Some(_), _) => ChangeKind::Updated,
            (Some(_), None, _) => ChangeKind::Removed,
            (None, None, _) => ChangeKind::Removed,
        }
    }
}
