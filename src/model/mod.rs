pub mod event;
pub mod filter;
pub mod ledger;

pub use event::{
    ArchiveRestoration, ContractSourceKind, DataSource, DiagnosticEventOut, Event, EventBody,
    EventMeta, StateChange, StateChangeOp, SubCall, TtlExtension, Value, PENDING_CONTRACT_ID,
};
pub use filter::{ContentFilter, FilterSpec, TypeFilter};
pub use ledger::{
    ChangeKind, ContractDataKey, DiagnosticEvent, EnvelopeType, ExtendFootprintTtlOp, FeeExt,
    HostFunction, InvokeHostFunctionOp, Ledger, LedgerEntryChange, LedgerEntryData,
    LedgerEntryKind, Operation, OperationBody, OperationChanges, OperationResult, PostExecMeta,
    RawLedger, Transaction,
};
