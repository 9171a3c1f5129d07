//! Concrete Codec Adapter: `stellar_xdr`-backed decoding of a raw ledger
//! into this crate's own typed model. Grounded on the teacher's
//! `ledger/fetch.rs` and `ledger/events.rs`, which decode the same
//! `LedgerCloseMetaBatch` / `LedgerCloseMeta` / `TransactionMeta` shapes.
//!
//! Per §1/§6, decoding ledger bytes is an assumed dependency — this
//! implementation favors graceful degradation (an operation whose
//! envelope shape this adapter does not recognize is simply dropped with
//! a debug log) over panicking on an unrecognized but valid ledger.

use std::io::Cursor;

use stellar_xdr::curr::{
    self as xdr, ContractEventBody, GeneralizedTransactionSet, HostFunction as XdrHostFunction,
    LedgerCloseMeta, LedgerEntryChange as XdrLedgerEntryChange, LedgerEntryData as XdrEntryData,
    LedgerKey, Limited, Limits, Operation as XdrOperation, OperationBody as XdrOperationBody,
    OperationResult as XdrOperationResult, OperationResultTr, ReadXdr, ScAddress,
    TransactionEnvelope, TransactionMeta, TransactionMetaV3, TransactionMetaV4, TransactionPhase,
    TransactionResultResult, TxSetComponent,
};

use super::{Codec, CodecError};
use crate::model::{
    ContractDataKey, DiagnosticEvent, EnvelopeType, ExtendFootprintTtlOp, FeeExt, HostFunction,
    InvokeHostFunctionOp, Ledger, LedgerEntryChange, LedgerEntryData, LedgerEntryKind, Operation,
    OperationBody, OperationChanges, OperationResult, PostExecMeta, RawLedger, Transaction,
};
use crate::value::encode_address;

#[derive(Debug, Default)]
pub struct XdrCodec;

impl XdrCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for XdrCodec {
    fn decode(&self, raw: &RawLedger) -> Result<Ledger, CodecError> {
        if raw.bytes.is_empty() {
            return Err(CodecError::Empty {
                sequence: raw.sequence,
            });
        }

        let cursor = Cursor::new(raw.bytes.as_slice());
        let mut limited = Limited::new(cursor, Limits::none());
        let meta = LedgerCloseMeta::read_xdr(&mut limited).map_err(|source| CodecError::Xdr {
            sequence: raw.sequence,
            source,
        })?;

        Ok(decode_ledger_close_meta(&meta))
    }
}

fn decode_ledger_close_meta(meta: &LedgerCloseMeta) -> Ledger {
    let (header, transactions) = match meta {
        LedgerCloseMeta::V0(v0) => {
            let envelopes = flat_envelopes_v0(&v0.tx_set);
            let txs = v0
                .tx_processing
                .iter()
                .enumerate()
                .map(|(idx, trm)| {
                    decode_transaction(
                        idx as u32,
                        envelopes.get(idx),
                        hex::encode(v0.tx_set.previous_ledger_hash.0),
                        &trm.tx_apply_processing,
                        None,
                    )
                })
                .collect();
            (&v0.ledger_header.header, txs)
        }
        LedgerCloseMeta::V1(v1) => {
            let envelopes = flat_envelopes_generalized(&v1.tx_set);
            let txs = v1
                .tx_processing
                .iter()
                .enumerate()
                .map(|(idx, trm)| {
                    decode_transaction(
                        idx as u32,
                        envelopes.get(idx),
                        hex::encode(trm.result.transaction_hash.0),
                        &trm.tx_apply_processing,
                        Some(&trm.result.result.result),
                    )
                })
                .collect();
            (&v1.ledger_header.header, txs)
        }
        LedgerCloseMeta::V2(v2) => {
            let envelopes = flat_envelopes_generalized(&v2.tx_set);
            let txs = v2
                .tx_processing
                .iter()
                .enumerate()
                .map(|(idx, trm)| {
                    decode_transaction(
                        idx as u32,
                        envelopes.get(idx),
                        hex::encode(trm.result.transaction_hash.0),
                        &trm.tx_apply_processing,
                        Some(&trm.result.result.result),
                    )
                })
                .collect();
            (&v2.ledger_header.header, txs)
        }
    };

    Ledger {
        sequence: header.ledger_seq,
        close_time: header.scp_value.close_time.0 as i64,
        protocol_version: header.ledger_version,
        transactions,
    }
}

/// V0 ledgers predate Soroban entirely; no `InvokeHostFunction` operation
/// can appear in one, so envelopes are walked only far enough to produce a
/// stable transaction shell (index, best-effort hash).
fn flat_envelopes_v0(tx_set: &xdr::TransactionSet) -> Vec<TransactionEnvelope> {
    tx_set.txs.iter().cloned().collect()
}

/// Walks a `GeneralizedTransactionSet`'s classic (`V0`) phase components in
/// order. A protocol-23 parallel-execution phase (`V1`) is not walked here;
/// transactions in that phase simply decode with zero operations rather
/// than panicking (see DESIGN.md).
fn flat_envelopes_generalized(tx_set: &GeneralizedTransactionSet) -> Vec<TransactionEnvelope> {
    let GeneralizedTransactionSet::V1(set) = tx_set;
    let mut out = Vec::new();
    for phase in set.phases.iter() {
        match phase {
            TransactionPhase::V0(components) => {
                for component in components.iter() {
                    let TxSetComponent::TxsetCompTxsMaybeDiscountedFee(c) = component;
                    out.extend(c.txs.iter().cloned());
                }
            }
            TransactionPhase::V1(_) => {
                tracing::debug!("parallel-execution transaction phase not walked by codec");
            }
        }
    }
    out
}

fn envelope_source_account(envelope: &TransactionEnvelope) -> Option<String> {
    match envelope {
        TransactionEnvelope::TxV0(e) => Some(muxed_v0_to_strkey(&e.tx.source_account_ed25519)),
        TransactionEnvelope::Tx(e) => Some(muxed_to_strkey(&e.tx.source_account)),
        TransactionEnvelope::TxFeeBump(e) => Some(muxed_to_strkey(&e.tx.fee_source)),
    }
}

fn muxed_v0_to_strkey(key: &xdr::Uint256) -> String {
    crate::value::encode_account_id(&key.0)
}

fn muxed_to_strkey(account: &xdr::MuxedAccount) -> String {
    match account {
        xdr::MuxedAccount::Ed25519(key) => crate::value::encode_account_id(&key.0),
        xdr::MuxedAccount::MuxedEd25519(m) => crate::value::encode_account_id(&m.ed25519.0),
    }
}

fn envelope_type_of(envelope: &TransactionEnvelope) -> EnvelopeType {
    match envelope {
        TransactionEnvelope::TxV0(_) => EnvelopeType::V0,
        TransactionEnvelope::Tx(_) => EnvelopeType::V1,
        TransactionEnvelope::TxFeeBump(_) => EnvelopeType::FeeBump,
    }
}

fn envelope_operations(envelope: &TransactionEnvelope) -> Vec<XdrOperation> {
    match envelope {
        TransactionEnvelope::TxV0(e) => e.tx.operations.to_vec(),
        TransactionEnvelope::Tx(e) => e.tx.operations.to_vec(),
        TransactionEnvelope::TxFeeBump(e) => match &e.tx.inner_tx {
            xdr::FeeBumpTransactionInnerTx::Tx(inner) => inner.tx.operations.to_vec(),
        },
    }
}

/// Transaction-level Soroban footprint (read-only + read-write contract
/// data keys), used to resolve `ExtendFootprintTtl` targets (§4.5a).
fn envelope_footprint_keys(envelope: &TransactionEnvelope) -> Vec<LedgerKey> {
    let ext = match envelope {
        TransactionEnvelope::TxV0(_) => return Vec::new(),
        TransactionEnvelope::Tx(e) => &e.tx.ext,
        TransactionEnvelope::TxFeeBump(e) => match &e.tx.inner_tx {
            xdr::FeeBumpTransactionInnerTx::Tx(inner) => &inner.tx.ext,
        },
    };
    match ext {
        xdr::TransactionExt::V1(soroban_data) => {
            let footprint = &soroban_data.resources.footprint;
            footprint
                .read_only
                .iter()
                .chain(footprint.read_write.iter())
                .cloned()
                .collect()
        }
        _ => Vec::new(),
    }
}

fn decode_transaction(
    index: u32,
    envelope: Option<&TransactionEnvelope>,
    fallback_hash: String,
    tx_meta: &TransactionMeta,
    result: Option<&TransactionResultResult>,
) -> Transaction {
    let envelope_type = envelope.map(envelope_type_of).unwrap_or(EnvelopeType::V1);
    let source_account = envelope.and_then(envelope_source_account);
    let footprint_keys = envelope.map(envelope_footprint_keys).unwrap_or_default();

    let xdr_operations = envelope.map(envelope_operations).unwrap_or_default();
    let operations = xdr_operations
        .iter()
        .enumerate()
        .map(|(op_idx, op)| decode_operation(op_idx as u32, op, &footprint_keys))
        .collect();

    let results = result.map(decode_results);
    let post_exec_meta = decode_post_exec_meta(tx_meta).map(|mut meta| {
        assign_diagnostic_event_ops(&mut meta, &operations);
        meta
    });

    Transaction {
        index,
        hash: fallback_hash,
        envelope_type,
        source_account,
        operations,
        results,
        post_exec_meta,
    }
}

/// The raw XDR carries one flat `diagnostic_events` list per transaction,
/// not grouped by operation (§4.2). Most transactions invoke a single host
/// function, so the common case — exactly one `InvokeHostFunction`
/// operation — assigns every event to it unambiguously. With more than one
/// such operation, events are split across them in order as a best effort.
fn assign_diagnostic_event_ops(meta: &mut PostExecMeta, operations: &[Operation]) {
    let invoke_indices: Vec<u32> = operations
        .iter()
        .filter(|op| matches!(op.body, OperationBody::InvokeHostFunction(_)))
        .map(|op| op.index)
        .collect();

    match invoke_indices.as_slice() {
        [] => {}
        [single] => {
            for event in meta.diagnostic_events.iter_mut() {
                event.op_index = *single;
            }
        }
        many => {
            let per_op = (meta.diagnostic_events.len() / many.len()).max(1);
            for (i, event) in meta.diagnostic_events.iter_mut().enumerate() {
                let op_pos = (i / per_op).min(many.len() - 1);
                event.op_index = many[op_pos];
            }
        }
    }
}

fn decode_results(result: &TransactionResultResult) -> Vec<OperationResult> {
    match result {
        TransactionResultResult::TxSuccess(ops) | TransactionResultResult::TxFailed(ops) => ops
            .iter()
            .map(|op_result| match op_result {
                XdrOperationResult::OpInner(OperationResultTr::InvokeHostFunction(inner)) => {
                    OperationResult::InvokeHostFunction {
                        success: matches!(
                            inner,
                            xdr::InvokeHostFunctionResult::Success(_)
                        ),
                    }
                }
                _ => OperationResult::Other,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_operation(index: u32, op: &XdrOperation, footprint_keys: &[LedgerKey]) -> Operation {
    let source_account = op.source_account.as_ref().map(muxed_to_strkey);

    let body = match &op.body {
        XdrOperationBody::InvokeHostFunction(invoke_op) => {
            OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: decode_host_function(&invoke_op.host_function),
            })
        }
        XdrOperationBody::ExtendFootprintTtl(ext_op) => {
            OperationBody::ExtendFootprintTtl(ExtendFootprintTtlOp {
                extend_to: ext_op.extend_to,
                footprint_keys: footprint_keys
                    .iter()
                    .filter_map(contract_data_key)
                    .collect(),
            })
        }
        _ => OperationBody::Other,
    };

    Operation {
        index,
        source_account,
        body,
    }
}

fn contract_data_key(key: &LedgerKey) -> Option<ContractDataKey> {
    match key {
        LedgerKey::ContractData(cd) => Some(ContractDataKey {
            contract_id: address_to_contract_id(&cd.contract),
            key: cd.key.clone(),
        }),
        _ => None,
    }
}

fn address_to_contract_id(addr: &ScAddress) -> Option<String> {
    match addr {
        ScAddress::Contract(_) => Some(encode_address(addr)),
        ScAddress::Account(_) => None,
    }
}

fn decode_host_function(hf: &XdrHostFunction) -> HostFunction {
    match hf {
        XdrHostFunction::InvokeContract(args) => HostFunction::InvokeContract {
            contract_id: encode_address(&args.contract_address),
            function_name: args.function_name.to_vec(),
            args: args.args.to_vec(),
        },
        XdrHostFunction::CreateContract(_args) => HostFunction::CreateContract {
            contract_id: None,
            constructor_args: Vec::new(),
        },
        XdrHostFunction::CreateContractV2(args) => HostFunction::CreateContract {
            contract_id: None,
            constructor_args: args.constructor_args.to_vec(),
        },
        XdrHostFunction::UploadContractWasm(wasm) => HostFunction::UploadWasm {
            wasm_size: wasm.len() as u32,
            wasm_hash: None,
        },
    }
}

fn decode_post_exec_meta(tx_meta: &TransactionMeta) -> Option<PostExecMeta> {
    match tx_meta {
        TransactionMeta::V3(v3) => decode_post_exec_meta_v3(v3),
        TransactionMeta::V4(v4) => decode_post_exec_meta_v4(v4),
        _ => None,
    }
}

fn decode_post_exec_meta_v3(v3: &TransactionMetaV3) -> Option<PostExecMeta> {
    let soroban = v3.soroban_meta.as_ref()?;

    let diagnostic_events = soroban
        .diagnostic_events
        .iter()
        .map(|de| DiagnosticEvent {
            op_index: 0,
            contract_id: contract_event_id(&de.event),
            topics: contract_event_topics(&de.event),
            data: contract_event_data(&de.event),
            in_successful_contract_call: de.in_successful_contract_call,
        })
        .collect();

    let per_operation_changes = v3
        .operations
        .iter()
        .enumerate()
        .map(|(idx, op_meta)| OperationChanges {
            op_index: idx as u32,
            changes: decode_ledger_entry_changes(&op_meta.changes),
        })
        .collect();

    Some(PostExecMeta {
        diagnostic_events,
        fee_ext: fee_ext(&soroban.ext),
        per_operation_changes,
    })
}

fn decode_post_exec_meta_v4(v4: &TransactionMetaV4) -> Option<PostExecMeta> {
    let soroban = v4.soroban_meta.as_ref();

    let mut diagnostic_events: Vec<DiagnosticEvent> = Vec::new();
    if let Some(soroban) = soroban {
        diagnostic_events.extend(soroban.diagnostic_events.iter().map(|de| DiagnosticEvent {
            op_index: 0,
            contract_id: contract_event_id(&de.event),
            topics: contract_event_topics(&de.event),
            data: contract_event_data(&de.event),
            in_successful_contract_call: de.in_successful_contract_call,
        }));
    }

    let per_operation_changes = v4
        .operations
        .iter()
        .enumerate()
        .map(|(idx, op_meta)| OperationChanges {
            op_index: idx as u32,
            changes: decode_ledger_entry_changes(&op_meta.changes),
        })
        .collect();

    Some(PostExecMeta {
        diagnostic_events,
        fee_ext: soroban.and_then(|s| fee_ext(&s.ext)),
        per_operation_changes,
    })
}

fn fee_ext(ext: &xdr::ExtensionPoint) -> Option<FeeExt> {
    match ext {
        xdr::ExtensionPoint::V0 => None,
    }
}

fn contract_event_id(event: &xdr::ContractEvent) -> Option<String> {
    event
        .contract_id
        .as_ref()
        .map(|id| crate::value::encode_contract_id(&id.0 .0))
}

fn contract_event_topics(event: &xdr::ContractEvent) -> Vec<xdr::ScVal> {
    match &event.body {
        ContractEventBody::V0(v0) => v0.topics.to_vec(),
    }
}

fn contract_event_data(event: &xdr::ContractEvent) -> xdr::ScVal {
    match &event.body {
        ContractEventBody::V0(v0) => v0.data.clone(),
    }
}

fn decode_ledger_entry_changes(changes: &xdr::LedgerEntryChanges) -> Vec<LedgerEntryChange> {
    // Real XDR encodes a changed entry as a flat sequence: a bare `Created`
    // or protocol-23 `Restored` entry stands alone; an update or removal is
    // preceded by a `State` entry carrying the pre-image. We pair them up
    // here, carrying each entry's `last_modified_ledger_seq` alongside its
    // data since `ttl::extract_automatic` compares pre/post on that field.
    let mut out = Vec::new();
    let mut pending_pre: Option<(u32, XdrEntryData)> = None;

    for change in changes.iter() {
        match change {
            XdrLedgerEntryChange::State(entry) => {
                pending_pre = Some((entry.last_modified_ledger_seq, entry.data.clone()));
            }
            XdrLedgerEntryChange::Created(entry) => {
                if let Some(converted) = convert_entry_change(
                    None,
                    Some((entry.last_modified_ledger_seq, &entry.data)),
                    false,
                ) {
                    out.push(converted);
                }
                pending_pre = None;
            }
            XdrLedgerEntryChange::Restored(entry) => {
                if let Some(converted) = convert_entry_change(
                    None,
                    Some((entry.last_modified_ledger_seq, &entry.data)),
                    true,
                ) {
                    out.push(converted);
                }
                pending_pre = None;
            }
            XdrLedgerEntryChange::Updated(entry) => {
                if let Some(converted) = convert_entry_change(
                    pending_pre.as_ref().map(|(seq, data)| (*seq, data)),
                    Some((entry.last_modified_ledger_seq, &entry.data)),
                    false,
                ) {
                    out.push(converted);
                }
                pending_pre = None;
            }
            XdrLedgerEntryChange::Removed(key) => {
                if let Some(converted) = convert_entry_change_removed(
                    pending_pre.as_ref().map(|(seq, data)| (*seq, data)),
                    key,
                ) {
                    out.push(converted);
                }
                pending_pre = None;
            }
        }
    }

    out
}

fn entry_kind_of(data: &XdrEntryData) -> LedgerEntryKind {
    match data {
        XdrEntryData::ContractData(_) => LedgerEntryKind::ContractData,
        XdrEntryData::ContractCode(_) => LedgerEntryKind::ContractCode,
        _ => LedgerEntryKind::Other,
    }
}

fn entry_data_of(last_modified_ledger_seq: u32, data: &XdrEntryData) -> Option<LedgerEntryData> {
    match data {
        XdrEntryData::ContractData(cd) => Some(LedgerEntryData {
            contract_id: address_to_contract_id(&cd.contract),
            key: cd.key.clone(),
            value: cd.val.clone(),
            last_modified_ledger_seq,
        }),
        _ => None,
    }
}

fn convert_entry_change(
    pre: Option<(u32, &XdrEntryData)>,
    post: Option<(u32, &XdrEntryData)>,
    restored: bool,
) -> Option<LedgerEntryChange> {
    let kind = post.or(pre).map(|(_, data)| entry_kind_of(data))?;
    if kind != LedgerEntryKind::ContractData {
        return None;
    }
    Some(LedgerEntryChange {
        entry_kind: kind,
        pre: pre.and_then(|(seq, data)| entry_data_of(seq, data)),
        post: post.and_then(|(seq, data)| entry_data_of(seq, data)),
        restored,
    })
}

fn convert_entry_change_removed(
    pre: Option<(u32, &XdrEntryData)>,
    _key: &LedgerKey,
) -> Option<LedgerEntryChange> {
    let (seq, data) = pre?;
    if entry_kind_of(data) != LedgerEntryKind::ContractData {
        return None;
    }
    Some(LedgerEntryChange {
        entry_kind: LedgerEntryKind::ContractData,
        pre: entry_data_of(seq, data),
        post: None,
        restored: false,
    })
}
