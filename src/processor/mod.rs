//! Ledger Processor (§4.1): the ledger-processing state machine. Walks a
//! decoded ledger's transactions and operations, classifies each
//! `InvokeHostFunction` operation, and materializes `Event`s while applying
//! early-reject filters before any value conversion or meta walking.

pub mod diagnostics;
pub mod state_changes;
pub mod sub_calls;
pub mod ttl;

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::cancel::CancelToken;
use crate::codec::{Codec, CodecError};
use crate::metrics::{EventVariant, MetricsRegistry};
use crate::model::{
    ArchiveRestoration, ContractSourceKind, DataSource, Event, EventBody, EventMeta,
    ExtendFootprintTtlOp, FilterSpec, HostFunction, Ledger, LedgerEntryChange, Operation,
    OperationBody, OperationChanges, OperationResult, PENDING_CONTRACT_ID, RawLedger,
    Transaction, TypeFilter,
};
use crate::protocol23::FeatureGate;
use crate::value;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("ledger {sequence}: decode failed")]
    DecodeFailed {
        sequence: u32,
        #[source]
        source: CodecError,
    },
}

pub struct LedgerProcessor {
    feature_gate: FeatureGate,
    metrics: Arc<MetricsRegistry>,
}

impl LedgerProcessor {
    pub fn new(feature_gate: FeatureGate, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            feature_gate,
            metrics,
        }
    }

    /// `ProcessLedger(ctx, RawLedger, FilterSpec) -> sequence of Event`
    /// (§4.1). Materialized eagerly into a `Vec` — the only suspension
    /// points the spec requires within a single ledger (between operations,
    /// between transactions) are honored via `cancel` checks, not async
    /// yields, since a ledger's worth of events is bounded and cheap to
    /// build in memory.
    pub fn process_ledger(
        &self,
        raw: &RawLedger,
        codec: &dyn Codec,
        filter: &FilterSpec,
        cancel: &CancelToken,
    ) -> Result<Vec<Event>, ProcessorError> {
        let started = Instant::now();

        let ledger = codec.decode(raw).map_err(|source| {
            self.metrics.record_ledger_failed(raw.sequence);
            ProcessorError::DecodeFailed {
                sequence: raw.sequence,
                source,
            }
        })?;

        // Data source is a ledger-level property (§4.7): archive iff any
        // transaction in the ledger carries a restoration change. Computed
        // once, up front, so every event from this ledger carries the same
        // value rather than only the operation whose own changes happen to
        // hold the restoration.
        let ledger_data_source = if self.feature_gate.is_active(&ledger) {
            let all_changes: Vec<OperationChanges> = ledger
                .transactions
                .iter()
                .filter_map(|tx| tx.post_exec_meta.as_ref())
                .flat_map(|m| m.per_operation_changes.iter().cloned())
                .collect();
            Some(self.feature_gate.data_source(&ledger, &all_changes))
        } else {
            None
        };

        let mut events = Vec::new();

        'tx_loop: for tx in &ledger.transactions {
            if cancel.is_cancelled() {
                break;
            }

            let footprint_ops: Vec<&ExtendFootprintTtlOp> = tx
                .operations
                .iter()
                .filter_map(|op| match &op.body {
                    OperationBody::ExtendFootprintTtl(ext) => Some(ext),
                    _ => None,
                })
                .collect();

            for op in &tx.operations {
                if cancel.is_cancelled() {
                    break 'tx_loop;
                }

                let OperationBody::InvokeHostFunction(invoke) = &op.body else {
                    continue;
                };

                let invoking_account = op
                    .source_account
                    .clone()
                    .or_else(|| tx.source_account.clone())
                    .unwrap_or_default();
                let success = success_for(tx, op);

                if filter.early_reject(success, &invoking_account) {
                    self.metrics.record_filtered_out();
                    continue;
                }

                let type_kind = match &invoke.host_function {
                    HostFunction::InvokeContract { .. } => TypeFilter::Call,
                    HostFunction::CreateContract { .. } => TypeFilter::Create,
                    HostFunction::UploadWasm { .. } => TypeFilter::Upload,
                };
                if !filter.matches_type(type_kind) {
                    self.metrics.record_filtered_out();
                    continue;
                }

                let Some(event) = self.build_event(
                    &ledger,
                    tx,
                    op,
                    invoke.host_function.clone(),
                    &invoking_account,
                    success,
                    &footprint_ops,
                    filter,
                    ledger_data_source,
                ) else {
                    self.metrics.record_filtered_out();
                    continue;
                };

                if !filter.matches(&event) {
                    self.metrics.record_filtered_out();
                    continue;
                }

                self.metrics.record_event(variant_of(&event));
                events.push(event);
            }
        }

        events.sort_by_key(Event::order_key);
        self.metrics
            .record_ledger_processed(ledger.sequence, started.elapsed());
        Ok(events)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_event(
        &self,
        ledger: &Ledger,
        tx: &Transaction,
        op: &Operation,
        host_function: HostFunction,
        invoking_account: &str,
        success: bool,
        footprint_ops: &[&ExtendFootprintTtlOp],
        filter: &FilterSpec,
        data_source: Option<DataSource>,
    ) -> Option<Event> {
        let body = match host_function {
            HostFunction::InvokeContract {
                contract_id,
                function_name,
                args,
            } => {
                if !filter.matches_contract_id(&contract_id) {
                    return None;
                }
                let function_name = value::function_name_to_string(&function_name);
                if !filter.matches_function_name(&function_name) {
                    return None;
                }

                let op_changes: Vec<LedgerEntryChange> = tx
                    .post_exec_meta
                    .as_ref()
                    .and_then(|m| m.per_operation_changes.iter().find(|oc| oc.op_index == op.index))
                    .map(|oc| oc.changes.clone())
                    .unwrap_or_default();

                let arguments = args.iter().map(value::convert).collect();
                let diagnostic_events = tx
                    .post_exec_meta
                    .as_ref()
                    .map(|m| diagnostics::extract(&m.diagnostic_events, op.index, Some(&contract_id)))
                    .unwrap_or_default();
                let sub_calls = sub_calls::extract(&diagnostic_events, &contract_id);

                let state_changes::Extracted {
                    state_changes,
                    restorations,
                } = state_changes::extract(&op_changes, ledger.sequence);

                let mut ttl_extensions = ttl::extract_automatic(&op_changes);
                ttl::fold_footprint_ops(&mut ttl_extensions, footprint_ops);

                return Some(Event {
                    meta: EventMeta {
                        ledger_sequence: ledger.sequence,
                        closed_at: ledger.close_time,
                        tx_hash: tx.hash.clone(),
                        tx_index: tx.index,
                        op_index: op.index,
                        successful: success,
                        data_source,
                        archive_restorations: restorations,
                    },
                    body: EventBody::ContractCall {
                        contract_id,
                        invoking_account: invoking_account.to_string(),
                        function_name,
                        arguments,
                        diagnostic_events,
                        sub_calls,
                        state_changes,
                        ttl_extensions,
                    },
                });
            }
            HostFunction::CreateContract {
                contract_id,
                constructor_args,
            } => EventBody::CreateContract {
                contract_id: contract_id.unwrap_or_else(|| PENDING_CONTRACT_ID.to_string()),
                creator_account: invoking_account.to_string(),
                source_kind: ContractSourceKind::SourceAccount,
                constructor_args: constructor_args.iter().map(value::convert).collect(),
            },
            HostFunction::UploadWasm {
                wasm_size,
                wasm_hash,
            } => EventBody::UploadWasm {
                uploader_account: invoking_account.to_string(),
                wasm_hash: wasm_hash.unwrap_or([0u8; 32]),
                wasm_size,
            },
        };

        let restorations: Vec<ArchiveRestoration> = Vec::new();
        Some(Event {
            meta: EventMeta {
                ledger_sequence: ledger.sequence,
                closed_at: ledger.close_time,
                tx_hash: tx.hash.clone(),
                tx_index: tx.index,
                op_index: op.index,
                successful: success,
                data_source,
                archive_restorations: restorations,
            },
            body,
        })
    }
}

fn success_for(tx: &Transaction, op: &Operation) -> bool {
    let Some(results) = &tx.results else {
        return false;
    };
    match results.get(op.index as usize) {
        Some(OperationResult::InvokeHostFunction { success }) => *success,
        _ => false,
    }
}

fn variant_of(event: &Event) -> EventVariant {
    match event.body {
        EventBody::ContractCall { .. } => EventVariant::ContractCall,
        EventBody::CreateContract { .. } => EventVariant::CreateContract,
        EventBody::UploadWasm { .. } => EventVariant::UploadWasm,
    }
}
