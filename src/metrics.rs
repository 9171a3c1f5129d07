//! Metrics Registry. Re-architected per §9 away from a mutex-guarded god
//! object: every counter/gauge is a bare atomic, and the only thing callers
//! ever get back is an immutable snapshot. Nothing in this crate locks to
//! read a counter.
//!
//! Counters are mirrored through the `metrics` facade (teacher's
//! `metrics`/`metrics-exporter-prometheus` dependencies) so the Prometheus
//! `/metrics` route keeps working; the atomics below remain the source of
//! truth read back for the control-plane snapshot.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    ledgers_processed: AtomicU64,
    ledgers_failed: AtomicU64,
    contract_calls: AtomicU64,
    create_contracts: AtomicU64,
    upload_wasms: AtomicU64,
    events_emitted: AtomicU64,
    filtered_out: AtomicU64,
    per_operation_errors: AtomicU64,
    last_processed_ledger: AtomicU32,
    active_sessions: AtomicU64,
    processing_nanos_total: AtomicU64,
}

/// Immutable point-in-time view, the only thing ever handed to a caller.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub ledgers_processed: u64,
    pub ledgers_failed: u64,
    pub contract_calls: u64,
    pub create_contracts: u64,
    pub upload_wasms: u64,
    pub events_emitted: u64,
    pub filtered_out: u64,
    pub per_operation_errors: u64,
    pub last_processed_ledger: u32,
    pub active_sessions: u64,
    pub avg_processing_micros: u64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ledger_processed(&self, sequence: u32, elapsed: Duration) {
        self.ledgers_processed.fetch_add(1, Ordering::Relaxed);
        self.last_processed_ledger.fetch_max(sequence, Ordering::Relaxed);
        self.processing_nanos_total
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        metrics::counter!("ledger_processor_ledgers_processed_total").increment(1);
        metrics::gauge!("ledger_processor_last_processed_ledger").set(sequence as f64);
        metrics::histogram!("ledger_processor_duration_seconds").record(elapsed.as_secs_f64());
    }

    pub fn record_ledger_failed(&self, sequence: u32) {
        self.ledgers_failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ledger_processor_ledgers_failed_total").increment(1);
        tracing::error!(ledger = sequence, "ledger decode failed");
    }

    pub fn record_event(&self, variant: EventVariant) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        match variant {
            EventVariant::ContractCall => {
                self.contract_calls.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("ledger_processor_contract_calls_total").increment(1);
            }
            EventVariant::CreateContract => {
                self.create_contracts.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("ledger_processor_create_contracts_total").increment(1);
            }
            EventVariant::UploadWasm => {
                self.upload_wasms.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("ledger_processor_upload_wasms_total").increment(1);
            }
        }
        metrics::counter!("ledger_processor_events_emitted_total").increment(1);
    }

    pub fn record_filtered_out(&self) {
        self.filtered_out.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ledger_processor_filtered_out_total").increment(1);
    }

    pub fn record_per_operation_error(&self) {
        self.per_operation_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ledger_processor_per_operation_errors_total").increment(1);
    }

    pub fn session_opened(&self) {
        let n = self.active_sessions.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::gauge!("stream_sessions_active").set(n as f64);
    }

    pub fn session_closed(&self) {
        let n = self.active_sessions.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::gauge!("stream_sessions_active").set(n as f64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let processed = self.ledgers_processed.load(Ordering::Relaxed);
        let total_nanos = self.processing_nanos_total.load(Ordering::Relaxed);
        let avg_processing_micros = if processed > 0 {
            (total_nanos / processed) / 1_000
        } else {
            0
        };
        MetricsSnapshot {
            ledgers_processed: processed,
            ledgers_failed: self.ledgers_failed.load(Ordering::Relaxed),
            contract_calls: self.contract_calls.load(Ordering::Relaxed),
            create_contracts: self.create_contracts.load(Ordering::Relaxed),
            upload_wasms: self.upload_wasms.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            filtered_out: self.filtered_out.load(Ordering::Relaxed),
            per_operation_errors: self.per_operation_errors.load(Ordering::Relaxed),
            last_processed_ledger: self.last_processed_ledger.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            avg_processing_micros,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventVariant {
    ContractCall,
    CreateContract,
    UploadWasm,
}
