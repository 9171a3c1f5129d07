//! Diagnostic-event extraction (§4.2).

use crate::model::{DiagnosticEvent, DiagnosticEventOut};
use crate::value;

/// Converts the diagnostic events already assigned to `op_index` by the
/// codec. A missing per-event contract ID falls back to the containing
/// operation's contract ID, per §4.2.
pub fn extract(
    diagnostic_events: &[DiagnosticEvent],
    op_index: u32,
    operation_contract_id: Option<&str>,
) -> Vec<DiagnosticEventOut> {
    diagnostic_events
        .iter()
        .filter(|de| de.op_index == op_index)
        .map(|de| DiagnosticEventOut {
            contract_id: de
                .contract_id
                .clone()
                .or_else(|| operation_contract_id.map(str::to_string)),
            topics: de.topics.iter().map(value::convert).collect(),
            data: value::convert(&de.data),
            in_successful_contract_call: de.in_successful_contract_call,
        })
        .collect()
}
