//! TTL-extension extraction (§4.5).
//!
//! Two sources, both folded into the `ttl_extensions` of whichever
//! `ContractCall` event owns the touched per-operation changes — the event
//! model has no standalone `ExtendFootprintTtl` event variant, so a
//! footprint-sourced extension with no matching touched key in this
//! operation's own changes has nothing to attach to and is dropped (see
//! DESIGN.md for this resolution of the spec's ambiguity here).

use crate::model::{ExtendFootprintTtlOp, LedgerEntryChange, LedgerEntryKind, TtlExtension};
use crate::value;

/// (b) automatic extensions: a contract-data entry whose value did not
/// change but whose `last_modified_ledger_seq` advanced.
pub fn extract_automatic(changes: &[LedgerEntryChange]) -> Vec<TtlExtension> {
    changes
        .iter()
        .filter(|c| c.entry_kind == LedgerEntryKind::ContractData)
        .filter_map(|c| {
            let pre = c.pre.as_ref()?;
            let post = c.post.as_ref()?;
            if post.last_modified_ledger_seq <= pre.last_modified_ledger_seq {
                return None;
            }
            let same_value = value::convert(&pre.value) == value::convert(&post.value);
            if !same_value {
                return None;
            }
            let contract_id = post.contract_id.clone().or_else(|| pre.contract_id.clone())?;
            Some(TtlExtension {
                contract_id,
                key: value::convert(&post.key),
                old_ttl: pre.last_modified_ledger_seq,
                new_ttl: post.last_modified_ledger_seq,
            })
        })
        .collect()
}

/// (a) explicit `ExtendFootprintTtl` operations in the same transaction:
/// overrides `new_ttl` to the operation's declared `extend_to` for any key
/// already present in `base` (matched by contract ID and key string form).
pub fn fold_footprint_ops(base: &mut Vec<TtlExtension>, footprint_ops: &[&ExtendFootprintTtlOp]) {
    for op in footprint_ops {
        for fk in &op.footprint_keys {
            let Some(contract_id) = &fk.contract_id else {
                continue;
            };
            let key = value::convert(&fk.key);
            if let Some(existing) = base
                .iter_mut()
                .find(|t| &t.contract_id == contract_id && t.key.as_pattern_string() == key.as_pattern_string())
            {
                existing.new_ttl = op.extend_to;
            } else {
                tracing::debug!(
                    contract_id = %contract_id,
                    "extend-footprint-ttl op has no matching touched key in this operation; dropped"
                );
            }
        }
    }
}
