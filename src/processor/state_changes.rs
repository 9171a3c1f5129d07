//! State-change and archive-restoration extraction (§4.3).

use crate::model::{
    ArchiveRestoration, ChangeKind, LedgerEntryChange, LedgerEntryKind, StateChange,
    StateChangeOp,
};
use crate::value;

pub struct Extracted {
    pub state_changes: Vec<StateChange>,
    pub restorations: Vec<ArchiveRestoration>,
}

pub fn extract(changes: &[LedgerEntryChange], ledger_sequence: u32) -> Extracted {
    let mut state_changes = Vec::new();
    let mut restorations = Vec::new();

    for change in changes {
        if change.entry_kind != LedgerEntryKind::ContractData {
            continue;
        }

        let contract_id = change
            .post
            .as_ref()
            .and_then(|d| d.contract_id.clone())
            .or_else(|| change.pre.as_ref().and_then(|d| d.contract_id.clone()));
        let Some(contract_id) = contract_id else {
            tracing::debug!("state change dropped: unresolvable contract address");
            continue;
        };

        let key = change
            .post
            .as_ref()
            .or(change.pre.as_ref())
            .map(|d| value::convert(&d.key))
            .unwrap_or(crate::model::Value::Void);

        match change.kind() {
            ChangeKind::Created => {
                state_changes.push(StateChange {
                    contract_id,
                    key,
                    op: StateChangeOp::Created,
                    old_value: None,
                    new_value: change.post.as_ref().map(|d| value::convert(&d.value)),
                });
            }
            ChangeKind::Restored => {
                let restored_key = key.clone();
                state_changes.push(StateChange {
                    contract_id: contract_id.clone(),
                    key,
                    op: StateChangeOp::Created,
                    old_value: None,
                    new_value: change.post.as_ref().map(|d| value::convert(&d.value)),
                });
                restorations.push(ArchiveRestoration {
                    contract_id,
                    key: restored_key,
                    restored_at_ledger: ledger_sequence,
                });
            }
            ChangeKind::Updated => {
                state_changes.push(StateChange {
                    contract_id,
                    key,
                    op: StateChangeOp::Updated,
                    old_value: change.pre.as_ref().map(|d| value::convert(&d.value)),
                    new_value: change.post.as_ref().map(|d| value::convert(&d.value)),
                });
            }
            ChangeKind::Removed => {
                state_changes.push(StateChange {
                    contract_id,
                    key,
                    op: StateChangeOp::Deleted,
                    old_value: change.pre.as_ref().map(|d| value::convert(&d.value)),
                    new_value: None,
                });
            }
        }
    }

    Extracted {
        state_changes,
        restorations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LedgerEntryData;
    use stellar_xdr::curr::ScVal;

    fn entry(contract_id: &str) -> LedgerEntryData {
        LedgerEntryData {
            contract_id: Some(contract_id.to_string()),
            key: ScVal::Void,
            value: ScVal::Void,
            last_modified_ledger_seq: 1,
        }
    }

    #[test]
    fn restored_entry_yields_created_state_change_and_restoration() {
        let changes = vec![LedgerEntryChange {
            entry_kind: LedgerEntryKind::ContractData,
            pre: None,
            post: Some(entry("C1")),
            restored: true,
        }];
        let extracted = extract(&changes, 4000);
        assert_eq!(extracted.state_changes.len(), 1);
        assert_eq!(extracted.state_changes[0].op, StateChangeOp::Created);
        assert_eq!(extracted.restorations.len(), 1);
        assert_eq!(extracted.restorations[0].restored_at_ledger, 4000);
    }

    #[test]
    fn unresolvable_contract_id_is_dropped() {
        let changes = vec![LedgerEntryChange {
            entry_kind: LedgerEntryKind::ContractData,
            pre: None,
            post: Some(LedgerEntryData {
                contract_id: None,
                ..entry("unused")
            }),
            restored: false,
        }];
        assert!(extract(&changes, 1).state_changes.is_empty());
    }

    #[test]
    fn updated_entry_carries_both_values() {
        let changes = vec![LedgerEntryChange {
            entry_kind: LedgerEntryKind::ContractData,
            pre: Some(entry("C1")),
            post: Some(entry("C1")),
            restored: false,
        }];
        let extracted = extract(&changes, 1);
        assert_eq!(extracted.state_changes[0].op, StateChangeOp::Updated);
    }
}
