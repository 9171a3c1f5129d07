//! Shared XDR fixture builder for integration tests, grounded on the
//! teacher's `tests/cold_fetch_test.rs` construction of a `LedgerCloseMeta`
//! by hand, extended with a real `InvokeHostFunction` operation and
//! envelope the way `ledger-meta-factory`'s `Transition::add_soroban_event`
//! wires an envelope into a generalized transaction set's phases.

use stellar_xdr::curr::*;

/// Builds the XDR bytes for a ledger with a single transaction invoking
/// `function_name` on `contract_hash`, successfully, with one diagnostic
/// event attached.
pub fn build_contract_call_ledger(
    ledger_seq: u32,
    contract_hash: [u8; 32],
    function_name: &str,
) -> Vec<u8> {
    let contract_address = ScAddress::Contract(ContractId(Hash(contract_hash)));

    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
        tx: Transaction {
            source_account: MuxedAccount::Ed25519(Uint256([9u8; 32])),
            fee: 10_000,
            seq_num: SequenceNumber(1),
            cond: Preconditions::None,
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                    auth: VecM::default(),
                    host_function: HostFunction::InvokeContract(InvokeContractArgs {
                        contract_address: contract_address.clone(),
                        function_name: ScSymbol(function_name.try_into().unwrap()),
                        args: vec![ScVal::Symbol(ScSymbol("alice".try_into().unwrap()))]
                            .try_into()
                            .unwrap(),
                    }),
                }),
            }]
            .try_into()
            .unwrap(),
            ext: TransactionExt::V0,
        },
        signatures: VecM::default(),
    });

    let phases = vec![TransactionPhase::V0(
        vec![TxSetComponent::TxsetCompTxsMaybeDiscountedFee(
            TxSetComponentTxsMaybeDiscountedFee {
                base_fee: None,
                txs: vec![envelope].try_into().unwrap(),
            },
        )]
        .try_into()
        .unwrap(),
    )]
    .try_into()
    .unwrap();

    let tx_set = GeneralizedTransactionSet::V1(TransactionSetV1 {
        previous_ledger_hash: Hash([0; 32]),
        phases,
    });

    let diagnostic_event = DiagnosticEvent {
        in_successful_contract_call: true,
        event: ContractEvent {
            ext: ExtensionPoint::V0,
            contract_id: Some(ContractId(Hash(contract_hash))),
            type_: ContractEventType::Contract,
            body: ContractEventBody::V0(ContractEventV0 {
                topics: vec![ScVal::Symbol(ScSymbol("transfer".try_into().unwrap()))]
                    .try_into()
                    .unwrap(),
                data: ScVal::I128(Int128Parts { hi: 0, lo: 1_000 }),
            }),
        },
    };

    let trm = TransactionResultMeta {
        result: TransactionResultPair {
            transaction_hash: Hash([1; 32]),
            result: TransactionResult {
                fee_charged: 100,
                result: TransactionResultResult::TxSuccess(
                    vec![OperationResult::OpInner(OperationResultTr::InvokeHostFunction(
                        InvokeHostFunctionResult::Success(ScVal::Void),
                    ))]
                    .try_into()
                    .unwrap(),
                ),
                ext: TransactionResultExt::V0,
            },
        },
        fee_processing: LedgerEntryChanges(VecM::default()),
        tx_apply_processing: TransactionMeta::V3(TransactionMetaV3 {
            ext: ExtensionPoint::V0,
            tx_changes_before: LedgerEntryChanges(VecM::default()),
            operations: vec![OperationMeta {
                changes: LedgerEntryChanges(VecM::default()),
            }]
            .try_into()
            .unwrap(),
            tx_changes_after: LedgerEntryChanges(VecM::default()),
            soroban_meta: Some(SorobanTransactionMeta {
                ext: SorobanTransactionMetaExt::V0,
                events: VecM::default(),
                return_value: ScVal::Void,
                diagnostic_events: vec![diagnostic_event].try_into().unwrap(),
            }),
        }),
    };

    let header = LedgerHeader {
        ledger_version: 23,
        previous_ledger_hash: Hash([0; 32]),
        scp_value: StellarValue {
            tx_set_hash: Hash([0; 32]),
            close_time: TimePoint(1_700_000_000),
            upgrades: VecM::default(),
            ext: StellarValueExt::Basic,
        },
        tx_set_result_hash: Hash([0; 32]),
        bucket_list_hash: Hash([0; 32]),
        ledger_seq,
        total_coins: 0,
        fee_pool: 0,
        inflation_seq: 0,
        id_pool: 0,
        base_fee: 100,
        base_reserve: 5_000_000,
        max_tx_set_size: 100,
        skip_list: [Hash([0; 32]), Hash([0; 32]), Hash([0; 32]), Hash([0; 32])],
        ext: LedgerHeaderExt::V0,
    };

    let meta = LedgerCloseMeta::V1(LedgerCloseMetaV1 {
        ext: LedgerCloseMetaExt::V0,
        ledger_header: LedgerHeaderHistoryEntry {
            hash: Hash([0; 32]),
            header,
            ext: LedgerHeaderHistoryEntryExt::V0,
        },
        tx_set,
        tx_processing: vec![trm].try_into().unwrap(),
        upgrades_processing: VecM::default(),
        scp_info: VecM::default(),
        total_byte_size_of_live_soroban_state: 0,
        evicted_keys: VecM::default(),
        unused: VecM::default(),
    });

    meta.to_xdr(Limits::none()).unwrap()
}
