//! Sub-invocation (contract-to-contract call) discovery (§4.4).
//!
//! Best-effort and advisory per the spec's open question: the host emits a
//! `fn_call` / `fn_return` diagnostic-event pair around every nested
//! invocation when diagnostics are enabled. The first `fn_call` in an
//! operation's event list is the outer call itself and is not a sub-call;
//! any further `fn_call` events are treated as discovered sub-invocations.
//! When the deployed codec or network configuration does not surface these
//! system events, this simply returns an empty list.

use crate::model::{DiagnosticEventOut, SubCall, Value};

const TOPIC_FN_CALL: &str = "fn_call";
const TOPIC_FN_RETURN: &str = "fn_return";

pub fn extract(events: &[DiagnosticEventOut], outer_contract_id: &str) -> Vec<SubCall> {
    let mut calls = Vec::new();
    let mut seen_outer_call = false;

    for (i, event) in events.iter().enumerate() {
        let Some(first_topic) = event.topics.first() else {
            continue;
        };
        if first_topic.as_pattern_string() != TOPIC_FN_CALL {
            continue;
        }
        if !seen_outer_call {
            seen_outer_call = true;
            continue;
        }

        let to_contract = match event.topics.get(1) {
            Some(Value::Address(addr)) => addr.clone(),
            Some(other) => other.as_pattern_string(),
            None => continue,
        };
        let function = event
            .topics
            .get(2)
            .map(Value::as_pattern_string)
            .unwrap_or_default();

        let successful = !matching_return_is_error(&events[i + 1..], &function);

        calls.push(SubCall {
            from_contract: outer_contract_id.to_string(),
            to_contract,
            function,
            successful,
        });
    }

    calls
}

fn matching_return_is_error(rest: &[DiagnosticEventOut], function: &str) -> bool {
    rest.iter().any(|event| {
        event.topics.first().map(Value::as_pattern_string).as_deref() == Some(TOPIC_FN_RETURN)
            && event
                .topics
                .get(1)
                .map(Value::as_pattern_string)
                .as_deref()
                == Some(function)
            && matches!(event.data, Value::Other(_))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(topics: Vec<Value>, data: Value) -> DiagnosticEventOut {
        DiagnosticEventOut {
            contract_id: None,
            topics,
            data,
            in_successful_contract_call: true,
        }
    }

    #[test]
    fn no_fn_call_events_yields_empty() {
        let events = vec![event(vec![Value::Symbol("other".into())], Value::Void)];
        assert!(extract(&events, "C_OUTER").is_empty());
    }

    #[test]
    fn first_fn_call_is_not_a_sub_call() {
        let events = vec![event(
            vec![
                Value::Symbol("fn_call".into()),
                Value::Address("C_OUTER".into()),
                Value::Symbol("transfer".into()),
            ],
            Value::Void,
        )];
        assert!(extract(&events, "C_OUTER").is_empty());
    }

    #[test]
    fn nested_fn_call_is_a_sub_call() {
        let events = vec![
            event(
                vec![
                    Value::Symbol("fn_call".into()),
                    Value::Address("C_OUTER".into()),
                    Value::Symbol("transfer".into()),
                ],
                Value::Void,
            ),
            event(
                vec![
                    Value::Symbol("fn_call".into()),
                    Value::Address("C_INNER".into()),
                    Value::Symbol("mint".into()),
                ],
                Value::Void,
            ),
        ];
        let subs = extract(&events, "C_OUTER");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].to_contract, "C_INNER");
        assert!(subs[0].successful);
    }
}
