//! Filter Engine: `FilterSpec` plus its evaluation against a candidate event.
//!
//! Evaluation order follows §4.6: early-reject filters (type, success, IDs,
//! function name, invoking account) run before the full content filter, and
//! the processor is expected to apply the cheapest of these (success-only,
//! invoking-account) even earlier, before any value conversion happens.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::event::{Event, EventBody, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    #[default]
    All,
    Call,
    Create,
    Upload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFilter {
    #[serde(default)]
    pub min_arguments: Option<usize>,
    #[serde(default)]
    pub max_arguments: Option<usize>,
    #[serde(default)]
    pub argument_patterns: Vec<String>,
    #[serde(default)]
    pub required_event_topics: Vec<String>,
    #[serde(default)]
    pub require_state_changes: Option<bool>,
    #[serde(default)]
    pub require_sub_calls: Option<bool>,
    #[serde(default)]
    pub require_ttl_extensions: Option<bool>,
    #[serde(default)]
    pub has_diagnostic_events: Option<bool>,
    #[serde(default)]
    pub has_state_changes: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub start_ledger: u32,
    #[serde(default)]
    pub end_ledger: u32,
    #[serde(default)]
    pub contract_ids: HashSet<String>,
    #[serde(default)]
    pub function_names: HashSet<String>,
    #[serde(default)]
    pub invoking_accounts: HashSet<String>,
    #[serde(default)]
    pub successful_only: bool,
    #[serde(default)]
    pub type_filter: TypeFilter,
    #[serde(default)]
    pub content_filter: Option<ContentFilter>,
}

impl FilterSpec {
    /// The all-pass filter used as the baseline for the subset-invariant
    /// property tests in §8.
    pub fn all_pass() -> Self {
        Self::default()
    }

    /// Cheap pre-filters the processor MUST apply before any value
    /// conversion or meta walking (§4.1 "early-reject discipline").
    pub fn early_reject(&self, successful: bool, invoking_account: &str) -> bool {
        if self.successful_only && !successful {
            return true;
        }
        if !self.invoking_accounts.is_empty() && !self.invoking_accounts.contains(invoking_account)
        {
            return true;
        }
        false
    }

    pub fn matches_type(&self, kind: TypeFilter) -> bool {
        matches!(self.type_filter, TypeFilter::All) || self.type_filter == kind
    }

    pub fn matches_contract_id(&self, contract_id: &str) -> bool {
        self.contract_ids.is_empty() || self.contract_ids.contains(contract_id)
    }

    pub fn matches_function_name(&self, function_name: &str) -> bool {
        self.function_names.is_empty() || self.function_names.contains(function_name)
    }

    /// Full evaluation against an already-built candidate event, applied
    /// after all early-reject checks have passed.
    pub fn matches(&self, event: &Event) -> bool {
        if self.start_ledger != 0 && event.meta.ledger_sequence < self.start_ledger {
            return false;
        }
        if self.end_ledger != 0 && event.meta.ledger_sequence > self.end_ledger {
            return false;
        }
        if self.successful_only && !event.meta.successful {
            return false;
        }

        let type_kind = match &event.body {
            EventBody::ContractCall { .. } => TypeFilter::Call,
            EventBody::CreateContract { .. } => TypeFilter::Create,
            EventBody::UploadWasm { .. } => TypeFilter::Upload,
        };
        if !self.matches_type(type_kind) {
            return false;
        }

        match &event.body {
            EventBody::ContractCall {
                contract_id,
                invoking_account,
                function_name,
                ..
            } => {
                if !self.matches_contract_id(contract_id) {
                    return false;
                }
                if !self.matches_function_name(function_name) {
                    return false;
                }
                if self.early_reject(event.meta.successful, invoking_account) {
                    return false;
                }
            }
            EventBody::CreateContract { creator_account, .. } => {
                if self.early_reject(event.meta.successful, creator_account) {
                    return false;
                }
            }
            EventBody::UploadWasm { uploader_account, .. } => {
                if self.early_reject(event.meta.successful, uploader_account) {
                    return false;
                }
            }
        }

        match &self.content_filter {
            None => true,
            Some(cf) => content_matches(cf, event),
        }
    }
}

fn content_matches(cf: &ContentFilter, event: &Event) -> bool {
    let (arguments, diagnostic_events, sub_calls, state_changes, ttl_extensions) =
        match &event.body {
            EventBody::ContractCall {
                arguments,
                diagnostic_events,
                sub_calls,
                state_changes,
                ttl_extensions,
                ..
            } => (
                arguments.as_slice(),
                diagnostic_events.as_slice(),
                sub_calls.as_slice(),
                state_changes.as_slice(),
                ttl_extensions.as_slice(),
            ),
            EventBody::CreateContract { constructor_args, .. } => {
                (constructor_args.as_slice(), &[][..], &[][..], &[][..], &[][..])
            }
            EventBody::UploadWasm { .. } => (&[][..], &[][..], &[][..], &[][..], &[][..]),
        };

    if let Some(min) = cf.min_arguments {
        if arguments.len() < min {
            return false;
        }
    }
    if let Some(max) = cf.max_arguments {
        if arguments.len() > max {
            return false;
        }
    }

    if !cf.argument_patterns.is_empty() {
        let any_match = arguments.iter().any(|arg| {
            let s = arg.as_pattern_string();
            cf.argument_patterns.iter().any(|p| pattern_matches(p, &s))
        });
        if !any_match {
            return false;
        }
    }

    if !cf.required_event_topics.is_empty() {
        for required in &cf.required_event_topics {
            let satisfied = diagnostic_events.iter().any(|de| {
                de.topics
                    .iter()
                    .any(|t| pattern_matches(required, &t.as_pattern_string()))
            });
            if !satisfied {
                return false;
            }
        }
    }

    if cf.require_state_changes == Some(true) && state_changes.is_empty() {
        return false;
    }
    if cf.require_sub_calls == Some(true) && sub_calls.is_empty() {
        return false;
    }
    if cf.require_ttl_extensions == Some(true) && ttl_extensions.is_empty() {
        return false;
    }
    if let Some(want) = cf.has_diagnostic_events {
        if want != !diagnostic_events.is_empty() {
            return false;
        }
    }
    if let Some(want) = cf.has_state_changes {
        if want != !state_changes.is_empty() {
            return false;
        }
    }

    true
}

/// The pattern mini-language from §4.6: `"*"`, `"prefix*"`, `"*suffix"`, or
/// exact equality.
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return value.ends_with(suffix);
    }
    pattern == value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_wildcard_matches_anything() {
        assert!(pattern_matches("*", ""));
        assert!(pattern_matches("*", "anything"));
    }

    #[test]
    fn pattern_prefix() {
        assert!(pattern_matches("alice*", "alice_bob"));
        assert!(!pattern_matches("alice*", "bob_alice"));
    }

    #[test]
    fn pattern_suffix() {
        assert!(pattern_matches("*_bob", "alice_bob"));
        assert!(!pattern_matches("*_bob", "bob_alice"));
    }

    #[test]
    fn pattern_exact() {
        assert!(pattern_matches("transfer", "transfer"));
        assert!(!pattern_matches("transfer", "transfers"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = FilterSpec::all_pass();
        assert!(f.matches_contract_id("C123"));
        assert!(f.matches_function_name("mint"));
        assert!(f.matches_type(TypeFilter::Call));
    }
}
