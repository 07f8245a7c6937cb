// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-block event index.
//!
//! This module handles:
//! - Normalizing event attributes into one shape, whatever runtime produced them
//! - Grouping extrinsic outcomes (success, batch interruption, wrapper execution)
//! - Collecting fee-relevant events per extrinsic, in event order
//! - Tallying account and session events for the block counters

use super::diagnostics::{DiagnosticKind, Diagnostics};
use crate::types::{EventPhase, RawEvent};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One attribute of a list-shaped event, as emitted by older runtimes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub value: Value,
}

/// Event attributes after normalization.
///
/// Older runtimes emit an ordered list of typed values, newer ones a named
/// mapping. A bare scalar becomes a one-element untyped list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventAttributes {
    Typed(Vec<TypedValue>),
    Named(Map<String, Value>),
}

fn is_typed_entry(map: &Map<String, Value>) -> bool {
    map.contains_key("value")
        && map.contains_key("type")
        && map.keys().all(|k| matches!(k.as_str(), "type" | "value" | "name"))
}

fn typed_entry(value: Value) -> TypedValue {
    match value {
        Value::Object(mut map) if is_typed_entry(&map) => TypedValue {
            name: map
                .remove("name")
                .and_then(|v| v.as_str().map(str::to_string)),
            type_name: map
                .remove("type")
                .and_then(|v| v.as_str().map(str::to_string)),
            value: map.remove("value").unwrap_or(Value::Null),
        },
        other => TypedValue {
            name: None,
            type_name: None,
            value: other,
        },
    }
}

impl From<Value> for EventAttributes {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => EventAttributes::Typed(Vec::new()),
            Value::Array(items) => {
                EventAttributes::Typed(items.into_iter().map(typed_entry).collect())
            }
            Value::Object(map) if is_typed_entry(&map) => {
                EventAttributes::Typed(vec![typed_entry(Value::Object(map))])
            }
            Value::Object(map) => EventAttributes::Named(map),
            scalar => EventAttributes::Typed(vec![typed_entry(scalar)]),
        }
    }
}

impl EventAttributes {
    pub fn len(&self) -> usize {
        match self {
            EventAttributes::Typed(values) => values.len(),
            EventAttributes::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find an attribute by field name, then by declared type, then by
    /// position.
    pub fn lookup(&self, name: &str, type_hint: &str, position: usize) -> Option<&Value> {
        match self {
            EventAttributes::Named(map) => map
                .get(name)
                .or_else(|| map.values().nth(position)),
            EventAttributes::Typed(values) => values
                .iter()
                .find(|v| v.name.as_deref() == Some(name))
                .or_else(|| {
                    values.iter().find(|v| {
                        v.type_name
                            .as_deref()
                            .is_some_and(|t| t.contains(type_hint))
                    })
                })
                .or_else(|| values.get(position))
                .map(|v| &v.value),
        }
    }

    pub fn amount(&self, name: &str, position: usize) -> Option<&Value> {
        self.lookup(name, "Balance", position)
    }

    pub fn index(&self) -> Option<u32> {
        self.lookup("index", "u32", 0)
            .and_then(crate::utils::value_as_u64)
            .and_then(|i| u32::try_from(i).ok())
    }

    pub fn account(&self) -> Option<&Value> {
        self.lookup("account", "AccountId", 0)
    }

    pub fn dispatch_result(&self, position: usize) -> Option<DispatchOutcome> {
        self.lookup("result", "DispatchResult", position)
            .and_then(DispatchOutcome::from_value)
    }
}

/// Result carried by `MultisigExecuted`/`ProxyExecuted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ok,
    Err,
}

impl DispatchOutcome {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if s == "Ok" => Some(DispatchOutcome::Ok),
            Value::String(s) if s == "Err" => Some(DispatchOutcome::Err),
            Value::Object(map) if map.contains_key("Ok") => Some(DispatchOutcome::Ok),
            Value::Object(map) if map.contains_key("Err") => Some(DispatchOutcome::Err),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchOutcome::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedEvent {
    pub event_idx: u32,
    pub phase: Option<EventPhase>,
    pub extrinsic_idx: Option<u32>,
    pub event_type: Option<String>,
    pub module_id: String,
    pub event_id: String,
    pub attributes: EventAttributes,
}

impl IndexedEvent {
    pub fn is(&self, module_id: &str, event_id: &str) -> bool {
        self.module_id == module_id && self.event_id == event_id
    }
}

/// How one executed batch call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// `BatchCompleted` or `BatchCompletedWithErrors`
    Completed,
    /// `BatchInterrupted`, with the 0-based index of the call that failed
    Interrupted(u32),
}

impl BatchOutcome {
    pub fn interrupted_at(&self) -> Option<u32> {
        match self {
            BatchOutcome::Completed => None,
            BatchOutcome::Interrupted(at) => Some(*at),
        }
    }
}

/// What the events of one top-level extrinsic say about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtrinsicEvents {
    /// `None` when neither `ExtrinsicSuccess` nor `ExtrinsicFailed` was seen
    pub success: Option<bool>,
    /// Batch completion events, in event order (inner batches first)
    pub batch_outcomes: Vec<BatchOutcome>,
    /// `MultisigExecuted` results, in event order
    pub multisig_executed: Vec<DispatchOutcome>,
    /// `ProxyExecuted` results, in event order
    pub proxy_executed: Vec<DispatchOutcome>,
    /// Positions of `Balances.Withdraw` events
    pub fee_events: Vec<usize>,
    /// Positions of `Balances.Deposit` and `Treasury.Deposit` events
    pub deposit_events: Vec<usize>,
}

impl ExtrinsicEvents {
    pub fn has_multisig_executed(&self) -> bool {
        !self.multisig_executed.is_empty()
    }

    pub fn has_proxy_executed(&self) -> bool {
        !self.proxy_executed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub success: u32,
    pub error: u32,
    pub accounts_new: u32,
    pub accounts_reaped: u32,
    pub sessions_new: u32,
}

/// Read-only lookup structure over a block's events.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: Vec<IndexedEvent>,
    by_extrinsic: BTreeMap<u32, ExtrinsicEvents>,
    tally: EventTally,
    killed_accounts: Vec<(Option<u32>, Value)>,
    diagnostics: Diagnostics,
}

impl EventIndex {
    /// Index the block's events in one pass.
    pub fn build(raw_events: &[RawEvent]) -> Self {
        let mut index = EventIndex::default();

        for (position, raw) in raw_events.iter().enumerate() {
            let phase = raw.resolved_phase();
            let owner = raw.owner();
            let event = IndexedEvent {
                event_idx: position as u32,
                phase,
                extrinsic_idx: owner,
                event_type: raw.event_index.clone(),
                module_id: raw.module_id.clone(),
                event_id: raw.event_id.clone(),
                attributes: EventAttributes::from(raw.attributes.clone()),
            };
            index.record(position, &event);
            index.events.push(event);
        }

        tracing::debug!(
            events = index.events.len(),
            extrinsics = index.by_extrinsic.len(),
            "Indexed block events"
        );
        index
    }

    fn record(&mut self, position: usize, event: &IndexedEvent) {
        let owner = event.extrinsic_idx;

        match (event.module_id.as_str(), event.event_id.as_str()) {
            ("System", "ExtrinsicSuccess") => {
                self.tally.success += 1;
                if let Some(idx) = owner {
                    self.entry(idx).success = Some(true);
                }
            }
            ("System", "ExtrinsicFailed") => {
                self.tally.error += 1;
                if let Some(idx) = owner {
                    self.entry(idx).success = Some(false);
                }
            }
            ("System", "NewAccount") => self.tally.accounts_new += 1,
            ("System", "KilledAccount") => {
                self.tally.accounts_reaped += 1;
                match event.attributes.account() {
                    Some(account) => self.killed_accounts.push((owner, account.clone())),
                    None => self.diagnostics.push(
                        DiagnosticKind::EventAttributes,
                        owner,
                        format!("KilledAccount event {} names no account", event.event_idx),
                    ),
                }
            }
            ("Session", "NewSession") => self.tally.sessions_new += 1,
            ("Utility", "BatchInterrupted") => match (owner, event.attributes.index()) {
                (Some(idx), Some(at)) => self
                    .entry(idx)
                    .batch_outcomes
                    .push(BatchOutcome::Interrupted(at)),
                (_, None) => self.diagnostics.push(
                    DiagnosticKind::EventAttributes,
                    owner,
                    format!(
                        "BatchInterrupted event {} carries no readable index",
                        event.event_idx
                    ),
                ),
                (None, Some(_)) => self.diagnostics.push(
                    DiagnosticKind::EventAttributes,
                    None,
                    format!(
                        "BatchInterrupted event {} belongs to no extrinsic",
                        event.event_idx
                    ),
                ),
            },
            ("Utility", "BatchCompleted" | "BatchCompletedWithErrors") => {
                if let Some(idx) = owner {
                    self.entry(idx).batch_outcomes.push(BatchOutcome::Completed);
                }
            }
            ("Multisig", "MultisigExecuted") => {
                if let Some(idx) = owner {
                    // Position 4: (approving, timepoint, multisig, call_hash, result)
                    let outcome = event
                        .attributes
                        .dispatch_result(4)
                        .unwrap_or(DispatchOutcome::Ok);
                    self.entry(idx).multisig_executed.push(outcome);
                }
            }
            ("Proxy", "ProxyExecuted") => {
                if let Some(idx) = owner {
                    let outcome = event
                        .attributes
                        .dispatch_result(0)
                        .unwrap_or(DispatchOutcome::Ok);
                    self.entry(idx).proxy_executed.push(outcome);
                }
            }
            ("Balances", "Withdraw") => {
                if let Some(idx) = owner {
                    self.entry(idx).fee_events.push(position);
                }
            }
            ("Balances", "Deposit") | ("Treasury", "Deposit") => {
                if let Some(idx) = owner {
                    self.entry(idx).deposit_events.push(position);
                }
            }
            _ => {}
        }
    }

    fn entry(&mut self, extrinsic_idx: u32) -> &mut ExtrinsicEvents {
        self.by_extrinsic.entry(extrinsic_idx).or_default()
    }

    pub fn events(&self) -> &[IndexedEvent] {
        &self.events
    }

    pub fn extrinsic(&self, extrinsic_idx: u32) -> Option<&ExtrinsicEvents> {
        self.by_extrinsic.get(&extrinsic_idx)
    }

    /// Dispatch status of a top-level extrinsic; unknown counts as failed.
    pub fn succeeded(&self, extrinsic_idx: u32) -> bool {
        self.extrinsic(extrinsic_idx)
            .and_then(|e| e.success)
            .unwrap_or(false)
    }

    pub fn fee_events(&self, extrinsic_idx: u32) -> impl Iterator<Item = &IndexedEvent> {
        self.positions(extrinsic_idx, |e| &e.fee_events)
    }

    pub fn deposit_events(&self, extrinsic_idx: u32) -> impl Iterator<Item = &IndexedEvent> {
        self.positions(extrinsic_idx, |e| &e.deposit_events)
    }

    fn positions<'a>(
        &'a self,
        extrinsic_idx: u32,
        select: fn(&ExtrinsicEvents) -> &Vec<usize>,
    ) -> impl Iterator<Item = &'a IndexedEvent> {
        self.extrinsic(extrinsic_idx)
            .map(|e| select(e).as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&p| self.events.get(p))
    }

    pub fn tally(&self) -> EventTally {
        self.tally
    }

    /// Raw account values named by `System.KilledAccount`, with the owning
    /// extrinsic.
    pub fn killed_accounts(&self) -> &[(Option<u32>, Value)] {
        &self.killed_accounts
    }

    /// Problems found while reading event attributes.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(
        extrinsic_idx: Option<u32>,
        module_id: &str,
        event_id: &str,
        attributes: Value,
    ) -> RawEvent {
        let phase = if extrinsic_idx.is_some() {
            "ApplyExtrinsic"
        } else {
            "Finalization"
        };
        serde_json::from_value(json!({
            "phase": phase,
            "extrinsic_idx": extrinsic_idx,
            "event_index": "0000",
            "module_id": module_id,
            "event_id": event_id,
            "attributes": attributes,
        }))
        .unwrap()
    }

    #[test]
    fn test_attribute_shapes() {
        let legacy = EventAttributes::from(json!([
            {"type": "AccountId", "value": "0x01"},
            {"type": "Balance", "value": 100}
        ]));
        assert_eq!(legacy.amount("amount", 1), Some(&json!(100)));

        let named = EventAttributes::from(json!({"who": "0x01", "amount": 100}));
        assert_eq!(named.amount("amount", 1), Some(&json!(100)));

        let scalar = EventAttributes::from(json!(5));
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.amount("value", 0), Some(&json!(5)));

        let single = EventAttributes::from(json!({"type": "u32", "value": 2}));
        assert_eq!(single.index(), Some(2));

        assert!(EventAttributes::from(Value::Null).is_empty());
    }

    #[test]
    fn test_positional_fallback() {
        let untyped = EventAttributes::from(json!(["0x01", 100]));
        assert_eq!(untyped.amount("amount", 1), Some(&json!(100)));
        assert_eq!(untyped.account(), Some(&json!("0x01")));
    }

    #[test]
    fn test_outcomes_and_tally() {
        let events = vec![
            event(Some(0), "System", "ExtrinsicSuccess", json!([])),
            event(Some(1), "System", "NewAccount", json!(["0x01"])),
            event(Some(1), "System", "ExtrinsicFailed", json!([])),
            event(None, "Session", "NewSession", json!([3])),
        ];
        let index = EventIndex::build(&events);

        assert!(index.succeeded(0));
        assert!(!index.succeeded(1));
        // No status event at all
        assert!(!index.succeeded(2));
        assert_eq!(index.extrinsic(2), None);

        let tally = index.tally();
        assert_eq!(tally.success, 1);
        assert_eq!(tally.error, 1);
        assert_eq!(tally.accounts_new, 1);
        assert_eq!(tally.sessions_new, 1);
        assert_eq!(index.events().len(), 4);
        assert_eq!(index.events()[3].extrinsic_idx, None);
    }

    #[test]
    fn test_batch_and_wrapper_events() {
        let events = vec![
            event(Some(0), "Utility", "BatchInterrupted", json!({"index": 1, "error": {}})),
            event(Some(1), "Proxy", "ProxyExecuted", json!({"result": {"Err": {}}})),
            event(Some(2), "Multisig", "MultisigExecuted", json!(["0x01", {}, "0x02", "0x03", {"Ok": []}])),
        ];
        let index = EventIndex::build(&events);

        assert_eq!(
            index.extrinsic(0).unwrap().batch_outcomes,
            vec![BatchOutcome::Interrupted(1)]
        );
        assert_eq!(index.extrinsic(1).unwrap().proxy_executed, vec![DispatchOutcome::Err]);
        assert!(index.extrinsic(2).unwrap().has_multisig_executed());
        assert!(!index.extrinsic(2).unwrap().has_proxy_executed());
        assert!(index.diagnostics().is_empty());
    }

    #[test]
    fn test_fee_events_keep_order() {
        let events = vec![
            event(Some(0), "Balances", "Withdraw", json!({"who": "0x01", "amount": 100})),
            event(Some(0), "Balances", "Deposit", json!({"who": "0x02", "amount": 80})),
            event(Some(0), "Treasury", "Deposit", json!({"value": 20})),
            event(Some(1), "Balances", "Deposit", json!({"who": "0x02", "amount": 5})),
        ];
        let index = EventIndex::build(&events);

        assert_eq!(index.fee_events(0).count(), 1);
        let deposits: Vec<u32> = index.deposit_events(0).map(|e| e.event_idx).collect();
        assert_eq!(deposits, vec![1, 2]);
        assert_eq!(index.deposit_events(1).count(), 1);
        assert_eq!(index.fee_events(7).count(), 0);
    }

    #[test]
    fn test_killed_accounts() {
        let events = vec![
            event(Some(0), "System", "KilledAccount", json!({"account": "0x0a"})),
            event(Some(0), "System", "KilledAccount", json!("0x0b")),
            event(Some(0), "System", "KilledAccount", json!([])),
        ];
        let index = EventIndex::build(&events);

        assert_eq!(index.tally().accounts_reaped, 3);
        assert_eq!(index.killed_accounts().len(), 2);
        assert_eq!(index.killed_accounts()[1].1, json!("0x0b"));
        assert_eq!(index.diagnostics().count(DiagnosticKind::EventAttributes), 1);
    }

    #[test]
    fn test_batch_outcomes_keep_event_order() {
        let events = vec![
            event(Some(0), "Utility", "BatchInterrupted", json!({"index": 1, "error": {}})),
            event(Some(0), "Utility", "BatchCompleted", json!([])),
            event(Some(1), "Utility", "BatchCompletedWithErrors", json!([])),
        ];
        let index = EventIndex::build(&events);

        let outcomes = &index.extrinsic(0).unwrap().batch_outcomes;
        assert_eq!(
            outcomes,
            &vec![BatchOutcome::Interrupted(1), BatchOutcome::Completed]
        );
        assert_eq!(outcomes[0].interrupted_at(), Some(1));
        assert_eq!(outcomes[1].interrupted_at(), None);
        assert_eq!(
            index.extrinsic(1).unwrap().batch_outcomes,
            vec![BatchOutcome::Completed]
        );
    }

    #[test]
    fn test_orphan_batch_interruption_is_reported() {
        let events = vec![event(None, "Utility", "BatchInterrupted", json!({"index": 0, "error": {}}))];
        let index = EventIndex::build(&events);

        assert!(index.extrinsic(0).is_none());
        assert_eq!(index.diagnostics().count(DiagnosticKind::EventAttributes), 1);
    }

    #[test]
    fn test_unreadable_batch_index_is_reported() {
        let events = vec![event(Some(0), "Utility", "BatchInterrupted", json!({"error": {}}))];
        let index = EventIndex::build(&events);

        // Named lookup falls back to the first value, which is not an index
        assert_eq!(index.extrinsic(0), None);
        assert_eq!(index.diagnostics().len(), 1);
    }
}
