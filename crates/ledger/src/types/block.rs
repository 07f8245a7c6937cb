// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decoded block input: header, extrinsics and events.

use super::call::Call;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDigest {
    #[serde(default)]
    pub logs: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHeader {
    /// Block number; ingestion refuses blocks without it
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default, alias = "parentHash")]
    pub parent_hash: Option<String>,
    #[serde(default, alias = "stateRoot")]
    pub state_root: Option<String>,
    #[serde(default, alias = "extrinsicsRoot")]
    pub extrinsics_root: Option<String>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub digest: RawDigest,
    #[serde(default, alias = "specVersion")]
    pub runtime_spec_version: Option<u32>,
    /// Runtime the parent block ran under. Events are decoded against it.
    #[serde(default, alias = "parentSpecVersion")]
    pub parent_spec_version: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawExtrinsic {
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub signature: Option<Value>,
    #[serde(default)]
    pub tip: Option<Value>,
    #[serde(default)]
    pub nonce: Option<Value>,
    pub call: Call,
    #[serde(default)]
    pub extrinsic_length: Option<u32>,
    #[serde(default)]
    pub extrinsic_hash: Option<String>,
}

impl RawExtrinsic {
    /// Signature bytes as hex, unwrapping the `{"Sr25519": "0x.."}` shape.
    pub fn signature_hex(&self) -> Option<String> {
        match self.signature.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.values().find_map(|v| v.as_str().map(str::to_string)),
            _ => None,
        }
    }
}

/// Event phase - when during block execution the event was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// During block initialization
    Initialization,
    /// During extrinsic application (contains extrinsic index)
    ApplyExtrinsic(u32),
    /// During block finalization
    Finalization,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Initialization => "Initialization",
            EventPhase::ApplyExtrinsic(_) => "ApplyExtrinsic",
            EventPhase::Finalization => "Finalization",
        }
    }

    /// Interpret the phase shapes emitted by the chain client: a bare name,
    /// the legacy numeric code, or `{"ApplyExtrinsic": n}`. `extrinsic_idx`
    /// fills in the index when the phase itself does not carry one.
    pub fn from_raw(raw: Option<&Value>, extrinsic_idx: Option<u32>) -> Option<Self> {
        let apply = |idx: Option<u32>| idx.or(extrinsic_idx).map(EventPhase::ApplyExtrinsic);
        match raw {
            None | Some(Value::Null) => apply(None),
            Some(Value::String(name)) => match name.as_str() {
                "ApplyExtrinsic" => apply(None),
                "Finalization" => Some(EventPhase::Finalization),
                "Initialization" => Some(EventPhase::Initialization),
                _ => None,
            },
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => apply(None),
                Some(1) => Some(EventPhase::Finalization),
                Some(2) => Some(EventPhase::Initialization),
                _ => None,
            },
            Some(Value::Object(map)) => {
                if let Some(idx) = map.get("ApplyExtrinsic") {
                    apply(idx.as_u64().and_then(|i| u32::try_from(i).ok()))
                } else if map.contains_key("Finalization") {
                    Some(EventPhase::Finalization)
                } else if map.contains_key("Initialization") {
                    Some(EventPhase::Initialization)
                } else {
                    None
                }
            }
            Some(_) => None,
        }
    }

    pub fn extrinsic_idx(&self) -> Option<u32> {
        match self {
            EventPhase::ApplyExtrinsic(idx) => Some(*idx),
            _ => None,
        }
    }
}

impl Serialize for EventPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub phase: Option<Value>,
    #[serde(default)]
    pub extrinsic_idx: Option<u32>,
    #[serde(default)]
    pub event_index: Option<String>,
    pub module_id: String,
    pub event_id: String,
    #[serde(default)]
    pub attributes: Value,
}

impl RawEvent {
    pub fn resolved_phase(&self) -> Option<EventPhase> {
        EventPhase::from_raw(self.phase.as_ref(), self.extrinsic_idx)
    }

    /// Top-level extrinsic this event belongs to; `None` for block-level events.
    pub fn owner(&self) -> Option<u32> {
        match self.resolved_phase() {
            Some(phase) => phase.extrinsic_idx(),
            None => self.extrinsic_idx,
        }
    }
}

/// One decoded block as produced by the chain client.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub header: RawHeader,
    #[serde(default)]
    pub extrinsics: Vec<RawExtrinsic>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_shapes() {
        assert_eq!(
            EventPhase::from_raw(Some(&json!("ApplyExtrinsic")), Some(2)),
            Some(EventPhase::ApplyExtrinsic(2))
        );
        assert_eq!(
            EventPhase::from_raw(Some(&json!({"ApplyExtrinsic": 3})), None),
            Some(EventPhase::ApplyExtrinsic(3))
        );
        assert_eq!(
            EventPhase::from_raw(Some(&json!(1)), None),
            Some(EventPhase::Finalization)
        );
        assert_eq!(
            EventPhase::from_raw(Some(&json!("Initialization")), None),
            Some(EventPhase::Initialization)
        );
        assert_eq!(EventPhase::from_raw(None, None), None);
        assert_eq!(
            EventPhase::from_raw(None, Some(0)),
            Some(EventPhase::ApplyExtrinsic(0))
        );
    }

    #[test]
    fn test_event_owner() {
        let event: RawEvent = serde_json::from_value(json!({
            "phase": "Finalization",
            "extrinsic_idx": null,
            "module_id": "Treasury",
            "event_id": "Deposit",
            "attributes": 5
        }))
        .unwrap();
        assert_eq!(event.owner(), None);

        let event: RawEvent = serde_json::from_value(json!({
            "phase": "ApplyExtrinsic",
            "extrinsic_idx": 1,
            "module_id": "System",
            "event_id": "ExtrinsicSuccess"
        }))
        .unwrap();
        assert_eq!(event.owner(), Some(1));
    }

    #[test]
    fn test_signature_shapes() {
        let mut ext: RawExtrinsic = serde_json::from_value(json!({
            "signed": true,
            "signature": {"Sr25519": "0xaa"},
            "call": {"call_module": "System", "call_function": "remark"}
        }))
        .unwrap();
        assert_eq!(ext.signature_hex().as_deref(), Some("0xaa"));

        ext.signature = Some(json!("0xbb"));
        assert_eq!(ext.signature_hex().as_deref(), Some("0xbb"));

        ext.signature = None;
        assert_eq!(ext.signature_hex(), None);
    }

    #[test]
    fn test_minimal_block() {
        let block: RawBlock = serde_json::from_value(json!({
            "header": {"number": 7, "hash": "0x01", "parentHash": "0x00"}
        }))
        .unwrap();
        assert_eq!(block.header.number, Some(7));
        assert_eq!(block.header.parent_hash.as_deref(), Some("0x00"));
        assert!(block.extrinsics.is_empty());
        assert!(block.header.digest.logs.is_empty());
    }
}
