// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Header digest decoding.
//!
//! Each log entry is decoded on its own. BABE and aura pre-runtime digests
//! yield the block's slot (and, for BABE, the authority index); everything
//! else is kept as delivered.

use super::diagnostics::{DiagnosticKind, Diagnostics};
use crate::types::DigestLogRecord;
use crate::utils::{decode_hex, hex_with_prefix, value_as_u64};
use parity_scale_codec::Decode;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sp_consensus_babe::digests::PreDigest;
use thiserror::Error;

const BABE_ENGINE: &[u8] = b"BABE";
const AURA_ENGINE: &[u8] = b"aura";

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Unrecognised digest log shape: {0}")]
    UnknownShape(String),

    #[error("Digest payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Failed to decode BABE pre-digest: {0}")]
    BabeDecode(#[from] parity_scale_codec::Error),

    #[error("Aura slot needs 8 bytes, payload has {0}")]
    ShortAuraSlot(usize),

    #[error("Pre-digest field '{0}' is missing or unreadable")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EngineData {
    Pair(String, Value),
    Named { engine: String, data: Value },
}

impl EngineData {
    fn into_parts(self) -> (String, Value) {
        match self {
            EngineData::Pair(engine, data) => (engine, data),
            EngineData::Named { engine, data } => (engine, data),
        }
    }
}

#[derive(Debug, Deserialize)]
enum DigestItem {
    PreRuntime(EngineData),
    Consensus(EngineData),
    Seal(EngineData),
    Other(Value),
    RuntimeEnvironmentUpdated,
}

/// Digest logs of one header, with the values derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedDigest {
    pub logs: Vec<DigestLogRecord>,
    pub authority_index: Option<u32>,
    pub slot_number: Option<u64>,
}

/// Engine ids arrive either as text (`BABE`) or hex (`0x42414245`).
fn engine_id(raw: &str) -> Vec<u8> {
    if raw.starts_with("0x")
        && let Ok(bytes) = decode_hex(raw)
    {
        return bytes;
    }
    raw.as_bytes().to_vec()
}

fn engine_name(engine: &[u8]) -> String {
    match std::str::from_utf8(engine) {
        Ok(name) if name.chars().all(|c| c.is_ascii_graphic()) => name.to_string(),
        _ => hex_with_prefix(engine),
    }
}

struct PreRuntime {
    value: Value,
    authority_index: Option<u32>,
    slot_number: Option<u64>,
}

fn decode_pre_runtime(engine: &[u8], data: Value) -> Result<PreRuntime, DigestError> {
    // Already decoded by the chain client
    if let Value::Object(fields) = &data {
        let slot_number = fields
            .get("slot_number")
            .or_else(|| fields.get("slot"))
            .and_then(value_as_u64)
            .ok_or(DigestError::MissingField("slot_number"))?;
        let authority_index = fields
            .get("authority_index")
            .and_then(value_as_u64)
            .and_then(|i| u32::try_from(i).ok());
        return Ok(PreRuntime {
            value: data,
            authority_index,
            slot_number: Some(slot_number),
        });
    }

    let Some(hex_payload) = data.as_str() else {
        return Err(DigestError::UnknownShape(data.to_string()));
    };
    let payload = decode_hex(hex_payload)?;

    match engine {
        BABE_ENGINE => {
            let mut cursor = &payload[..];
            let pre_digest = PreDigest::decode(&mut cursor)?;
            let variant = match &pre_digest {
                PreDigest::Primary(_) => "Primary",
                PreDigest::SecondaryPlain(_) => "SecondaryPlain",
                PreDigest::SecondaryVRF(_) => "SecondaryVRF",
            };
            let authority_index = pre_digest.authority_index();
            let slot_number = u64::from(pre_digest.slot());
            let mut value = Map::new();
            value.insert(
                variant.to_string(),
                json!({
                    "authority_index": authority_index,
                    "slot_number": slot_number,
                }),
            );
            Ok(PreRuntime {
                value: Value::Object(value),
                authority_index: Some(authority_index),
                slot_number: Some(slot_number),
            })
        }
        AURA_ENGINE => {
            let slot_bytes: [u8; 8] = payload
                .get(..8)
                .and_then(|b| b.try_into().ok())
                .ok_or(DigestError::ShortAuraSlot(payload.len()))?;
            let slot_number = u64::from_le_bytes(slot_bytes);
            Ok(PreRuntime {
                value: json!({ "slot_number": slot_number }),
                authority_index: None,
                slot_number: Some(slot_number),
            })
        }
        _ => Ok(PreRuntime {
            value: data,
            authority_index: None,
            slot_number: None,
        }),
    }
}

fn decode_entry(
    index: u32,
    raw: &Value,
) -> Result<(DigestLogRecord, Option<PreRuntime>), DigestError> {
    let item = serde_json::from_value::<DigestItem>(raw.clone())
        .map_err(|_| DigestError::UnknownShape(raw.to_string()))?;

    let (kind, engine_data) = match item {
        DigestItem::PreRuntime(data) => ("PreRuntime", data),
        DigestItem::Consensus(data) => ("Consensus", data),
        DigestItem::Seal(data) => ("Seal", data),
        DigestItem::Other(value) => {
            let record = DigestLogRecord {
                index,
                kind: "Other".to_string(),
                engine: None,
                value,
            };
            return Ok((record, None));
        }
        DigestItem::RuntimeEnvironmentUpdated => {
            let record = DigestLogRecord {
                index,
                kind: "RuntimeEnvironmentUpdated".to_string(),
                engine: None,
                value: Value::Null,
            };
            return Ok((record, None));
        }
    };

    let (engine, data) = engine_data.into_parts();
    let engine = engine_id(&engine);

    if kind == "PreRuntime" {
        let pre_runtime = decode_pre_runtime(&engine, data)?;
        let record = DigestLogRecord {
            index,
            kind: kind.to_string(),
            engine: Some(engine_name(&engine)),
            value: pre_runtime.value.clone(),
        };
        return Ok((record, Some(pre_runtime)));
    }

    let record = DigestLogRecord {
        index,
        kind: kind.to_string(),
        engine: Some(engine_name(&engine)),
        value: data,
    };
    Ok((record, None))
}

/// Decode every log entry, recording failures instead of stopping.
pub fn decode_logs(logs: &[Value], diagnostics: &mut Diagnostics) -> DecodedDigest {
    let mut decoded = DecodedDigest::default();

    for (index, raw) in logs.iter().enumerate() {
        let index = index as u32;
        match decode_entry(index, raw) {
            Ok((record, pre_runtime)) => {
                if let Some(pre_runtime) = pre_runtime {
                    // The first pre-runtime digest that names a slot wins
                    if decoded.slot_number.is_none() {
                        decoded.slot_number = pre_runtime.slot_number;
                        decoded.authority_index = pre_runtime.authority_index;
                    }
                }
                decoded.logs.push(record);
            }
            Err(e) => {
                diagnostics.push(
                    DiagnosticKind::DigestDecode,
                    None,
                    format!("digest log {}: {}", index, e),
                );
                decoded.logs.push(DigestLogRecord {
                    index,
                    kind: "Raw".to_string(),
                    engine: None,
                    value: raw.clone(),
                });
            }
        }
    }

    decoded
}
