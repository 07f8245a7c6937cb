// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output rows handed to the persistence layer.

use super::amount::Amount;
use super::block::EventPhase;
use crate::ingest::{Diagnostics, EventAttributes};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Composite key of a [`TransactionRecord`], unique within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordKey {
    pub block_id: u64,
    pub extrinsic_idx: u32,
    pub nesting_idx: u32,
    pub batch_idx: u32,
}

/// One elementary call, unpacked from a (possibly wrapped) extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub block_id: u64,
    pub extrinsic_idx: u32,
    /// 0 for the top-level call, strictly larger for every nested call
    pub nesting_idx: u32,
    /// 1-based position among batch siblings, 0 outside a batch
    pub batch_idx: u32,
    pub module_id: String,
    pub function_id: String,
    pub signed: bool,
    pub success: bool,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub value: Option<Amount>,
    pub fee: Option<Amount>,
    pub tip: Option<Amount>,
    pub nonce: Option<u64>,
    pub signature: Option<String>,
    pub extrinsic_hash: Option<String>,
    pub extrinsic_length: Option<u32>,
    pub spec_version: Option<u32>,
    pub timestamp: Option<u64>,
}

impl TransactionRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            block_id: self.block_id,
            extrinsic_idx: self.extrinsic_idx,
            nesting_idx: self.nesting_idx,
            batch_idx: self.batch_idx,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub block_id: u64,
    pub event_idx: u32,
    pub phase: Option<EventPhase>,
    pub extrinsic_idx: Option<u32>,
    /// Raw event index as reported by the chain client (e.g. `0000`)
    pub event_type: Option<String>,
    pub module_id: String,
    pub event_id: String,
    pub system: bool,
    pub attributes: EventAttributes,
    pub spec_version: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounters {
    pub count_extrinsics_signed: u32,
    pub count_extrinsics_unsigned: u32,
    pub count_extrinsics_success: u32,
    pub count_extrinsics_error: u32,
    pub count_accounts_new: u32,
    pub count_accounts_reaped: u32,
    pub count_sessions_new: u32,
}

/// A digest log entry, decoded when its shape is understood and kept raw
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestLogRecord {
    pub index: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub engine: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockRow {
    pub id: u64,
    pub parent_id: Option<u64>,
    pub hash: String,
    pub parent_hash: Option<String>,
    pub state_root: Option<String>,
    pub extrinsics_root: Option<String>,
    pub author: Option<String>,
    pub count_extrinsics: u32,
    pub count_events: u32,
    pub count_log: u32,
    #[serde(flatten)]
    pub counters: BlockCounters,
    pub timestamp: Option<u64>,
    pub datetime: Option<DateTime<Utc>>,
    pub slot_number: Option<u64>,
    pub authority_index: Option<u32>,
    pub spec_version: Option<u32>,
    pub logs: Vec<DigestLogRecord>,
}

/// Everything produced for one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedBlock {
    pub block: BlockRow,
    pub transactions: Vec<TransactionRecord>,
    pub events: Vec<EventRecord>,
    /// Addresses that appeared as signer, destination or derived origin
    pub touched_addresses: BTreeSet<String>,
    /// Accounts named by `System.KilledAccount`
    pub reaped_addresses: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}
