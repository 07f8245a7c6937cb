// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Whole-block ingestion.

use super::address::AddressNormalizer;
use super::decompose::{BlockContext, collapse, decompose};
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::digest::decode_logs;
use super::events::EventIndex;
use super::sink::{BlockSink, SinkError};
use crate::types::{
    BlockCounters, BlockRow, EventRecord, IngestedBlock, RawBlock, RawExtrinsic,
    TransactionRecord,
};
use crate::utils::value_as_u64;
use chrono::DateTime;
use ledger_config::{ChainConfig, IngestSettings};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Block header is missing '{0}'")]
    MissingHeaderField(&'static str),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Chain parameters in effect for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    pub token_decimals: u8,
    pub ss58_prefix: u16,
    pub max_nesting_depth: usize,
}

impl IngestConfig {
    pub fn for_block(chain: &ChainConfig, settings: &IngestSettings, block_number: u64) -> Self {
        Self {
            token_decimals: chain.token_decimals_at(block_number),
            ss58_prefix: chain.ss58_prefix,
            max_nesting_depth: settings.max_nesting_depth,
        }
    }
}

/// What [`ingest_into`] did with a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested {
        block_id: u64,
        transactions: usize,
        diagnostics: usize,
    },
    AlreadyIngested(u64),
}

/// Milliseconds from the block's `Timestamp.set` inherent.
fn block_timestamp(extrinsics: &[RawExtrinsic]) -> Option<u64> {
    extrinsics
        .iter()
        .find(|e| e.call.is("Timestamp", "set"))
        .and_then(|e| e.call.plain_arg("now"))
        .and_then(value_as_u64)
}

/// Turn one decoded block into ledger rows.
pub fn ingest(raw: &RawBlock, config: &IngestConfig) -> Result<IngestedBlock, IngestError> {
    let header = &raw.header;
    let block_id = header
        .number
        .ok_or(IngestError::MissingHeaderField("number"))?;
    let hash = header
        .hash
        .clone()
        .ok_or(IngestError::MissingHeaderField("hash"))?;

    let mut diagnostics = Diagnostics::new();
    let index = EventIndex::build(&raw.events);
    diagnostics.extend(index.diagnostics().clone());

    let digest = decode_logs(&header.digest.logs, &mut diagnostics);
    let normalizer = AddressNormalizer::new(config.ss58_prefix);
    let timestamp = block_timestamp(&raw.extrinsics);

    let context = BlockContext {
        block_id,
        token_decimals: config.token_decimals,
        spec_version: header.runtime_spec_version,
        timestamp,
        normalizer,
        max_depth: config.max_nesting_depth,
    };

    let mut counters = BlockCounters::default();
    let mut transactions: Vec<TransactionRecord> = Vec::new();
    let mut touched_addresses = BTreeSet::new();

    for (position, extrinsic) in raw.extrinsics.iter().enumerate() {
        let extrinsic_idx = position as u32;
        if extrinsic.signed {
            counters.count_extrinsics_signed += 1;
        } else {
            counters.count_extrinsics_unsigned += 1;
        }

        let decomposition = match decompose(extrinsic, extrinsic_idx, &context, &index) {
            Ok(decomposition) => decomposition,
            Err(e) => {
                diagnostics.push(
                    DiagnosticKind::NestingDepthExceeded,
                    Some(extrinsic_idx),
                    e.to_string(),
                );
                collapse(extrinsic, extrinsic_idx, &context, &index)
            }
        };

        transactions.extend(decomposition.records);
        touched_addresses.extend(decomposition.touched_addresses);
        diagnostics.extend(decomposition.diagnostics);
    }

    let tally = index.tally();
    counters.count_extrinsics_success = tally.success;
    counters.count_extrinsics_error = tally.error;
    counters.count_accounts_new = tally.accounts_new;
    counters.count_accounts_reaped = tally.accounts_reaped;
    counters.count_sessions_new = tally.sessions_new;

    let mut reaped_addresses = BTreeSet::new();
    for (extrinsic_idx, account) in index.killed_accounts() {
        match normalizer.try_normalize(account) {
            Ok(address) => {
                reaped_addresses.insert(address.address);
            }
            Err(e) => diagnostics.push(
                DiagnosticKind::AddressNormalization,
                *extrinsic_idx,
                format!("reaped account: {}", e),
            ),
        }
    }

    let author = match &header.author {
        Some(raw_author) => match normalizer.try_normalize(raw_author) {
            Ok(address) => Some(address.address),
            Err(e) => {
                diagnostics.push(
                    DiagnosticKind::AddressNormalization,
                    None,
                    format!("author: {}", e),
                );
                None
            }
        },
        None => None,
    };

    let event_spec_version = header
        .parent_spec_version
        .or(header.runtime_spec_version);
    let events: Vec<EventRecord> = index
        .events()
        .iter()
        .map(|event| EventRecord {
            block_id,
            event_idx: event.event_idx,
            phase: event.phase,
            extrinsic_idx: event.extrinsic_idx,
            event_type: event.event_type.clone(),
            module_id: event.module_id.clone(),
            event_id: event.event_id.clone(),
            system: event.module_id == "System",
            attributes: event.attributes.clone(),
            spec_version: event_spec_version,
        })
        .collect();

    let block = BlockRow {
        id: block_id,
        parent_id: block_id.checked_sub(1),
        hash,
        parent_hash: header.parent_hash.clone(),
        state_root: header.state_root.clone(),
        extrinsics_root: header.extrinsics_root.clone(),
        author,
        count_extrinsics: raw.extrinsics.len() as u32,
        count_events: raw.events.len() as u32,
        count_log: header.digest.logs.len() as u32,
        counters,
        timestamp,
        datetime: timestamp
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(DateTime::from_timestamp_millis),
        slot_number: digest.slot_number,
        authority_index: digest.authority_index,
        spec_version: header.runtime_spec_version,
        logs: digest.logs,
    };

    tracing::debug!(
        block_id,
        extrinsics = block.count_extrinsics,
        transactions = transactions.len(),
        diagnostics = diagnostics.len(),
        "Ingested block"
    );

    Ok(IngestedBlock {
        block,
        transactions,
        events,
        touched_addresses,
        reaped_addresses,
        diagnostics,
    })
}

/// Ingest a block unless `sink` already holds it.
pub fn ingest_into<S: BlockSink>(
    raw: &RawBlock,
    config: &IngestConfig,
    sink: &mut S,
) -> Result<IngestOutcome, IngestError> {
    if let (Some(block_id), Some(hash)) = (raw.header.number, raw.header.hash.as_deref())
        && sink.contains(block_id, hash)
    {
        tracing::info!(block_id, hash, "Block already ingested, skipping");
        return Ok(IngestOutcome::AlreadyIngested(block_id));
    }

    let ingested = ingest(raw, config)?;
    let outcome = IngestOutcome::Ingested {
        block_id: ingested.block.id,
        transactions: ingested.transactions.len(),
        diagnostics: ingested.diagnostics.len(),
    };
    sink.store(ingested)?;
    Ok(outcome)
}
