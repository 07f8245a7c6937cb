// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration and sinks around the ingestion core.

use integration_tests::constants::ALICE_GENERIC;
use integration_tests::{FixtureLoader, config_for, init_tracing};
use ledger_config::{ChainConfigs, ChainSelection, IngestSettings};
use polkadot_ledger::ingest::{
    BlockSink, IngestConfig, IngestOutcome, JsonLinesSink, MemorySink, ingest, ingest_into,
};
use serde_json::Value;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

#[test]
fn test_decimals_follow_redenomination() {
    let loader = FixtureLoader::default();

    let legacy = loader.load_block("legacy_deposit_fee").unwrap();
    assert_eq!(config_for("polkadot", &legacy).unwrap().token_decimals, 12);

    let current = loader.load_block("transfer_withdraw").unwrap();
    let config = config_for("polkadot", &current).unwrap();
    assert_eq!(config.token_decimals, 10);
    assert_eq!(config.ss58_prefix, 0);
    assert_eq!(config.max_nesting_depth, 8);
}

#[test]
fn test_prefix_override_reencodes_addresses() {
    init_tracing();
    let raw = FixtureLoader::default().load_block("transfer_withdraw").unwrap();
    let selection = ChainSelection {
        name: "polkadot".to_string(),
        ss58_prefix: Some(42),
    };
    let chain = selection.resolve(&ChainConfigs::load().unwrap()).unwrap();
    let config = IngestConfig::for_block(&chain, &IngestSettings::default(), 2_000_000);

    let ingested = ingest(&raw, &config).unwrap();
    assert_eq!(ingested.block.author.as_deref(), Some(ALICE_GENERIC));
    assert_eq!(
        ingested.transactions[0].from_address.as_deref(),
        Some(ALICE_GENERIC)
    );
}

#[test]
fn test_lower_depth_limit_collapses_batches() {
    init_tracing();
    let raw = FixtureLoader::default().load_block("multisig_executed").unwrap();
    let mut config = config_for("polkadot", &raw).unwrap();
    config.max_nesting_depth = 1;

    let ingested = ingest(&raw, &config).unwrap();
    let multisig: Vec<_> = ingested
        .transactions
        .iter()
        .filter(|r| r.extrinsic_idx == 1)
        .collect();
    assert_eq!(multisig.len(), 1);
    assert!(!multisig[0].success);
}

#[test]
fn test_memory_sink_skips_ingested_blocks() {
    init_tracing();
    let raw = FixtureLoader::default().load_block("batch_interrupted").unwrap();
    let config = config_for("polkadot", &raw).unwrap();
    let mut sink = MemorySink::new();

    let first = ingest_into(&raw, &config, &mut sink).unwrap();
    assert_eq!(
        first,
        IngestOutcome::Ingested {
            block_id: 3_000_000,
            transactions: 5,
            diagnostics: 0,
        }
    );

    let second = ingest_into(&raw, &config, &mut sink).unwrap();
    assert_eq!(second, IngestOutcome::AlreadyIngested(3_000_000));
    assert_eq!(sink.len(), 1);
    assert!(sink.contains(3_000_000, raw.header.hash.as_deref().unwrap()));
}

#[test]
fn test_json_lines_sink_writes_one_line_per_block() {
    init_tracing();
    let loader = FixtureLoader::default();
    let file = tempfile::tempfile().unwrap();
    let mut sink = JsonLinesSink::new(file, false);

    for name in ["transfer_withdraw", "batch_interrupted", "transfer_withdraw"] {
        let raw = loader.load_block(name).unwrap();
        let config = config_for("polkadot", &raw).unwrap();
        ingest_into(&raw, &config, &mut sink).unwrap();
    }

    let mut file = sink.into_inner();
    file.seek(SeekFrom::Start(0)).unwrap();
    let lines: Vec<Value> = BufReader::new(file)
        .lines()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["block"]["id"], 2_000_000);
    assert_eq!(lines[1]["block"]["id"], 3_000_000);
    assert_eq!(lines[0]["transactions"][0]["fee"], "0.0000000100");
}
