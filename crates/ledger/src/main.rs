// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, Result};
use ledger_config::{Args, LedgerConfig};
use polkadot_ledger::ingest::{
    IngestConfig, IngestOutcome, JsonLinesSink, ingest_into, network_name,
};
use polkadot_ledger::logging::{self, LoggingConfig};
use polkadot_ledger::types::RawBlock;
use std::path::Path;

fn read_block(path: &Path) -> Result<RawBlock> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read block file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse block file {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse_args();
    let config = LedgerConfig::from_env_file(&args.env_file)?;
    logging::init_with_config(LoggingConfig::from(&config.log))?;

    let chain = config.chain_config()?;
    tracing::info!(
        chain = %config.chain.name,
        network = %network_name(chain.ss58_prefix),
        ss58_prefix = chain.ss58_prefix,
        max_nesting_depth = config.ingest.max_nesting_depth,
        "Starting ingestion of {} block file(s)",
        args.blocks.len()
    );

    let stdout = std::io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock(), args.pretty);
    let mut failures = 0usize;

    for path in &args.blocks {
        let result = read_block(path).and_then(|raw| {
            let block_number = raw.header.number.unwrap_or_default();
            let ingest_config = IngestConfig::for_block(&chain, &config.ingest, block_number);
            Ok(ingest_into(&raw, &ingest_config, &mut sink)?)
        });

        match result {
            Ok(IngestOutcome::Ingested {
                block_id,
                transactions,
                diagnostics,
            }) => tracing::info!(
                block_id,
                transactions,
                diagnostics,
                file = %path.display(),
                "Block ingested"
            ),
            Ok(IngestOutcome::AlreadyIngested(block_id)) => {
                tracing::info!(block_id, file = %path.display(), "Block skipped")
            }
            Err(e) => {
                failures += 1;
                tracing::error!(file = %path.display(), "Block ingestion failed: {:#}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} block file(s) failed", failures, args.blocks.len());
    }
    Ok(())
}
