// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Destinations for ingested blocks.

use crate::types::IngestedBlock;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Block {0} is already stored")]
    Duplicate(u64),

    #[error("Failed to write block: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize block: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where ingested blocks go. Implementations deduplicate on the block.
pub trait BlockSink {
    /// Whether the block with this number and hash was stored before.
    fn contains(&self, block_id: u64, hash: &str) -> bool;

    fn store(&mut self, block: IngestedBlock) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
pub struct MemorySink {
    blocks: BTreeMap<u64, IngestedBlock>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block_id: u64) -> Option<&IngestedBlock> {
        self.blocks.get(&block_id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockSink for MemorySink {
    fn contains(&self, block_id: u64, hash: &str) -> bool {
        self.blocks
            .get(&block_id)
            .is_some_and(|b| b.block.hash == hash)
    }

    fn store(&mut self, block: IngestedBlock) -> Result<(), SinkError> {
        let block_id = block.block.id;
        if self.contains(block_id, &block.block.hash) {
            return Err(SinkError::Duplicate(block_id));
        }
        self.blocks.insert(block_id, block);
        Ok(())
    }
}

/// Writes each block as one JSON document per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    pretty: bool,
    seen: HashSet<(u64, String)>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            seen: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> BlockSink for JsonLinesSink<W> {
    fn contains(&self, block_id: u64, hash: &str) -> bool {
        self.seen.contains(&(block_id, hash.to_string()))
    }

    fn store(&mut self, block: IngestedBlock) -> Result<(), SinkError> {
        let key = (block.block.id, block.block.hash.clone());
        if self.seen.contains(&key) {
            return Err(SinkError::Duplicate(key.0));
        }

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &block)?;
        } else {
            serde_json::to_writer(&mut self.writer, &block)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.seen.insert(key);
        Ok(())
    }
}
