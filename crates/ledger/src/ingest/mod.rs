// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Block ingestion pipeline.
//!
//! This module is organized into several submodules:
//! - `events` - Per-block event index and attribute normalization
//! - `address` - Address normalization to SS58
//! - `fees` - Fee attribution for signed extrinsics
//! - `decompose` - Recursive call-tree decomposition into records
//! - `digest` - Header digest decoding
//! - `block` - Whole-block orchestration
//! - `sink` - Destinations for ingested blocks
//! - `diagnostics` - Recoverable problems reported beside the data

pub mod address;
pub mod block;
pub mod decompose;
pub mod diagnostics;
pub mod digest;
pub mod events;
pub mod fees;
pub mod sink;

pub use address::{
    ADDRESS20_PREFIX, AddressEncoding, AddressError, AddressNormalizer, CanonicalAddress,
    multisig_account_id, network_name,
};
pub use block::{IngestConfig, IngestError, IngestOutcome, ingest, ingest_into};
pub use decompose::{
    BlockContext, DEFAULT_MAX_DEPTH, DecomposeContext, DecomposeError, Decomposition, collapse,
    decompose,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use digest::{DecodedDigest, DigestError, decode_logs};
pub use events::{
    BatchOutcome, DispatchOutcome, EventAttributes, EventIndex, EventTally, ExtrinsicEvents,
    IndexedEvent, TypedValue,
};
pub use fees::{FeeAttribution, FeeModel, attribute_fee};
pub use sink::{BlockSink, JsonLinesSink, MemorySink, SinkError};
