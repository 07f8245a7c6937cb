// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod amount;
pub mod block;
pub mod call;
pub mod records;

pub use amount::{Amount, AmountError, apply_denomination};
pub use block::{EventPhase, RawBlock, RawDigest, RawEvent, RawExtrinsic, RawHeader};
pub use call::{ArgValue, Call, CallArg};
pub use records::{
    BlockCounters, BlockRow, DigestLogRecord, EventRecord, IngestedBlock, RecordKey,
    TransactionRecord,
};
