// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Extrinsic decomposition.
//!
//! A top-level extrinsic is walked depth first. Every call in the tree,
//! wrappers included, becomes one [`TransactionRecord`]:
//!
//! - `Utility.batch`/`batch_all`/`force_batch`: inner calls become siblings
//!   with 1-based `batch_idx`, and every sibling from the interruption point
//!   on is failed
//! - `Utility.as_derivative`: the inner call, `batch_idx` 1
//! - `Multisig.as_multi`/`as_multi_threshold_1`, `Proxy.proxy`/`proxy_announced`:
//!   the inner call, only when the matching `Executed` event fired
//!
//! Wrappers emit their completion event after everything they dispatched,
//! so batch and `Executed` events arrive in post-order. Before the walk,
//! [`Dispatches`] visits the tree root first with children in reverse,
//! which is exactly that order backwards, and hands each executed wrapper
//! the last event not yet claimed.
//!
//! Each expansion takes a fresh `nesting_idx`, larger than its parent's, so
//! record keys stay unique even when batches nest.

use super::address::{AddressEncoding, AddressNormalizer, CanonicalAddress, multisig_account_id};
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::events::{BatchOutcome, DispatchOutcome, EventIndex, ExtrinsicEvents};
use super::fees::attribute_fee;
use crate::types::{Amount, ArgValue, Call, RawExtrinsic, TransactionRecord};
use crate::utils::value_as_u64;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecomposeError {
    #[error("Call nesting depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },
}

/// Block-wide inputs shared by every extrinsic of the block.
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub block_id: u64,
    pub token_decimals: u8,
    pub spec_version: Option<u32>,
    /// Block timestamp in milliseconds
    pub timestamp: Option<u64>,
    pub normalizer: AddressNormalizer,
    pub max_depth: usize,
}

/// Position and inherited state of one call in the tree.
#[derive(Debug, Clone)]
pub struct DecomposeContext {
    pub depth: usize,
    pub nesting_idx: u32,
    pub batch_idx: u32,
    pub success: bool,
    pub signed: bool,
    pub from_address: Option<CanonicalAddress>,
}

impl DecomposeContext {
    fn child(&self, nesting_idx: u32, batch_idx: u32) -> Self {
        Self {
            depth: self.depth + 1,
            nesting_idx,
            batch_idx,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decomposition {
    pub records: Vec<TransactionRecord>,
    pub touched_addresses: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}

/// Fields only the top-level record carries.
#[derive(Debug, Clone, Default)]
struct TopLevel {
    fee: Option<Amount>,
    tip: Option<Amount>,
    nonce: Option<u64>,
    signature: Option<String>,
    extrinsic_hash: Option<String>,
    extrinsic_length: Option<u32>,
}

fn is_batch(call: &Call) -> bool {
    call.module_id == "Utility"
        && matches!(
            call.function_id.as_str(),
            "batch" | "batch_all" | "force_batch"
        )
}

fn is_proxy(call: &Call) -> bool {
    call.module_id == "Proxy" && matches!(call.function_id.as_str(), "proxy" | "proxy_announced")
}

fn is_multisig(call: &Call) -> bool {
    call.module_id == "Multisig"
        && matches!(
            call.function_id.as_str(),
            "as_multi" | "as_multi_threshold_1"
        )
}

/// Completion events matched to the wrapper calls that emitted them,
/// keyed by call identity within one extrinsic's tree.
#[derive(Debug, Default)]
struct Dispatches {
    batches: HashMap<*const Call, BatchOutcome>,
    wrappers: HashMap<*const Call, DispatchOutcome>,
}

/// Unclaimed events, popped from the back.
struct Pending {
    batches: Vec<BatchOutcome>,
    proxies: Vec<DispatchOutcome>,
    multisigs: Vec<DispatchOutcome>,
}

impl Dispatches {
    fn new(call: &Call, events: &ExtrinsicEvents, max_depth: usize) -> Self {
        let mut pending = Pending {
            batches: events.batch_outcomes.clone(),
            proxies: events.proxy_executed.clone(),
            multisigs: events.multisig_executed.clone(),
        };
        let mut dispatches = Self::default();
        dispatches.claim(call, 0, max_depth, &mut pending);
        dispatches
    }

    /// `call` was dispatched; claim its event, then those of whatever it
    /// dispatched in turn.
    fn claim(&mut self, call: &Call, depth: usize, max_depth: usize, pending: &mut Pending) {
        if depth > max_depth {
            return;
        }
        let key: *const Call = call;

        if is_batch(call) {
            let Some(calls) = call.inner_calls() else {
                return;
            };
            // A batch without a completion event is taken as completed
            let outcome = pending.batches.pop().unwrap_or(BatchOutcome::Completed);
            self.batches.insert(key, outcome);
            // The interrupting call was rolled back and later ones never ran
            let ran = outcome
                .interrupted_at()
                .map_or(calls.len(), |at| calls.len().min(at as usize));
            for inner in calls[..ran].iter().rev() {
                self.claim(inner, depth + 1, max_depth, pending);
            }
            return;
        }

        if call.is("Utility", "as_derivative") {
            if let Some(inner) = call.inner_call() {
                self.claim(inner, depth + 1, max_depth, pending);
            }
            return;
        }

        let outcome = if is_proxy(call) {
            pending.proxies.pop()
        } else if is_multisig(call) {
            pending.multisigs.pop()
        } else {
            None
        };
        let Some(outcome) = outcome else {
            return;
        };
        self.wrappers.insert(key, outcome);
        if outcome.is_ok()
            && let Some(inner) = call.inner_call()
        {
            self.claim(inner, depth + 1, max_depth, pending);
        }
    }

    fn interrupted_at(&self, call: &Call) -> Option<u32> {
        let key: *const Call = call;
        self.batches.get(&key).and_then(BatchOutcome::interrupted_at)
    }

    fn executed(&self, call: &Call) -> Option<DispatchOutcome> {
        let key: *const Call = call;
        self.wrappers.get(&key).copied()
    }
}

struct Walker<'a> {
    extrinsic_idx: u32,
    block: &'a BlockContext,
    dispatches: Dispatches,
    next_nesting: u32,
    top: TopLevel,
    out: Decomposition,
}

/// Flatten one top-level extrinsic into transaction records.
pub fn decompose(
    extrinsic: &RawExtrinsic,
    extrinsic_idx: u32,
    block: &BlockContext,
    events: &EventIndex,
) -> Result<Decomposition, DecomposeError> {
    let mut walker = Walker::new(extrinsic, extrinsic_idx, block, events);
    let ctx = walker.root_context(extrinsic, events);
    walker.walk(&extrinsic.call, ctx)?;
    Ok(walker.out)
}

/// The single failed record that stands in for an extrinsic whose call tree
/// could not be decomposed.
pub fn collapse(
    extrinsic: &RawExtrinsic,
    extrinsic_idx: u32,
    block: &BlockContext,
    events: &EventIndex,
) -> Decomposition {
    let mut walker = Walker::new(extrinsic, extrinsic_idx, block, events);
    let mut ctx = walker.root_context(extrinsic, events);
    ctx.success = false;
    let record = walker.record(&extrinsic.call, &ctx);
    walker.out.records.push(record);
    walker.out
}

fn is_balance_type(declared_type: &str) -> bool {
    declared_type.contains("Balance")
}

fn is_destination_type(declared_type: &str) -> bool {
    declared_type == "Address"
        || declared_type.contains("LookupSource")
        || declared_type.contains("MultiAddress")
        || declared_type.contains("AccountIdLookupOf")
        || declared_type.contains("StaticLookup>::Source")
}

impl<'a> Walker<'a> {
    fn new(
        extrinsic: &RawExtrinsic,
        extrinsic_idx: u32,
        block: &'a BlockContext,
        events: &'a EventIndex,
    ) -> Self {
        // Nothing a failed extrinsic dispatched left any events behind
        let dispatches = match events.extrinsic(extrinsic_idx) {
            Some(outcome) if events.succeeded(extrinsic_idx) => {
                Dispatches::new(&extrinsic.call, outcome, block.max_depth)
            }
            _ => Dispatches::default(),
        };

        let mut walker = Self {
            extrinsic_idx,
            block,
            dispatches,
            next_nesting: 1,
            top: TopLevel::default(),
            out: Decomposition::default(),
        };
        walker.top = walker.top_level(extrinsic, events);
        walker
    }

    fn diagnose(&mut self, kind: DiagnosticKind, message: String) {
        self.out
            .diagnostics
            .push(kind, Some(self.extrinsic_idx), message);
    }

    fn top_level(&mut self, extrinsic: &RawExtrinsic, events: &EventIndex) -> TopLevel {
        let decimals = self.block.token_decimals;
        let mut top = TopLevel {
            signature: extrinsic.signature_hex(),
            extrinsic_hash: extrinsic.extrinsic_hash.clone(),
            extrinsic_length: extrinsic.extrinsic_length,
            ..Default::default()
        };

        if !extrinsic.signed {
            return top;
        }

        if let Some(raw_tip) = &extrinsic.tip {
            match Amount::from_value(raw_tip, decimals) {
                Ok(tip) => top.tip = Some(tip),
                Err(e) => self.diagnose(DiagnosticKind::ArgumentDecode, format!("tip: {}", e)),
            }
        }

        if let Some(raw_nonce) = &extrinsic.nonce {
            match value_as_u64(raw_nonce) {
                Some(nonce) => top.nonce = Some(nonce),
                None => self.diagnose(
                    DiagnosticKind::ArgumentDecode,
                    format!("nonce: unreadable value {}", raw_nonce),
                ),
            }
        }

        match attribute_fee(self.extrinsic_idx, decimals, events) {
            Ok(attribution) => {
                for event_idx in &attribution.unreadable {
                    self.diagnose(
                        DiagnosticKind::FeeEvent,
                        format!("fee event {} has no readable amount", event_idx),
                    );
                }
                top.fee = Some(attribution.apply_tip(top.tip));
            }
            Err(e) => self.diagnose(DiagnosticKind::FeeEvent, e.to_string()),
        }

        top
    }

    fn root_context(&mut self, extrinsic: &RawExtrinsic, events: &EventIndex) -> DecomposeContext {
        let from_address = match &extrinsic.address {
            Some(raw) if extrinsic.signed => match self.block.normalizer.try_normalize(raw) {
                Ok(address) => {
                    self.out.touched_addresses.insert(address.address.clone());
                    Some(address)
                }
                Err(e) => {
                    self.diagnose(
                        DiagnosticKind::AddressNormalization,
                        format!("signer: {}", e),
                    );
                    None
                }
            },
            _ => None,
        };

        DecomposeContext {
            depth: 0,
            nesting_idx: 0,
            batch_idx: 0,
            success: events.succeeded(self.extrinsic_idx),
            signed: extrinsic.signed,
            from_address,
        }
    }

    fn allocate_nesting(&mut self) -> u32 {
        let nesting_idx = self.next_nesting;
        self.next_nesting += 1;
        nesting_idx
    }

    fn walk(&mut self, call: &Call, ctx: DecomposeContext) -> Result<(), DecomposeError> {
        if ctx.depth > self.block.max_depth {
            return Err(DecomposeError::DepthExceeded {
                depth: ctx.depth,
                max: self.block.max_depth,
            });
        }

        let wrapper = matches!(
            (call.module_id.as_str(), call.function_id.as_str()),
            ("Utility", "batch" | "batch_all" | "force_batch" | "as_derivative")
                | ("Multisig", "as_multi" | "as_multi_threshold_1")
                | ("Proxy", "proxy" | "proxy_announced")
        );

        let mut record = self.record(call, &ctx);
        if !wrapper {
            self.scan_arguments(call, &mut record);
        }
        self.log_transfer(&record);
        self.out.records.push(record);

        match (call.module_id.as_str(), call.function_id.as_str()) {
            ("Utility", "batch" | "batch_all" | "force_batch") => self.walk_batch(call, ctx),
            ("Utility", "as_derivative") => {
                let Some(inner) = self.inner_call(call) else {
                    return Ok(());
                };
                let nesting_idx = self.allocate_nesting();
                self.walk(inner, ctx.child(nesting_idx, 1))
            }
            ("Multisig", "as_multi" | "as_multi_threshold_1") => self.walk_multisig(call, ctx),
            ("Proxy", "proxy" | "proxy_announced") => self.walk_proxy(call, ctx),
            _ => Ok(()),
        }
    }

    fn walk_batch(&mut self, call: &Call, ctx: DecomposeContext) -> Result<(), DecomposeError> {
        let Some(calls) = call.inner_calls() else {
            self.diagnose(
                DiagnosticKind::ArgumentDecode,
                format!("{}.{}: no decodable inner calls", call.module_id, call.function_id),
            );
            return Ok(());
        };

        let nesting_idx = self.allocate_nesting();
        let interrupted_at = self.dispatches.interrupted_at(call);

        for (i, inner) in calls.iter().enumerate() {
            let batch_idx = i as u32 + 1;
            let mut child = ctx.child(nesting_idx, batch_idx);
            if let Some(k) = interrupted_at
                && batch_idx > k
            {
                child.success = false;
            }
            self.walk(inner, child)?;
        }
        Ok(())
    }

    fn walk_proxy(&mut self, call: &Call, ctx: DecomposeContext) -> Result<(), DecomposeError> {
        if !ctx.success {
            return Ok(());
        }
        let Some(outcome) = self.dispatches.executed(call) else {
            return Ok(());
        };

        let Some(inner) = self.inner_call(call) else {
            return Ok(());
        };

        let mut child = ctx.child(self.allocate_nesting(), 1);
        child.success = ctx.success && outcome.is_ok();
        if let Some(real) = call.plain_arg("real") {
            match self.block.normalizer.try_normalize(real) {
                Ok(address) => {
                    self.out.touched_addresses.insert(address.address.clone());
                    child.from_address = Some(address);
                }
                Err(e) => {
                    self.diagnose(DiagnosticKind::AddressNormalization, format!("real: {}", e));
                    child.from_address = None;
                }
            }
        }
        self.walk(inner, child)
    }

    fn walk_multisig(&mut self, call: &Call, ctx: DecomposeContext) -> Result<(), DecomposeError> {
        if !ctx.success {
            return Ok(());
        }
        let Some(outcome) = self.dispatches.executed(call) else {
            return Ok(());
        };

        let Some(inner) = self.inner_call(call) else {
            return Ok(());
        };

        let mut child = ctx.child(self.allocate_nesting(), 1);
        child.success = ctx.success && outcome.is_ok();
        child.from_address = self.multisig_origin(call, ctx.from_address.as_ref());
        if let Some(origin) = &child.from_address {
            self.out.touched_addresses.insert(origin.address.clone());
        }
        self.walk(inner, child)
    }

    /// Account of the multisig formed by the signer and `other_signatories`.
    fn multisig_origin(
        &mut self,
        call: &Call,
        signer: Option<&CanonicalAddress>,
    ) -> Option<CanonicalAddress> {
        let threshold = if call.function_id == "as_multi_threshold_1" {
            Some(1)
        } else {
            call.plain_arg("threshold")
                .and_then(value_as_u64)
                .and_then(|t| u16::try_from(t).ok())
        };

        let signatories: Option<Vec<[u8; 32]>> = call
            .plain_arg("other_signatories")
            .and_then(Value::as_array)
            .and_then(|others| {
                others
                    .iter()
                    .map(|raw| self.block.normalizer.normalize(raw)?.account_id)
                    .chain(std::iter::once(signer.and_then(|s| s.account_id)))
                    .collect()
            });

        match (signatories, threshold) {
            (Some(signatories), Some(threshold)) => {
                let account = multisig_account_id(&signatories, threshold);
                Some(
                    self.block
                        .normalizer
                        .encode_account_id(account, AddressEncoding::Id),
                )
            }
            _ => {
                self.diagnose(
                    DiagnosticKind::ArgumentDecode,
                    format!(
                        "{}.{}: cannot derive the multisig account",
                        call.module_id, call.function_id
                    ),
                );
                None
            }
        }
    }

    fn inner_call<'c>(&mut self, call: &'c Call) -> Option<&'c Call> {
        let inner = call.inner_call();
        if inner.is_none() {
            self.diagnose(
                DiagnosticKind::ArgumentDecode,
                format!("{}.{}: no decodable inner call", call.module_id, call.function_id),
            );
        }
        inner
    }

    fn record(&self, call: &Call, ctx: &DecomposeContext) -> TransactionRecord {
        let top_level = ctx.depth == 0;
        let top = if top_level {
            self.top.clone()
        } else {
            TopLevel {
                extrinsic_hash: call.call_hash.clone(),
                ..Default::default()
            }
        };

        TransactionRecord {
            block_id: self.block.block_id,
            extrinsic_idx: self.extrinsic_idx,
            nesting_idx: ctx.nesting_idx,
            batch_idx: ctx.batch_idx,
            module_id: call.module_id.clone(),
            function_id: call.function_id.clone(),
            signed: ctx.signed,
            success: ctx.success,
            from_address: ctx.from_address.as_ref().map(|a| a.address.clone()),
            to_address: None,
            value: None,
            fee: top.fee,
            tip: top.tip,
            nonce: top.nonce,
            signature: top.signature,
            extrinsic_hash: top.extrinsic_hash,
            extrinsic_length: top.extrinsic_length,
            spec_version: self.block.spec_version,
            timestamp: self.block.timestamp,
        }
    }

    /// Fill `value` and `to_address` from the first readable argument of
    /// each kind.
    fn scan_arguments(&mut self, call: &Call, record: &mut TransactionRecord) {
        for arg in &call.args {
            let ArgValue::Plain(value) = &arg.value else {
                continue;
            };

            if record.value.is_none() && is_balance_type(&arg.declared_type) {
                match Amount::from_value(value, self.block.token_decimals) {
                    Ok(amount) => record.value = Some(amount),
                    Err(e) => self.diagnose(
                        DiagnosticKind::ArgumentDecode,
                        format!("{}.{} {}: {}", call.module_id, call.function_id, arg.name, e),
                    ),
                }
            } else if record.to_address.is_none() && is_destination_type(&arg.declared_type) {
                match self.block.normalizer.try_normalize(value) {
                    Ok(address) => {
                        self.out.touched_addresses.insert(address.address.clone());
                        record.to_address = Some(address.address);
                    }
                    Err(e) => self.diagnose(
                        DiagnosticKind::AddressNormalization,
                        format!("{}.{} {}: {}", call.module_id, call.function_id, arg.name, e),
                    ),
                }
            }
        }
    }

    fn log_transfer(&self, record: &TransactionRecord) {
        if let (Some(value), Some(to)) = (&record.value, &record.to_address)
            && !value.is_zero()
        {
            tracing::info!(
                block_id = record.block_id,
                extrinsic_idx = record.extrinsic_idx,
                nesting_idx = record.nesting_idx,
                batch_idx = record.batch_idx,
                success = record.success,
                "Transfer of {} from {} to {}",
                value,
                record.from_address.as_deref().unwrap_or("-"),
                to
            );
        }
    }
}
