// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fee attribution for signed extrinsics.
//!
//! Runtimes have reported fees in two ways:
//! - Newer runtimes emit `Balances.Withdraw` with the fee, tip excluded
//! - Older runtimes only emit `Balances.Deposit` (block author) and
//!   `Treasury.Deposit`, whose sum includes the tip

use super::events::{EventIndex, IndexedEvent};
use crate::types::{Amount, AmountError};

/// Which events the fee was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    Withdraw,
    LegacyDeposit,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeAttribution {
    pub fee: Amount,
    /// The extrinsic's tip still has to be subtracted from `fee`
    pub tip_adjustment_needed: bool,
    pub model: FeeModel,
    /// Fee events whose amount could not be read, by event index
    pub unreadable: Vec<u32>,
}

impl FeeAttribution {
    /// Final fee once the tip is known.
    pub fn apply_tip(&self, tip: Option<Amount>) -> Amount {
        match tip {
            Some(tip) if self.tip_adjustment_needed => self.fee.saturating_sub(tip),
            _ => self.fee,
        }
    }
}

fn event_amount(event: &IndexedEvent, decimals: u8) -> Result<Amount, AmountError> {
    let value = if event.is("Treasury", "Deposit") {
        event.attributes.amount("value", 0)
    } else {
        event.attributes.amount("amount", 1)
    };
    match value {
        Some(value) => Amount::from_value(value, decimals),
        None => Err(AmountError::Unreadable(format!(
            "{}.{} #{}",
            event.module_id, event.event_id, event.event_idx
        ))),
    }
}

/// Fee paid by the top-level extrinsic `extrinsic_idx`.
pub fn attribute_fee(
    extrinsic_idx: u32,
    token_decimals: u8,
    index: &EventIndex,
) -> Result<FeeAttribution, AmountError> {
    let mut unreadable = Vec::new();

    if let Some(withdraw) = index.fee_events(extrinsic_idx).next() {
        match event_amount(withdraw, token_decimals) {
            Ok(fee) => {
                return Ok(FeeAttribution {
                    fee,
                    tip_adjustment_needed: false,
                    model: FeeModel::Withdraw,
                    unreadable,
                });
            }
            Err(_) => unreadable.push(withdraw.event_idx),
        }
    }

    let mut deposits = Vec::new();
    for event in index.deposit_events(extrinsic_idx) {
        match event_amount(event, token_decimals) {
            Ok(amount) => deposits.push(amount.planck),
            Err(_) => unreadable.push(event.event_idx),
        }
    }

    if deposits.is_empty() {
        return Ok(FeeAttribution {
            fee: Amount::zero(token_decimals),
            tip_adjustment_needed: false,
            model: FeeModel::None,
            unreadable,
        });
    }

    Ok(FeeAttribution {
        fee: Amount::checked_sum(deposits, token_decimals)?,
        tip_adjustment_needed: true,
        model: FeeModel::LegacyDeposit,
        unreadable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawEvent;
    use serde_json::{Value, json};

    fn event(module_id: &str, event_id: &str, attributes: Value) -> RawEvent {
        serde_json::from_value(json!({
            "phase": "ApplyExtrinsic",
            "extrinsic_idx": 1,
            "module_id": module_id,
            "event_id": event_id,
            "attributes": attributes,
        }))
        .unwrap()
    }

    #[test]
    fn test_withdraw_is_the_fee() {
        let index = EventIndex::build(&[
            event("Balances", "Withdraw", json!({"who": "0x01", "amount": 100})),
            event("Balances", "Deposit", json!({"who": "0x02", "amount": 80})),
        ]);
        let attribution = attribute_fee(1, 10, &index).unwrap();

        assert_eq!(attribution.model, FeeModel::Withdraw);
        assert_eq!(attribution.fee, Amount::new(100, 10));
        assert_eq!(attribution.fee.to_string(), "0.0000000100");
        assert!(!attribution.tip_adjustment_needed);
        // Tip is never subtracted from a Withdraw fee
        assert_eq!(attribution.apply_tip(Some(Amount::new(30, 10))).planck, 100);
    }

    #[test]
    fn test_first_withdraw_wins() {
        let index = EventIndex::build(&[
            event("Balances", "Withdraw", json!([{"type": "AccountId", "value": "0x01"}, {"type": "Balance", "value": 7}])),
            event("Balances", "Withdraw", json!([{"type": "AccountId", "value": "0x01"}, {"type": "Balance", "value": 9}])),
        ]);
        assert_eq!(attribute_fee(1, 12, &index).unwrap().fee.planck, 7);
    }

    #[test]
    fn test_legacy_deposits_minus_tip() {
        let index = EventIndex::build(&[
            event("Balances", "Deposit", json!([{"type": "AccountId", "value": "0x02"}, {"type": "Balance", "value": 80}])),
            event("Treasury", "Deposit", json!([{"type": "Balance", "value": 20}])),
        ]);
        let attribution = attribute_fee(1, 12, &index).unwrap();

        assert_eq!(attribution.model, FeeModel::LegacyDeposit);
        assert_eq!(attribution.fee.planck, 100);
        assert!(attribution.tip_adjustment_needed);
        assert_eq!(attribution.apply_tip(Some(Amount::new(30, 12))).planck, 70);
        assert_eq!(attribution.apply_tip(None).planck, 100);
        // A tip above the deposits cannot go negative
        assert_eq!(attribution.apply_tip(Some(Amount::new(500, 12))).planck, 0);
    }

    #[test]
    fn test_no_fee_events() {
        let index = EventIndex::build(&[event("System", "ExtrinsicSuccess", json!([]))]);
        let attribution = attribute_fee(1, 10, &index).unwrap();

        assert_eq!(attribution.model, FeeModel::None);
        assert!(attribution.fee.is_zero());
        assert!(!attribution.tip_adjustment_needed);
        assert!(attribute_fee(5, 10, &index).unwrap().fee.is_zero());
    }

    #[test]
    fn test_unreadable_withdraw_falls_back_to_deposits() {
        let index = EventIndex::build(&[
            event("Balances", "Withdraw", json!({"who": "0x01", "amount": "lots"})),
            event("Treasury", "Deposit", json!({"value": 40})),
        ]);
        let attribution = attribute_fee(1, 10, &index).unwrap();

        assert_eq!(attribution.model, FeeModel::LegacyDeposit);
        assert_eq!(attribution.fee.planck, 40);
        assert_eq!(attribution.unreadable, vec![0]);
    }

    #[test]
    fn test_overflowing_deposits() {
        let max = u128::MAX.to_string();
        let index = EventIndex::build(&[
            event("Balances", "Deposit", json!({"who": "0x02", "amount": max})),
            event("Treasury", "Deposit", json!({"value": 1})),
        ]);
        assert!(matches!(
            attribute_fee(1, 10, &index),
            Err(AmountError::Overflow(2))
        ));
    }
}
