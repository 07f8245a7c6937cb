// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Denominated token amounts.

use crate::utils::value_as_u128;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Value {0} is not an unsigned integer amount")]
    Unreadable(String),

    #[error("Amount overflowed while summing {0} values")]
    Overflow(usize),
}

/// An integer planck value together with the token decimals it is
/// denominated in.
///
/// Renders (and serializes) as a fixed-point decimal string, e.g. 100 planck
/// at 10 decimals is `0.0000000100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Amount {
    pub planck: u128,
    pub decimals: u8,
}

impl Amount {
    pub fn new(planck: u128, decimals: u8) -> Self {
        Self { planck, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(0, decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.planck == 0
    }

    /// Read a planck amount from a decoded value.
    pub fn from_value(value: &Value, decimals: u8) -> Result<Self, AmountError> {
        value_as_u128(value)
            .map(|planck| Self::new(planck, decimals))
            .ok_or_else(|| AmountError::Unreadable(value.to_string()))
    }

    /// Sum planck values, failing instead of wrapping on overflow.
    pub fn checked_sum(
        values: impl IntoIterator<Item = u128>,
        decimals: u8,
    ) -> Result<Self, AmountError> {
        let mut count = 0usize;
        let mut total = 0u128;
        for v in values {
            count += 1;
            total = total.checked_add(v).ok_or(AmountError::Overflow(count))?;
        }
        Ok(Self::new(total, decimals))
    }

    pub fn saturating_sub(self, other: Amount) -> Self {
        Self::new(self.planck.saturating_sub(other.planck), self.decimals)
    }
}

/// Insert the decimal point into an integer amount.
pub fn apply_denomination(amount: u128, decimals: usize) -> String {
    let str_balance = amount.to_string();

    if str_balance == "0" || decimals == 0 {
        return str_balance;
    }

    if str_balance.len() <= decimals {
        let padding = decimals - str_balance.len();
        format!("0.{}{}", "0".repeat(padding), str_balance)
    } else {
        let split_point = str_balance.len() - decimals;
        format!(
            "{}.{}",
            &str_balance[..split_point],
            &str_balance[split_point..]
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&apply_denomination(self.planck, self.decimals as usize))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_denomination() {
        assert_eq!(apply_denomination(0, 10), "0");
        assert_eq!(apply_denomination(100, 10), "0.0000000100");
        assert_eq!(apply_denomination(12_345_678_900, 10), "1.2345678900");
        assert_eq!(apply_denomination(1_000_000_000_000, 12), "1.000000000000");
        assert_eq!(apply_denomination(42, 0), "42");
    }

    #[test]
    fn test_display_and_serialize() {
        let fee = Amount::new(100, 10);
        assert_eq!(fee.to_string(), "0.0000000100");
        assert_eq!(serde_json::to_value(fee).unwrap(), json!("0.0000000100"));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(
            Amount::from_value(&json!("0x64"), 10).unwrap(),
            Amount::new(100, 10)
        );
        assert!(matches!(
            Amount::from_value(&json!({"Id": "x"}), 10),
            Err(AmountError::Unreadable(_))
        ));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(
            Amount::checked_sum([60, 40], 12).unwrap(),
            Amount::new(100, 12)
        );
        assert_eq!(Amount::checked_sum([], 12).unwrap(), Amount::zero(12));
        assert_eq!(
            Amount::checked_sum([u128::MAX, 1], 12),
            Err(AmountError::Overflow(2))
        );
    }

    #[test]
    fn test_saturating_sub() {
        let fee = Amount::new(100, 12);
        assert_eq!(fee.saturating_sub(Amount::new(30, 12)).planck, 70);
        assert_eq!(fee.saturating_sub(Amount::new(130, 12)).planck, 0);
    }
}
