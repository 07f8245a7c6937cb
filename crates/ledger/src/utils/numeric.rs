// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Numeric extraction utilities for JSON values.
//!
//! The chain client hands over balances and indices in several shapes
//! depending on the runtime: plain numbers, decimal strings, `0x` hex strings,
//! or single-field wrappers such as `{"primitive": 23}`.

use serde_json::Value;

/// Extract an unsigned 128-bit integer from a decoded value.
///
/// Returns `None` for negative numbers, fractions, and anything that is not a
/// recognisable integer encoding.
pub fn value_as_u128(value: &Value) -> Option<u128> {
    match value {
        // arbitrary_precision keeps the literal digits, so u128 values survive
        Value::Number(n) => n.to_string().parse::<u128>().ok(),
        Value::String(s) => {
            let s = s.trim().trim_matches(|c| c == '(' || c == ')');
            if let Some(hex_digits) = s.strip_prefix("0x") {
                u128::from_str_radix(hex_digits, 16).ok()
            } else {
                s.replace(',', "").parse::<u128>().ok()
            }
        }
        Value::Object(map) => {
            // Compact/newtype wrappers
            for key in ["primitive", "value", "0"] {
                if let Some(inner) = map.get(key) {
                    return value_as_u128(inner);
                }
            }
            None
        }
        Value::Array(arr) if arr.len() == 1 => value_as_u128(&arr[0]),
        _ => None,
    }
}

/// As [`value_as_u128`], narrowed to `u64`.
pub fn value_as_u64(value: &Value) -> Option<u64> {
    value_as_u128(value).and_then(|n| u64::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(value_as_u128(&json!(0)), Some(0));
        assert_eq!(value_as_u128(&json!(12345)), Some(12345));
    }

    #[test]
    fn test_numbers_beyond_u64() {
        let value: Value = serde_json::from_str("340282366920938463463374607431768211455").unwrap();
        assert_eq!(value_as_u128(&value), Some(u128::MAX));
        assert_eq!(value_as_u64(&value), None);
    }

    #[test]
    fn test_strings() {
        assert_eq!(value_as_u128(&json!("1000")), Some(1000));
        assert_eq!(value_as_u128(&json!("0x10")), Some(16));
        assert_eq!(value_as_u128(&json!("(23)")), Some(23));
        assert_eq!(value_as_u128(&json!("1,000")), Some(1000));
    }

    #[test]
    fn test_wrappers() {
        assert_eq!(value_as_u128(&json!({"primitive": 23})), Some(23));
        assert_eq!(value_as_u128(&json!([7])), Some(7));
    }

    #[test]
    fn test_rejects_non_integers() {
        assert_eq!(value_as_u128(&json!(-1)), None);
        assert_eq!(value_as_u128(&json!(1.5)), None);
        assert_eq!(value_as_u128(&json!("abc")), None);
        assert_eq!(value_as_u128(&json!(null)), None);
        assert_eq!(value_as_u128(&json!({"other": 1})), None);
        assert_eq!(value_as_u128(&json!([1, 2])), None);
    }
}
