// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Address normalization.
//!
//! Every address the ledger stores is an SS58 string under the configured
//! network id, except 20-byte keys, which keep a fixed `Address20:` tag.

use crate::utils::decode_hex;
use parity_scale_codec::Encode;
use serde::Serialize;
use serde_json::Value;
use sp_core::crypto::{AccountId32, Ss58AddressFormat, Ss58Codec};
use sp_core::hashing::blake2_256;
use std::fmt;
use thiserror::Error;

/// Prefix marking addresses from the 20-byte namespace.
pub const ADDRESS20_PREFIX: &str = "Address20:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid hex address '{0}'")]
    InvalidHex(String),

    #[error("Address decodes to {0} bytes, expected 20, 32 or 33")]
    InvalidLength(usize),

    #[error("Invalid SS58 address '{0}'")]
    InvalidSs58(String),

    #[error("Account indices cannot be resolved without chain state")]
    UnresolvableIndex,

    #[error("Unsupported address shape: {0}")]
    UnsupportedShape(String),
}

/// How an address was encoded before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressEncoding {
    Hex,
    Ss58,
    Id,
    Address20,
    Address32,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalAddress {
    pub address: String,
    pub orig_encoding: AddressEncoding,
    /// The 32-byte account id, unset for 20-byte addresses
    pub account_id: Option<[u8; 32]>,
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AddressNormalizer {
    ss58_prefix: u16,
}

impl AddressNormalizer {
    pub fn new(ss58_prefix: u16) -> Self {
        Self { ss58_prefix }
    }

    pub fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// Normalize, degrading every failure to `None`.
    pub fn normalize(&self, raw: &Value) -> Option<CanonicalAddress> {
        match self.try_normalize(raw) {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::debug!(raw = %raw, error = %e, "Address not normalized");
                None
            }
        }
    }

    pub fn try_normalize(&self, raw: &Value) -> Result<CanonicalAddress, AddressError> {
        match raw {
            Value::String(s) => self.normalize_str(s),
            Value::Object(map) => {
                let (variant, inner) = match map.iter().next() {
                    Some(entry) if map.len() == 1 => entry,
                    _ => return Err(AddressError::UnsupportedShape(raw.to_string())),
                };
                match variant.to_ascii_lowercase().as_str() {
                    "id" => {
                        let mut address = self.try_normalize(inner)?;
                        address.orig_encoding = AddressEncoding::Id;
                        Ok(address)
                    }
                    "address20" => {
                        let bytes = bytes_of(inner)?;
                        if bytes.len() != 20 {
                            return Err(AddressError::InvalidLength(bytes.len()));
                        }
                        Ok(self.tag_address20(&bytes))
                    }
                    "address32" | "raw" => {
                        let bytes = bytes_of(inner)?;
                        let account = <[u8; 32]>::try_from(bytes.as_slice())
                            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
                        let encoding = if variant.eq_ignore_ascii_case("raw") {
                            AddressEncoding::Raw
                        } else {
                            AddressEncoding::Address32
                        };
                        Ok(self.encode_account_id(account, encoding))
                    }
                    "index" => Err(AddressError::UnresolvableIndex),
                    _ => Err(AddressError::UnsupportedShape(raw.to_string())),
                }
            }
            Value::Array(_) => {
                let bytes = bytes_of(raw)?;
                self.decode_bytes(&bytes, AddressEncoding::Raw)
            }
            _ => Err(AddressError::UnsupportedShape(raw.to_string())),
        }
    }

    fn normalize_str(&self, s: &str) -> Result<CanonicalAddress, AddressError> {
        if is_hex_address(s) {
            let bytes = decode_hex(s).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
            return self.decode_bytes(&bytes, AddressEncoding::Hex);
        }

        if let Some(hex_part) = s.strip_prefix(ADDRESS20_PREFIX) {
            let bytes =
                decode_hex(hex_part).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
            if bytes.len() != 20 {
                return Err(AddressError::InvalidLength(bytes.len()));
            }
            return Ok(self.tag_address20(&bytes));
        }

        let (account, _) = AccountId32::from_ss58check_with_version(s)
            .map_err(|_| AddressError::InvalidSs58(s.to_string()))?;
        let bytes: &[u8; 32] = account.as_ref();
        Ok(self.encode_account_id(*bytes, AddressEncoding::Ss58))
    }

    fn decode_bytes(
        &self,
        bytes: &[u8],
        encoding: AddressEncoding,
    ) -> Result<CanonicalAddress, AddressError> {
        match bytes.len() {
            32 => {
                let mut account = [0u8; 32];
                account.copy_from_slice(bytes);
                Ok(self.encode_account_id(account, encoding))
            }
            // MultiAddress::Id: variant byte 0x00 + 32 bytes
            33 if bytes[0] == 0x00 => {
                let mut account = [0u8; 32];
                account.copy_from_slice(&bytes[1..]);
                Ok(self.encode_account_id(account, encoding))
            }
            20 => Ok(self.tag_address20(bytes)),
            len => Err(AddressError::InvalidLength(len)),
        }
    }

    /// Canonical form of a known 32-byte account id.
    pub fn encode_account_id(
        &self,
        account: [u8; 32],
        encoding: AddressEncoding,
    ) -> CanonicalAddress {
        let address = AccountId32::from(account)
            .to_ss58check_with_version(Ss58AddressFormat::custom(self.ss58_prefix));
        CanonicalAddress {
            address,
            orig_encoding: encoding,
            account_id: Some(account),
        }
    }

    fn tag_address20(&self, bytes: &[u8]) -> CanonicalAddress {
        CanonicalAddress {
            address: format!("{}{}", ADDRESS20_PREFIX, hex::encode(bytes)),
            orig_encoding: AddressEncoding::Address20,
            account_id: None,
        }
    }
}

fn is_hex_address(s: &str) -> bool {
    if s.starts_with("0x") {
        return true;
    }
    matches!(s.len(), 64 | 66) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Bytes from a hex string or a JSON byte array.
fn bytes_of(value: &Value) -> Result<Vec<u8>, AddressError> {
    match value {
        Value::String(s) => decode_hex(s).map_err(|_| AddressError::InvalidHex(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| AddressError::UnsupportedShape(value.to_string())),
        _ => Err(AddressError::UnsupportedShape(value.to_string())),
    }
}

/// Deterministic account id of a multisig, from all signatories and the
/// threshold.
pub fn multisig_account_id(signatories: &[[u8; 32]], threshold: u16) -> [u8; 32] {
    let mut sorted = signatories.to_vec();
    sorted.sort();
    sorted.dedup();
    (b"modlpy/utilisuba", sorted, threshold).using_encoded(blake2_256)
}

/// Human-readable network name for an SS58 prefix.
pub fn network_name(prefix: u16) -> String {
    use ss58_registry::Ss58AddressFormatRegistry;

    match Ss58AddressFormatRegistry::try_from(Ss58AddressFormat::custom(prefix)) {
        Ok(registry) => registry.to_string(),
        Err(_) => format!("unknown-{}", prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hex_with_prefix;
    use serde_json::json;

    // Alice
    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_POLKADOT: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
    const ALICE_GENERIC: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    #[test]
    fn test_hex_32_bytes() {
        let normalizer = AddressNormalizer::new(0);
        let address = normalizer.normalize(&json!(ALICE_HEX)).unwrap();
        assert_eq!(address.address, ALICE_POLKADOT);
        assert_eq!(address.orig_encoding, AddressEncoding::Hex);
        assert_eq!(hex_with_prefix(&address.account_id.unwrap()), ALICE_HEX);
    }

    #[test]
    fn test_hex_without_prefix() {
        let normalizer = AddressNormalizer::new(42);
        let bare = ALICE_HEX.trim_start_matches("0x");
        assert_eq!(normalizer.normalize(&json!(bare)).unwrap().address, ALICE_GENERIC);
    }

    #[test]
    fn test_hex_with_id_discriminant() {
        let normalizer = AddressNormalizer::new(0);
        let with_variant = format!("0x00{}", &ALICE_HEX[2..]);
        assert_eq!(
            normalizer.normalize(&json!(with_variant)).unwrap().address,
            ALICE_POLKADOT
        );

        // 33 bytes with any other leading byte is not an Id
        let other_variant = format!("0x01{}", &ALICE_HEX[2..]);
        assert_eq!(
            normalizer.try_normalize(&json!(other_variant)),
            Err(AddressError::InvalidLength(33))
        );
    }

    #[test]
    fn test_ss58_is_reencoded() {
        let normalizer = AddressNormalizer::new(0);
        let address = normalizer.normalize(&json!(ALICE_GENERIC)).unwrap();
        assert_eq!(address.address, ALICE_POLKADOT);
        assert_eq!(address.orig_encoding, AddressEncoding::Ss58);
    }

    #[test]
    fn test_bad_checksum_is_none() {
        let normalizer = AddressNormalizer::new(0);
        // Last character changed
        let corrupted = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp6";
        assert_eq!(normalizer.normalize(&json!(corrupted)), None);
        assert!(matches!(
            normalizer.try_normalize(&json!(corrupted)),
            Err(AddressError::InvalidSs58(_))
        ));
    }

    #[test]
    fn test_variants_agree() {
        let normalizer = AddressNormalizer::new(0);
        let inputs = [
            json!(ALICE_HEX),
            json!({"Id": ALICE_HEX}),
            json!({"Id": ALICE_POLKADOT}),
            json!({"Address32": ALICE_HEX}),
            json!({"Raw": ALICE_HEX}),
            json!({"id": ALICE_GENERIC}),
        ];
        for input in inputs {
            let address = normalizer.normalize(&input).unwrap();
            assert_eq!(address.address, ALICE_POLKADOT, "input {}", input);
        }
    }

    #[test]
    fn test_address20() {
        let normalizer = AddressNormalizer::new(0);
        let key = "0x6Be02d1d3665660d22FF9624b7BE0551ee1Ac91b";
        let address = normalizer.normalize(&json!({"Address20": key})).unwrap();
        assert_eq!(address.address, "Address20:6be02d1d3665660d22ff9624b7be0551ee1ac91b");
        assert_eq!(address.account_id, None);

        // Tagged form round-trips
        let again = normalizer.normalize(&json!(address.address)).unwrap();
        assert_eq!(again.address, address.address);

        // Bare 20-byte hex lands in the same namespace
        assert_eq!(normalizer.normalize(&json!(key)).unwrap().address, address.address);
    }

    #[test]
    fn test_unresolvable_and_malformed() {
        let normalizer = AddressNormalizer::new(0);
        assert_eq!(
            normalizer.try_normalize(&json!({"Index": 5})),
            Err(AddressError::UnresolvableIndex)
        );
        assert_eq!(normalizer.normalize(&json!({"Raw": "0x0102"})), None);
        assert_eq!(normalizer.normalize(&json!("0xzz")), None);
        assert_eq!(normalizer.normalize(&json!(12)), None);
        assert_eq!(normalizer.normalize(&json!({"Id": ALICE_HEX, "Raw": ALICE_HEX})), None);
        assert_eq!(normalizer.normalize(&json!({"Other": ALICE_HEX})), None);
    }

    #[test]
    fn test_byte_array_input() {
        let normalizer = AddressNormalizer::new(0);
        let bytes: Vec<u8> = decode_hex(ALICE_HEX).unwrap();
        let address = normalizer.normalize(&json!({"Id": bytes})).unwrap();
        assert_eq!(address.address, ALICE_POLKADOT);
    }

    #[test]
    fn test_multisig_account_ignores_order() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        assert_eq!(multisig_account_id(&[a, b, c], 2), multisig_account_id(&[c, a, b], 2));
        assert_ne!(multisig_account_id(&[a, b, c], 2), multisig_account_id(&[a, b, c], 3));
    }

    #[test]
    fn test_network_name() {
        assert_eq!(network_name(0), "polkadot");
        assert_eq!(network_name(2), "kusama");
    }
}
