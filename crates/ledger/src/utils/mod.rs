// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Helpers shared by the ingestion components.
//!
//! - `numeric` - Integer extraction from decoded JSON values
//! - `format` - Hex encoding helpers

pub mod format;
pub mod numeric;

pub use format::{decode_hex, hex_with_prefix, strip_hex_prefix};
pub use numeric::{value_as_u64, value_as_u128};
