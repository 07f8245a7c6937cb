// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod ingest;
pub mod logging;
pub mod types;
pub mod utils;
