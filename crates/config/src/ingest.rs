// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::ConfigError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IngestSettings {
    /// Deepest wrapper nesting accepted before a top-level extrinsic is
    /// recorded as a single failed record
    ///
    /// Env: PLI_INGEST_MAX_NESTING_DEPTH
    /// Valid values: 1..=64
    /// Default: 8
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_max_nesting_depth() -> usize {
    8
}

impl IngestSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.max_nesting_depth) {
            return Err(ConfigError::ValidateError(format!(
                "Invalid max nesting depth {}. Must be between 1 and 64",
                self.max_nesting_depth
            )));
        }

        Ok(())
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ingest_settings() {
        assert_eq!(IngestSettings::default().max_nesting_depth, 8);
    }

    #[test]
    fn test_validate_depth_bounds() {
        for depth in [0, 65] {
            let settings = IngestSettings {
                max_nesting_depth: depth,
            };
            assert!(settings.validate().is_err(), "depth {} should be rejected", depth);
        }

        for depth in [1, 8, 64] {
            let settings = IngestSettings {
                max_nesting_depth: depth,
            };
            assert!(settings.validate().is_ok(), "depth {} should be accepted", depth);
        }
    }
}
