use crate::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainConfigError {
    #[error("Failed to parse chain config JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Chain '{0}' not found in configuration")]
    ChainNotFound(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// SS58 network id used when re-encoding account ids
    pub ss58_prefix: u16,

    #[serde(default)]
    pub token_symbol: String,

    /// Token decimals in effect from `redenomination_block` onwards (or always,
    /// when the chain was never redenominated)
    pub token_decimals: u8,

    /// Token decimals in effect before `redenomination_block`
    #[serde(default)]
    pub legacy_token_decimals: Option<u8>,

    #[serde(default)]
    pub redenomination_block: Option<u64>,
}

impl ChainConfig {
    /// Token decimals that apply to amounts recorded in `block_number`.
    pub fn token_decimals_at(&self, block_number: u64) -> u8 {
        match (self.legacy_token_decimals, self.redenomination_block) {
            (Some(legacy), Some(threshold)) if block_number < threshold => legacy,
            _ => self.token_decimals,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainConfigs {
    configs: HashMap<String, ChainConfig>,
}

impl ChainConfigs {
    pub fn load() -> Result<Self, ChainConfigError> {
        const CONFIG_JSON: &str = include_str!("chain_config.json");
        Self::from_json(CONFIG_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, ChainConfigError> {
        let configs: HashMap<String, ChainConfig> = serde_json::from_str(json)?;
        Ok(Self { configs })
    }

    pub fn get(&self, chain_name: &str) -> Option<&ChainConfig> {
        self.configs
            .get(chain_name)
            .or_else(|| self.configs.get(&chain_name.to_lowercase()))
    }

    pub fn get_or_error(&self, chain_name: &str) -> Result<&ChainConfig, ChainConfigError> {
        self.get(chain_name)
            .ok_or_else(|| ChainConfigError::ChainNotFound(chain_name.to_string()))
    }

    pub fn chain_names(&self) -> Vec<&str> {
        self.configs.keys().map(|s| s.as_str()).collect()
    }
}

/// Which chain the ingested blocks come from.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSelection {
    /// Chain name as found in the embedded chain configuration
    ///
    /// Env: PLI_CHAIN_NAME
    /// Default: polkadot
    #[serde(default = "default_chain_name")]
    pub name: String,

    /// Override for the SS58 network id of the selected chain
    ///
    /// Env: PLI_CHAIN_SS58_PREFIX
    /// Default: unset (use the chain's own prefix)
    #[serde(default)]
    pub ss58_prefix: Option<u16>,
}

fn default_chain_name() -> String {
    "polkadot".to_string()
}

impl ChainSelection {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidateError(
                "Chain name cannot be empty".to_string(),
            ));
        }

        // SS58 network ids are 14 bits wide
        if let Some(prefix) = self.ss58_prefix
            && prefix > 16_383
        {
            return Err(ConfigError::ValidateError(format!(
                "Invalid SS58 prefix {}. Must be between 0 and 16383",
                prefix
            )));
        }

        Ok(())
    }

    /// Resolve the selection against the embedded chain table, applying the
    /// prefix override.
    pub fn resolve(&self, configs: &ChainConfigs) -> Result<ChainConfig, ChainConfigError> {
        let mut chain = configs.get_or_error(&self.name)?.clone();
        if let Some(prefix) = self.ss58_prefix {
            chain.ss58_prefix = prefix;
        }
        Ok(chain)
    }
}

impl Default for ChainSelection {
    fn default() -> Self {
        Self {
            name: default_chain_name(),
            ss58_prefix: None,
        }
    }
}
