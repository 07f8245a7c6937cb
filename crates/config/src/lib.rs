mod args;
mod chain;
mod error;
mod ingest;
mod log;

pub use args::Args;
pub use chain::{ChainConfig, ChainConfigError, ChainConfigs, ChainSelection};
pub use error::ConfigError;
pub use ingest::IngestSettings;
pub use log::LogConfig;

use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    pub log: LogConfig,
    pub chain: ChainSelection,
    pub ingest: IngestSettings,
}

impl LedgerConfig {
    /// Load every section from `PLI_<SECTION>_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            log: envy::prefixed("PLI_LOG_").from_env::<LogConfig>()?,
            chain: envy::prefixed("PLI_CHAIN_").from_env::<ChainSelection>()?,
            ingest: envy::prefixed("PLI_INGEST_").from_env::<IngestSettings>()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read `path` into the process environment (when it exists), then load
    /// as [`LedgerConfig::from_env`] does. Variables already set win.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            dotenv::from_path(path).map_err(|source| ConfigError::EnvFileError {
                path: path.display().to_string(),
                source,
            })?;
        }
        Self::from_env()
    }

    /// Chain parameters for the selected chain.
    pub fn chain_config(&self) -> Result<ChainConfig, ConfigError> {
        let configs = ChainConfigs::load()?;
        Ok(self.chain.resolve(&configs)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.log.validate()?;
        self.chain.validate()?;
        self.ingest.validate()?;
        Ok(())
    }
}
