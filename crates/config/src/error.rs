use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from environment: {0}")]
    EnvError(#[from] envy::Error),

    #[error("Failed to read env file '{path}': {source}")]
    EnvFileError {
        path: String,
        #[source]
        source: dotenv::Error,
    },

    #[error("Chain configuration error: {0}")]
    ChainError(#[from] crate::chain::ChainConfigError),

    #[error("Invalid configuration: {0}")]
    ValidateError(String),
}
