use thiserror::Error;

/// Errors raised while loading a configuration or building from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store is compiled out or failed to initialize.
    #[error("store not available: {0}")]
    BackendNotAvailable(String),
}
