use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] revalbox_configuration::ConfigError),

    #[error("Initialization error: {0}")]
    Initialization(String),
}
