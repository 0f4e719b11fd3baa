use thiserror::Error;

/// Core-level errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
