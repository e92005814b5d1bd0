// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Authentication failed (status {status}). Check EVALGATE_API_KEY or run `evalgate login`")]
    AuthFailed { status: u16 },

    #[error("Quota or payment failure (status {status}). Check your plan and billing on the service")]
    QuotaExceeded { status: u16 },

    #[error("Service reported an error: {0}")]
    ServiceError(String),

    #[error("Run failed: {message}")]
    RunFailed { message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Fallback shown for `failed`/`error` runs that carry no error detail.
pub const RUN_FAILED_FALLBACK: &str = "run failed with no error detail from the service";

pub type Result<T> = std::result::Result<T, EvalError>;
