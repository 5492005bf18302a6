//! Error types for TimeBlend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Blend error: {0}")]
    Blend(String),

    #[error("Ensemble error: {0}")]
    Ensemble(String),

    #[error("Model is not fitted")]
    NotFitted,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
