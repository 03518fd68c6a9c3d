use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidReference,
    StorageUnavailable,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct GardenError {
    pub code: ErrorCode,
    pub message: String,
}

impl GardenError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidReference, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Keeps the whole `anyhow` context chain in the message.
    pub fn storage_unavailable(err: anyhow::Error) -> Self {
        Self::new(ErrorCode::StorageUnavailable, format!("{err:#}"))
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}
