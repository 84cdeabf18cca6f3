//! Progress store error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("progress store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("state serialization failed: {message}")]
    SerializationFailed { message: String },

    #[error("state I/O error: {message}")]
    IoError { message: String },
}

impl StateError {
    /// Stable error code for analytics / structured reporting.
    #[must_use]
    pub fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::StoreUnavailable { .. } => "state.store_unavailable",
            Self::SerializationFailed { .. } => "state.serialization_failed",
            Self::IoError { .. } => "state.io",
        })
    }
}
