//! Network and download error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("request timeout: {url}")]
    Timeout { url: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("rate limited: retry after {seconds}s")]
    RateLimited { seconds: u64 },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check your network connection and retry.")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The downloaded artifact is corrupt; retry the download.")
            }
            Self::RateLimited { .. } => Some("Wait before retrying."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "net.timeout",
            Self::ConnectionRefused(_) => "net.connection_refused",
            Self::DownloadFailed(_) => "net.download_failed",
            Self::HttpError { .. } => "net.http_error",
            Self::InvalidUrl(_) => "net.invalid_url",
            Self::ChecksumMismatch { .. } => "net.checksum_mismatch",
            Self::RateLimited { .. } => "net.rate_limited",
        })
    }
}
