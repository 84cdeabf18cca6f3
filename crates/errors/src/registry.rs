//! Package registry and entitlement error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("package not found in registry: {package}")]
    PackageNotFound { package: String },

    #[error("registry entry for {package} is self-hosted but carries no download link")]
    MissingDownloadUrl { package: String },

    #[error("invalid registry response: {message}")]
    InvalidResponse { message: String },

    #[error("entitlement data unavailable: {message}")]
    EntitlementsUnavailable { message: String },
}

impl UserFacingError for RegistryError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PackageNotFound { .. } => Some("Check the package identifier."),
            Self::EntitlementsUnavailable { .. } => {
                Some("Check that the entitlements file exists and is readable.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::PackageNotFound { .. } => "registry.package_not_found",
            Self::MissingDownloadUrl { .. } => "registry.missing_download_url",
            Self::InvalidResponse { .. } => "registry.invalid_response",
            Self::EntitlementsUnavailable { .. } => "registry.entitlements_unavailable",
        })
    }
}
