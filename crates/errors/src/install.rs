//! Installation pipeline error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("missing entitlement for package: {package}")]
    MissingEntitlement { package: String },

    #[error("no cached artifact for entitled package: {package}")]
    MissingPackage { package: String },

    #[error("missing download URL for package: {package}")]
    MissingDownloadUrl { package: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("deploy failed: {message}")]
    DeployFailed { message: String },

    #[error("activation failed: {message}")]
    ActivationFailed { message: String },

    #[error("cannot resolve install target for package: {package}")]
    UnknownInstallTarget { package: String },

    #[error("step {step} requires output of an earlier step that never ran: {field}")]
    MissingStepInput { step: String, field: String },

    #[error("step {step} timed out after {seconds}s")]
    StepTimeout { step: String, seconds: u64 },

    #[error("installation cancelled")]
    Cancelled,

    #[error("temporary file error: {message}")]
    TempFileError { message: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingEntitlement { .. } => {
                Some("Purchase or renew the package entitlement, then retry.")
            }
            Self::MissingPackage { .. } => {
                Some("Refresh the update cache; the registry may be out of sync.")
            }
            Self::StepTimeout { .. } => Some("Retry the installation; the step may be slow."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::StepTimeout { .. } | Self::TempFileError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MissingEntitlement { .. } => "install.missing_entitlement",
            Self::MissingPackage { .. } => "install.missing_package",
            Self::MissingDownloadUrl { .. } => "install.missing_download_url",
            Self::ExtractionFailed { .. } => "install.extraction_failed",
            Self::DeployFailed { .. } => "install.deploy_failed",
            Self::ActivationFailed { .. } => "install.activation_failed",
            Self::UnknownInstallTarget { .. } => "install.unknown_install_target",
            Self::MissingStepInput { .. } => "install.missing_step_input",
            Self::StepTimeout { .. } => "install.step_timeout",
            Self::Cancelled => "install.cancelled",
            Self::TempFileError { .. } => "install.temp_file",
        })
    }
}
