//! Package identity and distribution channel types

use serde::{Deserialize, Serialize};

/// Stable identifier of an installable package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Create a package identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PackageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Distribution channel a package's artifact was resolved through
///
/// The two channels are mutually exclusive per package: a freely hosted
/// artifact is fetched from its public link, an entitlement-gated one
/// from the cached update data. Absence of data in the expected channel
/// is a hard failure, never a fallback to the other channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Publicly downloadable artifact with a direct link
    SelfHosted,
    /// Paid artifact gated behind an entitlement check
    Entitled,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfHosted => write!(f, "self-hosted"),
            Self::Entitled => write!(f, "entitled"),
        }
    }
}
