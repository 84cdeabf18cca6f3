//! Registry and update-cache data models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

use plugkit_errors::{Error, RegistryError, Result};
use plugkit_types::PackageId;

/// One package's registry entry, as consumed by metadata resolution
///
/// Only the fields the orchestrator needs are modeled; the registry's
/// wire format carries more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: PackageId,

    /// Package kind ("plugin", "theme", ...)
    pub kind: String,

    /// Whether the artifact is freely hosted at a direct public link
    #[serde(default)]
    pub self_hosted: bool,

    /// Direct download link, populated for self-hosted packages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Cached update entry for one entitlement-gated package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub artifact_url: String,
    pub version: Version,

    /// Hex-encoded blake3 digest of the artifact, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// The whole cached update dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateData {
    /// When the collaborator last refreshed the cache
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub packages: HashMap<PackageId, UpdateEntry>,
}

impl UpdateData {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            packages: HashMap::new(),
        }
    }

    /// Parse update data from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::Registry(RegistryError::InvalidResponse {
                message: format!("undecodable update data: {e}"),
            })
        })
    }

    /// Serialize update data to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}

impl Default for UpdateData {
    fn default() -> Self {
        Self::new()
    }
}
