//! Entitlement verification

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use plugkit_errors::{Error, RegistryError, Result};
use plugkit_types::PackageId;

/// Entitlement check consumed by metadata resolution
///
/// How grants are acquired (purchases, license activation) is out of
/// scope; implementations only answer whether the caller currently
/// holds one.
pub trait EntitlementVerifier: Send + Sync {
    /// Whether the caller holds an active entitlement for the package
    ///
    /// # Errors
    ///
    /// Returns an error if entitlement data exists but cannot be read.
    fn is_entitled(&self, id: &PackageId) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Debug, Deserialize)]
struct GrantFile {
    #[serde(default, rename = "grant")]
    grants: Vec<Grant>,
}

#[derive(Debug, Deserialize)]
struct Grant {
    package: PackageId,
    /// RFC 3339 expiry; a grant without one never expires
    #[serde(default)]
    expires: Option<DateTime<Utc>>,
}

/// Entitlements read from a local TOML grant file
///
/// ```toml
/// [[grant]]
/// package = "acme-seo"
/// expires = "2026-12-01T00:00:00Z"
/// ```
///
/// A missing file means no grants; expired grants do not count.
#[derive(Debug, Clone)]
pub struct FileEntitlements {
    path: PathBuf,
}

impl FileEntitlements {
    /// Create a verifier backed by the given grant file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_grants(&self) -> Result<Vec<Grant>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Registry(RegistryError::EntitlementsUnavailable {
                    message: format!("cannot read {}: {e}", self.path.display()),
                }))
            }
        };

        let file: GrantFile = toml::from_str(&content).map_err(|e| {
            Error::Registry(RegistryError::EntitlementsUnavailable {
                message: format!("undecodable grant file {}: {e}", self.path.display()),
            })
        })?;

        Ok(file.grants)
    }
}

impl EntitlementVerifier for FileEntitlements {
    async fn is_entitled(&self, id: &PackageId) -> Result<bool> {
        let now = Utc::now();
        let entitled = self
            .read_grants()
            .await?
            .iter()
            .any(|grant| grant.package == *id && grant.expires.is_none_or(|at| at > now));

        debug!(package = %id, entitled, "entitlement check");
        Ok(entitled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn verifier_with(content: &str) -> (tempfile::TempDir, FileEntitlements) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("entitlements.toml");
        fs::write(&path, content).await.unwrap();
        (temp, FileEntitlements::new(path))
    }

    #[tokio::test]
    async fn test_grant_without_expiry_counts() {
        let (_temp, verifier) = verifier_with(
            r#"
            [[grant]]
            package = "acme-seo"
            "#,
        )
        .await;

        assert!(verifier.is_entitled(&PackageId::from("acme-seo")).await.unwrap());
        assert!(!verifier.is_entitled(&PackageId::from("other")).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_grant_does_not_count() {
        let (_temp, verifier) = verifier_with(
            r#"
            [[grant]]
            package = "acme-seo"
            expires = "2001-01-01T00:00:00Z"

            [[grant]]
            package = "acme-forms"
            expires = "2999-01-01T00:00:00Z"
            "#,
        )
        .await;

        assert!(!verifier.is_entitled(&PackageId::from("acme-seo")).await.unwrap());
        assert!(verifier.is_entitled(&PackageId::from("acme-forms")).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_means_no_grants() {
        let temp = tempdir().unwrap();
        let verifier = FileEntitlements::new(temp.path().join("absent.toml"));

        assert!(!verifier.is_entitled(&PackageId::from("acme-seo")).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (_temp, verifier) = verifier_with("grant = 12").await;

        assert!(verifier.is_entitled(&PackageId::from("acme-seo")).await.is_err());
    }
}
