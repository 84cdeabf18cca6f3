//! Update data caching

use std::path::{Path, PathBuf};

use tokio::fs;

use plugkit_errors::{Result, StateError};
use plugkit_types::PackageId;

use crate::models::{UpdateData, UpdateEntry};
use crate::UpdateSource;

const UPDATES_FILE: &str = "updates.json";

/// Cache of update data for entitlement-gated packages
///
/// Refreshed by a collaborator outside this subsystem; resolution only
/// reads it. The cache file is a single JSON record written with a
/// temp-file-and-rename so readers never see a torn record.
#[derive(Debug, Clone)]
pub struct UpdateCache {
    cache_dir: PathBuf,
}

impl UpdateCache {
    /// Create a cache manager rooted at the given directory
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    fn updates_path(&self) -> PathBuf {
        self.cache_dir.join(UPDATES_FILE)
    }

    /// Load the cached update data
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file doesn't exist or contains
    /// invalid data.
    pub async fn load(&self) -> Result<UpdateData> {
        let path = self.updates_path();

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StateError::StoreUnavailable {
                message: format!("cannot read update cache {}: {e}", path.display()),
            })?;

        UpdateData::from_json(&content)
    }

    /// Save update data to the cache
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// file cannot be written.
    pub async fn save(&self, data: &UpdateData) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to create cache dir: {e}"),
            })?;

        let path = self.updates_path();
        let json = data.to_json()?;

        // Write to temporary file first
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to write update cache: {e}"),
            })?;

        // Atomic rename
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to rename update cache: {e}"),
            })?;

        Ok(())
    }

    /// Check if the cache exists
    pub async fn exists(&self) -> bool {
        fs::metadata(self.updates_path()).await.is_ok()
    }

    /// Clear the cache
    pub async fn clear(&self) {
        let _ = fs::remove_file(self.updates_path()).await;
    }
}

impl UpdateSource for UpdateCache {
    async fn get(&self, id: &PackageId) -> Result<Option<UpdateEntry>> {
        if !self.exists().await {
            // No cache at all reads as "no artifact for this package"
            return Ok(None);
        }

        let data = self.load().await?;
        Ok(data.packages.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;
    use tempfile::tempdir;

    fn entry(url: &str) -> UpdateEntry {
        UpdateEntry {
            artifact_url: url.to_string(),
            version: Version::new(2, 1, 0),
            checksum: None,
        }
    }

    #[tokio::test]
    async fn test_cache_operations() {
        let temp = tempdir().unwrap();
        let cache = UpdateCache::new(temp.path());

        // Initially no cache
        assert!(!cache.exists().await);
        assert!(cache.load().await.is_err());

        // Save data
        let mut data = UpdateData::new();
        data.packages.insert(
            PackageId::from("acme-seo"),
            entry("https://updates.example.test/acme-seo-2.1.0.tar.gz"),
        );
        cache.save(&data).await.unwrap();
        assert!(cache.exists().await);

        // Load back
        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.packages, data.packages);

        // Clear
        cache.clear().await;
        assert!(!cache.exists().await);
    }

    #[tokio::test]
    async fn test_get_resolves_entries() {
        let temp = tempdir().unwrap();
        let cache = UpdateCache::new(temp.path());

        // Empty cache reads as no artifact
        assert!(cache.get(&PackageId::from("acme-seo")).await.unwrap().is_none());

        let mut data = UpdateData::new();
        data.packages.insert(
            PackageId::from("acme-seo"),
            entry("https://updates.example.test/acme-seo-2.1.0.tar.gz"),
        );
        cache.save(&data).await.unwrap();

        let found = cache.get(&PackageId::from("acme-seo")).await.unwrap();
        assert_eq!(
            found.map(|e| e.artifact_url),
            Some("https://updates.example.test/acme-seo-2.1.0.tar.gz".to_string())
        );
        assert!(cache.get(&PackageId::from("other")).await.unwrap().is_none());
    }
}
