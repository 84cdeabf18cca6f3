//! Installer configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the installation orchestrator
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Base URL of the marketplace registry
    pub registry_url: String,
    /// Scratch space for downloads and unpacked archives
    pub work_dir: PathBuf,
    /// Root directory installed extensions live under
    pub target_root: PathBuf,
    /// Directory holding the persisted run state
    pub state_dir: PathBuf,
    /// Directory holding the cached update data
    pub cache_dir: PathBuf,
    /// TOML file listing the caller's entitlement grants
    pub entitlements_file: PathBuf,
    /// Upper bound on any single pipeline step
    pub step_timeout: Duration,
}

impl InstallConfig {
    /// Create a configuration with the conventional layout under
    /// `work_dir` (state, cache, and entitlements all live there)
    pub fn new(
        registry_url: impl Into<String>,
        work_dir: impl AsRef<Path>,
        target_root: impl AsRef<Path>,
    ) -> Self {
        let work_dir = work_dir.as_ref().to_path_buf();
        Self {
            registry_url: registry_url.into(),
            state_dir: work_dir.join("state"),
            cache_dir: work_dir.join("cache"),
            entitlements_file: work_dir.join("entitlements.toml"),
            step_timeout: Duration::from_secs(300), // 5 minutes
            target_root: target_root.as_ref().to_path_buf(),
            work_dir,
        }
    }

    /// Set the per-step timeout
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Override where the run state is persisted
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Override where the update cache lives
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Override the entitlement grant file
    #[must_use]
    pub fn with_entitlements_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.entitlements_file = path.into();
        self
    }

    /// Where fetched artifacts are stored
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.work_dir.join("downloads")
    }

    /// Where archives are unpacked
    #[must_use]
    pub fn unpack_dir(&self) -> PathBuf {
        self.work_dir.join("unpacked")
    }
}
