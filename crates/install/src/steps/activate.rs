//! Package activation

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use plugkit_errors::{Error, InstallError, Result};
use plugkit_types::{Channel, PackageId};

use super::Activator;

const ACTIVE_FILE: &str = "active.json";
const MANIFEST_FILE: &str = "extension.toml";

/// Manifest every installed extension carries at its root
#[derive(Debug, Deserialize)]
struct ExtensionManifest {
    id: PackageId,
}

/// The set of enabled extensions, persisted next to the installs
#[derive(Debug, Default, Serialize, Deserialize)]
struct ActiveSet {
    #[serde(default)]
    active: BTreeSet<String>,
}

/// Activator that enables installed extensions by directory name
///
/// Resolution of which directory belongs to the package depends on the
/// distribution channel: a freely hosted install is named by its own
/// deploy location, while an entitlement-gated one is discovered by
/// scanning the installed manifests for a matching identifier.
#[derive(Debug, Clone)]
pub struct ExtensionActivator {
    target_root: PathBuf,
}

impl ExtensionActivator {
    pub fn new(target_root: impl AsRef<Path>) -> Self {
        Self {
            target_root: target_root.as_ref().to_path_buf(),
        }
    }

    /// Scan installed packages for one whose manifest matches `id`
    async fn discover(&self, id: &PackageId) -> Result<Option<PathBuf>> {
        let mut entries = match fs::read_dir(&self.target_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io_with_path(&e, &self.target_root)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &self.target_root))?
        {
            let path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') || !path.is_dir() {
                continue;
            }

            let manifest_path = path.join(MANIFEST_FILE);
            let Ok(content) = fs::read_to_string(&manifest_path).await else {
                continue;
            };

            match toml::from_str::<ExtensionManifest>(&content) {
                Ok(manifest) if manifest.id == *id => return Ok(Some(path)),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %manifest_path.display(), error = %e, "skipping unreadable manifest");
                }
            }
        }

        Ok(None)
    }

    async fn mark_active(&self, name: &str) -> Result<()> {
        let path = self.target_root.join(ACTIVE_FILE);

        let mut set: ActiveSet = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                InstallError::ActivationFailed {
                    message: format!("undecodable active set: {e}"),
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ActiveSet::default(),
            Err(e) => {
                return Err(Error::Install(InstallError::ActivationFailed {
                    message: format!("cannot read active set: {e}"),
                }))
            }
        };

        if !set.active.insert(name.to_string()) {
            // Re-activating is a no-op
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&set)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| InstallError::ActivationFailed {
                message: format!("cannot write active set: {e}"),
            })?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| InstallError::ActivationFailed {
                message: format!("cannot commit active set: {e}"),
            })?;

        Ok(())
    }
}

impl Activator for ExtensionActivator {
    async fn activate(
        &self,
        id: &PackageId,
        channel: Channel,
        installed: Option<&Path>,
    ) -> Result<()> {
        let dir = match channel {
            Channel::SelfHosted => {
                // The install location names the package directly
                let path = installed.ok_or_else(|| InstallError::MissingStepInput {
                    step: "activate".to_string(),
                    field: "installed_path".to_string(),
                })?;

                if fs::metadata(path).await.is_err() {
                    return Err(Error::Install(InstallError::UnknownInstallTarget {
                        package: id.to_string(),
                    }));
                }
                path.to_path_buf()
            }
            Channel::Entitled => self.discover(id).await?.ok_or_else(|| {
                Error::Install(InstallError::UnknownInstallTarget {
                    package: id.to_string(),
                })
            })?,
        };

        let name = dir
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .ok_or_else(|| Error::internal(format!("install dir has no usable name for {id}")))?;

        debug!(package = %id, dir = %dir.display(), "activating extension");
        self.mark_active(name).await
    }
}
