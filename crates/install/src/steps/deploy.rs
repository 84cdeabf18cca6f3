//! Atomic deployment into the target root

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use plugkit_errors::{Error, InstallError, Result};
use plugkit_types::PackageId;

use super::Deployer;

/// Deployer that moves unpacked packages into the target root with
/// all-or-nothing replacement
///
/// The unpacked tree is first copied to a staging directory inside the
/// target root, then swapped into place by rename. An existing
/// installation is displaced to a sibling directory before the swap
/// and restored if the swap fails, so the target root never holds a
/// half-present package.
#[derive(Debug, Clone)]
pub struct AtomicDeployer {
    target_root: PathBuf,
}

impl AtomicDeployer {
    pub fn new(target_root: impl AsRef<Path>) -> Self {
        Self {
            target_root: target_root.as_ref().to_path_buf(),
        }
    }

    async fn stage(&self, unpacked: &Path, staging: &Path) -> Result<()> {
        let src = unpacked.to_path_buf();
        let dst = staging.to_path_buf();

        tokio::task::spawn_blocking(move || copy_tree(&src, &dst))
            .await
            .map_err(|e| Error::internal(format!("staging task failed: {e}")))?
            .map_err(|e| {
                Error::Install(InstallError::DeployFailed {
                    message: format!("failed to stage package: {e}"),
                })
            })
    }
}

impl Deployer for AtomicDeployer {
    async fn deploy(&self, id: &PackageId, unpacked: &Path) -> Result<PathBuf> {
        let name = unpacked
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .ok_or_else(|| Error::internal(format!("unpacked path has no usable name for {id}")))?
            .to_string();

        fs::create_dir_all(&self.target_root)
            .await
            .map_err(|e| InstallError::DeployFailed {
                message: format!("cannot create target root: {e}"),
            })?;

        let staging = self.target_root.join(format!(".staging-{}", Uuid::new_v4()));
        if let Err(e) = self.stage(unpacked, &staging).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let dest = self.target_root.join(&name);

        // Displace any existing installation before the swap
        let displaced = if fs::metadata(&dest).await.is_ok() {
            let old = self.target_root.join(format!(".old-{}", Uuid::new_v4()));
            fs::rename(&dest, &old)
                .await
                .map_err(|e| InstallError::DeployFailed {
                    message: format!("cannot displace existing install: {e}"),
                })?;
            Some(old)
        } else {
            None
        };

        match fs::rename(&staging, &dest).await {
            Ok(()) => {
                if let Some(old) = displaced {
                    if fs::remove_dir_all(&old).await.is_err() {
                        warn!(path = %old.display(), "leaving displaced install behind");
                    }
                }
                Ok(dest)
            }
            Err(e) => {
                // Swap failed: restore the displaced install
                if let Some(old) = displaced {
                    let _ = fs::rename(&old, &dest).await;
                }
                let _ = fs::remove_dir_all(&staging).await;
                Err(Error::Install(InstallError::DeployFailed {
                    message: format!("cannot move package into target root: {e}"),
                }))
            }
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &to)?;
        } else {
            std::fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}
