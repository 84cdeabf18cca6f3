//! Archive extraction

use std::path::PathBuf;

use async_compression::tokio::bufread::GzipDecoder;
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};
use uuid::Uuid;

use plugkit_errors::{Error, InstallError, Result};
use plugkit_types::PackageId;

use super::Extractor;

/// Extractor for gzipped tar artifacts
///
/// Archives unpack into a fresh scratch directory per invocation. The
/// returned package root is the archive's sole top-level directory
/// when it has one (the usual layout for extension archives);
/// otherwise the flat contents are gathered under a directory named
/// after the package, so the root's final component is always a
/// meaningful install name.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    unpack_root: PathBuf,
}

impl ArchiveExtractor {
    pub fn new(unpack_root: impl Into<PathBuf>) -> Self {
        Self {
            unpack_root: unpack_root.into(),
        }
    }

    async fn unpack(&self, id: &PackageId, archive: &std::path::Path) -> Result<PathBuf> {
        let scratch = self.unpack_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&scratch)
            .await
            .map_err(|e| InstallError::TempFileError {
                message: format!("cannot create extraction dir: {e}"),
            })?;

        let compressed = fs::read(archive).await.map_err(|e| {
            Error::Install(InstallError::ExtractionFailed {
                message: format!("cannot read archive {}: {e}", archive.display()),
            })
        })?;

        let mut decoder = GzipDecoder::new(BufReader::new(compressed.as_slice()));
        let mut tar_bytes = Vec::new();
        decoder
            .read_to_end(&mut tar_bytes)
            .await
            .map_err(|e| InstallError::ExtractionFailed {
                message: format!("gzip decompression failed: {e}"),
            })?;

        // Unpack entries using blocking operations
        let dest = scratch.clone();
        tokio::task::spawn_blocking(move || -> std::result::Result<(), InstallError> {
            let mut archive = tar::Archive::new(std::io::Cursor::new(tar_bytes));
            let entries = archive
                .entries()
                .map_err(|e| InstallError::ExtractionFailed {
                    message: format!("unreadable tar archive: {e}"),
                })?;

            for entry in entries {
                let mut entry = entry.map_err(|e| InstallError::ExtractionFailed {
                    message: format!("corrupt tar entry: {e}"),
                })?;

                let shown = entry
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();

                let unpacked =
                    entry
                        .unpack_in(&dest)
                        .map_err(|e| InstallError::ExtractionFailed {
                            message: format!("failed to unpack {shown}: {e}"),
                        })?;

                // unpack_in refuses entries that would land outside dest
                if !unpacked {
                    return Err(InstallError::ExtractionFailed {
                        message: format!("archive entry escapes extraction root: {shown}"),
                    });
                }
            }

            Ok(())
        })
        .await
        .map_err(|e| Error::internal(format!("extraction task failed: {e}")))??;

        self.package_root(id, scratch).await
    }

    /// Normalize the unpacked layout to a single package root
    async fn package_root(&self, id: &PackageId, scratch: PathBuf) -> Result<PathBuf> {
        let mut top_level = Vec::new();
        let mut entries = fs::read_dir(&scratch)
            .await
            .map_err(|e| Error::io_with_path(&e, &scratch))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &scratch))?
        {
            top_level.push(entry.path());
        }

        if top_level.is_empty() {
            return Err(Error::Install(InstallError::ExtractionFailed {
                message: "archive is empty".to_string(),
            }));
        }

        if let [only] = top_level.as_slice() {
            if fs::metadata(only)
                .await
                .map_err(|e| Error::io_with_path(&e, only))?
                .is_dir()
            {
                return Ok(only.clone());
            }
        }

        // Flat archive: gather the contents under a package-named root
        let root = scratch.join(id.as_str());
        fs::create_dir(&root)
            .await
            .map_err(|e| Error::io_with_path(&e, &root))?;
        for path in top_level {
            let Some(name) = path.file_name() else {
                continue;
            };
            fs::rename(&path, root.join(name))
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
        }

        Ok(root)
    }
}

impl Extractor for ArchiveExtractor {
    async fn extract(&self, id: &PackageId, archive: &std::path::Path) -> Result<PathBuf> {
        self.unpack(id, archive).await
    }
}
