//! Artifact download with progress events and checksum verification

use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use plugkit_errors::{Error, NetworkError};
use plugkit_events::{AppEvent, DownloadEvent, EventSender};

use crate::NetClient;

/// Download operation handle
pub struct Download {
    url: Url,
}

/// Result of a download operation
#[derive(Debug)]
pub struct DownloadResult {
    pub url: String,
    pub size: u64,
    /// Hex-encoded blake3 digest of the downloaded bytes
    pub hash: String,
}

impl Download {
    /// Create a new download
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL is invalid or cannot be parsed.
    pub fn new(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(Self { url })
    }

    /// Execute the download
    ///
    /// Streams the response body to a `.part` sibling of `dest`, then
    /// renames it into place. When `expected_hash` is given the digest
    /// is checked before the rename; a mismatch removes the partial
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns an
    /// error status, the file cannot be written, or the checksum does
    /// not match.
    pub async fn execute(
        self,
        client: &NetClient,
        dest: &Path,
        expected_hash: Option<&str>,
        tx: Option<&EventSender>,
    ) -> Result<DownloadResult, Error> {
        let url_str = self.url.to_string();

        let response = client.get(url_str.as_str()).await?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }
            .into());
        }

        let content_length = response.content_length();

        emit(
            tx,
            DownloadEvent::Started {
                url: url_str.clone(),
                size: content_length,
            },
        );

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream into a partial file next to the destination
        let temp_path = dest.with_extension("part");
        let mut file = File::create(&temp_path).await?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut hasher = blake3::Hasher::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(total) = content_length {
                emit(
                    tx,
                    DownloadEvent::Progress {
                        url: url_str.clone(),
                        bytes_downloaded: downloaded,
                        total_bytes: total,
                    },
                );
            }
        }

        file.flush().await?;
        drop(file);

        let hash = hasher.finalize().to_hex().to_string();

        if let Some(expected) = expected_hash {
            if !hash.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(&temp_path).await;

                return Err(NetworkError::ChecksumMismatch {
                    expected: expected.to_string(),
                    actual: hash,
                }
                .into());
            }
        }

        tokio::fs::rename(&temp_path, dest).await?;

        emit(
            tx,
            DownloadEvent::Completed {
                url: url_str.clone(),
                size: downloaded,
            },
        );

        Ok(DownloadResult {
            url: url_str,
            size: downloaded,
            hash,
        })
    }
}

fn emit(tx: Option<&EventSender>, event: DownloadEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(AppEvent::Download(event));
    }
}

/// Download a file to the destination path
///
/// Convenience wrapper over [`Download::new`] + [`Download::execute`].
///
/// # Errors
///
/// Returns an error if the URL is invalid or the download fails.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    expected_hash: Option<&str>,
    tx: Option<&EventSender>,
) -> Result<DownloadResult, Error> {
    Download::new(url)?.execute(client, dest, expected_hash, tx).await
}
