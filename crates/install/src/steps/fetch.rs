//! Artifact fetching

use std::path::PathBuf;

use plugkit_errors::Result;
use plugkit_events::EventSender;
use plugkit_net::{download_file, NetClient};
use plugkit_types::PackageId;

use super::Fetcher;

/// Fetcher that streams artifacts over HTTP into the downloads
/// directory
#[derive(Clone)]
pub struct HttpFetcher {
    net: NetClient,
    downloads_dir: PathBuf,
    event_sender: Option<EventSender>,
}

impl HttpFetcher {
    pub fn new(net: NetClient, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            net,
            downloads_dir: downloads_dir.into(),
            event_sender: None,
        }
    }

    /// Attach an event sender for download progress events
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.event_sender = Some(tx);
        self
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &PackageId, url: &str, checksum: Option<&str>) -> Result<PathBuf> {
        let dest = self.downloads_dir.join(format!("{id}.tar.gz"));
        download_file(&self.net, url, &dest, checksum, self.event_sender.as_ref()).await?;
        Ok(dest)
    }
}
