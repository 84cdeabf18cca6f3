//! HTTP registry client

use reqwest::StatusCode;
use tracing::debug;

use plugkit_errors::{Error, NetworkError, RegistryError, Result};
use plugkit_net::NetClient;
use plugkit_types::PackageId;

use crate::{models::RegistryEntry, RegistryLookup};

/// Client for the remote marketplace registry
///
/// Authentication to the registry is a precondition handled by the
/// embedding application; this client only performs lookups.
#[derive(Clone)]
pub struct RegistryClient {
    net: NetClient,
    base_url: String,
}

impl RegistryClient {
    /// Create a client against the given registry base URL
    pub fn new(net: NetClient, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { net, base_url }
    }

    fn entry_url(&self, id: &PackageId) -> String {
        format!("{}/packages/{id}", self.base_url)
    }
}

impl RegistryLookup for RegistryClient {
    async fn lookup(&self, id: &PackageId) -> Result<RegistryEntry> {
        let url = self.entry_url(id);
        debug!(package = %id, %url, "querying registry");

        let response = self.net.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::Registry(RegistryError::PackageNotFound {
                package: id.to_string(),
            }));
        }

        if !response.status().is_success() {
            return Err(Error::Network(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }));
        }

        response.json::<RegistryEntry>().await.map_err(|e| {
            Error::Registry(RegistryError::InvalidResponse {
                message: e.to_string(),
            })
        })
    }
}
