//! Pipeline step executors
//!
//! Each step of the install pipeline is a single-purpose side effect
//! behind a trait, so the pipeline can be exercised against scripted
//! executors in tests and wired to the real network/filesystem ones in
//! production.

mod activate;
mod deploy;
mod extract;
mod fetch;

pub use activate::ExtensionActivator;
pub use deploy::AtomicDeployer;
pub use extract::ArchiveExtractor;
pub use fetch::HttpFetcher;

use std::future::Future;
use std::path::{Path, PathBuf};

use plugkit_errors::Result;
use plugkit_registry::{EntitlementVerifier, RegistryLookup, UpdateSource};
use plugkit_resolver::{MetadataResolver, ResolvedMetadata};
use plugkit_types::{Channel, PackageId};

/// Metadata resolution seam for the pipeline's first step
pub trait MetadataResolve: Send + Sync {
    /// Determine the package's artifact URL, kind, and channel
    ///
    /// # Errors
    ///
    /// Returns an error when the package cannot be resolved through its
    /// distribution channel.
    fn resolve(&self, id: &PackageId) -> impl Future<Output = Result<ResolvedMetadata>> + Send;
}

impl<L, E, U> MetadataResolve for MetadataResolver<L, E, U>
where
    L: RegistryLookup,
    E: EntitlementVerifier,
    U: UpdateSource,
{
    async fn resolve(&self, id: &PackageId) -> Result<ResolvedMetadata> {
        MetadataResolver::resolve(self, id).await
    }
}

/// Download the package artifact to local storage
pub trait Fetcher: Send + Sync {
    /// Fetch the artifact at `url`, returning its local path
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the checksum does not
    /// match.
    fn fetch(
        &self,
        id: &PackageId,
        url: &str,
        checksum: Option<&str>,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Unpack a downloaded archive into scratch space
pub trait Extractor: Send + Sync {
    /// Extract the archive, returning the unpacked package root
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is corrupt or cannot be
    /// unpacked.
    fn extract(
        &self,
        id: &PackageId,
        archive: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Move an unpacked package into the target root
pub trait Deployer: Send + Sync {
    /// Deploy the unpacked tree, returning the final install location.
    /// Replacement of an existing installation is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be moved into place.
    fn deploy(
        &self,
        id: &PackageId,
        unpacked: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Enable an installed package
pub trait Activator: Send + Sync {
    /// Activate the installed package, locating it by channel rules
    ///
    /// # Errors
    ///
    /// Returns an error if the install target cannot be resolved or
    /// activation fails.
    fn activate(
        &self,
        id: &PackageId,
        channel: Channel,
        installed: Option<&Path>,
    ) -> impl Future<Output = Result<()>> + Send;
}
