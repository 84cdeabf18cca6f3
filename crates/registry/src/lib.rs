#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package registry collaborators for plugkit
//!
//! This crate covers the three external data sources metadata
//! resolution consumes: the remote marketplace registry (HTTP), the
//! caller's entitlement grants (local TOML file), and the locally
//! cached update data for entitled packages (JSON file, refreshed by a
//! collaborator outside this crate).

mod cache;
mod client;
mod entitlements;
mod models;

pub use cache::UpdateCache;
pub use client::RegistryClient;
pub use entitlements::{EntitlementVerifier, FileEntitlements};
pub use models::{RegistryEntry, UpdateData, UpdateEntry};

use std::future::Future;

use plugkit_errors::Result;
use plugkit_types::PackageId;

/// Remote registry lookup consumed by metadata resolution
pub trait RegistryLookup: Send + Sync {
    /// Query the registry for one package's entry
    ///
    /// # Errors
    ///
    /// Returns an error if the package is unknown to the registry or
    /// the registry cannot be reached.
    fn lookup(&self, id: &PackageId) -> impl Future<Output = Result<RegistryEntry>> + Send;
}

/// Cached update data lookup consumed by metadata resolution
pub trait UpdateSource: Send + Sync {
    /// Look up the cached update entry for one package, `None` when the
    /// cache has no artifact for it
    ///
    /// # Errors
    ///
    /// Returns an error if the cache exists but cannot be read.
    fn get(&self, id: &PackageId) -> impl Future<Output = Result<Option<UpdateEntry>>> + Send;
}
