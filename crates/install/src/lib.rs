#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package installation orchestration for plugkit
//!
//! This crate drives a batch of packages through the fixed install
//! pipeline (`ResolveMetadata → Fetch → Extract → Deploy → Activate`),
//! persisting progress to the run-state store after every step and
//! isolating per-item failures so one bad package never aborts the
//! batch.

mod cancel;
mod config;
mod orchestrator;
mod pipeline;
mod steps;

pub use cancel::CancellationFlag;
pub use config::InstallConfig;
pub use orchestrator::Orchestrator;
pub use pipeline::StepPipeline;
pub use steps::{
    Activator, ArchiveExtractor, AtomicDeployer, Deployer, ExtensionActivator, Extractor, Fetcher,
    HttpFetcher, MetadataResolve,
};

use plugkit_errors::Result;
use plugkit_events::EventSender;
use plugkit_net::NetClient;
use plugkit_registry::{FileEntitlements, RegistryClient, UpdateCache};
use plugkit_resolver::MetadataResolver;
use plugkit_state::JsonProgressStore;

/// The fully wired production orchestrator type
pub type ExtensionOrchestrator = Orchestrator<
    JsonProgressStore,
    MetadataResolver<RegistryClient, FileEntitlements, UpdateCache>,
    HttpFetcher,
    ArchiveExtractor,
    AtomicDeployer,
    ExtensionActivator,
>;

/// Wire up the standard orchestrator from a configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn standard_orchestrator(
    config: &InstallConfig,
    events: Option<EventSender>,
) -> Result<ExtensionOrchestrator> {
    let net = NetClient::with_defaults()?;

    let mut resolver = MetadataResolver::new(
        RegistryClient::new(net.clone(), config.registry_url.clone()),
        FileEntitlements::new(&config.entitlements_file),
        UpdateCache::new(&config.cache_dir),
    );

    let mut fetcher = HttpFetcher::new(net, config.downloads_dir());

    if let Some(tx) = &events {
        resolver = resolver.with_events(tx.clone());
        fetcher = fetcher.with_events(tx.clone());
    }

    let pipeline = StepPipeline::new(
        resolver,
        fetcher,
        ArchiveExtractor::new(config.unpack_dir()),
        AtomicDeployer::new(&config.target_root),
        ExtensionActivator::new(&config.target_root),
        config.step_timeout,
    );

    let orchestrator = Orchestrator::new(JsonProgressStore::new(&config.state_dir), pipeline);
    Ok(match events {
        Some(tx) => orchestrator.with_events(tx),
        None => orchestrator,
    })
}
