//! Domain event definitions

use serde::{Deserialize, Serialize};

use plugkit_types::{Channel, PackageId, RunStatus, StepName};

/// Top-level event type wrapping the functional domains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "kebab-case")]
pub enum AppEvent {
    Resolver(ResolverEvent),
    Download(DownloadEvent),
    Install(InstallEvent),
}

/// Metadata resolution events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ResolverEvent {
    /// Metadata resolved; artifact URL and channel chosen
    Resolved {
        package: PackageId,
        channel: Channel,
        kind: String,
    },

    /// Resolution failed for this package
    Failed { package: PackageId, error: String },
}

/// Artifact download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DownloadEvent {
    Started {
        url: String,
        size: Option<u64>,
    },

    Progress {
        url: String,
        bytes_downloaded: u64,
        total_bytes: u64,
    },

    Completed {
        url: String,
        size: u64,
    },

    Failed {
        url: String,
        error: String,
    },
}

/// Installation run events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InstallEvent {
    /// A batch run started
    RunStarted { packages: Vec<PackageId> },

    /// An install call was rejected because a run is already in flight
    RunBlocked,

    /// A pipeline step started for one item
    StepStarted { package: PackageId, step: StepName },

    /// A pipeline step completed for one item
    StepCompleted { package: PackageId, step: StepName },

    /// One item's pipeline halted on a failure
    ItemFailed {
        package: PackageId,
        step: StepName,
        error: String,
    },

    /// The whole batch finished and the final status was persisted
    RunCompleted { status: RunStatus, failed: usize },
}
