//! Run and item progress records
//!
//! A [`RunState`] is the entire persisted record of one installation
//! batch. Exactly one run slot exists at a time; the orchestrator is the
//! only component that mutates it, and it persists the record after every
//! step so that a concurrent observer sees live progress.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::package::{Channel, PackageId};

/// One stage of the fixed install pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    ResolveMetadata,
    Fetch,
    Extract,
    Deploy,
    Activate,
}

impl StepName {
    /// Pipeline order. Items walk this list front to back and halt at
    /// the first failing step.
    pub const ALL: [StepName; 5] = [
        StepName::ResolveMetadata,
        StepName::Fetch,
        StepName::Extract,
        StepName::Deploy,
        StepName::Activate,
    ];

    /// Stable step name used in persisted state and events
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveMetadata => "resolve-metadata",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Deploy => "deploy",
            Self::Activate => "activate",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of the single run slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// No run has been started (or the slot was reset)
    #[default]
    Idle,
    /// A batch is currently executing
    InProgress,
    /// The last batch completed with every item installed
    Finished,
    /// The last batch completed with at least one failed item
    HasError,
}

/// The step last attempted, for external observability only
///
/// Never consulted for control decisions; a status-polling endpoint uses
/// it to show which package and step a running batch is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStep {
    pub package: PackageId,
    pub step: StepName,
}

/// One package's progress through the pipeline
///
/// Every field starts empty and is populated by the step that produces
/// it. A non-empty `last_error` marks the item's pipeline as halted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    /// Package kind reported by the registry ("plugin", "theme", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Artifact URL chosen by metadata resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Distribution channel the artifact was resolved through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,

    /// Expected blake3 checksum of the artifact, when the update cache
    /// carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Most recently attempted step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<StepName>,

    /// Failure message; presence halts the item's pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Local archive path produced by Fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path: Option<PathBuf>,

    /// Unpacked directory produced by Extract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpacked_path: Option<PathBuf>,

    /// Final install location produced by Deploy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_path: Option<PathBuf>,
}

impl ItemState {
    /// Whether this item's pipeline has halted on a failure
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.last_error.is_some()
    }

    /// Record a step failure. `Failed` is terminal: no later step runs
    /// for this item.
    pub fn fail(&mut self, step: StepName, error: impl Into<String>) {
        self.last_step = Some(step);
        self.last_error = Some(error.into());
    }
}

/// The entire persisted record for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,

    /// Per-package progress, keyed by package identifier
    #[serde(default)]
    pub items: HashMap<PackageId, ItemState>,

    /// Step last attempted, for progress display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<CurrentStep>,
}

impl RunState {
    /// Fresh `InProgress` state for a new batch.
    ///
    /// Every requested item starts from an all-default record: a run
    /// never resumes a prior run's partial item progress.
    #[must_use]
    pub fn begin(ids: &[PackageId]) -> Self {
        Self {
            status: RunStatus::InProgress,
            items: ids
                .iter()
                .map(|id| (id.clone(), ItemState::default()))
                .collect(),
            current_step: None,
        }
    }

    /// Compute and apply the aggregate batch outcome: `HasError` if any
    /// item failed, else `Finished`. Clears the current-step pointer.
    pub fn finalize(&mut self) {
        self.status = if self.items.values().any(ItemState::is_failed) {
            RunStatus::HasError
        } else {
            RunStatus::Finished
        };
        self.current_step = None;
    }

    /// Look up one item's progress
    #[must_use]
    pub fn item(&self, id: &PackageId) -> Option<&ItemState> {
        self.items.get(id)
    }

    /// Mutable access to one item's progress
    pub fn item_mut(&mut self, id: &PackageId) -> Option<&mut ItemState> {
        self.items.get_mut(id)
    }
}
