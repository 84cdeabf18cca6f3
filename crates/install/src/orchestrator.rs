//! The top-level installation orchestrator

use tracing::{info, warn};

use plugkit_errors::Result;
use plugkit_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use plugkit_state::{BeginOutcome, ProgressStore};
use plugkit_types::{PackageId, RunState};

use crate::cancel::CancellationFlag;
use crate::pipeline::StepPipeline;
use crate::steps::{Activator, Deployer, Extractor, Fetcher, MetadataResolve};

/// Coordinator for batch package installation
///
/// Accepts a batch of package identifiers, claims the single run slot,
/// drives each item through the pipeline in the order supplied, and
/// aggregates the batch outcome. Items are independent: one item's
/// failure never stops or skips subsequent items.
pub struct Orchestrator<S, R, F, X, D, A> {
    store: S,
    pipeline: StepPipeline<R, F, X, D, A>,
    cancel: CancellationFlag,
    event_sender: Option<EventSender>,
}

impl<S, R, F, X, D, A> Orchestrator<S, R, F, X, D, A>
where
    S: ProgressStore,
    R: MetadataResolve,
    F: Fetcher,
    X: Extractor,
    D: Deployer,
    A: Activator,
{
    pub fn new(store: S, pipeline: StepPipeline<R, F, X, D, A>) -> Self {
        Self {
            store,
            pipeline,
            cancel: CancellationFlag::new(),
            event_sender: None,
        }
    }

    /// Attach an event sender for run and step events
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.pipeline = self.pipeline.with_events(tx.clone());
        self.event_sender = Some(tx);
        self
    }

    /// Handle for cancelling the running batch from another task
    #[must_use]
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Install a batch of packages
    ///
    /// If a run is already in flight, its state is returned unchanged
    /// and nothing is mutated. Otherwise every requested item starts
    /// the pipeline from its first step; the returned state carries the
    /// aggregate outcome and each item's individual progress, which
    /// callers must inspect to learn per-package results.
    ///
    /// # Errors
    ///
    /// Returns an error only when the progress store is unavailable;
    /// per-item failures are reported inside the returned [`RunState`].
    pub async fn install(&self, ids: &[PackageId]) -> Result<RunState> {
        let initial = RunState::begin(ids);

        let mut run = match self.store.begin(initial).await? {
            BeginOutcome::AlreadyRunning(current) => {
                warn!("install requested while a run is in progress");
                self.emit(AppEvent::Install(InstallEvent::RunBlocked));
                return Ok(current);
            }
            BeginOutcome::Started => self.store.load().await?,
        };

        // A cancellation left over from a previous batch does not apply
        self.cancel.clear();

        info!(packages = ids.len(), "starting installation run");
        self.emit(AppEvent::Install(InstallEvent::RunStarted {
            packages: ids.to_vec(),
        }));

        for id in ids {
            self.pipeline
                .run_item(&mut run, id, &self.store, &self.cancel)
                .await?;
        }

        run.finalize();
        self.store.save(&run).await?;

        let failed = run.items.values().filter(|i| i.is_failed()).count();
        info!(status = ?run.status, failed, "installation run finished");
        self.emit(AppEvent::Install(InstallEvent::RunCompleted {
            status: run.status,
            failed,
        }));

        Ok(run)
    }

    /// Read the current run state for polling
    ///
    /// # Errors
    ///
    /// Returns an error if the progress store cannot be read.
    pub async fn state(&self) -> Result<RunState> {
        self.store.load().await
    }

    /// Clear the run slot
    ///
    /// # Errors
    ///
    /// Returns an error if the progress store cannot be cleared.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset().await
    }
}

impl<S, R, F, X, D, A> EventEmitter for Orchestrator<S, R, F, X, D, A> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}
