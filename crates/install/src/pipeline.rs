//! The fixed install pipeline
//!
//! Runs one item through `ResolveMetadata → Fetch → Extract → Deploy →
//! Activate`, halting the item at its first failure. Every step's
//! attempt and outcome is persisted to the progress store before and
//! after execution, so an external observer polling the store sees
//! which step is currently running and which items have already
//! failed.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use plugkit_errors::{Error, InstallError, Result};
use plugkit_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use plugkit_resolver::ResolvedMetadata;
use plugkit_state::ProgressStore;
use plugkit_types::{CurrentStep, ItemState, PackageId, RunState, StepName};

use crate::cancel::CancellationFlag;
use crate::steps::{Activator, Deployer, Extractor, Fetcher, MetadataResolve};

/// Output of one successfully executed step
enum StepOutput {
    Resolved(ResolvedMetadata),
    Fetched(PathBuf),
    Extracted(PathBuf),
    Deployed(PathBuf),
    Activated,
}

/// The ordered pipeline over the five step executors
pub struct StepPipeline<R, F, X, D, A> {
    resolver: R,
    fetcher: F,
    extractor: X,
    deployer: D,
    activator: A,
    step_timeout: Duration,
    event_sender: Option<EventSender>,
}

impl<R, F, X, D, A> StepPipeline<R, F, X, D, A>
where
    R: MetadataResolve,
    F: Fetcher,
    X: Extractor,
    D: Deployer,
    A: Activator,
{
    pub fn new(
        resolver: R,
        fetcher: F,
        extractor: X,
        deployer: D,
        activator: A,
        step_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            extractor,
            deployer,
            activator,
            step_timeout,
            event_sender: None,
        }
    }

    /// Attach an event sender for step events
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.event_sender = Some(tx);
        self
    }

    /// Run one item through the pipeline, mutating its state in `run`
    /// and persisting `run` after every step.
    ///
    /// Step failures are captured into the item and never propagated;
    /// the returned error is reserved for store failures, without which
    /// the run cannot continue.
    ///
    /// # Errors
    ///
    /// Returns an error if the progress store cannot be written or the
    /// item is missing from the run state.
    pub async fn run_item<S: ProgressStore>(
        &self,
        run: &mut RunState,
        id: &PackageId,
        store: &S,
        cancel: &CancellationFlag,
    ) -> Result<()> {
        for step in StepName::ALL {
            let item = run
                .item(id)
                .ok_or_else(|| Error::internal(format!("no item state for {id}")))?;

            // A halted item runs no further steps
            if item.is_failed() {
                break;
            }

            if cancel.is_cancelled() {
                self.fail_item(run, id, step, &InstallError::Cancelled.into(), store)
                    .await?;
                break;
            }

            // Make the attempt observable before the side effect starts
            run.current_step = Some(CurrentStep {
                package: id.clone(),
                step,
            });
            let snapshot = {
                let item = run
                    .item_mut(id)
                    .ok_or_else(|| Error::internal(format!("no item state for {id}")))?;
                item.last_step = Some(step);
                item.clone()
            };
            store.save(run).await?;

            self.emit(AppEvent::Install(InstallEvent::StepStarted {
                package: id.clone(),
                step,
            }));

            match self.execute(step, id, &snapshot).await {
                Ok(output) => {
                    let item = run
                        .item_mut(id)
                        .ok_or_else(|| Error::internal(format!("no item state for {id}")))?;
                    apply(item, output);
                    store.save(run).await?;

                    self.emit(AppEvent::Install(InstallEvent::StepCompleted {
                        package: id.clone(),
                        step,
                    }));
                }
                Err(e) => {
                    self.fail_item(run, id, step, &e, store).await?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Invoke one step's executor with inputs drawn from the item's
    /// already-populated fields
    async fn execute(
        &self,
        step: StepName,
        id: &PackageId,
        item: &ItemState,
    ) -> Result<StepOutput> {
        let work = async {
            match step {
                StepName::ResolveMetadata => {
                    self.resolver.resolve(id).await.map(StepOutput::Resolved)
                }
                StepName::Fetch => {
                    let url = require(item.download_url.as_deref(), step, "download_url")?;
                    self.fetcher
                        .fetch(id, url, item.checksum.as_deref())
                        .await
                        .map(StepOutput::Fetched)
                }
                StepName::Extract => {
                    let archive = require(item.download_path.as_deref(), step, "download_path")?;
                    self.extractor
                        .extract(id, archive)
                        .await
                        .map(StepOutput::Extracted)
                }
                StepName::Deploy => {
                    let unpacked = require(item.unpacked_path.as_deref(), step, "unpacked_path")?;
                    self.deployer
                        .deploy(id, unpacked)
                        .await
                        .map(StepOutput::Deployed)
                }
                StepName::Activate => {
                    let channel = item.channel.ok_or_else(|| {
                        Error::Install(InstallError::MissingStepInput {
                            step: step.to_string(),
                            field: "channel".to_string(),
                        })
                    })?;
                    self.activator
                        .activate(id, channel, item.installed_path.as_deref())
                        .await
                        .map(|()| StepOutput::Activated)
                }
            }
        };

        match tokio::time::timeout(self.step_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(Error::Install(InstallError::StepTimeout {
                step: step.to_string(),
                seconds: self.step_timeout.as_secs(),
            })),
        }
    }

    async fn fail_item<S: ProgressStore>(
        &self,
        run: &mut RunState,
        id: &PackageId,
        step: StepName,
        error: &Error,
        store: &S,
    ) -> Result<()> {
        debug!(package = %id, %step, error = %error, "pipeline step failed");

        let item = run
            .item_mut(id)
            .ok_or_else(|| Error::internal(format!("no item state for {id}")))?;
        item.fail(step, error.to_string());
        store.save(run).await?;

        self.emit(AppEvent::Install(InstallEvent::ItemFailed {
            package: id.clone(),
            step,
            error: error.to_string(),
        }));

        Ok(())
    }
}

impl<R, F, X, D, A> EventEmitter for StepPipeline<R, F, X, D, A> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

fn require<'a, T: ?Sized>(
    value: Option<&'a T>,
    step: StepName,
    field: &str,
) -> Result<&'a T> {
    value.ok_or_else(|| {
        Error::Install(InstallError::MissingStepInput {
            step: step.to_string(),
            field: field.to_string(),
        })
    })
}

fn apply(item: &mut ItemState, output: StepOutput) {
    match output {
        StepOutput::Resolved(resolved) => {
            item.download_url = Some(resolved.download_url);
            item.kind = Some(resolved.kind);
            item.channel = Some(resolved.channel);
            item.checksum = resolved.checksum;
        }
        StepOutput::Fetched(path) => item.download_path = Some(path),
        StepOutput::Extracted(path) => item.unpacked_path = Some(path),
        StepOutput::Deployed(path) => item.installed_path = Some(path),
        StepOutput::Activated => {}
    }
}
