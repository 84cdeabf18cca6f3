//! In-memory progress store

use std::sync::Mutex;

use plugkit_errors::{Error, Result, StateError};
use plugkit_types::{RunState, RunStatus};

use crate::{BeginOutcome, ProgressStore};

/// Non-durable store backed by a mutex-guarded slot
///
/// Used by tests and by embedders that poll state through the
/// orchestrator within a single process.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    slot: Mutex<Option<RunState>>,
}

impl MemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<RunState>>> {
        self.slot.lock().map_err(|_| {
            Error::State(StateError::StoreUnavailable {
                message: "progress slot mutex poisoned".to_string(),
            })
        })
    }
}

impl ProgressStore for MemoryProgressStore {
    async fn load(&self) -> Result<RunState> {
        Ok(self.lock()?.clone().unwrap_or_default())
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        *self.lock()? = Some(state.clone());
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }

    async fn begin(&self, initial: RunState) -> Result<BeginOutcome> {
        let mut slot = self.lock()?;
        if let Some(current) = slot.as_ref() {
            if current.status == RunStatus::InProgress {
                return Ok(BeginOutcome::AlreadyRunning(current.clone()));
            }
        }
        *slot = Some(initial);
        Ok(BeginOutcome::Started)
    }
}
