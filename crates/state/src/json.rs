//! Durable JSON-file progress store

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use plugkit_errors::{Error, Result, StateError};
use plugkit_types::{RunState, RunStatus};

use crate::{BeginOutcome, ProgressStore};

const STATE_FILE: &str = "state.json";

/// Progress store persisted as a single JSON record on disk
///
/// Writes go to a temporary sibling file followed by an atomic rename,
/// so a poller never observes a torn record. A process-internal mutex
/// serializes `begin` against concurrent claims on the same store.
#[derive(Debug)]
pub struct JsonProgressStore {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl JsonProgressStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    async fn read_slot(&self) -> Result<RunState> {
        let path = self.state_path();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| {
                    Error::State(StateError::SerializationFailed {
                        message: format!("undecodable run state at {}: {e}", path.display()),
                    })
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RunState::default()),
            Err(e) => Err(Error::State(StateError::StoreUnavailable {
                message: format!("cannot read {}: {e}", path.display()),
            })),
        }
    }

    async fn write_slot(&self, state: &RunState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to create store dir: {e}"),
            })?;

        let path = self.state_path();
        let json = serde_json::to_string_pretty(state).map_err(|e| StateError::SerializationFailed {
            message: e.to_string(),
        })?;

        // Write to temporary file first, then rename into place
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to write run state: {e}"),
            })?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StateError::IoError {
                message: format!("failed to rename run state file: {e}"),
            })?;

        Ok(())
    }
}

impl ProgressStore for JsonProgressStore {
    async fn load(&self) -> Result<RunState> {
        self.read_slot().await
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        self.write_slot(state).await
    }

    async fn reset(&self) -> Result<()> {
        match fs::remove_file(self.state_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::State(StateError::IoError {
                message: format!("failed to clear run state: {e}"),
            })),
        }
    }

    async fn begin(&self, initial: RunState) -> Result<BeginOutcome> {
        let _claim = self.guard.lock().await;

        let current = self.read_slot().await?;
        if current.status == RunStatus::InProgress {
            debug!("run slot already claimed, rejecting new run");
            return Ok(BeginOutcome::AlreadyRunning(current));
        }

        self.write_slot(&initial).await?;
        Ok(BeginOutcome::Started)
    }
}
