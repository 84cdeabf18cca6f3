#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Run state persistence for plugkit
//!
//! The progress store is a single durable slot holding the entire
//! [`RunState`] of the current (or last) installation batch. It is
//! deliberately dumb: whole-record get/set/reset, no merging. The
//! orchestrator writes it after every step so that an external observer
//! polling the slot sees live progress mid-run.
//!
//! Claiming the slot for a new run goes through [`ProgressStore::begin`],
//! which performs the check-and-write under the store's internal lock.
//! Two logically concurrent install calls therefore cannot both start a
//! batch; the loser receives the in-flight state unchanged.

mod json;
mod memory;

pub use json::JsonProgressStore;
pub use memory::MemoryProgressStore;

use std::future::Future;

use plugkit_errors::Result;
use plugkit_types::RunState;

/// Outcome of attempting to claim the run slot
#[derive(Debug, Clone)]
pub enum BeginOutcome {
    /// The slot was free; the fresh state is now persisted
    Started,
    /// Another run is in flight; the slot was left untouched
    AlreadyRunning(RunState),
}

/// Durable slot for the single run state
///
/// Implementations must make [`begin`](ProgressStore::begin) atomic with
/// respect to other calls on the same store value; plain `load`/`save`
/// are whole-record operations with no read-modify-write cycle of their
/// own.
pub trait ProgressStore: Send + Sync {
    /// Read the current run state, `Idle` and empty if the slot is unset
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read or decoded.
    fn load(&self) -> impl Future<Output = Result<RunState>> + Send;

    /// Overwrite the slot with the given state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted.
    fn save(&self, state: &RunState) -> impl Future<Output = Result<()>> + Send;

    /// Clear the slot back to its unset (idle) condition
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be cleared.
    fn reset(&self) -> impl Future<Output = Result<()>> + Send;

    /// Atomically claim the slot for a new run
    ///
    /// If the stored status is `InProgress` the slot is returned
    /// unchanged; otherwise `initial` is persisted and the claim
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read or written.
    fn begin(&self, initial: RunState) -> impl Future<Output = Result<BeginOutcome>> + Send;
}
