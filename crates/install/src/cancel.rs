//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag checked between pipeline steps
///
/// Setting the flag does not interrupt a step already executing; the
/// in-flight item fails with a cancellation error at its next step
/// boundary, and items not yet started fail before their first step.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running batch
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Rearm the flag when a new batch starts
    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
