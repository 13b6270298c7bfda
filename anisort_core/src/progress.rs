//! Progress reporting abstractions
//!
//! The pipeline reports progress through this trait without depending on any
//! particular UI. Progress is informational only; dropping updates is always safe.

use std::path::PathBuf;
use std::sync::Arc;

/// Core trait for progress reporting
pub trait ProgressProvider: Send + Sync {
    /// Report a progress update
    fn report(&self, update: ProgressUpdate);

    /// Signal that no more updates will follow
    fn complete(&self) {}
}

/// Unified progress update type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Cumulative bytes hashed for one file, sent after every block
    HashProgress {
        path: PathBuf,
        bytes_processed: u64,
        total_bytes: u64,
    },

    /// A file left the pipeline, either finished or dropped
    FileFinished { path: PathBuf, outcome: String },

    /// Generic status message
    Status { message: String },
}

/// Null implementation for when no progress is needed
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Arc-wrapped provider for sharing across worker tasks
#[derive(Clone)]
pub struct SharedProvider {
    inner: Arc<dyn ProgressProvider>,
}

impl SharedProvider {
    /// Create a new shared provider wrapping the given provider
    pub fn new(provider: Arc<dyn ProgressProvider>) -> Self {
        Self { inner: provider }
    }

    pub fn null() -> Self {
        Self::new(Arc::new(NullProvider))
    }
}

impl ProgressProvider for SharedProvider {
    fn report(&self, update: ProgressUpdate) {
        self.inner.report(update);
    }

    fn complete(&self) {
        self.inner.complete();
    }
}

impl std::fmt::Debug for SharedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedProvider").finish_non_exhaustive()
    }
}
