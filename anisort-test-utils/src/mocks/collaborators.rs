//! Stand-ins for the pipeline's pluggable collaborators

use anisort_core::error::InternalError;
use anisort_core::metadata::Resolution;
use anisort_core::pipeline::{IdentificationResult, MediaProber, PathBuilder};
use anisort_core::progress::{ProgressProvider, ProgressUpdate};
use anisort_core::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds `<title>/<episode> - <fid>.<ext>` from whatever the lookup has
#[derive(Debug, Default, Clone)]
pub struct StaticPathBuilder {
    fixed: Option<PathBuf>,
}

impl StaticPathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return the same destination
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        Self {
            fixed: Some(path.into()),
        }
    }
}

impl PathBuilder for StaticPathBuilder {
    fn build(&self, result: &IdentificationResult) -> Result<PathBuf> {
        if let Some(path) = &self.fixed {
            return Ok(path.clone());
        }

        let lookup = &result.lookup;
        let title = lookup
            .anime
            .as_ref()
            .and_then(|anime| anime.preferred_title())
            .unwrap_or("Unknown");
        let episode = lookup
            .episode
            .as_ref()
            .and_then(|episode| episode.number.as_deref())
            .unwrap_or("0");
        let extension = lookup.file.file_type.as_deref().unwrap_or("mkv");
        Ok(PathBuf::from(title).join(format!("{episode} - {}.{extension}", lookup.file.fid)))
    }
}

/// Prober with a fixed answer that counts its calls
#[derive(Debug)]
pub struct StaticProber {
    answer: std::result::Result<Option<Resolution>, String>,
    calls: AtomicUsize,
}

impl StaticProber {
    pub fn resolution(width: u32, height: u32) -> Self {
        Self::answering(Ok(Some(Resolution::new(width, height))))
    }

    /// Reports that the file has no video stream
    pub fn no_video() -> Self {
        Self::answering(Ok(None))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::answering(Err(message.into()))
    }

    fn answering(answer: std::result::Result<Option<Resolution>, String>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for StaticProber {
    async fn probe(&self, _path: &Path) -> Result<Option<Resolution>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .map_err(|message| Error::Internal(InternalError::worker(message)))
    }
}

/// Keeps every progress update it receives
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
    completed: AtomicUsize,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Outcomes reported through `FileFinished`
    pub fn finished(&self) -> Vec<(PathBuf, String)> {
        self.updates()
            .into_iter()
            .filter_map(|update| match update {
                ProgressUpdate::FileFinished { path, outcome } => Some((path, outcome)),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ProgressProvider for RecordingProgress {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    fn complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
