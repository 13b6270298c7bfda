//! Pipeline configuration

use crate::protocol::{AnimeMask, FileMask};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the rename stage does with the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

/// Worker count per stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageWorkers {
    pub fetch: usize,
    pub filter: usize,
    pub hash: usize,
    pub search: usize,
    pub probe: usize,
    pub rename: usize,
}

impl Default for StageWorkers {
    fn default() -> Self {
        Self {
            fetch: 1,
            filter: 1,
            hash: 2,
            // Searches are serialized by the client anyway
            search: 1,
            probe: 2,
            rename: 1,
        }
    }
}

/// Configuration for the identification pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Searches allowed per file before it is skipped for good
    pub max_search_retries: u32,
    /// Minimum age of the last search before a file is searched again
    pub search_cooldown_secs: u64,
    /// Run every stage without touching the filesystem or the repository
    pub debug: bool,
    pub transfer_mode: TransferMode,
    /// Relative destinations are resolved against this directory
    pub destination_root: PathBuf,
    pub file_mask: FileMask,
    pub anime_mask: AnimeMask,
    pub workers: StageWorkers,
    /// Bound of every queue between two stages
    pub queue_capacity: usize,
}

impl PipelineConfig {
    pub fn search_cooldown(&self) -> chrono::Duration {
        i64::try_from(self.search_cooldown_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_search_retries: 5,
            search_cooldown_secs: 24 * 60 * 60,
            debug: false,
            transfer_mode: TransferMode::Move,
            destination_root: PathBuf::from("."),
            file_mask: FileMask::default(),
            anime_mask: AnimeMask::default(),
            workers: StageWorkers::default(),
            queue_capacity: 8,
        }
    }
}
