//! Seams to the destination path builder and the media prober

use super::item::IdentificationResult;
use crate::Result;
use crate::metadata::Resolution;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Computes where an identified file should go
pub trait PathBuilder: Send + Sync {
    /// Relative results are resolved against the configured destination root
    fn build(&self, result: &IdentificationResult) -> Result<PathBuf>;
}

/// Reads the resolution of the primary video stream from a file
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// `Ok(None)` when the file has no video stream
    async fn probe(&self, path: &Path) -> Result<Option<Resolution>>;
}
