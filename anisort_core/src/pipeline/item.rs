//! Values passed between stages

use crate::metadata::{FileLookup, Resolution};
use crate::persistence::LocalFile;
use std::path::{Path, PathBuf};

/// A matched file on its way to the rename stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationResult {
    pub file: LocalFile,
    pub lookup: FileLookup,
    /// From the remote record or, failing that, from probing the file
    pub resolution: Option<Resolution>,
}

impl IdentificationResult {
    pub fn new(file: LocalFile, lookup: FileLookup) -> Self {
        let resolution = lookup.file.video_resolution;
        Self {
            file,
            lookup,
            resolution,
        }
    }

    /// True when the anime title, the episode number or the file type is unknown
    pub fn is_missing_data(&self) -> bool {
        let title = self
            .lookup
            .anime
            .as_ref()
            .and_then(|anime| anime.romaji_name.as_deref());
        let episode = self
            .lookup
            .episode
            .as_ref()
            .and_then(|episode| episode.number.as_deref());
        let extension = self.lookup.file.file_type.as_deref();

        [title, episode, extension]
            .into_iter()
            .any(|value| value.is_none_or(|value| value.trim().is_empty()))
    }
}

/// The shapes an item takes while moving through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Discovered(PathBuf),
    Tracked(LocalFile),
    Identified(Box<IdentificationResult>),
}

impl WorkItem {
    pub fn path(&self) -> &Path {
        match self {
            Self::Discovered(path) => path,
            Self::Tracked(file) => &file.path,
            Self::Identified(result) => &result.file.path,
        }
    }

    pub fn local_file(&self) -> Option<&LocalFile> {
        match self {
            Self::Discovered(_) => None,
            Self::Tracked(file) => Some(file),
            Self::Identified(result) => Some(&result.file),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovered(_) => "discovered",
            Self::Tracked(_) => "tracked",
            Self::Identified(_) => "identified",
        }
    }
}
