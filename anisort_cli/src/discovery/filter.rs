//! Extension and exclude matching

use super::{DiscoveryError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Container formats AniDB tracks video releases in
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "divx", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ogm", "ogv", "rm",
    "rmvb", "ts", "webm", "wmv",
];

/// Decides which walked files are handed to the pipeline.
///
/// Extensions match case-insensitively. Excludes win over includes.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl MediaFilter {
    pub fn new(extensions: &[&str], exclude_patterns: &[String]) -> Result<Self> {
        let include = compile(extensions.iter().map(|ext| format!("*.{ext}")))?;
        let exclude = compile(exclude_patterns.iter().cloned())?;
        Ok(Self { include, exclude })
    }

    /// Video files, no excludes
    pub fn videos() -> Result<Self> {
        Self::new(VIDEO_EXTENSIONS, &[])
    }

    pub fn accepts(&self, path: &Path) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        path.file_name()
            .is_some_and(|name| self.include.is_match(Path::new(name)))
    }
}

fn compile(patterns: impl IntoIterator<Item = String>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(&pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DiscoveryError::InvalidPattern(e.to_string()))
}
