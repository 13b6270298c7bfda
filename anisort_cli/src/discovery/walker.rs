//! Root expansion with walkdir

use super::{DiscoveryError, MediaFilter, Result, VIDEO_EXTENSIONS};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Descend into subdirectories of directory roots
    pub recursive: bool,
    pub follow_links: bool,
    /// Glob patterns matched against the full path
    pub exclude_patterns: Vec<String>,
}

impl DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }
}

/// Expand roots into a sorted, de-duplicated list of video files.
///
/// A root that is a file is kept when it passes the filter. Unreadable
/// entries below a root are logged and skipped.
pub fn discover(roots: &[PathBuf], options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    let filter = MediaFilter::new(VIDEO_EXTENSIONS, &options.exclude_patterns)?;
    let mut found = BTreeSet::new();

    for root in roots {
        if !root.exists() {
            return Err(DiscoveryError::PathNotFound(root.clone()));
        }

        if root.is_file() {
            if filter.accepts(root) {
                found.insert(root.clone());
            } else {
                debug!("Skipping {}: not a video file", root.display());
            }
            continue;
        }

        let mut walker = WalkDir::new(root).follow_links(options.follow_links);
        if !options.recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(DiscoveryError::Walk {
                        path: root.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && filter.accepts(entry.path()) {
                found.insert(entry.into_path());
            }
        }
    }

    debug!("Discovered {} media files", found.len());
    Ok(found.into_iter().collect())
}
