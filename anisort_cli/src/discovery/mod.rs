//! Finds the media files a `sort` run should look at
//!
//! Roots may be files or directories. Directories are walked with `walkdir`
//! and every regular file is matched against a `globset` built from the
//! known video extensions plus any user supplied exclude patterns.

mod filter;
mod walker;

pub use filter::{MediaFilter, VIDEO_EXTENSIONS};
pub use walker::{DiscoveryOptions, discover};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error while walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
