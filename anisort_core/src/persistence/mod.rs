//! Storage contract used by the identification pipeline
//!
//! [`MemoryRepository`] is always available. [`SqliteRepository`] needs the
//! `database` feature.

pub mod blocking;
pub mod memory;
pub mod models;
#[cfg(feature = "database")]
pub mod sqlite;

pub use blocking::BlockingRepository;
pub use memory::MemoryRepository;
pub use models::{FileAction, FileActionKind, FileStatus, LocalFile, NewFileAction};
#[cfg(feature = "database")]
pub use sqlite::SqliteRepository;

use crate::Result;
use crate::error::InternalError;
use crate::metadata::FileLookup;
use async_trait::async_trait;
use std::path::Path;

/// Narrow persistence contract of the pipeline
#[async_trait]
pub trait Repository: Send + Sync {
    /// Find the record for `path`, creating a `NotYetImported` one if absent
    async fn get_or_create_local_file(&self, path: &Path) -> Result<LocalFile>;

    async fn find_local_file(&self, path: &Path) -> Result<Option<LocalFile>>;

    /// Store `file` if its version is still current. Returns the stored record
    /// with the bumped version.
    async fn update_local_file(&self, file: &LocalFile) -> Result<LocalFile>;

    /// All actions of a file, oldest first
    async fn file_actions(&self, local_file_id: i64) -> Result<Vec<FileAction>>;

    async fn append_file_action(&self, action: NewFileAction) -> Result<FileAction>;

    /// Store `file` together with the action that changed it. Either both
    /// writes land or neither does.
    async fn commit_file_change(
        &self,
        file: &LocalFile,
        action: NewFileAction,
    ) -> Result<(LocalFile, FileAction)>;

    /// Insert or replace anime, episode, file and group records keyed by their AniDB ids
    async fn upsert_lookup(&self, lookup: &FileLookup) -> Result<()>;

    /// Reassemble a stored lookup by AniDB file id
    async fn find_lookup(&self, fid: u32) -> Result<Option<FileLookup>>;
}

/// An action may only be committed with the file it describes
pub(crate) fn ensure_paired(file: &LocalFile, action: &NewFileAction) -> Result<()> {
    if file.id != action.local_file_id {
        return Err(InternalError::assertion(format!(
            "{} action for file {} committed with file {}",
            action.kind, action.local_file_id, file.id
        ))
        .into());
    }
    Ok(())
}
